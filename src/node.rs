//! The immutable tree behind every sequence.
//!
//! A [`Node`] is either a leaf holding one opaque value, or a branch
//! holding an ordered list of child nodes whose counts sum to its own.
//! Branch factor is dynamic and the tree is never rebalanced on its own;
//! call [`Node::flatten`] when a heavily edited tree should be squashed.
//!
//! # Identity
//!
//! Every node carries an identity allocated from a lineage shared by all
//! nodes derived from the same [`Node::new`] call. Edits allocate fresh
//! identities only for the nodes they rebuild, so two nodes of one lineage
//! with equal identities hold identical content. Untouched subtrees are
//! shared between versions, not copied.

use std::fmt;
use std::sync::Arc;

use log::trace;
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};

use crate::collection::{Sliceable, Spliceable};
use crate::error::{RangeError, check_range};
use crate::lineage::{Config, Lineage};

/// Stack depth kept inline while walking a tree.
const INLINE_STACK: usize = 16;

/// An immutable, versioned sequence of leaf values.
pub struct Node<T> {
    lineage: Arc<Lineage>,
    id: u64,
    count: usize,
    body: Body<T>,
}

enum Body<T> {
    /// The canonical empty node.
    Empty,
    Leaf(Arc<T>),
    Branch(Arc<[Node<T>]>),
}

impl<T> Clone for Body<T> {
    fn clone(&self) -> Self {
        match self {
            Body::Empty => Body::Empty,
            Body::Leaf(value) => Body::Leaf(Arc::clone(value)),
            Body::Branch(children) => Body::Branch(Arc::clone(children)),
        }
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        return Node {
            lineage: Arc::clone(&self.lineage),
            id: self.id,
            count: self.count,
            body: self.body.clone(),
        };
    }
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        return Node::empty();
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Node");
        out.field("id", &self.id).field("count", &self.count);
        match &self.body {
            Body::Empty => {}
            Body::Leaf(value) => {
                out.field("leaf", value);
            }
            Body::Branch(children) => {
                out.field("children", children);
            }
        }
        return out.finish();
    }
}

impl<T> Node<T> {
    /// Wraps `value`, declared to hold `count` elements, in a new tree.
    pub fn new(value: T, count: usize) -> Node<T> {
        return Node::with_config(value, count, Config::default());
    }

    /// Like [`Node::new`], with explicit tuning for the whole lineage.
    pub fn with_config(value: T, count: usize, config: Config) -> Node<T> {
        return Node::from_shared(Arc::new(value), count, config);
    }

    /// An empty tree with its own lineage.
    pub fn empty() -> Node<T> {
        return Node {
            lineage: Arc::new(Lineage::new(Config::default())),
            id: 0,
            count: 0,
            body: Body::Empty,
        };
    }

    pub(crate) fn from_shared(value: Arc<T>, count: usize, config: Config) -> Node<T> {
        return Node {
            lineage: Arc::new(Lineage::new(config)),
            id: 0,
            count,
            body: Body::Leaf(value),
        };
    }

    /// The version marker of this node within its lineage.
    pub fn id(&self) -> u64 {
        return self.id;
    }

    /// Number of elements represented.
    pub fn len(&self) -> usize {
        return self.count;
    }

    pub fn is_empty(&self) -> bool {
        return self.count == 0;
    }

    /// True unless this node has children.
    pub fn is_leaf(&self) -> bool {
        return !matches!(self.body, Body::Branch(_));
    }

    /// The value held by a leaf node.
    pub fn leaf(&self) -> Option<&T> {
        match &self.body {
            Body::Leaf(value) => Some(&**value),
            _ => None,
        }
    }

    /// Direct children; empty for leaves.
    pub fn children(&self) -> &[Node<T>] {
        match &self.body {
            Body::Branch(children) => &**children,
            _ => &[],
        }
    }

    pub fn config(&self) -> &Config {
        return self.lineage.config();
    }

    /// True if both nodes come from the same lineage and carry the same
    /// identity, i.e. they are the same version of the same content.
    pub fn same_version(&self, other: &Node<T>) -> bool {
        return Arc::ptr_eq(&self.lineage, &other.lineage) && self.id == other.id;
    }

    /// Number of direct children.
    pub fn width(&self) -> usize {
        return self.children().len();
    }

    /// Number of levels from this node down to its deepest leaf.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: SmallVec<[(&Node<T>, usize); INLINE_STACK]> = smallvec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children().iter().map(|child| (child, level + 1)));
        }
        return deepest;
    }

    /// Number of non-empty leaves.
    pub fn leaf_count(&self) -> usize {
        return self.leaf_nodes().count();
    }

    /// Iterates over non-empty leaf values and their counts, left to right.
    pub fn leaves(&self) -> Leaves<'_, T> {
        return Leaves {
            inner: self.leaf_nodes(),
        };
    }

    /// Calls `f` with every non-empty leaf value and its count, in order.
    pub fn for_each(&self, mut f: impl FnMut(&T, usize)) {
        for (value, count) in self.leaves() {
            f(value, count);
        }
    }

    /// The nodes of `self`, in pre-order, whose version does not appear
    /// anywhere in `older`.
    ///
    /// Subtrees already present in `older` are skipped without being
    /// visited. Versions are compared by lineage and identity, so content
    /// spliced in from an unrelated tree is reported even if equal.
    pub fn changed_since<'a>(&'a self, older: &Node<T>) -> Vec<&'a Node<T>> {
        let mut known: FxHashSet<(usize, u64)> = FxHashSet::default();
        let mut stack: SmallVec<[&Node<T>; INLINE_STACK]> = smallvec![older];
        while let Some(node) = stack.pop() {
            if known.insert(node.key()) {
                stack.extend(node.children());
            }
        }

        let mut changed = Vec::new();
        let mut stack: SmallVec<[&Node<T>; INLINE_STACK]> = smallvec![self];
        while let Some(node) = stack.pop() {
            if known.contains(&node.key()) {
                continue;
            }
            changed.push(node);
            stack.extend(node.children().iter().rev());
        }
        return changed;
    }

    /// Concatenates two sequences.
    ///
    /// Children lists are merged while the result stays within
    /// `Config::max_children`; past that the operands are nested instead.
    pub fn join(&self, other: &Node<T>) -> Node<T> {
        return Node::join_in(&self.lineage, self, other);
    }

    /// Regroups all leaves under a two-level tree with `chunk_size` leaves
    /// per child of the root.
    pub fn flatten(&self, chunk_size: usize) -> Node<T> {
        if self.is_leaf() {
            return self.clone();
        }

        let chunk_size = chunk_size.max(1);
        let leaves: Vec<Node<T>> = self.leaf_nodes().map(|(node, _)| node.clone()).collect();
        trace!(
            "flatten: {} leaves, depth {}, chunk size {}",
            leaves.len(),
            self.depth(),
            chunk_size
        );

        let chunks: Vec<Node<T>> = leaves
            .chunks(chunk_size)
            .map(|batch| match batch {
                [single] => single.clone(),
                _ => {
                    let count = batch.iter().map(|leaf| leaf.count).sum();
                    Node::derive(&self.lineage, count, Body::Branch(batch.into()))
                }
            })
            .collect();

        if chunks.is_empty() {
            return Node::empty_in(&self.lineage);
        }
        return Node::derive(&self.lineage, self.count, Body::Branch(chunks.into()));
    }

    fn leaf_nodes(&self) -> LeafNodes<'_, T> {
        return LeafNodes {
            stack: smallvec![self],
        };
    }

    fn key(&self) -> (usize, u64) {
        return (Arc::as_ptr(&self.lineage) as usize, self.id);
    }

    /// A new node in `lineage` with a fresh identity.
    fn derive(lineage: &Arc<Lineage>, count: usize, body: Body<T>) -> Node<T> {
        return Node {
            lineage: Arc::clone(lineage),
            id: lineage.next_id(),
            count,
            body,
        };
    }

    fn empty_in(lineage: &Arc<Lineage>) -> Node<T> {
        return Node::derive(lineage, 0, Body::Empty);
    }

    fn join_in(lineage: &Arc<Lineage>, left: &Node<T>, right: &Node<T>) -> Node<T> {
        if left.count == 0 {
            return right.clone();
        }
        if right.count == 0 {
            return left.clone();
        }

        let max = lineage.config().max_children;
        let children: Vec<Node<T>> = match (&left.body, &right.body) {
            (Body::Branch(l), Body::Branch(r)) if l.len() + r.len() <= max => {
                l.iter().chain(r.iter()).cloned().collect()
            }
            (Body::Branch(l), _) if l.len() < max => {
                l.iter().cloned().chain(Some(right.clone())).collect()
            }
            (_, Body::Branch(r)) if r.len() < max => {
                Some(left.clone()).into_iter().chain(r.iter().cloned()).collect()
            }
            _ => vec![left.clone(), right.clone()],
        };

        return Node::derive(lineage, left.count + right.count, Body::Branch(children.into()));
    }
}

// Edits recurse with the lineage of the tree being edited, so subtrees
// that came in from another tree are rebuilt under the receiver's
// identities and ceiling.
impl<T: Sliceable> Node<T> {
    /// Returns the sub-sequence `offset..offset + count`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not fit; see [`Node::try_slice`].
    pub fn slice(&self, offset: usize, count: usize) -> Node<T> {
        match self.try_slice(offset, count) {
            Ok(node) => node,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_slice(&self, offset: usize, count: usize) -> Result<Node<T>, RangeError> {
        check_range(offset, count, self.count)?;
        return Ok(self.slice_within(&self.lineage, offset, count));
    }

    /// Replaces `offset..offset + count` with the content of `replacement`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not fit; see [`Node::try_splice`].
    pub fn splice(&self, offset: usize, count: usize, replacement: &Node<T>) -> Node<T> {
        match self.try_splice(offset, count, replacement) {
            Ok(node) => node,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_splice(
        &self,
        offset: usize,
        count: usize,
        replacement: &Node<T>,
    ) -> Result<Node<T>, RangeError> {
        check_range(offset, count, self.count)?;
        return Ok(self.splice_within(&self.lineage, offset, count, replacement));
    }

    fn slice_within(&self, lineage: &Arc<Lineage>, offset: usize, count: usize) -> Node<T> {
        if offset == 0 && count == self.count {
            return self.clone();
        }
        if count == 0 {
            return Node::empty_in(lineage);
        }

        match &self.body {
            Body::Empty => Node::empty_in(lineage),
            Body::Leaf(value) => {
                let sliced = value.slice(offset, count);
                Node::derive(lineage, count, Body::Leaf(Arc::new(sliced)))
            }
            Body::Branch(children) => {
                let end = offset + count;
                let mut seen = 0;
                let mut sliced = Vec::new();
                for child in children.iter() {
                    if seen >= end {
                        break;
                    }
                    let start = offset.max(seen);
                    let stop = end.min(seen + child.count);
                    if start < stop {
                        sliced.push(child.slice_within(lineage, start - seen, stop - start));
                    }
                    seen += child.count;
                }
                Node::derive(lineage, count, Body::Branch(sliced.into()))
            }
        }
    }

    fn splice_within(
        &self,
        lineage: &Arc<Lineage>,
        offset: usize,
        count: usize,
        replacement: &Node<T>,
    ) -> Node<T> {
        if offset == 0 && count == self.count {
            return Node::derive(lineage, replacement.count, replacement.body.clone());
        }
        if offset == self.count && count == 0 {
            return Node::join_in(lineage, self, replacement);
        }

        let Body::Branch(children) = &self.body else {
            return self.splice_slow(lineage, offset, count, replacement);
        };
        let end = offset + count;
        let new_count = self.count - count + replacement.count;

        // Edits that fit inside one child only rebuild the path to it.
        let mut seen = 0;
        for (i, child) in children.iter().enumerate() {
            if seen > offset {
                break;
            }
            if seen + child.count >= end {
                let spliced = child.splice_within(lineage, offset - seen, count, replacement);
                let mut updated = Vec::with_capacity(children.len() + 1);
                updated.extend_from_slice(&children[..i]);
                match &spliced.body {
                    // Keeps repeated edits at one spot from deepening the tree.
                    Body::Branch(grandchildren)
                        if children.len() - 1 + grandchildren.len()
                            <= lineage.config().max_children =>
                    {
                        updated.extend_from_slice(grandchildren);
                    }
                    _ if spliced.count == 0 => {}
                    _ => updated.push(spliced.clone()),
                }
                updated.extend_from_slice(&children[i + 1..]);
                if updated.is_empty() {
                    return Node::empty_in(lineage);
                }
                return Node::derive(lineage, new_count, Body::Branch(updated.into()));
            }
            seen += child.count;
        }

        match (children.first(), children.last()) {
            (Some(first), Some(last))
                if offset >= first.count || end <= self.count - last.count =>
            {
                Node::splice_children(lineage, children, offset, count, replacement)
            }
            _ => self.splice_slow(lineage, offset, count, replacement),
        }
    }

    /// Splices a range spanning several children, keeping the children on
    /// either side as they are and rebuilding only the touched ones.
    fn splice_children(
        lineage: &Arc<Lineage>,
        children: &[Node<T>],
        offset: usize,
        count: usize,
        replacement: &Node<T>,
    ) -> Node<T> {
        let end = offset + count;

        let mut lo = 0;
        let mut lo_start = 0;
        while lo < children.len() && lo_start + children[lo].count <= offset {
            lo_start += children[lo].count;
            lo += 1;
        }

        let mut hi = lo;
        let mut hi_start = lo_start;
        while hi < children.len() && hi_start < end {
            hi_start += children[hi].count;
            hi += 1;
        }

        let touched = &children[lo..hi];
        let mut inner = match touched.first() {
            Some(first) => {
                let head = first.slice_within(lineage, 0, offset - lo_start);
                Node::join_in(lineage, &head, replacement)
            }
            None => replacement.clone(),
        };
        if let Some(last) = touched.last() {
            let keep_from = end - (hi_start - last.count);
            let tail = last.slice_within(lineage, keep_from, last.count - keep_from);
            inner = Node::join_in(lineage, &inner, &tail);
        }

        let untouched = lo + (children.len() - hi);
        let mut spliced = Vec::with_capacity(untouched + 1);
        spliced.extend_from_slice(&children[..lo]);
        match &inner.body {
            Body::Branch(grandchildren)
                if untouched + grandchildren.len() <= lineage.config().max_children =>
            {
                spliced.extend_from_slice(grandchildren);
            }
            _ if inner.count == 0 => {}
            _ => spliced.push(inner.clone()),
        }
        spliced.extend_from_slice(&children[hi..]);

        if spliced.is_empty() {
            return Node::empty_in(lineage);
        }
        let total: usize = children.iter().map(|child| child.count).sum();
        return Node::derive(
            lineage,
            total - count + replacement.count,
            Body::Branch(spliced.into()),
        );
    }

    fn splice_slow(
        &self,
        lineage: &Arc<Lineage>,
        offset: usize,
        count: usize,
        replacement: &Node<T>,
    ) -> Node<T> {
        trace!(
            "slow splice: offset {}, count {}, len {}, width {}",
            offset,
            count,
            self.count,
            self.width()
        );
        let end = offset + count;
        let head = self.slice_within(lineage, 0, offset);
        let tail = self.slice_within(lineage, end, self.count - end);
        let joined = Node::join_in(lineage, &head, replacement);
        return Node::join_in(lineage, &joined, &tail);
    }
}

impl<T: Spliceable + Default> Node<T> {
    /// Rebuilds the whole sequence as one flat value.
    pub fn concat(&self) -> T {
        let mut out = T::default();
        let mut len = 0;
        for (value, count) in self.leaves() {
            out = out.splice(len, 0, value);
            len += count;
        }
        return out;
    }
}

/// Iterator over the leaf values of a [`Node`]; see [`Node::leaves`].
pub struct Leaves<'a, T> {
    inner: LeafNodes<'a, T>,
}

impl<'a, T> Iterator for Leaves<'a, T> {
    type Item = (&'a T, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, value) = self.inner.next()?;
        return Some((value, node.count));
    }
}

/// Depth-first walk yielding non-empty leaf nodes and their values in
/// order.
struct LeafNodes<'a, T> {
    stack: SmallVec<[&'a Node<T>; INLINE_STACK]>,
}

impl<'a, T> Iterator for LeafNodes<'a, T> {
    type Item = (&'a Node<T>, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if node.count == 0 {
                continue;
            }
            match &node.body {
                Body::Empty => continue,
                Body::Leaf(value) => return Some((node, &**value)),
                Body::Branch(children) => self.stack.extend(children.iter().rev()),
            }
        }
        return None;
    }
}
