//! Adaptive storage that keeps small sequences flat and large ones in a
//! [`Node`] tree.
//!
//! A [`Hybrid`] starts out holding a single flat value. Once a splice
//! would grow it past `high_mark` it moves the value into a tree and
//! splices there; once a tree splice shrinks it under `low_mark` it
//! collapses the tree back into one flat value. The best marks depend on
//! the leaf type and are found by benchmarking.
//!
//! ```
//! use trope::{Hybrid, HybridConfig, Mode};
//!
//! let config = HybridConfig::new(10, 5);
//! let hello = Hybrid::new(config, "hello".to_string(), 5);
//! let greeting = hello.splice(5, 0, &Hybrid::new(config, " world".to_string(), 6));
//! assert_eq!(greeting.mode(), Mode::Tree);
//!
//! let short = greeting.splice(0, 7, &Hybrid::empty(config));
//! assert_eq!(short.mode(), Mode::Raw);
//! assert_eq!(short.to_raw(), "orld");
//! ```

use std::sync::Arc;

use log::debug;

use crate::collection::{Sliceable, Spliceable};
use crate::error::{RangeError, check_range};
use crate::lineage::Config;
use crate::node::Node;

pub const DEFAULT_HIGH_MARK: usize = 15000;
pub const DEFAULT_LOW_MARK: usize = 10000;

/// Size thresholds for switching representation.
///
/// `low_mark` must be below `high_mark`; this is not checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HybridConfig {
    /// Sizes above this are stored as a tree.
    pub high_mark: usize,
    /// Trees shrinking below this are flattened back.
    pub low_mark: usize,
    /// Config for trees created on conversion.
    pub tree: Config,
}

impl HybridConfig {
    pub fn new(high_mark: usize, low_mark: usize) -> HybridConfig {
        return HybridConfig {
            high_mark,
            low_mark,
            tree: Config::default(),
        };
    }
}

impl Default for HybridConfig {
    fn default() -> HybridConfig {
        return HybridConfig::new(DEFAULT_HIGH_MARK, DEFAULT_LOW_MARK);
    }
}

/// Which representation a [`Hybrid`] currently uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Raw,
    Tree,
}

#[derive(Debug)]
enum Repr<T> {
    Raw { value: Arc<T>, count: usize },
    /// Always non-empty.
    Tree(Node<T>),
}

impl<T> Clone for Repr<T> {
    fn clone(&self) -> Self {
        match self {
            Repr::Raw { value, count } => Repr::Raw {
                value: Arc::clone(value),
                count: *count,
            },
            Repr::Tree(node) => Repr::Tree(node.clone()),
        }
    }
}

/// A sequence stored flat when small and as a tree when large.
#[derive(Debug)]
pub struct Hybrid<T> {
    config: HybridConfig,
    repr: Repr<T>,
}

impl<T> Clone for Hybrid<T> {
    fn clone(&self) -> Self {
        return Hybrid {
            config: self.config,
            repr: self.repr.clone(),
        };
    }
}

impl<T> Hybrid<T> {
    /// A flat sequence holding `value`, declared to have `count` elements.
    pub fn new(config: HybridConfig, value: T, count: usize) -> Hybrid<T> {
        return Hybrid {
            config,
            repr: Repr::Raw {
                value: Arc::new(value),
                count,
            },
        };
    }

    pub fn config(&self) -> &HybridConfig {
        return &self.config;
    }

    pub fn mode(&self) -> Mode {
        match self.repr {
            Repr::Raw { .. } => Mode::Raw,
            Repr::Tree(_) => Mode::Tree,
        }
    }

    /// Number of elements, whichever representation is active.
    pub fn size(&self) -> usize {
        match &self.repr {
            Repr::Raw { count, .. } => *count,
            Repr::Tree(node) => node.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        return self.size() == 0;
    }

    /// Calls `f` with every non-empty value and its count, in order.
    pub fn for_each(&self, mut f: impl FnMut(&T, usize)) {
        match &self.repr {
            Repr::Raw { value, count } => {
                if *count > 0 {
                    f(&**value, *count);
                }
            }
            Repr::Tree(node) => node.for_each(f),
        }
    }

    /// The content as a tree. A flat value becomes a single leaf without
    /// being copied.
    pub fn to_node(&self) -> Node<T> {
        match &self.repr {
            Repr::Raw { value, count } => {
                Node::from_shared(Arc::clone(value), *count, self.config.tree)
            }
            Repr::Tree(node) => node.clone(),
        }
    }

    fn with_repr(&self, repr: Repr<T>) -> Hybrid<T> {
        return Hybrid {
            config: self.config,
            repr,
        };
    }
}

impl<T: Spliceable + Default> Hybrid<T> {
    /// An empty flat sequence.
    pub fn empty(config: HybridConfig) -> Hybrid<T> {
        return Hybrid::new(config, T::default(), 0);
    }

    /// Wraps an existing tree. An empty tree starts out flat.
    pub fn from_node(config: HybridConfig, node: Node<T>) -> Hybrid<T> {
        if node.is_empty() {
            return Hybrid::empty(config);
        }
        return Hybrid {
            config,
            repr: Repr::Tree(node),
        };
    }

    /// The content as one flat value.
    pub fn to_raw(&self) -> T {
        match &self.repr {
            Repr::Raw { value, count } => value.slice(0, *count),
            Repr::Tree(node) => node.concat(),
        }
    }

    /// # Panics
    ///
    /// Panics if the range does not fit; see [`Hybrid::try_slice`].
    pub fn slice(&self, offset: usize, count: usize) -> Hybrid<T> {
        match self.try_slice(offset, count) {
            Ok(hybrid) => hybrid,
            Err(err) => panic!("{}", err),
        }
    }

    /// Returns `offset..offset + count` in the same representation.
    pub fn try_slice(&self, offset: usize, count: usize) -> Result<Hybrid<T>, RangeError> {
        match &self.repr {
            Repr::Tree(node) => {
                let node = node.try_slice(offset, count)?;
                if node.is_empty() {
                    return Ok(Hybrid::empty(self.config));
                }
                return Ok(self.with_repr(Repr::Tree(node)));
            }
            Repr::Raw { value, count: len } => {
                check_range(offset, count, *len)?;
                if offset == 0 && count == *len {
                    return Ok(self.clone());
                }
                return Ok(self.with_repr(Repr::Raw {
                    value: Arc::new(value.slice(offset, count)),
                    count,
                }));
            }
        }
    }

    /// # Panics
    ///
    /// Panics if the range does not fit; see [`Hybrid::try_splice`].
    pub fn splice(&self, offset: usize, count: usize, replacement: &Hybrid<T>) -> Hybrid<T> {
        match self.try_splice(offset, count, replacement) {
            Ok(hybrid) => hybrid,
            Err(err) => panic!("{}", err),
        }
    }

    /// Replaces `offset..offset + count` with `replacement`, switching
    /// representation when the new size crosses a mark.
    pub fn try_splice(
        &self,
        offset: usize,
        count: usize,
        replacement: &Hybrid<T>,
    ) -> Result<Hybrid<T>, RangeError> {
        let size = self.size();
        check_range(offset, count, size)?;
        let new_size = size - count + replacement.size();

        let tree = match &self.repr {
            Repr::Tree(node) => node.clone(),
            Repr::Raw { value, count: len } if new_size > self.config.high_mark => {
                debug!(
                    "hybrid raw -> tree: size {} -> {}, high mark {}",
                    size, new_size, self.config.high_mark
                );
                Node::from_shared(Arc::clone(value), *len, self.config.tree)
            }
            Repr::Raw { value, .. } => {
                let (inserted, _) = replacement.raw_parts();
                return Ok(self.with_repr(Repr::Raw {
                    value: Arc::new(value.splice(offset, count, &*inserted)),
                    count: new_size,
                }));
            }
        };

        let node = tree.try_splice(offset, count, &replacement.to_node())?;
        if node.is_empty() || node.len() < self.config.low_mark {
            debug!(
                "hybrid tree -> raw: size {} -> {}, low mark {}, {} leaves",
                size,
                node.len(),
                self.config.low_mark,
                node.leaf_count()
            );
            return Ok(self.with_repr(Repr::Raw {
                value: Arc::new(node.concat()),
                count: node.len(),
            }));
        }
        return Ok(self.with_repr(Repr::Tree(node)));
    }

    /// The flat value and its count, collapsing a tree if needed.
    fn raw_parts(&self) -> (Arc<T>, usize) {
        match &self.repr {
            Repr::Raw { value, count } => (Arc::clone(value), *count),
            Repr::Tree(node) => (Arc::new(node.concat()), node.len()),
        }
    }
}
