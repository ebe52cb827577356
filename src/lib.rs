//! Trope - persistent rope-like sequences with a dynamic branch factor.
//!
//! A [`Node`] represents a sequence of any sliceable element type as an
//! immutable tree. Every edit returns a new version that shares all
//! untouched subtrees with the old one, so keeping old versions around is
//! cheap and readers never need to lock.
//!
//! Unlike a classic rope the tree is not binary and is not rebalanced
//! automatically. Localized edits only rebuild the path down to the
//! affected children; [`Node::flatten`] is available when a long run of
//! edits has left the tree deep.
//!
//! [`Hybrid`] wraps a tree and keeps small sequences as a single flat value
//! instead, switching at configurable size marks.
//!
//! # Quick Start
//!
//! ```
//! use trope::Node;
//!
//! let hello = Node::new("hello".to_string(), 5);
//! let jello = hello.splice(0, 1, &Node::new("j".to_string(), 1));
//! let jello_world = jello.splice(5, 0, &Node::new(" world".to_string(), 6));
//!
//! assert_eq!(jello_world.concat(), "jello world");
//! assert_eq!(jello_world.slice(6, 5).concat(), "world");
//! assert_eq!(hello.concat(), "hello");
//! ```

pub mod collection;
pub mod error;
pub mod hybrid;
pub mod lineage;
pub mod node;

pub use collection::{Sliceable, Spliceable};
pub use error::RangeError;
pub use hybrid::{Hybrid, HybridConfig, Mode};
pub use lineage::Config;
pub use node::{Leaves, Node};
