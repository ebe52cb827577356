//! Identity allocation shared by every node derived from one construction.

use std::sync::atomic::{AtomicU64, Ordering};

/// Default ceiling on the number of children a join will flatten into a
/// single node.
pub const DEFAULT_MAX_CHILDREN: usize = 100;

/// Tuning knobs carried by a tree and everything derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Joins that would give a node more children than this nest the
    /// operands under a new node instead of concatenating their children.
    pub max_children: usize,
}

impl Default for Config {
    fn default() -> Config {
        return Config {
            max_children: DEFAULT_MAX_CHILDREN,
        };
    }
}

/// The identity generator of one tree family, plus its config.
#[derive(Debug)]
pub(crate) struct Lineage {
    next: AtomicU64,
    config: Config,
}

impl Lineage {
    /// A fresh lineage whose first identity (`0`) is already taken by the
    /// constructing node.
    pub(crate) fn new(config: Config) -> Lineage {
        return Lineage {
            next: AtomicU64::new(1),
            config,
        };
    }

    /// Allocates the next identity.
    pub(crate) fn next_id(&self) -> u64 {
        return self.next.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn config(&self) -> &Config {
        return &self.config;
    }
}
