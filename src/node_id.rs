//! Lightweight unique identifier for source nodes.
//!
//! Graphs have no central registry -- nodes are free-standing immutable
//! values shared through `Arc` -- so identifiers come from a process-wide
//! counter. Only source nodes need identity: the per-run binding table maps
//! a `NodeId` to the row factory installed for that run.
//!
//! They're small, `Copy`, and hashable, so they can be used efficiently as
//! keys in binding tables and source listings.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Unique numeric identifier for a source node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh `NodeId` (used internally by graph construction).
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the underlying numeric value.
    ///
    /// Useful mainly for debugging or logging.
    pub fn raw(&self) -> u64 {
        self.0
    }
}
