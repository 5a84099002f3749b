//! Execution graph nodes.
//!
//! [`Node`] is the immutable execution IR behind [`Graph`](crate::Graph).
//! Five kinds exist -- `Source`, `Map`, `Reduce`, `Sort`, `Join` -- and each
//! exposes a single operation: produce a fresh lazy
//! [`RowStream`](crate::operations::RowStream) against a per-run binding
//! table.
//!
//! # Notes
//! * Nodes hold `Arc` references to their predecessors; predecessors are
//!   not consumed at construction, only streamed on demand. Builder calls
//!   share nodes freely, which is what makes branching a graph cheap and
//!   side-effect free.
//! * `Source` nodes carry no factory themselves. Factories live in the
//!   per-run table keyed by [`NodeId`], so two runs (or two branches of one
//!   run) never interfere through node state.
//! * `Join` builds both upstream streams up front and then advances them
//!   independently as the merge walk demands.

use crate::error::{FlowError, Result};
use crate::node_id::NodeId;
use crate::operations::{Join, Joiner, Map, Mapper, Reduce, Reducer, RowStream, SourceFactory};
use crate::sort::ExternalSort;
use std::collections::HashMap;
use std::sync::Arc;

/// Factories installed for one `run`, keyed by source-node identity.
pub(crate) type RunBindings = HashMap<NodeId, SourceFactory>;

/// A node of the execution graph. See the module docs.
#[derive(Clone)]
pub(crate) enum Node {
    /// Named placeholder for externally supplied rows.
    Source { id: NodeId, name: String },
    /// Apply a mapper to every row of the predecessor.
    Map { input: Arc<Node>, map: Map },
    /// Reduce maximal same-key runs of the (pre-sorted) predecessor.
    Reduce { input: Arc<Node>, reduce: Reduce },
    /// Stable external sort of the predecessor by a key-column list.
    Sort { input: Arc<Node>, sort: ExternalSort },
    /// Sort-merge join of two (pre-sorted) predecessors.
    Join {
        left: Arc<Node>,
        right: Arc<Node>,
        join: Join,
    },
}

impl Node {
    pub(crate) fn map(input: Arc<Node>, mapper: Arc<dyn Mapper>) -> Self {
        Node::Map {
            input,
            map: Map::from_arc(mapper),
        }
    }

    pub(crate) fn reduce(input: Arc<Node>, reducer: Arc<dyn Reducer>, keys: Vec<String>) -> Self {
        Node::Reduce {
            input,
            reduce: Reduce::from_arc(reducer, keys),
        }
    }

    pub(crate) fn sort(input: Arc<Node>, keys: Vec<String>) -> Self {
        Node::Sort {
            input,
            sort: ExternalSort::new(keys),
        }
    }

    pub(crate) fn join(
        left: Arc<Node>,
        right: Arc<Node>,
        joiner: Arc<dyn Joiner>,
        keys: Vec<String>,
    ) -> Self {
        Node::Join {
            left,
            right,
            join: Join::from_arc(joiner, keys),
        }
    }

    /// Produce a fresh stream of this node's output rows.
    pub(crate) fn stream(&self, bindings: &RunBindings) -> Result<RowStream> {
        match self {
            Node::Source { id, name } => {
                let factory = bindings
                    .get(id)
                    .ok_or_else(|| FlowError::UnboundSource(name.clone()))?;
                Ok(factory())
            }
            Node::Map { input, map } => Ok(map.apply(input.stream(bindings)?)),
            Node::Reduce { input, reduce } => Ok(reduce.apply(input.stream(bindings)?)),
            Node::Sort { input, sort } => Ok(sort.apply(input.stream(bindings)?)),
            Node::Join { left, right, join } => {
                Ok(join.apply(left.stream(bindings)?, right.stream(bindings)?))
            }
        }
    }
}
