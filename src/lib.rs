//! # Rowflow
//!
//! A library for **declarative row-stream computation graphs** over tabular
//! data. Compose a graph from a small relational-style operator algebra --
//! map, reduce-by-key, sort, and sort-merge join -- then run it against one
//! or more named row sources. Rows stream through the graph lazily, and
//! sort spills to scratch files when its input exceeds a bounded in-memory
//! chunk.
//!
//! ## Key features
//!
//! - **Immutable builder API** -- every call returns a new [`Graph`]; branch
//!   a pipeline at any point and extend both branches independently
//! - **Dynamic rows** -- open column→value mappings ([`Row`], [`Value`])
//!   whose shape drifts freely across operators; no schema
//! - **Pluggable operators** -- implement [`Mapper`], [`Reducer`] or
//!   [`Joiner`], or pick from the [`operators`] catalogue
//! - **Sort-merge joins** -- inner, outer, left and right strategies with
//!   configurable column-collision suffixes
//! - **Bounded-memory sort** -- stable external sort with transparent
//!   spill-to-disk ([`sort::ExternalSort`])
//! - **Late binding** -- sources are named placeholders bound to row
//!   factories per [`run`](Graph::run); the same graph re-runs freely
//!
//! ## Quick start
//!
//! ```
//! use rowflow::{Bindings, Graph, row};
//! use rowflow::operators::mappers::{FilterPunctuation, LowerCase, Split};
//! use rowflow::operators::reducers::Count;
//!
//! // Build a word-count pipeline over a source named "docs".
//! let graph = Graph::from_source("docs")
//!     .map(FilterPunctuation::new("text"))
//!     .map(LowerCase::new("text"))
//!     .map(Split::new("text"))
//!     .sort(&["text"])
//!     .reduce(Count::new("count"), &["text"])
//!     .sort(&["count", "text"]);
//!
//! // Execute it against literal rows.
//! let out = graph.run(Bindings::new().bind_rows(
//!     "docs",
//!     vec![row! { "text" => "Hello, world" }, row! { "text" => "hello!" }],
//! ))?;
//!
//! assert_eq!(
//!     out,
//!     vec![
//!         row! { "text" => "world", "count" => 1 },
//!         row! { "text" => "hello", "count" => 2 },
//!     ]
//! );
//! # rowflow::Result::<()>::Ok(())
//! ```
//!
//! ## Core concepts
//!
//! ### Rows and streams
//!
//! A [`Row`] is an insertion-ordered mapping from column name to [`Value`]
//! (int, float, string, list, date-time, or opaque bytes). A
//! [`RowStream`] is a finite, single-pass lazy sequence of rows; a
//! [`SourceFactory`] produces a fresh stream per invocation. Errors travel
//! in-band and abort the run.
//!
//! ### Graphs
//!
//! A [`Graph`] is an immutable value: a terminal node plus a table of named
//! unbound sources. Builder calls never mutate the receiver, so graphs
//! compose functionally -- two graphs joined with
//! [`join`](Graph::join) merge their source tables, renaming collisions by
//! appending underscores while keeping every source independently bindable.
//!
//! ### Sort discipline
//!
//! [`reduce`](Graph::reduce) and [`join`](Graph::join) consume streams
//! already sorted ascending by their key columns; user graphs satisfy the
//! precondition with [`sort`](Graph::sort). The engine flags a decreasing
//! key tuple with [`FlowError::SortedOrderViolated`] rather than silently
//! mis-grouping.
//!
//! ## Module overview
//!
//! - [`graph`] -- graph builder, bindings, execution engine
//! - [`operations`] -- operator contracts and the generic drivers
//! - [`operators`] -- standard mapper/reducer/joiner catalogue
//! - [`row`] -- the dynamic row and value model
//! - [`sort`] -- bounded-memory stable external sort
//! - [`error`] -- error kinds ([`FlowError`])
//! - [`io`] -- file-backed source helper
//! - [`graphs`] -- ready-made graphs (word count, tf-idf, pmi, road speed)
//! - [`testing`] -- assertions and stream helpers for user test suites

pub mod error;
pub mod graph;
pub mod graphs;
pub mod io;
mod node;
pub mod node_id;
pub mod operations;
pub mod operators;
pub mod row;
pub mod sort;
pub mod testing;

// General re-exports
pub use error::{FlowError, Result};
pub use graph::{Bindings, Graph, source_from_rows};
pub use node_id::NodeId;
pub use operations::{
    Join, Joiner, Map, Mapper, Reduce, Reducer, RowStream, SourceFactory, join_groups,
    join_row_pair,
};
pub use row::{KeyTuple, Row, Value, cmp_key_tuples};
pub use sort::ExternalSort;

// Join strategies are used pervasively; surface them at the crate root.
pub use operators::joiners::{InnerJoiner, LeftJoiner, OuterJoiner, RightJoiner};

// I/O helpers
pub use io::{file_source, parse_json_row};
