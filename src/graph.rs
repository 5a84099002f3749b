//! Graph composition and execution.
//!
//! A [`Graph`] is an immutable value: a terminal node plus a table of named,
//! still-unbound sources. Every builder call ([`map`](Graph::map),
//! [`reduce`](Graph::reduce), [`sort`](Graph::sort), [`join`](Graph::join))
//! returns a *new* graph and leaves the receiver untouched, so a pipeline
//! can be branched at any point and both branches extended independently.
//!
//! Execution is [`run`](Graph::run): supply a [`Bindings`] table mapping
//! source names to row factories, and the engine pulls the terminal node's
//! stream to exhaustion. Factories are installed into a per-run table -- not
//! into the nodes -- so the same graph can be run again (or concurrently
//! branched) without hidden state.
//!
//! # Example
//! ```
//! use rowflow::{Bindings, Graph, row};
//! use rowflow::operators::reducers::Count;
//!
//! let counts = Graph::from_source("words")
//!     .sort(&["text"])
//!     .reduce(Count::new("count"), &["text"]);
//!
//! let out = counts.run(Bindings::new().bind_rows(
//!     "words",
//!     vec![row! { "text" => "b" }, row! { "text" => "a" }, row! { "text" => "b" }],
//! ))?;
//! assert_eq!(
//!     out,
//!     vec![row! { "text" => "a", "count" => 1 }, row! { "text" => "b", "count" => 2 }]
//! );
//! # rowflow::Result::<()>::Ok(())
//! ```

use crate::error::Result;
use crate::node::{Node, RunBindings};
use crate::node_id::NodeId;
use crate::operations::{Joiner, Mapper, Reducer, RowStream, SourceFactory};
use crate::row::Row;
use log::debug;
use std::sync::Arc;

/// One entry of a graph's source table.
///
/// `name` is the registered (possibly underscore-renamed) name; `original`
/// is the name the source was created under, kept so that repeated binds of
/// the original name reach renamed entries in registration order.
#[derive(Clone)]
struct SourceEntry {
    name: String,
    original: String,
    id: NodeId,
}

/// An immutable composition of nodes with named unbound sources and one
/// terminal output. See the module docs.
#[derive(Clone)]
pub struct Graph {
    terminal: Arc<Node>,
    sources: Vec<SourceEntry>,
}

impl Graph {
    /// Initial graph: a single unbound source registered under `name`,
    /// which is also the terminal node.
    pub fn from_source(name: impl Into<String>) -> Self {
        let name = name.into();
        let id = NodeId::next();
        Self {
            terminal: Arc::new(Node::Source {
                id,
                name: name.clone(),
            }),
            sources: vec![SourceEntry {
                name: name.clone(),
                original: name,
                id,
            }],
        }
    }

    /// Extend with a map over the given [`Mapper`].
    pub fn map(&self, mapper: impl Mapper + 'static) -> Graph {
        Graph {
            terminal: Arc::new(Node::map(Arc::clone(&self.terminal), Arc::new(mapper))),
            sources: self.sources.clone(),
        }
    }

    /// Extend with a grouped reduce over `keys`.
    ///
    /// The upstream must already be sorted ascending by `keys`; insert a
    /// [`sort`](Graph::sort) when it is not.
    pub fn reduce(&self, reducer: impl Reducer + 'static, keys: &[&str]) -> Graph {
        Graph {
            terminal: Arc::new(Node::reduce(
                Arc::clone(&self.terminal),
                Arc::new(reducer),
                own_keys(keys),
            )),
            sources: self.sources.clone(),
        }
    }

    /// Extend with a stable sort by `keys`.
    pub fn sort(&self, keys: &[&str]) -> Graph {
        Graph {
            terminal: Arc::new(Node::sort(Arc::clone(&self.terminal), own_keys(keys))),
            sources: self.sources.clone(),
        }
    }

    /// Extend with a sort-merge join against `other` on `keys`.
    ///
    /// Both terminals must already be sorted ascending by `keys`. `other`'s
    /// source table is merged into the result: a source shared with this
    /// graph (same upstream, reached through a second branch) keeps its
    /// single entry, while a distinct source whose name collides is renamed
    /// by appending underscores until unique. Every distinct source stays
    /// independently bindable.
    pub fn join(&self, joiner: impl Joiner + 'static, other: &Graph, keys: &[&str]) -> Graph {
        let mut sources = self.sources.clone();
        for entry in &other.sources {
            if sources.iter().any(|s| s.id == entry.id) {
                continue;
            }
            let mut name = entry.name.clone();
            while sources.iter().any(|s| s.name == name) {
                name.push('_');
            }
            sources.push(SourceEntry {
                name,
                original: entry.original.clone(),
                id: entry.id,
            });
        }
        Graph {
            terminal: Arc::new(Node::join(
                Arc::clone(&self.terminal),
                Arc::clone(&other.terminal),
                Arc::new(joiner),
                own_keys(keys),
            )),
            sources,
        }
    }

    /// Registered source names, in registration order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    /// Execute the graph against the given bindings and collect the output.
    ///
    /// Pulls the terminal stream to exhaustion; the first error aborts the
    /// run with no partial result. Running again repeats the whole process
    /// with fresh factory invocations.
    pub fn run(&self, bindings: Bindings) -> Result<Vec<Row>> {
        let table = self.resolve(bindings);
        debug!(
            "running graph: {} of {} sources bound",
            table.len(),
            self.sources.len()
        );
        let stream = self.terminal.stream(&table)?;
        let mut out = Vec::new();
        for row in stream {
            out.push(row?);
        }
        debug!("run produced {} rows", out.len());
        Ok(out)
    }

    /// Build the per-run binding table.
    ///
    /// Entries bind in bind order: each takes the first still-unbound table
    /// slot whose registered name matches exactly, else the first whose
    /// original name matches (so repeated binds of one name reach
    /// underscore-renamed slots in registration order). Names matching no
    /// slot are ignored.
    fn resolve(&self, bindings: Bindings) -> RunBindings {
        let mut bound = RunBindings::new();
        for (name, factory) in bindings.entries {
            let slot = self
                .sources
                .iter()
                .find(|s| s.name == name && !bound.contains_key(&s.id))
                .or_else(|| {
                    self.sources
                        .iter()
                        .find(|s| s.original == name && !bound.contains_key(&s.id))
                });
            match slot {
                Some(s) => {
                    bound.insert(s.id, factory);
                }
                None => debug!("ignoring binding for unknown source `{name}`"),
            }
        }
        bound
    }
}

fn own_keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}

/// Ordered source-name → factory assignments for one [`Graph::run`].
///
/// Binding the same name twice is meaningful: the second bind reaches the
/// next same-named (renamed) source in registration order.
#[derive(Default)]
pub struct Bindings {
    entries: Vec<(String, SourceFactory)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a row factory.
    pub fn bind(mut self, name: impl Into<String>, factory: SourceFactory) -> Self {
        self.entries.push((name.into(), factory));
        self
    }

    /// Bind `name` to an in-memory row vector (cloned per stream).
    pub fn bind_rows(self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.bind(name, source_from_rows(rows))
    }
}

/// A [`SourceFactory`] serving clones of an in-memory row vector.
pub fn source_from_rows(rows: Vec<Row>) -> SourceFactory {
    Arc::new(move || Box::new(rows.clone().into_iter().map(Ok)) as RowStream)
}
