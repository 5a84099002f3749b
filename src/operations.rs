//! Operator contracts and the generic streaming drivers.
//!
//! This module defines:
//! - [`Mapper`], [`Reducer`], [`Joiner`]: the user-extensible operator
//!   contracts. Implementors are plain objects stored as `Arc<dyn ...>`
//!   inside graph nodes.
//! - [`Map`], [`Reduce`], [`Join`]: the generic drivers that lift one
//!   operator over a whole stream. Each `apply` wraps its input in a lazy
//!   iterator adapter; nothing is pulled until the downstream consumer asks
//!   for a row.
//! - [`join_row_pair`] / [`join_groups`]: the pairwise column-combination
//!   rule shared by every join strategy.
//!
//! # Notes
//! * `Reduce` and `Join` require input sorted ascending by their key
//!   columns. They do not sort; they *do* notice a decreasing key tuple and
//!   fail with [`SortedOrderViolated`](crate::FlowError::SortedOrderViolated),
//!   since adjacent keys are compared during grouping anyway.
//! * Streams fuse after the first error: once an `Err` row is yielded the
//!   adapter returns `None` forever.
//! * Groups (maximal same-key runs) are materialized; a group is bounded by
//!   key cardinality, not by stream length.

use crate::error::{FlowError, Result};
use crate::row::{KeyTuple, Row, cmp_key_tuples};
use std::cmp::Ordering;
use std::sync::Arc;

/// A finite, single-pass, lazy sequence of rows. Errors travel in-band.
pub type RowStream = Box<dyn Iterator<Item = Result<Row>>>;

/// A nullary factory producing a fresh [`RowStream`] per invocation.
///
/// Streams are not restartable; every consumer of a source calls the
/// factory once per run.
pub type SourceFactory = Arc<dyn Fn() -> RowStream + Send + Sync>;

/// Per-row operator: one input row, zero or more output rows.
///
/// Mappers are pure with respect to the input row and hold no cross-row
/// state. Failures are reported as [`anyhow::Error`] (converted to
/// [`FlowError::User`](crate::FlowError::User)) or as any other `FlowError`
/// kind directly.
pub trait Mapper: Send + Sync {
    fn map(&self, row: Row) -> Result<Vec<Row>>;
}

/// Per-group operator: a non-empty run of rows sharing one key tuple on
/// `keys`, producing zero or more output rows.
///
/// Output rows typically carry the group-key columns plus aggregates.
pub trait Reducer: Send + Sync {
    fn reduce(&self, keys: &[String], group: Vec<Row>) -> Result<Vec<Row>>;
}

/// Join strategy: combine a left and a right group sharing one key tuple.
///
/// An absent side is passed as an empty `Vec`; the strategy decides which
/// combinations to emit (see the concrete joiners in
/// [`operators::joiners`](crate::operators::joiners)).
pub trait Joiner: Send + Sync {
    fn join(&self, keys: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>>;
}

/* ===================== pairwise combination ===================== */

/// Combine one left row with one right row.
///
/// Key columns appear once, unsuffixed. A non-key column present on both
/// sides is split into `name + suffix_a` (left value) and `name + suffix_b`
/// (right value). Columns exclusive to either side pass through unchanged.
pub fn join_row_pair(keys: &[String], a: &Row, b: &Row, suffix_a: &str, suffix_b: &str) -> Row {
    let mut out = Row::new();
    for (name, value) in a.iter() {
        if keys.iter().any(|k| k == name) || !b.contains_column(name) {
            out.insert(name, value.clone());
        } else if let Some(theirs) = b.get(name) {
            out.insert(format!("{name}{suffix_a}"), value.clone());
            out.insert(format!("{name}{suffix_b}"), theirs.clone());
        }
    }
    for (name, value) in b.iter() {
        if !a.contains_column(name) {
            out.insert(name, value.clone());
        }
    }
    out
}

/// Cross-combine two matched groups, in left-major order.
///
/// When one side is empty the other passes through unmodified; strategies
/// that do not want that behavior filter before calling (see `InnerJoiner`).
pub fn join_groups(
    keys: &[String],
    left: &[Row],
    right: &[Row],
    suffix_a: &str,
    suffix_b: &str,
) -> Vec<Row> {
    if left.is_empty() {
        right.to_vec()
    } else if right.is_empty() {
        left.to_vec()
    } else {
        let mut out = Vec::with_capacity(left.len() * right.len());
        for a in left {
            for b in right {
                out.push(join_row_pair(keys, a, b, suffix_a, suffix_b));
            }
        }
        out
    }
}

/* ===================== Map ===================== */

/// Generic map driver: applies a [`Mapper`] to every row, concatenating the
/// yielded rows and preserving input order.
#[derive(Clone)]
pub struct Map {
    mapper: Arc<dyn Mapper>,
}

impl Map {
    pub fn new(mapper: impl Mapper + 'static) -> Self {
        Self {
            mapper: Arc::new(mapper),
        }
    }

    pub(crate) fn from_arc(mapper: Arc<dyn Mapper>) -> Self {
        Self { mapper }
    }

    /// Wrap `input` in a lazy mapping stream.
    pub fn apply(&self, input: RowStream) -> RowStream {
        Box::new(MapStream {
            input,
            mapper: Arc::clone(&self.mapper),
            pending: Vec::new().into_iter(),
            done: false,
        })
    }
}

struct MapStream {
    input: RowStream,
    mapper: Arc<dyn Mapper>,
    pending: std::vec::IntoIter<Row>,
    done: bool,
}

impl Iterator for MapStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.input.next()? {
                Ok(row) => match self.mapper.map(row) {
                    Ok(rows) => self.pending = rows.into_iter(),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/* ===================== grouped iteration ===================== */

/// Splits a key-sorted stream into maximal same-key runs.
///
/// Each `next_group` call returns the run's key tuple and its materialized
/// rows, in arrival order. A key tuple *smaller* than its predecessor's
/// means the required upstream sort is missing and fails the stream.
pub(crate) struct GroupedRows {
    input: RowStream,
    keys: Vec<String>,
    operation: &'static str,
    lookahead: Option<Row>,
    done: bool,
}

impl GroupedRows {
    pub(crate) fn new(input: RowStream, keys: Vec<String>, operation: &'static str) -> Self {
        Self {
            input,
            keys,
            operation,
            lookahead: None,
            done: false,
        }
    }

    pub(crate) fn next_group(&mut self) -> Option<Result<(KeyTuple, Vec<Row>)>> {
        if self.done {
            return None;
        }
        let first = match self.lookahead.take() {
            Some(row) => row,
            None => match self.input.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Ok(row)) => row,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
            },
        };
        let key = match first.key_tuple(&self.keys) {
            Ok(k) => k,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let mut group = vec![first];
        loop {
            match self.input.next() {
                None => {
                    self.done = true;
                    break;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(row)) => {
                    let next_key = match row.key_tuple(&self.keys) {
                        Ok(k) => k,
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    };
                    match cmp_key_tuples(&next_key, &key) {
                        Ok(Ordering::Equal) => group.push(row),
                        Ok(Ordering::Greater) => {
                            self.lookahead = Some(row);
                            break;
                        }
                        Ok(Ordering::Less) => {
                            self.done = true;
                            return Some(Err(FlowError::SortedOrderViolated {
                                operation: self.operation,
                            }));
                        }
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
        Some(Ok((key, group)))
    }
}

fn advance(groups: &mut GroupedRows) -> Result<Option<(KeyTuple, Vec<Row>)>> {
    groups.next_group().transpose()
}

/* ===================== Reduce ===================== */

/// Generic reduce driver: splits a key-sorted stream into same-key runs and
/// invokes the [`Reducer`] per run, concatenating its outputs.
#[derive(Clone)]
pub struct Reduce {
    reducer: Arc<dyn Reducer>,
    keys: Vec<String>,
}

impl Reduce {
    pub fn new(reducer: impl Reducer + 'static, keys: Vec<String>) -> Self {
        Self {
            reducer: Arc::new(reducer),
            keys,
        }
    }

    pub(crate) fn from_arc(reducer: Arc<dyn Reducer>, keys: Vec<String>) -> Self {
        Self { reducer, keys }
    }

    /// Wrap `input` (sorted ascending by the reduce keys) in a lazy
    /// reducing stream.
    pub fn apply(&self, input: RowStream) -> RowStream {
        Box::new(ReduceStream {
            groups: GroupedRows::new(input, self.keys.clone(), "reduce"),
            reducer: Arc::clone(&self.reducer),
            keys: self.keys.clone(),
            pending: Vec::new().into_iter(),
            done: false,
        })
    }
}

struct ReduceStream {
    groups: GroupedRows,
    reducer: Arc<dyn Reducer>,
    keys: Vec<String>,
    pending: std::vec::IntoIter<Row>,
    done: bool,
}

impl Iterator for ReduceStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.groups.next_group()? {
                Ok((_, group)) => match self.reducer.reduce(&self.keys, group) {
                    Ok(rows) => self.pending = rows.into_iter(),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/* ===================== Join ===================== */

/// Generic sort-merge join driver.
///
/// Walks two key-sorted streams in lockstep through their grouped-by-key
/// iterators: an unmatched left group is handed to the joiner with an empty
/// right side (and vice versa), equal-key groups are materialized and
/// cross-combined, and once one side is exhausted the other drains with
/// empty-opposite invocations. Sort stability upstream makes the
/// cross-product order deterministic: all pairs for one left row in right
/// input order, then the next left row.
#[derive(Clone)]
pub struct Join {
    joiner: Arc<dyn Joiner>,
    keys: Vec<String>,
}

impl Join {
    pub fn new(joiner: impl Joiner + 'static, keys: Vec<String>) -> Self {
        Self {
            joiner: Arc::new(joiner),
            keys,
        }
    }

    pub(crate) fn from_arc(joiner: Arc<dyn Joiner>, keys: Vec<String>) -> Self {
        Self { joiner, keys }
    }

    /// Join two streams, both sorted ascending by the join keys.
    pub fn apply(&self, left: RowStream, right: RowStream) -> RowStream {
        Box::new(JoinStream {
            left: GroupedRows::new(left, self.keys.clone(), "join"),
            right: GroupedRows::new(right, self.keys.clone(), "join"),
            joiner: Arc::clone(&self.joiner),
            keys: self.keys.clone(),
            left_cur: None,
            right_cur: None,
            primed: false,
            pending: Vec::new().into_iter(),
            done: false,
        })
    }
}

struct JoinStream {
    left: GroupedRows,
    right: GroupedRows,
    joiner: Arc<dyn Joiner>,
    keys: Vec<String>,
    left_cur: Option<(KeyTuple, Vec<Row>)>,
    right_cur: Option<(KeyTuple, Vec<Row>)>,
    primed: bool,
    pending: std::vec::IntoIter<Row>,
    done: bool,
}

impl JoinStream {
    fn fail(&mut self, e: FlowError) -> Result<Row> {
        self.done = true;
        Err(e)
    }
}

impl Iterator for JoinStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            if !self.primed {
                self.primed = true;
                match advance(&mut self.left) {
                    Ok(g) => self.left_cur = g,
                    Err(e) => return Some(self.fail(e)),
                }
                match advance(&mut self.right) {
                    Ok(g) => self.right_cur = g,
                    Err(e) => return Some(self.fail(e)),
                }
            }
            let joined = match (self.left_cur.take(), self.right_cur.take()) {
                (None, None) => {
                    self.done = true;
                    return None;
                }
                (Some((_, left_rows)), None) => {
                    let out = self.joiner.join(&self.keys, left_rows, Vec::new());
                    match advance(&mut self.left) {
                        Ok(g) => self.left_cur = g,
                        Err(e) => return Some(self.fail(e)),
                    }
                    out
                }
                (None, Some((_, right_rows))) => {
                    let out = self.joiner.join(&self.keys, Vec::new(), right_rows);
                    match advance(&mut self.right) {
                        Ok(g) => self.right_cur = g,
                        Err(e) => return Some(self.fail(e)),
                    }
                    out
                }
                (Some((left_key, left_rows)), Some((right_key, right_rows))) => {
                    match cmp_key_tuples(&left_key, &right_key) {
                        Err(e) => return Some(self.fail(e)),
                        Ok(Ordering::Less) => {
                            let out = self.joiner.join(&self.keys, left_rows, Vec::new());
                            self.right_cur = Some((right_key, right_rows));
                            match advance(&mut self.left) {
                                Ok(g) => self.left_cur = g,
                                Err(e) => return Some(self.fail(e)),
                            }
                            out
                        }
                        Ok(Ordering::Greater) => {
                            let out = self.joiner.join(&self.keys, Vec::new(), right_rows);
                            self.left_cur = Some((left_key, left_rows));
                            match advance(&mut self.right) {
                                Ok(g) => self.right_cur = g,
                                Err(e) => return Some(self.fail(e)),
                            }
                            out
                        }
                        Ok(Ordering::Equal) => {
                            let out = self.joiner.join(&self.keys, left_rows, right_rows);
                            match advance(&mut self.left) {
                                Ok(g) => self.left_cur = g,
                                Err(e) => return Some(self.fail(e)),
                            }
                            match advance(&mut self.right) {
                                Ok(g) => self.right_cur = g,
                                Err(e) => return Some(self.fail(e)),
                            }
                            out
                        }
                    }
                }
            };
            match joined {
                Ok(rows) => self.pending = rows.into_iter(),
                Err(e) => return Some(self.fail(e)),
            }
        }
    }
}
