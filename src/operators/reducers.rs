//! Per-group aggregates.
//!
//! Every reducer receives the group-key column list and one materialized
//! group (a non-empty run of rows sharing a key tuple) and emits zero or
//! more rows, usually the group-key columns plus an aggregate.

use crate::error::{FlowError, Result};
use crate::operations::Reducer;
use crate::row::{Row, Value, sort_cmp};
use indexmap::IndexMap;

/// Yield only the first row of each group.
#[derive(Clone, Copy, Default)]
pub struct First;

impl First {
    pub fn new() -> Self {
        Self
    }
}

impl Reducer for First {
    fn reduce(&self, _keys: &[String], group: Vec<Row>) -> Result<Vec<Row>> {
        Ok(group.into_iter().take(1).collect())
    }
}

fn group_key_row(keys: &[String], group: &[Row]) -> Result<Row> {
    let mut out = Row::new();
    if let Some(first) = group.first() {
        for key in keys {
            out.insert(key.as_str(), first.require(key)?.clone());
        }
    }
    Ok(out)
}

/// Count the rows of each group into a single row.
#[derive(Clone)]
pub struct Count {
    column: String,
}

impl Count {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Count {
    fn reduce(&self, keys: &[String], group: Vec<Row>) -> Result<Vec<Row>> {
        let mut out = group_key_row(keys, &group)?;
        out.insert(self.column.as_str(), group.len() as i64);
        Ok(vec![out])
    }
}

/// Sum a numeric column of each group into a single row.
///
/// All-`Int` groups stay `Int`; any `Float` widens the sum to `Float`.
#[derive(Clone)]
pub struct Sum {
    column: String,
}

impl Sum {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Sum {
    fn reduce(&self, keys: &[String], group: Vec<Row>) -> Result<Vec<Row>> {
        let mut total = Value::Int(0);
        for row in &group {
            total = total.try_add(row.require(&self.column)?)?;
        }
        let mut out = group_key_row(keys, &group)?;
        out.insert(self.column.as_str(), total);
        Ok(vec![out])
    }
}

/// Mean of a numeric column of each group, as a single `Float` row.
#[derive(Clone)]
pub struct Mean {
    column: String,
}

impl Mean {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Mean {
    fn reduce(&self, keys: &[String], group: Vec<Row>) -> Result<Vec<Row>> {
        let mut total = 0.0;
        for row in &group {
            total += row.require(&self.column)?.as_f64()?;
        }
        let mut out = group_key_row(keys, &group)?;
        out.insert(self.column.as_str(), total / group.len() as f64);
        Ok(vec![out])
    }
}

/// The `n` rows with the largest values in a ranking column, descending.
///
/// Rows tying on the ranking column keep their input order (stable
/// selection). Ranking values must be mutually comparable within a group.
#[derive(Clone)]
pub struct TopN {
    column: String,
    n: usize,
}

impl TopN {
    pub fn new(column: impl Into<String>, n: usize) -> Self {
        Self {
            column: column.into(),
            n,
        }
    }
}

impl Reducer for TopN {
    fn reduce(&self, _keys: &[String], group: Vec<Row>) -> Result<Vec<Row>> {
        let mut decorated = Vec::with_capacity(group.len());
        for row in group {
            let rank = row.require(&self.column)?.clone();
            decorated.push((rank, row));
        }
        if let Some((reference, _)) = decorated.first() {
            let reference = reference.clone();
            for (rank, _) in &decorated {
                if rank.key_class() != reference.key_class() {
                    return Err(FlowError::NotComparable {
                        left: reference.type_name(),
                        right: rank.type_name(),
                    });
                }
            }
        }
        decorated.sort_by(|a, b| sort_cmp(&b.0, &a.0));
        decorated.truncate(self.n);
        Ok(decorated.into_iter().map(|(_, row)| row).collect())
    }
}

/// Relative frequency of each distinct value of a column within a group.
///
/// Emits one row per distinct value in first-occurrence order, carrying the
/// group-key columns, the value, and its share of the group's rows.
#[derive(Clone)]
pub struct TermFrequency {
    words_column: String,
    result_column: String,
}

impl TermFrequency {
    pub fn new(words_column: impl Into<String>) -> Self {
        Self {
            words_column: words_column.into(),
            result_column: "tf".to_string(),
        }
    }

    pub fn with_result_column(mut self, result_column: impl Into<String>) -> Self {
        self.result_column = result_column.into();
        self
    }
}

impl Reducer for TermFrequency {
    fn reduce(&self, keys: &[String], group: Vec<Row>) -> Result<Vec<Row>> {
        let Some(first) = group.first() else {
            return Ok(Vec::new());
        };
        let mut counts: IndexMap<Value, usize> = IndexMap::new();
        for row in &group {
            *counts
                .entry(row.require(&self.words_column)?.clone())
                .or_insert(0) += 1;
        }
        let total = group.len() as f64;
        let mut out = Vec::with_capacity(counts.len());
        for (word, count) in counts {
            let mut r = Row::new();
            for key in keys {
                r.insert(key.as_str(), first.require(key)?.clone());
            }
            r.insert(self.words_column.as_str(), word);
            r.insert(self.result_column.as_str(), count as f64 / total);
            out.push(r);
        }
        Ok(out)
    }
}
