//! Testing utilities for row pipelines.
//!
//! Helpers for feeding literal rows into drivers and comparing outputs:
//!
//! - [`stream_of`] / [`collect`]: bridge between `Vec<Row>` and the lazy
//!   [`RowStream`] the drivers consume and produce.
//! - [`assert_rows_equal`]: exact order-dependent comparison.
//! - [`assert_rows_unordered_equal`]: multiset comparison.
//! - [`assert_rows_approx_equal`]: order-dependent comparison with a float
//!   tolerance, for aggregates like term frequency and mean.
//! - [`sorted_by`]: canonicalize row order before comparing, for operators
//!   whose output order is not the interesting property.

use crate::error::Result;
use crate::operations::RowStream;
use crate::row::{Row, Value, sort_cmp};
use std::cmp::Ordering;

/// A single-use stream over literal rows.
pub fn stream_of(rows: Vec<Row>) -> RowStream {
    Box::new(rows.into_iter().map(Ok))
}

/// Drain a stream, failing on the first error row.
pub fn collect(stream: RowStream) -> Result<Vec<Row>> {
    stream.collect()
}

/// Assert that two row slices are equal in order and content.
///
/// # Panics
///
/// Panics with the differing index and both full slices on mismatch.
pub fn assert_rows_equal(actual: &[Row], expected: &[Row]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "row count mismatch:\n  expected {} rows: {expected:?}\n  actual {} rows: {actual:?}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "row mismatch at index {i}:\n  expected: {e:?}\n  actual: {a:?}\n  full expected: {expected:?}\n  full actual: {actual:?}"
        );
    }
}

/// Assert that two row slices hold the same rows, ignoring order (multiset
/// comparison).
///
/// # Panics
///
/// Panics listing the first unmatched row on mismatch.
pub fn assert_rows_unordered_equal(actual: &[Row], expected: &[Row]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "row count mismatch:\n  expected {} rows: {expected:?}\n  actual {} rows: {actual:?}",
        expected.len(),
        actual.len()
    );
    let mut remaining: Vec<&Row> = actual.iter().collect();
    for e in expected {
        match remaining.iter().position(|a| *a == e) {
            Some(i) => {
                remaining.swap_remove(i);
            }
            None => panic!(
                "expected row not found: {e:?}\n  full expected: {expected:?}\n  full actual: {actual:?}"
            ),
        }
    }
}

/// Assert order-dependent equality, comparing numeric values within
/// `tolerance` and everything else exactly.
///
/// # Panics
///
/// Panics with the differing index on mismatch.
pub fn assert_rows_approx_equal(actual: &[Row], expected: &[Row], tolerance: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "row count mismatch:\n  expected {} rows: {expected:?}\n  actual {} rows: {actual:?}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            rows_approx_equal(a, e, tolerance),
            "row mismatch at index {i} (tolerance {tolerance}):\n  expected: {e:?}\n  actual: {a:?}"
        );
    }
}

fn rows_approx_equal(a: &Row, b: &Row, tolerance: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(name, value)| match b.get(name) {
                Some(other) => values_approx_equal(value, other, tolerance),
                None => false,
            })
}

fn values_approx_equal(a: &Value, b: &Value, tolerance: f64) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|(i, j)| values_approx_equal(i, j, tolerance))
        }
        _ => match (a.as_f64(), b.as_f64()) {
            (Ok(x), Ok(y)) => (x - y).abs() <= tolerance,
            _ => a == b,
        },
    }
}

/// Sort rows by the given columns for order-insensitive comparisons.
///
/// Rows missing a sort column order before rows that have it.
pub fn sorted_by(mut rows: Vec<Row>, keys: &[&str]) -> Vec<Row> {
    rows.sort_by(|a, b| {
        for key in keys {
            let ord = match (a.get(key), b.get(key)) {
                (Some(x), Some(y)) => sort_cmp(x, y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    rows
}
