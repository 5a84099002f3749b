//! Error kinds surfaced by graph execution.
//!
//! Every failure a running graph can hit maps onto one of the variants of
//! [`FlowError`]. The engine never retries and never converts one kind into
//! another; the original cause is preserved as the error source. User
//! operators report failures as [`anyhow::Error`], which converts into
//! [`FlowError::User`] via `?`.

use thiserror::Error;

/// Errors produced while building streams or pulling rows through a graph.
#[derive(Debug, Error)]
pub enum FlowError {
    /// `run` reached a source node that was never bound to a row factory.
    #[error("source `{0}` has no bound row factory")]
    UnboundSource(String),

    /// An operator referenced a column absent from the current row.
    #[error("row has no column `{0}`")]
    MissingColumn(String),

    /// Arithmetic or an accessor hit a value of the wrong type.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Two key values have no defined order relative to each other.
    #[error("cannot order {left} against {right}")]
    NotComparable {
        left: &'static str,
        right: &'static str,
    },

    /// A reduce or join input produced a key tuple smaller than its
    /// predecessor; the required upstream sort is missing or wrong.
    #[error("input of `{operation}` is not sorted by its key columns")]
    SortedOrderViolated { operation: &'static str },

    /// A user-supplied mapper, reducer, joiner or parser failed.
    #[error("user operator failed: {0}")]
    User(#[from] anyhow::Error),

    /// I/O failure from a source factory or a sort scratch file.
    #[error("i/o failure in row stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T, E = FlowError> = std::result::Result<T, E>;
