//! The four join strategies.
//!
//! All strategies share [`join_groups`]: pairwise column combination with
//! configurable collision suffixes (defaults `"_1"` / `"_2"`) and the
//! unmodified passthrough of a group whose opposite side is empty. They
//! differ only in which groups they emit when one side is empty:
//!
//! | strategy | left-only group | right-only group | both sides |
//! |---|---|---|---|
//! | [`InnerJoiner`] | dropped | dropped | cross product |
//! | [`OuterJoiner`] | passed through | passed through | cross product |
//! | [`LeftJoiner`]  | passed through | dropped | cross product |
//! | [`RightJoiner`] | dropped | passed through | cross product |

use crate::error::Result;
use crate::operations::{Joiner, join_groups};
use crate::row::Row;

#[derive(Clone)]
struct Suffixes {
    a: String,
    b: String,
}

impl Suffixes {
    fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }
}

impl Default for Suffixes {
    fn default() -> Self {
        Self::new("_1", "_2")
    }
}

/// Emit matched groups only.
#[derive(Clone, Default)]
pub struct InnerJoiner {
    suffixes: Suffixes,
}

impl InnerJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the collision suffixes for left and right columns.
    pub fn with_suffixes(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            suffixes: Suffixes::new(a, b),
        }
    }
}

impl Joiner for InnerJoiner {
    fn join(&self, keys: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        if left.is_empty() || right.is_empty() {
            return Ok(Vec::new());
        }
        Ok(join_groups(
            keys,
            &left,
            &right,
            &self.suffixes.a,
            &self.suffixes.b,
        ))
    }
}

/// Emit every group; one-sided groups pass through unmodified.
#[derive(Clone, Default)]
pub struct OuterJoiner {
    suffixes: Suffixes,
}

impl OuterJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suffixes(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            suffixes: Suffixes::new(a, b),
        }
    }
}

impl Joiner for OuterJoiner {
    fn join(&self, keys: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        Ok(join_groups(
            keys,
            &left,
            &right,
            &self.suffixes.a,
            &self.suffixes.b,
        ))
    }
}

/// Emit groups that have a left side; right-only groups are dropped.
#[derive(Clone, Default)]
pub struct LeftJoiner {
    suffixes: Suffixes,
}

impl LeftJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suffixes(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            suffixes: Suffixes::new(a, b),
        }
    }
}

impl Joiner for LeftJoiner {
    fn join(&self, keys: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        if left.is_empty() {
            return Ok(Vec::new());
        }
        Ok(join_groups(
            keys,
            &left,
            &right,
            &self.suffixes.a,
            &self.suffixes.b,
        ))
    }
}

/// Emit groups that have a right side; left-only groups are dropped.
#[derive(Clone, Default)]
pub struct RightJoiner {
    suffixes: Suffixes,
}

impl RightJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suffixes(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            suffixes: Suffixes::new(a, b),
        }
    }
}

impl Joiner for RightJoiner {
    fn join(&self, keys: &[String], left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        if right.is_empty() {
            return Ok(Vec::new());
        }
        Ok(join_groups(
            keys,
            &left,
            &right,
            &self.suffixes.a,
            &self.suffixes.b,
        ))
    }
}
