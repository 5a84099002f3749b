//! The dynamic row model: tagged values, insertion-ordered rows, key tuples.
//!
//! Rows are open string→value mappings with no enforced schema; operators
//! add, remove and rename columns freely as rows travel through a graph.
//! Values carry their own type tag ([`Value`]) and order fallibly: values of
//! the same tag compare naturally, `Int` and `Float` cross-compare
//! numerically, and anything else refuses with
//! [`NotComparable`](crate::FlowError::NotComparable).
//!
//! The ordering key of sort, reduce and join is the **key tuple**: the
//! values of an ordered column list extracted from a row, compared
//! lexicographically (see [`Row::key_tuple`] and [`cmp_key_tuples`]).
//!
//! # Example
//! ```
//! use rowflow::{row, Value};
//!
//! let r = row! { "text" => "hello", "count" => 2 };
//! assert_eq!(r.get("count"), Some(&Value::Int(2)));
//! ```

use crate::error::{FlowError, Result};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A dynamically typed cell value.
///
/// `Float` wraps [`OrderedFloat`] so values are `Eq + Hash` and usable as
/// grouping keys; `DateTime` is a naive timestamp (the engine attaches no
/// timezone semantics); `Blob` carries opaque user bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    List(Vec<Value>),
    DateTime(NaiveDateTime),
    Blob(Vec<u8>),
}

impl Value {
    /// Static name of this value's tag, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::DateTime(_) => "datetime",
            Value::Blob(_) => "blob",
        }
    }

    /// The integer payload, or `TypeMismatch`.
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(FlowError::TypeMismatch {
                expected: "int",
                found: other.type_name(),
            }),
        }
    }

    /// Numeric payload widened to `f64`; accepts `Int` and `Float`.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(v.0),
            other => Err(FlowError::TypeMismatch {
                expected: "numeric",
                found: other.type_name(),
            }),
        }
    }

    /// The string payload, or `TypeMismatch`.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(v) => Ok(v),
            other => Err(FlowError::TypeMismatch {
                expected: "str",
                found: other.type_name(),
            }),
        }
    }

    /// The list payload, or `TypeMismatch`.
    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(v) => Ok(v),
            other => Err(FlowError::TypeMismatch {
                expected: "list",
                found: other.type_name(),
            }),
        }
    }

    /// The timestamp payload, or `TypeMismatch`.
    pub fn as_datetime(&self) -> Result<NaiveDateTime> {
        match self {
            Value::DateTime(v) => Ok(*v),
            other => Err(FlowError::TypeMismatch {
                expected: "datetime",
                found: other.type_name(),
            }),
        }
    }

    /// Order two values.
    ///
    /// Same-tag values compare naturally (`List` lexicographically,
    /// element-wise). `Int` and `Float` cross-compare through `f64`. Any
    /// other pairing is [`NotComparable`](FlowError::NotComparable).
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => Ok((*a as f64).total_cmp(&b.0)),
            (Value::Float(a), Value::Int(b)) => Ok(a.0.total_cmp(&(*b as f64))),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Ok(a.cmp(b)),
            (Value::Blob(a), Value::Blob(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => continue,
                        non_eq => return Ok(non_eq),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            (a, b) => Err(FlowError::NotComparable {
                left: a.type_name(),
                right: b.type_name(),
            }),
        }
    }

    /// Numeric addition: `Int + Int` stays `Int`, any other numeric pairing
    /// widens to `Float`. Non-numeric operands are `TypeMismatch`.
    pub fn try_add(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            _ => Ok(Value::from(self.as_f64()? + other.as_f64()?)),
        }
    }

    /// Ordering class of this value's tag. Values of one class are mutually
    /// comparable; `Int` and `Float` share the numeric class.
    pub(crate) fn key_class(&self) -> u8 {
        match self {
            Value::Int(_) | Value::Float(_) => 0,
            Value::Str(_) => 1,
            Value::List(_) => 2,
            Value::DateTime(_) => 3,
            Value::Blob(_) => 4,
        }
    }
}

/// Infallible total order over values, for use inside sort algorithms.
///
/// Agrees with [`Value::try_cmp`] wherever that succeeds; pairings that
/// `try_cmp` rejects fall back to ordering by class. Callers that need the
/// `NotComparable` error validate key classes separately before sorting.
pub(crate) fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            for (i, j) in x.iter().zip(y.iter()) {
                match sort_cmp(i, j) {
                    Ordering::Equal => continue,
                    non_eq => return non_eq,
                }
            }
            x.len().cmp(&y.len())
        }
        _ => a
            .try_cmp(b)
            .unwrap_or_else(|_| a.key_class().cmp(&b.key_class())),
    }
}

/// Lexicographic [`sort_cmp`] over key tuples.
pub(crate) fn sort_cmp_tuples(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match sort_cmp(x, y) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }
    a.len().cmp(&b.len())
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

/// One record of a row stream: an insertion-ordered column→value mapping.
///
/// Equality is order-insensitive (two rows are equal when they hold the same
/// column/value pairs), while iteration and serialization preserve insertion
/// order -- joins rely on that to lay out combined columns deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    /// An empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a column.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(name.into(), value.into());
    }

    /// Look a column up.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Look a column up, failing with `MissingColumn` when absent.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.columns
            .get(name)
            .ok_or_else(|| FlowError::MissingColumn(name.to_string()))
    }

    /// Remove a column, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.columns.shift_remove(name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Extract this row's key tuple for the given column list.
    ///
    /// Fails with `MissingColumn` on the first absent column.
    pub fn key_tuple(&self, keys: &[String]) -> Result<KeyTuple> {
        keys.iter()
            .map(|k| self.require(k).cloned())
            .collect::<Result<Vec<_>>>()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// The values of an ordered column list extracted from one row.
pub type KeyTuple = Vec<Value>;

/// Lexicographic, fallible comparison of two key tuples.
///
/// Tuples extracted with the same column list always have equal length; the
/// trailing length comparison only matters for hand-built tuples.
pub fn cmp_key_tuples(a: &[Value], b: &[Value]) -> Result<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.try_cmp(y)? {
            Ordering::Equal => continue,
            non_eq => return Ok(non_eq),
        }
    }
    Ok(a.len().cmp(&b.len()))
}

/// Build a [`Row`] literal.
///
/// ```
/// use rowflow::row;
///
/// let r = row! { "doc_id" => 4, "text" => "little", "tf" => 0.5 };
/// assert_eq!(r.len(), 3);
/// ```
#[macro_export]
macro_rules! row {
    ($($name:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut r = $crate::Row::new();
        $( r.insert($name, $crate::Value::from($value)); )*
        r
    }};
}
