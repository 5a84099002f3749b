//! File-backed source helper.
//!
//! [`file_source`] adapts a line-oriented text file into a
//! [`SourceFactory`]: every invocation opens the file afresh, yields one
//! parsed [`Row`] per line, and closes the file when the stream is drained
//! or dropped. Parsing is delegated to a user-supplied `parse(line) -> Row`
//! function; [`parse_json_row`] is a ready-made parser for JSON-object
//! lines.

use crate::error::{FlowError, Result};
use crate::operations::{RowStream, SourceFactory};
use crate::row::{Row, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;
use std::sync::Arc;

/// Build a [`SourceFactory`] reading one row per line from a text file.
///
/// The file is opened once per factory invocation (once per consuming
/// branch per run) and closed on all exit paths by dropping the reader.
/// A failed open surfaces as a single `Err(Io)` item; a failed parse fuses
/// the stream after its error.
pub fn file_source<P>(path: impl Into<PathBuf>, parser: P) -> SourceFactory
where
    P: Fn(&str) -> Result<Row> + Send + Sync + 'static,
{
    let path = path.into();
    let parser = Arc::new(parser);
    Arc::new(move || match File::open(&path) {
        Ok(file) => Box::new(LineStream {
            lines: BufReader::new(file).lines(),
            parser: Arc::clone(&parser),
            done: false,
        }) as RowStream,
        Err(e) => Box::new(std::iter::once(Err(FlowError::Io(e)))) as RowStream,
    })
}

struct LineStream<P> {
    lines: Lines<BufReader<File>>,
    parser: Arc<P>,
    done: bool,
}

impl<P> Iterator for LineStream<P>
where
    P: Fn(&str) -> Result<Row>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lines.next()? {
            Ok(line) => match (self.parser)(&line) {
                Ok(row) => Some(Ok(row)),
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            },
            Err(e) => {
                self.done = true;
                Some(Err(FlowError::Io(e)))
            }
        }
    }
}

/// Parse one JSON object line into a [`Row`].
///
/// Numbers become `Int` when they fit an `i64` and `Float` otherwise;
/// strings and arrays map to `Str` and `List`. JSON values with no row
/// representation (null, bool, nested objects) are a `TypeMismatch`.
/// Malformed JSON is reported as a user-parser failure.
pub fn parse_json_row(line: &str) -> Result<Row> {
    let parsed: serde_json::Value =
        serde_json::from_str(line).map_err(|e| anyhow::anyhow!("invalid json row: {e}"))?;
    match parsed {
        serde_json::Value::Object(fields) => {
            let mut row = Row::new();
            for (name, value) in fields {
                row.insert(name, json_to_value(value)?);
            }
            Ok(row)
        }
        other => Err(FlowError::TypeMismatch {
            expected: "json object",
            found: json_type_name(&other),
        }),
    }
}

fn json_to_value(value: serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::from(f))
            } else {
                Err(FlowError::TypeMismatch {
                    expected: "int or float",
                    found: "number",
                })
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Array(items) => Ok(Value::List(
            items
                .into_iter()
                .map(json_to_value)
                .collect::<Result<Vec<_>>>()?,
        )),
        other => Err(FlowError::TypeMismatch {
            expected: "int, float, str or list",
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
