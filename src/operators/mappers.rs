//! Per-row transforms.
//!
//! Text normalization ([`LowerCase`], [`FilterPunctuation`], [`Split`]),
//! row shaping ([`Filter`], [`Project`], [`Identity`]), arithmetic
//! ([`Product`], [`LogRatio`], [`Speed`]), date handling ([`ParseDate`],
//! [`WeekDay`], [`Hour`], [`DeltaTime`]) and geometry ([`Haversine`]).
//!
//! All of these follow the same shape: a small configuration struct with a
//! `new` constructor, reading its input columns with
//! [`Row::require`](crate::Row::require) so absent columns surface as
//! `MissingColumn`.

use crate::error::{FlowError, Result};
use crate::operations::Mapper;
use crate::row::{Row, Value};
use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use std::sync::LazyLock;

/// Yield the row unchanged.
#[derive(Clone, Copy, Default)]
pub struct Identity;

impl Identity {
    pub fn new() -> Self {
        Self
    }
}

impl Mapper for Identity {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        Ok(vec![row])
    }
}

/// Keep only rows satisfying a predicate.
pub struct Filter<F> {
    condition: F,
}

impl<F> Filter<F>
where
    F: Fn(&Row) -> Result<bool> + Send + Sync + 'static,
{
    pub fn new(condition: F) -> Self {
        Self { condition }
    }
}

impl<F> Mapper for Filter<F>
where
    F: Fn(&Row) -> Result<bool> + Send + Sync + 'static,
{
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        if (self.condition)(&row)? {
            Ok(vec![row])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Keep only the listed columns, in the listed order.
#[derive(Clone)]
pub struct Project {
    columns: Vec<String>,
}

impl Project {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

impl Mapper for Project {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        let mut out = Row::new();
        for column in &self.columns {
            out.insert(column.as_str(), row.require(column)?.clone());
        }
        Ok(vec![out])
    }
}

/// Split one row into many on a string column.
///
/// Without an explicit separator the column splits on whitespace runs
/// (empty pieces discarded); with one, every occurrence separates (empty
/// pieces kept). Each piece gets a copy of the row with the column
/// replaced.
#[derive(Clone)]
pub struct Split {
    column: String,
    separator: Option<String>,
}

impl Split {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            separator: None,
        }
    }

    pub fn with_separator(column: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            separator: Some(separator.into()),
        }
    }
}

impl Mapper for Split {
    fn map(&self, row: Row) -> Result<Vec<Row>> {
        let pieces: Vec<String> = {
            let text = row.require(&self.column)?.as_str()?;
            match &self.separator {
                None => text.split_whitespace().map(str::to_string).collect(),
                Some(sep) => text.split(sep.as_str()).map(str::to_string).collect(),
            }
        };
        let mut out = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let mut copy = row.clone();
            copy.insert(self.column.as_str(), piece);
            out.push(copy);
        }
        Ok(out)
    }
}

/// Lowercase a string column in place.
#[derive(Clone)]
pub struct LowerCase {
    column: String,
}

impl LowerCase {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for LowerCase {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let lowered = row.require(&self.column)?.as_str()?.to_lowercase();
        row.insert(self.column.as_str(), lowered);
        Ok(vec![row])
    }
}

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[[:punct:]]").expect("static pattern"));

/// Strip ASCII punctuation from a string column.
#[derive(Clone)]
pub struct FilterPunctuation {
    column: String,
}

impl FilterPunctuation {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for FilterPunctuation {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let stripped = PUNCTUATION
            .replace_all(row.require(&self.column)?.as_str()?, "")
            .into_owned();
        row.insert(self.column.as_str(), stripped);
        Ok(vec![row])
    }
}

/// Multiply numeric columns into a result column (always `Float`).
#[derive(Clone)]
pub struct Product {
    columns: Vec<String>,
    result_column: String,
}

impl Product {
    pub fn new(columns: &[&str], result_column: impl Into<String>) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for Product {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let mut product = 1.0;
        for column in &self.columns {
            product *= row.require(column)?.as_f64()?;
        }
        row.insert(self.result_column.as_str(), product);
        Ok(vec![row])
    }
}

/// Add `ln(numerator / denominator)` of two numeric columns.
///
/// This is the idf building block: with the total document count over the
/// per-word document count it yields inverse document frequency, and with a
/// per-document frequency over a corpus frequency it yields pointwise
/// mutual information.
#[derive(Clone)]
pub struct LogRatio {
    numerator: String,
    denominator: String,
    result_column: String,
}

impl LogRatio {
    pub fn new(
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        result_column: impl Into<String>,
    ) -> Self {
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for LogRatio {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let numerator = row.require(&self.numerator)?.as_f64()?;
        let denominator = row.require(&self.denominator)?.as_f64()?;
        row.insert(self.result_column.as_str(), (numerator / denominator).ln());
        Ok(vec![row])
    }
}

const DATE_FORMAT: &str = "%Y%m%dT%H%M%S%.f";

/// Parse a `YYYYMMDDTHHMMSS[.ffffff]` string column into a `DateTime`
/// result column. A missing fraction is treated as `.0`.
#[derive(Clone)]
pub struct ParseDate {
    column: String,
    result_column: String,
}

impl ParseDate {
    pub fn new(column: impl Into<String>, result_column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for ParseDate {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let padded = {
            let raw = row.require(&self.column)?.as_str()?;
            if raw.contains('.') {
                raw.to_string()
            } else {
                format!("{raw}.0")
            }
        };
        let parsed = NaiveDateTime::parse_from_str(&padded, DATE_FORMAT)
            .map_err(|e| anyhow::anyhow!("invalid datetime `{padded}`: {e}"))?;
        row.insert(self.result_column.as_str(), parsed);
        Ok(vec![row])
    }
}

/// Add the three-letter weekday of a `DateTime` column.
#[derive(Clone)]
pub struct WeekDay {
    column: String,
    result_column: String,
}

impl WeekDay {
    pub fn new(column: impl Into<String>, result_column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for WeekDay {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let at = row.require(&self.column)?.as_datetime()?;
        row.insert(self.result_column.as_str(), at.format("%a").to_string());
        Ok(vec![row])
    }
}

/// Add the hour (0–23) of a `DateTime` column.
#[derive(Clone)]
pub struct Hour {
    column: String,
    result_column: String,
}

impl Hour {
    pub fn new(column: impl Into<String>, result_column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for Hour {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let at = row.require(&self.column)?.as_datetime()?;
        row.insert(self.result_column.as_str(), at.hour());
        Ok(vec![row])
    }
}

/// Add the elapsed time between two `DateTime` columns, in fractional
/// hours. Negative when the end precedes the start.
#[derive(Clone)]
pub struct DeltaTime {
    enter_column: String,
    leave_column: String,
    result_column: String,
}

impl DeltaTime {
    pub fn new(
        enter_column: impl Into<String>,
        leave_column: impl Into<String>,
        result_column: impl Into<String>,
    ) -> Self {
        Self {
            enter_column: enter_column.into(),
            leave_column: leave_column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for DeltaTime {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let enter = row.require(&self.enter_column)?.as_datetime()?;
        let leave = row.require(&self.leave_column)?.as_datetime()?;
        let hours = (leave - enter).num_milliseconds() as f64 / 3_600_000.0;
        row.insert(self.result_column.as_str(), hours);
        Ok(vec![row])
    }
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Add the great-circle distance in kilometers between two points, each a
/// `[longitude, latitude]` list column in degrees.
#[derive(Clone)]
pub struct Haversine {
    start_column: String,
    end_column: String,
    result_column: String,
}

impl Haversine {
    pub fn new(
        start_column: impl Into<String>,
        end_column: impl Into<String>,
        result_column: impl Into<String>,
    ) -> Self {
        Self {
            start_column: start_column.into(),
            end_column: end_column.into(),
            result_column: result_column.into(),
        }
    }
}

fn lon_lat_radians(value: &Value) -> Result<(f64, f64)> {
    match value.as_list()? {
        [lon, lat] => Ok((lon.as_f64()?.to_radians(), lat.as_f64()?.to_radians())),
        _ => Err(FlowError::TypeMismatch {
            expected: "[longitude, latitude] pair",
            found: "list",
        }),
    }
}

impl Mapper for Haversine {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let (lon1, lat1) = lon_lat_radians(row.require(&self.start_column)?)?;
        let (lon2, lat2) = lon_lat_radians(row.require(&self.end_column)?)?;
        let d_lon = lon2 - lon1;
        let d_lat = lat2 - lat1;
        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let distance = 2.0 * a.sqrt().asin() * EARTH_RADIUS_KM;
        row.insert(self.result_column.as_str(), distance);
        Ok(vec![row])
    }
}

/// Add `length / dt` of two numeric columns (km/h for km and hours).
///
/// A zero `dt` is reported as a user error instead of producing infinity.
#[derive(Clone)]
pub struct Speed {
    length_column: String,
    dt_column: String,
    result_column: String,
}

impl Speed {
    pub fn new(
        length_column: impl Into<String>,
        dt_column: impl Into<String>,
        result_column: impl Into<String>,
    ) -> Self {
        Self {
            length_column: length_column.into(),
            dt_column: dt_column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Mapper for Speed {
    fn map(&self, mut row: Row) -> Result<Vec<Row>> {
        let length = row.require(&self.length_column)?.as_f64()?;
        let dt = row.require(&self.dt_column)?.as_f64()?;
        if dt == 0.0 {
            return Err(anyhow::anyhow!("zero travel time in column `{}`", self.dt_column).into());
        }
        row.insert(self.result_column.as_str(), length / dt);
        Ok(vec![row])
    }
}
