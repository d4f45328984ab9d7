//! Typed cell values and schema-grade casting.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::spec::document::DocValue;

/// A single cell value, before or after casting.
///
/// Rows come back from the schema collaborator as raw values (often
/// strings); [`ColumnType::cast`] converts them to their authoritative
/// representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Ordering across comparable values. Numeric kinds compare across
    /// each other; otherwise only like kinds compare. `None` when the two
    /// values are incomparable (including anything against `Null`).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            // `use Value::*` shadows the rust_decimal type here.
            (Decimal(a), Int(b)) => Some(a.cmp(&rust_decimal::Decimal::from(*b))),
            (Int(a), Decimal(b)) => Some(rust_decimal::Decimal::from(*a).cmp(b)),
            (Decimal(a), Float(b)) => a.to_string().parse::<f64>().ok()?.partial_cmp(b),
            (Float(a), Decimal(b)) => a.partial_cmp(&b.to_string().parse::<f64>().ok()?),
            (Str(a), Str(b)) => Some(a.cmp(b)),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Date(a), DateTime(b)) => Some(a.and_hms_opt(0, 0, 0)?.cmp(b)),
            (DateTime(a), Date(b)) => Some(a.cmp(&b.and_hms_opt(0, 0, 0)?)),
            _ => None,
        }
    }

    /// Build a value from a resolved document scalar. Sequences and
    /// mappings are not scalars and yield `None`.
    pub fn from_doc_scalar(doc: &DocValue) -> Option<Value> {
        match doc {
            DocValue::Null => Some(Value::Null),
            DocValue::Bool(b) => Some(Value::Bool(*b)),
            DocValue::Int(i) => Some(Value::Int(*i)),
            DocValue::Float(f) => Some(Value::Float(*f)),
            DocValue::String(s) => Some(Value::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

/// The authoritative type of a schema column.
///
/// Casting is schema-grade: it follows the column's native type semantics,
/// never the documentation-grade type declared on a spec field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Decimal,
    Boolean,
    String,
    Text,
    Date,
    DateTime,
}

impl ColumnType {
    /// Cast a raw value to this column's native representation.
    ///
    /// Values that already have the native kind pass through; strings are
    /// parsed; unparseable values become `Null` rather than surfacing a
    /// garbage representation. `Null` always passes through.
    pub fn cast(&self, value: Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match self {
            ColumnType::Integer => match value {
                Value::Int(_) => value,
                Value::Float(f) => Value::Int(f as i64),
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
                Value::Bool(b) => Value::Int(b as i64),
                _ => Value::Null,
            },
            ColumnType::Float => match value {
                Value::Float(_) => value,
                Value::Int(i) => Value::Float(i as f64),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
            ColumnType::Decimal => match value {
                Value::Decimal(_) => value,
                Value::Int(i) => Value::Decimal(Decimal::from(i)),
                Value::Float(f) => Decimal::try_from(f).map(Value::Decimal).unwrap_or(Value::Null),
                Value::Str(s) => s
                    .trim()
                    .parse::<Decimal>()
                    .map(Value::Decimal)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
            ColumnType::Boolean => match value {
                Value::Bool(_) => value,
                Value::Int(i) => Value::Bool(i != 0),
                Value::Str(s) => match s.trim() {
                    "t" | "true" | "1" | "T" | "TRUE" => Value::Bool(true),
                    "f" | "false" | "0" | "F" | "FALSE" => Value::Bool(false),
                    _ => Value::Null,
                },
                _ => Value::Null,
            },
            ColumnType::String | ColumnType::Text => match value {
                Value::Str(_) => value,
                other => Value::Str(other.to_string()),
            },
            ColumnType::Date => match value {
                Value::Date(_) => value,
                Value::DateTime(dt) => Value::Date(dt.date()),
                Value::Str(s) => parse_date(s.trim()).map(Value::Date).unwrap_or(Value::Null),
                _ => Value::Null,
            },
            ColumnType::DateTime => match value {
                Value::DateTime(_) => value,
                Value::Date(d) => d
                    .and_hms_opt(0, 0, 0)
                    .map(Value::DateTime)
                    .unwrap_or(Value::Null),
                Value::Str(s) => parse_datetime(s.trim())
                    .map(Value::DateTime)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    // ISO-8601 with or without timezone offset, then the space-separated
    // form databases commonly return.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
