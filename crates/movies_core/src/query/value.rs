//! Owned SQLite values and row mappings.
//!
//! # Invariants
//! - A `RowMapping` is keyed by result column alias; equality ignores
//!   column order.
//! - When two result columns share an alias, the later column wins.

use rusqlite::types::ValueRef;
use serde::Serialize;
use std::collections::BTreeMap;

/// One result record keyed by column alias.
pub type RowMapping = BTreeMap<String, SqlValue>;

/// Owned copy of one SQLite cell.
///
/// Serialized untagged, so a JSON dump of a row reads as plain values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to `f64`, so aggregates that may come back either way
    /// can be read uniformly.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(value) => Self::Integer(value),
            ValueRef::Real(value) => Self::Real(value),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Builds a [`RowMapping`] literal.
///
/// ```
/// use movies_core::{row, SqlValue};
///
/// let expected = row! { "genre" => "Crime", "avg_rating" => 4.75 };
/// assert_eq!(expected["genre"], SqlValue::from("Crime"));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::RowMapping::new()
    };
    ($($alias:expr => $value:expr),+ $(,)?) => {{
        let mut mapping = $crate::RowMapping::new();
        $(
            mapping.insert(::std::string::String::from($alias), $crate::SqlValue::from($value));
        )+
        mapping
    }};
}
