//! Bind arguments and dialect helpers.

use serde::Serialize;

use crate::config::Driver;

/// A positional query argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text
    String(String),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// SQL NULL
    Null,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "NULL"),
        }
    }
}

/// Render arguments for log events.
pub fn args_for_log(args: &[Value]) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| format!("{args:?}"))
}

/// Get the positional placeholder for the given driver (1-based).
pub fn placeholder(driver: Driver, index: usize) -> String {
    match driver {
        Driver::Postgres => format!("${}", index),
        Driver::MySql | Driver::Sqlite => "?".to_string(),
    }
}

/// Generate SQL for a list of placeholders.
pub fn placeholders(driver: Driver, count: usize, start: usize) -> String {
    (start..start + count)
        .map(|i| placeholder(driver, i))
        .collect::<Vec<_>>()
        .join(", ")
}
