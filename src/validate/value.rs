//! Dynamically typed keys and values for scenario files

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::pair::TypeTag;

/// A scalar whose runtime type is part of its identity
///
/// `Long(5)` and `Text("5")` are different values, and comparing them at the
/// same position reports a type mismatch rather than a plain missing output.
/// Deserialization is untagged: YAML/JSON integers become `Long`, other
/// numbers `Double`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Long(i64),
    Double(OrderedFloat<f64>),
    Text(String),
    /// Only constructed programmatically
    #[serde(skip_deserializing)]
    Int(i32),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }
}

impl TypeTag for Value {
    fn type_tag(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Long(_) => "Long",
            Value::Double(_) => "Double",
            Value::Text(_) => "Text",
            Value::Int(_) => "Int",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Long(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(OrderedFloat(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
