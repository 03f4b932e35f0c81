//! Cell Value Module
//!
//! Scalar and structured values that a frame cell can hold.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Value ==
/// A single cell of a [`DataFrame`](super::DataFrame).
///
/// Maps use a `BTreeMap` so their keys always serialize in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    // == Canonical Check ==
    /// Verifies the value has a canonical textual form.
    ///
    /// Non-finite floats are rejected: JSON has no representation for them
    /// and silently writing `null` would collide with [`Value::Null`].
    pub fn ensure_canonical(&self) -> Result<()> {
        match self {
            Value::Float(f) if !f.is_finite() => Err(CacheError::Serialization(format!(
                "Non-finite float {} has no canonical form",
                f
            ))),
            Value::List(items) => items.iter().try_for_each(Value::ensure_canonical),
            Value::Map(map) => map.values().try_for_each(Value::ensure_canonical),
            _ => Ok(()),
        }
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// == Conversions ==
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
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

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_nan_rejected() {
        let value = Value::List(vec![Value::Int(1), Value::Float(f64::NAN)]);
        assert!(matches!(
            value.ensure_canonical(),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn test_map_with_infinity_rejected() {
        let mut map = BTreeMap::new();
        map.insert("x".to_string(), Value::Float(f64::INFINITY));
        assert!(Value::Map(map).ensure_canonical().is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("a"), Value::Str("a".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert!(Value::Null.is_null());
    }
}
