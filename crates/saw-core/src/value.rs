//! Normalized cell values.
//!
//! Raw engine results are variants (mostly padded strings). After cleaning,
//! each cell is a [`Value`]: a genuine number for numeric fields and a
//! trimmed string for text fields.

use crate::variant::Variant;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Not yet cleaned, or no data.
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Real(x) if x.fract() == 0.0 && x.is_finite() => Some(*x as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Real(_))
    }

    /// Total order used for sorting: numbers before text before nulls,
    /// numbers compared by value with NaN last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => match (self, other) {
                (Value::Text(a), Value::Text(b)) => a.cmp(b),
                (Value::Text(_), _) => Ordering::Less,
                (_, Value::Text(_)) => Ordering::Greater,
                _ => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&Variant> for Value {
    fn from(v: &Variant) -> Self {
        match v {
            Variant::Empty => Value::Null,
            Variant::Bool(b) => Value::Int(*b as i64),
            Variant::Int(i) => Value::Int(*i),
            Variant::Real(x) => Value::Real(*x),
            Variant::Str(s) => Value::Text(s.clone()),
            Variant::Array(_) => Value::Text(v.to_string()),
        }
    }
}

impl From<Variant> for Value {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Str(s) => Value::Text(s),
            other => Value::from(&other),
        }
    }
}

impl From<&Value> for Variant {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Variant::Empty,
            Value::Int(i) => Variant::Int(*i),
            Value::Real(x) => Variant::Real(*x),
            Value::Text(s) => Variant::Str(s.clone()),
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
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_sort_before_text_and_nan_last() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Real(f64::NAN),
            Value::Int(3),
            Value::Real(1.5),
            Value::Null,
            Value::Text("a".into()),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values[0], Value::Real(1.5));
        assert_eq!(values[1], Value::Int(3));
        assert!(matches!(values[2], Value::Real(x) if x.is_nan()));
        assert_eq!(values[3], Value::Text("a".into()));
        assert_eq!(values[5], Value::Null);
    }

    #[test]
    fn variant_round_trip_keeps_numbers() {
        let v = Variant::from(&Value::Real(0.25));
        assert_eq!(Value::from(&v), Value::Real(0.25));
        assert_eq!(Value::from(Variant::Bool(true)), Value::Int(1));
    }
}
