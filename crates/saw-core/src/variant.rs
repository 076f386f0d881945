//! Loosely-typed values as they cross the automation boundary.
//!
//! The engine speaks in variants: scalars, strings, and (nested) arrays. A
//! remote call's arguments and its raw result are both [`Variant`]s; nothing
//! above the transport should have to inspect one before the classifier has.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single automation value.
///
/// Serialized untagged so the JSON form is the natural one: `null`, `true`,
/// `3`, `1.5`, `"text"`, `[...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Variant {
    /// Missing value (`None` / `VT_EMPTY`).
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    /// Positional tuple or array; results are always arrays except for the
    /// single integer-returning function.
    Array(Vec<Variant>),
}

impl Variant {
    /// Build an array of strings, the shape of every field/parameter list argument.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Variant::Array(items.into_iter().map(|s| Variant::Str(s.into())).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Variant]> {
        match self {
            Variant::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Variant>> {
        match self {
            Variant::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            Variant::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            Variant::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// Short label for the variant's shape, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Variant::Empty => "empty",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "integer",
            Variant::Real(_) => "real",
            Variant::Str(_) => "string",
            Variant::Array(_) => "array",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => Ok(()),
            Variant::Bool(b) => write!(f, "{}", if *b { "YES" } else { "NO" }),
            Variant::Int(i) => write!(f, "{i}"),
            Variant::Real(x) => write!(f, "{x}"),
            Variant::Str(s) => f.write_str(s),
            Variant::Array(items) => {
                f.write_str("(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::Str(s.to_string())
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::Str(s)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int(v as i64)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Real(v)
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(items: Vec<Variant>) -> Self {
        Variant::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_form_is_natural() {
        let v = Variant::Array(vec![
            Variant::Str(String::new()),
            Variant::Array(vec![Variant::Int(1), Variant::Real(1.5), Variant::Empty]),
        ]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"["",[1,1.5,null]]"#);

        let back: Variant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn strings_builds_string_array() {
        let v = Variant::strings(["BusNum", "BusName"]);
        assert_eq!(
            v.as_array().unwrap(),
            &[Variant::from("BusNum"), Variant::from("BusName")]
        );
    }

    #[test]
    fn integer_parsing_accepts_padded_strings() {
        assert_eq!(Variant::from("  42 ").as_i64(), Some(42));
        assert_eq!(Variant::from("4.2").as_i64(), None);
    }
}
