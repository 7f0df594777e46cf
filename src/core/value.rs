//! Dynamically-typed values for properties and conditions.
//!
//! Conditions run against a heterogeneous environment, so every property,
//! constant, literal and function result is a [`Value`].
//!
//! ## Value Kinds
//!
//! - `Nil`: Absent value (unknown property, stubbed function)
//! - `Bool`, `String`, `Int`, `Float`: The four property kinds
//! - `Array`: Only produced by array literals inside conditions

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a [`Value`].
///
/// Property providers declare one of `Bool`, `String`, `Int` or `Float`;
/// the other kinds only appear during evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Nil,
    Bool,
    String,
    Int,
    Float,
    Array,
}

impl ValueKind {
    /// Can a property provider declare this kind?
    #[must_use]
    pub const fn is_property_kind(self) -> bool {
        matches!(
            self,
            ValueKind::Bool | ValueKind::String | ValueKind::Int | ValueKind::Float
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// A runtime value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value.
    #[default]
    Nil,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Array literal result.
    Array(Vec<Value>),
}

impl Value {
    /// Get the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// Check for nil.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get as bool if this is a Bool value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as integer if this is an Int value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float. Ints are widened.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as string reference if this is a String value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is an Array value.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Loose equality used by `==` and `in`.
    ///
    /// Ints and floats compare numerically; every other pair must have the same kind.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

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

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::Nil.kind(), ValueKind::Nil);
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
        assert_eq!(Value::from(3i32).kind(), ValueKind::Int);
        assert_eq!(Value::from(1.5).kind(), ValueKind::Float);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::Array(vec![]).kind(), ValueKind::Array);
    }

    #[test]
    fn test_property_kinds() {
        assert!(ValueKind::Bool.is_property_kind());
        assert!(ValueKind::Float.is_property_kind());
        assert!(!ValueKind::Nil.is_property_kind());
        assert!(!ValueKind::Array.is_property_kind());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(4).as_int(), Some(4));
        assert_eq!(Value::Int(4).as_float(), Some(4.0));
        assert_eq!(Value::Int(4).as_bool(), None);
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert!(Value::Nil.is_nil());
    }

    #[test]
    fn test_loose_eq_numeric() {
        assert!(Value::Int(2).loose_eq(&Value::Float(2.0)));
        assert!(!Value::Int(2).loose_eq(&Value::from("2")));
        assert!(Value::Nil.loose_eq(&Value::Nil));
    }

    #[test]
    fn test_option_conversion() {
        let none: Option<i64> = None;
        assert_eq!(Value::from(none), Value::Nil);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }

    #[test]
    fn test_display() {
        let arr = Value::Array(vec![Value::Int(1), Value::from("a"), Value::Nil]);
        assert_eq!(arr.to_string(), "[1, \"a\", nil]");
        assert_eq!(ValueKind::Float.to_string(), "float");
    }

    #[test]
    fn test_value_json() {
        let json = serde_json::to_string(&Value::Int(5)).unwrap();
        assert_eq!(json, "5");
        let parsed: Value = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(parsed, Value::from("x"));
    }
}
