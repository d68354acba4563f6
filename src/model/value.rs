// Copyright 2024 Shifa Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Answer values stored in a patient record

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A single observation value
///
/// Values mirror the JSON data model without `null`: an unanswered field is
/// absent from the record rather than stored as null.
#[derive(Clone, PartialEq)]
pub enum FieldValue {
    /// Boolean value
    Boolean(bool),

    /// Integer value (64-bit signed)
    Integer(i64),

    /// Decimal value with arbitrary precision
    Decimal(Decimal),

    /// Text value
    Text(String),

    /// Ordered list of values (multi-select answers)
    List(Vec<FieldValue>),

    /// Nested group of fields (e.g. `vital_signs`)
    Object(IndexMap<String, FieldValue>),
}

/// Error raised when a JSON value cannot be represented as a [`FieldValue`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// `null` is not an answer
    #[error("null is not a valid field value")]
    Null,

    /// Number that is neither an `i64` nor a representable decimal
    #[error("number {0} cannot be represented as a decimal")]
    UnrepresentableNumber(String),
}

impl FieldValue {
    /// Get the type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a list value from anything convertible into field values
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Try to convert to an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            _ => None,
        }
    }

    /// Numeric view used by comparisons and arithmetic
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Check whether the value is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal(_))
    }

    /// Check whether the value is a scalar (not a list or object)
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Object(_))
    }

    /// Truthiness used by the logical connectives
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Decimal(d) => !d.is_zero(),
            Self::Text(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Object(fields) => !fields.is_empty(),
        }
    }

    /// Equality with numeric promotion between integers and decimals
    pub fn loose_eq(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_decimal() == b.as_decimal(),
            (a, b) => a == b,
        }
    }

    /// Ordering between two numbers or two texts; `None` for other pairs
    pub fn partial_compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_decimal(), b.as_decimal()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => None,
            },
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Convert from serde_json::Value to FieldValue
impl TryFrom<Value> for FieldValue {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Err(ValueError::Null),
            Value::Bool(b) => Ok(Self::Boolean(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else {
                    // Going through the textual form keeps `36.6` exact
                    let repr = n.to_string();
                    Decimal::from_str(&repr)
                        .or_else(|_| Decimal::from_scientific(&repr))
                        .map(Self::Decimal)
                        .map_err(|_| ValueError::UnrepresentableNumber(repr))
                }
            }
            Value::String(s) => Ok(Self::Text(s)),
            Value::Array(items) => items
                .into_iter()
                .map(FieldValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Value::Object(fields) => fields
                .into_iter()
                .map(|(key, value)| FieldValue::try_from(value).map(|v| (key, v)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Self::Object),
        }
    }
}

/// Convert from FieldValue to serde_json::Value
impl From<&FieldValue> for Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::Number((*i).into()),
            FieldValue::Decimal(d) => {
                // Convert decimal to JSON number - may lose precision
                match d.to_f64().and_then(serde_json::Number::from_f64) {
                    Some(num) => Value::Number(num),
                    None => Value::String(d.to_string()),
                }
            }
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            FieldValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        FieldValue::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(fields) => {
                write!(f, "{{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Object(fields) => f.debug_map().entries(fields).finish(),
            other => write!(f, "{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion() {
        let value = FieldValue::try_from(json!({
            "heart_rate": 120,
            "temperature": 38.5,
            "injuries": ["head", "chest"],
        }))
        .unwrap();

        match &value {
            FieldValue::Object(fields) => {
                assert_eq!(fields["heart_rate"], FieldValue::Integer(120));
                assert_eq!(
                    fields["temperature"],
                    FieldValue::Decimal(Decimal::from_str("38.5").unwrap())
                );
                assert_eq!(fields["injuries"], FieldValue::list(["head", "chest"]));
            }
            other => panic!("Expected object, got {other:?}"),
        }

        assert_eq!(Value::from(&value)["temperature"], json!(38.5));
    }

    #[test]
    fn test_null_is_rejected() {
        assert_eq!(FieldValue::try_from(Value::Null), Err(ValueError::Null));
        assert!(FieldValue::try_from(json!([1, null])).is_err());
    }

    #[test]
    fn test_loose_equality() {
        let three = FieldValue::Integer(3);
        let three_dec = FieldValue::Decimal(Decimal::from_str("3.0").unwrap());
        assert!(three.loose_eq(&three_dec));
        assert!(!three.loose_eq(&FieldValue::text("3")));
        assert!(FieldValue::list([1, 2]).loose_eq(&FieldValue::list([1, 2])));
    }

    #[test]
    fn test_partial_compare() {
        assert_eq!(
            FieldValue::Integer(7).partial_compare(&FieldValue::Integer(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::text("b").partial_compare(&FieldValue::text("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            FieldValue::Integer(1).partial_compare(&FieldValue::text("1")),
            None
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(FieldValue::Boolean(true).is_truthy());
        assert!(!FieldValue::Integer(0).is_truthy());
        assert!(!FieldValue::text("").is_truthy());
        assert!(FieldValue::list(["x"]).is_truthy());
        assert!(!FieldValue::List(vec![]).is_truthy());
    }
}
