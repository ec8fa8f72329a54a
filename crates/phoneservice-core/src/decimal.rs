//! JSON codec for decimal prices.
//!
//! Prices are held as [`BigDecimal`] and written to JSON as plain numbers
//! carrying the exact decimal text: integral values as integers, everything
//! else in normalized form. serde_json's `arbitrary_precision` keeps the digits
//! on both sides. On input both JSON numbers and numeric strings are accepted.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Parses a decimal from its textual form (`"1"`, `"10.50"`, `"1e3"`).
pub fn parse_decimal(raw: &str) -> Result<BigDecimal, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_decimal(raw));
    }
    BigDecimal::from_str(trimmed).map_err(|_| CoreError::invalid_decimal(raw))
}

/// Converts a decimal into the JSON number written on the wire.
pub fn to_json_number(value: &BigDecimal) -> Option<serde_json::Number> {
    if value.is_integer()
        && let Some(i) = value.to_i64()
    {
        return Some(serde_json::Number::from(i));
    }
    serde_json::Number::from_str(&value.normalized().to_string()).ok()
}

fn from_json_value(value: Value) -> Result<Option<BigDecimal>, CoreError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => parse_decimal(&n.to_string()).map(Some),
        Value::String(s) => parse_decimal(&s).map(Some),
        other => Err(CoreError::invalid_decimal(other.to_string())),
    }
}

/// `#[serde(with = "...")]` helpers for `Option<BigDecimal>` fields.
pub mod option {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            None => serializer.serialize_none(),
            Some(d) => match to_json_number(d) {
                Some(n) => n.serialize(serializer),
                None => serializer.serialize_str(&d.to_string()),
            },
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        from_json_value(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}
