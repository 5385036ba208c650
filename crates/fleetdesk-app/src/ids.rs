// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a remote record. The store hands out either numeric or
/// string keys depending on the entity, so both are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Reads an identifier out of a JSON value, returning `None` for anything
    /// falsy (`null`, `0`, `false`, empty or blank strings).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => match number.as_i64() {
                Some(0) | None => None,
                Some(id) => Some(Self::Int(id)),
            },
            Value::String(text) if !text.trim().is_empty() => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(id) => Value::from(*id),
            Self::Text(text) => Value::from(text.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::RecordId;
    use serde_json::json;

    #[test]
    fn falsy_values_have_no_id() {
        for value in [json!(null), json!(0), json!(""), json!("  "), json!(false)] {
            assert_eq!(RecordId::from_value(&value), None, "value {value}");
        }
    }

    #[test]
    fn numeric_and_text_ids_round_trip_through_json() {
        let numeric = RecordId::from_value(&json!(42)).expect("numeric id");
        assert_eq!(numeric, RecordId::Int(42));
        assert_eq!(numeric.to_value(), json!(42));

        let text = RecordId::from_value(&json!("emp-7")).expect("text id");
        assert_eq!(text.to_string(), "emp-7");
        assert_eq!(text.to_value(), json!("emp-7"));
    }
}
