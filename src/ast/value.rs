use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime;

/// A literal converted to its field's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(NaiveDateTime),
    /// Canonical symbol of the matched enum member.
    Enum(String),
    Json(serde_json::Value),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Enum(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Lower-cased rendering used by case-insensitive comparisons.
    pub fn to_folded_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) | Value::Enum(s) => s.to_lowercase(),
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
            Value::Uuid(u) => u.hyphenated().to_string(),
            Value::DateTime(dt) => datetime::format_iso(dt).to_lowercase(),
            Value::Json(json) => json.to_string().to_lowercase(),
            Value::List(items) => items
                .iter()
                .map(Value::to_folded_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Converts to the JSON value bound to a driver parameter.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) | Value::Enum(s) => serde_json::Value::String(s.to_lowercase()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Uuid(u) => serde_json::Value::String(u.hyphenated().to_string()),
            Value::DateTime(dt) => serde_json::Value::String(datetime::format_iso(dt)),
            Value::Json(json) => json.clone(),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

/// Renders whole numbers without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
