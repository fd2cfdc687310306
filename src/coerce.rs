//! Validation and conversion of raw literals into typed [`Value`]s.

use thiserror::Error;
use uuid::Uuid;

use crate::ast::{TypeTag, Value};
use crate::datetime;

const NULL_TOKEN: &str = "null";
const EMPTY_STRING_TOKEN: &str = "string.empty";

#[derive(Error, Debug, PartialEq, Clone)]
#[error("cannot convert '{value}' to {target}")]
pub struct ConversionError {
    pub value: String,
    pub target: String,
}

impl ConversionError {
    fn new(value: &str, target: &TypeTag) -> Self {
        Self {
            value: value.to_string(),
            target: target.to_string(),
        }
    }
}

/// True when `raw` converts to `tag`.
pub fn validate(raw: &str, tag: &TypeTag) -> bool {
    convert(raw, tag).is_ok()
}

/// Converts a raw literal to a value of type `tag`.
///
/// Nullable targets accept `null` and blank input as [`Value::Null`].
/// `string.empty` on a text target yields the empty string.
///
/// # Examples
///
/// ```
/// use dynamic_filter_sort::coerce::convert;
/// use dynamic_filter_sort::{TypeTag, Value};
///
/// assert_eq!(convert("42", &TypeTag::Number).unwrap(), Value::Number(42.0));
/// assert_eq!(convert("null", &TypeTag::optional(TypeTag::Uuid)).unwrap(), Value::Null);
/// assert!(convert("abc", &TypeTag::Boolean).is_err());
/// ```
pub fn convert(raw: &str, tag: &TypeTag) -> Result<Value, ConversionError> {
    let trimmed = raw.trim();
    match tag {
        TypeTag::Optional(inner) => {
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NULL_TOKEN) {
                Ok(Value::Null)
            } else {
                convert(raw, inner)
            }
        }
        TypeTag::Text | TypeTag::Any => {
            if trimmed.eq_ignore_ascii_case(EMPTY_STRING_TOKEN) {
                Ok(Value::Text(String::new()))
            } else {
                Ok(Value::Text(raw.to_string()))
            }
        }
        TypeTag::Char => raw
            .chars()
            .next()
            .map(|c| Value::Text(c.to_string()))
            .ok_or_else(|| ConversionError::new(raw, tag)),
        TypeTag::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(|| ConversionError::new(raw, tag)),
        TypeTag::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(Value::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(Value::Boolean(false))
            } else {
                Err(ConversionError::new(raw, tag))
            }
        }
        TypeTag::Uuid => Uuid::parse_str(trimmed)
            .map(Value::Uuid)
            .map_err(|_| ConversionError::new(raw, tag)),
        TypeTag::DateTime => datetime::parse_datetime(trimmed)
            .map(Value::DateTime)
            .ok_or_else(|| ConversionError::new(raw, tag)),
        TypeTag::Enum { symbols } => symbols
            .iter()
            .find(|symbol| symbol.eq_ignore_ascii_case(trimmed))
            .map(|symbol| Value::Enum(symbol.clone()))
            .ok_or_else(|| ConversionError::new(raw, tag)),
        TypeTag::Json | TypeTag::Document | TypeTag::Map { .. } | TypeTag::Object(_) => {
            convert_json(trimmed).ok_or_else(|| ConversionError::new(raw, tag))
        }
        TypeTag::List(inner) => convert_list(raw, inner, tag),
    }
}

/// Parses text wrapped in balanced braces or brackets as JSON.
fn convert_json(trimmed: &str) -> Option<Value> {
    if !looks_like_json(trimmed) {
        return None;
    }
    serde_json::from_str(trimmed).ok().map(Value::Json)
}

pub fn looks_like_json(trimmed: &str) -> bool {
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

fn convert_list(raw: &str, inner: &TypeTag, tag: &TypeTag) -> Result<Value, ConversionError> {
    let items: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return Err(ConversionError::new(raw, tag));
    }

    items
        .into_iter()
        .map(|item| convert(item, inner).map_err(|_| ConversionError::new(raw, tag)))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}
