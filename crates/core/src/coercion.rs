//! Field types and raw-string coercion.
//!
//! CSV cells arrive as strings. [`coerce`] converts them into typed JSON
//! values according to the declared [`FieldType`], and never fails: when a
//! conversion is impossible the raw string is kept so that validation can
//! report the mismatch later.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tokens (compared case-insensitively) that coerce to boolean `true`.
/// `○` is the affirmative mark used in Japanese tables.
pub const TRUE_TOKENS: &[&str] = &["true", "1", "yes", "on", "○"];

/// Declared type of a configured field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Json,
    Email,
    Url,
    /// Any type name this build does not know. Values are never rejected
    /// on type grounds.
    #[serde(other)]
    Unknown,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Json => "json",
            Self::Email => "email",
            Self::Url => "url",
            Self::Unknown => "unknown",
        }
    }

    /// String-like types that get length, pattern and allowed-value checks.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Text)
    }

    /// Numeric types that get min/max value checks.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Whether `value` already has the shape this type expects.
    ///
    /// Booleans never count as numbers. `json`, `email`, `url` and unknown
    /// types accept any value here; format checks happen separately.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String | Self::Text => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Json | Self::Email | Self::Url | Self::Unknown => true,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short type name of a JSON value, used in validation messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert a raw cell into a typed value.
///
/// - Empty input is always `Null`.
/// - `integer` / `float` parse numerically, keeping the raw string on failure.
/// - `boolean` is true for any of [`TRUE_TOKENS`], false otherwise.
/// - `json` parses a JSON document, keeping the raw string on failure.
/// - Everything else stays a string.
pub fn coerce(raw: &str, field_type: FieldType) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }

    match field_type {
        FieldType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        FieldType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        FieldType::Boolean => {
            let lowered = raw.to_lowercase();
            Value::Bool(TRUE_TOKENS.contains(&lowered.as_str()))
        }
        FieldType::Json => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_string_is_null_for_every_type() {
        for ty in [FieldType::String, FieldType::Integer, FieldType::Boolean, FieldType::Json] {
            assert_eq!(coerce("", ty), Value::Null);
        }
    }

    #[test]
    fn integer_parses_or_keeps_raw() {
        assert_eq!(coerce("42", FieldType::Integer), json!(42));
        assert_eq!(coerce("-7", FieldType::Integer), json!(-7));
        assert_eq!(coerce("4.2", FieldType::Integer), json!("4.2"));
        assert_eq!(coerce("lots", FieldType::Integer), json!("lots"));
    }

    #[test]
    fn float_parses_or_keeps_raw() {
        assert_eq!(coerce("2.5", FieldType::Float), json!(2.5));
        assert_eq!(coerce("3", FieldType::Float), json!(3.0));
        assert_eq!(coerce("heavy", FieldType::Float), json!("heavy"));
    }

    #[test]
    fn boolean_recognises_true_tokens() {
        assert_eq!(coerce("TRUE", FieldType::Boolean), json!(true));
        assert_eq!(coerce("Yes", FieldType::Boolean), json!(true));
        assert_eq!(coerce("on", FieldType::Boolean), json!(true));
        assert_eq!(coerce("1", FieldType::Boolean), json!(true));
        assert_eq!(coerce("○", FieldType::Boolean), json!(true));
        assert_eq!(coerce("×", FieldType::Boolean), json!(false));
        assert_eq!(coerce("no", FieldType::Boolean), json!(false));
    }

    #[test]
    fn json_parses_or_keeps_raw() {
        assert_eq!(coerce(r#"{"a":1}"#, FieldType::Json), json!({"a": 1}));
        assert_eq!(coerce("{broken", FieldType::Json), json!("{broken"));
    }

    #[test]
    fn string_like_types_stay_strings() {
        assert_eq!(coerce("a@b.io", FieldType::Email), json!("a@b.io"));
        assert_eq!(coerce("12", FieldType::String), json!("12"));
    }

    #[test]
    fn unknown_type_names_deserialize_to_unknown() {
        let ty: FieldType = serde_json::from_str("\"decimal\"").unwrap();
        assert_eq!(ty, FieldType::Unknown);
        assert!(ty.accepts(&json!("anything")));
    }

    #[test]
    fn accepts_rejects_booleans_as_numbers() {
        assert!(!FieldType::Integer.accepts(&json!(true)));
        assert!(FieldType::Float.accepts(&json!(3)));
        assert!(!FieldType::String.accepts(&json!(3)));
    }
}
