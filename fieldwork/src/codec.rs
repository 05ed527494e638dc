//! Typed value codec for dynamic field values.
//!
//! Values are always stored as text; decoding is total. Malformed values
//! degrade to a best-effort string passthrough instead of raising, so
//! legacy data stays visible. Callers comparing or aggregating decoded
//! values must handle the `Text` fallback arm.

use chrono::NaiveDate;
use serde::Serialize;

/// The closed set of field types. Behavior is a small pure function per
/// type — no dispatch beyond this enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Integer,
    Decimal,
    Boolean,
    Date,
    Choice,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Choice => "choice",
        }
    }

    /// Parse a stored type name. Unknown names fall back to `Text` so a
    /// row written by a newer schema still decodes.
    pub fn parse(s: &str) -> FieldType {
        match s {
            "textarea" => FieldType::Textarea,
            "integer" => FieldType::Integer,
            "decimal" => FieldType::Decimal,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "choice" => FieldType::Choice,
            _ => FieldType::Text,
        }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
}

/// Tokens accepted as boolean true, case-insensitive.
const TRUE_TOKENS: &[&str] = &["true", "1", "yes", "on"];

/// Encode a raw value for storage. Identity — the attribute store is
/// text-only and typing happens on the way out.
pub fn encode(raw: &str, _field_type: FieldType) -> String {
    raw.to_string()
}

/// Decode a stored value into its declared type. Never fails: integers,
/// decimals and dates that do not parse come back as `Text` holding the
/// original string; booleans decode to false for anything outside the
/// true-set.
pub fn decode(stored: Option<&str>, field_type: FieldType) -> TypedValue {
    let value = match stored {
        None => return TypedValue::Null,
        Some(v) if v.is_empty() => return TypedValue::Null,
        Some(v) => v,
    };

    match field_type {
        FieldType::Text | FieldType::Textarea | FieldType::Choice => {
            TypedValue::Text(value.to_string())
        }
        FieldType::Integer => match value.parse::<i64>() {
            Ok(n) => TypedValue::Integer(n),
            Err(_) => TypedValue::Text(value.to_string()),
        },
        FieldType::Decimal => match value.parse::<f64>() {
            Ok(f) => TypedValue::Decimal(f),
            Err(_) => TypedValue::Text(value.to_string()),
        },
        FieldType::Boolean => {
            let lowered = value.to_lowercase();
            TypedValue::Boolean(TRUE_TOKENS.contains(&lowered.as_str()))
        }
        FieldType::Date => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(d) => TypedValue::Date(d),
            Err(_) => TypedValue::Text(value.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- decode round-trips for well-formed values ---

    #[test]
    fn test_decode_integer() {
        assert_eq!(decode(Some("42"), FieldType::Integer), TypedValue::Integer(42));
        assert_eq!(decode(Some("-7"), FieldType::Integer), TypedValue::Integer(-7));
    }

    #[test]
    fn test_decode_decimal() {
        assert_eq!(
            decode(Some("3.25"), FieldType::Decimal),
            TypedValue::Decimal(3.25)
        );
    }

    #[test]
    fn test_decode_date() {
        assert_eq!(
            decode(Some("2024-01-15"), FieldType::Date),
            TypedValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn test_decode_text_identity() {
        assert_eq!(
            decode(Some("hello"), FieldType::Text),
            TypedValue::Text("hello".to_string())
        );
        assert_eq!(
            decode(Some("870"), FieldType::Choice),
            TypedValue::Text("870".to_string())
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let encoded = encode("42", FieldType::Integer);
        assert_eq!(decode(Some(&encoded), FieldType::Integer), TypedValue::Integer(42));
    }

    // --- fallback policy: malformed values pass through as text ---

    #[test]
    fn test_integer_fallback_returns_original_string() {
        assert_eq!(
            decode(Some("not_a_number"), FieldType::Integer),
            TypedValue::Text("not_a_number".to_string())
        );
    }

    #[test]
    fn test_decimal_fallback_returns_original_string() {
        assert_eq!(
            decode(Some("12,5"), FieldType::Decimal),
            TypedValue::Text("12,5".to_string())
        );
    }

    #[test]
    fn test_date_fallback_returns_original_string() {
        assert_eq!(
            decode(Some("15.01.2024"), FieldType::Date),
            TypedValue::Text("15.01.2024".to_string())
        );
        // Strict format: no time component allowed
        assert_eq!(
            decode(Some("2024-01-15T00:00:00"), FieldType::Date),
            TypedValue::Text("2024-01-15T00:00:00".to_string())
        );
    }

    // --- boolean totality ---

    #[test]
    fn test_boolean_true_set() {
        for token in ["true", "True", "TRUE", "1", "yes", "Yes", "on", "On"] {
            assert_eq!(
                decode(Some(token), FieldType::Boolean),
                TypedValue::Boolean(true),
                "{token} should decode to true"
            );
        }
    }

    #[test]
    fn test_boolean_everything_else_is_false() {
        for token in ["false", "0", "no", "off", "anything_else", "2", "ja"] {
            assert_eq!(
                decode(Some(token), FieldType::Boolean),
                TypedValue::Boolean(false),
                "{token} should decode to false"
            );
        }
    }

    // --- null handling ---

    #[test]
    fn test_empty_and_absent_decode_to_null() {
        for ft in [
            FieldType::Text,
            FieldType::Integer,
            FieldType::Decimal,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::Choice,
        ] {
            assert_eq!(decode(None, ft), TypedValue::Null);
            assert_eq!(decode(Some(""), ft), TypedValue::Null);
        }
    }

    // --- type name parsing ---

    #[test]
    fn test_field_type_parse_roundtrip() {
        for ft in [
            FieldType::Text,
            FieldType::Textarea,
            FieldType::Integer,
            FieldType::Decimal,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::Choice,
        ] {
            assert_eq!(FieldType::parse(ft.as_str()), ft);
        }
    }

    #[test]
    fn test_unknown_type_name_falls_back_to_text() {
        assert_eq!(FieldType::parse("geojson"), FieldType::Text);
        assert_eq!(FieldType::parse(""), FieldType::Text);
    }
}
