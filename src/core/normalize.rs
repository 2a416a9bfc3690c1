//! Field extraction helpers used by entity normalizers.
//!
//! All helpers are pure: they read one field of a [`RawCandidate`] and either
//! return a typed value or a [`RejectReason`].

use crate::domain::model::{Entity, RawCandidate, RejectReason};
use serde_json::Value;

pub fn normalize<E: Entity>(raw: &RawCandidate) -> Result<E, RejectReason> {
    E::normalize(raw)
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// Trimmed, non-empty text. Numbers and booleans are accepted in their textual form.
pub fn required_text(raw: &RawCandidate, field: &str) -> Result<String, RejectReason> {
    let missing = || RejectReason::MissingField {
        field: field.to_string(),
    };

    let text = match raw.get(field) {
        None | Some(Value::Null) => return Err(missing()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            return Err(RejectReason::TypeMismatch {
                field: field.to_string(),
                expected: "text",
                found: describe(other),
            })
        }
    };

    if text.is_empty() {
        return Err(missing());
    }
    Ok(text)
}

/// Absent, null and blank-string values map to `None`; anything else must be integral.
pub fn optional_integer(raw: &RawCandidate, field: &str) -> Result<Option<i64>, RejectReason> {
    let mismatch = |value: &Value| RejectReason::TypeMismatch {
        field: field.to_string(),
        expected: "integer",
        found: describe(value),
    };

    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                Ok(Some(v))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                    _ => Err(mismatch(value)),
                }
            }
        }
        Some(value @ Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| mismatch(value))
        }
        Some(other) => Err(mismatch(other)),
    }
}

/// Lenient text for stored rows: missing values become empty.
pub fn stored_text(raw: &RawCandidate, field: &str) -> String {
    match raw.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Lenient integer for stored rows: anything unparseable becomes `None`.
pub fn stored_integer(raw: &RawCandidate, field: &str) -> Option<i64> {
    optional_integer(raw, field).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(value: serde_json::Value) -> RawCandidate {
        RawCandidate::from_json(value).unwrap()
    }

    #[test]
    fn test_required_text_trims() {
        let raw = candidate(json!({"name": "  Ada  "}));
        assert_eq!(required_text(&raw, "name").unwrap(), "Ada");
    }

    #[test]
    fn test_required_text_missing_or_blank() {
        let raw = candidate(json!({"name": "   ", "other": null}));
        for field in ["name", "other", "absent"] {
            assert_eq!(
                required_text(&raw, field),
                Err(RejectReason::MissingField {
                    field: field.to_string()
                })
            );
        }
    }

    #[test]
    fn test_required_text_accepts_numbers() {
        let raw = candidate(json!({"title": 1984}));
        assert_eq!(required_text(&raw, "title").unwrap(), "1984");
    }

    #[test]
    fn test_required_text_rejects_structures() {
        let raw = candidate(json!({"title": ["a", "b"]}));
        assert!(matches!(
            required_text(&raw, "title"),
            Err(RejectReason::TypeMismatch { expected: "text", .. })
        ));
    }

    #[test]
    fn test_optional_integer_parses_numbers_and_strings() {
        let raw = candidate(json!({"a": 1949, "b": " 1960 ", "c": 1925.0, "d": ""}));
        assert_eq!(optional_integer(&raw, "a").unwrap(), Some(1949));
        assert_eq!(optional_integer(&raw, "b").unwrap(), Some(1960));
        assert_eq!(optional_integer(&raw, "c").unwrap(), Some(1925));
        assert_eq!(optional_integer(&raw, "d").unwrap(), None);
        assert_eq!(optional_integer(&raw, "missing").unwrap(), None);
    }

    #[test]
    fn test_stored_helpers_never_reject() {
        let raw = candidate(json!({"author": "", "year": "soon", "pages": "320"}));
        assert_eq!(stored_text(&raw, "author"), "");
        assert_eq!(stored_text(&raw, "missing"), "");
        assert_eq!(stored_integer(&raw, "year"), None);
        assert_eq!(stored_integer(&raw, "pages"), Some(320));
    }

    #[test]
    fn test_optional_integer_type_mismatch() {
        let raw = candidate(json!({"year": "nineteen", "ratio": 1.5, "flag": true}));
        for field in ["year", "ratio", "flag"] {
            assert!(matches!(
                optional_integer(&raw, field),
                Err(RejectReason::TypeMismatch { expected: "integer", .. })
            ));
        }
    }
}
