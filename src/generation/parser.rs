//! Cleanup, parsing and validation of raw model output

use super::format::{is_wildcard_key, FieldSpec, OutputFormat};
use crate::error::GenerationError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// A double quote wedged between two word characters was an apostrophe
static INNER_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z0-9_])"([A-Za-z0-9_])"#).expect("quote pattern is valid"));

/// Fenced code block, with or without a language tag
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("fence pattern is valid")
});

/// Turn single quotes into JSON delimiters while keeping apostrophes in words.
///
/// Best effort: `it's` survives, but a quote that legitimately closes a string
/// right before a word character would be rewritten as well.
pub fn normalize_quotes(raw: &str) -> String {
    let swapped = raw.replace('\'', "\"");
    INNER_QUOTE.replace_all(&swapped, "$1'$2").into_owned()
}

/// Return the payload of a fenced code block, or the input unchanged
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => text,
    }
}

/// Parse a raw response into batch-shaped elements.
///
/// `expected_batch` is the input batch length, or `None` for a single prompt,
/// in which case the parsed value is wrapped into a one-element vector.
pub fn parse_output(raw: &str, expected_batch: Option<usize>) -> Result<Vec<Value>, GenerationError> {
    let normalized = normalize_quotes(raw);
    let payload = strip_code_fence(&normalized).trim();
    let parsed: Value = serde_json::from_str(payload)?;

    match expected_batch {
        Some(expected) => match parsed {
            Value::Array(items) if items.len() == expected => Ok(items),
            Value::Array(items) => Err(GenerationError::BatchLengthMismatch {
                expected,
                actual: items.len(),
            }),
            _ => Err(GenerationError::NotAnArray),
        },
        None => Ok(vec![parsed]),
    }
}

/// Check one element against the declared format, coercing choice fields in place
pub fn validate_element(
    index: usize,
    element: &mut Value,
    format: &OutputFormat,
    default_category: Option<&str>,
) -> Result<(), GenerationError> {
    validate_object(index, element, format, default_category, None)
}

fn validate_object(
    index: usize,
    element: &mut Value,
    format: &OutputFormat,
    default_category: Option<&str>,
    parent: Option<&str>,
) -> Result<(), GenerationError> {
    let object = element
        .as_object_mut()
        .ok_or(GenerationError::NotAnObject { index })?;

    for (key, spec) in format.iter() {
        if is_wildcard_key(key) {
            continue;
        }

        let path = match parent {
            Some(parent) => format!("{}.{}", parent, key),
            None => key.to_string(),
        };

        let value = object
            .get_mut(key)
            .ok_or_else(|| GenerationError::MissingKey { key: path.clone() })?;

        match spec {
            FieldSpec::Description(_) => {}
            FieldSpec::Choices(choices) => coerce_choice(value, choices, default_category, &path)?,
            FieldSpec::Nested(inner) => {
                if value.is_object() {
                    validate_object(index, value, inner, default_category, Some(&path))?;
                }
            }
        }
    }

    Ok(())
}

/// Force a choice field onto one of its declared values
///
/// Without a default category an undeclared string is kept, but a value that
/// is not a string at all fails the attempt.
fn coerce_choice(
    value: &mut Value,
    choices: &[String],
    default_category: Option<&str>,
    path: &str,
) -> Result<(), GenerationError> {
    if let Value::Array(items) = value {
        *value = items.first().cloned().unwrap_or(Value::Null);
    }

    let is_declared = value
        .as_str()
        .map(|s| choices.iter().any(|c| c == s))
        .unwrap_or(false);

    if !is_declared {
        if let Some(default) = default_category {
            *value = Value::String(default.to_string());
        }
    }

    match value {
        Value::String(s) => {
            if let Some((head, _)) = s.split_once(':') {
                *s = head.to_string();
            }
            Ok(())
        }
        _ => Err(GenerationError::InvalidChoice { key: path.to_string() }),
    }
}

/// Replace an object by its values, or by its only value
pub fn values_only(element: Value) -> Value {
    match element {
        Value::Object(map) => {
            let mut values: Vec<Value> = map.into_iter().map(|(_, v)| v).collect();
            if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_quotes_keeps_apostrophes() {
        let raw = "{'answer': 'it's Newton's law'}";
        assert_eq!(normalize_quotes(raw), r#"{"answer": "it's Newton's law"}"#);
    }

    #[test]
    fn test_normalize_quotes_leaves_double_quotes() {
        let raw = r#"{"a": "b"}"#;
        assert_eq!(normalize_quotes(raw), raw);
    }

    #[test]
    fn test_strip_code_fence_with_language() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nanything else";
        assert_eq!(strip_code_fence(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fence_without_language() {
        let text = "```\n[1, 2]\n```";
        assert_eq!(strip_code_fence(text), "[1, 2]");
    }

    #[test]
    fn test_strip_code_fence_absent() {
        assert_eq!(strip_code_fence("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_single_is_wrapped() {
        let items = parse_output(r#"{"a": "b"}"#, None).unwrap();
        assert_eq!(items, vec![json!({"a": "b"})]);
    }

    #[test]
    fn test_parse_batch_requires_array() {
        let err = parse_output(r#"{"a": "b"}"#, Some(1)).unwrap_err();
        assert!(matches!(err, GenerationError::NotAnArray));
    }

    #[test]
    fn test_parse_batch_length_mismatch() {
        let err = parse_output(r#"[{"a": 1}]"#, Some(2)).unwrap_err();
        assert!(matches!(err, GenerationError::BatchLengthMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_output("not json at all", None).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson(_)));
    }

    #[test]
    fn test_validate_missing_key() {
        let format = OutputFormat::new().description("question", "q").description("answer", "a");
        let mut element = json!({"question": "What?"});

        let err = validate_element(0, &mut element, &format, None).unwrap_err();
        assert_eq!(err.to_string(), "answer not in json output");
    }

    #[test]
    fn test_validate_skips_wildcard_keys() {
        let format = OutputFormat::new().description("<place>", "a place");
        let mut element = json!({"garden": "green"});

        assert!(validate_element(0, &mut element, &format, None).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let format = OutputFormat::new().description("a", "b");
        let mut element = json!("plain string");

        let err = validate_element(3, &mut element, &format, None).unwrap_err();
        assert!(matches!(err, GenerationError::NotAnObject { index: 3 }));
    }

    #[test]
    fn test_choice_falls_back_to_default() {
        let format = OutputFormat::new().choices("mood", ["happy", "sad"]);
        let mut element = json!({"mood": "angry"});

        validate_element(0, &mut element, &format, Some("neutral")).unwrap();
        assert_eq!(element["mood"], "neutral");
    }

    #[test]
    fn test_choice_without_default_is_kept() {
        let format = OutputFormat::new().choices("mood", ["happy", "sad"]);
        let mut element = json!({"mood": "angry"});

        validate_element(0, &mut element, &format, None).unwrap();
        assert_eq!(element["mood"], "angry");
    }

    #[test]
    fn test_non_text_choice_without_default_fails() {
        let format = OutputFormat::new().choices("mood", ["happy", "sad"]);

        let mut number = json!({"mood": 3});
        let err = validate_element(0, &mut number, &format, None).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidChoice { ref key } if key == "mood"));

        let mut empty = json!({"mood": []});
        assert!(validate_element(0, &mut empty, &format, None).is_err());

        let mut defaulted = json!({"mood": 3});
        validate_element(0, &mut defaulted, &format, Some("neutral")).unwrap();
        assert_eq!(defaulted["mood"], "neutral");
    }

    #[test]
    fn test_choice_array_takes_first() {
        let format = OutputFormat::new().choices("mood", ["happy", "sad"]);
        let mut element = json!({"mood": ["sad", "happy"]});

        validate_element(0, &mut element, &format, Some("neutral")).unwrap();
        assert_eq!(element["mood"], "sad");
    }

    #[test]
    fn test_choice_colon_is_truncated() {
        let format = OutputFormat::new().choices("mood", ["happy: smiling", "sad"]);
        let mut element = json!({"mood": "happy: smiling"});

        validate_element(0, &mut element, &format, None).unwrap();
        assert_eq!(element["mood"], "happy");
    }

    #[test]
    fn test_nested_missing_key_reports_path() {
        let format = OutputFormat::new().nested("meta", OutputFormat::new().description("author", "name"));
        let mut element = json!({"meta": {"editor": "x"}});

        let err = validate_element(0, &mut element, &format, None).unwrap_err();
        assert_eq!(err.to_string(), "meta.author not in json output");
    }

    #[test]
    fn test_values_only() {
        assert_eq!(values_only(json!({"a": "1", "b": "2"})), json!(["1", "2"]));
        assert_eq!(values_only(json!({"a": "1"})), json!("1"));
    }
}
