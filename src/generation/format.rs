//! Output format declarations for structured generation

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches `<placeholder>` syntax in keys and descriptions
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("placeholder pattern is valid"));

/// Declaration of a single output field
///
/// Serializes to the plain JSON shape the model sees: a string, an array of
/// choices, or a nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// Free text, the string describes what to generate
    Description(String),
    /// One of a fixed set of values, first match wins
    Choices(Vec<String>),
    /// A nested object
    Nested(OutputFormat),
}

/// Expected shape of a generated JSON object, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputFormat {
    fields: IndexMap<String, FieldSpec>,
}

impl OutputFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free-text field
    pub fn description(self, key: impl Into<String>, description: impl Into<String>) -> Self {
        self.field(key, FieldSpec::Description(description.into()))
    }

    /// Add a choice-constrained field
    pub fn choices<I, S>(self, key: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field(key, FieldSpec::Choices(choices.into_iter().map(Into::into).collect()))
    }

    /// Add a nested object field
    pub fn nested(self, key: impl Into<String>, format: OutputFormat) -> Self {
        self.field(key, FieldSpec::Nested(format))
    }

    pub fn field(mut self, key: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(key.into(), spec);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keys the model must reproduce literally
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|key| !is_wildcard_key(key))
    }

    /// Whether any field, at any depth, is a choice list
    pub fn has_choices(&self) -> bool {
        self.fields.values().any(|spec| match spec {
            FieldSpec::Choices(_) => true,
            FieldSpec::Nested(inner) => inner.has_choices(),
            FieldSpec::Description(_) => false,
        })
    }

    /// Whether any key or description uses `<placeholder>` syntax
    pub fn has_placeholders(&self) -> bool {
        PLACEHOLDER.is_match(&self.to_json())
    }

    /// JSON rendering embedded in the prompt
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }
}

impl FromIterator<(String, FieldSpec)> for OutputFormat {
    fn from_iter<T: IntoIterator<Item = (String, FieldSpec)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A key such as `<location>` asks the model to invent the key itself
pub fn is_wildcard_key(key: &str) -> bool {
    PLACEHOLDER.is_match(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order() {
        let format = OutputFormat::new()
            .description("question", "question")
            .description("answer", "answer with max length of 15 words")
            .choices("difficulty", ["easy", "hard"]);

        let keys: Vec<&str> = format.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["question", "answer", "difficulty"]);
        assert_eq!(
            format.to_json(),
            r#"{"question":"question","answer":"answer with max length of 15 words","difficulty":["easy","hard"]}"#
        );
    }

    #[test]
    fn test_deserialize_from_plain_json() {
        let format: OutputFormat = serde_json::from_str(
            r#"{"title": "chapter title", "mood": ["happy", "sad"], "meta": {"author": "name"}}"#,
        )
        .unwrap();

        let specs: Vec<&FieldSpec> = format.iter().map(|(_, v)| v).collect();
        assert_eq!(specs[0], &FieldSpec::Description("chapter title".to_string()));
        assert_eq!(specs[1], &FieldSpec::Choices(vec!["happy".to_string(), "sad".to_string()]));
        assert!(matches!(specs[2], FieldSpec::Nested(inner) if inner.len() == 1));
    }

    #[test]
    fn test_wildcard_keys_are_not_required() {
        let format = OutputFormat::new()
            .description("<location>", "description of location")
            .description("summary", "one sentence");

        let required: Vec<&str> = format.required_keys().collect();
        assert_eq!(required, vec!["summary"]);
        assert!(format.has_placeholders());
    }

    #[test]
    fn test_placeholder_in_description() {
        let format = OutputFormat::new().description("sentence", "Go to <location>");
        assert!(format.has_placeholders());
        assert!(!OutputFormat::new().description("a", "b").has_placeholders());
    }

    #[test]
    fn test_nested_choices_detected() {
        let inner = OutputFormat::new().choices("level", ["beginner", "advanced"]);
        let format = OutputFormat::new().nested("meta", inner);

        assert!(format.has_choices());
        assert!(!OutputFormat::new().description("a", "b").has_choices());
    }
}
