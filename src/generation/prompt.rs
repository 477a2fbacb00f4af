//! Prompt assembly for structured generation

use super::format::OutputFormat;
use super::strict::PromptInput;
use crate::error::GenerationError;

const NO_QUOTES_RULE: &str = "\nDo not put quotation marks or escape character \\ in the output fields.";

const CHOICE_GUIDANCE: &str =
    "\nIf output field is a list, classify output into the best element of the list.";

const PLACEHOLDER_GUIDANCE: &str = "\nAny text enclosed by < and > indicates you must generate content to replace it. \
Example input: Go to <location>, Example output: Go to the garden\n\
Any output key containing < and > indicates you must generate the key name to replace it. \
Example input: {'<location>': 'description of location'}, Example output: {school: a place for education}";

const BATCH_GUIDANCE: &str = "\nGenerate an array of json, one json for each input element.";

/// Longest rejected response echoed back into the next prompt
const MAX_ECHOED_RESPONSE: usize = 2000;

/// Output-format instructions appended to the system prompt
pub fn format_instructions(format: &OutputFormat, input: &PromptInput) -> String {
    let list_output = format.has_choices();

    let mut prompt = format!(
        "\nYou are to output {}the following in json format: {}. {}",
        if list_output { "an array of objects in " } else { "" },
        format.to_json(),
        NO_QUOTES_RULE,
    );

    if list_output {
        prompt.push_str(CHOICE_GUIDANCE);
    }

    if format.has_placeholders() {
        prompt.push_str(PLACEHOLDER_GUIDANCE);
    }

    if input.is_batch() {
        prompt.push_str(BATCH_GUIDANCE);
    }

    prompt
}

/// Full text sent to the backend for one attempt
pub fn build_prompt(
    system_prompt: &str,
    format: &OutputFormat,
    input: &PromptInput,
    error_context: &str,
) -> String {
    format!(
        "{}{}{}\n\n{}",
        system_prompt,
        format_instructions(format, input),
        error_context,
        input.render(),
    )
}

/// Feedback about a rejected attempt, appended to the next prompt
pub fn error_context(error: &GenerationError, raw_response: Option<&str>) -> String {
    let result = match raw_response {
        Some(raw) if raw.chars().count() > MAX_ECHOED_RESPONSE => {
            let head: String = raw.chars().take(MAX_ECHOED_RESPONSE).collect();
            format!("{}...", head)
        }
        Some(raw) => raw.to_string(),
        None => "no response".to_string(),
    };

    format!(
        "\n\nResult: {}\n\nError message: {}\nFix the error and respond again in the required json format.",
        result, error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format_instructions() {
        let format = OutputFormat::new().description("title", "course title");
        let prompt = format_instructions(&format, &PromptInput::Single("x".to_string()));

        assert!(prompt.starts_with("\nYou are to output the following in json format: {\"title\":\"course title\"}."));
        assert!(!prompt.contains(CHOICE_GUIDANCE));
        assert!(!prompt.contains(BATCH_GUIDANCE));
        assert!(!prompt.contains("enclosed by < and >"));
    }

    #[test]
    fn test_choice_and_batch_guidance() {
        let format = OutputFormat::new().choices("mood", ["happy", "sad"]);
        let input = PromptInput::Batch(vec!["a".to_string(), "b".to_string()]);
        let prompt = format_instructions(&format, &input);

        assert!(prompt.contains("an array of objects in the following"));
        assert!(prompt.contains(CHOICE_GUIDANCE));
        assert!(prompt.contains(BATCH_GUIDANCE));
    }

    #[test]
    fn test_placeholder_guidance() {
        let format = OutputFormat::new().description("<topic>", "a topic");
        let prompt = format_instructions(&format, &PromptInput::Single("x".to_string()));

        assert!(prompt.contains("enclosed by < and >"));
    }

    #[test]
    fn test_build_prompt_layout() {
        let format = OutputFormat::new().description("a", "b");
        let prompt = build_prompt(
            "You are a helpful AI.",
            &format,
            &PromptInput::Single("Tell me about Rust".to_string()),
            "\n\nError message: previous",
        );

        assert!(prompt.starts_with("You are a helpful AI.\nYou are to output"));
        assert!(prompt.contains("\n\nError message: previous\n\nTell me about Rust"));
    }

    #[test]
    fn test_error_context_includes_response() {
        let err = GenerationError::MissingKey { key: "answer".to_string() };
        let context = error_context(&err, Some("{\"question\": \"q\"}"));

        assert!(context.contains("Result: {\"question\": \"q\"}"));
        assert!(context.contains("Error message: answer not in json output"));
    }

    #[test]
    fn test_error_context_truncates_long_response() {
        let err = GenerationError::NotAnArray;
        let raw = "x".repeat(MAX_ECHOED_RESPONSE + 50);
        let context = error_context(&err, Some(&raw));

        assert!(context.contains(&format!("{}...", "x".repeat(MAX_ECHOED_RESPONSE))));
        assert!(!context.contains(&"x".repeat(MAX_ECHOED_RESPONSE + 1)));
    }
}
