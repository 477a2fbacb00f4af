//! Batched multiple-choice question generation

use super::Question;
use crate::config::QuestionConfig;
use crate::generation::{GenerationRequest, OutputFormat, PromptInput, StructuredGenerator};
use std::sync::Arc;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are a helpful AI that is able to generate mcq questions and answers, the length of each answer should not be more than 15 words";

const TRUNCATION_MARKER: &str = "...";

/// Five-field shape every generated question must have
pub fn question_format() -> OutputFormat {
    OutputFormat::new()
        .description("question", "question")
        .description("answer", "answer with max length of 15 words")
        .description("option1", "option1 with max length of 15 words")
        .description("option2", "option2 with max length of 15 words")
        .description("option3", "option3 with max length of 15 words")
}

/// Turns a transcript into quiz questions with a single batched generation call
pub struct QuestionGenerator {
    generator: Arc<StructuredGenerator>,
    config: QuestionConfig,
}

impl QuestionGenerator {
    pub fn new(generator: Arc<StructuredGenerator>, config: QuestionConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &QuestionConfig {
        &self.config
    }

    /// Generate the configured default number of questions
    pub async fn generate_default(&self, transcript: &str, course_title: &str) -> Vec<Question> {
        self.generate(transcript, course_title, self.config.default_count).await
    }

    /// Generate up to `num_questions` questions about `course_title`.
    ///
    /// The result is shorter than requested when some elements fail to
    /// deserialize, and empty when generation failed altogether.
    pub async fn generate(&self, transcript: &str, course_title: &str, num_questions: usize) -> Vec<Question> {
        if transcript.trim().is_empty() || course_title.trim().is_empty() {
            warn!("Transcript and course title are required to generate questions");
            return Vec::new();
        }

        if num_questions == 0 {
            return Vec::new();
        }

        let transcript = truncate_transcript(transcript, self.config.max_transcript_chars);
        let instruction = format!(
            "You are to generate a random hard mcq question about {} with context of the following transcript: {}",
            course_title, transcript
        );

        let request = GenerationRequest::new(
            SYSTEM_PROMPT,
            PromptInput::Batch(vec![instruction; num_questions]),
            question_format(),
        );

        let output = self.generator.strict_output(&request).await;
        if output.is_empty() {
            warn!("Question generation for {:?} produced no output", course_title);
            return Vec::new();
        }

        let questions: Vec<Question> = output.deserialize_items();
        info!(
            "Generated {}/{} question(s) for {:?}",
            questions.len(),
            num_questions,
            course_title
        );

        questions
    }
}

/// Cap the transcript at `max_chars` characters, marking the cut
fn truncate_transcript(transcript: &str, max_chars: usize) -> String {
    match transcript.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &transcript[..cut], TRUNCATION_MARKER),
        None => transcript.to_string(),
    }
}
