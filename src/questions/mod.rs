//! Multiple-choice question generation from video transcripts

pub mod generator;

pub use generator::{question_format, QuestionGenerator};

use serde::{Deserialize, Serialize};

/// A multiple-choice question with one correct answer and three distractors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answer: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
}

impl Question {
    /// All four answer options, correct answer first
    pub fn options(&self) -> [&str; 4] {
        [&self.answer, &self.option1, &self.option2, &self.option3]
    }
}
