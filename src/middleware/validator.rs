//! Input validation for API requests

use tracing::{debug, warn};

/// Maximum free-text length accepted from callers (transcripts can be long)
const MAX_TEXT_LENGTH: usize = 200_000;

/// Maximum batch size for raw structured generation
const MAX_BATCH_SIZE: usize = 50;

/// Maximum attempt budget a caller may request
const MAX_NUM_TRIES: u32 = 10;

/// Maximum length of a video identifier
const MAX_VIDEO_ID_LENGTH: usize = 64;

/// Input validator
pub struct InputValidator;

impl InputValidator {
    /// Validate a required text field
    pub fn validate_text(field: &str, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            warn!("Validation failed: empty {}", field);
            return Err(ValidationError::EmptyField(field.to_string()));
        }

        if text.len() > MAX_TEXT_LENGTH {
            warn!("Validation failed: {} too long ({} > {})", field, text.len(), MAX_TEXT_LENGTH);
            return Err(ValidationError::TextTooLong {
                field: field.to_string(),
                length: text.len(),
                max_length: MAX_TEXT_LENGTH,
            });
        }

        if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
            warn!("Validation failed: {} contains control characters", field);
            return Err(ValidationError::InvalidCharacters(field.to_string()));
        }

        debug!("Text validation passed for {}", field);
        Ok(())
    }

    /// Validate a YouTube video identifier
    pub fn validate_video_id(video_id: &str) -> Result<(), ValidationError> {
        if video_id.trim().is_empty() {
            warn!("Validation failed: empty video id");
            return Err(ValidationError::EmptyField("video_id".to_string()));
        }

        if video_id.len() > MAX_VIDEO_ID_LENGTH
            || !video_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            warn!("Validation failed: malformed video id {:?}", video_id);
            return Err(ValidationError::InvalidVideoId(video_id.to_string()));
        }

        Ok(())
    }

    /// Validate a requested question count
    pub fn validate_question_count(count: usize, max: usize) -> Result<(), ValidationError> {
        if count == 0 || count > max {
            warn!("Validation failed: question count {} outside 1..={}", count, max);
            return Err(ValidationError::InvalidQuestionCount { count, max });
        }

        Ok(())
    }

    /// Validate batch size
    pub fn validate_batch_size(size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            warn!("Validation failed: empty batch");
            return Err(ValidationError::EmptyBatch);
        }

        if size > MAX_BATCH_SIZE {
            warn!("Validation failed: batch too large ({} > {})", size, MAX_BATCH_SIZE);
            return Err(ValidationError::BatchTooLarge {
                size,
                max_size: MAX_BATCH_SIZE,
            });
        }

        Ok(())
    }

    /// Validate a caller-supplied attempt budget
    pub fn validate_num_tries(num_tries: u32) -> Result<(), ValidationError> {
        if num_tries == 0 || num_tries > MAX_NUM_TRIES {
            warn!("Validation failed: num_tries {} outside 1..={}", num_tries, MAX_NUM_TRIES);
            return Err(ValidationError::InvalidNumTries {
                num_tries,
                max: MAX_NUM_TRIES,
            });
        }

        Ok(())
    }

    /// Validate sampling temperature
    pub fn validate_temperature(temperature: f32) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&temperature) {
            warn!("Validation failed: invalid temperature ({})", temperature);
            return Err(ValidationError::InvalidTemperature { temperature });
        }

        Ok(())
    }
}

/// Validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(String),

    #[error("{field} too long: {length} bytes (max: {max_length})")]
    TextTooLong { field: String, length: usize, max_length: usize },

    #[error("{0} contains invalid control characters")]
    InvalidCharacters(String),

    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    #[error("Question count {count} must be between 1 and {max}")]
    InvalidQuestionCount { count: usize, max: usize },

    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Batch too large: {size} items (max: {max_size})")]
    BatchTooLarge { size: usize, max_size: usize },

    #[error("num_tries {num_tries} must be between 1 and {max}")]
    InvalidNumTries { num_tries: u32, max: u32 },

    #[error("Invalid temperature: {temperature} (must be between 0.0 and 2.0)")]
    InvalidTemperature { temperature: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_success() {
        assert!(InputValidator::validate_text("course_title", "Calculus").is_ok());
    }

    #[test]
    fn test_validate_text_empty() {
        assert!(InputValidator::validate_text("course_title", "").is_err());
        assert!(InputValidator::validate_text("course_title", "   ").is_err());
    }

    #[test]
    fn test_validate_text_control_characters() {
        assert!(InputValidator::validate_text("query", "bad\x00query").is_err());
        assert!(InputValidator::validate_text("query", "multi\nline\tis fine").is_ok());
    }

    #[test]
    fn test_validate_video_id() {
        assert!(InputValidator::validate_video_id("dQw4w9WgXcQ").is_ok());
        assert!(InputValidator::validate_video_id("a-b_c").is_ok());
        assert!(InputValidator::validate_video_id("").is_err());
        assert!(InputValidator::validate_video_id("../etc/passwd").is_err());
        assert!(InputValidator::validate_video_id("id with spaces").is_err());
    }

    #[test]
    fn test_validate_question_count() {
        assert!(InputValidator::validate_question_count(5, 20).is_ok());
        assert!(InputValidator::validate_question_count(0, 20).is_err());
        assert!(InputValidator::validate_question_count(21, 20).is_err());
    }

    #[test]
    fn test_validate_batch_size() {
        assert!(InputValidator::validate_batch_size(10).is_ok());
        assert!(InputValidator::validate_batch_size(0).is_err());
        assert!(InputValidator::validate_batch_size(MAX_BATCH_SIZE + 1).is_err());
    }

    #[test]
    fn test_validate_temperature() {
        assert!(InputValidator::validate_temperature(0.0).is_ok());
        assert!(InputValidator::validate_temperature(1.0).is_ok());
        assert!(InputValidator::validate_temperature(-0.1).is_err());
        assert!(InputValidator::validate_temperature(2.1).is_err());
    }

    #[test]
    fn test_validate_num_tries() {
        assert!(InputValidator::validate_num_tries(3).is_ok());
        assert!(InputValidator::validate_num_tries(0).is_err());
        assert!(InputValidator::validate_num_tries(MAX_NUM_TRIES + 1).is_err());
    }
}
