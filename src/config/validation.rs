//! Configuration validation

use super::*;
use crate::error::{CourseError, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_gemini_config(&config.gemini)?;
    validate_youtube_config(&config.youtube)?;
    validate_transcript_config(&config.transcript)?;
    validate_unsplash_config(&config.unsplash)?;
    validate_question_config(&config.questions)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn validate_url(name: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(CourseError::Config(format!("{} URL cannot be empty", name)));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CourseError::Config(format!(
            "{} URL must start with http:// or https://",
            name
        )));
    }

    Ok(())
}

fn validate_timeout(name: &str, timeout_secs: u64) -> Result<()> {
    if timeout_secs == 0 {
        return Err(CourseError::Config(format!("{} timeout must be greater than 0", name)));
    }

    if timeout_secs > 300 {
        return Err(CourseError::Config(format!(
            "{} timeout too large (max: 300 seconds)",
            name
        )));
    }

    Ok(())
}

/// Validate Gemini configuration
fn validate_gemini_config(config: &GeminiConfig) -> Result<()> {
    validate_url("Gemini API", &config.api_url)?;

    if config.api_key.expose_secret().is_empty() {
        return Err(CourseError::Config(
            "Gemini API key is required".to_string()
        ));
    }

    if config.model.trim().is_empty() {
        return Err(CourseError::Config(
            "Gemini model cannot be empty".to_string()
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(CourseError::Config(
            "Temperature must be between 0.0 and 2.0".to_string()
        ));
    }

    if config.num_tries == 0 {
        return Err(CourseError::Config(
            "Generation attempts must be greater than 0".to_string()
        ));
    }

    if config.num_tries > 10 {
        return Err(CourseError::Config(
            "Generation attempts too large (max: 10)".to_string()
        ));
    }

    validate_timeout("Gemini", config.timeout_secs)?;

    Ok(())
}

/// Validate YouTube search configuration
fn validate_youtube_config(config: &YoutubeConfig) -> Result<()> {
    validate_url("YouTube API", &config.api_url)?;
    validate_timeout("YouTube search", config.timeout_secs)?;

    // The Data API caps maxResults at 50
    if config.max_results == 0 || config.max_results > 50 {
        return Err(CourseError::Config(
            "YouTube max results must be between 1 and 50".to_string()
        ));
    }

    Ok(())
}

/// Validate caption retrieval configuration
fn validate_transcript_config(config: &TranscriptConfig) -> Result<()> {
    validate_url("Caption watch", &config.watch_url)?;
    validate_timeout("Transcript", config.timeout_secs)?;

    if config.language.trim().is_empty() {
        return Err(CourseError::Config(
            "Transcript language cannot be empty".to_string()
        ));
    }

    if config.max_retries > 10 {
        return Err(CourseError::Config(
            "Transcript retries too large (max: 10)".to_string()
        ));
    }

    Ok(())
}

/// Validate Unsplash configuration
fn validate_unsplash_config(config: &UnsplashConfig) -> Result<()> {
    validate_url("Unsplash API", &config.api_url)?;
    validate_timeout("Unsplash", config.timeout_secs)
}

/// Validate question generation settings
fn validate_question_config(config: &QuestionConfig) -> Result<()> {
    if config.default_count == 0 {
        return Err(CourseError::Config(
            "Default question count must be greater than 0".to_string()
        ));
    }

    if config.default_count > config.max_count {
        return Err(CourseError::Config(format!(
            "Default question count {} exceeds maximum {}",
            config.default_count, config.max_count
        )));
    }

    if config.max_transcript_chars == 0 {
        return Err(CourseError::Config(
            "Transcript character budget must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate server configuration
pub fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(CourseError::Config(
            "Server port cannot be 0".to_string()
        ));
    }

    if config.host.is_empty() {
        return Err(CourseError::Config(
            "Server host cannot be empty".to_string()
        ));
    }

    if config.max_body_size_mb == 0 {
        return Err(CourseError::Config(
            "Max body size must be greater than 0".to_string()
        ));
    }

    Ok(())
}
