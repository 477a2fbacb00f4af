//! Error types for the course generation system

use thiserror::Error;

/// Result type alias for course generator operations
pub type Result<T> = std::result::Result<T, CourseError>;

/// Main error type for the course generation system
#[derive(Error, Debug)]
pub enum CourseError {
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("YouTube error: {0}")]
    Youtube(#[from] YoutubeError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::middleware::ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by a single structured generation attempt
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Invalid JSON in model output: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Output format not in an array of json")]
    NotAnArray,

    #[error("Expected {expected} json elements, got {actual}")]
    BatchLengthMismatch { expected: usize, actual: usize },

    #[error("Element {index} is not a json object")]
    NotAnObject { index: usize },

    #[error("{key} not in json output")]
    MissingKey { key: String },

    #[error("{key} is not one of the listed text choices")]
    InvalidChoice { key: String },
}

impl GenerationError {
    /// Whether the backend asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GenerationError::RateLimitExceeded(_) => true,
            GenerationError::ApiError(msg) => msg.to_lowercase().contains("rate limit"),
            _ => false,
        }
    }
}

/// Errors related to the YouTube Data API
#[derive(Error, Debug)]
pub enum YoutubeError {
    #[error("Search query cannot be empty")]
    EmptyQuery,

    #[error("YouTube API key is not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
}

/// Errors related to caption retrieval
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    #[error("Too many requests, captcha required")]
    TooManyRequests,

    #[error("Video is no longer available: {0}")]
    VideoUnavailable(String),

    #[error("Transcript is disabled on this video: {0}")]
    Disabled(String),

    #[error("No captions available in language: {0}")]
    LanguageUnavailable(String),

    #[error("Malformed caption data: {0}")]
    Malformed(String),
}

/// Errors related to image lookup
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("UNSPLASH_ACCESS_KEY is not set")]
    MissingCredentials,

    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
}

// Request URLs carry API keys in their query strings, so the URL is stripped
// before a transport error can reach a log line or a retry prompt.
impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::NetworkError(err.without_url())
    }
}

impl From<reqwest::Error> for YoutubeError {
    fn from(err: reqwest::Error) -> Self {
        YoutubeError::NetworkError(err.without_url())
    }
}

impl From<reqwest::Error> for TranscriptError {
    fn from(err: reqwest::Error) -> Self {
        TranscriptError::NetworkError(err.without_url())
    }
}

impl From<reqwest::Error> for ImageError {
    fn from(err: reqwest::Error) -> Self {
        ImageError::NetworkError(err.without_url())
    }
}

impl From<config::ConfigError> for CourseError {
    fn from(err: config::ConfigError) -> Self {
        CourseError::Config(err.to_string())
    }
}
