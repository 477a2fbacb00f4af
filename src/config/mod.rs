//! Configuration management for the course generator

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use secrecy::{Secret, ExposeSecret};

pub mod loader;
pub mod validation;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
    #[serde(default)]
    pub unsplash: UnsplashConfig,
    #[serde(default)]
    pub questions: QuestionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Configuration for the Gemini generative backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL of the Generative Language API
    #[serde(default = "default_gemini_url")]
    pub api_url: String,

    /// API key (secured)
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub api_key: Secret<String>,

    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature used when a request does not set one
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Attempts per structured generation call
    #[serde(default = "default_num_tries")]
    pub num_tries: u32,

    /// Request timeout in seconds
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,

    /// Base delay multiplied by the attempt number after a rate limit
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_base_delay_ms: u64,
}

/// Configuration for the YouTube Data API search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    /// Base URL of the YouTube Data API
    #[serde(default = "default_youtube_url")]
    pub api_url: String,

    /// API key (optional, secured), falls back to `YOUTUBE_API_KEY`
    #[serde(default = "default_youtube_key", serialize_with = "serialize_optional_secret", deserialize_with = "deserialize_optional_secret")]
    pub api_key: Option<Secret<String>>,

    /// Per-request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Default number of results requested
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Qualifier appended to every query to bias towards educational content
    #[serde(default = "default_source_qualifier")]
    pub source_qualifier: String,

    /// Relevance language passed to the search API
    #[serde(default = "default_language")]
    pub relevance_language: String,
}

/// Configuration for caption retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Watch page URL used to discover caption tracks
    #[serde(default = "default_watch_url")]
    pub watch_url: String,

    /// Caption language
    #[serde(default = "default_language")]
    pub language: String,

    /// Caption region
    #[serde(default = "default_country")]
    pub country: String,

    /// Retries after the first failed attempt
    #[serde(default = "default_transcript_retries")]
    pub max_retries: u32,

    /// Base delay multiplied by the retry number
    #[serde(default = "default_transcript_delay")]
    pub retry_base_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Configuration for Unsplash image lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsplashConfig {
    /// Base URL of the Unsplash API
    #[serde(default = "default_unsplash_url")]
    pub api_url: String,

    /// Access key (optional, secured), falls back to `UNSPLASH_ACCESS_KEY`
    #[serde(default = "default_unsplash_key", serialize_with = "serialize_optional_secret", deserialize_with = "deserialize_optional_secret")]
    pub access_key: Option<Secret<String>>,

    /// Request timeout in seconds
    #[serde(default = "default_unsplash_timeout")]
    pub timeout_secs: u64,
}

/// Question generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    /// Questions generated when the caller does not ask for a count
    #[serde(default = "default_question_count")]
    pub default_count: usize,

    /// Upper bound accepted from API callers
    #[serde(default = "default_max_question_count")]
    pub max_count: usize,

    /// Transcript characters sent to the model
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Server host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size")]
    pub max_body_size_mb: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_gemini_url() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_model() -> String { "gemini-2.0-flash".to_string() }
fn default_temperature() -> f32 { 1.0 }
fn default_num_tries() -> u32 { 3 }
fn default_gemini_timeout() -> u64 { 60 }
fn default_rate_limit_delay() -> u64 { 2000 }
fn default_youtube_url() -> String { "https://www.googleapis.com/youtube/v3".to_string() }
fn default_search_timeout() -> u64 { 8 }
fn default_max_results() -> u32 { 5 }
fn default_source_qualifier() -> String { "Khan Academy".to_string() }
fn default_language() -> String { "en".to_string() }
fn default_country() -> String { "EN".to_string() }
fn default_watch_url() -> String { "https://www.youtube.com/watch".to_string() }
fn default_transcript_retries() -> u32 { 2 }
fn default_transcript_delay() -> u64 { 1000 }
fn default_timeout() -> u64 { 30 }
fn default_unsplash_url() -> String { "https://api.unsplash.com".to_string() }
fn default_unsplash_timeout() -> u64 { 10 }
fn default_youtube_key() -> Option<Secret<String>> { env_secret("YOUTUBE_API_KEY") }
fn default_unsplash_key() -> Option<Secret<String>> { env_secret("UNSPLASH_ACCESS_KEY") }
fn default_question_count() -> usize { 5 }
fn default_max_question_count() -> usize { 20 }
fn default_max_transcript_chars() -> usize { 5000 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }
fn default_server_port() -> u16 { 3000 }
fn default_server_host() -> String { "0.0.0.0".to_string() }
fn default_max_body_size() -> usize { 1 }

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_url: default_youtube_url(),
            api_key: default_youtube_key(),
            timeout_secs: default_search_timeout(),
            max_results: default_max_results(),
            source_qualifier: default_source_qualifier(),
            relevance_language: default_language(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            watch_url: default_watch_url(),
            language: default_language(),
            country: default_country(),
            max_retries: default_transcript_retries(),
            retry_base_delay_ms: default_transcript_delay(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for UnsplashConfig {
    fn default() -> Self {
        Self {
            api_url: default_unsplash_url(),
            access_key: default_unsplash_key(),
            timeout_secs: default_unsplash_timeout(),
        }
    }
}

impl Default for QuestionConfig {
    fn default() -> Self {
        Self {
            default_count: default_question_count(),
            max_count: default_max_question_count(),
            max_transcript_chars: default_max_transcript_chars(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            host: default_server_host(),
            max_body_size_mb: default_max_body_size(),
        }
    }
}

impl GeminiConfig {
    pub fn rate_limit_base_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_base_delay_ms)
    }
}

impl TranscriptConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config_with_env(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Validate this configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validation::validate_config(self)
    }

    /// Create default configuration, taking API keys from the environment
    pub fn default_config() -> Self {
        Self {
            gemini: GeminiConfig {
                api_url: default_gemini_url(),
                api_key: Secret::new(std::env::var("GEMINI_API_KEY").unwrap_or_default()),
                model: default_model(),
                temperature: default_temperature(),
                num_tries: default_num_tries(),
                timeout_secs: default_gemini_timeout(),
                rate_limit_base_delay_ms: default_rate_limit_delay(),
            },
            youtube: YoutubeConfig::default(),
            transcript: TranscriptConfig::default(),
            unsplash: UnsplashConfig::default(),
            questions: QuestionConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Read a non-empty environment variable as a secret
fn env_secret(name: &str) -> Option<Secret<String>> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Secret::new)
}

/// Custom serializer for Secret<String>
fn serialize_secret<S>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

/// Custom deserializer for Secret<String>
fn deserialize_secret<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(Secret::new(s))
}

/// Custom serializer for Option<Secret<String>>
fn serialize_optional_secret<S>(secret: &Option<Secret<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Custom deserializer for Option<Secret<String>>
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.trim().is_empty()).map(Secret::new))
}
