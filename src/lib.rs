//! Course Generator - AI-assisted course content with validated structured output
//!
//! This library turns a course topic into chapter material: a representative
//! video, its transcript and a set of multiple-choice questions. At its core
//! is a structured generation wrapper that makes a Gemini model answer in a
//! declared JSON shape, feeding validation failures back into the prompt.
//!
//! ## Features
//!
//! - **Structured Generation**: output format declarations, parsing, validation and self-correcting retries
//! - **Video Search**: YouTube Data API lookup with query simplification and fallback
//! - **Transcripts**: caption retrieval with bounded retries
//! - **Question Generation**: batched multiple-choice questions from a transcript
//! - **Observability**: metrics and health checks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use course_generator::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("config.toml")?;
//!
//!     let backend = Arc::new(GeminiClient::new(config.gemini.clone())?);
//!     let generator = StructuredGenerator::new(backend, &config.gemini);
//!
//!     let request = GenerationRequest::new(
//!         "You are a helpful AI that summarises topics",
//!         "Explain the chain rule",
//!         OutputFormat::new().description("summary", "summary in under 50 words"),
//!     );
//!     let output = generator.strict_output(&request).await;
//!     println!("{:?}", output);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod course;
pub mod error;
pub mod generation;
pub mod images;
pub mod middleware;
pub mod observability;
pub mod questions;
pub mod server;
pub mod shutdown;
pub mod youtube;

pub use config::Config;
pub use error::{CourseError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::course::{ChapterContent, ChapterContentService};
    pub use crate::error::{CourseError, Result};
    pub use crate::generation::{
        GeminiClient, GenerationOutput, GenerationRequest, GenerativeBackend, OutputFormat, StructuredGenerator,
    };
    pub use crate::images::UnsplashClient;
    pub use crate::middleware::InputValidator;
    pub use crate::observability::{HealthChecker, MetricsCollector};
    pub use crate::questions::{Question, QuestionGenerator};
    pub use crate::youtube::{TranscriptFetcher, VideoSearchClient, YoutubeCaptionClient};
}
