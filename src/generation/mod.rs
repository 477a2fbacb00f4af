//! Structured generation on top of a generative-AI backend

pub mod client;
pub mod format;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod strict;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GeminiClient;
pub use format::{FieldSpec, OutputFormat};
pub use strict::{GenerationDefaults, GenerationOutput, GenerationRequest, PromptInput, StructuredGenerator};

use async_trait::async_trait;
use crate::error::GenerationError;
use serde::Serialize;

/// One completion call: everything the backend needs, nothing else
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Trait for generative text backends
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Return the raw text of a completion
    async fn generate(&self, request: &CompletionRequest) -> Result<String, GenerationError>;

    /// Short name used in logs
    fn backend_name(&self) -> &'static str;
}
