//! Wire models for the Gemini `generateContent` endpoint

use serde::{Deserialize, Serialize};

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Conversation turns; the whole prompt goes into a single user turn
    pub contents: Vec<Content>,

    /// Sampling settings
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

/// A single conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A text part of a turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

/// Response from `generateContent`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    #[serde(rename = "promptFeedback", default)]
    pub prompt_feedback: Option<PromptFeedback>,

    #[serde(rename = "usageMetadata", default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,

    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    pub block_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "totalTokenCount", default)]
    pub total_token_count: u32,
}

impl GenerateContentRequest {
    /// Single user turn carrying the whole prompt
    pub fn user_prompt(text: impl Into<String>, temperature: f32) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: text.into() }],
            }],
            generation_config: GenerationConfig { temperature },
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
