//! Gemini client for the Generative Language API

use super::models::{GenerateContentRequest, GenerateContentResponse};
use super::{CompletionRequest, GenerativeBackend};
use crate::config::GeminiConfig;
use crate::error::{GenerationError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, error, info};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` endpoint
///
/// Built once at startup and shared by reference; holds no per-call state.
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(GenerationError::from)?;

        info!("Initialized Gemini client for {}", config.api_url);

        Ok(Self { config, http_client })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, request: &CompletionRequest) -> std::result::Result<String, GenerationError> {
        let body = GenerateContentRequest::user_prompt(request.prompt.clone(), request.temperature);

        debug!("Sending generateContent request to model {}", request.model);

        let response = self
            .http_client
            .post(self.endpoint(&request.model))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini API error {}: {}", status, error_text);

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimitExceeded(error_text),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::AuthenticationFailed,
                _ => GenerationError::ApiError(format!("API error {}: {}", status, error_text)),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!("Gemini used {} tokens", usage.total_token_count);
        }

        match parsed.text() {
            Some(text) => Ok(text),
            None => match parsed.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => Err(GenerationError::ApiError(format!("Prompt blocked: {}", reason))),
                None => Err(GenerationError::EmptyResponse),
            },
        }
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use secrecy::Secret;

    fn test_config(api_url: String) -> GeminiConfig {
        GeminiConfig {
            api_url,
            api_key: Secret::new("test-key".to_string()),
            model: "gemini-2.0-flash".to_string(),
            temperature: 1.0,
            num_tries: 3,
            timeout_secs: 5,
            rate_limit_base_delay_ms: 1,
        }
    }

    fn completion(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "gemini-2.0-flash".to_string(),
            prompt: prompt.to_string(),
            temperature: 0.5,
        }
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_header(API_KEY_HEADER, "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "say hi"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"greeting\": \"hi\"}"}]}}]}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(test_config(server.url())).unwrap();
        let text = client.generate(&completion("say hi")).await.unwrap();

        assert_eq!(text, "{\"greeting\": \"hi\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_status_maps_to_rate_limit_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("Resource has been exhausted")
            .create_async()
            .await;

        let client = GeminiClient::new(test_config(server.url())).unwrap();
        let err = client.generate(&completion("x")).await.unwrap_err();

        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let client = GeminiClient::new(test_config(server.url())).unwrap();
        let err = client.generate(&completion("x")).await.unwrap_err();

        assert!(matches!(err, GenerationError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(test_config(server.url())).unwrap();
        let err = client.generate(&completion("x")).await.unwrap_err();

        assert_eq!(err.to_string(), "API request failed: Prompt blocked: SAFETY");
    }

    #[tokio::test]
    async fn test_network_error_does_not_expose_api_key() {
        let mut config = test_config("http://127.0.0.1:1".to_string());
        config.api_key = Secret::new("super-secret-gemini-key".to_string());

        let client = GeminiClient::new(config).unwrap();
        let err = client.generate(&completion("x")).await.unwrap_err();

        assert!(matches!(err, GenerationError::NetworkError(_)));
        assert!(!err.to_string().contains("super-secret-gemini-key"));
        assert!(!format!("{:?}", err).contains("super-secret-gemini-key"));
    }
}
