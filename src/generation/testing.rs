//! Scripted backend for unit tests

use super::{CompletionRequest, GenerativeBackend};
use crate::error::GenerationError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays a fixed list of responses and records every request
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::ApiError("script exhausted".to_string())))
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}
