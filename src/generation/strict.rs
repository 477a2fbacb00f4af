//! Structured generation with validation and self-correcting retries

use super::format::OutputFormat;
use super::{parser, prompt, CompletionRequest, GenerativeBackend};
use crate::config::GeminiConfig;
use crate::error::GenerationError;
use crate::observability::MetricsCollector;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// One prompt, or a batch of independent prompts answered in a single call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptInput {
    Single(String),
    Batch(Vec<String>),
}

impl PromptInput {
    pub fn is_batch(&self) -> bool {
        matches!(self, PromptInput::Batch(_))
    }

    /// Number of elements the response must contain, if batched
    pub fn batch_len(&self) -> Option<usize> {
        match self {
            PromptInput::Single(_) => None,
            PromptInput::Batch(items) => Some(items.len()),
        }
    }

    /// User-facing part of the prompt
    pub fn render(&self) -> String {
        match self {
            PromptInput::Single(text) => text.clone(),
            PromptInput::Batch(items) => {
                serde_json::to_string(items).unwrap_or_else(|_| items.join(", "))
            }
        }
    }
}

impl From<&str> for PromptInput {
    fn from(text: &str) -> Self {
        PromptInput::Single(text.to_string())
    }
}

impl From<String> for PromptInput {
    fn from(text: String) -> Self {
        PromptInput::Single(text)
    }
}

impl From<Vec<String>> for PromptInput {
    fn from(items: Vec<String>) -> Self {
        PromptInput::Batch(items)
    }
}

/// A structured generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Instructions placed before the output format rules
    pub system_prompt: String,

    /// User prompt(s)
    pub input: PromptInput,

    /// Expected shape of every generated element
    pub output_format: OutputFormat,

    /// Replacement for choice fields the model answered outside their choices
    #[serde(default)]
    pub default_category: Option<String>,

    /// Return element values instead of objects
    #[serde(default)]
    pub output_value_only: bool,

    /// Model override
    #[serde(default)]
    pub model: Option<String>,

    /// Temperature override
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Attempt budget override
    #[serde(default)]
    pub num_tries: Option<u32>,
}

impl GenerationRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        input: impl Into<PromptInput>,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            input: input.into(),
            output_format,
            default_category: None,
            output_value_only: false,
            model: None,
            temperature: None,
            num_tries: None,
        }
    }

    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = Some(category.into());
        self
    }

    pub fn values_only(mut self) -> Self {
        self.output_value_only = true;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_num_tries(mut self, num_tries: u32) -> Self {
        self.num_tries = Some(num_tries);
        self
    }

    /// An empty default category counts as no default
    fn default_category(&self) -> Option<&str> {
        self.default_category.as_deref().filter(|c| !c.is_empty())
    }
}

/// Result of a structured generation call
///
/// `Empty` means every attempt failed. It is not a legitimate "zero items"
/// answer and callers must treat it as a total failure.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    Single(Value),
    Batch(Vec<Value>),
    Empty,
}

impl GenerationOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            GenerationOutput::Single(_) => false,
            GenerationOutput::Batch(items) => items.is_empty(),
            GenerationOutput::Empty => true,
        }
    }

    /// Validated elements as a list, whatever the input cardinality
    pub fn into_items(self) -> Vec<Value> {
        match self {
            GenerationOutput::Single(value) => vec![value],
            GenerationOutput::Batch(items) => items,
            GenerationOutput::Empty => Vec::new(),
        }
    }

    /// Deserialize every element into `T`, dropping the ones that do not fit
    pub fn deserialize_items<T: DeserializeOwned>(self) -> Vec<T> {
        self.into_items()
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Dropping generated element {}: {}", index, e);
                    None
                }
            })
            .collect()
    }
}

impl Serialize for GenerationOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GenerationOutput::Single(value) => value.serialize(serializer),
            GenerationOutput::Batch(items) => items.serialize(serializer),
            GenerationOutput::Empty => Vec::<Value>::new().serialize(serializer),
        }
    }
}

/// Defaults applied to requests that do not override them
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    pub model: String,
    pub temperature: f32,
    pub num_tries: u32,
    pub rate_limit_base_delay: Duration,
}

impl From<&GeminiConfig> for GenerationDefaults {
    fn from(config: &GeminiConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            num_tries: config.num_tries,
            rate_limit_base_delay: config.rate_limit_base_delay(),
        }
    }
}

/// Wraps a generative backend and enforces a JSON output contract on it
pub struct StructuredGenerator {
    backend: Arc<dyn GenerativeBackend>,
    defaults: GenerationDefaults,
    metrics: Option<Arc<MetricsCollector>>,
}

impl StructuredGenerator {
    /// Create a generator with defaults taken from the Gemini configuration
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: &GeminiConfig) -> Self {
        Self::with_defaults(backend, GenerationDefaults::from(config))
    }

    pub fn with_defaults(backend: Arc<dyn GenerativeBackend>, defaults: GenerationDefaults) -> Self {
        info!(
            "Initialized structured generator on {} with model={}, num_tries={}",
            backend.backend_name(),
            defaults.model,
            defaults.num_tries
        );

        Self {
            backend,
            defaults,
            metrics: None,
        }
    }

    /// Record attempts and failures
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }

    /// Generate output matching `request.output_format`.
    ///
    /// Each failed attempt is fed back into the next prompt. After the attempt
    /// budget is spent this returns [`GenerationOutput::Empty`] instead of an error.
    pub async fn strict_output(&self, request: &GenerationRequest) -> GenerationOutput {
        let num_tries = request.num_tries.unwrap_or(self.defaults.num_tries);
        let completion_base = CompletionRequest {
            model: request.model.clone().unwrap_or_else(|| self.defaults.model.clone()),
            prompt: String::new(),
            temperature: request.temperature.unwrap_or(self.defaults.temperature),
        };

        let started = Instant::now();
        let mut error_context = String::new();

        for attempt in 0..num_tries {
            let completion = CompletionRequest {
                prompt: prompt::build_prompt(
                    &request.system_prompt,
                    &request.output_format,
                    &request.input,
                    &error_context,
                ),
                ..completion_base.clone()
            };

            debug!("Structured generation attempt {}/{} prompt: {}", attempt + 1, num_tries, completion.prompt);
            if let Some(metrics) = &self.metrics {
                metrics.record_generation_attempt();
            }

            let (error, raw) = match self.backend.generate(&completion).await {
                Ok(raw) => {
                    debug!("Model response: {}", raw);
                    match self.process_response(&raw, request) {
                        Ok(output) => {
                            info!(
                                "Structured generation succeeded on attempt {}/{} with {} element(s)",
                                attempt + 1,
                                num_tries,
                                request.input.batch_len().unwrap_or(1)
                            );
                            if let Some(metrics) = &self.metrics {
                                metrics.record_generation_latency(started.elapsed());
                            }
                            return output;
                        }
                        Err(e) => (e, Some(raw)),
                    }
                }
                Err(e) => (e, None),
            };

            warn!("Structured generation attempt {}/{} failed: {}", attempt + 1, num_tries, error);
            if let Some(metrics) = &self.metrics {
                metrics.record_generation_failure();
            }

            if error.is_rate_limited() && attempt + 1 < num_tries {
                let backoff = self.defaults.rate_limit_base_delay * (attempt + 1);
                debug!("Rate limited, retrying in {:?}", backoff);
                tokio::time::sleep(backoff).await;
            }

            error_context = prompt::error_context(&error, raw.as_deref());
        }

        error!("Structured generation exhausted {} attempt(s)", num_tries);
        if let Some(metrics) = &self.metrics {
            metrics.record_generation_exhausted();
        }

        GenerationOutput::Empty
    }

    /// Parse, validate and reshape one raw response
    fn process_response(
        &self,
        raw: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let mut elements = parser::parse_output(raw, request.input.batch_len())?;

        for (index, element) in elements.iter_mut().enumerate() {
            parser::validate_element(index, element, &request.output_format, request.default_category())?;
        }

        if request.output_value_only {
            elements = elements.into_iter().map(parser::values_only).collect();
        }

        Ok(match request.input {
            PromptInput::Batch(_) => GenerationOutput::Batch(elements),
            PromptInput::Single(_) => elements
                .into_iter()
                .next()
                .map(GenerationOutput::Single)
                .unwrap_or(GenerationOutput::Empty),
        })
    }
}
