//! API request handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::{
    course::{ChapterContent, ChapterContentService},
    error::ImageError,
    generation::{GenerationOutput, GenerationRequest, PromptInput, StructuredGenerator},
    images::UnsplashClient,
    middleware::{InputValidator, ValidationError},
    observability::{HealthChecker, MetricsCollector},
    questions::{Question, QuestionGenerator},
    youtube::{TranscriptFetcher, VideoDuration, VideoSearchClient},
};

/// Largest `max_results` the search API accepts
const MAX_SEARCH_RESULTS: u32 = 50;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<StructuredGenerator>,
    pub video_search: Arc<VideoSearchClient>,
    pub transcripts: Arc<TranscriptFetcher>,
    pub questions: Arc<QuestionGenerator>,
    pub chapters: Arc<ChapterContentService>,
    pub images: Arc<UnsplashClient>,
    pub health_checker: Arc<HealthChecker>,
    pub metrics: Arc<MetricsCollector>,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", err))
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::MissingCredentials => ApiError::Unavailable(err.to_string()),
            other => ApiError::Internal(other.into()),
        }
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Response from raw structured generation
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub output: GenerationOutput,
}

/// Query for video search
#[derive(Debug, Deserialize)]
pub struct VideoSearchQuery {
    pub query: String,
    #[serde(default)]
    pub duration: VideoDuration,
    pub max_results: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct VideoSearchResponse {
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub video_id: String,
    pub transcript: String,
}

/// Request to generate questions from a transcript
#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    pub transcript: String,
    pub course_title: String,
    pub num_questions: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
}

/// Request to build a chapter's video, transcript and questions
#[derive(Debug, Deserialize)]
pub struct ChapterContentRequest {
    pub query: String,
    pub course_title: String,
    pub num_questions: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ImageSearchQuery {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ImageSearchResponse {
    pub url: Option<String>,
}

/// Run a raw structured generation request
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> ApiResult<GenerateResponse> {
    InputValidator::validate_text("system_prompt", &req.system_prompt)?;

    match &req.input {
        PromptInput::Single(text) => InputValidator::validate_text("input", text)?,
        PromptInput::Batch(items) => {
            InputValidator::validate_batch_size(items.len())?;
            for item in items {
                InputValidator::validate_text("input", item)?;
            }
        }
    }

    if req.output_format.is_empty() {
        return Err(ValidationError::EmptyField("output_format".to_string()).into());
    }

    if let Some(temperature) = req.temperature {
        InputValidator::validate_temperature(temperature)?;
    }

    if let Some(num_tries) = req.num_tries {
        InputValidator::validate_num_tries(num_tries)?;
    }

    let output = state.generator.strict_output(&req).await;
    Ok(Json(GenerateResponse { output }))
}

/// Find a video for a topic
pub async fn search_videos(
    State(state): State<AppState>,
    Query(params): Query<VideoSearchQuery>,
) -> ApiResult<VideoSearchResponse> {
    InputValidator::validate_text("query", &params.query)?;

    let max_results = params
        .max_results
        .unwrap_or_else(|| state.video_search.default_max_results())
        .clamp(1, MAX_SEARCH_RESULTS);

    let video_id = state
        .video_search
        .search(&params.query, params.duration, max_results)
        .await;

    Ok(Json(VideoSearchResponse { video_id }))
}

/// Fetch a video's flattened transcript
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<TranscriptResponse> {
    InputValidator::validate_video_id(&video_id)?;

    let transcript = state.transcripts.fetch(&video_id).await;
    Ok(Json(TranscriptResponse { video_id, transcript }))
}

/// Generate quiz questions from a transcript
pub async fn generate_questions(
    State(state): State<AppState>,
    Json(req): Json<QuestionsRequest>,
) -> ApiResult<QuestionsResponse> {
    InputValidator::validate_text("transcript", &req.transcript)?;
    InputValidator::validate_text("course_title", &req.course_title)?;

    let config = state.questions.config();
    let num_questions = req.num_questions.unwrap_or(config.default_count);
    InputValidator::validate_question_count(num_questions, config.max_count)?;

    let questions = state
        .questions
        .generate(&req.transcript, &req.course_title, num_questions)
        .await;

    Ok(Json(QuestionsResponse { questions }))
}

/// Build the full content of one chapter
pub async fn chapter_content(
    State(state): State<AppState>,
    Json(req): Json<ChapterContentRequest>,
) -> ApiResult<ChapterContent> {
    InputValidator::validate_text("query", &req.query)?;
    InputValidator::validate_text("course_title", &req.course_title)?;

    let config = state.questions.config();
    let num_questions = req.num_questions.unwrap_or(config.default_count);
    InputValidator::validate_question_count(num_questions, config.max_count)?;

    let content = state
        .chapters
        .build(&req.query, &req.course_title, num_questions)
        .await;

    Ok(Json(content))
}

/// Look up a cover image
pub async fn search_image(
    State(state): State<AppState>,
    Query(params): Query<ImageSearchQuery>,
) -> ApiResult<ImageSearchResponse> {
    InputValidator::validate_text("query", &params.query)?;

    let url = state.images.search_image(&params.query).await?;
    Ok(Json(ImageSearchResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let response = ApiError::from(ValidationError::EmptyField("query".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_image_key_is_unavailable() {
        let response = ApiError::from(ImageError::MissingCredentials).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
