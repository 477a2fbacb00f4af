//! Application wiring and the HTTP server loop

use crate::api::{build_router, AppState};
use crate::config::Config;
use crate::course::ChapterContentService;
use crate::error::Result;
use crate::generation::{GeminiClient, GenerativeBackend, StructuredGenerator};
use crate::images::UnsplashClient;
use crate::observability::{HealthChecker, MetricsCollector};
use crate::questions::QuestionGenerator;
use crate::shutdown::ShutdownCoordinator;
use crate::youtube::{TranscriptFetcher, VideoSearchClient, YoutubeCaptionClient};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Construct every client once and share them through the router state
pub fn build_state(config: &Config) -> Result<AppState> {
    let metrics = Arc::new(MetricsCollector::new());

    let backend: Arc<dyn GenerativeBackend> = Arc::new(GeminiClient::new(config.gemini.clone())?);
    info!("Gemini client initialized with model {}", config.gemini.model);

    build_state_with_backend(config, backend, metrics)
}

/// Same as [`build_state`] with a caller-supplied generative backend
pub fn build_state_with_backend(
    config: &Config,
    backend: Arc<dyn GenerativeBackend>,
    metrics: Arc<MetricsCollector>,
) -> Result<AppState> {
    let generator = Arc::new(
        StructuredGenerator::new(backend.clone(), &config.gemini).with_metrics(metrics.clone()),
    );

    let video_search = Arc::new(
        VideoSearchClient::new(config.youtube.clone())?.with_metrics(metrics.clone()),
    );

    let captions = Arc::new(YoutubeCaptionClient::new(&config.transcript)?);
    let transcripts = Arc::new(
        TranscriptFetcher::new(captions, &config.transcript).with_metrics(metrics.clone()),
    );

    let questions = Arc::new(QuestionGenerator::new(generator.clone(), config.questions.clone()));
    let chapters = Arc::new(ChapterContentService::new(
        video_search.clone(),
        transcripts.clone(),
        questions.clone(),
    ));
    let images = Arc::new(UnsplashClient::new(config.unsplash.clone())?);

    let health_checker = Arc::new(
        HealthChecker::new()
            .with_backend(backend)
            .with_video_search(video_search.clone())
            .with_images(images.clone())
            .with_metrics(metrics.clone()),
    );
    info!("Application state initialized");

    Ok(AppState {
        generator,
        video_search,
        transcripts,
        questions,
        chapters,
        images,
        health_checker,
        metrics,
    })
}

/// Build the router for `state` using the configured body limit
pub fn create_app(config: &Config, state: AppState) -> Router {
    build_router(state, config.server.max_body_size_mb * 1024 * 1024)
}

/// Serve until Ctrl+C or SIGTERM
pub async fn serve(config: &Config, app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let coordinator = Arc::new(ShutdownCoordinator::new());
    let notifier = coordinator.subscribe();

    tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.wait_for_signal().await }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            notifier.wait().await;
            info!("Starting graceful shutdown");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
