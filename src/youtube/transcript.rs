//! Flattened transcripts with bounded retries

use super::captions::CaptionSource;
use super::models::TranscriptSegment;
use crate::config::TranscriptConfig;
use crate::observability::MetricsCollector;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Retrieves a video's captions as one flat string
pub struct TranscriptFetcher {
    source: Arc<dyn CaptionSource>,
    language: String,
    country: String,
    max_retries: u32,
    retry_base_delay: Duration,
    metrics: Option<Arc<MetricsCollector>>,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn CaptionSource>, config: &TranscriptConfig) -> Self {
        Self {
            source,
            language: config.language.clone(),
            country: config.country.clone(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fetch with the configured retry budget
    pub async fn fetch(&self, video_id: &str) -> String {
        self.fetch_with_retries(video_id, self.max_retries).await
    }

    /// Fetch the transcript, retrying failures up to `max_retries` times.
    ///
    /// Returns an empty string for a blank id, a video without captions, or
    /// when every attempt failed.
    pub async fn fetch_with_retries(&self, video_id: &str, max_retries: u32) -> String {
        if video_id.trim().is_empty() {
            warn!("Video ID cannot be empty");
            return String::new();
        }

        let mut retries = 0;

        loop {
            if let Some(metrics) = &self.metrics {
                metrics.record_transcript_attempt();
            }

            match self
                .source
                .fetch_segments(video_id, &self.language, &self.country)
                .await
            {
                Ok(segments) if segments.is_empty() => {
                    info!("No transcript available for video: {}", video_id);
                    return String::new();
                }
                Ok(segments) => return join_segments(&segments),
                Err(e) => {
                    retries += 1;
                    if retries > max_retries {
                        error!(
                            "Failed to get transcript after {} retries for video {}: {}",
                            max_retries, video_id, e
                        );
                        if let Some(metrics) = &self.metrics {
                            metrics.record_transcript_failure();
                        }
                        return String::new();
                    }

                    warn!("Retry {}/{} for transcript of video {}: {}", retries, max_retries, video_id, e);
                    tokio::time::sleep(self.retry_base_delay * retries).await;
                }
            }
        }
    }
}

/// Join fragments with single spaces and drop embedded newlines
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\n', "")
}
