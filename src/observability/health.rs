//! Health check endpoints and monitoring

use crate::generation::GenerativeBackend;
use crate::images::UnsplashClient;
use crate::observability::MetricsCollector;
use crate::youtube::VideoSearchClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,

    /// Health status
    pub status: HealthStatus,

    /// Optional message
    pub message: Option<String>,
}

impl ComponentHealth {
    fn new(name: &str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message.into()),
        }
    }
}

/// Overall system health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Overall status
    pub status: HealthStatus,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// Component health checks
    pub components: Vec<ComponentHealth>,

    /// Timestamp
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
struct CachedHealth {
    result: SystemHealth,
    cached_at: Instant,
}

/// Health checker with caching
///
/// Checks are local: a collaborator is reported by whether it is wired up and
/// has credentials, never by calling the remote service.
pub struct HealthChecker {
    start_time: Instant,
    backend: Option<Arc<dyn GenerativeBackend>>,
    video_search: Option<Arc<VideoSearchClient>>,
    images: Option<Arc<UnsplashClient>>,
    metrics: Option<Arc<MetricsCollector>>,
    cached_result: Arc<RwLock<Option<CachedHealth>>>,
    cache_ttl: Duration,
}

impl HealthChecker {
    /// Create a new health checker with default 30-second cache TTL
    pub fn new() -> Self {
        Self::with_cache_ttl(Duration::from_secs(30))
    }

    pub fn with_cache_ttl(cache_ttl: Duration) -> Self {
        Self {
            start_time: Instant::now(),
            backend: None,
            video_search: None,
            images: None,
            metrics: None,
            cached_result: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_video_search(mut self, video_search: Arc<VideoSearchClient>) -> Self {
        self.video_search = Some(video_search);
        self
    }

    pub fn with_images(mut self, images: Arc<UnsplashClient>) -> Self {
        self.images = Some(images);
        self
    }

    /// Use generation counters to flag a backend that keeps failing
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Check overall system health with caching
    pub async fn check_health(&self) -> SystemHealth {
        {
            let cached = self.cached_result.read().await;
            if let Some(cached_health) = &*cached {
                if cached_health.cached_at.elapsed() < self.cache_ttl {
                    debug!("Returning cached health check result");
                    return cached_health.result.clone();
                }
            }
        }

        debug!("Performing fresh health check");
        self.check_health_fresh().await
    }

    /// Force refresh health check (bypass cache)
    pub async fn check_health_fresh(&self) -> SystemHealth {
        let health = self.perform_health_check();

        let mut cached = self.cached_result.write().await;
        *cached = Some(CachedHealth {
            result: health.clone(),
            cached_at: Instant::now(),
        });

        health
    }

    fn perform_health_check(&self) -> SystemHealth {
        let components = vec![
            self.check_generation(),
            self.check_video_search(),
            self.check_images(),
        ];

        let status = if components.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        SystemHealth {
            status,
            uptime_secs: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    fn check_generation(&self) -> ComponentHealth {
        const NAME: &str = "generative_backend";

        let Some(backend) = &self.backend else {
            return ComponentHealth::new(NAME, HealthStatus::Unhealthy, "Not configured");
        };

        if let Some(metrics) = &self.metrics {
            let snapshot = metrics.get_metrics();
            if snapshot.generation_attempts >= 10 && snapshot.generation_failures == snapshot.generation_attempts {
                return ComponentHealth::new(
                    NAME,
                    HealthStatus::Degraded,
                    format!("{}: every one of {} attempts failed", backend.backend_name(), snapshot.generation_attempts),
                );
            }
        }

        ComponentHealth::new(NAME, HealthStatus::Healthy, format!("{} configured", backend.backend_name()))
    }

    fn check_video_search(&self) -> ComponentHealth {
        const NAME: &str = "video_search";

        match &self.video_search {
            Some(client) if client.has_credentials() => {
                ComponentHealth::new(NAME, HealthStatus::Healthy, "API key configured")
            }
            Some(_) => ComponentHealth::new(NAME, HealthStatus::Degraded, "API key not configured"),
            None => ComponentHealth::new(NAME, HealthStatus::Degraded, "Not configured"),
        }
    }

    fn check_images(&self) -> ComponentHealth {
        const NAME: &str = "image_search";

        match &self.images {
            Some(client) if client.has_credentials() => {
                ComponentHealth::new(NAME, HealthStatus::Healthy, "Access key configured")
            }
            Some(_) => ComponentHealth::new(NAME, HealthStatus::Degraded, "Access key not configured"),
            None => ComponentHealth::new(NAME, HealthStatus::Degraded, "Not configured"),
        }
    }

    /// Simple liveness check
    pub fn liveness(&self) -> bool {
        true
    }

    /// Ready unless a required collaborator is missing
    pub async fn readiness(&self) -> bool {
        let health = self.check_health().await;
        health.status != HealthStatus::Unhealthy
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}
