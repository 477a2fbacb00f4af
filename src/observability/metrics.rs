//! Metrics collection and reporting

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of the collected counters
#[derive(Debug, Clone)]
pub struct SystemMetrics {
    /// Total HTTP requests processed
    pub total_requests: u64,

    /// Total HTTP requests that ended in an error response
    pub total_errors: u64,

    /// Average response time (ms)
    pub avg_response_time_ms: f64,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// Backend calls made by the structured generator
    pub generation_attempts: u64,

    /// Attempts rejected by the backend or by output validation
    pub generation_failures: u64,

    /// Structured generation calls that used up every attempt
    pub generation_exhausted: u64,

    pub video_searches_found: u64,
    pub video_searches_empty: u64,

    /// Caption fetch attempts, retries included
    pub transcript_fetches: u64,

    /// Transcript lookups that gave up after all retries
    pub transcript_failures: u64,
}

/// Latency histogram buckets (in milliseconds)
const LATENCY_BUCKETS: &[f64] = &[10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0];

/// Histogram for tracking latency distribution
#[derive(Debug, Clone)]
pub struct Histogram {
    buckets: Vec<(f64, Arc<AtomicU64>)>,
    sum: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Histogram {
    fn new(buckets: &[f64]) -> Self {
        let bucket_counters = buckets
            .iter()
            .map(|&b| (b, Arc::new(AtomicU64::new(0))))
            .collect();

        Self {
            buckets: bucket_counters,
            sum: Arc::new(AtomicU64::new(0)),
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    fn observe(&self, value: f64) {
        self.sum.fetch_add(value as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        // Cumulative: every bucket at or above the value counts it
        for (bucket, counter) in &self.buckets {
            if value <= *bucket {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn export_prometheus(&self, name: &str, help: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} histogram\n", name));

        for (bucket, counter) in &self.buckets {
            let count = counter.load(Ordering::Relaxed);
            output.push_str(&format!("{}_bucket{{le=\"{}\"}} {}\n", name, bucket, count));
        }

        let total_count = self.count();
        output.push_str(&format!("{}_bucket{{le=\"+Inf\"}} {}\n", name, total_count));

        let sum = self.sum.load(Ordering::Relaxed) as f64;
        output.push_str(&format!("{}_sum {:.3}\n", name, sum));
        output.push_str(&format!("{}_count {}\n", name, total_count));

        output
    }
}

/// Lock-free metrics collector shared by every component
pub struct MetricsCollector {
    start_time: Instant,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    total_response_time_ms: AtomicU64,

    generation_attempts: AtomicU64,
    generation_failures: AtomicU64,
    generation_exhausted: AtomicU64,

    video_searches_found: AtomicU64,
    video_searches_empty: AtomicU64,

    transcript_fetches: AtomicU64,
    transcript_failures: AtomicU64,

    request_latency: Histogram,
    generation_latency: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            total_response_time_ms: AtomicU64::new(0),
            generation_attempts: AtomicU64::new(0),
            generation_failures: AtomicU64::new(0),
            generation_exhausted: AtomicU64::new(0),
            video_searches_found: AtomicU64::new(0),
            video_searches_empty: AtomicU64::new(0),
            transcript_fetches: AtomicU64::new(0),
            transcript_failures: AtomicU64::new(0),
            request_latency: Histogram::new(LATENCY_BUCKETS),
            generation_latency: Histogram::new(LATENCY_BUCKETS),
        }
    }

    /// Record a served HTTP request
    pub fn record_request(&self, response_time: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let ms = response_time.as_millis() as u64;
        self.total_response_time_ms.fetch_add(ms, Ordering::Relaxed);
        self.request_latency.observe(ms as f64);
    }

    /// Record an HTTP request that ended in an error response
    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generation_attempt(&self) {
        self.generation_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generation_failure(&self) {
        self.generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generation_exhausted(&self) {
        self.generation_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Time from the first attempt to a validated output
    pub fn record_generation_latency(&self, duration: Duration) {
        self.generation_latency.observe(duration.as_millis() as f64);
    }

    pub fn record_video_search(&self, found: bool) {
        if found {
            self.video_searches_found.fetch_add(1, Ordering::Relaxed);
        } else {
            self.video_searches_empty.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_transcript_attempt(&self) {
        self.transcript_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transcript_failure(&self) {
        self.transcript_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> SystemMetrics {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_response_time = self.total_response_time_ms.load(Ordering::Relaxed);

        let avg_response_time_ms = if total_requests > 0 {
            total_response_time as f64 / total_requests as f64
        } else {
            0.0
        };

        SystemMetrics {
            total_requests,
            total_errors: self.total_errors.load(Ordering::Relaxed),
            avg_response_time_ms,
            uptime_secs: self.start_time.elapsed().as_secs(),
            generation_attempts: self.generation_attempts.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
            generation_exhausted: self.generation_exhausted.load(Ordering::Relaxed),
            video_searches_found: self.video_searches_found.load(Ordering::Relaxed),
            video_searches_empty: self.video_searches_empty.load(Ordering::Relaxed),
            transcript_fetches: self.transcript_fetches.load(Ordering::Relaxed),
            transcript_failures: self.transcript_failures.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.get_metrics();

        let mut output = format!(
            "# HELP course_generator_requests_total Total number of requests\n\
             # TYPE course_generator_requests_total counter\n\
             course_generator_requests_total {}\n\
             \n\
             # HELP course_generator_errors_total Total number of error responses\n\
             # TYPE course_generator_errors_total counter\n\
             course_generator_errors_total {}\n\
             \n\
             # HELP course_generator_avg_response_time_ms Average response time in milliseconds\n\
             # TYPE course_generator_avg_response_time_ms gauge\n\
             course_generator_avg_response_time_ms {:.2}\n\
             \n\
             # HELP course_generator_uptime_seconds Uptime in seconds\n\
             # TYPE course_generator_uptime_seconds counter\n\
             course_generator_uptime_seconds {}\n\
             \n\
             # HELP course_generator_generation_attempts_total Backend calls made by structured generation\n\
             # TYPE course_generator_generation_attempts_total counter\n\
             course_generator_generation_attempts_total {}\n\
             \n\
             # HELP course_generator_generation_failures_total Rejected generation attempts\n\
             # TYPE course_generator_generation_failures_total counter\n\
             course_generator_generation_failures_total {}\n\
             \n\
             # HELP course_generator_generation_exhausted_total Generations that used every attempt\n\
             # TYPE course_generator_generation_exhausted_total counter\n\
             course_generator_generation_exhausted_total {}\n\
             \n\
             # HELP course_generator_video_searches_total Video searches by outcome\n\
             # TYPE course_generator_video_searches_total counter\n\
             course_generator_video_searches_total{{result=\"found\"}} {}\n\
             course_generator_video_searches_total{{result=\"empty\"}} {}\n\
             \n\
             # HELP course_generator_transcript_fetches_total Caption fetch attempts\n\
             # TYPE course_generator_transcript_fetches_total counter\n\
             course_generator_transcript_fetches_total {}\n\
             \n\
             # HELP course_generator_transcript_failures_total Transcripts given up after retries\n\
             # TYPE course_generator_transcript_failures_total counter\n\
             course_generator_transcript_failures_total {}\n\
             \n",
            metrics.total_requests,
            metrics.total_errors,
            metrics.avg_response_time_ms,
            metrics.uptime_secs,
            metrics.generation_attempts,
            metrics.generation_failures,
            metrics.generation_exhausted,
            metrics.video_searches_found,
            metrics.video_searches_empty,
            metrics.transcript_fetches,
            metrics.transcript_failures,
        );

        output.push_str(&self.request_latency.export_prometheus(
            "course_generator_request_duration_ms",
            "Request duration in milliseconds",
        ));
        output.push('\n');

        output.push_str(&self.generation_latency.export_prometheus(
            "course_generator_generation_duration_ms",
            "Structured generation duration in milliseconds",
        ));

        output
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
