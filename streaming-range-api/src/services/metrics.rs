//! Prometheus metrics for streaming-range-api.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};

/// Counter for startup initialization runs by outcome.
pub static STARTUP_ATTEMPTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "streaming_range_startup_attempts_total",
        "Total number of startup initialization runs",
        &["outcome"]
    )
    .expect("Failed to register STARTUP_ATTEMPTS")
});

/// Counter for database liveness probes by result.
pub static DB_PROBES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "streaming_range_db_probe_total",
        "Total number of database liveness probes",
        &["result"]
    )
    .expect("Failed to register DB_PROBES")
});

/// Histogram for database query duration.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "streaming_range_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Counter for audio requests by outcome.
pub static AUDIO_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "streaming_range_audio_requests_total",
        "Total number of audio file requests",
        &["outcome"]
    )
    .expect("Failed to register AUDIO_REQUESTS")
});

pub static AUDIO_BYTES_SERVED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "streaming_range_audio_bytes_served_total",
        "Total audio bytes returned to clients"
    )
    .expect("Failed to register AUDIO_BYTES_SERVED")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&STARTUP_ATTEMPTS);
    Lazy::force(&DB_PROBES);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&AUDIO_REQUESTS);
    Lazy::force(&AUDIO_BYTES_SERVED);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_startup_attempt(outcome: &str) {
    STARTUP_ATTEMPTS.with_label_values(&[outcome]).inc();
}

pub fn record_db_probe(result: &str) {
    DB_PROBES.with_label_values(&[result]).inc();
}

pub fn record_audio_request(outcome: &str) {
    AUDIO_REQUESTS.with_label_values(&[outcome]).inc();
}

pub fn record_audio_bytes(bytes: u64) {
    AUDIO_BYTES_SERVED.inc_by(bytes as f64);
}
