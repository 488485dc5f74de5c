/// Metrics and telemetry for blogmesh
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Peer existence checks
/// - Notification dispatch outcomes
/// - Retention sweeps

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by service, method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["service", "method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["service", "method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Choreography Metrics ==========

    /// Peer existence checks by peer store and outcome
    pub static ref VALIDATION_CHECKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "validation_checks_total",
        "Existence checks against peer stores",
        &["store", "outcome"]
    )
    .unwrap();

    /// Notification dispatch attempts by origin and outcome
    pub static ref DISPATCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "notification_dispatch_total",
        "Notification dispatch attempts",
        &["origin", "outcome"]
    )
    .unwrap();

    // ========== Job Metrics ==========

    /// Notifications removed by retention sweeps
    pub static ref NOTIFICATIONS_PURGED_TOTAL: IntCounter = register_int_counter!(
        "notifications_purged_total",
        "Notifications removed by retention sweeps"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an HTTP request
pub fn record_http_request(service: &str, method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[service, method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[service, method, path])
        .observe(duration);
}

/// Record the outcome of a peer existence check
pub fn record_validation(store: &str, outcome: &str) {
    VALIDATION_CHECKS_TOTAL
        .with_label_values(&[store, outcome])
        .inc();
}

/// Record a notification dispatch attempt
pub fn record_dispatch(origin: &str, success: bool) {
    let outcome = if success { "delivered" } else { "failed" };
    DISPATCH_TOTAL.with_label_values(&[origin, outcome]).inc();
}

/// Record notifications removed by a retention sweep
pub fn record_notifications_purged(count: usize) {
    NOTIFICATIONS_PURGED_TOTAL.inc_by(count as u64);
}
