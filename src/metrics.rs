use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Metric name prefix for all server metrics
const PREFIX: &str = "aesthetics";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Analysis pipeline
    pub static ref ANALYSIS_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_analysis_requests_total"), "Analysis runs by outcome"),
        &["outcome"]
    ).expect("Failed to create analysis_requests_total metric");

    pub static ref RECOVERY_STAGE_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_analysis_recovery_stage_total"),
            "Model replies recovered, by the stage that produced the value"
        ),
        &["stage"]
    ).expect("Failed to create analysis_recovery_stage_total metric");

    pub static ref ENRICHMENT_LOOKUPS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_enrichment_lookups_total"), "Recommendation lookups by result"),
        &["result"]
    ).expect("Failed to create enrichment_lookups_total metric");

    pub static ref COLLECTOR_ITEM_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_collector_item_failures_total"),
            "Sub-fetches degraded to a failure marker"
        ),
        &["kind"]
    ).expect("Failed to create collector_item_failures_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ANALYSIS_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(RECOVERY_STAGE_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ENRICHMENT_LOOKUPS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(COLLECTOR_ITEM_FAILURES_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_analysis_outcome(outcome: &str) {
    ANALYSIS_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_recovery_stage(stage: &str) {
    RECOVERY_STAGE_TOTAL.with_label_values(&[stage]).inc();
}

pub fn record_enrichment_lookup(result: &str) {
    ENRICHMENT_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_collector_failure(kind: &str) {
    COLLECTOR_ITEM_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}
