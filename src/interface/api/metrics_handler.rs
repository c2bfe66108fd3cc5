//! Prometheus metrics handler

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics exporter
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();

    let handle = builder
        .set_buckets_for_metric(
            Matcher::Full("session_search_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .unwrap()
        .install_recorder()
        .unwrap();

    // Describe metrics
    describe_counter!(
        "session_searches_total",
        "Total number of session searches served"
    );
    describe_counter!(
        "session_search_errors_total",
        "Total number of session searches that failed"
    );
    describe_counter!(
        "session_calls_total",
        "Total number of correlated calls returned"
    );
    describe_histogram!(
        "session_search_duration_seconds",
        "Session search duration in seconds"
    );

    handle
}

/// HTTP metrics handler
pub async fn metrics_handler(
    axum::extract::State(prometheus_handle): axum::extract::State<PrometheusHandle>,
) -> Response {
    let metrics = prometheus_handle.render();
    (StatusCode::OK, metrics).into_response()
}

/// Record a served search
pub fn record_search(duration: std::time::Duration, results: usize) {
    counter!("session_searches_total").increment(1);
    counter!("session_calls_total").increment(results as u64);
    histogram!("session_search_duration_seconds").record(duration.as_secs_f64());
}

/// Record a failed search
pub fn record_search_error(kind: &str) {
    counter!("session_search_errors_total", "kind" => kind.to_string()).increment(1);
}
