//! API Router configuration

use super::attribute_handler::list_attributes;
use super::metrics_handler::metrics_handler;
use super::search_handler::{health_check, search_sessions, AppState};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn build_router(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    // Health check route
    let health_routes = Router::new().route("/health", get(health_check));

    // Session search routes
    let session_routes = Router::new().route("/session/search", get(search_sessions));

    // Attribute catalog routes
    let attribute_routes = Router::new().route("/attributes", get(list_attributes));

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    // Combine routes with state
    Router::new()
        .merge(health_routes)
        .merge(session_routes)
        .merge(attribute_routes)
        .with_state(state)
        .merge(metrics_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
