//! Session search API handlers

use super::metrics_handler::{record_search, record_search_error};
use super::search_dto::{ApiResponse, SearchQuery, SearchResponse};
use crate::application::{SearchRequest, SessionSearchService};
use crate::domain::attribute::AttributeCatalog;
use crate::domain::shared::SearchError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub search_service: Arc<SessionSearchService>,
    pub attribute_catalog: Arc<dyn AttributeCatalog>,
}

/// Health check
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("healthy".to_string()))
}

/// Run a session search and materialize up to `limit` correlated calls
pub async fn search_sessions(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchResponse>>, StatusCode> {
    let search_id = Uuid::new_v4();
    info!(
        "API: session search {} over [{}, {}], query: {:?}",
        search_id, params.created_at, params.terminated_at, params.query
    );

    let started = Instant::now();
    let request = SearchRequest {
        created_at: params.created_at,
        terminated_at: params.terminated_at,
        query: params.query.clone(),
    };

    let mut stream = match state.search_service.search(request).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("API: session search {} rejected: {}", search_id, e);
            record_search_error(error_kind(&e));
            return Ok(Json(ApiResponse::error(e.to_string())));
        }
    };

    let mut calls = Vec::new();
    while calls.len() < params.limit {
        match stream.try_next().await {
            Ok(Some(summary)) => calls.push(summary.into()),
            Ok(None) => break,
            Err(e) => {
                error!("API: session search {} aborted: {}", search_id, e);
                record_search_error(error_kind(&e));
                return Ok(Json(ApiResponse::error(e.to_string())));
            }
        }
    }

    record_search(started.elapsed(), calls.len());
    info!(
        "API: session search {} returned {} calls in {:?}",
        search_id,
        calls.len(),
        started.elapsed()
    );

    let count = calls.len();
    Ok(Json(ApiResponse::success(SearchResponse {
        calls,
        count,
        limit: params.limit,
    })))
}

fn error_kind(error: &SearchError) -> &'static str {
    match error {
        SearchError::StoreUnavailable(_) => "store_unavailable",
        SearchError::MalformedDocument(_) => "malformed_document",
        SearchError::InvalidQuery(_) => "invalid_query",
        SearchError::Cancelled => "cancelled",
    }
}
