//! Attribute catalog API handlers

use super::search_dto::ApiResponse;
use super::search_handler::AppState;
use crate::domain::attribute::Attribute;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

/// List the known attribute descriptors
pub async fn list_attributes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Attribute>>>, StatusCode> {
    info!("API: listing attributes");

    match state.attribute_catalog.attributes().await {
        Ok(attributes) => Ok(Json(ApiResponse::success(attributes))),
        Err(e) => {
            error!("API: failed to list attributes: {}", e);
            Ok(Json(ApiResponse::error(e.to_string())))
        }
    }
}
