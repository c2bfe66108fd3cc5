//! Session search API DTOs

use crate::domain::session::CallSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Query parameters for a session search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Window start, milliseconds since epoch
    pub created_at: i64,
    /// Window end, milliseconds since epoch
    pub terminated_at: i64,
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// One correlated call on the wire
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSummaryResponse {
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<i64>,
    pub method: String,
    pub state: String,
    pub caller: String,
    pub callee: String,
    pub call_id: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl From<CallSummary> for CallSummaryResponse {
    fn from(summary: CallSummary) -> Self {
        CallSummaryResponse {
            created_at: summary.created_at,
            terminated_at: summary.terminated_at,
            method: summary.method,
            state: summary.state,
            caller: summary.caller,
            callee: summary.callee,
            call_id: summary.call_ids,
            duration: summary.duration,
            error_code: summary.error_code,
        }
    }
}

/// Search list response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub calls: Vec<CallSummaryResponse>,
    pub count: usize,
    pub limit: usize,
}

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}
