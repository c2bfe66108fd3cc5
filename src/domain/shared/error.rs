//! Domain errors

use thiserror::Error;

/// Domain result type
pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug, Clone)]
pub enum SearchError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed document: missing field `{0}`")]
    MalformedDocument(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Search cancelled")]
    Cancelled,
}
