//! Shared kernel - Common types used across the domain

pub mod error;
pub mod result;

pub use error::SearchError;
pub use result::Result;
