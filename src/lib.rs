//! SipScope - search and correlation for SIP session records
//!
//! Given a time window and a free-text query, SipScope locates SIP call legs
//! (and related RTP/RTCP report records) in a document store and stitches
//! related legs into logical calls, streamed back lazily as summaries.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::SearchError;
pub use domain::shared::result::Result;
