//! REST API

pub mod attribute_handler;
pub mod metrics_handler;
pub mod router;
pub mod search_dto;
pub mod search_handler;

pub use metrics_handler::init_metrics;
pub use router::build_router;
pub use search_handler::AppState;
