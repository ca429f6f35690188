//! ScoringGateway - REST API over the valuation engine
//!
//! Serves trade analysis and waiver wire recommendations as JSON, mapping
//! engine errors onto HTTP status codes.

pub mod config;
pub mod error;
pub mod logging;
pub mod rest_api;

pub use config::{load_config, GatewayConfig};
pub use error::{ApiError, ErrorResponse};
pub use logging::initialize_logging;
pub use rest_api::create_routes;
