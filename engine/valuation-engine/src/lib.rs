//! Valuation Engine
//!
//! Turns player records into comparable values and scores trades and
//! waiver wire pickups with them. Values are memoized per snapshot version.

pub mod cache;
pub mod calculator;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod trade;
pub mod waiver;

pub use cache::{CacheStats, PlayerValuer, ValuationCache};
pub use calculator::ValueModel;
pub use config::ValuationConfig;
pub use engine::ScoringEngine;
pub use error::{Result, ScoringError, ValidationError};
pub use models::*;
pub use trade::TradeAnalyzer;
pub use waiver::WaiverRecommender;
