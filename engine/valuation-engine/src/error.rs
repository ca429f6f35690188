//! Error types for the valuation engine

use crate::models::TradeSide;
use player_registry::{PlayerId, RegistryError};
use thiserror::Error;

/// Result type for valuation engine operations
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Errors that can occur while valuing players or scoring requests
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown league: {0}")]
    UnknownLeague(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Snapshot mismatch: expected version {expected}, found {found}")]
    SnapshotMismatch { expected: u64, found: u64 },

    #[error("Snapshot publish rejected: {0}")]
    Publish(String),
}

/// Malformed input, reported to the caller as-is
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} has no players")]
    EmptySide(TradeSide),

    #[error("Player {player_id} is listed more than once for {side}")]
    DuplicatePlayer { side: TradeSide, player_id: PlayerId },

    #[error("Players appear on both sides of the trade: {0:?}")]
    OverlappingPlayers(Vec<PlayerId>),

    #[error("Unknown position filter: {0}")]
    InvalidPosition(String),
}

impl From<RegistryError> for ScoringError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::PlayerNotFound(id) => ScoringError::UnknownPlayer(id),
            RegistryError::LeagueNotFound(key) => ScoringError::UnknownLeague(key),
            RegistryError::InvalidPosition(pos) => ScoringError::Validation(ValidationError::InvalidPosition(pos)),
            RegistryError::StaleSnapshot { .. } | RegistryError::DuplicatePlayer(_) => {
                ScoringError::Publish(err.to_string())
            }
            RegistryError::SnapshotUnavailable | RegistryError::Io(_) | RegistryError::Parse(_) => {
                ScoringError::UpstreamUnavailable(err.to_string())
            }
        }
    }
}
