//! Player Registry - the player record store for valuation
//!
//! Holds the active, versioned player snapshot and the league directory.
//! Scoring code only reads from it.

pub mod registry;
pub mod types;

pub use registry::PlayerRegistry;
pub use types::{
    InjuryStatus, League, LeagueFile, PlayerId, PlayerRecord, PlayerSnapshot, PlayerStats,
    Position, RegistryError, SnapshotFile, Team,
};
