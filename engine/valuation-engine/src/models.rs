use crate::error::{Result, ScoringError};
use player_registry::{PlayerId, PlayerRecord, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named inputs to the value model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScore {
    Projection,
    Trend,
    Consensus,
    Market,
    InjuryRisk,
}

/// One sub-score's share of a player value.
///
/// `normalized` is `None` when the input was absent or unusable; the
/// contribution is then zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub normalized: Option<f64>,
    pub contribution: f64,
}

impl Component {
    pub fn missing() -> Self {
        Self { normalized: None, contribution: 0.0 }
    }

    pub fn is_missing(&self) -> bool {
        self.normalized.is_none()
    }
}

/// Value of one player against one snapshot version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerValue {
    pub player_id: PlayerId,
    pub snapshot_version: u64,

    /// Always >= 0
    pub value: f64,

    pub scarcity_multiplier: f64,
    pub components: BTreeMap<SubScore, Component>,
}

impl PlayerValue {
    /// Sub-scores whose inputs were missing
    pub fn missing_inputs(&self) -> Vec<SubScore> {
        self.components.iter().filter(|(_, c)| c.is_missing()).map(|(s, _)| *s).collect()
    }

    /// Values are only comparable within one snapshot version
    pub fn ensure_version(&self, expected: u64) -> Result<()> {
        if self.snapshot_version != expected {
            return Err(ScoringError::SnapshotMismatch {
                expected,
                found: self.snapshot_version,
            });
        }
        Ok(())
    }
}

/// Side of a trade proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    A,
    B,
}

impl TradeSide {
    pub fn other(&self) -> Self {
        match self {
            TradeSide::A => TradeSide::B,
            TradeSide::B => TradeSide::A,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::A => f.write_str("Team A"),
            TradeSide::B => f.write_str("Team B"),
        }
    }
}

/// Two bundles of player ids to compare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub side_a: Vec<PlayerId>,
    pub side_b: Vec<PlayerId>,
}

impl TradeProposal {
    pub fn new(side_a: Vec<PlayerId>, side_b: Vec<PlayerId>) -> Self {
        Self { side_a, side_b }
    }

    pub fn swapped(&self) -> Self {
        Self { side_a: self.side_b.clone(), side_b: self.side_a.clone() }
    }

    pub fn side(&self, side: TradeSide) -> &[PlayerId] {
        match side {
            TradeSide::A => &self.side_a,
            TradeSide::B => &self.side_b,
        }
    }
}

/// How lopsided a trade is, ignoring direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairnessBand {
    Fair,
    Slight,
    Heavy,
}

/// Trade fairness classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Fair,
    SlightlyFavors(TradeSide),
    HeavilyFavors(TradeSide),
}

impl Classification {
    pub fn band(&self) -> FairnessBand {
        match self {
            Classification::Fair => FairnessBand::Fair,
            Classification::SlightlyFavors(_) => FairnessBand::Slight,
            Classification::HeavilyFavors(_) => FairnessBand::Heavy,
        }
    }

    pub fn favored_side(&self) -> Option<TradeSide> {
        match self {
            Classification::Fair => None,
            Classification::SlightlyFavors(side) | Classification::HeavilyFavors(side) => Some(*side),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Fair => "fair_trade",
            Classification::SlightlyFavors(_) => "slightly_favors",
            Classification::HeavilyFavors(_) => "heavily_favors",
        }
    }

    /// Fixed conclusion text for the classification
    pub fn conclusion(&self) -> String {
        match self {
            Classification::Fair => "This trade appears to be a fair trade.".to_string(),
            Classification::SlightlyFavors(side) => format!("This trade slightly favors {side}."),
            Classification::HeavilyFavors(side) => format!("This trade heavily favors {side}."),
        }
    }
}

/// Per-player line of a trade side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBreakdown {
    pub player_id: PlayerId,
    pub full_name: String,
    pub position: Position,
    pub value: f64,
}

/// Result of comparing the two sides of a trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeVerdict {
    pub side_a_value: f64,
    pub side_b_value: f64,

    /// side_a_value - side_b_value
    pub delta: f64,

    /// max / min of the two side values; infinite when only one side is worth zero
    pub ratio: f64,

    pub classification: Classification,
    pub conclusion: String,
    pub snapshot_version: u64,
    pub scoring_format: String,
    pub side_a: Vec<PlayerBreakdown>,
    pub side_b: Vec<PlayerBreakdown>,
}

impl TradeVerdict {
    /// Ratio for JSON output, which has no infinity
    pub fn finite_ratio(&self) -> Option<f64> {
        self.ratio.is_finite().then_some(self.ratio)
    }
}

/// Optional waiver list filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaiverFilters {
    pub position: Option<Position>,

    /// Case-insensitive name substring
    pub search: Option<String>,
}

impl WaiverFilters {
    pub fn matches(&self, record: &PlayerRecord) -> bool {
        let position_ok = self.position.map_or(true, |pos| record.position == pos);
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => record.name_matches(query),
            _ => true,
        };
        position_ok && search_ok
    }
}

/// A ranked waiver wire player with a suggested FAAB bid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiverCandidate {
    pub player_id: PlayerId,
    pub full_name: String,
    pub position: Position,
    pub team: String,
    pub eligible_positions: Vec<Position>,
    pub percent_owned: Option<u8>,
    pub raw_value: f64,
    pub need_multiplier: f64,
    pub needs_adjusted_value: f64,

    /// Share of the FAAB budget to bid, 0-100
    pub recommended_bid_pct: f64,

    /// 1 = most recommended
    pub rank: u32,
}
