use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Stable player identifier, shared across snapshot versions
pub type PlayerId = u32;

/// Fantasy roster position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DEF,
}

impl Position {
    pub const ALL: [Position; 6] =
        [Position::QB, Position::RB, Position::WR, Position::TE, Position::K, Position::DEF];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DEF => "DEF",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            "K" => Ok(Position::K),
            "DEF" | "DST" => Ok(Position::DEF),
            other => Err(RegistryError::InvalidPosition(other.to_string())),
        }
    }
}

/// Injury designation as reported by the stat feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjuryStatus {
    Healthy,
    Questionable,
    Doubtful,
    Out,
    InjuredReserve,
}

/// Stat and market inputs for a player.
///
/// Every field is optional: an absent value is a modeled gap in the feed,
/// not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Season projected fantasy points
    #[serde(default)]
    pub projected_points: Option<f64>,

    /// Fantasy points per game over the recent window
    #[serde(default)]
    pub recent_ppg: Option<f64>,

    /// Expert consensus overall rank (1 = best)
    #[serde(default)]
    pub consensus_rank: Option<u32>,

    /// Trade-chart market value
    #[serde(default)]
    pub market_value: Option<f64>,

    #[serde(default)]
    pub injury_status: Option<InjuryStatus>,
}

/// A fantasy football player as published in one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: PlayerId,

    /// Player name (e.g., "Josh Allen")
    pub full_name: String,

    pub position: Position,

    /// Team abbreviation (e.g., "BUF")
    pub team: String,

    #[serde(default)]
    pub eligible_positions: Vec<Position>,

    /// Share of leagues rostering the player, 0-100
    #[serde(default)]
    pub percent_owned: Option<u8>,

    #[serde(default)]
    pub stats: PlayerStats,
}

impl PlayerRecord {
    pub fn new(player_id: PlayerId, full_name: &str, position: Position, team: &str) -> Self {
        Self {
            player_id,
            full_name: full_name.to_string(),
            position,
            team: team.to_string(),
            eligible_positions: vec![position],
            percent_owned: None,
            stats: PlayerStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: PlayerStats) -> Self {
        self.stats = stats;
        self
    }

    /// Case-insensitive substring match on the player's name
    pub fn name_matches(&self, query: &str) -> bool {
        self.full_name.to_lowercase().contains(&query.trim().to_lowercase())
    }
}

/// On-disk format of a published snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub version: u64,
    pub season: String,
    #[serde(default = "default_scoring_format")]
    pub scoring_format: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub players: Vec<PlayerRecord>,
}

fn default_scoring_format() -> String {
    "Superflex".to_string()
}

/// An immutable, versioned set of player records.
///
/// Values computed against one snapshot are only comparable with values
/// computed against the same `version`.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub version: u64,
    pub season: String,
    pub scoring_format: String,
    pub published_at: DateTime<Utc>,
    players: HashMap<PlayerId, PlayerRecord>,
}

impl PlayerSnapshot {
    /// Build a snapshot, rejecting duplicate player ids
    pub fn new(
        version: u64,
        season: String,
        scoring_format: String,
        players: Vec<PlayerRecord>,
    ) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(players.len());
        for mut player in players {
            if player.eligible_positions.is_empty() {
                player.eligible_positions.push(player.position);
            }
            let player_id = player.player_id;
            if by_id.insert(player_id, player).is_some() {
                return Err(RegistryError::DuplicatePlayer(player_id));
            }
        }

        Ok(Self { version, season, scoring_format, published_at: Utc::now(), players: by_id })
    }

    pub fn from_file(file: SnapshotFile) -> Result<Self, RegistryError> {
        let published_at = file.published_at;
        let mut snapshot = Self::new(file.version, file.season, file.scoring_format, file.players)?;
        if let Some(ts) = published_at {
            snapshot.published_at = ts;
        }
        Ok(snapshot)
    }

    pub fn get(&self, player_id: PlayerId) -> Result<&PlayerRecord, RegistryError> {
        self.players.get(&player_id).ok_or(RegistryError::PlayerNotFound(player_id))
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    /// All players ordered by id
    pub fn catalog(&self) -> Vec<&PlayerRecord> {
        let mut players: Vec<&PlayerRecord> = self.players.values().collect();
        players.sort_by_key(|p| p.player_id);
        players
    }

    /// Search for players by partial name match, ordered by id
    pub fn search(&self, query: &str) -> Vec<&PlayerRecord> {
        let mut matches: Vec<&PlayerRecord> =
            self.players.values().filter(|p| p.name_matches(query)).collect();
        matches.sort_by_key(|p| p.player_id);
        matches
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// A fantasy team inside a league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_key: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub roster: Vec<PlayerId>,
}

/// League context supplied by the account-linking layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub league_key: String,
    pub name: String,
    pub season: i32,
    #[serde(default)]
    pub teams: Vec<Team>,
}

impl League {
    pub fn team_for_owner(&self, owner_id: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.owner_id == owner_id)
    }

    /// Every player id held by any team in the league
    pub fn rostered_ids(&self) -> std::collections::HashSet<PlayerId> {
        self.teams.iter().flat_map(|team| team.roster.iter().copied()).collect()
    }
}

/// On-disk format of the league directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueFile {
    pub leagues: Vec<League>,
}

/// Errors that can occur during registry lookups and snapshot publication
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Player not present in the snapshot
    PlayerNotFound(PlayerId),

    /// League unknown, or the caller owns no team in it
    LeagueNotFound(String),

    /// No snapshot has been published yet
    SnapshotUnavailable,

    /// Published version does not advance the current one
    StaleSnapshot { current: u64, offered: u64 },

    /// Same player id listed twice in one snapshot
    DuplicatePlayer(PlayerId),

    InvalidPosition(String),

    Io(String),

    Parse(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::PlayerNotFound(id) => write!(f, "Player {id} not found in snapshot"),
            RegistryError::LeagueNotFound(key) => write!(f, "League '{key}' not found"),
            RegistryError::SnapshotUnavailable => write!(f, "No player snapshot has been published"),
            RegistryError::StaleSnapshot { current, offered } => {
                write!(f, "Snapshot version {offered} does not advance current version {current}")
            }
            RegistryError::DuplicatePlayer(id) => {
                write!(f, "Player {id} appears more than once in snapshot")
            }
            RegistryError::InvalidPosition(pos) => write!(f, "Unknown position '{pos}'"),
            RegistryError::Io(msg) => write!(f, "I/O error: {msg}"),
            RegistryError::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Parse(err.to_string())
    }
}
