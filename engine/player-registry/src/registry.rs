use crate::types::{League, LeagueFile, PlayerSnapshot, RegistryError, SnapshotFile};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Player Registry - holds the active player snapshot and the league directory
///
/// Publishing a snapshot swaps the active `Arc` in one step. Readers that
/// already hold the previous `Arc` keep using it until they finish.
pub struct PlayerRegistry {
    /// Currently published snapshot, `None` until the first publish
    active: RwLock<Option<Arc<PlayerSnapshot>>>,

    /// Map from league key to league context
    leagues: RwLock<HashMap<String, League>>,
}

impl PlayerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { active: RwLock::new(None), leagues: RwLock::new(HashMap::new()) }
    }

    /// Publish a new snapshot. The version must strictly advance.
    pub fn publish(&self, snapshot: PlayerSnapshot) -> Result<Arc<PlayerSnapshot>, RegistryError> {
        let mut active = self.active.write();

        if let Some(current) = active.as_ref() {
            if snapshot.version <= current.version {
                warn!(
                    "Rejected snapshot version {} (current version {})",
                    snapshot.version, current.version
                );
                return Err(RegistryError::StaleSnapshot {
                    current: current.version,
                    offered: snapshot.version,
                });
            }
        }

        if snapshot.is_empty() {
            warn!("Publishing snapshot version {} with no players", snapshot.version);
        }

        let snapshot = Arc::new(snapshot);
        *active = Some(snapshot.clone());

        info!(
            "Published snapshot version {} ({} players, season {}, format {})",
            snapshot.version,
            snapshot.len(),
            snapshot.season,
            snapshot.scoring_format
        );
        Ok(snapshot)
    }

    /// Get the active snapshot, failing fast when none is published
    pub fn current(&self) -> Result<Arc<PlayerSnapshot>, RegistryError> {
        self.active.read().clone().ok_or(RegistryError::SnapshotUnavailable)
    }

    pub fn current_version(&self) -> Option<u64> {
        self.active.read().as_ref().map(|s| s.version)
    }

    /// Load a snapshot JSON file and publish it
    pub async fn load_snapshot_file<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<Arc<PlayerSnapshot>, RegistryError> {
        info!("Loading player snapshot from: {:?}", file_path.as_ref());

        let json_content = tokio::fs::read_to_string(&file_path).await?;
        let file: SnapshotFile = serde_json::from_str(&json_content)?;

        info!("Loaded {} players from file", file.players.len());

        self.publish(PlayerSnapshot::from_file(file)?)
    }

    /// Load a league directory JSON file, replacing leagues with the same key
    pub async fn load_leagues_file<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<usize, RegistryError> {
        info!("Loading leagues from: {:?}", file_path.as_ref());

        let json_content = tokio::fs::read_to_string(&file_path).await?;
        let file: LeagueFile = serde_json::from_str(&json_content)?;

        let count = file.leagues.len();
        for league in file.leagues {
            self.register_league(league);
        }

        info!("Registered {} leagues", count);
        Ok(count)
    }

    pub fn register_league(&self, league: League) {
        self.leagues.write().insert(league.league_key.clone(), league);
    }

    /// Get a league the caller owns a team in.
    ///
    /// An unknown key and a league without a team owned by `owner_id` are
    /// reported the same way, so callers cannot discover other leagues.
    pub fn league_for_owner(&self, league_key: &str, owner_id: &str) -> Result<League, RegistryError> {
        let leagues = self.leagues.read();
        leagues
            .get(league_key)
            .filter(|league| league.team_for_owner(owner_id).is_some())
            .cloned()
            .ok_or_else(|| RegistryError::LeagueNotFound(league_key.to_string()))
    }

    pub fn league_count(&self) -> usize {
        self.leagues.read().len()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayerRecord, Position, Team};
    use std::io::Write;

    fn snapshot(version: u64) -> PlayerSnapshot {
        let players = vec![
            PlayerRecord::new(1, "Lamar Jackson", Position::QB, "BAL"),
            PlayerRecord::new(2, "Josh Allen", Position::QB, "BUF"),
        ];
        PlayerSnapshot::new(version, "2025".into(), "Superflex".into(), players).unwrap()
    }

    fn league() -> League {
        League {
            league_key: "nfl.l.12345".into(),
            name: "My Awesome League".into(),
            season: 2025,
            teams: vec![Team {
                team_key: "nfl.l.12345.t.1".into(),
                name: "Gridiron Gurus".into(),
                owner_id: "user-1".into(),
                roster: vec![1],
            }],
        }
    }

    #[test]
    fn test_current_without_publish_fails_fast() {
        let registry = PlayerRegistry::new();
        assert_eq!(registry.current().unwrap_err(), RegistryError::SnapshotUnavailable);
        assert_eq!(registry.current_version(), None);
    }

    #[test]
    fn test_empty_snapshot_is_published() {
        let registry = PlayerRegistry::new();
        let empty = PlayerSnapshot::new(1, "2025".into(), "Superflex".into(), Vec::new()).unwrap();

        let published = registry.publish(empty).unwrap();
        assert!(published.is_empty());
        assert_eq!(registry.current_version(), Some(1));
    }

    #[test]
    fn test_publish_requires_monotonic_version() {
        let registry = PlayerRegistry::new();
        registry.publish(snapshot(2)).unwrap();

        let err = registry.publish(snapshot(2)).unwrap_err();
        assert_eq!(err, RegistryError::StaleSnapshot { current: 2, offered: 2 });

        registry.publish(snapshot(3)).unwrap();
        assert_eq!(registry.current_version(), Some(3));
    }

    #[test]
    fn test_in_flight_reader_keeps_old_snapshot() {
        let registry = PlayerRegistry::new();
        registry.publish(snapshot(1)).unwrap();

        let held = registry.current().unwrap();
        registry.publish(snapshot(2)).unwrap();

        assert_eq!(held.version, 1);
        assert_eq!(registry.current().unwrap().version, 2);
    }

    #[test]
    fn test_league_access() {
        let registry = PlayerRegistry::new();
        registry.register_league(league());

        assert!(registry.league_for_owner("nfl.l.12345", "user-1").is_ok());
        assert_eq!(
            registry.league_for_owner("nfl.l.12345", "user-2").unwrap_err(),
            RegistryError::LeagueNotFound("nfl.l.12345".into())
        );
        assert!(registry.league_for_owner("nfl.l.999", "user-1").is_err());
    }

    #[tokio::test]
    async fn test_load_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"version": 7, "season": "2025", "players": [
                {{"player_id": 1, "full_name": "Lamar Jackson", "position": "QB", "team": "BAL",
                  "stats": {{"projected_points": 351.9}}}}
            ]}}"#
        )
        .unwrap();

        let registry = PlayerRegistry::new();
        let snapshot = registry.load_snapshot_file(file.path()).await.unwrap();

        assert_eq!(snapshot.version, 7);
        assert_eq!(snapshot.scoring_format, "Superflex");
        assert_eq!(snapshot.get(1).unwrap().stats.projected_points, Some(351.9));
    }

    #[tokio::test]
    async fn test_load_leagues_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = serde_json::to_string(&LeagueFile { leagues: vec![league()] }).unwrap();
        file.write_all(body.as_bytes()).unwrap();

        let registry = PlayerRegistry::new();
        assert_eq!(registry.load_leagues_file(file.path()).await.unwrap(), 1);
        assert_eq!(registry.league_count(), 1);
    }
}
