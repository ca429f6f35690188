use crate::calculator::ValueModel;
use crate::error::Result;
use crate::models::PlayerValue;
use async_trait::async_trait;
use dashmap::DashMap;
use player_registry::{PlayerId, PlayerSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Source of player values for the scoring consumers
#[async_trait]
pub trait PlayerValuer: Send + Sync {
    /// Value a player against the given snapshot
    async fn value_of(&self, player_id: PlayerId, snapshot: &PlayerSnapshot) -> Result<Arc<PlayerValue>>;
}

type CacheKey = (PlayerId, u64);

/// Memoized player values keyed by (player, snapshot version)
///
/// Each key owns a once-cell: the first caller computes, concurrent callers
/// for the same key wait for that result instead of recomputing.
pub struct ValuationCache {
    model: ValueModel,
    entries: DashMap<CacheKey, Arc<OnceCell<Arc<PlayerValue>>>>,

    /// Newest snapshot version seen by `invalidate_before`
    current_version: AtomicU64,

    hits: AtomicU64,
    computations: AtomicU64,
}

impl ValuationCache {
    pub fn new(model: ValueModel) -> Self {
        Self {
            model,
            entries: DashMap::new(),
            current_version: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            computations: AtomicU64::new(0),
        }
    }

    /// Get a cached value or compute it once for this (player, version)
    pub async fn get_or_compute(
        &self,
        player_id: PlayerId,
        snapshot: &PlayerSnapshot,
    ) -> Result<Arc<PlayerValue>> {
        let record = snapshot.get(player_id)?;
        let version = snapshot.version;

        // Superseded versions are still served, just not retained
        if version < self.current_version.load(Ordering::Acquire) {
            debug!("Valuing player {} against superseded version {} without caching", player_id, version);
            self.computations.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::new(self.model.value(record, version)));
        }

        let cell = self.cell_for((player_id, version));

        if let Some(value) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for player {} at version {}", player_id, version);
            return Ok(Arc::clone(value));
        }

        let model = &self.model;
        let computations = &self.computations;
        let value = cell
            .get_or_init(move || async move {
                computations.fetch_add(1, Ordering::Relaxed);
                Arc::new(model.value(record, version))
            })
            .await;

        Ok(Arc::clone(value))
    }

    /// Shared once-cell for a key.
    ///
    /// A publish can land between the caller's version check and the insert;
    /// the cell is then dropped from the map again so it is not retained.
    fn cell_for(&self, key: CacheKey) -> Arc<OnceCell<Arc<PlayerValue>>> {
        let cell = {
            let entry = self.entries.entry(key).or_insert_with(|| Arc::new(OnceCell::new()));
            Arc::clone(entry.value())
        };

        if key.1 < self.current_version.load(Ordering::Acquire) {
            self.entries.remove_if(&key, |_, existing| Arc::ptr_eq(existing, &cell));
        }

        cell
    }

    /// Drop every entry older than `version` and stop retaining older versions
    pub fn invalidate_before(&self, version: u64) {
        self.current_version.fetch_max(version, Ordering::AcqRel);

        let initial_size = self.entries.len();
        self.entries.retain(|(_, entry_version), _| *entry_version >= version);

        let removed = initial_size.saturating_sub(self.entries.len());
        if removed > 0 {
            info!("Invalidated {} cached values older than version {}", removed, version);
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            current_version: self.current_version.load(Ordering::Acquire),
        }
    }
}

#[async_trait]
impl PlayerValuer for ValuationCache {
    async fn value_of(&self, player_id: PlayerId, snapshot: &PlayerSnapshot) -> Result<Arc<PlayerValue>> {
        self.get_or_compute(player_id, snapshot).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub computations: u64,
    pub current_version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::error::ScoringError;
    use player_registry::{PlayerRecord, PlayerStats, Position};

    fn snapshot(version: u64, projected_points: f64) -> PlayerSnapshot {
        let stats = PlayerStats { projected_points: Some(projected_points), ..Default::default() };
        let players = vec![
            PlayerRecord::new(1, "CeeDee Lamb", Position::WR, "DAL").with_stats(stats.clone()),
            PlayerRecord::new(2, "Jahmyr Gibbs", Position::RB, "DET").with_stats(stats),
        ];
        PlayerSnapshot::new(version, "2025".into(), "Superflex".into(), players).unwrap()
    }

    fn cache() -> ValuationCache {
        ValuationCache::new(ValueModel::new(ModelConfig::default()))
    }

    #[tokio::test]
    async fn test_second_lookup_is_a_hit() {
        let cache = cache();
        let snapshot = snapshot(1, 250.0);

        let first = cache.get_or_compute(1, &snapshot).await.unwrap();
        let second = cache.get_or_compute(1, &snapshot).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_unknown_player_is_an_error() {
        let cache = cache();
        let err = cache.get_or_compute(99, &snapshot(1, 250.0)).await.unwrap_err();

        assert_eq!(err, ScoringError::UnknownPlayer(99));
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_computation() {
        let cache = Arc::new(cache());
        let snapshot = Arc::new(snapshot(1, 250.0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let cache = cache.clone();
            let snapshot = snapshot.clone();
            handles.push(tokio::spawn(async move { cache.get_or_compute(2, &snapshot).await }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(cache.stats().computations, 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }

    #[tokio::test]
    async fn test_versions_are_isolated() {
        let cache = cache();
        let old = snapshot(1, 100.0);
        let new = snapshot(2, 300.0);

        let old_value = cache.get_or_compute(1, &old).await.unwrap();
        let new_value = cache.get_or_compute(1, &new).await.unwrap();

        assert_eq!(old_value.snapshot_version, 1);
        assert_eq!(new_value.snapshot_version, 2);
        assert!(new_value.value > old_value.value);
    }

    #[tokio::test]
    async fn test_invalidate_before_drops_superseded_entries() {
        let cache = cache();
        let old = snapshot(1, 100.0);
        cache.get_or_compute(1, &old).await.unwrap();
        cache.get_or_compute(2, &old).await.unwrap();

        cache.invalidate_before(2);
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.stats().current_version, 2);

        // In-flight requests on the old version still get answers, uncached
        let value = cache.get_or_compute(1, &old).await.unwrap();
        assert_eq!(value.snapshot_version, 1);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_publish_between_check_and_insert_is_not_retained() {
        let cache = cache();
        let old = snapshot(1, 100.0);

        // The caller passed the version check, then version 2 was published
        cache.invalidate_before(2);
        let cell = cache.cell_for((1, old.version));

        assert_eq!(cache.stats().size, 0);
        assert!(cell.get().is_none());

        let value = cache.get_or_compute(1, &old).await.unwrap();
        assert_eq!(value.snapshot_version, 1);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_current_version_cell_is_kept() {
        let cache = cache();
        cache.invalidate_before(2);

        let cell = cache.cell_for((1, 2));
        let again = cache.cell_for((1, 2));

        assert!(Arc::ptr_eq(&cell, &again));
        assert_eq!(cache.stats().size, 1);
    }
}
