use crate::cache::{CacheStats, ValuationCache};
use crate::calculator::ValueModel;
use crate::config::ValuationConfig;
use crate::error::Result;
use crate::models::{PlayerValue, TradeProposal, TradeVerdict, WaiverCandidate, WaiverFilters};
use crate::trade::TradeAnalyzer;
use crate::waiver::WaiverRecommender;
use player_registry::{PlayerId, PlayerRecord, PlayerRegistry, PlayerSnapshot};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for request handlers.
///
/// Every request reads the active snapshot once and uses that same `Arc`
/// throughout, so a publish in the middle of a request is never observed.
pub struct ScoringEngine {
    registry: Arc<PlayerRegistry>,
    cache: Arc<ValuationCache>,
    trade_analyzer: TradeAnalyzer,
    waiver_recommender: WaiverRecommender,
}

impl ScoringEngine {
    pub fn new(config: ValuationConfig, registry: Arc<PlayerRegistry>) -> Self {
        info!("Creating scoring engine");

        let cache = Arc::new(ValuationCache::new(ValueModel::new(config.model)));
        if let Some(version) = registry.current_version() {
            cache.invalidate_before(version);
        }

        Self {
            registry,
            cache,
            trade_analyzer: TradeAnalyzer::new(config.trade),
            waiver_recommender: WaiverRecommender::new(config.waiver),
        }
    }

    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    /// Publish a snapshot and drop cached values of older versions
    pub fn publish_snapshot(&self, snapshot: PlayerSnapshot) -> Result<Arc<PlayerSnapshot>> {
        let published = self.registry.publish(snapshot)?;
        self.cache.invalidate_before(published.version);
        Ok(published)
    }

    /// Load a snapshot file and publish it
    pub async fn load_snapshot_file<P: AsRef<Path>>(&self, path: P) -> Result<Arc<PlayerSnapshot>> {
        let published = self.registry.load_snapshot_file(path).await?;
        self.cache.invalidate_before(published.version);
        Ok(published)
    }

    pub fn current_snapshot(&self) -> Result<Arc<PlayerSnapshot>> {
        Ok(self.registry.current()?)
    }

    pub async fn analyze_trade(&self, proposal: &TradeProposal) -> Result<TradeVerdict> {
        let snapshot = self.current_snapshot()?;
        self.trade_analyzer.analyze(proposal, &snapshot, self.cache.as_ref()).await
    }

    /// Ranked waiver wire for the caller's team in a league
    pub async fn recommend_waivers(
        &self,
        league_key: &str,
        owner_id: &str,
        filters: &WaiverFilters,
    ) -> Result<Vec<WaiverCandidate>> {
        let league = self.registry.league_for_owner(league_key, owner_id)?;
        let snapshot = self.current_snapshot()?;

        let roster_ids: &[PlayerId] =
            league.team_for_owner(owner_id).map(|team| team.roster.as_slice()).unwrap_or_default();

        let mut roster = Vec::with_capacity(roster_ids.len());
        for player_id in roster_ids {
            match snapshot.get(*player_id) {
                Ok(record) => roster.push(record.clone()),
                Err(_) => warn!(
                    "Rostered player {} in league {} missing from snapshot {}",
                    player_id, league_key, snapshot.version
                ),
            }
        }

        let rostered = league.rostered_ids();
        let mut pool: Vec<PlayerRecord> =
            snapshot.players().filter(|p| !rostered.contains(&p.player_id)).cloned().collect();
        pool.sort_by_key(|p| p.player_id);

        self.waiver_recommender
            .recommend(&pool, &snapshot, &roster, &rostered, filters, self.cache.as_ref())
            .await
    }

    /// Value with its component breakdown, paired with the record it was computed from
    pub async fn player_value(&self, player_id: PlayerId) -> Result<(PlayerRecord, Arc<PlayerValue>)> {
        let snapshot = self.current_snapshot()?;
        let value = self.cache.get_or_compute(player_id, &snapshot).await?;
        Ok((snapshot.get(player_id)?.clone(), value))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
