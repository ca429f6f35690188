//! Trade fairness comparison

use crate::cache::PlayerValuer;
use crate::config::TradeConfig;
use crate::error::{Result, ValidationError};
use crate::models::{Classification, PlayerBreakdown, TradeProposal, TradeSide, TradeVerdict};
use player_registry::{PlayerId, PlayerSnapshot};
use std::collections::HashSet;
use tracing::debug;

/// Compares the summed values of two trade sides
pub struct TradeAnalyzer {
    config: TradeConfig,
}

impl TradeAnalyzer {
    pub fn new(config: TradeConfig) -> Self {
        Self { config }
    }

    /// Check the proposal shape before anything is valued
    pub fn validate(proposal: &TradeProposal) -> Result<()> {
        for side in [TradeSide::A, TradeSide::B] {
            if proposal.side(side).is_empty() {
                return Err(ValidationError::EmptySide(side).into());
            }
        }

        for side in [TradeSide::A, TradeSide::B] {
            let mut seen = HashSet::new();
            for player_id in proposal.side(side) {
                if !seen.insert(*player_id) {
                    return Err(ValidationError::DuplicatePlayer { side, player_id: *player_id }.into());
                }
            }
        }

        let side_a: HashSet<PlayerId> = proposal.side_a.iter().copied().collect();
        let mut overlap: Vec<PlayerId> =
            proposal.side_b.iter().copied().filter(|id| side_a.contains(id)).collect();
        if !overlap.is_empty() {
            overlap.sort_unstable();
            return Err(ValidationError::OverlappingPlayers(overlap).into());
        }

        Ok(())
    }

    /// Analyze a proposal against one snapshot
    pub async fn analyze<V>(
        &self,
        proposal: &TradeProposal,
        snapshot: &PlayerSnapshot,
        valuer: &V,
    ) -> Result<TradeVerdict>
    where
        V: PlayerValuer + ?Sized,
    {
        Self::validate(proposal)?;

        // Resolve every id up front so an unknown player fails before any valuation
        for player_id in proposal.side_a.iter().chain(proposal.side_b.iter()) {
            snapshot.get(*player_id)?;
        }

        let (side_a_value, side_a) = self.value_side(&proposal.side_a, snapshot, valuer).await?;
        let (side_b_value, side_b) = self.value_side(&proposal.side_b, snapshot, valuer).await?;

        let (ratio, classification) = self.classify(side_a_value, side_b_value);

        debug!(
            "Trade analyzed at version {}: A={:.2} B={:.2} ratio={:.3} -> {}",
            snapshot.version,
            side_a_value,
            side_b_value,
            ratio,
            classification.label()
        );

        Ok(TradeVerdict {
            side_a_value,
            side_b_value,
            delta: side_a_value - side_b_value,
            ratio,
            classification,
            conclusion: classification.conclusion(),
            snapshot_version: snapshot.version,
            scoring_format: snapshot.scoring_format.clone(),
            side_a,
            side_b,
        })
    }

    /// Fairness ratio and classification for two side totals.
    ///
    /// Equal totals are always fair. A zero total against a positive one
    /// gives an infinite ratio.
    pub fn classify(&self, side_a_value: f64, side_b_value: f64) -> (f64, Classification) {
        if side_a_value == side_b_value {
            return (1.0, Classification::Fair);
        }

        let (high, low, favored) = if side_a_value > side_b_value {
            (side_a_value, side_b_value, TradeSide::A)
        } else {
            (side_b_value, side_a_value, TradeSide::B)
        };

        let ratio = if low <= 0.0 { f64::INFINITY } else { high / low };

        let classification = if ratio <= self.config.fair_ratio_max {
            Classification::Fair
        } else if ratio <= self.config.slight_ratio_max {
            Classification::SlightlyFavors(favored)
        } else {
            Classification::HeavilyFavors(favored)
        };

        (ratio, classification)
    }

    async fn value_side<V>(
        &self,
        player_ids: &[PlayerId],
        snapshot: &PlayerSnapshot,
        valuer: &V,
    ) -> Result<(f64, Vec<PlayerBreakdown>)>
    where
        V: PlayerValuer + ?Sized,
    {
        let mut total = 0.0;
        let mut breakdown = Vec::with_capacity(player_ids.len());

        for player_id in player_ids {
            let record = snapshot.get(*player_id)?;
            let value = valuer.value_of(*player_id, snapshot).await?;
            value.ensure_version(snapshot.version)?;

            total += value.value;
            breakdown.push(PlayerBreakdown {
                player_id: *player_id,
                full_name: record.full_name.clone(),
                position: record.position,
                value: value.value,
            });
        }

        Ok((total, breakdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;
    use crate::models::{FairnessBand, PlayerValue};
    use async_trait::async_trait;
    use player_registry::{PlayerRecord, Position};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Valuer returning fixed values, counting calls
    struct FixedValues {
        values: HashMap<PlayerId, f64>,
        version_override: Option<u64>,
        calls: AtomicUsize,
    }

    impl FixedValues {
        fn new(values: &[(PlayerId, f64)]) -> Self {
            Self { values: values.iter().copied().collect(), version_override: None, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PlayerValuer for FixedValues {
        async fn value_of(&self, player_id: PlayerId, snapshot: &PlayerSnapshot) -> Result<Arc<PlayerValue>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let value = *self.values.get(&player_id).ok_or(ScoringError::UnknownPlayer(player_id))?;
            Ok(Arc::new(PlayerValue {
                player_id,
                snapshot_version: self.version_override.unwrap_or(snapshot.version),
                value,
                scarcity_multiplier: 1.0,
                components: BTreeMap::new(),
            }))
        }
    }

    fn snapshot() -> PlayerSnapshot {
        let players = (1..=5)
            .map(|id| PlayerRecord::new(id, &format!("Player {id}"), Position::WR, "FA"))
            .collect();
        PlayerSnapshot::new(1, "2025".into(), "Superflex".into(), players).unwrap()
    }

    fn analyzer() -> TradeAnalyzer {
        TradeAnalyzer::new(TradeConfig::default())
    }

    #[tokio::test]
    async fn test_equal_values_are_fair() {
        let valuer = FixedValues::new(&[(1, 40.0), (2, 40.0)]);
        let verdict = analyzer()
            .analyze(&TradeProposal::new(vec![1], vec![2]), &snapshot(), &valuer)
            .await
            .unwrap();

        assert_eq!(verdict.side_a_value, 40.0);
        assert_eq!(verdict.side_b_value, 40.0);
        assert_eq!(verdict.ratio, 1.0);
        assert_eq!(verdict.classification, Classification::Fair);
        assert!(verdict.conclusion.contains("fair"));
    }

    #[tokio::test]
    async fn test_lopsided_trade_names_heavier_side() {
        let valuer = FixedValues::new(&[(1, 10.0), (2, 40.0)]);
        let verdict = analyzer()
            .analyze(&TradeProposal::new(vec![1], vec![2]), &snapshot(), &valuer)
            .await
            .unwrap();

        assert_eq!(verdict.ratio, 4.0);
        assert_eq!(verdict.delta, -30.0);
        assert_eq!(verdict.classification, Classification::HeavilyFavors(TradeSide::B));
        assert!(verdict.conclusion.contains("Team B"));
    }

    #[tokio::test]
    async fn test_two_for_one_sums_values() {
        let valuer = FixedValues::new(&[(1, 20.0), (2, 25.0), (3, 44.0)]);
        let verdict = analyzer()
            .analyze(&TradeProposal::new(vec![1, 2], vec![3]), &snapshot(), &valuer)
            .await
            .unwrap();

        assert_eq!(verdict.side_a_value, 45.0);
        assert_eq!(verdict.side_a.len(), 2);
        assert_eq!(verdict.classification, Classification::Fair);
    }

    #[tokio::test]
    async fn test_empty_side_rejected_before_valuation() {
        let valuer = FixedValues::new(&[(1, 10.0)]);
        let err = analyzer()
            .analyze(&TradeProposal::new(vec![1], vec![]), &snapshot(), &valuer)
            .await
            .unwrap_err();

        assert_eq!(err, ScoringError::Validation(ValidationError::EmptySide(TradeSide::B)));
        assert_eq!(valuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlap_rejected_before_valuation() {
        let valuer = FixedValues::new(&[(1, 10.0), (2, 10.0), (3, 10.0)]);
        let err = analyzer()
            .analyze(&TradeProposal::new(vec![1, 3], vec![3, 2, 1]), &snapshot(), &valuer)
            .await
            .unwrap_err();

        assert_eq!(err, ScoringError::Validation(ValidationError::OverlappingPlayers(vec![1, 3])));
        assert_eq!(valuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_within_side_rejected() {
        let err = TradeAnalyzer::validate(&TradeProposal::new(vec![1, 1], vec![2])).unwrap_err();
        assert_eq!(
            err,
            ScoringError::Validation(ValidationError::DuplicatePlayer { side: TradeSide::A, player_id: 1 })
        );
    }

    #[tokio::test]
    async fn test_unknown_player_rejected_before_valuation() {
        let valuer = FixedValues::new(&[(1, 10.0)]);
        let err = analyzer()
            .analyze(&TradeProposal::new(vec![1], vec![42]), &snapshot(), &valuer)
            .await
            .unwrap_err();

        assert_eq!(err, ScoringError::UnknownPlayer(42));
        assert_eq!(valuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cross_snapshot_value_is_an_error() {
        let mut valuer = FixedValues::new(&[(1, 10.0), (2, 10.0)]);
        valuer.version_override = Some(7);
        let err = analyzer()
            .analyze(&TradeProposal::new(vec![1], vec![2]), &snapshot(), &valuer)
            .await
            .unwrap_err();

        assert_eq!(err, ScoringError::SnapshotMismatch { expected: 1, found: 7 });
    }

    #[tokio::test]
    async fn test_swapping_sides_flips_direction_only() {
        let valuer = FixedValues::new(&[(1, 30.0), (2, 12.0), (3, 14.0), (4, 9.5)]);
        let proposal = TradeProposal::new(vec![1], vec![2, 3]);

        let forward = analyzer().analyze(&proposal, &snapshot(), &valuer).await.unwrap();
        let reverse = analyzer().analyze(&proposal.swapped(), &snapshot(), &valuer).await.unwrap();

        assert_eq!(forward.side_a_value, reverse.side_b_value);
        assert_eq!(forward.side_b_value, reverse.side_a_value);
        assert_eq!(forward.ratio, reverse.ratio);
        assert_eq!(forward.classification.band(), reverse.classification.band());
        assert_eq!(
            forward.classification.favored_side().map(|s| s.other()),
            reverse.classification.favored_side()
        );
    }

    #[test]
    fn test_threshold_edges() {
        let analyzer = analyzer();

        assert_eq!(analyzer.classify(11.0, 10.0).1.band(), FairnessBand::Fair);
        assert_eq!(analyzer.classify(12.0, 10.0).1, Classification::SlightlyFavors(TradeSide::A));
        assert_eq!(analyzer.classify(13.0, 10.0).1, Classification::SlightlyFavors(TradeSide::A));
        assert_eq!(analyzer.classify(10.0, 14.0).1, Classification::HeavilyFavors(TradeSide::B));
    }

    #[test]
    fn test_zero_side_never_divides() {
        let analyzer = analyzer();

        let (ratio, classification) = analyzer.classify(0.0, 5.0);
        assert!(ratio.is_infinite());
        assert_eq!(classification, Classification::HeavilyFavors(TradeSide::B));

        let (ratio, classification) = analyzer.classify(0.0, 0.0);
        assert_eq!(ratio, 1.0);
        assert_eq!(classification, Classification::Fair);
    }
}
