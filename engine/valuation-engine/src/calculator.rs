use crate::config::ModelConfig;
use crate::models::{Component, PlayerValue, SubScore};
use player_registry::PlayerRecord;
use std::collections::BTreeMap;
use tracing::debug;

/// Upper bound of every normalized sub-score
const SCORE_MAX: f64 = 100.0;

/// Turns a player record into a single comparable value.
///
/// Each input is normalized to 0-100 first so positions with very different
/// raw point totals stay comparable, then weighted, scaled by positional
/// scarcity and discounted for injury risk. Pure: the result depends only on
/// the record, the snapshot version and the configuration.
pub struct ValueModel {
    config: ModelConfig,
}

impl ValueModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Value a record against a snapshot version
    pub fn value(&self, record: &PlayerRecord, snapshot_version: u64) -> PlayerValue {
        let weights = &self.config.weights;
        let scored = [
            (SubScore::Projection, self.projection_score(record), weights.projection),
            (SubScore::Trend, self.trend_score(record), weights.trend),
            (SubScore::Consensus, self.consensus_score(record), weights.consensus),
            (SubScore::Market, self.market_score(record), weights.market),
        ];

        let mut components = BTreeMap::new();
        let mut weighted = 0.0;
        for (sub_score, normalized, weight) in scored {
            let contribution = normalized.map_or(0.0, |score| score * weight);
            weighted += contribution;
            components.insert(sub_score, Component { normalized, contribution });
        }

        let scarcity = self.config.scarcity_for(record.position);

        let injury = self.injury_score(record);
        let penalty = injury.map_or(0.0, |discount| discount * self.config.injury_weight);
        components.insert(SubScore::InjuryRisk, Component { normalized: injury, contribution: -penalty });

        let value = (weighted * scarcity - penalty).max(0.0);

        debug!(
            "Valued player {} ({}) at {:.2} (weighted: {:.2}, scarcity: {:.2}, injury penalty: {:.2}, version: {})",
            record.player_id, record.position, value, weighted, scarcity, penalty, snapshot_version
        );

        PlayerValue {
            player_id: record.player_id,
            snapshot_version,
            value,
            scarcity_multiplier: scarcity,
            components,
        }
    }

    /// Season projection relative to the position's ceiling
    fn projection_score(&self, record: &PlayerRecord) -> Option<f64> {
        let projected = finite(record.stats.projected_points)?;
        let ceiling = self.config.projection_ceiling_for(record.position);
        Some(clamp_score(projected / ceiling * SCORE_MAX))
    }

    /// Recent points per game against projected points per game; 50 = on pace
    fn trend_score(&self, record: &PlayerRecord) -> Option<f64> {
        let recent = finite(record.stats.recent_ppg)?;
        let projected_ppg = finite(record.stats.projected_points)? / self.config.season_weeks;
        if projected_ppg <= 0.0 {
            return None;
        }

        let pace = recent / projected_ppg;
        Some(clamp_score(SCORE_MAX / 2.0 * pace))
    }

    /// Linear decay from rank 1 (100) to the rank horizon (0)
    fn consensus_score(&self, record: &PlayerRecord) -> Option<f64> {
        let rank = record.stats.consensus_rank.filter(|r| *r >= 1)?;
        let horizon = self.config.rank_horizon.max(2) as f64;
        Some(clamp_score(SCORE_MAX * (1.0 - (rank as f64 - 1.0) / (horizon - 1.0))))
    }

    fn market_score(&self, record: &PlayerRecord) -> Option<f64> {
        let market_value = finite(record.stats.market_value)?;
        Some(clamp_score(market_value / self.config.market_value_ceiling * SCORE_MAX))
    }

    fn injury_score(&self, record: &PlayerRecord) -> Option<f64> {
        record.stats.injury_status.map(|status| clamp_score(self.config.injury_discount_for(status)))
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, SCORE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_registry::{InjuryStatus, PlayerStats, Position};

    fn model() -> ValueModel {
        ValueModel::new(ModelConfig::default())
    }

    fn full_stats() -> PlayerStats {
        PlayerStats {
            projected_points: Some(288.0),
            recent_ppg: Some(18.0),
            consensus_rank: Some(10),
            market_value: Some(7_500.0),
            injury_status: Some(InjuryStatus::Healthy),
        }
    }

    #[test]
    fn test_all_missing_stats_value_zero() {
        let record = PlayerRecord::new(1, "Unknown Rookie", Position::WR, "FA");
        let value = model().value(&record, 1);

        assert_eq!(value.value, 0.0);
        assert_eq!(value.missing_inputs().len(), 5);
    }

    #[test]
    fn test_value_is_deterministic() {
        let record = PlayerRecord::new(2, "Bijan Robinson", Position::RB, "ATL").with_stats(full_stats());
        let first = model().value(&record, 3);
        let second = model().value(&record, 3);

        assert_eq!(first, second);
        assert_eq!(first.value.to_bits(), second.value.to_bits());
    }

    #[test]
    fn test_partial_stats_flag_missing_inputs() {
        let stats = PlayerStats { projected_points: Some(160.0), ..Default::default() };
        let record = PlayerRecord::new(3, "Sam LaPorta", Position::TE, "DET").with_stats(stats);
        let value = model().value(&record, 1);

        assert!(value.value > 0.0);
        let missing = value.missing_inputs();
        assert!(missing.contains(&SubScore::Trend));
        assert!(missing.contains(&SubScore::Market));
        assert!(!missing.contains(&SubScore::Projection));
    }

    #[test]
    fn test_non_finite_input_treated_as_missing() {
        let stats = PlayerStats { projected_points: Some(f64::NAN), ..Default::default() };
        let record = PlayerRecord::new(4, "Broken Feed", Position::QB, "NYJ").with_stats(stats);
        let value = model().value(&record, 1);

        assert_eq!(value.value, 0.0);
        assert!(value.components[&SubScore::Projection].is_missing());
    }

    #[test]
    fn test_injury_discount_clamps_at_zero() {
        let stats = PlayerStats {
            projected_points: Some(20.0),
            injury_status: Some(InjuryStatus::InjuredReserve),
            ..Default::default()
        };
        let record = PlayerRecord::new(5, "Hurt Kicker", Position::K, "DAL").with_stats(stats);
        let value = model().value(&record, 1);

        assert_eq!(value.value, 0.0);
        assert!(value.components[&SubScore::InjuryRisk].contribution < 0.0);
    }

    #[test]
    fn test_positions_normalized_before_weighting() {
        let qb = PlayerRecord::new(6, "QB One", Position::QB, "KC").with_stats(PlayerStats {
            projected_points: Some(400.0),
            ..Default::default()
        });
        let k = PlayerRecord::new(7, "K One", Position::K, "KC").with_stats(PlayerStats {
            projected_points: Some(160.0),
            ..Default::default()
        });

        let qb_value = model().value(&qb, 1);
        let k_value = model().value(&k, 1);

        // Both sit at their position's ceiling; only scarcity separates them
        assert_eq!(
            qb_value.components[&SubScore::Projection].normalized,
            k_value.components[&SubScore::Projection].normalized
        );
        assert!(qb_value.value > k_value.value);
    }

    #[test]
    fn test_scarcity_multiplier_from_config() {
        let mut config = ModelConfig::default();
        config.scarcity_multiplier.insert(Position::RB, 2.0);
        let record = PlayerRecord::new(8, "Saquon Barkley", Position::RB, "PHI").with_stats(full_stats());

        let boosted = ValueModel::new(config).value(&record, 1);
        let baseline = model().value(&record, 1);

        assert!((boosted.value / baseline.value - 2.0 / 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_trend_above_pace() {
        let stats = PlayerStats {
            projected_points: Some(170.0),
            recent_ppg: Some(15.0),
            ..Default::default()
        };
        let record = PlayerRecord::new(9, "Breakout WR", Position::WR, "HOU").with_stats(stats);
        let value = model().value(&record, 1);

        // 15 ppg against a 10 ppg projection
        assert_eq!(value.components[&SubScore::Trend].normalized, Some(75.0));
    }
}
