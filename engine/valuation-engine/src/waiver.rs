//! Waiver wire ranking and FAAB bid recommendation

use crate::cache::PlayerValuer;
use crate::config::WaiverConfig;
use crate::error::Result;
use crate::models::{WaiverCandidate, WaiverFilters};
use player_registry::{PlayerId, PlayerRecord, PlayerSnapshot, Position};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ranks available players for one team and suggests bid percentages
pub struct WaiverRecommender {
    config: WaiverConfig,
}

/// Candidate before ranks and bids are assigned
struct Scored<'a> {
    record: &'a PlayerRecord,
    raw_value: f64,
    need_multiplier: f64,
    adjusted: f64,
}

impl WaiverRecommender {
    pub fn new(config: WaiverConfig) -> Self {
        Self { config }
    }

    /// Produce the ranked waiver list.
    ///
    /// Bids are computed over the whole eligible pool so that narrowing the
    /// list with filters never changes a player's bid; ranks are assigned
    /// after filtering and are always `1..=N`.
    pub async fn recommend<V>(
        &self,
        pool: &[PlayerRecord],
        snapshot: &PlayerSnapshot,
        requesting_roster: &[PlayerRecord],
        league_rostered: &HashSet<PlayerId>,
        filters: &WaiverFilters,
        valuer: &V,
    ) -> Result<Vec<WaiverCandidate>>
    where
        V: PlayerValuer + ?Sized,
    {
        let own_roster: HashSet<PlayerId> = requesting_roster.iter().map(|p| p.player_id).collect();
        let position_counts = count_positions(requesting_roster);

        let mut seen = HashSet::new();
        let mut scored = Vec::new();
        for record in pool {
            if own_roster.contains(&record.player_id)
                || league_rostered.contains(&record.player_id)
                || !seen.insert(record.player_id)
            {
                continue;
            }

            let value = valuer.value_of(record.player_id, snapshot).await?;
            value.ensure_version(snapshot.version)?;

            let held = position_counts.get(&record.position).copied().unwrap_or(0);
            let need_multiplier = self.need_multiplier(record.position, held);
            scored.push(Scored {
                record,
                raw_value: value.value,
                need_multiplier,
                adjusted: value.value * need_multiplier,
            });
        }

        scored.sort_by(compare_candidates);

        let pool_size = scored.len();
        let max_adjusted = scored.first().map_or(0.0, |s| s.adjusted);

        let mut candidates = Vec::new();
        let mut higher_count = 0;
        for (index, entry) in scored.iter().enumerate() {
            // Ties share the count of strictly higher candidates, and so share a bid
            if index > 0 && entry.adjusted != scored[index - 1].adjusted {
                higher_count = index;
            }

            if !filters.matches(entry.record) {
                continue;
            }

            let bid = self.bid_pct(higher_count, pool_size, entry.adjusted, max_adjusted);
            candidates.push(WaiverCandidate {
                player_id: entry.record.player_id,
                full_name: entry.record.full_name.clone(),
                position: entry.record.position,
                team: entry.record.team.clone(),
                eligible_positions: entry.record.eligible_positions.clone(),
                percent_owned: entry.record.percent_owned,
                raw_value: entry.raw_value,
                need_multiplier: entry.need_multiplier,
                needs_adjusted_value: entry.adjusted,
                recommended_bid_pct: bid,
                rank: candidates.len() as u32 + 1,
            });
        }

        debug!(
            "Waiver recommendation at version {}: {} eligible, {} after filters",
            snapshot.version,
            pool_size,
            candidates.len()
        );

        Ok(candidates)
    }

    /// Positional need multiplier for a roster holding `held` players at `position`
    pub fn need_multiplier(&self, position: Position, held: u32) -> f64 {
        let slots = self.config.slots_for(position);

        if held < slots {
            let open = (slots - held) as f64;
            return (1.0 + self.config.need_boost_per_open_slot * open).min(self.config.max_need_multiplier);
        }

        if held >= slots + self.config.surplus_depth {
            return self.config.surplus_multiplier;
        }

        1.0
    }

    /// Map rank percentile and relative value onto the configured bid range
    pub fn bid_pct(&self, higher_count: usize, pool_size: usize, adjusted: f64, max_adjusted: f64) -> f64 {
        let percentile = if pool_size <= 1 {
            1.0
        } else {
            1.0 - higher_count as f64 / (pool_size - 1) as f64
        };

        let value_ratio = if max_adjusted > 0.0 { (adjusted / max_adjusted).clamp(0.0, 1.0) } else { 0.0 };

        let weight = self.config.percentile_weight;
        let score = weight * percentile + (1.0 - weight) * value_ratio;

        let floor = self.config.min_bid_pct;
        let ceiling = self.config.max_bid_pct;
        let bid = floor + (ceiling - floor) * score.powf(self.config.curve_exponent);

        ((bid * 10.0).round() / 10.0).clamp(0.0, 100.0)
    }
}

fn count_positions(roster: &[PlayerRecord]) -> HashMap<Position, u32> {
    let mut counts = HashMap::new();
    for player in roster {
        *counts.entry(player.position).or_insert(0) += 1;
    }
    counts
}

/// Needs-adjusted value desc, raw value desc, player id asc
fn compare_candidates(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    b.adjusted
        .total_cmp(&a.adjusted)
        .then_with(|| b.raw_value.total_cmp(&a.raw_value))
        .then_with(|| a.record.player_id.cmp(&b.record.player_id))
}
