use anyhow::{bail, Context};
use player_registry::{InjuryStatus, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Configuration for player valuation and the two scoring consumers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Value model parameters
    pub model: ModelConfig,

    /// Trade fairness thresholds
    pub trade: TradeConfig,

    /// Waiver ranking and bid curve
    pub waiver: WaiverConfig,
}

/// Sub-score weights, applied after each sub-score is normalized to 0-100
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubScoreWeights {
    pub projection: f64,
    pub trend: f64,
    pub consensus: f64,
    pub market: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub weights: SubScoreWeights,

    /// Weight of the injury discount, subtracted after scarcity scaling
    pub injury_weight: f64,

    /// Regular season length used to turn season projections into per-game values
    pub season_weeks: f64,

    /// Season projection that maps to a full projection score, per position
    pub projection_ceiling: HashMap<Position, f64>,

    /// Ceiling for positions not listed above
    pub default_projection_ceiling: f64,

    /// Consensus rank at which the consensus score reaches zero
    pub rank_horizon: u32,

    /// Market value that maps to a full market score
    pub market_value_ceiling: f64,

    /// Replacement-level scarcity multiplier per position
    pub scarcity_multiplier: HashMap<Position, f64>,

    /// Discount (0-100 scale) per injury designation
    pub injury_discount: HashMap<InjuryStatus, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    /// Highest fairness ratio still classified as a fair trade
    pub fair_ratio_max: f64,

    /// Highest fairness ratio classified as slightly favoring one side
    pub slight_ratio_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaiverConfig {
    /// League-standard starting lineup slots per position
    pub starting_slots: HashMap<Position, u32>,

    /// Need boost for each unfilled starting slot at a position
    pub need_boost_per_open_slot: f64,

    /// Upper bound of the positional need multiplier
    pub max_need_multiplier: f64,

    /// Bench depth beyond the starting slots after which a position counts as surplus
    pub surplus_depth: u32,

    /// Multiplier applied to surplus positions
    pub surplus_multiplier: f64,

    /// Bid percentage for the top candidate of a strong pool
    pub max_bid_pct: f64,

    /// Bid percentage floor
    pub min_bid_pct: f64,

    /// Share of the bid score driven by rank percentile (rest: value relative to pool max)
    pub percentile_weight: f64,

    /// Exponent shaping the bid curve; above 1 concentrates budget on the top candidates
    pub curve_exponent: f64,
}

impl Default for SubScoreWeights {
    fn default() -> Self {
        Self { projection: 0.45, trend: 0.15, consensus: 0.25, market: 0.15 }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        let mut projection_ceiling = HashMap::new();
        projection_ceiling.insert(Position::QB, 400.0);
        projection_ceiling.insert(Position::RB, 320.0);
        projection_ceiling.insert(Position::WR, 320.0);
        projection_ceiling.insert(Position::TE, 220.0);
        projection_ceiling.insert(Position::K, 160.0);
        projection_ceiling.insert(Position::DEF, 160.0);

        let mut scarcity_multiplier = HashMap::new();
        scarcity_multiplier.insert(Position::QB, 1.0);
        scarcity_multiplier.insert(Position::RB, 1.15);
        scarcity_multiplier.insert(Position::WR, 1.10);
        scarcity_multiplier.insert(Position::TE, 1.05);
        scarcity_multiplier.insert(Position::K, 0.6);
        scarcity_multiplier.insert(Position::DEF, 0.65);

        let mut injury_discount = HashMap::new();
        injury_discount.insert(InjuryStatus::Healthy, 0.0);
        injury_discount.insert(InjuryStatus::Questionable, 10.0);
        injury_discount.insert(InjuryStatus::Doubtful, 35.0);
        injury_discount.insert(InjuryStatus::Out, 60.0);
        injury_discount.insert(InjuryStatus::InjuredReserve, 100.0);

        Self {
            weights: SubScoreWeights::default(),
            injury_weight: 0.5,
            season_weeks: 17.0,
            projection_ceiling,
            default_projection_ceiling: 300.0,
            rank_horizon: 300,
            market_value_ceiling: 10_000.0,
            scarcity_multiplier,
            injury_discount,
        }
    }
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self { fair_ratio_max: 1.10, slight_ratio_max: 1.30 }
    }
}

impl Default for WaiverConfig {
    fn default() -> Self {
        let mut starting_slots = HashMap::new();
        starting_slots.insert(Position::QB, 1);
        starting_slots.insert(Position::RB, 2);
        starting_slots.insert(Position::WR, 2);
        starting_slots.insert(Position::TE, 1);
        starting_slots.insert(Position::K, 1);
        starting_slots.insert(Position::DEF, 1);

        Self {
            starting_slots,
            need_boost_per_open_slot: 0.25,
            max_need_multiplier: 1.5,
            surplus_depth: 2,
            surplus_multiplier: 0.9,
            max_bid_pct: 40.0,
            min_bid_pct: 1.0,
            percentile_weight: 0.5,
            curve_exponent: 1.5,
        }
    }
}

impl ModelConfig {
    pub fn projection_ceiling_for(&self, position: Position) -> f64 {
        self.projection_ceiling.get(&position).copied().unwrap_or(self.default_projection_ceiling)
    }

    /// Positions without a configured multiplier are neutral
    pub fn scarcity_for(&self, position: Position) -> f64 {
        self.scarcity_multiplier.get(&position).copied().unwrap_or(1.0)
    }

    pub fn injury_discount_for(&self, status: InjuryStatus) -> f64 {
        self.injury_discount.get(&status).copied().unwrap_or(0.0)
    }
}

impl WaiverConfig {
    pub fn slots_for(&self, position: Position) -> u32 {
        self.starting_slots.get(&position).copied().unwrap_or(0)
    }
}

impl ValuationConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        debug!("Loading valuation configuration from file: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read valuation config: {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse valuation config: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Override individual tuning values from environment variables
    pub fn apply_env(&mut self) {
        env_override("TRADE_FAIR_RATIO_MAX", &mut self.trade.fair_ratio_max);
        env_override("TRADE_SLIGHT_RATIO_MAX", &mut self.trade.slight_ratio_max);
        env_override("WAIVER_MAX_BID_PCT", &mut self.waiver.max_bid_pct);
        env_override("WAIVER_MIN_BID_PCT", &mut self.waiver.min_bid_pct);
        env_override("WAIVER_CURVE_EXPONENT", &mut self.waiver.curve_exponent);
        env_override("VALUATION_INJURY_WEIGHT", &mut self.model.injury_weight);
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let weights = &self.model.weights;
        for (name, weight) in [
            ("projection", weights.projection),
            ("trend", weights.trend),
            ("consensus", weights.consensus),
            ("market", weights.market),
            ("injury", self.model.injury_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                bail!("Invalid {} weight: {}", name, weight);
            }
        }

        if self.model.season_weeks <= 0.0 {
            bail!("Invalid season length: {}", self.model.season_weeks);
        }
        if self.model.rank_horizon < 2 {
            bail!("Invalid rank horizon: {}", self.model.rank_horizon);
        }
        if self.model.market_value_ceiling <= 0.0 || self.model.default_projection_ceiling <= 0.0 {
            bail!("Normalization ceilings must be positive");
        }
        if self.model.projection_ceiling.values().any(|c| *c <= 0.0) {
            bail!("Projection ceilings must be positive");
        }
        if self.model.scarcity_multiplier.values().any(|m| !m.is_finite() || *m < 0.0) {
            bail!("Scarcity multipliers must be non-negative");
        }

        let trade = &self.trade;
        if !(1.0 <= trade.fair_ratio_max && trade.fair_ratio_max <= trade.slight_ratio_max) {
            bail!(
                "Invalid fairness thresholds: fair {} / slight {}",
                trade.fair_ratio_max,
                trade.slight_ratio_max
            );
        }

        let waiver = &self.waiver;
        if !(0.0 <= waiver.min_bid_pct
            && waiver.min_bid_pct <= waiver.max_bid_pct
            && waiver.max_bid_pct <= 100.0)
        {
            bail!("Invalid bid range: {} - {}", waiver.min_bid_pct, waiver.max_bid_pct);
        }
        if !(0.0..=1.0).contains(&waiver.percentile_weight) {
            bail!("Invalid percentile weight: {}", waiver.percentile_weight);
        }
        if waiver.curve_exponent <= 0.0 {
            bail!("Invalid curve exponent: {}", waiver.curve_exponent);
        }
        if waiver.max_need_multiplier < 1.0 || waiver.need_boost_per_open_slot < 0.0 {
            bail!("Need multiplier settings must not shrink needed positions");
        }
        if waiver.surplus_multiplier <= 0.0 || waiver.surplus_multiplier > 1.0 {
            bail!("Invalid surplus multiplier: {}", waiver.surplus_multiplier);
        }

        Ok(())
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring invalid value for {}: {:?}", key, raw),
        }
    }
}
