//! REST API endpoints for the ScoringGateway
//!
//! Trade analysis, waiver wire recommendations, the player catalog and
//! per-player value breakdowns.

use crate::error::{handle_rejection, ApiError};
use player_registry::{PlayerId, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use valuation_engine::{
    Component, PlayerBreakdown, ScoringEngine, ScoringError, SubScore, TradeProposal, TradeSide,
    TradeVerdict, WaiverCandidate, WaiverFilters,
};
use warp::Filter;

/// Trade requests are two short id lists
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Trade analysis request
#[derive(Debug, Serialize, Deserialize)]
pub struct TradeAnalysisRequest {
    pub team_a_players: Vec<PlayerId>,
    pub team_b_players: Vec<PlayerId>,
}

/// Trade analysis response
#[derive(Debug, Serialize, Deserialize)]
pub struct TradeAnalysisResponse {
    pub team_a_value: f64,
    pub team_b_value: f64,
    pub conclusion: String,

    /// team_a_value - team_b_value
    pub value_difference: f64,

    /// `None` when one side is worth nothing
    pub ratio: Option<f64>,

    pub classification: String,
    pub favored_side: Option<String>,
    pub scoring_format: String,
    pub snapshot_version: u64,
    pub team_a_breakdown: Vec<PlayerBreakdown>,
    pub team_b_breakdown: Vec<PlayerBreakdown>,
}

impl From<TradeVerdict> for TradeAnalysisResponse {
    fn from(verdict: TradeVerdict) -> Self {
        let ratio = verdict.finite_ratio();
        Self {
            team_a_value: verdict.side_a_value,
            team_b_value: verdict.side_b_value,
            conclusion: verdict.conclusion,
            value_difference: verdict.delta,
            ratio,
            classification: verdict.classification.label().to_string(),
            favored_side: verdict.classification.favored_side().map(|side| {
                match side {
                    TradeSide::A => "team_a",
                    TradeSide::B => "team_b",
                }
                .to_string()
            }),
            scoring_format: verdict.scoring_format,
            snapshot_version: verdict.snapshot_version,
            team_a_breakdown: verdict.side_a,
            team_b_breakdown: verdict.side_b,
        }
    }
}

/// Waiver wire query parameters
#[derive(Debug, Default, Deserialize)]
pub struct WaiverWireParams {
    pub position: Option<String>,
    pub search: Option<String>,
}

impl WaiverWireParams {
    fn into_filters(self) -> Result<WaiverFilters, ScoringError> {
        let position = match self.position.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(raw.parse::<Position>()?),
            _ => None,
        };
        Ok(WaiverFilters { position, search: self.search })
    }
}

/// Waiver wire player
#[derive(Debug, Serialize, Deserialize)]
pub struct WaiverPlayerResponse {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub eligible_positions: Vec<Position>,
    pub percent_owned: Option<u8>,
    pub recommended_bid_pct: f64,
    pub rank: u32,
}

impl From<WaiverCandidate> for WaiverPlayerResponse {
    fn from(candidate: WaiverCandidate) -> Self {
        Self {
            id: candidate.player_id,
            name: candidate.full_name,
            position: candidate.position,
            team: candidate.team,
            eligible_positions: candidate.eligible_positions,
            percent_owned: candidate.percent_owned,
            recommended_bid_pct: candidate.recommended_bid_pct,
            rank: candidate.rank,
        }
    }
}

/// Player catalog query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PlayerSearchParams {
    pub search: Option<String>,
}

/// Player catalog entry
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerSummaryResponse {
    pub player_id: PlayerId,
    pub full_name: String,
    pub position: Position,
    pub team: String,
    pub eligible_positions: Vec<Position>,
    pub percent_owned: Option<u8>,
}

/// Player value with its component breakdown
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerValueResponse {
    pub player_id: PlayerId,
    pub full_name: String,
    pub position: Position,
    pub value: f64,
    pub scarcity_multiplier: f64,
    pub components: BTreeMap<SubScore, Component>,
    pub missing_inputs: Vec<SubScore>,
    pub snapshot_version: u64,
}

/// Analyze a proposed trade
pub async fn analyze_trade(
    request: TradeAnalysisRequest,
    engine: Arc<ScoringEngine>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let proposal = TradeProposal::new(request.team_a_players, request.team_b_players);
    tracing::debug!("Analyzing trade {:?} for {:?}", proposal.side_a, proposal.side_b);

    let verdict = engine.analyze_trade(&proposal).await.map_err(reject)?;
    Ok(warp::reply::json(&TradeAnalysisResponse::from(verdict)))
}

/// Ranked waiver wire for the caller's team
pub async fn get_waiver_wire(
    league_key: String,
    user_id: Option<String>,
    params: WaiverWireParams,
    engine: Arc<ScoringEngine>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user_id = user_id.ok_or_else(|| warp::reject::custom(ApiError::MissingUser))?;
    let filters = params.into_filters().map_err(reject)?;

    let candidates = engine.recommend_waivers(&league_key, &user_id, &filters).await.map_err(reject)?;
    tracing::debug!("Returning {} waiver candidates for league {}", candidates.len(), league_key);

    let players: Vec<WaiverPlayerResponse> = candidates.into_iter().map(Into::into).collect();
    Ok(warp::reply::json(&players))
}

/// Player catalog, optionally filtered by name
pub async fn get_players(
    params: PlayerSearchParams,
    engine: Arc<ScoringEngine>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let snapshot = engine.current_snapshot().map_err(reject)?;

    let records = match params.search.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => snapshot.search(query),
        _ => snapshot.catalog(),
    };

    let players: Vec<PlayerSummaryResponse> = records
        .into_iter()
        .map(|record| PlayerSummaryResponse {
            player_id: record.player_id,
            full_name: record.full_name.clone(),
            position: record.position,
            team: record.team.clone(),
            eligible_positions: record.eligible_positions.clone(),
            percent_owned: record.percent_owned,
        })
        .collect();

    Ok(warp::reply::json(&players))
}

/// Value breakdown for one player
pub async fn get_player_value(
    player_id: PlayerId,
    engine: Arc<ScoringEngine>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (record, value) = engine.player_value(player_id).await.map_err(|err| match err {
        ScoringError::UnknownPlayer(id) => warp::reject::custom(ApiError::PlayerNotFound(id)),
        other => reject(other),
    })?;

    let response = PlayerValueResponse {
        player_id,
        full_name: record.full_name,
        position: record.position,
        value: value.value,
        scarcity_multiplier: value.scarcity_multiplier,
        components: value.components.clone(),
        missing_inputs: value.missing_inputs(),
        snapshot_version: value.snapshot_version,
    };

    Ok(warp::reply::json(&response))
}

fn reject(err: ScoringError) -> warp::Rejection {
    warp::reject::custom(ApiError::Scoring(err))
}

/// Create all REST API routes
pub fn create_routes(
    engine: Arc<ScoringEngine>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let engine_filter = warp::any().map(move || engine.clone());

    // Trade analysis endpoint
    let trade_analysis = warp::path("trades")
        .and(warp::path("analyze"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(engine_filter.clone())
        .and_then(analyze_trade);

    // Waiver wire endpoint; the auth layer in front supplies x-user-id
    let waiver_wire = warp::path("leagues")
        .and(warp::path::param::<String>())
        .and(warp::path("waiver-wire"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::header::optional::<String>("x-user-id"))
        .and(warp::query::<WaiverWireParams>())
        .and(engine_filter.clone())
        .and_then(get_waiver_wire);

    // Player catalog endpoint
    let players = warp::path("players")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<PlayerSearchParams>())
        .and(engine_filter.clone())
        .and_then(get_players);

    // Player value endpoint
    let player_value = warp::path("players")
        .and(warp::path::param::<PlayerId>())
        .and(warp::path("value"))
        .and(warp::path::end())
        .and(warp::get())
        .and(engine_filter.clone())
        .and_then(get_player_value);

    // Health check endpoint
    let health = warp::path("health").and(warp::path::end()).and(warp::get()).and(engine_filter).map(
        |engine: Arc<ScoringEngine>| {
            let snapshot_version = engine.registry().current_version();
            warp::reply::json(&serde_json::json!({
                "status": if snapshot_version.is_some() { "healthy" } else { "degraded" },
                "snapshot_version": snapshot_version,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        },
    );

    // Combine all routes
    trade_analysis
        .or(waiver_wire)
        .or(players)
        .or(player_value)
        .or(health)
        .recover(handle_rejection)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_headers(vec!["content-type", "x-user-id"])
                .allow_methods(vec!["GET", "POST", "OPTIONS"]),
        )
}
