//! Error types for the ScoringGateway and their HTTP mapping

use player_registry::PlayerId;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use valuation_engine::{ScoringError, ValidationError};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Errors surfaced to API callers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("Player with ID '{0}' not found")]
    PlayerNotFound(PlayerId),

    #[error("Missing x-user-id header")]
    MissingUser,
}

impl warp::reject::Reject for ApiError {}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: String, details: Option<serde_json::Value>) -> Self {
        Self {
            error: ErrorDetail { code: code.to_string(), message, details },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Scoring(err) => match err {
                ScoringError::Validation(_) | ScoringError::UnknownPlayer(_) => StatusCode::BAD_REQUEST,
                ScoringError::UnknownLeague(_) => StatusCode::NOT_FOUND,
                ScoringError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ScoringError::SnapshotMismatch { .. } | ScoringError::Publish(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MissingUser => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Scoring(err) => match err {
                ScoringError::Validation(ValidationError::EmptySide(_)) => "EMPTY_TRADE_SIDE",
                ScoringError::Validation(ValidationError::DuplicatePlayer { .. }) => "DUPLICATE_PLAYER",
                ScoringError::Validation(ValidationError::OverlappingPlayers(_)) => "OVERLAPPING_PLAYERS",
                ScoringError::Validation(ValidationError::InvalidPosition(_)) => "INVALID_POSITION",
                ScoringError::UnknownPlayer(_) => "UNKNOWN_PLAYER",
                ScoringError::UnknownLeague(_) => "LEAGUE_NOT_FOUND",
                ScoringError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
                ScoringError::SnapshotMismatch { .. } | ScoringError::Publish(_) => "INTERNAL_ERROR",
            },
            ApiError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            ApiError::MissingUser => "UNAUTHENTICATED",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Scoring(ScoringError::UnknownPlayer(id)) | ApiError::PlayerNotFound(id) => {
                Some(serde_json::json!({ "player_id": id }))
            }
            ApiError::Scoring(ScoringError::Validation(ValidationError::OverlappingPlayers(ids))) => {
                Some(serde_json::json!({ "player_ids": ids }))
            }
            ApiError::Scoring(ScoringError::Validation(ValidationError::DuplicatePlayer {
                side,
                player_id,
            })) => Some(serde_json::json!({ "side": side, "player_id": player_id })),
            ApiError::Scoring(ScoringError::UnknownLeague(key)) => {
                Some(serde_json::json!({ "league_key": key }))
            }
            ApiError::Scoring(ScoringError::Validation(ValidationError::InvalidPosition(position))) => {
                Some(serde_json::json!({ "position": position }))
            }
            _ => None,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        // Internal invariant breaches keep their detail in the logs only
        let message = if self.status().is_server_error() && self.status() != StatusCode::SERVICE_UNAVAILABLE {
            "Internal error".to_string()
        } else {
            self.to_string()
        };
        ErrorResponse::new(self.code(), message, self.details())
    }
}

/// Recover rejections into the JSON error envelope
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(api_error) = err.find::<ApiError>() {
        let status = api_error.status();
        if status.is_server_error() {
            error!("Request failed: {}", api_error);
        } else {
            warn!("Request rejected: {}", api_error);
        }
        (status, api_error.to_response())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", "Resource not found".to_string(), None))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        warn!("Malformed request body: {}", e);
        (StatusCode::BAD_REQUEST, ErrorResponse::new("MALFORMED_REQUEST", e.to_string(), None))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, ErrorResponse::new("MALFORMED_REQUEST", e.to_string(), None))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorResponse::new("PAYLOAD_TOO_LARGE", "Request body too large".to_string(), None),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("METHOD_NOT_ALLOWED", "Method not allowed".to_string(), None),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("INTERNAL_ERROR", "Internal error".to_string(), None),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_engine::TradeSide;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Scoring(ValidationError::EmptySide(TradeSide::A).into()), StatusCode::BAD_REQUEST),
            (ApiError::Scoring(ScoringError::UnknownPlayer(7)), StatusCode::BAD_REQUEST),
            (ApiError::PlayerNotFound(7), StatusCode::NOT_FOUND),
            (ApiError::Scoring(ScoringError::UnknownLeague("nfl.l.1".into())), StatusCode::NOT_FOUND),
            (
                ApiError::Scoring(ScoringError::UpstreamUnavailable("no snapshot".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Scoring(ScoringError::SnapshotMismatch { expected: 2, found: 1 }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Scoring(ValidationError::InvalidPosition("LB".into()).into()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status, "{}", err);
        }
    }

    #[test]
    fn test_overlap_details_list_ids() {
        let err = ApiError::Scoring(ValidationError::OverlappingPlayers(vec![3, 9]).into());
        let response = err.to_response();

        assert_eq!(response.error.code, "OVERLAPPING_PLAYERS");
        assert_eq!(response.error.details, Some(serde_json::json!({ "player_ids": [3, 9] })));
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = ApiError::Scoring(ScoringError::SnapshotMismatch { expected: 2, found: 1 });
        assert_eq!(err.to_response().error.message, "Internal error");

        let err = ApiError::Scoring(ScoringError::UpstreamUnavailable("no snapshot".into()));
        assert!(err.to_response().error.message.contains("no snapshot"));
    }
}
