use axum::{body::Bytes, extract::State, Json};
use common::dto::{RefereeResponse, StartRoundRequest};
use std::sync::Arc;

use crate::bracket_service::BracketService;
use crate::error::{ServiceError, ServiceResult};
use crate::trivia_service::TriviaService;

pub async fn start_tournament(
    State(service): State<Arc<TriviaService>>,
) -> ServiceResult<Json<RefereeResponse>> {
    Ok(Json(service.start_tournament()?))
}

/// The body is optional; without one the round uses the next bank question and a random server move.
pub async fn start_round(
    State(service): State<Arc<TriviaService>>,
    body: Bytes,
) -> ServiceResult<Json<RefereeResponse>> {
    let overrides = if body.iter().all(u8::is_ascii_whitespace) {
        StartRoundRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServiceError::BadRequest(format!("Invalid start-round body: {}", e)))?
    };
    Ok(Json(service.start_round(&overrides)?))
}

pub async fn end_round(
    State(service): State<Arc<TriviaService>>,
) -> ServiceResult<Json<RefereeResponse>> {
    Ok(Json(service.end_round()?))
}

pub async fn reset_round(
    State(service): State<Arc<TriviaService>>,
) -> ServiceResult<Json<RefereeResponse>> {
    Ok(Json(service.reset_round()?))
}

pub async fn reset_tournament(State(service): State<Arc<TriviaService>>) -> Json<RefereeResponse> {
    Json(service.reset_tournament())
}

pub async fn bracket_start_round(
    State(service): State<Arc<BracketService>>,
) -> ServiceResult<Json<RefereeResponse>> {
    Ok(Json(service.start_round()?))
}

pub async fn bracket_advance(
    State(service): State<Arc<BracketService>>,
) -> ServiceResult<Json<RefereeResponse>> {
    Ok(Json(service.advance()?))
}

pub async fn bracket_reset(State(service): State<Arc<BracketService>>) -> Json<RefereeResponse> {
    Json(service.reset())
}
