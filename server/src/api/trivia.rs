use axum::{extract::State, Json};
use common::dto::{
    PlayerRoundResultDto, PlayerStatusResponse, RegisterPlayerRequest, RegisterPlayerResponse,
    SubmitAnswerRequest, SubmitAnswerResponse, TournamentStateResponse,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath};
use crate::error::ServiceResult;
use crate::trivia_service::TriviaService;

pub async fn register(
    State(service): State<Arc<TriviaService>>,
    ApiJson(req): ApiJson<RegisterPlayerRequest>,
) -> ServiceResult<Json<RegisterPlayerResponse>> {
    Ok(Json(service.register_player(&req.name)?))
}

pub async fn player_status(
    State(service): State<Arc<TriviaService>>,
    ApiPath(player_id): ApiPath<u32>,
) -> ServiceResult<Json<PlayerStatusResponse>> {
    Ok(Json(service.player_status(player_id)?))
}

pub async fn submit_answer(
    State(service): State<Arc<TriviaService>>,
    ApiJson(req): ApiJson<SubmitAnswerRequest>,
) -> ServiceResult<Json<SubmitAnswerResponse>> {
    Ok(Json(service.submit_answer(&req)?))
}

pub async fn player_results(
    State(service): State<Arc<TriviaService>>,
    ApiPath(player_id): ApiPath<u32>,
) -> ServiceResult<Json<Vec<PlayerRoundResultDto>>> {
    Ok(Json(service.player_results(player_id)?))
}

pub async fn tournament_state(
    State(service): State<Arc<TriviaService>>,
) -> Json<TournamentStateResponse> {
    Json(service.tournament_state())
}
