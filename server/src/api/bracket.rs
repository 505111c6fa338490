use axum::{extract::State, Json};
use common::dto::{
    BracketRegisterResponse, BracketStateResponse, BulkRegisterRequest, BulkRegisterResponse,
    GeneratedNameResponse, MatchDto, RegisterPlayerRequest, SubmitMoveRequest, SubmitMoveResponse,
};
use std::sync::Arc;

use crate::bracket_service::BracketService;
use super::extract::{ApiJson, ApiPath};
use crate::error::ServiceResult;

pub async fn register(
    State(service): State<Arc<BracketService>>,
    ApiJson(req): ApiJson<RegisterPlayerRequest>,
) -> ServiceResult<Json<BracketRegisterResponse>> {
    Ok(Json(service.register(&req.name)?))
}

pub async fn generate_name(State(service): State<Arc<BracketService>>) -> Json<GeneratedNameResponse> {
    Json(GeneratedNameResponse {
        name: service.generate_name(),
    })
}

pub async fn register_bulk(
    State(service): State<Arc<BracketService>>,
    ApiJson(req): ApiJson<BulkRegisterRequest>,
) -> ServiceResult<Json<BulkRegisterResponse>> {
    Ok(Json(service.register_bulk(&req)?))
}

pub async fn current_match(
    State(service): State<Arc<BracketService>>,
    ApiPath(player_id): ApiPath<u32>,
) -> ServiceResult<Json<MatchDto>> {
    Ok(Json(service.current_match(player_id)?))
}

pub async fn current_match_completed(
    State(service): State<Arc<BracketService>>,
    ApiPath(player_id): ApiPath<u32>,
) -> ServiceResult<Json<MatchDto>> {
    Ok(Json(service.current_match_completed(player_id)?))
}

pub async fn submit_move(
    State(service): State<Arc<BracketService>>,
    ApiPath(player_id): ApiPath<u32>,
    ApiJson(req): ApiJson<SubmitMoveRequest>,
) -> ServiceResult<Json<SubmitMoveResponse>> {
    Ok(Json(service.submit_move(player_id, req.r#move)?))
}

pub async fn tournament_state(State(service): State<Arc<BracketService>>) -> Json<BracketStateResponse> {
    Json(service.state())
}
