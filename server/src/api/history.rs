use axum::{extract::State, Json};
use common::dto::HistoryEntry;
use serde::Deserialize;
use std::sync::Arc;

use super::extract::ApiQuery;
use crate::error::{ServiceError, ServiceResult};
use crate::history::HistoryStore;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Number of entries to return (default: 20, max: 100)
    pub limit: Option<usize>,
}

pub async fn list_history(
    State(store): State<Arc<dyn HistoryStore>>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ServiceResult<Json<Vec<HistoryEntry>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let entries = store
        .list(limit)
        .await
        .map_err(|e| ServiceError::Internal(format!("{:#}", e)))?;
    Ok(Json(entries))
}
