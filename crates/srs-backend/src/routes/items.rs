use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::db::operations::items;
use crate::response::AppError;
use crate::routes::SuccessResponse;
use crate::services::review;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    user_id: String,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEventDto {
    event_id: String,
    quality: u8,
    response_time_ms: i64,
    submitted_at: String,
    received_at: String,
    resulting_version: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    item_id: String,
    events: Vec<HistoryEventDto>,
    count: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:itemId/history", get(get_history))
}

async fn get_history(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = query.user_id.trim();
    let item_id = item_id.trim().to_string();
    if user_id.is_empty() || item_id.is_empty() {
        return Err(AppError::validation("userId and itemId must be non-empty"));
    }

    if !items::item_exists(state.db().pool(), &item_id)
        .await
        .map_err(crate::services::EngineError::Storage)?
    {
        return Err(AppError::not_found(format!(
            "item {item_id} not found in catalog"
        )));
    }

    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let events = review::item_history(state.db(), user_id, &item_id, limit).await?;

    let dtos: Vec<HistoryEventDto> = events
        .into_iter()
        .map(|e| HistoryEventDto {
            event_id: e.event_id,
            quality: e.quality,
            response_time_ms: e.response_time_ms,
            submitted_at: iso_millis(e.submitted_at),
            received_at: iso_millis(e.created_at),
            resulting_version: e.resulting_version,
        })
        .collect();

    Ok(Json(SuccessResponse::new(HistoryResponse {
        item_id,
        count: dtos.len(),
        events: dtos,
    })))
}

fn iso_millis(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}
