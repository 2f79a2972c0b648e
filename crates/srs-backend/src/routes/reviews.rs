use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use srs_algo::ItemType;

use crate::response::AppError;
use crate::routes::SuccessResponse;
use crate::services::due_queue::{self, DueItem};
use crate::services::review::{self, GradeSubmission};
use crate::state::AppState;

const MAX_DUE_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReviewRequest {
    event_id: String,
    user_id: String,
    item_id: String,
    quality: i64,
    response_time_ms: Option<i64>,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReviewResponse {
    accepted: bool,
    state: srs_algo::ReviewState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DueQuery {
    user_id: String,
    limit: Option<i64>,
    /// Comma-separated item types, e.g. `vocabulary,kanji`.
    item_types: Option<String>,
    interleave: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DueResponse {
    items: Vec<DueItem>,
    count: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_review))
        .route("/due", get(get_due))
}

async fn submit_review(
    State(state): State<AppState>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event_id = payload.event_id.trim();
    let user_id = payload.user_id.trim();
    let item_id = payload.item_id.trim();
    if event_id.is_empty() || user_id.is_empty() || item_id.is_empty() {
        return Err(AppError::validation(
            "eventId, userId and itemId must be non-empty",
        ));
    }
    if !(0..=5).contains(&payload.quality) {
        return Err(AppError::validation(format!(
            "quality {} outside accepted range 0-5",
            payload.quality
        )));
    }

    let now = Utc::now();
    let submission = GradeSubmission {
        event_id: event_id.to_string(),
        user_id: user_id.to_string(),
        item_id: item_id.to_string(),
        quality: payload.quality as u8,
        response_time_ms: payload.response_time_ms.unwrap_or(0).max(0),
        submitted_at: payload.submitted_at.unwrap_or(now),
    };

    let outcome = review::submit_review(state.db(), &submission, now).await?;
    Ok(Json(SuccessResponse::new(SubmitReviewResponse {
        accepted: outcome.accepted,
        state: outcome.state,
    })))
}

async fn get_due(
    State(state): State<AppState>,
    Query(query): Query<DueQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("userId must be non-empty"));
    }

    let limit = query
        .limit
        .unwrap_or(state.config().due_limit_default)
        .clamp(1, MAX_DUE_LIMIT);

    let item_types = match query.item_types.as_deref() {
        Some(raw) => parse_item_types(raw)?,
        None => Vec::new(),
    };

    let items = due_queue::get_due(
        state.db(),
        user_id,
        Utc::now(),
        limit,
        &item_types,
        query.interleave.unwrap_or(false),
    )
    .await?;

    Ok(Json(SuccessResponse::new(DueResponse {
        count: items.len(),
        items,
    })))
}

fn parse_item_types(raw: &str) -> Result<Vec<ItemType>, AppError> {
    let mut types = Vec::new();
    for piece in raw.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let parsed = ItemType::parse(piece)
            .ok_or_else(|| AppError::validation(format!("unknown item type: {piece}")))?;
        if !types.contains(&parsed) {
            types.push(parsed);
        }
    }
    Ok(types)
}
