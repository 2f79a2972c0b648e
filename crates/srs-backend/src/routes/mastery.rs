use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::response::AppError;
use crate::routes::SuccessResponse;
use crate::services::mastery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasteryQuery {
    user_id: String,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreakQuery {
    user_id: String,
    /// Caller's local-day boundary relative to UTC, in minutes.
    utc_offset_minutes: Option<i32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_mastery))
        .route("/streak", get(get_streak))
}

async fn get_mastery(
    State(state): State<AppState>,
    Query(query): Query<MasteryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("userId must be non-empty"));
    }
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let summary =
        mastery::compute_mastery(state.db(), state.thresholds(), user_id, category).await?;
    Ok(Json(SuccessResponse::new(summary)))
}

async fn get_streak(
    State(state): State<AppState>,
    Query(query): Query<StreakQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("userId must be non-empty"));
    }
    let offset = query.utc_offset_minutes.unwrap_or(0);
    if !(-14 * 60..=14 * 60).contains(&offset) {
        return Err(AppError::validation("utcOffsetMinutes outside valid range"));
    }

    let streak = mastery::compute_streak(state.db(), user_id, Utc::now(), offset).await?;
    Ok(Json(SuccessResponse::new(streak)))
}
