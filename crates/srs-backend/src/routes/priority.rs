use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::response::AppError;
use crate::routes::SuccessResponse;
use crate::services::priority;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriorityQuery {
    user_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_matrix))
        .route("/recompute", post(recompute))
}

async fn get_matrix(
    State(state): State<AppState>,
    Query(query): Query<PriorityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("userId must be non-empty"));
    }

    let matrix = priority::get_matrix(state.db(), user_id).await?;
    Ok(Json(SuccessResponse::new(matrix)))
}

async fn recompute(
    State(state): State<AppState>,
    Query(query): Query<PriorityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("userId must be non-empty"));
    }

    let matrix =
        priority::recompute(state.db(), state.thresholds(), user_id, Utc::now()).await?;
    Ok(Json(SuccessResponse::new(matrix)))
}
