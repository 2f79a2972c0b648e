use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::db::HealthSnapshot;
use crate::routes::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthDto {
    status: &'static str,
    uptime_seconds: u64,
    started_at: String,
    database: HealthSnapshot,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_health))
}

async fn get_health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db().health_status().await;
    let status = if database.healthy { "ok" } else { "degraded" };
    let started_at: DateTime<Utc> = state.started_at_system().into();

    Json(SuccessResponse::new(HealthDto {
        status,
        uptime_seconds: state.uptime_seconds(),
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        database,
    }))
}
