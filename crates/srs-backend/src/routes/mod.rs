mod health;
mod items;
mod mastery;
mod priority;
mod reviews;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub(crate) struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub(crate) fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/reviews", reviews::router())
        .nest("/api/mastery", mastery::router())
        .nest("/api/priority", priority::router())
        .nest("/api/items", items::router())
        .nest("/api/health", health::router())
        .with_state(state)
}
