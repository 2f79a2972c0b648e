//! Grade submission: ledger append + scheduler + state write, one
//! transaction per attempt.
//!
//! The ledger insert and the state write commit or roll back together, so a
//! version increment always has exactly one anchoring event. Contention on
//! one (user, item) from multiple devices is resolved by the optimistic
//! read-compute-write loop, never by locks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use srs_algo::ReviewState;
use uuid::Uuid;

use crate::db::operations::{events, items, review_state};
use crate::db::Database;
use crate::services::EngineError;

/// Attempts before giving up with `ConcurrentUpdateConflict`.
pub const MAX_APPLY_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct GradeSubmission {
    pub event_id: String,
    pub user_id: String,
    pub item_id: String,
    pub quality: u8,
    pub response_time_ms: i64,
    /// Client clock, stored for display only.
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeOutcome {
    /// False when the event id was already in the ledger (idempotent replay).
    pub accepted: bool,
    pub state: ReviewState,
}

/// Apply a graded response. Safe to retry with the same `event_id`: a
/// duplicate changes nothing and returns the current state.
pub async fn submit_review(
    db: &Database,
    submission: &GradeSubmission,
    now: DateTime<Utc>,
) -> Result<GradeOutcome, EngineError> {
    if submission.quality > srs_algo::scheduler::MAX_QUALITY {
        return Err(EngineError::InvalidGrade(submission.quality));
    }

    if !items::item_exists(db.pool(), &submission.item_id).await? {
        return Err(EngineError::ItemNotFound(submission.item_id.clone()));
    }

    let now_ms = now.timestamp_millis();

    for attempt in 1..=MAX_APPLY_ATTEMPTS {
        let mut tx = db.pool().begin().await?;

        let current =
            review_state::get_state(&mut *tx, &submission.user_id, &submission.item_id).await?;
        let base = current.clone().unwrap_or_else(|| ReviewState::new(now));
        let next = srs_algo::grade(&base, submission.quality, now)?;

        let row_id = Uuid::new_v4().to_string();
        let event = events::NewEvent {
            id: &row_id,
            user_id: &submission.user_id,
            event_id: &submission.event_id,
            item_id: &submission.item_id,
            quality: submission.quality,
            response_time_ms: submission.response_time_ms,
            submitted_at_ms: submission.submitted_at.timestamp_millis(),
            created_at_ms: now_ms,
            resulting_version: next.version,
        };

        if !events::insert_event(&mut *tx, &event).await? {
            drop(tx);
            let state = review_state::get_state(
                db.pool(),
                &submission.user_id,
                &submission.item_id,
            )
            .await?
            .unwrap_or_else(|| ReviewState::new(now));
            tracing::debug!(
                user_id = %submission.user_id,
                event_id = %submission.event_id,
                "duplicate review event ignored"
            );
            return Ok(GradeOutcome {
                accepted: false,
                state,
            });
        }

        let written = match current {
            Some(_) => {
                review_state::update_state_guarded(
                    &mut *tx,
                    &submission.user_id,
                    &submission.item_id,
                    base.version,
                    &next,
                    now_ms,
                )
                .await?
            }
            None => {
                review_state::insert_state(
                    &mut *tx,
                    &submission.user_id,
                    &submission.item_id,
                    &next,
                    now_ms,
                )
                .await?
            }
        };

        if !written {
            // Lost the version race; the event insert rolls back with us.
            drop(tx);
            tracing::debug!(
                user_id = %submission.user_id,
                item_id = %submission.item_id,
                attempt,
                "review state version conflict, retrying"
            );
            continue;
        }

        tx.commit().await?;
        tracing::debug!(
            user_id = %submission.user_id,
            item_id = %submission.item_id,
            version = next.version,
            quality = submission.quality,
            "review applied"
        );
        return Ok(GradeOutcome {
            accepted: true,
            state: next,
        });
    }

    Err(EngineError::ConcurrentUpdateConflict {
        item_id: submission.item_id.clone(),
        attempts: MAX_APPLY_ATTEMPTS,
    })
}

/// Recent ledger entries for one item, newest first. Read-only audit view.
pub async fn item_history(
    db: &Database,
    user_id: &str,
    item_id: &str,
    limit: i64,
) -> Result<Vec<events::EventRow>, EngineError> {
    Ok(events::list_events_for_item(db.pool(), user_id, item_id, limit).await?)
}
