//! Priority matrix recomputation and cache reads.
//!
//! Recompute is a full pass over a user's tracked items, paginated so a
//! large collection never turns into one unbounded scan. It runs from the
//! cron worker or on demand, never inline with a grade submission.

use chrono::{DateTime, Utc};
use serde::Serialize;
use srs_algo::priority::RED_WINDOW;
use srs_algo::{classify, ClassifierThresholds, ErrorKind, PriorityBucket};

use crate::db::operations::priority_cache::{self, PriorityCacheRow};
use crate::db::operations::{events, review_state};
use crate::db::Database;
use crate::services::EngineError;

/// States fetched per page during the full pass.
const RECOMPUTE_BATCH: i64 = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityEntry {
    pub item_id: String,
    pub bucket: PriorityBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub recent_accuracy: f64,
    pub repetitions: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_review: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityMatrix {
    pub entries: Vec<PriorityEntry>,
    pub recomputed_at: Option<DateTime<Utc>>,
}

/// Full reclassification of every tracked item; replaces the cached matrix.
pub async fn recompute(
    db: &Database,
    thresholds: &ClassifierThresholds,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<PriorityMatrix, EngineError> {
    let now_ms = now.timestamp_millis();
    let mut cache_rows: Vec<PriorityCacheRow> = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = review_state::list_states_page(
            db.pool(),
            user_id,
            cursor.as_deref(),
            RECOMPUTE_BATCH,
        )
        .await?;
        if page.is_empty() {
            break;
        }
        cursor = page.last().map(|row| row.item_id.clone());

        let item_ids: Vec<String> = page.iter().map(|row| row.item_id.clone()).collect();
        let recent =
            events::recent_samples_batch(db.pool(), user_id, &item_ids, RED_WINDOW).await?;

        for row in &page {
            let samples = recent.get(&row.item_id).map(Vec::as_slice).unwrap_or(&[]);
            let classification = classify(
                row.state.repetitions,
                row.state.lapses,
                samples,
                thresholds,
            );
            let days_since_review = row.state.last_reviewed_at.map(|t| {
                ((now - t).num_milliseconds().max(0)) as f64 / 86_400_000.0
            });

            cache_rows.push(PriorityCacheRow {
                item_id: row.item_id.clone(),
                bucket: classification.bucket,
                error_kind: classification.error_kind,
                recent_accuracy: classification.recent_accuracy,
                repetitions: classification.repetitions,
                days_since_review,
                recomputed_at_ms: now_ms,
            });
        }

        if (page.len() as i64) < RECOMPUTE_BATCH {
            break;
        }
    }

    priority_cache::replace_for_user(db.pool(), user_id, &cache_rows).await?;
    tracing::info!(
        user_id,
        items = cache_rows.len(),
        "priority matrix recomputed"
    );

    Ok(PriorityMatrix {
        entries: cache_rows.iter().map(to_entry).collect(),
        recomputed_at: Some(now),
    })
}

/// Cached matrix as of its last recompute. Empty with no timestamp when the
/// user has never been classified.
pub async fn get_matrix(db: &Database, user_id: &str) -> Result<PriorityMatrix, EngineError> {
    let rows = priority_cache::list_for_user(db.pool(), user_id).await?;
    let recomputed_at = rows
        .iter()
        .map(|r| r.recomputed_at_ms)
        .max()
        .map(review_state::ms_to_datetime);

    Ok(PriorityMatrix {
        entries: rows.iter().map(to_entry).collect(),
        recomputed_at,
    })
}

fn to_entry(row: &PriorityCacheRow) -> PriorityEntry {
    PriorityEntry {
        item_id: row.item_id.clone(),
        bucket: row.bucket,
        error_kind: row.error_kind,
        recent_accuracy: row.recent_accuracy,
        repetitions: row.repetitions,
        days_since_review: row.days_since_review,
    }
}
