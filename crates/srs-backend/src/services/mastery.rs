//! Mastery and streak aggregation.
//!
//! Everything here is recomputed on read from the ledger and state store;
//! there are no incrementally-mutated counters, so replay and backfill
//! always converge.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use srs_algo::priority::RED_WINDOW;
use srs_algo::{classify, is_mastery_candidate, ClassifierThresholds, PriorityBucket, StreakResult};

use crate::db::operations::{events, items, review_state};
use crate::db::Database;
use crate::services::EngineError;

/// Streak computation only ever looks this far back.
const STREAK_LOOKBACK_DAYS: i64 = 400;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterySummary {
    pub mastered_count: i64,
    pub in_progress_count: i64,
    pub new_count: i64,
}

/// Per-category mastery counts.
///
/// Mastered = `repetitions >= 4` and a passing last grade and not currently
/// RED. The RED check re-derives the bucket from recent events for the
/// mastered candidates only, so a stale priority cache can never inflate
/// the number.
pub async fn compute_mastery(
    db: &Database,
    thresholds: &ClassifierThresholds,
    user_id: &str,
    category: Option<&str>,
) -> Result<MasterySummary, EngineError> {
    let states = review_state::list_states_with_category(db.pool(), user_id, category).await?;

    let candidate_ids: Vec<String> = states
        .iter()
        .filter(|s| is_mastery_candidate(s.repetitions, s.last_quality))
        .map(|s| s.item_id.clone())
        .collect();

    let recent =
        events::recent_samples_batch(db.pool(), user_id, &candidate_ids, RED_WINDOW).await?;

    let mastered: HashSet<&str> = states
        .iter()
        .filter(|s| is_mastery_candidate(s.repetitions, s.last_quality))
        .filter(|s| {
            let samples = recent.get(&s.item_id).map(Vec::as_slice).unwrap_or(&[]);
            classify(s.repetitions, s.lapses, samples, thresholds).bucket != PriorityBucket::Red
        })
        .map(|s| s.item_id.as_str())
        .collect();

    let tracked = states.len() as i64;
    let mastered_count = mastered.len() as i64;
    let total_items = items::count_items(db.pool(), category).await?;

    Ok(MasterySummary {
        mastered_count,
        in_progress_count: tracked - mastered_count,
        new_count: (total_items - tracked).max(0),
    })
}

/// Current streak as of `now`, using the caller's local day boundary.
pub async fn compute_streak(
    db: &Database,
    user_id: &str,
    now: DateTime<Utc>,
    utc_offset_minutes: i32,
) -> Result<StreakResult, EngineError> {
    let since = now - Duration::days(STREAK_LOOKBACK_DAYS);
    let times = events::event_times_since(db.pool(), user_id, since.timestamp_millis()).await?;
    Ok(srs_algo::current_streak(&times, now, utc_offset_minutes))
}
