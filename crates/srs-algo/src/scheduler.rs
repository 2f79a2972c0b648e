//! SM-2 derived scheduling transitions.
//!
//! `grade` is a pure function: same `(state, quality, now)` always produces
//! the same next state, and the input is never mutated. Persistence and
//! concurrency control live in the backend; this module only encodes the
//! forgetting-curve model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Easiness factor floor. Below this the interval growth would collapse.
pub const MIN_EASINESS: f64 = 1.3;
/// Easiness factor ceiling, keeps interval growth numerically tame.
pub const MAX_EASINESS: f64 = 2.7;
/// Easiness assigned to never-reviewed items.
pub const INITIAL_EASINESS: f64 = 2.5;

/// Interval ceiling, ten years. Keeps `due_at` arithmetic inside chrono's
/// representable range no matter how long a passing streak runs.
pub const MAX_INTERVAL_DAYS: i64 = 3650;

/// Quality at or above this counts as a pass.
pub const PASSING_QUALITY: u8 = 3;
/// Highest accepted quality grade.
pub const MAX_QUALITY: u8 = 5;

/// Easiness penalty applied on a lapse.
const LAPSE_EASINESS_PENALTY: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("quality {0} outside accepted range 0-5")]
    InvalidGrade(u8),
}

/// Per-(user, item) scheduling record.
///
/// Invariants upheld by `grade`:
/// - `repetitions == 0` whenever `interval_days == 0`
/// - `interval_days` stays within `[1, MAX_INTERVAL_DAYS]` once `repetitions > 0`
/// - `easiness_factor` stays within `[MIN_EASINESS, MAX_EASINESS]`
/// - `lapses` never decreases
/// - `version` increments by exactly 1 per accepted grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub easiness_factor: f64,
    pub interval_days: i64,
    pub repetitions: i32,
    pub lapses: i32,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub last_quality: Option<u8>,
    pub version: i64,
}

impl ReviewState {
    /// Default record for an item that has never been successfully reviewed.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            easiness_factor: INITIAL_EASINESS,
            interval_days: 0,
            repetitions: 0,
            lapses: 0,
            due_at: now,
            last_reviewed_at: None,
            last_quality: None,
            version: 0,
        }
    }
}

/// Apply a graded response and produce the next scheduling state.
///
/// Failure (`quality < 3`) resets the repetition streak, schedules a next-day
/// retry and dents the easiness factor. A pass grows the interval along the
/// SM-2 progression 1 / 6 / round(previous * EF).
pub fn grade(state: &ReviewState, quality: u8, now: DateTime<Utc>) -> Result<ReviewState, GradeError> {
    if quality > MAX_QUALITY {
        return Err(GradeError::InvalidGrade(quality));
    }

    let mut next = state.clone();

    if quality < PASSING_QUALITY {
        next.repetitions = 0;
        next.interval_days = 1;
        next.lapses = state.lapses + 1;
        next.easiness_factor = (state.easiness_factor - LAPSE_EASINESS_PENALTY).max(MIN_EASINESS);
    } else {
        next.repetitions = state.repetitions + 1;
        let q = quality as f64;
        // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
        let delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
        next.easiness_factor = (state.easiness_factor + delta).clamp(MIN_EASINESS, MAX_EASINESS);
        next.interval_days = match next.repetitions {
            1 => 1,
            2 => 6,
            _ => ((state.interval_days as f64) * next.easiness_factor)
                .round()
                .max(1.0)
                .min(MAX_INTERVAL_DAYS as f64) as i64,
        };
    }

    next.due_at = now + Duration::days(next.interval_days);
    next.last_reviewed_at = Some(now);
    next.last_quality = Some(quality);
    next.version = state.version + 1;
    Ok(next)
}
