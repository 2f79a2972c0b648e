//! Mastery predicate and calendar-day streaks.
//!
//! Both are derived, recomputable aggregates: nothing here mutates counters,
//! so replaying or backfilling the ledger always converges to the same
//! numbers.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::scheduler::PASSING_QUALITY;

/// Consecutive passing repetitions at which an item counts as durably
/// retained (the final mastered verdict additionally excludes RED items).
pub const MASTERY_REPETITIONS: i32 = 4;

/// Whether the scheduling state alone qualifies for "mastered". The caller
/// still has to rule out a RED classification.
pub fn is_mastery_candidate(repetitions: i32, last_quality: Option<u8>) -> bool {
    repetitions >= MASTERY_REPETITIONS && last_quality.is_some_and(|q| q >= PASSING_QUALITY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResult {
    pub current_streak: u32,
    pub last_active_date: Option<NaiveDate>,
}

/// Count consecutive local calendar days with at least one accepted event.
///
/// The day boundary is the caller's: `utc_offset_minutes` shifts event
/// timestamps into the user's local day. The current day is still open, so
/// a streak ending yesterday has not broken yet; one ending before
/// yesterday has collapsed to 0.
pub fn current_streak(
    event_times: &[DateTime<Utc>],
    now: DateTime<Utc>,
    utc_offset_minutes: i32,
) -> StreakResult {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());

    let days: BTreeSet<NaiveDate> = event_times
        .iter()
        .map(|t| t.with_timezone(&offset).date_naive())
        .collect();

    let last_active_date = days.iter().next_back().copied();
    let today = now.with_timezone(&offset).date_naive();
    let yesterday = today - Duration::days(1);

    let anchor = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return StreakResult {
            current_streak: 0,
            last_active_date,
        };
    };

    let mut streak = 0u32;
    let mut cursor = anchor;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }

    StreakResult {
        current_streak: streak,
        last_active_date,
    }
}
