//! Priority bucket classification.
//!
//! Buckets are derived from the scheduling state plus a window of recent
//! review samples, newest first. The backend feeds at most
//! [`RED_WINDOW`] samples per item; classification over a shorter history
//! simply uses what exists.

use serde::{Deserialize, Serialize};

use crate::scheduler::PASSING_QUALITY;
use crate::types::{ErrorKind, PriorityBucket};

/// How many recent events the RED lapse rule inspects.
pub const RED_WINDOW: usize = 7;
/// How many recent events must be failure-free for GREEN.
pub const GREEN_WINDOW: usize = 5;
/// Lapses within [`RED_WINDOW`] that force RED.
pub const RED_LAPSE_THRESHOLD: usize = 2;
/// Consecutive passes required before GREEN is reachable.
pub const GREEN_REPETITIONS: i32 = 4;

/// One accepted ledger event, reduced to what classification needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSample {
    pub quality: u8,
    pub response_time_ms: i64,
}

impl ReviewSample {
    pub fn is_lapse(&self) -> bool {
        self.quality < PASSING_QUALITY
    }
}

/// Response-time cutoffs for the error-kind annotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierThresholds {
    /// Correct answers slower than this look like uncertain recall.
    pub slow_response_ms: i64,
    /// Wrong answers faster than this look like slips.
    pub fast_response_ms: i64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            slow_response_ms: 5000,
            fast_response_ms: 2000,
        }
    }
}

/// Classification output plus the inputs that produced it, so dashboards
/// can explain the bucket without re-deriving it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub bucket: PriorityBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub recent_accuracy: f64,
    pub repetitions: i32,
}

/// Bucket an item from its repetition count, lifetime lapses and recent
/// samples (newest first).
///
/// RED: >= 2 lapses in the last 7 events, or a known gap (`repetitions == 0`
/// after at least one lifetime failure). GREEN: `repetitions >= 4` with no
/// failure in the last 5 events. Everything else is YELLOW, including
/// established items with a single recent stumble.
pub fn classify(
    repetitions: i32,
    lapses: i32,
    recent: &[ReviewSample],
    thresholds: &ClassifierThresholds,
) -> Classification {
    let window = &recent[..recent.len().min(RED_WINDOW)];
    let recent_lapses = window.iter().filter(|s| s.is_lapse()).count();

    let bucket = if recent_lapses >= RED_LAPSE_THRESHOLD || (repetitions == 0 && lapses > 0) {
        PriorityBucket::Red
    } else if repetitions >= GREEN_REPETITIONS
        && recent
            .iter()
            .take(GREEN_WINDOW)
            .all(|s| !s.is_lapse())
    {
        PriorityBucket::Green
    } else {
        PriorityBucket::Yellow
    };

    let error_kind = if bucket == PriorityBucket::Red {
        diagnose(repetitions, recent.first(), thresholds)
    } else {
        None
    };

    Classification {
        bucket,
        error_kind,
        recent_accuracy: recent_accuracy(window),
        repetitions,
    }
}

fn diagnose(
    repetitions: i32,
    latest: Option<&ReviewSample>,
    thresholds: &ClassifierThresholds,
) -> Option<ErrorKind> {
    if repetitions == 0 {
        return Some(ErrorKind::KnowledgeGap);
    }
    let latest = latest?;
    if !latest.is_lapse()
        && latest.quality == PASSING_QUALITY
        && latest.response_time_ms > thresholds.slow_response_ms
    {
        return Some(ErrorKind::ProcessError);
    }
    if latest.is_lapse() && latest.response_time_ms < thresholds.fast_response_ms {
        return Some(ErrorKind::CarelessError);
    }
    None
}

fn recent_accuracy(window: &[ReviewSample]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let passes = window.iter().filter(|s| !s.is_lapse()).count();
    passes as f64 / window.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(ms: i64) -> ReviewSample {
        ReviewSample {
            quality: 4,
            response_time_ms: ms,
        }
    }

    fn fail(ms: i64) -> ReviewSample {
        ReviewSample {
            quality: 1,
            response_time_ms: ms,
        }
    }

    #[test]
    fn established_item_is_green() {
        let recent = vec![pass(1500); 5];
        let c = classify(4, 0, &recent, &ClassifierThresholds::default());
        assert_eq!(c.bucket, PriorityBucket::Green);
        assert_eq!(c.error_kind, None);
        assert!((c.recent_accuracy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_recent_failure_demotes_green() {
        let recent = vec![fail(900), pass(1500), pass(1500), pass(1500), pass(1500)];
        let c = classify(4, 1, &recent, &ClassifierThresholds::default());
        assert_eq!(c.bucket, PriorityBucket::Yellow);
    }

    #[test]
    fn two_recent_lapses_force_red() {
        let recent = vec![
            fail(900),
            pass(1500),
            fail(4000),
            pass(1500),
            pass(1500),
            pass(1500),
            pass(1500),
        ];
        let c = classify(4, 2, &recent, &ClassifierThresholds::default());
        assert_eq!(c.bucket, PriorityBucket::Red);
        // fast wrong answer on the latest event
        assert_eq!(c.error_kind, Some(ErrorKind::CarelessError));
    }

    #[test]
    fn known_gap_is_red() {
        let recent = vec![fail(7000)];
        let c = classify(0, 1, &recent, &ClassifierThresholds::default());
        assert_eq!(c.bucket, PriorityBucket::Red);
        assert_eq!(c.error_kind, Some(ErrorKind::KnowledgeGap));
    }

    #[test]
    fn slow_correct_answer_marks_process_error() {
        let recent = vec![
            ReviewSample {
                quality: 3,
                response_time_ms: 9000,
            },
            fail(900),
            fail(900),
        ];
        let c = classify(2, 2, &recent, &ClassifierThresholds::default());
        assert_eq!(c.bucket, PriorityBucket::Red);
        assert_eq!(c.error_kind, Some(ErrorKind::ProcessError));
    }

    #[test]
    fn partially_learned_is_yellow() {
        let recent = vec![pass(1500), pass(1500)];
        let c = classify(2, 0, &recent, &ClassifierThresholds::default());
        assert_eq!(c.bucket, PriorityBucket::Yellow);
    }

    #[test]
    fn lapses_beyond_window_do_not_count() {
        // 8 events: the two failures are the oldest, outside the 7-window
        let mut recent = vec![pass(1500); 6];
        recent.push(fail(900));
        recent.push(fail(900));
        let c = classify(4, 2, &recent, &ClassifierThresholds::default());
        // one lapse inside the window of 7, none inside the window of 5
        assert_eq!(c.bucket, PriorityBucket::Green);
    }
}
