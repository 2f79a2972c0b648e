mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use srs_algo::{ClassifierThresholds, ErrorKind, ItemType, PriorityBucket, ReviewState};
use srs_backend::db::operations::{events, review_state};
use srs_backend::services::review::{self, MAX_APPLY_ATTEMPTS};
use srs_backend::services::{due_queue, mastery, priority, EngineError};

use common::{setup, submission};

#[tokio::test]
async fn first_grade_creates_state() {
    let db = setup().await;
    let now = Utc::now();

    let outcome = review::submit_review(&db, &submission("e1", "u1", "item-a", 5, now), now)
        .await
        .expect("submit");

    assert!(outcome.accepted);
    assert_eq!(outcome.state.repetitions, 1);
    assert_eq!(outcome.state.interval_days, 1);
    assert!((outcome.state.easiness_factor - 2.6).abs() < 1e-9);
    assert_eq!(outcome.state.version, 1);

    let stored = review_state::get_state(db.pool(), "u1", "item-a")
        .await
        .expect("read")
        .expect("row exists");
    assert_eq!(stored.version, 1);
    assert_eq!(stored.repetitions, 1);
}

#[tokio::test]
async fn duplicate_event_id_is_idempotent() {
    let db = setup().await;
    let now = Utc::now();

    let first = review::submit_review(&db, &submission("e1", "u1", "item-a", 4, now), now)
        .await
        .expect("first");
    assert!(first.accepted);

    // Retried submission with the same event id, even with a different grade.
    let second = review::submit_review(&db, &submission("e1", "u1", "item-a", 0, now), now)
        .await
        .expect("second");
    assert!(!second.accepted);
    assert_eq!(second.state.version, 1);
    assert_eq!(second.state.repetitions, 1);

    let history = review::item_history(&db, "u1", "item-a", 10)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].resulting_version, 1);
}

#[tokio::test]
async fn unknown_item_is_rejected_without_state() {
    let db = setup().await;
    let now = Utc::now();

    let err = review::submit_review(&db, &submission("e1", "u1", "item-zz", 5, now), now)
        .await
        .expect_err("must fail");
    assert!(matches!(err, EngineError::ItemNotFound(_)));

    let stored = review_state::get_state(db.pool(), "u1", "item-zz")
        .await
        .expect("read");
    assert!(stored.is_none());
}

#[tokio::test]
async fn out_of_range_quality_is_rejected() {
    let db = setup().await;
    let now = Utc::now();

    let err = review::submit_review(&db, &submission("e1", "u1", "item-a", 6, now), now)
        .await
        .expect_err("must fail");
    assert!(matches!(err, EngineError::InvalidGrade(6)));

    let history = review::item_history(&db, "u1", "item-a", 10)
        .await
        .expect("history");
    assert!(history.is_empty());
}

#[tokio::test]
async fn concurrent_submissions_both_apply_exactly_once() {
    let db = Arc::new(setup().await);
    let now = Utc::now();

    let db_a = Arc::clone(&db);
    let db_b = Arc::clone(&db);
    let task_a = tokio::spawn(async move {
        review::submit_review(&db_a, &submission("e1", "u1", "item-a", 5, now), now).await
    });
    let task_b = tokio::spawn(async move {
        review::submit_review(&db_b, &submission("e2", "u1", "item-a", 4, now), now).await
    });

    let outcome_a = task_a.await.expect("join").expect("submit a");
    let outcome_b = task_b.await.expect("join").expect("submit b");
    assert!(outcome_a.accepted);
    assert!(outcome_b.accepted);

    // Exactly two accepted events, versions 1 and 2, no double-apply.
    let stored = review_state::get_state(db.pool(), "u1", "item-a")
        .await
        .expect("read")
        .expect("row exists");
    assert_eq!(stored.version, 2);

    let mut versions: Vec<i64> = review::item_history(&db, "u1", "item-a", 10)
        .await
        .expect("history")
        .iter()
        .map(|e| e.resulting_version)
        .collect();
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2]);
    assert!(MAX_APPLY_ATTEMPTS >= 2);
}

#[tokio::test]
async fn stale_version_write_fails_and_resubmission_converges() {
    let db = setup().await;
    let now = Utc::now();

    let first = review::submit_review(&db, &submission("e1", "u1", "item-a", 4, now), now)
        .await
        .expect("submit");
    let base = first.state;
    assert_eq!(base.version, 1);

    // another writer lands first: version moves to 2
    let winner = srs_algo::grade(&base, 4, now).expect("grade");
    assert!(
        review_state::update_state_guarded(
            db.pool(),
            "u1",
            "item-a",
            base.version,
            &winner,
            now.timestamp_millis(),
        )
        .await
        .expect("guarded write")
    );

    // a write still guarded by the stale version must be rejected
    let loser = srs_algo::grade(&base, 2, now).expect("grade");
    assert!(
        !review_state::update_state_guarded(
            db.pool(),
            "u1",
            "item-a",
            base.version,
            &loser,
            now.timestamp_millis(),
        )
        .await
        .expect("guarded write")
    );
    let stored = review_state::get_state(db.pool(), "u1", "item-a")
        .await
        .expect("read")
        .expect("row exists");
    assert_eq!(stored.version, 2);
    assert_eq!(stored.lapses, 0);

    // a fresh submission re-reads and lands on top of the winning write
    let outcome = review::submit_review(&db, &submission("e2", "u1", "item-a", 4, now), now)
        .await
        .expect("submit");
    assert!(outcome.accepted);
    assert_eq!(outcome.state.version, 3);
}

#[tokio::test]
async fn due_queue_orders_most_overdue_first() {
    let db = setup().await;
    let now = Utc::now();
    let now_ms = now.timestamp_millis();

    for (item_id, days_overdue, lapses) in
        [("item-a", 2i64, 0), ("item-b", 5, 0), ("item-c", 1, 3)]
    {
        let state = ReviewState {
            easiness_factor: 2.5,
            interval_days: 1,
            repetitions: 1,
            lapses,
            due_at: now - Duration::days(days_overdue),
            last_reviewed_at: Some(now - Duration::days(days_overdue + 1)),
            last_quality: Some(4),
            version: 1,
        };
        assert!(
            review_state::insert_state(db.pool(), "u1", item_id, &state, now_ms)
                .await
                .expect("insert state")
        );
    }

    let due = due_queue::get_due(&db, "u1", now, 10, &[], false)
        .await
        .expect("due");
    let ids: Vec<&str> = due.iter().map(|d| d.item_id.as_str()).collect();
    assert_eq!(ids, vec!["item-b", "item-a", "item-c"]);

    // limit truncates after ordering
    let capped = due_queue::get_due(&db, "u1", now, 2, &[], false)
        .await
        .expect("due");
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].item_id, "item-b");

    // type filter applies before ordering
    let kanji_only = due_queue::get_due(&db, "u1", now, 10, &[ItemType::Kanji], false)
        .await
        .expect("due");
    let ids: Vec<&str> = kanji_only.iter().map(|d| d.item_id.as_str()).collect();
    assert_eq!(ids, vec!["item-c"]);
}

#[tokio::test]
async fn lapses_break_due_queue_ties() {
    let db = setup().await;
    let now = Utc::now();
    let now_ms = now.timestamp_millis();
    let due_at = now - Duration::days(3);

    for (item_id, lapses) in [("item-a", 0), ("item-b", 4)] {
        let state = ReviewState {
            easiness_factor: 2.5,
            interval_days: 1,
            repetitions: 1,
            lapses,
            due_at,
            last_reviewed_at: Some(due_at - Duration::days(1)),
            last_quality: Some(3),
            version: 1,
        };
        review_state::insert_state(db.pool(), "u1", item_id, &state, now_ms)
            .await
            .expect("insert state");
    }

    let due = due_queue::get_due(&db, "u1", now, 10, &[], false)
        .await
        .expect("due");
    let ids: Vec<&str> = due.iter().map(|d| d.item_id.as_str()).collect();
    assert_eq!(ids, vec!["item-b", "item-a"]);
}

#[tokio::test]
async fn unseen_and_future_items_are_not_due() {
    let db = setup().await;
    let now = Utc::now();

    // item-a scheduled in the future, item-b untouched
    let state = ReviewState {
        easiness_factor: 2.5,
        interval_days: 6,
        repetitions: 2,
        lapses: 0,
        due_at: now + Duration::days(6),
        last_reviewed_at: Some(now),
        last_quality: Some(5),
        version: 2,
    };
    review_state::insert_state(db.pool(), "u1", "item-a", &state, now.timestamp_millis())
        .await
        .expect("insert state");

    let due = due_queue::get_due(&db, "u1", now, 10, &[], false)
        .await
        .expect("due");
    assert!(due.is_empty());
}

#[tokio::test]
async fn mastery_counts_by_category() {
    let db = setup().await;
    let now = Utc::now();
    let thresholds = ClassifierThresholds::default();

    // item-a: four passes -> mastered
    for (i, event_id) in ["a1", "a2", "a3", "a4"].iter().enumerate() {
        let at = now - Duration::days(4 - i as i64);
        review::submit_review(&db, &submission(event_id, "u1", "item-a", 5, at), at)
            .await
            .expect("submit");
    }
    // item-b: one pass -> in progress
    review::submit_review(&db, &submission("b1", "u1", "item-b", 4, now), now)
        .await
        .expect("submit");

    let all = mastery::compute_mastery(&db, &thresholds, "u1", None)
        .await
        .expect("mastery");
    assert_eq!(all.mastered_count, 1);
    assert_eq!(all.in_progress_count, 1);
    // four catalog items, two tracked
    assert_eq!(all.new_count, 2);

    let vocab = mastery::compute_mastery(&db, &thresholds, "u1", Some("vocabulary"))
        .await
        .expect("mastery");
    assert_eq!(vocab.mastered_count, 1);
    assert_eq!(vocab.in_progress_count, 1);
    assert_eq!(vocab.new_count, 0);

    let kanji = mastery::compute_mastery(&db, &thresholds, "u1", Some("kanji"))
        .await
        .expect("mastery");
    assert_eq!(kanji.mastered_count, 0);
    assert_eq!(kanji.new_count, 1);
}

#[tokio::test]
async fn recent_failure_revokes_mastered_status() {
    let db = setup().await;
    let now = Utc::now();
    let thresholds = ClassifierThresholds::default();

    for (i, event_id) in ["a1", "a2", "a3", "a4"].iter().enumerate() {
        let at = now - Duration::days(8 - i as i64);
        review::submit_review(&db, &submission(event_id, "u1", "item-a", 5, at), at)
            .await
            .expect("submit");
    }
    let before = mastery::compute_mastery(&db, &thresholds, "u1", None)
        .await
        .expect("mastery");
    assert_eq!(before.mastered_count, 1);

    // a failure resets repetitions; the item is no longer a candidate
    review::submit_review(&db, &submission("a5", "u1", "item-a", 1, now), now)
        .await
        .expect("submit");
    let after = mastery::compute_mastery(&db, &thresholds, "u1", None)
        .await
        .expect("mastery");
    assert_eq!(after.mastered_count, 0);
    assert_eq!(after.in_progress_count, 1);
}

#[tokio::test]
async fn streak_counts_consecutive_days() {
    let db = setup().await;
    let now = Utc::now();

    for (event_id, days_ago) in [("e1", 2i64), ("e2", 1), ("e3", 0)] {
        let at = now - Duration::days(days_ago);
        review::submit_review(&db, &submission(event_id, "u1", "item-a", 4, at), at)
            .await
            .expect("submit");
    }

    let streak = mastery::compute_streak(&db, "u1", now, 0)
        .await
        .expect("streak");
    assert_eq!(streak.current_streak, 3);

    let none = mastery::compute_streak(&db, "u2", now, 0)
        .await
        .expect("streak");
    assert_eq!(none.current_streak, 0);
    assert_eq!(none.last_active_date, None);
}

#[tokio::test]
async fn priority_green_then_red_after_failure() {
    let db = setup().await;
    let thresholds = ClassifierThresholds::default();
    let now = Utc::now();

    // five clean passes -> repetitions 5, all recent events passing
    for (i, event_id) in ["p1", "p2", "p3", "p4", "p5"].iter().enumerate() {
        let at = now - Duration::days(10 - i as i64);
        review::submit_review(&db, &submission(event_id, "u1", "item-a", 4, at), at)
            .await
            .expect("submit");
    }

    let matrix = priority::recompute(&db, &thresholds, "u1", now)
        .await
        .expect("recompute");
    assert_eq!(matrix.entries.len(), 1);
    assert_eq!(matrix.entries[0].bucket, PriorityBucket::Green);

    // one failure resets repetitions -> known gap -> RED
    review::submit_review(&db, &submission("p6", "u1", "item-a", 1, now), now)
        .await
        .expect("submit");
    let matrix = priority::recompute(&db, &thresholds, "u1", now)
        .await
        .expect("recompute");
    assert_eq!(matrix.entries[0].bucket, PriorityBucket::Red);
    assert_eq!(matrix.entries[0].error_kind, Some(ErrorKind::KnowledgeGap));
}

#[tokio::test]
async fn priority_cache_round_trips() {
    let db = setup().await;
    let thresholds = ClassifierThresholds::default();
    let now = Utc::now();

    review::submit_review(&db, &submission("e1", "u1", "item-a", 4, now), now)
        .await
        .expect("submit");
    review::submit_review(&db, &submission("e2", "u1", "item-c", 1, now), now)
        .await
        .expect("submit");

    let computed = priority::recompute(&db, &thresholds, "u1", now)
        .await
        .expect("recompute");
    assert_eq!(computed.entries.len(), 2);

    let cached = priority::get_matrix(&db, "u1").await.expect("cached");
    assert_eq!(cached.entries.len(), 2);
    assert!(cached.recomputed_at.is_some());

    let red: Vec<&str> = cached
        .entries
        .iter()
        .filter(|e| e.bucket == PriorityBucket::Red)
        .map(|e| e.item_id.as_str())
        .collect();
    assert_eq!(red, vec!["item-c"]);
}

#[tokio::test]
async fn empty_matrix_has_no_recompute_timestamp() {
    let db = setup().await;
    let matrix = priority::get_matrix(&db, "nobody").await.expect("matrix");
    assert!(matrix.entries.is_empty());
    assert!(matrix.recomputed_at.is_none());
}

#[tokio::test]
async fn batched_sample_reads_stay_within_the_window() {
    let db = setup().await;
    let now = Utc::now();

    // ten events; only the newest one is a failure
    for i in 0..10i64 {
        let at = now - Duration::days(9 - i);
        let quality = if i == 9 { 1 } else { 4 };
        review::submit_review(
            &db,
            &submission(&format!("e{i}"), "u1", "item-a", quality, at),
            at,
        )
        .await
        .expect("submit");
    }

    let samples =
        events::recent_samples_batch(db.pool(), "u1", &["item-a".to_string()], 3)
            .await
            .expect("batch read");
    let window = &samples["item-a"];
    assert_eq!(window.len(), 3);
    // newest first: the failing event leads the window
    assert_eq!(window[0].quality, 1);
    assert_eq!(window[1].quality, 4);
    assert_eq!(window[2].quality, 4);
}

#[tokio::test]
async fn ledger_keeps_full_event_trail() {
    let db = setup().await;
    let now = Utc::now();

    for (event_id, quality, days_ago) in [("e1", 5u8, 2i64), ("e2", 2, 1), ("e3", 4, 0)] {
        let at = now - Duration::days(days_ago);
        review::submit_review(&db, &submission(event_id, "u1", "item-a", quality, at), at)
            .await
            .expect("submit");
    }

    let history = review::item_history(&db, "u1", "item-a", 10)
        .await
        .expect("history");
    assert_eq!(history.len(), 3);
    // newest first, versions monotone down the trail
    assert_eq!(history[0].event_id, "e3");
    assert_eq!(history[0].resulting_version, 3);
    assert_eq!(history[2].event_id, "e1");
    assert_eq!(history[2].resulting_version, 1);

    let samples = events::recent_samples_for_item(db.pool(), "u1", "item-a", 2)
        .await
        .expect("samples");
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].quality, 4);
    assert_eq!(samples[1].quality, 2);
}
