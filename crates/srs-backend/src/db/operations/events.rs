use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use srs_algo::ReviewSample;

use super::review_state::ms_to_datetime;

/// Immutable ledger entry as stored. `created_at` is the server receipt
/// time and the ordering key; `submitted_at` is the untrusted client clock,
/// kept for display.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub item_id: String,
    pub quality: u8,
    pub response_time_ms: i64,
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub resulting_version: i64,
}

#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub event_id: &'a str,
    pub item_id: &'a str,
    pub quality: u8,
    pub response_time_ms: i64,
    pub submitted_at_ms: i64,
    pub created_at_ms: i64,
    pub resulting_version: i64,
}

/// Append to the ledger. Returns false when `(user_id, event_id)` already
/// exists, the idempotent duplicate case, not an error.
pub async fn insert_event(
    executor: impl sqlx::SqliteExecutor<'_>,
    event: &NewEvent<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO review_events (
            id, user_id, event_id, item_id, quality, response_time_ms,
            submitted_at_ms, created_at_ms, resulting_version
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, event_id) DO NOTHING
        "#,
    )
    .bind(event.id)
    .bind(event.user_id)
    .bind(event.event_id)
    .bind(event.item_id)
    .bind(event.quality as i64)
    .bind(event.response_time_ms)
    .bind(event.submitted_at_ms)
    .bind(event.created_at_ms)
    .bind(event.resulting_version)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Recent samples for one item, newest first (server receipt order).
pub async fn recent_samples_for_item(
    pool: &SqlitePool,
    user_id: &str,
    item_id: &str,
    limit: i64,
) -> Result<Vec<ReviewSample>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT quality, response_time_ms
        FROM review_events
        WHERE user_id = ? AND item_id = ?
        ORDER BY created_at_ms DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(item_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_sample).collect())
}

/// Recent samples for many items in one query, newest first per item.
/// The window is bounded in SQL: at most `per_item_limit` rows come back
/// per item regardless of how long the ledger is.
pub async fn recent_samples_batch(
    pool: &SqlitePool,
    user_id: &str,
    item_ids: &[String],
    per_item_limit: usize,
) -> Result<HashMap<String, Vec<ReviewSample>>, sqlx::Error> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT item_id, quality, response_time_ms FROM (
            SELECT item_id, quality, response_time_ms,
                   ROW_NUMBER() OVER (
                       PARTITION BY item_id
                       ORDER BY created_at_ms DESC, id DESC
                   ) AS recency_rank
            FROM review_events
            WHERE user_id =
        "#,
    );
    qb.push_bind(user_id);
    qb.push(" AND item_id IN (");
    let mut separated = qb.separated(", ");
    for id in item_ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");
    qb.push(" ) WHERE recency_rank <= ");
    qb.push_bind(per_item_limit as i64);
    qb.push(" ORDER BY item_id ASC, recency_rank ASC");

    let rows = qb.build().fetch_all(pool).await?;

    let mut map: HashMap<String, Vec<ReviewSample>> = HashMap::new();
    for row in &rows {
        let item_id = row.try_get::<String, _>("item_id").unwrap_or_default();
        map.entry(item_id).or_default().push(map_sample(row));
    }
    Ok(map)
}

/// Receipt timestamps of a user's accepted events since a cutoff, for
/// streak computation.
pub async fn event_times_since(
    pool: &SqlitePool,
    user_id: &str,
    since_ms: i64,
) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT created_at_ms
        FROM review_events
        WHERE user_id = ? AND created_at_ms >= ?
        ORDER BY created_at_ms ASC
        "#,
    )
    .bind(user_id)
    .bind(since_ms)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .filter_map(|r| r.try_get::<i64, _>("created_at_ms").ok())
        .map(ms_to_datetime)
        .collect())
}

/// Audit read: a user's events for one item, newest first.
pub async fn list_events_for_item(
    pool: &SqlitePool,
    user_id: &str,
    item_id: &str,
    limit: i64,
) -> Result<Vec<EventRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, event_id, item_id, quality, response_time_ms,
               submitted_at_ms, created_at_ms, resulting_version
        FROM review_events
        WHERE user_id = ? AND item_id = ?
        ORDER BY created_at_ms DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(item_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_event).collect())
}

/// Users with ledger activity since a cutoff; drives the recompute worker.
pub async fn users_active_since(
    pool: &SqlitePool,
    since_ms: i64,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT user_id
        FROM review_events
        WHERE created_at_ms >= ?
        ORDER BY user_id ASC
        "#,
    )
    .bind(since_ms)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .filter_map(|r| r.try_get::<String, _>("user_id").ok())
        .collect())
}

fn map_sample(row: &sqlx::sqlite::SqliteRow) -> ReviewSample {
    ReviewSample {
        quality: row.try_get::<i64, _>("quality").unwrap_or(0) as u8,
        response_time_ms: row.try_get::<i64, _>("response_time_ms").unwrap_or(0),
    }
}

fn map_event(row: &sqlx::sqlite::SqliteRow) -> EventRow {
    EventRow {
        id: row.try_get("id").unwrap_or_default(),
        user_id: row.try_get("user_id").unwrap_or_default(),
        event_id: row.try_get("event_id").unwrap_or_default(),
        item_id: row.try_get("item_id").unwrap_or_default(),
        quality: row.try_get::<i64, _>("quality").unwrap_or(0) as u8,
        response_time_ms: row.try_get::<i64, _>("response_time_ms").unwrap_or(0),
        submitted_at: ms_to_datetime(row.try_get::<i64, _>("submitted_at_ms").unwrap_or(0)),
        created_at: ms_to_datetime(row.try_get::<i64, _>("created_at_ms").unwrap_or(0)),
        resulting_version: row.try_get::<i64, _>("resulting_version").unwrap_or(0),
    }
}
