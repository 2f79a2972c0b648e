use sqlx::{Row, SqlitePool};
use srs_algo::{ErrorKind, PriorityBucket};

#[derive(Debug, Clone)]
pub struct PriorityCacheRow {
    pub item_id: String,
    pub bucket: PriorityBucket,
    pub error_kind: Option<ErrorKind>,
    pub recent_accuracy: f64,
    pub repetitions: i32,
    pub days_since_review: Option<f64>,
    pub recomputed_at_ms: i64,
}

/// Swap a user's cached matrix atomically: the full pass replaces, never
/// patches, so the cache can not drift from the ledger.
pub async fn replace_for_user(
    pool: &SqlitePool,
    user_id: &str,
    entries: &[PriorityCacheRow],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(r#"DELETE FROM priority_cache WHERE user_id = ?"#)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO priority_cache (
                user_id, item_id, bucket, error_kind, recent_accuracy,
                repetitions, days_since_review, recomputed_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&entry.item_id)
        .bind(entry.bucket.as_str())
        .bind(entry.error_kind.map(|k| k.as_str()))
        .bind(entry.recent_accuracy)
        .bind(entry.repetitions)
        .bind(entry.days_since_review)
        .bind(entry.recomputed_at_ms)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<PriorityCacheRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT item_id, bucket, error_kind, recent_accuracy, repetitions,
               days_since_review, recomputed_at_ms
        FROM priority_cache
        WHERE user_id = ?
        ORDER BY item_id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().filter_map(map_row).collect())
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Option<PriorityCacheRow> {
    let bucket = PriorityBucket::parse(&row.try_get::<String, _>("bucket").ok()?)?;
    let error_kind = row
        .try_get::<Option<String>, _>("error_kind")
        .ok()
        .flatten()
        .and_then(|raw| ErrorKind::parse(&raw));

    Some(PriorityCacheRow {
        item_id: row.try_get("item_id").ok()?,
        bucket,
        error_kind,
        recent_accuracy: row.try_get("recent_accuracy").unwrap_or(0.0),
        repetitions: row.try_get::<i64, _>("repetitions").unwrap_or(0) as i32,
        days_since_review: row.try_get::<Option<f64>, _>("days_since_review").ok().flatten(),
        recomputed_at_ms: row.try_get::<i64, _>("recomputed_at_ms").unwrap_or(0),
    })
}
