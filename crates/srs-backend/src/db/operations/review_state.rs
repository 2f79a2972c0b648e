use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use srs_algo::{ItemType, ReviewState};

/// One `review_states` row with its owning keys.
#[derive(Debug, Clone)]
pub struct ReviewStateRow {
    pub user_id: String,
    pub item_id: String,
    pub state: ReviewState,
}

/// Due-queue projection: state fields the resolver orders on, joined with
/// the catalog type.
#[derive(Debug, Clone)]
pub struct DueRow {
    pub item_id: String,
    pub item_type: ItemType,
    pub due_at: DateTime<Utc>,
    pub lapses: i32,
}

/// State joined with the catalog category, for mastery aggregation.
#[derive(Debug, Clone)]
pub struct CategorizedStateRow {
    pub item_id: String,
    pub category: String,
    pub repetitions: i32,
    pub lapses: i32,
    pub last_quality: Option<u8>,
}

pub async fn get_state(
    executor: impl sqlx::SqliteExecutor<'_>,
    user_id: &str,
    item_id: &str,
) -> Result<Option<ReviewState>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT easiness_factor, interval_days, repetitions, lapses,
               due_at_ms, last_reviewed_at_ms, last_quality, version
        FROM review_states
        WHERE user_id = ? AND item_id = ?
        "#,
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| map_state(&r)))
}

/// Create the row for a first-ever grade. Returns false when another writer
/// created it first.
pub async fn insert_state(
    executor: impl sqlx::SqliteExecutor<'_>,
    user_id: &str,
    item_id: &str,
    state: &ReviewState,
    now_ms: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO review_states (
            user_id, item_id, easiness_factor, interval_days, repetitions,
            lapses, due_at_ms, last_reviewed_at_ms, last_quality, version,
            created_at_ms, updated_at_ms
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, item_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(item_id)
    .bind(state.easiness_factor)
    .bind(state.interval_days)
    .bind(state.repetitions)
    .bind(state.lapses)
    .bind(state.due_at.timestamp_millis())
    .bind(state.last_reviewed_at.map(|t| t.timestamp_millis()))
    .bind(state.last_quality.map(|q| q as i64))
    .bind(state.version)
    .bind(now_ms)
    .bind(now_ms)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Version-guarded write: succeeds only if the row still carries
/// `base_version`. Returns false on a lost race.
pub async fn update_state_guarded(
    executor: impl sqlx::SqliteExecutor<'_>,
    user_id: &str,
    item_id: &str,
    base_version: i64,
    state: &ReviewState,
    now_ms: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE review_states SET
            easiness_factor = ?,
            interval_days = ?,
            repetitions = ?,
            lapses = ?,
            due_at_ms = ?,
            last_reviewed_at_ms = ?,
            last_quality = ?,
            version = ?,
            updated_at_ms = ?
        WHERE user_id = ? AND item_id = ? AND version = ?
        "#,
    )
    .bind(state.easiness_factor)
    .bind(state.interval_days)
    .bind(state.repetitions)
    .bind(state.lapses)
    .bind(state.due_at.timestamp_millis())
    .bind(state.last_reviewed_at.map(|t| t.timestamp_millis()))
    .bind(state.last_quality.map(|q| q as i64))
    .bind(state.version)
    .bind(now_ms)
    .bind(user_id)
    .bind(item_id)
    .bind(base_version)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Due rows for a user, most overdue first, then problem items, then a
/// deterministic id tie-break. `item_types` narrows before ordering.
pub async fn list_due(
    pool: &SqlitePool,
    user_id: &str,
    now_ms: i64,
    item_types: &[ItemType],
    limit: i64,
) -> Result<Vec<DueRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT s.item_id, i.item_type, s.due_at_ms, s.lapses
        FROM review_states s
        JOIN items i ON i.id = s.item_id
        WHERE s.user_id =
        "#,
    );
    qb.push_bind(user_id);
    qb.push(" AND s.due_at_ms <= ");
    qb.push_bind(now_ms);
    if !item_types.is_empty() {
        qb.push(" AND i.item_type IN (");
        let mut separated = qb.separated(", ");
        for item_type in item_types {
            separated.push_bind(item_type.as_str());
        }
        separated.push_unseparated(")");
    }
    qb.push(" ORDER BY s.due_at_ms ASC, s.lapses DESC, s.item_id ASC LIMIT ");
    qb.push_bind(limit);

    let rows = qb.build().fetch_all(pool).await?;
    Ok(rows.iter().filter_map(map_due).collect())
}

/// Keyset-paginated scan of a user's states for the classifier full pass.
pub async fn list_states_page(
    pool: &SqlitePool,
    user_id: &str,
    after_item_id: Option<&str>,
    limit: i64,
) -> Result<Vec<ReviewStateRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT item_id, easiness_factor, interval_days, repetitions, lapses,
               due_at_ms, last_reviewed_at_ms, last_quality, version
        FROM review_states
        WHERE user_id = ? AND item_id > ?
        ORDER BY item_id ASC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(after_item_id.unwrap_or(""))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| ReviewStateRow {
            user_id: user_id.to_string(),
            item_id: r.try_get("item_id").unwrap_or_default(),
            state: map_state(r),
        })
        .collect())
}

pub async fn list_states_with_category(
    pool: &SqlitePool,
    user_id: &str,
    category: Option<&str>,
) -> Result<Vec<CategorizedStateRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT s.item_id, i.category, s.repetitions, s.lapses, s.last_quality
        FROM review_states s
        JOIN items i ON i.id = s.item_id
        WHERE s.user_id =
        "#,
    );
    qb.push_bind(user_id);
    if let Some(category) = category {
        qb.push(" AND i.category = ");
        qb.push_bind(category);
    }

    let rows = qb.build().fetch_all(pool).await?;
    Ok(rows
        .iter()
        .map(|r| CategorizedStateRow {
            item_id: r.try_get("item_id").unwrap_or_default(),
            category: r.try_get("category").unwrap_or_default(),
            repetitions: r.try_get::<i64, _>("repetitions").unwrap_or(0) as i32,
            lapses: r.try_get::<i64, _>("lapses").unwrap_or(0) as i32,
            last_quality: r
                .try_get::<Option<i64>, _>("last_quality")
                .ok()
                .flatten()
                .map(|q| q as u8),
        })
        .collect())
}

fn map_state(row: &sqlx::sqlite::SqliteRow) -> ReviewState {
    ReviewState {
        easiness_factor: row.try_get("easiness_factor").unwrap_or(srs_algo::INITIAL_EASINESS),
        interval_days: row.try_get::<i64, _>("interval_days").unwrap_or(0),
        repetitions: row.try_get::<i64, _>("repetitions").unwrap_or(0) as i32,
        lapses: row.try_get::<i64, _>("lapses").unwrap_or(0) as i32,
        due_at: ms_to_datetime(row.try_get::<i64, _>("due_at_ms").unwrap_or(0)),
        last_reviewed_at: row
            .try_get::<Option<i64>, _>("last_reviewed_at_ms")
            .ok()
            .flatten()
            .map(ms_to_datetime),
        last_quality: row
            .try_get::<Option<i64>, _>("last_quality")
            .ok()
            .flatten()
            .map(|q| q as u8),
        version: row.try_get::<i64, _>("version").unwrap_or(0),
    }
}

fn map_due(row: &sqlx::sqlite::SqliteRow) -> Option<DueRow> {
    let item_type = ItemType::parse(&row.try_get::<String, _>("item_type").ok()?)?;
    Some(DueRow {
        item_id: row.try_get("item_id").ok()?,
        item_type,
        due_at: ms_to_datetime(row.try_get::<i64, _>("due_at_ms").ok()?),
        lapses: row.try_get::<i64, _>("lapses").unwrap_or(0) as i32,
    })
}

pub(crate) fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}
