//! Idempotent schema creation for the engine's four tables.
//!
//! The `items` catalog table is owned by the surrounding application; it is
//! created here as well so the engine runs standalone, but the engine never
//! writes to it outside of seeding.

use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        item_type TEXT NOT NULL,
        category TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS review_states (
        user_id TEXT NOT NULL,
        item_id TEXT NOT NULL,
        easiness_factor REAL NOT NULL,
        interval_days INTEGER NOT NULL,
        repetitions INTEGER NOT NULL,
        lapses INTEGER NOT NULL,
        due_at_ms INTEGER NOT NULL,
        last_reviewed_at_ms INTEGER,
        last_quality INTEGER,
        version INTEGER NOT NULL,
        created_at_ms INTEGER NOT NULL,
        updated_at_ms INTEGER NOT NULL,
        PRIMARY KEY (user_id, item_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_review_states_due
        ON review_states (user_id, due_at_ms)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS review_events (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        event_id TEXT NOT NULL,
        item_id TEXT NOT NULL,
        quality INTEGER NOT NULL,
        response_time_ms INTEGER NOT NULL,
        submitted_at_ms INTEGER NOT NULL,
        created_at_ms INTEGER NOT NULL,
        resulting_version INTEGER NOT NULL,
        UNIQUE (user_id, event_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_review_events_item
        ON review_events (user_id, item_id, created_at_ms DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS priority_cache (
        user_id TEXT NOT NULL,
        item_id TEXT NOT NULL,
        bucket TEXT NOT NULL,
        error_kind TEXT,
        recent_accuracy REAL NOT NULL,
        repetitions INTEGER NOT NULL,
        days_since_review REAL,
        recomputed_at_ms INTEGER NOT NULL,
        PRIMARY KEY (user_id, item_id)
    )
    "#,
];

pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("database schema up to date");
    Ok(())
}
