use chrono::{DateTime, Utc};
use srs_algo::ItemType;
use srs_backend::db::operations::items::{self, ItemRow};
use srs_backend::db::{migrate, Database};
use srs_backend::services::review::GradeSubmission;

/// Fresh in-memory engine store with a small catalog.
pub async fn setup() -> Database {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    migrate::run(db.pool()).await.expect("migrations");

    let catalog = [
        ("item-a", ItemType::Vocabulary, "vocabulary"),
        ("item-b", ItemType::Vocabulary, "vocabulary"),
        ("item-c", ItemType::Kanji, "kanji"),
        ("item-d", ItemType::Grammar, "grammar"),
    ];
    for (id, item_type, category) in catalog {
        items::upsert_item(
            db.pool(),
            &ItemRow {
                id: id.to_string(),
                item_type,
                category: category.to_string(),
            },
        )
        .await
        .expect("seed item");
    }

    db
}

pub fn submission(
    event_id: &str,
    user_id: &str,
    item_id: &str,
    quality: u8,
    submitted_at: DateTime<Utc>,
) -> GradeSubmission {
    GradeSubmission {
        event_id: event_id.to_string(),
        user_id: user_id.to_string(),
        item_id: item_id.to_string(),
        quality,
        response_time_ms: 1500,
        submitted_at,
    }
}
