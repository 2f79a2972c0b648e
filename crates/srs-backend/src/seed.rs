//! Demo catalog seeding for local development, gated by `SEED_DEMO_DATA`.
//!
//! The `items` table belongs to the surrounding application's content
//! catalog; this exists so the engine can be exercised standalone.

use srs_algo::ItemType;
use tracing::info;

use crate::db::operations::items::{self, ItemRow};
use crate::db::Database;

pub fn seed_enabled() -> bool {
    std::env::var("SEED_DEMO_DATA")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

pub async fn seed_demo_items(db: &Database) -> Result<(), sqlx::Error> {
    let demo: &[(&str, ItemType, &str)] = &[
        ("vocab-taberu", ItemType::Vocabulary, "vocabulary"),
        ("vocab-nomu", ItemType::Vocabulary, "vocabulary"),
        ("vocab-iku", ItemType::Vocabulary, "vocabulary"),
        ("kanji-4e00", ItemType::Kanji, "kanji"),
        ("kanji-65e5", ItemType::Kanji, "kanji"),
        ("grammar-te-form", ItemType::Grammar, "grammar"),
        ("grammar-potential", ItemType::Grammar, "grammar"),
        ("card-greetings-01", ItemType::Flashcard, "flashcard"),
    ];

    for (id, item_type, category) in demo {
        items::upsert_item(
            db.pool(),
            &ItemRow {
                id: (*id).to_string(),
                item_type: *item_type,
                category: (*category).to_string(),
            },
        )
        .await?;
    }

    info!(count = demo.len(), "demo items seeded");
    Ok(())
}
