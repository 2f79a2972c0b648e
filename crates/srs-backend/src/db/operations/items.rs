use sqlx::{Row, SqlitePool};
use srs_algo::ItemType;

#[derive(Debug, Clone)]
pub struct ItemRow {
    pub id: String,
    pub item_type: ItemType,
    pub category: String,
}

pub async fn item_exists(pool: &SqlitePool, item_id: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(r#"SELECT 1 FROM items WHERE id = ? LIMIT 1"#)
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn count_items(pool: &SqlitePool, category: Option<&str>) -> Result<i64, sqlx::Error> {
    let row = match category {
        Some(category) => {
            sqlx::query(r#"SELECT COUNT(*) AS n FROM items WHERE category = ?"#)
                .bind(category)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query(r#"SELECT COUNT(*) AS n FROM items"#)
                .fetch_one(pool)
                .await?
        }
    };
    Ok(row.try_get::<i64, _>("n").unwrap_or(0))
}

pub async fn upsert_item(pool: &SqlitePool, item: &ItemRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO items (id, item_type, category)
        VALUES (?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            item_type = excluded.item_type,
            category = excluded.category
        "#,
    )
    .bind(&item.id)
    .bind(item.item_type.as_str())
    .bind(&item.category)
    .execute(pool)
    .await?;
    Ok(())
}
