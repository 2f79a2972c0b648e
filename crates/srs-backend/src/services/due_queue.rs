//! Due-queue resolution: read-only, deterministic ordering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use srs_algo::ItemType;

use crate::db::operations::review_state;
use crate::db::Database;
use crate::services::EngineError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueItem {
    pub item_id: String,
    pub item_type: ItemType,
    pub due_at: DateTime<Utc>,
    pub overdue_days: f64,
    pub lapses: i32,
}

/// Items whose review is due at `now`, most overdue first, then highest
/// lapses, then item id. Unseen items have no state row and are never
/// returned; introducing them into a session is the caller's policy.
///
/// `interleave` optionally round-robins across item types after the urgency
/// sort so one type cannot monopolize a capped session.
pub async fn get_due(
    db: &Database,
    user_id: &str,
    now: DateTime<Utc>,
    limit: i64,
    item_types: &[ItemType],
    interleave: bool,
) -> Result<Vec<DueItem>, EngineError> {
    let rows = review_state::list_due(
        db.pool(),
        user_id,
        now.timestamp_millis(),
        item_types,
        limit.max(0),
    )
    .await?;

    let mut due: Vec<DueItem> = rows
        .into_iter()
        .map(|row| {
            let overdue_ms = (now - row.due_at).num_milliseconds().max(0);
            DueItem {
                item_id: row.item_id,
                item_type: row.item_type,
                due_at: row.due_at,
                overdue_days: overdue_ms as f64 / 86_400_000.0,
                lapses: row.lapses,
            }
        })
        .collect();

    if interleave {
        due = interleave_types(due);
    }

    Ok(due)
}

/// Round-robin across item types, preserving the urgency order within each
/// type.
fn interleave_types(items: Vec<DueItem>) -> Vec<DueItem> {
    let mut lanes: Vec<(ItemType, std::collections::VecDeque<DueItem>)> = Vec::new();
    for item in items {
        match lanes.iter_mut().find(|(t, _)| *t == item.item_type) {
            Some((_, lane)) => lane.push_back(item),
            None => {
                let mut lane = std::collections::VecDeque::new();
                let item_type = item.item_type;
                lane.push_back(item);
                lanes.push((item_type, lane));
            }
        }
    }

    let total: usize = lanes.iter().map(|(_, lane)| lane.len()).sum();
    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        for (_, lane) in lanes.iter_mut() {
            if let Some(item) = lane.pop_front() {
                out.push(item);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, item_type: ItemType) -> DueItem {
        DueItem {
            item_id: id.to_string(),
            item_type,
            due_at: Utc.timestamp_opt(0, 0).unwrap(),
            overdue_days: 0.0,
            lapses: 0,
        }
    }

    #[test]
    fn interleave_alternates_types() {
        let items = vec![
            item("v1", ItemType::Vocabulary),
            item("v2", ItemType::Vocabulary),
            item("k1", ItemType::Kanji),
            item("v3", ItemType::Vocabulary),
            item("g1", ItemType::Grammar),
        ];
        let out = interleave_types(items);
        let ids: Vec<&str> = out.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "k1", "g1", "v2", "v3"]);
    }

    #[test]
    fn interleave_single_type_is_identity() {
        let items = vec![
            item("a", ItemType::Kanji),
            item("b", ItemType::Kanji),
            item("c", ItemType::Kanji),
        ];
        let out = interleave_types(items);
        let ids: Vec<&str> = out.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
