//! Periodic priority-matrix refresh for recently active users.

use chrono::{Duration, Utc};
use srs_algo::ClassifierThresholds;
use tracing::{info, warn};

use crate::db::operations::events;
use crate::db::Database;
use crate::services::priority;

/// Users with ledger activity inside this window get reclassified.
const ACTIVITY_WINDOW_HOURS: i64 = 24;

pub async fn run_once(db: &Database, thresholds: &ClassifierThresholds) {
    let now = Utc::now();
    let since = now - Duration::hours(ACTIVITY_WINDOW_HOURS);

    let users = match events::users_active_since(db.pool(), since.timestamp_millis()).await {
        Ok(users) => users,
        Err(err) => {
            warn!(error = %err, "priority recompute: could not list active users");
            return;
        }
    };

    if users.is_empty() {
        return;
    }

    info!(users = users.len(), "priority recompute pass starting");
    let mut failures = 0usize;
    for user_id in &users {
        if let Err(err) = priority::recompute(db, thresholds, user_id, now).await {
            failures += 1;
            warn!(user_id, error = %err, "priority recompute failed for user");
        }
    }
    info!(
        users = users.len(),
        failures,
        "priority recompute pass finished"
    );
}
