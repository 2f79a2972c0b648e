pub mod migrate;
pub mod operations;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::RwLock;

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub last_checked_ms: Option<i64>,
    pub latency_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl HealthSnapshot {
    fn unknown() -> Self {
        Self {
            healthy: true,
            last_checked_ms: None,
            latency_ms: None,
            last_error: None,
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    health: Arc<RwLock<HealthSnapshot>>,
}

impl Database {
    /// Open a pool without migrating or monitoring. Tests use this directly.
    pub async fn connect(url: &str) -> Result<Self, DbInitError> {
        let options: SqliteConnectOptions = url.parse::<SqliteConnectOptions>()?;

        // In-memory databases are per-connection; a wider pool would hand
        // each task its own empty database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            health: Arc::new(RwLock::new(HealthSnapshot::unknown())),
        })
    }

    /// Production entry point: connect, migrate, start the health probe.
    pub async fn init(url: &str) -> Result<Arc<Self>, DbInitError> {
        let db = Arc::new(Self::connect(url).await?);
        migrate::run(db.pool()).await.map_err(DbInitError::Migrate)?;
        db.start_health_monitor();
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_status(&self) -> HealthSnapshot {
        self.health.read().await.clone()
    }

    fn start_health_monitor(self: &Arc<Self>) {
        let db = Arc::clone(self);
        tokio::spawn(async move {
            db.health_monitor_loop().await;
        });
    }

    async fn health_monitor_loop(self: Arc<Self>) {
        loop {
            let started = std::time::Instant::now();
            let result = sqlx::query("SELECT 1").execute(&self.pool).await;
            let latency = started.elapsed().as_millis() as i64;
            let now_ms = chrono::Utc::now().timestamp_millis();

            {
                let mut snapshot = self.health.write().await;
                *snapshot = match result {
                    Ok(_) => HealthSnapshot {
                        healthy: true,
                        last_checked_ms: Some(now_ms),
                        latency_ms: Some(latency),
                        last_error: None,
                    },
                    Err(err) => HealthSnapshot {
                        healthy: false,
                        last_checked_ms: Some(now_ms),
                        latency_ms: None,
                        last_error: Some(err.to_string()),
                    },
                };
            }

            tokio::time::sleep(HEALTH_CHECK_INTERVAL).await;
        }
    }
}
