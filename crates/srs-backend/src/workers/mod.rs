mod priority_recompute;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::Config;
use crate::db::Database;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}

pub struct WorkerManager {
    scheduler: Mutex<JobScheduler>,
    db: Arc<Database>,
    config: Arc<Config>,
}

impl WorkerManager {
    pub async fn new(db: Arc<Database>, config: Config) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            db,
            config: Arc::new(config),
        })
    }

    /// Workers run only on the leader instance; replicas serve reads and
    /// grade submissions without competing over the recompute schedule.
    pub async fn start(&self) -> Result<(), WorkerError> {
        let leader = std::env::var("WORKER_LEADER")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        if !leader {
            info!("WORKER_LEADER not set, skipping worker startup");
            return Ok(());
        }

        info!("starting workers (leader mode)");

        let db = Arc::clone(&self.db);
        let config = Arc::clone(&self.config);
        let cron = self.config.recompute_cron.clone();

        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let db = Arc::clone(&db);
            let config = Arc::clone(&config);
            Box::pin(async move {
                priority_recompute::run_once(&db, &config.thresholds).await;
            })
        })
        .map_err(WorkerError::Scheduler)?;

        let scheduler = self.scheduler.lock().await;
        scheduler.add(job).await?;
        scheduler.start().await?;
        info!(cron = %cron, "priority recompute worker scheduled");
        Ok(())
    }

    pub async fn stop(&self) {
        let mut scheduler = self.scheduler.lock().await;
        if let Err(err) = scheduler.shutdown().await {
            error!(error = %err, "worker scheduler shutdown failed");
        } else {
            info!("workers stopped");
        }
    }
}
