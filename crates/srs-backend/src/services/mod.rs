pub mod due_queue;
pub mod mastery;
pub mod priority;
pub mod review;

use thiserror::Error;

/// Engine error taxonomy. Duplicate events are not in here: an idempotent
/// replay is a successful no-op, reported through `GradeOutcome::accepted`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("quality {0} outside accepted range 0-5")]
    InvalidGrade(u8),
    #[error("concurrent update conflict for item {item_id} after {attempts} attempts")]
    ConcurrentUpdateConflict { item_id: String, attempts: u32 },
    #[error("item {0} not found in catalog")]
    ItemNotFound(String),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<srs_algo::GradeError> for EngineError {
    fn from(err: srs_algo::GradeError) -> Self {
        match err {
            srs_algo::GradeError::InvalidGrade(q) => Self::InvalidGrade(q),
        }
    }
}
