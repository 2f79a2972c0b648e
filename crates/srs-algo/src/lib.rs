//! # srs-algo - spaced repetition core algorithms
//!
//! Pure Rust implementation of the scheduling engine's math:
//!
//! - **SM-2 Scheduler** - deterministic forgetting-curve state transitions
//! - **Priority Classifier** - RED/YELLOW/GREEN urgency buckets
//! - **Mastery & Streak** - derived aggregates over review history
//!
//! No I/O, no async, no randomness: every function is a pure mapping from
//! inputs to outputs so the backend can call it from any number of
//! concurrent tasks and tests can assert exact values.
//!
//! ## Modules
//!
//! - [`scheduler`] - `ReviewState` and the SM-2 `grade` transition
//! - [`priority`] - bucket classification over recent review samples
//! - [`mastery`] - mastery predicate and calendar-day streaks
//! - [`types`] - shared wire enums (`ItemType`, `PriorityBucket`, ...)

pub mod mastery;
pub mod priority;
pub mod scheduler;
pub mod types;

pub use mastery::{current_streak, is_mastery_candidate, StreakResult, MASTERY_REPETITIONS};
pub use priority::{classify, Classification, ClassifierThresholds, ReviewSample};
pub use scheduler::{
    grade, GradeError, ReviewState, INITIAL_EASINESS, MAX_EASINESS, MAX_INTERVAL_DAYS,
    MIN_EASINESS,
};
pub use types::{ErrorKind, ItemType, PriorityBucket};
