//! Error types for taskboard-core.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::grid::GridError;
use crate::models::TaskId;

/// Refusals returned by [`TaskManager`](crate::TaskManager) operations.
///
/// These are caller-input problems, not transient faults; nothing retries them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("item not found: {0}")]
    NotFound(TaskId),

    #[error("epic not found: {0}")]
    InvalidReference(TaskId),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("schedule conflict: {minutes} min at {start} overlaps an existing reservation")]
    ScheduleConflict { start: NaiveDateTime, minutes: i64 },

    #[error("duplicate id on load: {0}")]
    DuplicateId(TaskId),
}

impl From<GridError> for TaskError {
    fn from(e: GridError) -> Self {
        Self::InvalidSchedule(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
