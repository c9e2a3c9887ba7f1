use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{minutes, Status, TaskId};

/// Input for creating a new task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Initial status. Defaults to `NEW` if not specified.
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, with = "minutes")]
    pub duration: Option<Duration>,
}

/// Input for creating a new epic.
///
/// There is no status or schedule here: both are derived from subtasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateEpicInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Input for creating a subtask under an existing epic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubtaskInput {
    pub epic_id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Initial status. Defaults to `NEW` if not specified.
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, with = "minutes")]
    pub duration: Option<Duration>,
}

/// A replacement schedule. Either field may be absent, which unschedules the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, with = "minutes")]
    pub duration: Option<Duration>,
}

/// Input for updating a task or subtask. All fields are optional for partial updates.
///
/// Status is not part of an update; use the dedicated status operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub name: Option<String>,
    pub description: Option<String>,
    /// New schedule. `None` keeps the current one.
    pub schedule: Option<ScheduleInput>,
}

/// Input for updating an epic. Only the text fields are editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEpicInput {
    pub name: Option<String>,
    pub description: Option<String>,
}
