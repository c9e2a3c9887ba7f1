use serde::{Deserialize, Serialize};

use super::{Epic, Subtask, Task, TaskId};

/// Everything needed to rebuild a board: the items of each kind plus the view
/// history (oldest first).
///
/// Epic subtask lists and derived fields are not trusted on load; they are
/// rebuilt from the subtasks' `epic_id`s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub epics: Vec<Epic>,
    pub subtasks: Vec<Subtask>,
    pub history: Vec<TaskId>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.epics.is_empty() && self.subtasks.is_empty()
    }
}
