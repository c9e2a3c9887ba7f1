use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identity of a task, epic or subtask.
///
/// One counter is shared by all kinds, so an id alone is enough to find an
/// item wherever it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

/// Progress of a unit of work.
///
/// - `New`: Not started
/// - `InProgress`: Being worked on
/// - `Done`: Finished
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    New,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "IN_PROGRESS" => Some(Self::InProgress),
            "DONE" => Some(Self::Done),
            _ => None,
        }
    }
}

/// The three kinds of item the board tracks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Task,
    Epic,
    Subtask,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Epic => "EPIC",
            Self::Subtask => "SUBTASK",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TASK" => Some(Self::Task),
            "EPIC" => Some(Self::Epic),
            "SUBTASK" => Some(Self::Subtask),
            _ => None,
        }
    }
}

/// A plain unit of work.
///
/// Tasks with a start time and a non-zero duration hold a reservation in the
/// schedule grid for as long as they exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub status: Status,
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, with = "minutes")]
    pub duration: Option<Duration>,
}

impl Task {
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, self.duration)
    }
}

/// A unit of work made of subtasks.
///
/// Status, start time and duration are computed from the subtasks every time
/// one of them changes; there are no setters for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    status: Status,
    start_time: Option<NaiveDateTime>,
    #[serde(default, with = "minutes")]
    duration: Option<Duration>,
    #[serde(default)]
    subtask_ids: Vec<TaskId>,
}

impl Epic {
    /// A fresh epic: no subtasks, `NEW`, unscheduled.
    pub fn new(id: TaskId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            status: Status::New,
            start_time: None,
            duration: None,
            subtask_ids: Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, self.duration)
    }

    /// Subtask ids in the order they were added.
    pub fn subtask_ids(&self) -> &[TaskId] {
        &self.subtask_ids
    }

    pub(crate) fn apply_rollup(&mut self, rollup: &crate::rollup::Rollup) {
        self.status = rollup.status;
        self.start_time = rollup.start_time;
        self.duration = rollup.duration;
    }

    pub(crate) fn push_subtask(&mut self, id: TaskId) {
        if !self.subtask_ids.contains(&id) {
            self.subtask_ids.push(id);
        }
    }

    pub(crate) fn remove_subtask(&mut self, id: TaskId) {
        self.subtask_ids.retain(|sid| *sid != id);
    }

    pub(crate) fn clear_subtasks(&mut self) {
        self.subtask_ids.clear();
    }
}

/// A unit of work owned by an [`Epic`].
///
/// The owning epic is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: TaskId,
    epic_id: TaskId,
    pub name: String,
    pub description: String,
    pub status: Status,
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, with = "minutes")]
    pub duration: Option<Duration>,
}

impl Subtask {
    pub fn new(
        id: TaskId,
        epic_id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            epic_id,
            name: name.into(),
            description: description.into(),
            status: Status::New,
            start_time: None,
            duration: None,
        }
    }

    pub fn epic_id(&self) -> TaskId {
        self.epic_id
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, self.duration)
    }
}

/// Any item on the board, tagged with its kind.
///
/// Serialized with a `type` field (`TASK`, `EPIC`, `SUBTASK`) next to the
/// item's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Item {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl Item {
    pub fn id(&self) -> TaskId {
        match self {
            Self::Task(t) => t.id,
            Self::Epic(e) => e.id,
            Self::Subtask(s) => s.id,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Task(_) => ItemKind::Task,
            Self::Epic(_) => ItemKind::Epic,
            Self::Subtask(_) => ItemKind::Subtask,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Task(t) => &t.name,
            Self::Epic(e) => &e.name,
            Self::Subtask(s) => &s.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Task(t) => &t.description,
            Self::Epic(e) => &e.description,
            Self::Subtask(s) => &s.description,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Task(t) => t.status,
            Self::Epic(e) => e.status(),
            Self::Subtask(s) => s.status,
        }
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Task(t) => t.start_time,
            Self::Epic(e) => e.start_time(),
            Self::Subtask(s) => s.start_time,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Task(t) => t.duration,
            Self::Epic(e) => e.duration(),
            Self::Subtask(s) => s.duration,
        }
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time(), self.duration())
    }
}

impl From<Task> for Item {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<Epic> for Item {
    fn from(epic: Epic) -> Self {
        Self::Epic(epic)
    }
}

impl From<Subtask> for Item {
    fn from(subtask: Subtask) -> Self {
        Self::Subtask(subtask)
    }
}

fn end_time(start: Option<NaiveDateTime>, duration: Option<Duration>) -> Option<NaiveDateTime> {
    start?.checked_add_signed(duration?)
}

/// Serde adapter storing an optional [`Duration`] as whole minutes.
pub mod minutes {
    use chrono::Duration;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.num_minutes()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        match Option::<i64>::deserialize(d)? {
            None => Ok(None),
            Some(m) => Duration::try_minutes(m)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("duration of {m} minutes is out of range"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn out_of_range_minutes_are_rejected_on_decode() {
        let result = serde_json::from_str::<Task>(
            r#"{"id":1,"name":"x","description":"","status":"NEW","start_time":null,"duration":99999999999999999}"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("out of range"), "{err}");
    }

    #[test]
    fn minutes_decode_and_encode() {
        let task: Task = serde_json::from_str(
            r#"{"id":1,"name":"x","description":"","status":"NEW","start_time":null,"duration":45}"#,
        )
        .unwrap();
        assert_eq!(task.duration, Some(Duration::minutes(45)));
        assert!(serde_json::to_string(&task).unwrap().contains(r#""duration":45"#));
    }

    #[test]
    fn end_time_is_absent_when_it_would_overflow() {
        let task = Task {
            id: TaskId(1),
            name: "x".into(),
            description: String::new(),
            status: Status::New,
            start_time: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(10, 0, 0),
            duration: Duration::try_minutes(150_000_000_000_000),
        };
        assert_eq!(task.end_time(), None);
    }
}
