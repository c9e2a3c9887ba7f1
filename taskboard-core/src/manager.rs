//! The board's single entry point.
//!
//! # Responsibility
//! - Own the entity store, schedule grid, priority view and view history.
//! - Keep them consistent in every operation: reserve before commit, roll up
//!   the owning epic after any subtask change, reindex the priority view.
//!
//! # Invariants
//! - Every subtask's epic exists and lists it exactly once.
//! - Epic status and schedule always equal [`rollup`] of its subtasks.
//! - Reservations held by live items never overlap.
//! - History and the priority view only reference live items.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Local, NaiveDateTime};

use crate::error::{Result, TaskError};
use crate::grid::ScheduleGrid;
use crate::history::History;
use crate::models::*;
use crate::priority::PriorityView;
use crate::rollup::rollup;
use crate::store::EntityStore;

/// Startup configuration for a [`TaskManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Calendar year covered by the schedule grid.
    pub year: i32,
    /// Maximum history length. `None` keeps every viewed item.
    pub history_limit: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            year: Local::now().year(),
            history_limit: None,
        }
    }
}

impl ManagerConfig {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            history_limit: None,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }
}

/// An interval currently marked in the grid on behalf of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reservation {
    start: NaiveDateTime,
    duration: Duration,
}

/// In-memory task board for one session.
#[derive(Debug, Clone)]
pub struct TaskManager {
    store: EntityStore,
    grid: ScheduleGrid,
    reservations: HashMap<TaskId, Reservation>,
    priority: PriorityView,
    history: History,
}

impl TaskManager {
    pub fn new(config: ManagerConfig) -> Result<Self> {
        Ok(Self {
            store: EntityStore::new(),
            grid: ScheduleGrid::new(config.year)?,
            reservations: HashMap::new(),
            priority: PriorityView::new(),
            history: History::with_limit(config.history_limit),
        })
    }

    /// Rebuilds a board from a saved snapshot.
    ///
    /// Epics are loaded first, then tasks, then subtasks, then the history is
    /// replayed. Nothing is recorded in the history while loading.
    pub fn from_snapshot(config: ManagerConfig, snapshot: Snapshot) -> Result<Self> {
        let mut manager = Self::new(config)?;
        for epic in snapshot.epics {
            manager.restore(epic.into())?;
        }
        for task in snapshot.tasks {
            manager.restore(task.into())?;
        }
        for subtask in snapshot.subtasks {
            manager.restore(subtask.into())?;
        }
        manager.replay_history(snapshot.history);
        Ok(manager)
    }

    pub fn year(&self) -> i32 {
        self.grid.year()
    }

    // ============================================================
    // Create
    // ============================================================

    pub fn create_task(&mut self, input: CreateTaskInput) -> Result<TaskId> {
        let reservation = self.try_reserve(input.start_time, input.duration)?;

        let id = self.store.allocate_id();
        self.hold(id, reservation);
        self.priority.upsert(id, input.start_time);
        self.store.insert(
            Task {
                id,
                name: input.name,
                description: input.description,
                status: input.status.unwrap_or_default(),
                start_time: input.start_time,
                duration: input.duration,
            }
            .into(),
        );

        tracing::debug!(%id, "created task");
        Ok(id)
    }

    pub fn create_epic(&mut self, input: CreateEpicInput) -> TaskId {
        let id = self.store.allocate_id();
        self.store
            .insert(Epic::new(id, input.name, input.description).into());

        tracing::debug!(%id, "created epic");
        id
    }

    pub fn create_subtask(&mut self, input: CreateSubtaskInput) -> Result<TaskId> {
        let epic_id = input.epic_id;
        if self.store.epic(epic_id).is_none() {
            tracing::warn!(%epic_id, "subtask refused: no such epic");
            return Err(TaskError::InvalidReference(epic_id));
        }
        let reservation = self.try_reserve(input.start_time, input.duration)?;

        let id = self.store.allocate_id();
        self.hold(id, reservation);
        self.priority.upsert(id, input.start_time);

        let mut subtask = Subtask::new(id, epic_id, input.name, input.description);
        subtask.status = input.status.unwrap_or_default();
        subtask.start_time = input.start_time;
        subtask.duration = input.duration;
        self.store.insert(subtask.into());

        if let Some(epic) = self.store.epic_mut(epic_id) {
            epic.push_subtask(id);
        }
        self.refresh_epic(epic_id);

        tracing::debug!(%id, %epic_id, "created subtask");
        Ok(id)
    }

    // ============================================================
    // Read
    // ============================================================

    /// Fetches a task and records the view.
    pub fn get_task(&mut self, id: TaskId) -> Option<Task> {
        let task = self.store.task(id)?.clone();
        self.history.add(id);
        Some(task)
    }

    /// Fetches an epic and records the view.
    pub fn get_epic(&mut self, id: TaskId) -> Option<Epic> {
        let epic = self.store.epic(id)?.clone();
        self.history.add(id);
        Some(epic)
    }

    /// Fetches a subtask and records the view.
    pub fn get_subtask(&mut self, id: TaskId) -> Option<Subtask> {
        let subtask = self.store.subtask(id)?.clone();
        self.history.add(id);
        Some(subtask)
    }

    /// Fetches an item of any kind and records the view.
    pub fn get(&mut self, id: TaskId) -> Option<Item> {
        let item = self.store.get(id)?;
        self.history.add(id);
        Some(item)
    }

    /// Looks an item up without touching the history.
    pub fn peek(&self, id: TaskId) -> Option<Item> {
        self.store.get(id)
    }

    pub fn find_task(&self, id: TaskId) -> Option<Task> {
        self.store.task(id).cloned()
    }

    pub fn find_epic(&self, id: TaskId) -> Option<Epic> {
        self.store.epic(id).cloned()
    }

    pub fn find_subtask(&self, id: TaskId) -> Option<Subtask> {
        self.store.subtask(id).cloned()
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.store.tasks().cloned().collect()
    }

    pub fn list_epics(&self) -> Vec<Epic> {
        self.store.epics().cloned().collect()
    }

    pub fn list_subtasks(&self) -> Vec<Subtask> {
        self.store.subtasks().cloned().collect()
    }

    pub fn list(&self, kind: ItemKind) -> Vec<Item> {
        self.store.list(kind)
    }

    /// Subtasks of an epic in the order they were added.
    pub fn epic_subtasks(&self, epic_id: TaskId) -> Result<Vec<Subtask>> {
        let epic = self
            .store
            .epic(epic_id)
            .ok_or(TaskError::NotFound(epic_id))?;
        Ok(epic
            .subtask_ids()
            .iter()
            .filter_map(|id| self.store.subtask(*id).cloned())
            .collect())
    }

    /// Viewed items, least recent first.
    pub fn history(&self) -> Vec<Item> {
        self.history
            .ids()
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    /// Tasks, subtasks and scheduled epics by start time; unscheduled last.
    pub fn prioritized(&self) -> Vec<Item> {
        self.priority
            .ids()
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    // ============================================================
    // Update
    // ============================================================

    /// Applies text edits and, if given, a new schedule.
    ///
    /// Returns `false` for an unknown id. A schedule that cannot be reserved
    /// leaves the previous schedule in place while the text edits still apply.
    pub fn update_task(&mut self, id: TaskId, input: UpdateTaskInput) -> bool {
        if self.store.task(id).is_none() {
            return false;
        }
        self.store.update_text(id, input.name, input.description);
        if let Some(schedule) = input.schedule {
            self.reschedule(id, schedule);
        }
        true
    }

    pub fn update_epic(&mut self, id: TaskId, input: UpdateEpicInput) -> bool {
        if self.store.epic(id).is_none() {
            return false;
        }
        self.store.update_text(id, input.name, input.description);
        self.refresh_epic(id);
        true
    }

    /// Same contract as [`update_task`](Self::update_task); the owning epic is
    /// rolled up afterwards.
    pub fn update_subtask(&mut self, id: TaskId, input: UpdateTaskInput) -> bool {
        let Some(epic_id) = self.store.subtask(id).map(Subtask::epic_id) else {
            return false;
        };
        self.store.update_text(id, input.name, input.description);
        if let Some(schedule) = input.schedule {
            self.reschedule(id, schedule);
        }
        self.refresh_epic(epic_id);
        true
    }

    pub fn set_task_status(&mut self, id: TaskId, status: Status) -> Result<()> {
        let task = self.store.task_mut(id).ok_or(TaskError::NotFound(id))?;
        task.status = status;
        Ok(())
    }

    pub fn set_subtask_status(&mut self, id: TaskId, status: Status) -> Result<()> {
        let subtask = self.store.subtask_mut(id).ok_or(TaskError::NotFound(id))?;
        subtask.status = status;
        let epic_id = subtask.epic_id();
        self.refresh_epic(epic_id);
        Ok(())
    }

    // ============================================================
    // Delete
    // ============================================================

    pub fn delete_task(&mut self, id: TaskId) -> Option<Task> {
        let task = self.store.remove_task(id)?;
        self.forget(id);
        Some(task)
    }

    /// Deletes the epic together with all of its subtasks.
    pub fn delete_epic(&mut self, id: TaskId) -> Option<Epic> {
        let epic = self.store.remove_epic(id)?;
        for subtask_id in epic.subtask_ids() {
            if self.store.remove_subtask(*subtask_id).is_some() {
                self.forget(*subtask_id);
            }
        }
        self.forget(id);
        Some(epic)
    }

    pub fn delete_subtask(&mut self, id: TaskId) -> Option<Subtask> {
        let subtask = self.store.remove_subtask(id)?;
        self.forget(id);

        let epic_id = subtask.epic_id();
        if let Some(epic) = self.store.epic_mut(epic_id) {
            epic.remove_subtask(id);
        }
        self.refresh_epic(epic_id);
        Some(subtask)
    }

    pub fn delete_all_tasks(&mut self) {
        for task in self.store.drain_tasks() {
            self.forget(task.id);
        }
    }

    /// Deletes every epic, and with them every subtask.
    pub fn delete_all_epics(&mut self) {
        for subtask in self.store.drain_subtasks() {
            self.forget(subtask.id);
        }
        for epic in self.store.drain_epics() {
            self.forget(epic.id);
        }
    }

    /// Deletes every subtask; every epic goes back to `NEW` and unscheduled.
    pub fn delete_all_subtasks(&mut self) {
        for subtask in self.store.drain_subtasks() {
            self.forget(subtask.id);
        }
        let epic_ids: Vec<TaskId> = self
            .store
            .epics_mut()
            .map(|epic| {
                epic.clear_subtasks();
                epic.id
            })
            .collect();
        for epic_id in epic_ids {
            self.refresh_epic(epic_id);
        }
    }

    // ============================================================
    // Bulk load
    // ============================================================

    /// Inserts an item under its existing id without create-time validation.
    ///
    /// The id counter is advanced past it. Epics come back empty and are
    /// rebuilt as their subtasks are restored. A saved schedule that can no
    /// longer be reserved (taken, or outside this grid's year) is kept on the
    /// item but holds no reservation. A negative duration, or one whose end
    /// cannot be represented, is refused with `InvalidSchedule`.
    pub fn restore(&mut self, item: Item) -> Result<()> {
        let id = item.id();
        if self.store.contains(id) {
            return Err(TaskError::DuplicateId(id));
        }

        match item {
            Item::Epic(epic) => {
                self.store
                    .insert(Epic::new(id, epic.name, epic.description).into());
            }
            Item::Task(task) => {
                check_loaded_schedule(id, task.start_time, task.duration)?;
                self.restore_reservation(id, task.start_time, task.duration);
                self.priority.upsert(id, task.start_time);
                self.store.insert(task.into());
            }
            Item::Subtask(subtask) => {
                let epic_id = subtask.epic_id();
                if self.store.epic(epic_id).is_none() {
                    return Err(TaskError::InvalidReference(epic_id));
                }
                check_loaded_schedule(id, subtask.start_time, subtask.duration)?;
                self.restore_reservation(id, subtask.start_time, subtask.duration);
                self.priority.upsert(id, subtask.start_time);
                self.store.insert(subtask.into());
                if let Some(epic) = self.store.epic_mut(epic_id) {
                    epic.push_subtask(id);
                }
                self.refresh_epic(epic_id);
            }
        }

        self.store.advance_past(id);
        Ok(())
    }

    /// Makes sure newly created items get ids greater than `id`.
    pub fn advance_ids_past(&mut self, id: TaskId) {
        self.store.advance_past(id);
    }

    /// Records views in the given order (oldest first) without validation.
    /// Unknown ids are skipped.
    pub fn replay_history(&mut self, ids: impl IntoIterator<Item = TaskId>) {
        for id in ids {
            if self.store.contains(id) {
                self.history.add(id);
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.list_tasks(),
            epics: self.list_epics(),
            subtasks: self.list_subtasks(),
            history: self.history.ids(),
        }
    }

    // ============================================================
    // Internals
    // ============================================================

    /// Reserves grid time for a schedule that is about to be committed.
    ///
    /// Absent fields or a zero duration need no reservation.
    fn try_reserve(
        &mut self,
        start_time: Option<NaiveDateTime>,
        duration: Option<Duration>,
    ) -> Result<Option<Reservation>> {
        if let Some(d) = duration {
            if d < Duration::zero() {
                tracing::warn!(minutes = d.num_minutes(), "refused negative duration");
                return Err(TaskError::InvalidSchedule(format!(
                    "duration must not be negative (got {} min)",
                    d.num_minutes()
                )));
            }
        }
        let (Some(start), Some(duration)) = (start_time, duration) else {
            return Ok(None);
        };
        if duration == Duration::zero() {
            return Ok(None);
        }

        match self.grid.reserve(start, duration) {
            Ok(true) => Ok(Some(Reservation { start, duration })),
            Ok(false) => {
                tracing::warn!(%start, minutes = duration.num_minutes(), "schedule conflict");
                Err(TaskError::ScheduleConflict {
                    start,
                    minutes: duration.num_minutes(),
                })
            }
            Err(e) => {
                tracing::warn!(%start, error = %e, "schedule outside grid");
                Err(e.into())
            }
        }
    }

    fn hold(&mut self, id: TaskId, reservation: Option<Reservation>) {
        if let Some(reservation) = reservation {
            self.reservations.insert(id, reservation);
        }
    }

    fn release(&mut self, id: TaskId) -> Option<Reservation> {
        let reservation = self.reservations.remove(&id)?;
        if let Err(e) = self.grid.release(reservation.start, reservation.duration) {
            // only reachable if the grid changed under a held reservation
            tracing::error!(%id, error = %e, "failed to release reservation");
        }
        Some(reservation)
    }

    /// Drops every index entry for an item that has left the store.
    fn forget(&mut self, id: TaskId) {
        self.release(id);
        self.priority.remove(id);
        self.history.remove(id);
    }

    /// Swaps a task's or subtask's schedule, restoring the old one on failure.
    fn reschedule(&mut self, id: TaskId, schedule: ScheduleInput) {
        let previous = self.release(id);

        match self.try_reserve(schedule.start_time, schedule.duration) {
            Ok(reservation) => {
                self.hold(id, reservation);
                self.store
                    .set_schedule(id, schedule.start_time, schedule.duration);
                self.priority.upsert(id, schedule.start_time);
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "reschedule refused, keeping previous schedule");
                if let Some(prev) = previous {
                    // the slots were free a moment ago, so this cannot conflict
                    if matches!(self.grid.reserve(prev.start, prev.duration), Ok(true)) {
                        self.reservations.insert(id, prev);
                    }
                }
            }
        }
    }

    fn restore_reservation(
        &mut self,
        id: TaskId,
        start_time: Option<NaiveDateTime>,
        duration: Option<Duration>,
    ) {
        match self.try_reserve(start_time, duration) {
            Ok(reservation) => self.hold(id, reservation),
            Err(e) => tracing::warn!(%id, error = %e, "loaded without a reservation"),
        }
    }

    /// Recomputes an epic's derived fields and its priority entry.
    fn refresh_epic(&mut self, epic_id: TaskId) {
        let Some(epic) = self.store.epic(epic_id) else {
            return;
        };
        let rollup = rollup(
            epic.subtask_ids()
                .iter()
                .filter_map(|id| self.store.subtask(*id)),
        );

        if let Some(epic) = self.store.epic_mut(epic_id) {
            epic.apply_rollup(&rollup);
        }
        match rollup.start_time {
            Some(start) => self.priority.upsert(epic_id, Some(start)),
            None => {
                self.priority.remove(epic_id);
            }
        }
        tracing::debug!(%epic_id, status = rollup.status.as_str(), "rolled up epic");
    }
}

/// The data-model limits a loaded schedule must still respect.
fn check_loaded_schedule(
    id: TaskId,
    start_time: Option<NaiveDateTime>,
    duration: Option<Duration>,
) -> Result<()> {
    let Some(duration) = duration else {
        return Ok(());
    };
    if duration < Duration::zero() {
        return Err(TaskError::InvalidSchedule(format!(
            "item {id}: duration must not be negative (got {} min)",
            duration.num_minutes()
        )));
    }
    if let Some(start) = start_time {
        if start.checked_add_signed(duration).is_none() {
            return Err(TaskError::InvalidSchedule(format!(
                "item {id}: {} min from {start} is out of range",
                duration.num_minutes()
            )));
        }
    }
    Ok(())
}
