//! Identity-keyed tables for every item kind.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

use crate::models::*;

/// Arena-style storage: one table per kind, keyed by [`TaskId`].
///
/// Relationships are identity lists (`Epic::subtask_ids`, `Subtask::epic_id`),
/// never owned references. Tables iterate in id order, which for items created
/// here is also creation order.
#[derive(Debug, Clone)]
pub struct EntityStore {
    next_id: u64,
    tasks: BTreeMap<TaskId, Task>,
    epics: BTreeMap<TaskId, Epic>,
    subtasks: BTreeMap<TaskId, Subtask>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            tasks: BTreeMap::new(),
            epics: BTreeMap::new(),
            subtasks: BTreeMap::new(),
        }
    }

    /// Hands out the next identity. Identities are never reused.
    pub fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Makes sure ids handed out later are greater than `id`.
    pub fn advance_past(&mut self, id: TaskId) {
        self.next_id = self.next_id.max(id.0 + 1);
    }

    pub fn peek_next_id(&self) -> TaskId {
        TaskId(self.next_id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn kind_of(&self, id: TaskId) -> Option<ItemKind> {
        if self.tasks.contains_key(&id) {
            Some(ItemKind::Task)
        } else if self.epics.contains_key(&id) {
            Some(ItemKind::Epic)
        } else if self.subtasks.contains_key(&id) {
            Some(ItemKind::Subtask)
        } else {
            None
        }
    }

    pub fn insert(&mut self, item: Item) {
        match item {
            Item::Task(t) => {
                self.tasks.insert(t.id, t);
            }
            Item::Epic(e) => {
                self.epics.insert(e.id, e);
            }
            Item::Subtask(s) => {
                self.subtasks.insert(s.id, s);
            }
        }
    }

    pub fn get(&self, id: TaskId) -> Option<Item> {
        match self.kind_of(id)? {
            ItemKind::Task => self.tasks.get(&id).cloned().map(Item::Task),
            ItemKind::Epic => self.epics.get(&id).cloned().map(Item::Epic),
            ItemKind::Subtask => self.subtasks.get(&id).cloned().map(Item::Subtask),
        }
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn epic(&self, id: TaskId) -> Option<&Epic> {
        self.epics.get(&id)
    }

    pub fn epic_mut(&mut self, id: TaskId) -> Option<&mut Epic> {
        self.epics.get_mut(&id)
    }

    pub fn subtask(&self, id: TaskId) -> Option<&Subtask> {
        self.subtasks.get(&id)
    }

    pub fn subtask_mut(&mut self, id: TaskId) -> Option<&mut Subtask> {
        self.subtasks.get_mut(&id)
    }

    /// Patches name and description in place.
    ///
    /// Status and schedule are not reachable from here; they change only
    /// through the manager's status and reschedule paths.
    pub fn update_text(
        &mut self,
        id: TaskId,
        name: Option<String>,
        description: Option<String>,
    ) -> bool {
        let (n, d) = if let Some(t) = self.tasks.get_mut(&id) {
            (&mut t.name, &mut t.description)
        } else if let Some(e) = self.epics.get_mut(&id) {
            (&mut e.name, &mut e.description)
        } else if let Some(s) = self.subtasks.get_mut(&id) {
            (&mut s.name, &mut s.description)
        } else {
            return false;
        };
        if let Some(name) = name {
            *n = name;
        }
        if let Some(description) = description {
            *d = description;
        }
        true
    }

    /// Writes a schedule onto a task or subtask. Epics are refused.
    pub(crate) fn set_schedule(
        &mut self,
        id: TaskId,
        start_time: Option<NaiveDateTime>,
        duration: Option<Duration>,
    ) -> bool {
        if let Some(t) = self.tasks.get_mut(&id) {
            t.start_time = start_time;
            t.duration = duration;
            true
        } else if let Some(s) = self.subtasks.get_mut(&id) {
            s.start_time = start_time;
            s.duration = duration;
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Item> {
        match self.kind_of(id)? {
            ItemKind::Task => self.tasks.remove(&id).map(Item::Task),
            ItemKind::Epic => self.epics.remove(&id).map(Item::Epic),
            ItemKind::Subtask => self.subtasks.remove(&id).map(Item::Subtask),
        }
    }

    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.remove(&id)
    }

    pub fn remove_epic(&mut self, id: TaskId) -> Option<Epic> {
        self.epics.remove(&id)
    }

    pub fn remove_subtask(&mut self, id: TaskId) -> Option<Subtask> {
        self.subtasks.remove(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn epics(&self) -> impl Iterator<Item = &Epic> {
        self.epics.values()
    }

    pub fn epics_mut(&mut self) -> impl Iterator<Item = &mut Epic> {
        self.epics.values_mut()
    }

    pub fn subtasks(&self) -> impl Iterator<Item = &Subtask> {
        self.subtasks.values()
    }

    pub fn list(&self, kind: ItemKind) -> Vec<Item> {
        match kind {
            ItemKind::Task => self.tasks.values().cloned().map(Item::Task).collect(),
            ItemKind::Epic => self.epics.values().cloned().map(Item::Epic).collect(),
            ItemKind::Subtask => self.subtasks.values().cloned().map(Item::Subtask).collect(),
        }
    }

    pub fn drain_tasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.tasks).into_values().collect()
    }

    pub fn drain_epics(&mut self) -> Vec<Epic> {
        std::mem::take(&mut self.epics).into_values().collect()
    }

    pub fn drain_subtasks(&mut self) -> Vec<Subtask> {
        std::mem::take(&mut self.subtasks).into_values().collect()
    }
}
