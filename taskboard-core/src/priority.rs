//! Start-time ordered view over schedulable items.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;

use crate::models::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortKey {
    start: Option<NaiveDateTime>,
    id: TaskId,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // unscheduled items sort after every scheduled one
        let by_start = match (self.start, other.start) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_start.then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Always-sorted index ordered by (start ascending, unscheduled last, id).
///
/// Keeps the key each id was inserted with, so an entry can be found again
/// after the item's start time has already changed.
#[derive(Debug, Clone, Default)]
pub struct PriorityView {
    order: BTreeSet<SortKey>,
    keys: HashMap<TaskId, SortKey>,
}

impl PriorityView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `id`, or moves it to the position for `start`.
    pub fn upsert(&mut self, id: TaskId, start: Option<NaiveDateTime>) {
        self.remove(id);
        let key = SortKey { start, id };
        self.order.insert(key);
        self.keys.insert(id, key);
    }

    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.keys.remove(&id) {
            Some(key) => self.order.remove(&key),
            None => false,
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.keys.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Ids in priority order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.order.iter().map(|key| key.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap().and_hms_opt(h, 0, 0)
    }

    #[test]
    fn orders_by_start_then_id_with_unscheduled_last() {
        let mut view = PriorityView::new();
        view.upsert(TaskId(5), None);
        view.upsert(TaskId(4), at(12));
        view.upsert(TaskId(3), None);
        view.upsert(TaskId(2), at(9));
        view.upsert(TaskId(1), at(12));

        let ids: Vec<_> = view.ids().collect();
        assert_eq!(ids, vec![TaskId(2), TaskId(1), TaskId(4), TaskId(3), TaskId(5)]);
    }

    #[test]
    fn upsert_moves_existing_entry() {
        let mut view = PriorityView::new();
        view.upsert(TaskId(1), at(8));
        view.upsert(TaskId(2), at(10));
        view.upsert(TaskId(1), at(11));

        assert_eq!(view.len(), 2);
        assert_eq!(view.ids().collect::<Vec<_>>(), vec![TaskId(2), TaskId(1)]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut view = PriorityView::new();
        view.upsert(TaskId(1), at(8));
        assert!(view.remove(TaskId(1)));
        assert!(!view.remove(TaskId(1)));
        assert!(view.is_empty());
    }
}
