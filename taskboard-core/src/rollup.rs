//! Derived status and schedule for epics.

use chrono::{Duration, NaiveDateTime};

use crate::models::{Status, Subtask};

/// The derived fields of an epic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollup {
    pub status: Status,
    pub start_time: Option<NaiveDateTime>,
    pub duration: Option<Duration>,
}

/// Computes an epic's derived fields from its current subtasks.
///
/// Status is `NEW` when there are no subtasks or all are new, `DONE` when all
/// are done, `IN_PROGRESS` otherwise. Only subtasks with both a start time and
/// a duration count towards the schedule: the start is the earliest of them
/// and the duration is their sum. With none qualifying, both are absent.
pub fn rollup<'a>(subtasks: impl IntoIterator<Item = &'a Subtask>) -> Rollup {
    let mut any = false;
    let mut all_new = true;
    let mut all_done = true;
    let mut start_time: Option<NaiveDateTime> = None;
    let mut duration: Option<Duration> = None;

    for subtask in subtasks {
        any = true;
        all_new &= subtask.status == Status::New;
        all_done &= subtask.status == Status::Done;

        if let (Some(start), Some(d)) = (subtask.start_time, subtask.duration) {
            start_time = Some(start_time.map_or(start, |s| s.min(start)));
            let total = duration.unwrap_or_else(Duration::zero);
            duration = Some(total.checked_add(&d).unwrap_or(Duration::MAX));
        }
    }

    let status = if !any || all_new {
        Status::New
    } else if all_done {
        Status::Done
    } else {
        Status::InProgress
    };

    Rollup {
        status,
        start_time,
        duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;
    use chrono::NaiveDate;

    fn subtask(id: u64, status: Status) -> Subtask {
        let mut s = Subtask::new(TaskId(id), TaskId(0), format!("s{id}"), "");
        s.status = status;
        s
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn empty_epic_is_new_and_unscheduled() {
        let r = rollup(std::iter::empty());
        assert_eq!(r.status, Status::New);
        assert_eq!(r.start_time, None);
        assert_eq!(r.duration, None);
    }

    #[test]
    fn status_follows_subtasks() {
        let new = subtask(1, Status::New);
        let done = subtask(2, Status::Done);
        let busy = subtask(3, Status::InProgress);

        assert_eq!(rollup([&new, &new.clone()]).status, Status::New);
        assert_eq!(rollup([&done, &done.clone()]).status, Status::Done);
        assert_eq!(rollup([&new, &done]).status, Status::InProgress);
        assert_eq!(rollup([&busy]).status, Status::InProgress);
    }

    #[test]
    fn schedule_uses_only_fully_scheduled_subtasks() {
        let mut a = subtask(1, Status::New);
        a.start_time = Some(at(14, 0));
        a.duration = Some(Duration::minutes(30));

        let mut b = subtask(2, Status::New);
        b.start_time = Some(at(9, 0));
        b.duration = Some(Duration::minutes(45));

        // start without a duration does not qualify
        let mut c = subtask(3, Status::New);
        c.start_time = Some(at(7, 0));

        let r = rollup([&a, &b, &c]);
        assert_eq!(r.start_time, Some(at(9, 0)));
        assert_eq!(r.duration, Some(Duration::minutes(75)));
    }

    #[test]
    fn no_qualifying_subtask_means_no_schedule() {
        let mut c = subtask(3, Status::Done);
        c.start_time = Some(at(7, 0));
        let r = rollup([&c]);
        assert_eq!(r.status, Status::Done);
        assert_eq!(r.start_time, None);
        assert_eq!(r.duration, None);
    }

    #[test]
    fn total_duration_saturates_instead_of_overflowing() {
        let mut a = subtask(1, Status::New);
        a.start_time = Some(at(9, 0));
        a.duration = Duration::try_minutes(100_000_000_000_000);
        let mut b = subtask(2, Status::New);
        b.start_time = Some(at(10, 0));
        b.duration = Duration::try_minutes(100_000_000_000_000);

        assert_eq!(rollup([&a, &b]).duration, Some(Duration::MAX));
    }
}
