//! Calendar-year reservation grid.
//!
//! The year is cut into fixed 15-minute slots held in a flat bitmap. A
//! reservation marks every slot its interval touches, so two reservations
//! overlap exactly when they share a slot.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Width of one slot in minutes.
pub const SLOT_MINUTES: i64 = 15;

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("{0} is outside schedule year {1}")]
    OutOfRange(NaiveDateTime, i32),

    #[error("duration must not be negative (got {0} min)")]
    NegativeDuration(i64),

    #[error("unsupported schedule year {0}")]
    InvalidYear(i32),
}

/// Busy/free bitmap covering exactly one calendar year.
#[derive(Debug, Clone)]
pub struct ScheduleGrid {
    year: i32,
    year_start: NaiveDateTime,
    slots: usize,
    words: Vec<u64>,
}

impl ScheduleGrid {
    pub fn new(year: i32) -> Result<Self, GridError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(GridError::InvalidYear(year))?;
        let next = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or(GridError::InvalidYear(year))?;
        let days = (next - first).num_days() as usize;
        let slots = days * 24 * (60 / SLOT_MINUTES as usize);
        let year_start = first.and_hms_opt(0, 0, 0).ok_or(GridError::InvalidYear(year))?;

        Ok(Self {
            year,
            year_start,
            slots,
            words: vec![0; slots.div_ceil(WORD_BITS)],
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Number of slots in the year (35040, or 35136 in a leap year).
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Marks the interval busy.
    ///
    /// Returns `Ok(false)` without touching the grid when any slot is already
    /// taken. A zero-length interval marks nothing and always succeeds.
    pub fn reserve(&mut self, start: NaiveDateTime, duration: Duration) -> Result<bool, GridError> {
        let (from, to) = self.slot_range(start, duration)?;
        if (from..to).any(|slot| self.is_set(slot)) {
            return Ok(false);
        }
        for slot in from..to {
            self.words[slot / WORD_BITS] |= 1u64 << (slot % WORD_BITS);
        }
        tracing::debug!(%start, minutes = duration.num_minutes(), slots = to - from, "reserved");
        Ok(true)
    }

    /// Clears the interval. Clearing free slots is a no-op.
    pub fn release(&mut self, start: NaiveDateTime, duration: Duration) -> Result<(), GridError> {
        let (from, to) = self.slot_range(start, duration)?;
        for slot in from..to {
            self.words[slot / WORD_BITS] &= !(1u64 << (slot % WORD_BITS));
        }
        tracing::debug!(%start, minutes = duration.num_minutes(), "released");
        Ok(())
    }

    /// True if the interval could be reserved right now.
    pub fn is_free(&self, start: NaiveDateTime, duration: Duration) -> Result<bool, GridError> {
        let (from, to) = self.slot_range(start, duration)?;
        Ok(!(from..to).any(|slot| self.is_set(slot)))
    }

    fn is_set(&self, slot: usize) -> bool {
        self.words[slot / WORD_BITS] & (1u64 << (slot % WORD_BITS)) != 0
    }

    fn slot_range(&self, start: NaiveDateTime, duration: Duration) -> Result<(usize, usize), GridError> {
        let minutes = duration.num_minutes();
        if minutes < 0 {
            return Err(GridError::NegativeDuration(minutes));
        }
        if start < self.year_start {
            return Err(GridError::OutOfRange(start, self.year));
        }

        let offset = (start - self.year_start).num_minutes();
        let from = (offset / SLOT_MINUTES) as usize;
        if from >= self.slots {
            return Err(GridError::OutOfRange(start, self.year));
        }

        let span = (minutes + SLOT_MINUTES - 1) / SLOT_MINUTES;
        let to = from + span as usize;
        if to > self.slots {
            let end = start.checked_add_signed(duration).unwrap_or(start);
            return Err(GridError::OutOfRange(end, self.year));
        }
        Ok((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(month: u32, day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, month, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn grid() -> ScheduleGrid {
        ScheduleGrid::new(2026).unwrap()
    }

    #[test]
    fn covers_the_whole_year() {
        assert_eq!(grid().slot_count(), 365 * 96);
        assert_eq!(ScheduleGrid::new(2028).unwrap().slot_count(), 366 * 96);
    }

    #[test]
    fn overlapping_reservation_is_refused_without_mutation() {
        let mut grid = grid();
        assert_eq!(grid.reserve(at(3, 1, 10, 0), Duration::minutes(30)), Ok(true));
        assert_eq!(grid.reserve(at(3, 1, 10, 15), Duration::minutes(15)), Ok(false));
        // the refused attempt must not have marked 10:30
        assert_eq!(grid.reserve(at(3, 1, 10, 30), Duration::minutes(15)), Ok(true));
    }

    #[test]
    fn partial_slots_round_up() {
        let mut grid = grid();
        assert_eq!(grid.reserve(at(3, 1, 9, 0), Duration::minutes(16)), Ok(true));
        assert_eq!(grid.is_free(at(3, 1, 9, 15), Duration::minutes(1)), Ok(false));
        assert_eq!(grid.is_free(at(3, 1, 9, 30), Duration::minutes(15)), Ok(true));
    }

    #[test]
    fn zero_duration_never_marks() {
        let mut grid = grid();
        assert_eq!(grid.reserve(at(3, 1, 10, 0), Duration::minutes(30)), Ok(true));
        assert_eq!(grid.reserve(at(3, 1, 10, 0), Duration::zero()), Ok(true));
        assert_eq!(grid.reserve(at(3, 1, 10, 0), Duration::zero()), Ok(true));
    }

    #[test]
    fn release_frees_slots_and_tolerates_free_ranges() {
        let mut grid = grid();
        grid.reserve(at(5, 2, 8, 0), Duration::hours(1)).unwrap();
        grid.release(at(5, 2, 8, 0), Duration::hours(1)).unwrap();
        grid.release(at(5, 2, 8, 0), Duration::hours(1)).unwrap();
        assert_eq!(grid.reserve(at(5, 2, 8, 30), Duration::minutes(15)), Ok(true));
    }

    #[test]
    fn out_of_year_is_an_error() {
        let mut grid = grid();
        let next_year = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let last_year = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap().and_hms_opt(23, 59, 0).unwrap();

        assert!(matches!(grid.reserve(next_year, Duration::minutes(15)), Err(GridError::OutOfRange(..))));
        assert!(matches!(grid.reserve(last_year, Duration::minutes(15)), Err(GridError::OutOfRange(..))));
        // starts inside the year but runs past its end
        assert!(matches!(
            grid.reserve(at(12, 31, 23, 45), Duration::minutes(30)),
            Err(GridError::OutOfRange(..))
        ));
        assert_eq!(grid.reserve(at(12, 31, 23, 45), Duration::minutes(15)), Ok(true));
    }

    #[test]
    fn huge_duration_is_out_of_range() {
        let mut grid = grid();
        let huge = Duration::try_minutes(140_000_000_000_000).unwrap();
        assert!(matches!(grid.reserve(at(3, 1, 10, 0), huge), Err(GridError::OutOfRange(..))));
        assert!(matches!(grid.is_free(at(3, 1, 10, 0), huge), Err(GridError::OutOfRange(..))));
    }

    #[test]
    fn negative_duration_is_an_error() {
        let mut grid = grid();
        assert_eq!(
            grid.reserve(at(1, 1, 0, 0), Duration::minutes(-5)),
            Err(GridError::NegativeDuration(-5))
        );
    }
}
