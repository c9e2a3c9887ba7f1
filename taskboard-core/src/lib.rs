//! # taskboard-core
//!
//! In-memory bookkeeping engine for taskboard: tasks, epics and their
//! subtasks, derived epic status/schedule, a calendar-year reservation grid,
//! a start-time priority view and a view history.
//!
//! The engine performs no I/O. Persistence, HTTP and the interactive menu
//! live in the `taskboard` crate and talk to [`TaskManager`] only.

pub mod error;
pub mod grid;
pub mod history;
pub mod manager;
pub mod models;
pub mod priority;
pub mod rollup;
pub mod store;

pub use error::{Result, TaskError};
pub use grid::{GridError, ScheduleGrid, SLOT_MINUTES};
pub use manager::{ManagerConfig, TaskManager};
