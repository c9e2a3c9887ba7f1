//! Domain models for taskboard.
//!
//! # Core Concepts
//!
//! - [`Task`]: A plain, schedulable unit of work with no children.
//! - [`Epic`]: A unit of work composed of subtasks. Its status, start time and
//!   duration are **derived** from its subtasks and cannot be set by callers.
//! - [`Subtask`]: A schedulable unit of work owned by exactly one epic.
//! - [`Item`]: Any of the three, tagged by kind. This is what history and the
//!   priority view hand out.
//!
//! All three kinds share one identity space ([`TaskId`]); identities are
//! assigned by the entity store and never reused.

mod input;
mod snapshot;
mod task;

pub use input::*;
pub use snapshot::*;
pub use task::*;
