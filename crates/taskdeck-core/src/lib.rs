//! Domain types for taskdeck.
//!
//! This crate defines the task and subtask records, their opaque
//! identifiers, and the comma-joined tag codec used by the persistent
//! store. Behavior lives in `taskdeck-app`; these are plain records.

/// Identifier types.
pub mod id;
/// Tag list <-> storage column codec.
pub mod tags;
/// Task and subtask records.
pub mod task;

pub use id::{ParseIdError, SubTaskId, TaskId};
pub use task::{SubTask, Task};
