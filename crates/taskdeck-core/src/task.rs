use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::{SubTaskId, TaskId};

/// A top-level to-do item.
///
/// Tasks are created through the repository's factory methods, never
/// constructed by callers and handed in for storage. `subtasks` is a
/// relation list; subtask rows persist in their own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identifier, assigned at creation and never reassigned.
    pub id: TaskId,
    /// Human-readable title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Creation time in epoch seconds. Set once, immutable thereafter.
    pub date_created: i64,
    /// Completion flag.
    pub completed: bool,
    /// Ordered tag list. Persisted as a comma-joined column.
    pub tags: Vec<String>,
    /// Optional priority.
    pub priority: Option<i64>,
    /// Subtasks owned by this task.
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
}

impl Task {
    /// Create a task with the given id and title, stamping `date_created`
    /// with the current time. Remaining fields take their defaults.
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            date_created: OffsetDateTime::now_utc().unix_timestamp(),
            completed: false,
            tags: Vec::new(),
            priority: None,
            subtasks: Vec::new(),
        }
    }
}

/// A child item scoped to exactly one task via `parent_task_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    /// Opaque identifier.
    pub id: SubTaskId,
    /// Identifier of the owning task.
    pub parent_task_id: TaskId,
    /// Human-readable title.
    pub title: String,
    /// Completion flag.
    pub completed: bool,
}

impl SubTask {
    /// Create a subtask under the given parent.
    #[must_use]
    pub fn new(id: SubTaskId, parent_task_id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            parent_task_id,
            title: title.into(),
            completed: false,
        }
    }
}
