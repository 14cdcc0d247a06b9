//! Options structs for repository mutations.
//!
//! Every optional field is an explicit named field with its default
//! documented; callers fill in the rest via struct-update syntax.

/// Payload used when creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// Human-readable title. Required.
    pub title: String,
    /// Optional free-form description. Defaults to `None`.
    pub description: Option<String>,
    /// Completion flag. Defaults to `false`.
    pub completed: bool,
    /// Ordered tag list. Defaults to empty.
    pub tags: Vec<String>,
    /// Optional priority. Defaults to `None`.
    pub priority: Option<i64>,
}

impl NewTask {
    /// Shorthand for a task with only a title set.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Replacement values applied to an existing task.
///
/// This is a whole-record replacement of the mutable fields, not a partial
/// patch: fields left at their defaults overwrite the stored values with
/// those defaults. `date_created` and the id are never touched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// New title. Required.
    pub title: String,
    /// New description. Defaults to `None` (clears any existing value).
    pub description: Option<String>,
    /// New completion flag. Defaults to `false`.
    pub completed: bool,
    /// New tag list. Defaults to empty.
    pub tags: Vec<String>,
    /// New priority. Defaults to `None`.
    pub priority: Option<i64>,
}

impl TaskUpdate {
    /// Shorthand for an update that only renames the task.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Replacement values applied to an existing subtask.
#[derive(Debug, Clone, Default)]
pub struct SubTaskUpdate {
    /// New title, or `None` to keep the current one.
    pub title: Option<String>,
    /// New completion flag. Defaults to `false`.
    pub completed: bool,
}
