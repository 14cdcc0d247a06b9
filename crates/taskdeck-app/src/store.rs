//! Minimal storage abstraction required by the task repository.

use anyhow::Error;
use taskdeck_core::{SubTask, SubTaskId, Task, TaskId};
use taskdeck_store_sqlite::SqliteStore;

/// Storage operations the repository writes through to.
///
/// Implemented for [`SqliteStore`]; tests substitute in-memory mocks to
/// observe scan counts and inject write failures.
pub trait TaskStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error>;

    /// Insert a new task row.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails, including when
    /// the primary key already exists.
    fn insert_task(&self, task: &Task) -> Result<(), Self::Error>;

    /// Replace the mutable columns of an existing task row. `Ok(false)`
    /// means no row matched.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn update_task(&self, task: &Task) -> Result<bool, Self::Error>;

    /// Delete a task row. `Ok(false)` means no row matched (benign).
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn delete_task(&self, id: &TaskId) -> Result<bool, Self::Error>;

    /// Scan every task row in storage order.
    ///
    /// # Errors
    /// Returns a store-specific error when the scan fails.
    fn load_tasks(&self) -> Result<Vec<Task>, Self::Error>;

    /// Insert a new subtask row.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails, including when
    /// the primary key already exists.
    fn insert_subtask(&self, subtask: &SubTask) -> Result<(), Self::Error>;

    /// Replace the mutable columns of an existing subtask row. `Ok(false)`
    /// means no row matched.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn update_subtask(&self, subtask: &SubTask) -> Result<bool, Self::Error>;

    /// Delete a subtask row. `Ok(false)` means no row matched (benign).
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn delete_subtask(&self, id: &SubTaskId) -> Result<bool, Self::Error>;

    /// Scan every subtask row in storage order.
    ///
    /// # Errors
    /// Returns a store-specific error when the scan fails.
    fn load_subtasks(&self) -> Result<Vec<SubTask>, Self::Error>;

    /// Scan subtask rows belonging to `parent`, in storage order.
    ///
    /// # Errors
    /// Returns a store-specific error when the scan fails.
    fn subtasks_of(&self, parent: &TaskId) -> Result<Vec<SubTask>, Self::Error>;
}

impl TaskStore for SqliteStore {
    type Error = taskdeck_store_sqlite::StoreError;

    fn insert_task(&self, task: &Task) -> Result<(), Self::Error> {
        Self::insert_task(self, task)
    }

    fn update_task(&self, task: &Task) -> Result<bool, Self::Error> {
        Self::update_task(self, task)
    }

    fn delete_task(&self, id: &TaskId) -> Result<bool, Self::Error> {
        Self::delete_task(self, id)
    }

    fn load_tasks(&self) -> Result<Vec<Task>, Self::Error> {
        Self::load_tasks(self)
    }

    fn insert_subtask(&self, subtask: &SubTask) -> Result<(), Self::Error> {
        Self::insert_subtask(self, subtask)
    }

    fn update_subtask(&self, subtask: &SubTask) -> Result<bool, Self::Error> {
        Self::update_subtask(self, subtask)
    }

    fn delete_subtask(&self, id: &SubTaskId) -> Result<bool, Self::Error> {
        Self::delete_subtask(self, id)
    }

    fn load_subtasks(&self) -> Result<Vec<SubTask>, Self::Error> {
        Self::load_subtasks(self)
    }

    fn subtasks_of(&self, parent: &TaskId) -> Result<Vec<SubTask>, Self::Error> {
        Self::subtasks_of(self, parent)
    }
}

impl<S> TaskStore for &S
where
    S: TaskStore + ?Sized,
{
    type Error = S::Error;

    fn insert_task(&self, task: &Task) -> Result<(), Self::Error> {
        (*self).insert_task(task)
    }

    fn update_task(&self, task: &Task) -> Result<bool, Self::Error> {
        (*self).update_task(task)
    }

    fn delete_task(&self, id: &TaskId) -> Result<bool, Self::Error> {
        (*self).delete_task(id)
    }

    fn load_tasks(&self) -> Result<Vec<Task>, Self::Error> {
        (*self).load_tasks()
    }

    fn insert_subtask(&self, subtask: &SubTask) -> Result<(), Self::Error> {
        (*self).insert_subtask(subtask)
    }

    fn update_subtask(&self, subtask: &SubTask) -> Result<bool, Self::Error> {
        (*self).update_subtask(subtask)
    }

    fn delete_subtask(&self, id: &SubTaskId) -> Result<bool, Self::Error> {
        (*self).delete_subtask(id)
    }

    fn load_subtasks(&self) -> Result<Vec<SubTask>, Self::Error> {
        (*self).load_subtasks()
    }

    fn subtasks_of(&self, parent: &TaskId) -> Result<Vec<SubTask>, Self::Error> {
        (*self).subtasks_of(parent)
    }
}
