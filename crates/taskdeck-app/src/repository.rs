//! Write-through task repository with snapshot broadcasting.
//!
//! The repository owns the authoritative in-memory task and subtask lists,
//! mediates every mutation through the persistent store, and republishes
//! the full updated snapshot after each change. Single-writer by design:
//! every operation takes `&mut self` and runs to completion on the calling
//! thread, so multi-threaded hosts must serialize access externally.

use std::path::Path;

use anyhow::Error;
use taskdeck_core::{SubTask, SubTaskId, Task, TaskId};
use taskdeck_store_sqlite::SqliteStore;
use tracing::{debug, warn};

use crate::notify::SnapshotChannel;
use crate::store::TaskStore;
use crate::task_patch::{NewTask, SubTaskUpdate, TaskUpdate};

/// Errors surfaced by [`TaskRepository`] operations.
///
/// Absent entities are not errors; lookups and updates against unknown ids
/// report `None` or no-op instead.
#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    /// Backing store returned an error. With store-first write ordering
    /// the cache has not been mutated when this is returned.
    #[error("store error: {0}")]
    Store(#[from] Error),
    /// An entity present in the cache has no stored row. Cache and store
    /// have diverged; the caller should reconstruct the repository.
    #[error("store has no row for {0}; cache reload required")]
    RowMissing(String),
}

/// Authoritative in-memory cache synchronized write-through with a
/// persistent store.
pub struct TaskRepository<S> {
    store: S,
    tasks: Vec<Task>,
    subtasks: Vec<SubTask>,
    task_channel: SnapshotChannel<Task>,
    subtask_channel: SnapshotChannel<SubTask>,
}

impl TaskRepository<SqliteStore> {
    /// Open the SQLite database at `path` and wrap it in a repository.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Store`] when the database cannot be
    /// opened; the failure is fatal for this instance (no retry).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let store = SqliteStore::open(path).map_err(|err| RepositoryError::Store(err.into()))?;
        Ok(Self::new(store))
    }
}

impl<S> TaskRepository<S> {
    /// Construct a repository over the given store. The cache starts empty
    /// and hydrates lazily on first read.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            tasks: Vec::new(),
            subtasks: Vec::new(),
            task_channel: SnapshotChannel::new(),
            subtask_channel: SnapshotChannel::new(),
        }
    }

    /// Number of tasks currently cached. Does not hydrate.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Register a handler for task snapshots. It is invoked synchronously
    /// with the current snapshot before this call returns, then after
    /// every task mutation, in subscription order. Handlers persist for
    /// the repository's lifetime. A handler must not re-enter the
    /// repository; the exclusive borrow makes that unrepresentable here.
    pub fn subscribe(&mut self, handler: impl FnMut(&[Task]) + 'static) {
        self.task_channel.subscribe(handler);
    }

    /// Register a handler for subtask snapshots. Same delivery contract as
    /// [`subscribe`](Self::subscribe).
    pub fn subscribe_subtasks(&mut self, handler: impl FnMut(&[SubTask]) + 'static) {
        self.subtask_channel.subscribe(handler);
    }

    fn publish_tasks(&mut self) {
        self.task_channel.publish(self.tasks.clone());
    }

    fn publish_subtasks(&mut self) {
        self.subtask_channel.publish(self.subtasks.clone());
    }
}

impl<S> TaskRepository<S>
where
    S: TaskStore,
{
    fn store_error(err: S::Error) -> RepositoryError {
        RepositoryError::Store(err.into())
    }

    /// Hydrate the task cache from the store when it is empty.
    ///
    /// A hydration that loads rows republishes them, so the channel's held
    /// snapshot never lags behind the cache. An externally emptied store is
    /// indistinguishable from a process-fresh cache under this rule;
    /// accepted and documented.
    fn hydrate_tasks_if_empty(&mut self) -> Result<(), RepositoryError> {
        if !self.tasks.is_empty() {
            return Ok(());
        }
        let mut tasks = self.store.load_tasks().map_err(Self::store_error)?;
        for task in &mut tasks {
            task.subtasks = self
                .store
                .subtasks_of(&task.id)
                .map_err(Self::store_error)?;
        }
        self.tasks = tasks;
        if !self.tasks.is_empty() {
            debug!(count = self.tasks.len(), "hydrated task cache");
            self.publish_tasks();
        }
        Ok(())
    }

    fn hydrate_subtasks_if_empty(&mut self) -> Result<(), RepositoryError> {
        if !self.subtasks.is_empty() {
            return Ok(());
        }
        self.subtasks = self.store.load_subtasks().map_err(Self::store_error)?;
        if !self.subtasks.is_empty() {
            debug!(count = self.subtasks.len(), "hydrated subtask cache");
            self.publish_subtasks();
        }
        Ok(())
    }

    /// Create a task, write it through to the store, and broadcast the new
    /// snapshot. The id is generated here and never reassigned.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Store`] when the insert fails, including
    /// on a duplicate key; the cache is untouched in that case.
    pub fn add_task(&mut self, input: NewTask) -> Result<Task, RepositoryError> {
        self.hydrate_tasks_if_empty()?;

        let NewTask {
            title,
            description,
            completed,
            tags,
            priority,
        } = input;
        let mut task = Task::new(TaskId::generate(), title);
        task.description = description;
        task.completed = completed;
        task.tags = tags;
        task.priority = priority;

        // Store first: a rejected write must never leave the cache ahead
        // of durable state.
        self.store.insert_task(&task).map_err(Self::store_error)?;
        self.tasks.push(task.clone());
        debug!(id = %task.id, "task added");
        self.publish_tasks();
        Ok(task)
    }

    /// Replace the mutable fields of the task with the given id.
    ///
    /// Returns `Ok(None)` without touching the store when the id is not in
    /// the cache.
    ///
    /// # Errors
    /// Returns [`RepositoryError::RowMissing`] when the cached task has no
    /// stored row, and [`RepositoryError::Store`] on write failure; the
    /// cache is untouched in both cases.
    pub fn update_task(
        &mut self,
        id: &TaskId,
        update: TaskUpdate,
    ) -> Result<Option<Task>, RepositoryError> {
        self.hydrate_tasks_if_empty()?;
        let Some(index) = self.tasks.iter().position(|task| &task.id == id) else {
            return Ok(None);
        };

        let TaskUpdate {
            title,
            description,
            completed,
            tags,
            priority,
        } = update;
        let mut updated = self.tasks[index].clone();
        updated.title = title;
        updated.description = description;
        updated.completed = completed;
        updated.tags = tags;
        updated.priority = priority;

        if !self.store.update_task(&updated).map_err(Self::store_error)? {
            warn!(%id, "task present in cache but missing from store");
            return Err(RepositoryError::RowMissing(id.to_string()));
        }
        self.tasks[index] = updated.clone();
        self.publish_tasks();
        Ok(Some(updated))
    }

    /// Remove the task from the cache and the store. No-op (not an error)
    /// when the id is absent from the cache. Subtasks of the removed task
    /// are left in place; there is no cascade delete.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Store`] when the delete fails. A delete
    /// that matches no stored row is benign and logged.
    pub fn remove_task(&mut self, task: &Task) -> Result<(), RepositoryError> {
        self.hydrate_tasks_if_empty()?;
        let Some(index) = self.tasks.iter().position(|cached| cached.id == task.id) else {
            return Ok(());
        };

        if !self.store.delete_task(&task.id).map_err(Self::store_error)? {
            debug!(id = %task.id, "delete matched no stored task row");
        }
        self.tasks.remove(index);
        debug!(id = %task.id, "task removed");
        self.publish_tasks();
        Ok(())
    }

    /// All tasks, hydrating from the store first when the cache is empty.
    /// Once hydrated the cache is authoritative and no further scan runs.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Store`] when hydration fails.
    pub fn all_tasks(&mut self) -> Result<Vec<Task>, RepositoryError> {
        self.hydrate_tasks_if_empty()?;
        Ok(self.tasks.clone())
    }

    /// Create a subtask under `parent`. Returns `Ok(None)` without
    /// mutating the caches or the store when no such task is cached.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Store`] when the insert fails.
    pub fn add_subtask(
        &mut self,
        parent: &TaskId,
        title: impl Into<String>,
    ) -> Result<Option<SubTask>, RepositoryError> {
        self.hydrate_tasks_if_empty()?;
        self.hydrate_subtasks_if_empty()?;
        let Some(index) = self.tasks.iter().position(|task| &task.id == parent) else {
            return Ok(None);
        };

        let subtask = SubTask::new(SubTaskId::generate(), parent.clone(), title);
        self.store
            .insert_subtask(&subtask)
            .map_err(Self::store_error)?;
        self.subtasks.push(subtask.clone());
        self.tasks[index].subtasks.push(subtask.clone());
        debug!(id = %subtask.id, parent = %parent, "subtask added");
        self.publish_subtasks();
        // The parent's relation list changed with it.
        self.publish_tasks();
        Ok(Some(subtask))
    }

    /// Replace the mutable fields of the subtask with the given id.
    /// Returns `Ok(None)` when the id is not in the cache.
    ///
    /// # Errors
    /// Same contract as [`update_task`](Self::update_task).
    pub fn update_subtask(
        &mut self,
        id: &SubTaskId,
        update: SubTaskUpdate,
    ) -> Result<Option<SubTask>, RepositoryError> {
        self.hydrate_subtasks_if_empty()?;
        let Some(index) = self.subtasks.iter().position(|subtask| &subtask.id == id) else {
            return Ok(None);
        };

        let SubTaskUpdate { title, completed } = update;
        let mut updated = self.subtasks[index].clone();
        if let Some(title) = title {
            updated.title = title;
        }
        updated.completed = completed;

        if !self
            .store
            .update_subtask(&updated)
            .map_err(Self::store_error)?
        {
            warn!(%id, "subtask present in cache but missing from store");
            return Err(RepositoryError::RowMissing(id.to_string()));
        }
        self.subtasks[index] = updated.clone();
        let parent_changed = self.sync_parent_relation(&updated);
        self.publish_subtasks();
        if parent_changed {
            self.publish_tasks();
        }
        Ok(Some(updated))
    }

    /// Delete the subtask from the cache and the store. No-op when the id
    /// is absent from the cache.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Store`] when the delete fails.
    pub fn delete_subtask(&mut self, id: &SubTaskId) -> Result<(), RepositoryError> {
        self.hydrate_subtasks_if_empty()?;
        let Some(index) = self.subtasks.iter().position(|subtask| &subtask.id == id) else {
            return Ok(());
        };

        if !self.store.delete_subtask(id).map_err(Self::store_error)? {
            debug!(%id, "delete matched no stored subtask row");
        }
        let removed = self.subtasks.remove(index);
        let parent_changed = self.detach_from_parent(&removed);
        debug!(%id, "subtask removed");
        self.publish_subtasks();
        if parent_changed {
            self.publish_tasks();
        }
        Ok(())
    }

    /// Subtasks belonging to `parent`. An unknown task and a task with no
    /// subtasks both yield an empty list; callers that need to tell them
    /// apart must check task existence separately.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Store`] when hydration fails.
    pub fn subtasks_of(&mut self, parent: &TaskId) -> Result<Vec<SubTask>, RepositoryError> {
        self.hydrate_subtasks_if_empty()?;
        Ok(self
            .subtasks
            .iter()
            .filter(|subtask| &subtask.parent_task_id == parent)
            .cloned()
            .collect())
    }

    fn sync_parent_relation(&mut self, subtask: &SubTask) -> bool {
        let Some(parent) = self
            .tasks
            .iter_mut()
            .find(|task| task.id == subtask.parent_task_id)
        else {
            return false;
        };
        let Some(slot) = parent.subtasks.iter_mut().find(|s| s.id == subtask.id) else {
            return false;
        };
        *slot = subtask.clone();
        true
    }

    fn detach_from_parent(&mut self, subtask: &SubTask) -> bool {
        let Some(parent) = self
            .tasks
            .iter_mut()
            .find(|task| task.id == subtask.parent_task_id)
        else {
            return false;
        };
        let before = parent.subtasks.len();
        parent.subtasks.retain(|s| s.id != subtask.id);
        parent.subtasks.len() != before
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MockStore {
        inner: RefCell<MockInner>,
    }

    #[derive(Default)]
    struct MockInner {
        tasks: Vec<Task>,
        subtasks: Vec<SubTask>,
        load_task_scans: usize,
        task_updates: usize,
        fail_writes: bool,
    }

    impl MockStore {
        fn seeded(tasks: Vec<Task>) -> Self {
            Self {
                inner: RefCell::new(MockInner {
                    tasks,
                    ..MockInner::default()
                }),
            }
        }

        fn failing_writes(self) -> Self {
            self.inner.borrow_mut().fail_writes = true;
            self
        }

        fn load_task_scans(&self) -> usize {
            self.inner.borrow().load_task_scans
        }

        fn task_updates(&self) -> usize {
            self.inner.borrow().task_updates
        }

        fn stored_tasks(&self) -> Vec<Task> {
            self.inner.borrow().tasks.clone()
        }

        fn stored_subtasks(&self) -> Vec<SubTask> {
            self.inner.borrow().subtasks.clone()
        }
    }

    impl TaskStore for MockStore {
        type Error = anyhow::Error;

        fn insert_task(&self, task: &Task) -> Result<(), Self::Error> {
            let mut inner = self.inner.borrow_mut();
            if inner.fail_writes {
                anyhow::bail!("write rejected (simulated)");
            }
            inner.tasks.push(task.clone());
            Ok(())
        }

        fn update_task(&self, task: &Task) -> Result<bool, Self::Error> {
            let mut inner = self.inner.borrow_mut();
            inner.task_updates += 1;
            if inner.fail_writes {
                anyhow::bail!("write rejected (simulated)");
            }
            let Some(slot) = inner.tasks.iter_mut().find(|t| t.id == task.id) else {
                return Ok(false);
            };
            *slot = task.clone();
            Ok(true)
        }

        fn delete_task(&self, id: &TaskId) -> Result<bool, Self::Error> {
            let mut inner = self.inner.borrow_mut();
            let before = inner.tasks.len();
            inner.tasks.retain(|t| &t.id != id);
            Ok(inner.tasks.len() != before)
        }

        fn load_tasks(&self) -> Result<Vec<Task>, Self::Error> {
            let mut inner = self.inner.borrow_mut();
            inner.load_task_scans += 1;
            Ok(inner.tasks.clone())
        }

        fn insert_subtask(&self, subtask: &SubTask) -> Result<(), Self::Error> {
            let mut inner = self.inner.borrow_mut();
            if inner.fail_writes {
                anyhow::bail!("write rejected (simulated)");
            }
            inner.subtasks.push(subtask.clone());
            Ok(())
        }

        fn update_subtask(&self, subtask: &SubTask) -> Result<bool, Self::Error> {
            let mut inner = self.inner.borrow_mut();
            let Some(slot) = inner.subtasks.iter_mut().find(|s| s.id == subtask.id) else {
                return Ok(false);
            };
            *slot = subtask.clone();
            Ok(true)
        }

        fn delete_subtask(&self, id: &SubTaskId) -> Result<bool, Self::Error> {
            let mut inner = self.inner.borrow_mut();
            let before = inner.subtasks.len();
            inner.subtasks.retain(|s| &s.id != id);
            Ok(inner.subtasks.len() != before)
        }

        fn load_subtasks(&self) -> Result<Vec<SubTask>, Self::Error> {
            Ok(self.inner.borrow().subtasks.clone())
        }

        fn subtasks_of(&self, parent: &TaskId) -> Result<Vec<SubTask>, Self::Error> {
            Ok(self
                .inner
                .borrow()
                .subtasks
                .iter()
                .filter(|s| &s.parent_task_id == parent)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn hydration_scans_once_while_cache_is_populated() {
        let store = MockStore::seeded(vec![Task::new(TaskId::generate(), "seeded")]);
        let mut repo = TaskRepository::new(&store);

        assert_eq!(repo.all_tasks().expect("first read").len(), 1);
        assert_eq!(repo.all_tasks().expect("second read").len(), 1);
        assert_eq!(store.load_task_scans(), 1);
    }

    #[test]
    fn empty_store_rescans_until_cache_is_populated() {
        let store = MockStore::default();
        let mut repo = TaskRepository::new(&store);

        assert!(repo.all_tasks().expect("first read").is_empty());
        assert!(repo.all_tasks().expect("second read").is_empty());
        // An empty cache cannot be told apart from a fresh one, so each
        // read scans again.
        assert_eq!(store.load_task_scans(), 2);
    }

    #[test]
    fn failed_insert_leaves_cache_unmutated() {
        let store = MockStore::default().failing_writes();
        let mut repo = TaskRepository::new(&store);

        let err = repo
            .add_task(NewTask::titled("doomed"))
            .expect_err("insert must fail");
        assert!(matches!(err, RepositoryError::Store(_)));
        assert_eq!(repo.task_count(), 0);
        assert!(store.stored_tasks().is_empty());
    }

    #[test]
    fn failed_insert_publishes_no_snapshot() {
        let store = MockStore::default().failing_writes();
        let mut repo = TaskRepository::new(&store);

        let deliveries = std::rc::Rc::new(RefCell::new(0_usize));
        let sink = std::rc::Rc::clone(&deliveries);
        repo.subscribe(move |_| *sink.borrow_mut() += 1);
        assert_eq!(*deliveries.borrow(), 1); // immediate replay only

        let _ = repo.add_task(NewTask::titled("doomed"));
        assert_eq!(*deliveries.borrow(), 1);
    }

    #[test]
    fn update_of_unknown_id_performs_no_store_write() {
        let store = MockStore::seeded(vec![Task::new(TaskId::generate(), "existing")]);
        let mut repo = TaskRepository::new(&store);

        let outcome = repo
            .update_task(&TaskId::generate(), TaskUpdate::titled("x"))
            .expect("update");
        assert!(outcome.is_none());
        assert_eq!(store.task_updates(), 0);
    }

    #[test]
    fn cached_task_without_stored_row_reports_divergence() {
        let seeded = Task::new(TaskId::generate(), "cached");
        let store = MockStore::seeded(vec![seeded.clone()]);
        let mut repo = TaskRepository::new(&store);
        repo.all_tasks().expect("hydrate");

        // Row vanishes behind the repository's back.
        store.inner.borrow_mut().tasks.clear();

        let err = repo
            .update_task(&seeded.id, TaskUpdate::titled("renamed"))
            .expect_err("update must report divergence");
        assert!(matches!(err, RepositoryError::RowMissing(_)));
        // The cache keeps the pre-update record.
        assert_eq!(repo.all_tasks().expect("read")[0].title, "cached");
    }

    #[test]
    fn subtask_against_unknown_parent_mutates_nothing() {
        let store = MockStore::default();
        let mut repo = TaskRepository::new(&store);

        let outcome = repo
            .add_subtask(&TaskId::generate(), "orphan")
            .expect("add_subtask");
        assert!(outcome.is_none());
        assert!(store.stored_subtasks().is_empty());
        assert!(repo.subtasks_of(&TaskId::generate()).expect("read").is_empty());
    }

    #[test]
    fn hydration_publishes_loaded_snapshot() {
        let store = MockStore::seeded(vec![Task::new(TaskId::generate(), "seeded")]);
        let mut repo = TaskRepository::new(&store);

        let sizes = std::rc::Rc::new(RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&sizes);
        repo.subscribe(move |snapshot: &[Task]| sink.borrow_mut().push(snapshot.len()));
        assert_eq!(*sizes.borrow(), vec![0]); // replay before the first read

        repo.all_tasks().expect("hydrate");
        assert_eq!(*sizes.borrow(), vec![0, 1]);

        // A late subscriber replays the hydrated list, not the initial
        // empty one.
        let late = std::rc::Rc::new(RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&late);
        repo.subscribe(move |snapshot: &[Task]| sink.borrow_mut().push(snapshot.len()));
        assert_eq!(*late.borrow(), vec![1]);
    }

    #[test]
    fn hydration_attaches_subtask_relations() {
        let parent = Task::new(TaskId::generate(), "parent");
        let sub = SubTask::new(SubTaskId::generate(), parent.id.clone(), "child");
        let store = MockStore::seeded(vec![parent.clone()]);
        store.inner.borrow_mut().subtasks.push(sub.clone());

        let mut repo = TaskRepository::new(&store);
        let tasks = repo.all_tasks().expect("hydrate");
        assert_eq!(tasks[0].subtasks, vec![sub]);
    }
}
