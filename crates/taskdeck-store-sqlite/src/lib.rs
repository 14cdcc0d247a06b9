//! SQLite-backed persistence for taskdeck.
//!
//! Two tables, `tasks` and `subtasks`, each keyed by its own primary key
//! column. All operations are synchronous and rely on SQLite's per-call
//! atomicity; there is no batching, pooling, or retry logic. One
//! connection per store instance.

mod error;

use std::path::Path;

use rusqlite::{Connection, Row, params};
use taskdeck_core::{SubTask, Task, tags};
use tracing::debug;

pub use error::StoreError;

const SCHEMA_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    descriptionTask TEXT,
    dateCreated REAL NOT NULL,
    isCompleted BOOLEAN NOT NULL,
    tags TEXT NOT NULL,
    priority INTEGER
)";
const SCHEMA_SUBTASKS: &str = "CREATE TABLE IF NOT EXISTS subtasks (
    subTaskID TEXT PRIMARY KEY,
    parentTaskID TEXT NOT NULL,
    subTaskTitle TEXT NOT NULL,
    isSubTaskCompleted BOOLEAN NOT NULL
)";

const INSERT_TASK: &str = "INSERT INTO tasks
    (id, title, descriptionTask, dateCreated, isCompleted, tags, priority)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
// dateCreated is immutable after creation and deliberately absent here.
const UPDATE_TASK: &str = "UPDATE tasks
    SET title = ?2, descriptionTask = ?3, isCompleted = ?4, tags = ?5, priority = ?6
    WHERE id = ?1";
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = ?1";
const SELECT_TASKS: &str =
    "SELECT id, title, descriptionTask, dateCreated, isCompleted, tags, priority FROM tasks";

const INSERT_SUBTASK: &str = "INSERT INTO subtasks
    (subTaskID, parentTaskID, subTaskTitle, isSubTaskCompleted)
    VALUES (?1, ?2, ?3, ?4)";
const UPDATE_SUBTASK: &str =
    "UPDATE subtasks SET subTaskTitle = ?2, isSubTaskCompleted = ?3 WHERE subTaskID = ?1";
const DELETE_SUBTASK: &str = "DELETE FROM subtasks WHERE subTaskID = ?1";
const SELECT_SUBTASKS: &str =
    "SELECT subTaskID, parentTaskID, subTaskTitle, isSubTaskCompleted FROM subtasks";
const SELECT_SUBTASKS_BY_PARENT: &str =
    "SELECT subTaskID, parentTaskID, subTaskTitle, isSubTaskCompleted FROM subtasks
     WHERE parentTaskID = ?1";

/// Durable storage for tasks and subtasks backed by a single SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database file at `path` and ensure both tables
    /// exist. Safe to call on every process start.
    ///
    /// # Errors
    /// Returns [`StoreError::Open`] when the path is unwritable or the file
    /// is corrupt. This is fatal for the owning repository instance.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let open_error = |source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open(path).map_err(open_error)?;
        conn.execute(SCHEMA_TASKS, []).map_err(open_error)?;
        conn.execute(SCHEMA_SUBTASKS, []).map_err(open_error)?;

        debug!(path = %path.display(), "opened task database");
        Ok(Self { conn })
    }

    /// Insert a new task row.
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateKey`] when the id already exists.
    pub fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.conn
            .execute(
                INSERT_TASK,
                params![
                    task.id.as_str(),
                    task.title,
                    task.description,
                    seconds_to_column(task.date_created),
                    task.completed,
                    tags::join(&task.tags),
                    task.priority,
                ],
            )
            .map_err(|err| StoreError::from_insert(err, task.id.as_str()))?;
        debug!(id = %task.id, "inserted task row");
        Ok(())
    }

    /// Replace every mutable column of the row matching `task.id`.
    ///
    /// Returns `Ok(false)` when no such row exists.
    ///
    /// # Errors
    /// Propagates SQLite failures.
    pub fn update_task(&self, task: &Task) -> Result<bool, StoreError> {
        let affected = self.conn.execute(
            UPDATE_TASK,
            params![
                task.id.as_str(),
                task.title,
                task.description,
                task.completed,
                tags::join(&task.tags),
                task.priority,
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete the task row matching `id`.
    ///
    /// Returns `Ok(false)` when no row matched; this is benign, not a
    /// corruption signal.
    ///
    /// # Errors
    /// Propagates SQLite failures.
    pub fn delete_task(&self, id: &taskdeck_core::TaskId) -> Result<bool, StoreError> {
        let affected = self.conn.execute(DELETE_TASK, params![id.as_str()])?;
        Ok(affected > 0)
    }

    /// Scan every task row in storage order. Subtask relations are not
    /// attached here; the repository joins them from the subtask table.
    ///
    /// # Errors
    /// Propagates SQLite failures.
    pub fn load_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_TASKS)?;
        let rows = stmt.query_map([], task_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Insert a new subtask row.
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateKey`] when the id already exists.
    pub fn insert_subtask(&self, subtask: &SubTask) -> Result<(), StoreError> {
        self.conn
            .execute(
                INSERT_SUBTASK,
                params![
                    subtask.id.as_str(),
                    subtask.parent_task_id.as_str(),
                    subtask.title,
                    subtask.completed,
                ],
            )
            .map_err(|err| StoreError::from_insert(err, subtask.id.as_str()))?;
        debug!(id = %subtask.id, parent = %subtask.parent_task_id, "inserted subtask row");
        Ok(())
    }

    /// Replace the mutable columns of the subtask row matching `subtask.id`.
    ///
    /// Returns `Ok(false)` when no such row exists.
    ///
    /// # Errors
    /// Propagates SQLite failures.
    pub fn update_subtask(&self, subtask: &SubTask) -> Result<bool, StoreError> {
        let affected = self.conn.execute(
            UPDATE_SUBTASK,
            params![subtask.id.as_str(), subtask.title, subtask.completed],
        )?;
        Ok(affected > 0)
    }

    /// Delete the subtask row matching `id`. Returns `Ok(false)` when no
    /// row matched.
    ///
    /// # Errors
    /// Propagates SQLite failures.
    pub fn delete_subtask(&self, id: &taskdeck_core::SubTaskId) -> Result<bool, StoreError> {
        let affected = self.conn.execute(DELETE_SUBTASK, params![id.as_str()])?;
        Ok(affected > 0)
    }

    /// Scan every subtask row in storage order.
    ///
    /// # Errors
    /// Propagates SQLite failures.
    pub fn load_subtasks(&self) -> Result<Vec<SubTask>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_SUBTASKS)?;
        let rows = stmt.query_map([], subtask_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Scan subtask rows whose parent matches `parent`, in storage order.
    ///
    /// # Errors
    /// Propagates SQLite failures.
    pub fn subtasks_of(
        &self,
        parent: &taskdeck_core::TaskId,
    ) -> Result<Vec<SubTask>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_SUBTASKS_BY_PARENT)?;
        let rows = stmt.query_map(params![parent.as_str()], subtask_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let tags_column: String = row.get(5)?;
    Ok(Task {
        id: parse_id(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date_created: seconds_from_column(row.get(3)?),
        completed: row.get(4)?,
        tags: tags::split(&tags_column),
        priority: row.get(6)?,
        subtasks: Vec::new(),
    })
}

fn subtask_from_row(row: &Row<'_>) -> rusqlite::Result<SubTask> {
    Ok(SubTask {
        id: parse_id(row, 0)?,
        parent_task_id: parse_id(row, 1)?,
        title: row.get(2)?,
        completed: row.get(3)?,
    })
}

fn parse_id<T>(row: &Row<'_>, index: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = taskdeck_core::ParseIdError>,
{
    let raw: String = row.get(index)?;
    raw.parse().map_err(|err: taskdeck_core::ParseIdError| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
    })
}

// dateCreated is declared REAL for compatibility with the published
// schema; values are integral epoch seconds in practice.
#[allow(clippy::cast_precision_loss)]
const fn seconds_to_column(secs: i64) -> f64 {
    secs as f64
}

#[allow(clippy::cast_possible_truncation)]
const fn seconds_from_column(column: f64) -> i64 {
    column as i64
}
