//! Application layer for taskdeck.
//!
//! This crate owns the task repository (the authoritative in-memory cache
//! with write-through persistence), the storage trait seam, the
//! change-notification channel, and host configuration loading.

pub mod config;
pub mod notify;
pub mod repository;
pub mod store;
pub mod task_patch;

// Re-exports for convenience
pub use config::AppConfig;
pub use notify::SnapshotChannel;
pub use repository::{RepositoryError, TaskRepository};
pub use store::TaskStore;
pub use task_patch::{NewTask, SubTaskUpdate, TaskUpdate};
pub use taskdeck_core::{SubTask, SubTaskId, Task, TaskId};
pub use taskdeck_store_sqlite::{SqliteStore, StoreError};
