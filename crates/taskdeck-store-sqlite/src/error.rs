//! Error types for the SQLite-backed store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`SqliteStore`](crate::SqliteStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database file could not be opened or its schema created.
    ///
    /// Fatal for the owning repository instance; callers should drop the
    /// instance and reconstruct rather than retry.
    #[error("failed to open task database at {path}: {source}")]
    Open {
        /// Path that was passed to `open`.
        path: PathBuf,
        /// Underlying SQLite failure.
        source: rusqlite::Error,
    },

    /// An insert hit an existing primary key.
    #[error("duplicate primary key: {0}")]
    DuplicateKey(String),

    /// Any other SQLite failure.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Classify an insert failure, mapping primary-key conflicts to
    /// [`StoreError::DuplicateKey`].
    pub(crate) fn from_insert(err: rusqlite::Error, key: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::DuplicateKey(key.to_owned())
            }
            _ => Self::Sqlite(err),
        }
    }
}
