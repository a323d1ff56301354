//! Storage traits and error types

use crate::state::RecordId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable set of record ids whose documents are safely on disk
///
/// Implementations must persist an id before reporting it as contained, and
/// must never remove entries.
pub trait CompletionStore {
    /// Returns true if `id` was downloaded by this or an earlier run
    fn contains(&self, id: &RecordId) -> bool;

    /// Durably records `id` as downloaded
    ///
    /// Recording an id that is already present is a no-op.
    fn record(&mut self, id: &RecordId) -> StorageResult<()>;

    /// Number of recorded ids
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
