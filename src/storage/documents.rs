//! Downloaded document layout
//!
//! `<root>/<DD-MM-YYYY>_to_<DD-MM-YYYY>/<record id>.pdf`
//!
//! Documents are written to a `.part` sibling and renamed into place, so a
//! file carrying the final name is always complete.

use crate::state::RecordId;
use crate::storage::traits::{StorageError, StorageResult};
use crate::window::DateWindow;
use std::io::Write;
use std::path::PathBuf;

/// Writes documents under a root directory, one sub-directory per window
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the documents of `window`
    pub fn window_dir(&self, window: &DateWindow) -> PathBuf {
        self.root.join(window.dir_name())
    }

    /// Final path of the document for `id` in `window`
    pub fn document_path(&self, window: &DateWindow, id: &RecordId) -> PathBuf {
        self.window_dir(window).join(id.file_name())
    }

    /// Writes a document, replacing any earlier copy
    ///
    /// File IO here is blocking and runs on the calling task.
    ///
    /// # Arguments
    ///
    /// * `window` - Window whose directory receives the document
    /// * `id` - Record the document belongs to; names the file
    /// * `bytes` - Complete document body
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the complete document
    /// * `Err(StorageError)` - Directory creation, write or rename failed
    pub fn write(&self, window: &DateWindow, id: &RecordId, bytes: &[u8]) -> StorageResult<PathBuf> {
        let dir = self.window_dir(window);
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let path = self.document_path(window, id);
        let partial = dir.join(format!("{}.part", id.file_name()));

        let mut file = std::fs::File::create(&partial).map_err(|e| StorageError::io(&partial, e))?;
        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| StorageError::io(&partial, e))?;
        drop(file);

        std::fs::rename(&partial, &path).map_err(|e| StorageError::io(&path, e))?;
        Ok(path)
    }
}
