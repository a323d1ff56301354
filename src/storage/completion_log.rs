//! Append-only completion log
//!
//! One record id per line, newline-terminated, no header. The file is the
//! source of truth: an id is appended and synced before it enters the
//! in-memory set, so a crash can only ever cause a re-download.

use crate::state::RecordId;
use crate::storage::traits::{CompletionStore, StorageError, StorageResult};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-backed [`CompletionStore`]
#[derive(Debug)]
pub struct CompletionCache {
    path: PathBuf,
    ids: HashSet<String>,
    writer: Option<File>,
    needs_newline: bool,
}

impl CompletionCache {
    /// Loads the log at `path`
    ///
    /// A missing file is an empty cache. Lines are trimmed and blank lines
    /// ignored.
    ///
    /// # Returns
    ///
    /// * `Ok(CompletionCache)` - Cache holding every logged id
    /// * `Err(StorageError)` - The log exists but could not be read
    pub fn load(path: &Path) -> StorageResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        let ids: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        tracing::debug!("Loaded {} completed ids from {}", ids.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            ids,
            writer: None,
            needs_newline: !content.is_empty() && !content.ends_with('\n'),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_writer(&self) -> StorageResult<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))
    }
}

impl CompletionStore for CompletionCache {
    fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id.as_str())
    }

    fn record(&mut self, id: &RecordId) -> StorageResult<()> {
        if self.contains(id) {
            return Ok(());
        }

        let line = if self.needs_newline {
            format!("\n{}\n", id)
        } else {
            format!("{}\n", id)
        };

        // The log is opened lazily so a run that downloads nothing creates no file
        let mut file = match self.writer.take() {
            Some(file) => file,
            None => self.open_writer()?,
        };
        let written = file
            .write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data());
        if let Err(e) = written {
            // Part of the line may be on disk; the next append reopens the
            // log and starts on a fresh line
            self.needs_newline = true;
            return Err(StorageError::io(&self.path, e));
        }
        self.writer = Some(file);

        self.needs_newline = false;
        self.ids.insert(id.as_str().to_string());
        Ok(())
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
