//! Storage module for crawl results
//!
//! This module handles everything the crawl persists:
//! - The completion log of downloaded record ids (the only resume mechanism)
//! - Downloaded documents, one directory per date window

mod completion_log;
mod documents;
mod traits;

pub use completion_log::CompletionCache;
pub use documents::DocumentStore;
pub use traits::{CompletionStore, StorageError, StorageResult};

use crate::HarvestError;
use std::path::Path;

/// Opens the completion log at `path`, creating nothing until the first append
///
/// # Returns
///
/// * `Ok(CompletionCache)` - Cache holding every id logged by earlier runs
/// * `Err(HarvestError)` - The log exists but could not be read
pub fn open_cache(path: &Path) -> Result<CompletionCache, HarvestError> {
    Ok(CompletionCache::load(path)?)
}
