//! Per-record state for the crawl
//!
//! # Components
//!
//! - `RecordId`: the portal's identifier for one contract
//! - `DownloadOutcome`: what happened to one record (downloaded, skipped, failed)
//! - `FailureReason`: why a record could not be downloaded

mod outcome;
mod record_id;

// Re-export main types
pub use outcome::{DownloadOutcome, FailureReason, ResolveStep, SkipReason};
pub use record_id::RecordId;
