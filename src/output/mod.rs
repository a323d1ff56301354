//! Output module for crawl progress and results
//!
//! This module handles:
//! - Counting record outcomes during the crawl
//! - Reporting live progress
//! - Printing the final summary

mod progress;
pub mod stats;

pub use progress::{LogProgress, ProgressReporter};
pub use stats::{print_statistics, CrawlStats};
