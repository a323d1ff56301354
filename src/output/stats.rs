//! Crawl counters
//!
//! Owned by the coordinator, which is the only writer. Progress reporters and
//! the host binary only read them.

use crate::state::DownloadOutcome;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Record ids extracted from listing pages
    pub scraped: u64,

    /// Documents written and recorded in the completion log
    pub downloaded: u64,

    /// Records already present in the completion log
    pub skipped: u64,

    /// Records that could not be downloaded
    pub failed: u64,

    /// Total size of downloaded documents
    pub bytes_downloaded: u64,

    /// Listing pages requested, including the terminal empty page
    pub pages: u64,

    /// Windows walked until their empty page
    pub windows_completed: u64,

    /// Windows cut short by a listing request failure
    pub windows_aborted: u64,

    /// Failed records by failure category
    pub failures: BTreeMap<String, u64>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts ids extracted from one listing page
    pub fn record_scraped(&mut self, count: usize) {
        self.scraped += count as u64;
    }

    /// Counts the outcome of one record
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { bytes, .. } => {
                self.downloaded += 1;
                self.bytes_downloaded += *bytes as u64;
            }
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Failed(reason) => {
                self.failed += 1;
                *self.failures.entry(reason.category().to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Records that reached an outcome so far
    pub fn processed(&self) -> u64 {
        self.downloaded + self.skipped + self.failed
    }
}

/// Prints the final summary to stdout
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!(
        "  Windows: {} completed, {} aborted",
        stats.windows_completed, stats.windows_aborted
    );
    println!("  Listing pages requested: {}", stats.pages);
    println!();

    println!("Records:");
    println!("  Scraped: {}", stats.scraped);
    println!(
        "  Downloaded: {} ({:.1} MiB)",
        stats.downloaded,
        stats.bytes_downloaded as f64 / (1024.0 * 1024.0)
    );
    println!("  Skipped (already downloaded): {}", stats.skipped);
    println!("  Failed: {}", stats.failed);
    println!();

    if !stats.failures.is_empty() {
        println!("Failure Summary:");
        let mut failure_counts: Vec<_> = stats.failures.iter().collect();
        failure_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (category, count) in failure_counts {
            println!("  {}: {}", category, count);
        }
        println!();
    }

    if stats.failed > 0 {
        println!("Failed records were not logged as complete and will be retried on the next run.");
    }
}
