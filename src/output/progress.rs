//! Live progress reporting

use crate::output::CrawlStats;
use crate::window::DateWindow;
use std::time::Instant;

/// Receives counter updates while the crawl runs
pub trait ProgressReporter: Send {
    /// Called when the coordinator starts walking a window
    fn window_started(&self, _window: &DateWindow) {}

    /// Called after every record outcome
    fn update(&self, stats: &CrawlStats);

    /// Called once when the crawl is done
    fn finish(&self, _stats: &CrawlStats) {}
}

/// Reports progress as one log line per record
#[derive(Debug)]
pub struct LogProgress {
    started: Instant,
}

impl LogProgress {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn rate(&self, stats: &CrawlStats) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            stats.processed() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for LogProgress {
    fn window_started(&self, window: &DateWindow) {
        tracing::info!("Window {} ({} days)", window, window.days());
    }

    fn update(&self, stats: &CrawlStats) {
        tracing::info!(
            "Progress: scraped {} | downloaded {} | skipped {} | failed {} | {:.2} items/sec",
            stats.scraped,
            stats.downloaded,
            stats.skipped,
            stats.failed,
            self.rate(stats)
        );
    }

    fn finish(&self, stats: &CrawlStats) {
        tracing::info!(
            "Crawl finished in {:?}: {} downloaded, {} skipped, {} failed",
            self.started.elapsed(),
            stats.downloaded,
            stats.skipped,
            stats.failed
        );
    }
}
