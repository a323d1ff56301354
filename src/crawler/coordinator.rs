//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator drives a small state machine:
//!
//! ```text
//! Planning(w) -> WalkingWindow(w) -> Advancing(w) -> Planning(next) | Done
//! ```
//!
//! Within `WalkingWindow` each listing page is resolved item by item in page
//! order before the next page is requested. One request is in flight at a
//! time; windows are processed in chronological order.

use crate::config::{validate, Config};
use crate::crawler::fetcher::PortalClient;
use crate::crawler::listing::{ListingWalker, PageOutcome};
use crate::crawler::parser::ListingParser;
use crate::crawler::resolver::DocumentResolver;
use crate::crawler::throttle::Throttle;
use crate::output::{CrawlStats, LogProgress, ProgressReporter};
use crate::state::{DownloadOutcome, RecordId, SkipReason};
use crate::storage::{CompletionCache, CompletionStore, DocumentStore};
use crate::window::{next_window, DateWindow};
use crate::HarvestError;
use chrono::{Local, NaiveDate};

/// Driver states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrawlPhase {
    /// Holds the window about to be crawled
    Planning(DateWindow),
    /// Walking listing pages and resolving their records
    WalkingWindow(DateWindow),
    /// Window finished; decide whether another one follows
    Advancing(DateWindow),
    Done,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    portal: PortalClient,
    listing: ListingParser,
    resolver: DocumentResolver,
    cache: CompletionCache,
    stats: CrawlStats,
    progress: Box<dyn ProgressReporter>,
}

impl Coordinator {
    /// Creates a coordinator, loading the completion log named in the config
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Invalid configuration or unreadable completion log
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        validate(&config)?;
        let cache = CompletionCache::load(&config.output.cache_path)?;
        Self::build(config, cache)
    }

    /// Creates a coordinator around an already loaded completion log
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl configuration, validated here
    /// * `cache` - Completion log the crawl consults and appends to
    pub fn with_cache(config: Config, cache: CompletionCache) -> Result<Self, HarvestError> {
        validate(&config)?;
        Self::build(config, cache)
    }

    fn build(config: Config, cache: CompletionCache) -> Result<Self, HarvestError> {
        let portal = PortalClient::new(&config)?;
        let listing = ListingParser::from_config(&config.portal)?;
        let resolver = DocumentResolver::new(
            portal.clone(),
            DocumentStore::new(&config.output.root_dir),
            Throttle::new(config.crawl.throttle()),
            config.portal.success_status.clone(),
        );

        tracing::info!(
            "Completion log {} holds {} downloaded records",
            cache.path().display(),
            cache.len()
        );

        Ok(Self {
            config,
            portal,
            listing,
            resolver,
            cache,
            stats: CrawlStats::new(),
            progress: Box::new(LogProgress::new()),
        })
    }

    pub fn cache(&self) -> &CompletionCache {
        &self.cache
    }

    /// Runs the crawl with today as the ceiling for window extension
    pub async fn run(&mut self) -> Result<CrawlStats, HarvestError> {
        let today = Local::now().date_naive();
        self.run_until(today).await
    }

    /// Runs the crawl, extending windows no further than `ceiling`
    ///
    /// Per-record and per-page failures are counted, never returned. The
    /// returned stats are the final counters of the run.
    pub async fn run_until(&mut self, ceiling: NaiveDate) -> Result<CrawlStats, HarvestError> {
        let mut phase = CrawlPhase::Planning(self.config.initial_window()?);

        loop {
            phase = match phase {
                CrawlPhase::Planning(window) => {
                    self.progress.window_started(&window);
                    CrawlPhase::WalkingWindow(window)
                }
                CrawlPhase::WalkingWindow(window) => {
                    self.walk_window(window).await;
                    CrawlPhase::Advancing(window)
                }
                CrawlPhase::Advancing(window) => {
                    if !self.config.crawl.repeat_till_date {
                        CrawlPhase::Done
                    } else if let Some(next) = next_window(window.end(), ceiling) {
                        CrawlPhase::Planning(next)
                    } else {
                        tracing::info!("Reached {}, no windows left", ceiling);
                        CrawlPhase::Done
                    }
                }
                CrawlPhase::Done => break,
            };
        }

        self.progress.finish(&self.stats);
        Ok(self.stats.clone())
    }

    /// Walks every listing page of one window, resolving records as they come
    async fn walk_window(&mut self, window: DateWindow) {
        let mut walker = ListingWalker::new(
            &self.portal,
            &self.listing,
            window,
            self.config.crawl.page_pacing(),
        );

        while let Some(page) = walker.next_page().await {
            self.stats.pages += 1;

            match page {
                PageOutcome::Records { page, ids } => {
                    tracing::info!("Window {} page {}: {} records", window, page, ids.len());
                    self.stats.record_scraped(ids.len());

                    for id in ids {
                        let outcome = if self.cache.contains(&id) {
                            DownloadOutcome::Skipped(SkipReason::AlreadyCached)
                        } else {
                            self.resolver.resolve(&window, &id, &mut self.cache).await
                        };

                        log_outcome(&id, &outcome);
                        self.stats.record(&outcome);
                        self.progress.update(&self.stats);
                    }
                }
                PageOutcome::Exhausted { page, blocks } => {
                    tracing::info!(
                        "Window {} finished at page {} ({} blocks)",
                        window,
                        page,
                        blocks
                    );
                    self.stats.windows_completed += 1;
                }
                PageOutcome::Aborted { page, error } => {
                    tracing::warn!("Window {} aborted at page {}: {}", window, page, error);
                    self.stats.windows_aborted += 1;
                }
            }
        }
    }
}

fn log_outcome(id: &RecordId, outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Downloaded { bytes, path } => {
            tracing::info!("Downloaded {} ({} bytes) to {}", id, bytes, path.display());
        }
        DownloadOutcome::Skipped(_) => {
            tracing::debug!("Skipping {}: already downloaded", id);
        }
        DownloadOutcome::Failed(reason) => {
            tracing::warn!("Failed {} [{}]: {}", id, reason.category(), reason);
        }
    }
}
