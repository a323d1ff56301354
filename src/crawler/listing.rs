//! Listing pagination for one date window
//!
//! Pages are requested as 0, 1, 2, ... with a fixed pacing delay in between,
//! until a page yields no records. A failed page request ends the walk of the
//! window; it is not retried.

use crate::crawler::fetcher::PortalClient;
use crate::crawler::parser::ListingParser;
use crate::state::RecordId;
use crate::window::DateWindow;
use crate::FetchError;
use std::time::Duration;

/// What one listing page request produced
#[derive(Debug)]
pub enum PageOutcome {
    /// Record ids in page order
    Records { page: u32, ids: Vec<RecordId> },

    /// The page carried no records; the window is done
    Exhausted { page: u32, blocks: usize },

    /// The request failed; the rest of the window is abandoned
    Aborted { page: u32, error: FetchError },
}

/// Walks the listing pages of one window
///
/// The walker does not deduplicate ids; that is left to the caller.
pub struct ListingWalker<'a> {
    portal: &'a PortalClient,
    parser: &'a ListingParser,
    window: DateWindow,
    pacing: Duration,
    next_page: u32,
    finished: bool,
}

impl<'a> ListingWalker<'a> {
    /// Creates a walker positioned before page 0
    ///
    /// # Arguments
    ///
    /// * `portal` - Client used for the listing requests
    /// * `parser` - Extracts record ids from each page
    /// * `window` - Date window sent with every request
    /// * `pacing` - Delay before every page after the first
    pub fn new(
        portal: &'a PortalClient,
        parser: &'a ListingParser,
        window: DateWindow,
        pacing: Duration,
    ) -> Self {
        Self {
            portal,
            parser,
            window,
            pacing,
            next_page: 0,
            finished: false,
        }
    }

    /// Requests the next page
    ///
    /// Returns `None` once an `Exhausted` or `Aborted` outcome has been
    /// returned; no further request is made after that.
    pub async fn next_page(&mut self) -> Option<PageOutcome> {
        if self.finished {
            return None;
        }

        let page = self.next_page;
        if page > 0 && !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
        self.next_page += 1;

        tracing::debug!("Requesting page {} of window {}", page, self.window);
        let html = match self.portal.fetch_listing_page(&self.window, page).await {
            Ok(html) => html,
            Err(error) => {
                self.finished = true;
                return Some(PageOutcome::Aborted { page, error });
            }
        };

        let listing = self.parser.parse(&html);
        if listing.is_terminal() {
            self.finished = true;
            return Some(PageOutcome::Exhausted {
                page,
                blocks: listing.blocks,
            });
        }

        Some(PageOutcome::Records {
            page,
            ids: listing.ids,
        })
    }
}
