//! Record-to-document resolution
//!
//! For one record id:
//! 1. Throttle delay
//! 2. Token exchange: POST the id, require the success status
//! 3. Link resolution: pull the document link out of the response `code`
//! 4. Binary fetch: GET the link and write `<window dir>/<id>.pdf`
//! 5. Append the id to the completion log
//!
//! Every failure becomes a [`FailureReason`]; nothing here returns an error
//! to the coordinator, so one bad record never stops its siblings.

use crate::crawler::fetcher::PortalClient;
use crate::crawler::parser::{extract_document_link, TokenPayload};
use crate::crawler::throttle::Throttle;
use crate::state::{DownloadOutcome, FailureReason, RecordId, ResolveStep};
use crate::storage::{CompletionStore, DocumentStore};
use crate::window::DateWindow;
use crate::FetchError;
use std::path::PathBuf;

/// Downloads the document behind one record id
pub struct DocumentResolver {
    portal: PortalClient,
    documents: DocumentStore,
    throttle: Throttle,
    success_status: String,
}

impl DocumentResolver {
    pub fn new(
        portal: PortalClient,
        documents: DocumentStore,
        throttle: Throttle,
        success_status: impl Into<String>,
    ) -> Self {
        Self {
            portal,
            documents,
            throttle,
            success_status: success_status.into(),
        }
    }

    /// Resolves and downloads `id` into the directory of `window`
    ///
    /// The id is recorded in `cache` only after the document is fully on
    /// disk. A storage failure leaves it unrecorded, so the next run retries.
    ///
    /// # Arguments
    ///
    /// * `window` - Window the record was listed under
    /// * `id` - Record to download
    /// * `cache` - Completion log appended to on success
    ///
    /// # Returns
    ///
    /// The outcome for this record; failures are values, never errors.
    pub async fn resolve<S>(
        &self,
        window: &DateWindow,
        id: &RecordId,
        cache: &mut S,
    ) -> DownloadOutcome
    where
        S: CompletionStore + ?Sized,
    {
        self.throttle.wait().await;

        match self.download(window, id, cache).await {
            Ok((bytes, path)) => DownloadOutcome::Downloaded { bytes, path },
            Err(reason) => DownloadOutcome::Failed(reason),
        }
    }

    async fn download<S>(
        &self,
        window: &DateWindow,
        id: &RecordId,
        cache: &mut S,
    ) -> Result<(usize, PathBuf), FailureReason>
    where
        S: CompletionStore + ?Sized,
    {
        let body = self
            .portal
            .exchange_token(id)
            .await
            .map_err(|e| transport(ResolveStep::TokenExchange, e))?;

        let payload = TokenPayload::parse(&body).map_err(|e| FailureReason::Transport {
            step: ResolveStep::TokenExchange,
            message: format!("unreadable token response: {}", e),
        })?;

        if !payload.is_success(&self.success_status) {
            return Err(FailureReason::RemoteRejected {
                status: payload.status_text(),
            });
        }

        let link = payload
            .code
            .as_deref()
            .and_then(extract_document_link)
            .ok_or(FailureReason::NoLinkFound)?;

        let url = self
            .portal
            .resolve_link(&link)
            .map_err(|e| FailureReason::Transport {
                step: ResolveStep::LinkResolution,
                message: format!("invalid link {:?}: {}", link, e),
            })?;

        tracing::debug!("Fetching document for {} from {}", id, url);
        let bytes = self
            .portal
            .fetch_document(&url)
            .await
            .map_err(|e| transport(ResolveStep::BinaryFetch, e))?;

        let path = self
            .documents
            .write(window, id, &bytes)
            .map_err(|e| FailureReason::Storage(e.to_string()))?;

        cache
            .record(id)
            .map_err(|e| FailureReason::Storage(e.to_string()))?;

        Ok((bytes.len(), path))
    }
}

fn transport(step: ResolveStep, error: FetchError) -> FailureReason {
    FailureReason::Transport {
        step,
        message: error.to_string(),
    }
}
