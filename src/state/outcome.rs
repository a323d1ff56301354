/// Outcome definitions for individual records
///
/// Every record seen on a listing page ends in exactly one of these outcomes.
/// Failures are values, not errors: they are counted and reported but never
/// abort sibling records.
use std::fmt;
use std::path::PathBuf;

/// Result of processing one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The document was written to disk and recorded in the completion log
    Downloaded {
        /// Size of the document in bytes
        bytes: usize,
        /// Where the document was written
        path: PathBuf,
    },

    /// The record was not fetched
    Skipped(SkipReason),

    /// The record could not be downloaded; it will be retried on the next run
    Failed(FailureReason),
}

/// Why a record was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already present in the completion log
    AlreadyCached,
}

/// The remote call a transport failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveStep {
    /// Submitting the record id for a document link
    TokenExchange,
    /// Turning the embedded reference into a fetchable URL
    LinkResolution,
    /// Downloading the document bytes
    BinaryFetch,
}

impl ResolveStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenExchange => "token-exchange",
            Self::LinkResolution => "link-resolution",
            Self::BinaryFetch => "binary-fetch",
        }
    }
}

/// Why a record could not be downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Network error, timeout, bad status or unreadable payload
    Transport { step: ResolveStep, message: String },

    /// Token exchange answered with something other than the success marker
    RemoteRejected { status: String },

    /// Token exchange payload carried no usable document link
    NoLinkFound,

    /// The document could not be written or the completion log not appended
    Storage(String),
}

impl FailureReason {
    /// Stable category name, used for logging and stats breakdowns
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::RemoteRejected { .. } => "remote-rejected",
            Self::NoLinkFound => "no-link-found",
            Self::Storage(_) => "storage",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { step, message } => {
                write!(f, "{} failed: {}", step.as_str(), message)
            }
            Self::RemoteRejected { status } => {
                write!(f, "portal rejected the request (status {:?})", status)
            }
            Self::NoLinkFound => f.write_str("no document link in token response"),
            Self::Storage(message) => write!(f, "storage error: {}", message),
        }
    }
}
