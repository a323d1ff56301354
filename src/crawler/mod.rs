//! Crawler module for listing traversal and document download
//!
//! This module contains the core crawling logic, including:
//! - HTTP access to the portal endpoints
//! - Listing and token response parsing
//! - Paginated listing traversal per date window
//! - Two-stage document resolution and throttling
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod listing;
pub mod parser;
mod resolver;
mod throttle;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, PortalClient};
pub use listing::{ListingWalker, PageOutcome};
pub use parser::{extract_document_link, ListingPage, ListingParser, TokenPayload};
pub use resolver::DocumentResolver;
pub use throttle::Throttle;
