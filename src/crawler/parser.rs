//! Markup parsing for listing pages and token responses
//!
//! This is the only module that knows the portal's markup:
//! - Listing pages: markup string in, ordered record ids out
//! - Token responses: JSON payload in, status and optional document link out
//!
//! A change in the portal's markup should only ever touch this file and the
//! `listing-block` / `record-pattern` config keys.

use crate::config::PortalConfig;
use crate::state::RecordId;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::sync::OnceLock;

/// Record ids extracted from one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Number of listing blocks found on the page
    pub blocks: usize,

    /// One id per block that carried a reference, in page order
    pub ids: Vec<RecordId>,
}

impl ListingPage {
    /// True when the page ends the walk of its window
    ///
    /// The portal reports no total count: a page with no blocks, or with no
    /// extractable id, is the only end-of-results signal.
    pub fn is_terminal(&self) -> bool {
        self.blocks == 0 || self.ids.is_empty()
    }
}

/// Extracts record ids from listing markup
#[derive(Debug, Clone)]
pub struct ListingParser {
    block: Selector,
    reference: Regex,
    blocks_per_page: usize,
}

impl ListingParser {
    /// Creates a parser
    ///
    /// # Arguments
    ///
    /// * `block_selector` - CSS selector matching one listing block
    /// * `record_pattern` - Regex matched against the block's attribute values.
    ///   The first capture group is the id if the pattern has one, otherwise
    ///   the whole match.
    /// * `blocks_per_page` - Blocks beyond this count are ignored
    pub fn new(
        block_selector: &str,
        record_pattern: &str,
        blocks_per_page: usize,
    ) -> Result<Self, ConfigError> {
        let block = Selector::parse(block_selector).map_err(|e| {
            ConfigError::Validation(format!(
                "listing-block '{}' is not a valid selector: {:?}",
                block_selector, e
            ))
        })?;
        let reference = Regex::new(record_pattern).map_err(|e| {
            ConfigError::Validation(format!(
                "record-pattern '{}' is not a valid regex: {}",
                record_pattern, e
            ))
        })?;

        Ok(Self {
            block,
            reference,
            blocks_per_page,
        })
    }

    pub fn from_config(portal: &PortalConfig) -> Result<Self, ConfigError> {
        Self::new(
            &portal.listing_block,
            &portal.record_pattern,
            portal.blocks_per_page,
        )
    }

    /// Parses one listing page
    ///
    /// # Example
    ///
    /// ```
    /// use gem_harvest::crawler::ListingParser;
    ///
    /// let parser = ListingParser::new("div.block", "GEMC-[0-9]+", 10).unwrap();
    /// let html = r#"<div class="block"><a onclick="view('GEMC-101')">View</a></div>"#;
    /// let page = parser.parse(html);
    /// assert_eq!(page.ids[0].as_str(), "GEMC-101");
    /// ```
    pub fn parse(&self, html: &str) -> ListingPage {
        let document = Html::parse_document(html);
        let mut blocks = 0;
        let mut ids = Vec::new();

        for block in document.select(&self.block).take(self.blocks_per_page) {
            blocks += 1;
            match self.extract_id(block) {
                Some(id) => ids.push(id),
                None => tracing::debug!("Listing block {} carries no record reference", blocks),
            }
        }

        ListingPage { blocks, ids }
    }

    /// Finds the first attribute value in the block (the block element
    /// included) that matches the record pattern
    fn extract_id(&self, block: ElementRef<'_>) -> Option<RecordId> {
        block
            .descendants()
            .filter_map(ElementRef::wrap)
            .flat_map(|element| element.value().attrs().map(|(_, value)| value))
            .find_map(|value| self.capture(value))
    }

    fn capture(&self, value: &str) -> Option<RecordId> {
        let captures = self.reference.captures(value)?;
        let matched = captures.get(1).or_else(|| captures.get(0))?;
        RecordId::new(matched.as_str())
    }
}

/// Body of a token exchange response: `{"status": ..., "code": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    #[serde(default)]
    pub status: serde_json::Value,

    /// Escaped markup referencing the document, present on success
    #[serde(default)]
    pub code: Option<String>,
}

impl TokenPayload {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body.trim_start_matches('\u{feff}'))
    }

    /// The status as text; the portal sends it either as a string or a number
    pub fn status_text(&self) -> String {
        match &self.status {
            serde_json::Value::String(status) => status.trim().to_string(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    pub fn is_success(&self, marker: &str) -> bool {
        self.status_text() == marker
    }
}

const HREF_PATTERN: &str = r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#;

const FALLBACK_SELECTOR: &str = "[href], [src], [data-href], [data-url], object[data]";

const FALLBACK_ATTRIBUTES: [&str; 5] = ["href", "src", "data-href", "data-url", "data"];

fn href_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(HREF_PATTERN).ok()).as_ref()
}

/// Extracts the document link from a token response `code`
///
/// The link is normally an `href` attribute inside entity-escaped markup.
/// When no such attribute is present, the decoded markup is scanned as a
/// fragment for any element carrying a link attribute.
///
/// Returns `None` if neither yields a usable link.
pub fn extract_document_link(code: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(code)
        .replace("\\/", "/")
        .replace("\\\"", "\"");

    if let Some(pattern) = href_pattern() {
        let found = pattern
            .captures_iter(&decoded)
            .filter_map(|captures| captures.get(1))
            .find_map(|matched| usable_link(matched.as_str()));
        if found.is_some() {
            return found;
        }
    }

    let fragment = Html::parse_fragment(&decoded);
    let selector = Selector::parse(FALLBACK_SELECTOR).ok()?;
    fragment.select(&selector).find_map(|element| {
        FALLBACK_ATTRIBUTES
            .iter()
            .filter_map(|name| element.value().attr(name))
            .find_map(usable_link)
    })
}

fn usable_link(value: &str) -> Option<String> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    if value.is_empty() || value.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    Some(value.to_string())
}
