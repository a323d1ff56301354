use crate::window::{parse_date, DateWindow};
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for GeM Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// The window described by `from-date` and `to-date`
    pub fn initial_window(&self) -> ConfigResult<DateWindow> {
        let start = parse_date(&self.crawl.from_date)
            .ok_or_else(|| ConfigError::InvalidDate(self.crawl.from_date.clone()))?;
        let end = parse_date(&self.crawl.to_date)
            .ok_or_else(|| ConfigError::InvalidDate(self.crawl.to_date.clone()))?;

        DateWindow::new(start, end).ok_or_else(|| {
            ConfigError::Validation(format!(
                "from-date {} is after to-date {}",
                self.crawl.from_date, self.crawl.to_date
            ))
        })
    }
}

/// Portal session credential
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Raw `Cookie` header value from an authenticated browser session
    pub cookie: String,
}

/// Crawl span and pacing
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// First day to crawl (`DD-MM-YYYY`)
    #[serde(rename = "from-date")]
    pub from_date: String,

    /// Last day of the first window (`DD-MM-YYYY`)
    #[serde(rename = "to-date")]
    pub to_date: String,

    /// Keep planning windows after `to-date` until today
    #[serde(rename = "repeat-till-date", default)]
    pub repeat_till_date: bool,

    /// Delay before each document download (milliseconds)
    #[serde(rename = "throttle-time", default = "default_throttle_time")]
    pub throttle_time: u64,

    /// Delay between listing pages of one window (milliseconds)
    #[serde(rename = "page-delay", default = "default_page_delay")]
    pub page_delay: u64,
}

impl CrawlConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_time)
    }

    pub fn page_pacing(&self) -> Duration {
        Duration::from_millis(self.page_delay)
    }
}

fn default_throttle_time() -> u64 {
    500
}

fn default_page_delay() -> u64 {
    1000
}

/// Listing filters, sent verbatim with every listing request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub department: String,

    /// Batch number
    #[serde(default)]
    pub bno: String,

    #[serde(rename = "buyer-category", default)]
    pub buyer_category: String,
}

/// Remote endpoint contract
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Endpoint returning one page of listing markup
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Endpoint exchanging a record id for a document link
    #[serde(rename = "token-url")]
    pub token_url: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Token exchange `status` value meaning the link is available
    #[serde(rename = "success-status")]
    pub success_status: String,

    /// CSS selector matching one listing block
    #[serde(rename = "listing-block")]
    pub listing_block: String,

    /// Regex locating the record id inside a block's attribute values
    #[serde(rename = "record-pattern")]
    pub record_pattern: String,

    /// Number of listing blocks the portal serves per page
    #[serde(rename = "blocks-per-page")]
    pub blocks_per_page: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://gem.gov.in/view_contracts/search_contracts".to_string(),
            token_url: "https://gem.gov.in/view_contracts/bypass_captcha".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            success_status: "1".to_string(),
            listing_block: "div.block".to_string(),
            record_pattern: "GEMC-[0-9]+".to_string(),
            blocks_per_page: 10,
            request_timeout: 60,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory receiving one sub-directory per window
    #[serde(rename = "root-dir")]
    pub root_dir: PathBuf,

    /// Append-only log of downloaded record ids
    #[serde(rename = "cache-path")]
    pub cache_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("pdfs"),
            cache_path: PathBuf::from("downloaded_ids.txt"),
        }
    }
}
