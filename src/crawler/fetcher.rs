//! HTTP access to the portal
//!
//! This module handles all requests the crawl makes:
//! - Building the HTTP client with the session cookie and browser headers
//! - POSTing listing page requests
//! - POSTing token exchanges for a record id
//! - GETting document bytes
//!
//! Every call is a single attempt. Failures are returned to the caller, which
//! decides whether they abort a window or fail one record.

use crate::config::{Config, FilterConfig, PortalConfig, SessionConfig};
use crate::state::RecordId;
use crate::window::DateWindow;
use crate::{ConfigError, FetchError, HarvestError};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client carrying the session credential
///
/// Every request sends the `Cookie` header from the session config together
/// with the headers the portal's own pages send on XHR calls.
pub fn build_http_client(
    session: &SessionConfig,
    portal: &PortalConfig,
) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();

    let cookie = HeaderValue::from_str(&session.cookie).map_err(|_| {
        ConfigError::Validation("cookie contains characters not allowed in an HTTP header".to_string())
    })?;
    headers.insert(header::COOKIE, cookie);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/html, */*; q=0.01"),
    );
    headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

    // Origin and Referer point at the listing page, as a browser would send them
    let listing = parse_endpoint(&portal.listing_url)?;
    if let Ok(origin) = HeaderValue::from_str(&listing.origin().ascii_serialization()) {
        headers.insert(header::ORIGIN, origin);
    }
    if let Ok(referer) = HeaderValue::from_str(listing.as_str()) {
        headers.insert(header::REFERER, referer);
    }

    let client = Client::builder()
        .user_agent(portal.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(portal.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", value, e)))
}

/// Client for the three portal endpoints
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    listing_url: Url,
    token_url: Url,
    filters: FilterConfig,
}

impl PortalClient {
    /// Creates a portal client from a validated configuration
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(&config.session, &config.portal)?,
            listing_url: parse_endpoint(&config.portal.listing_url)?,
            token_url: parse_endpoint(&config.portal.token_url)?,
            filters: config.filters.clone(),
        })
    }

    /// Fetches one page of the listing for `window`
    ///
    /// Pages are numbered from 0. The returned markup is not interpreted here.
    pub async fn fetch_listing_page(
        &self,
        window: &DateWindow,
        page: u32,
    ) -> Result<String, FetchError> {
        let form = [
            ("fromDate", window.start_label()),
            ("toDate", window.end_label()),
            ("department", self.filters.department.clone()),
            ("bno", self.filters.bno.clone()),
            ("buyer_category", self.filters.buyer_category.clone()),
            ("page", page.to_string()),
        ];

        let request = self.client.post(self.listing_url.clone()).form(&form);
        let response = send(request, &self.listing_url).await?;
        read_text(response, &self.listing_url).await
    }

    /// Submits a record id to the token exchange endpoint
    ///
    /// Returns the raw response body; see [`crate::crawler::TokenPayload`].
    pub async fn exchange_token(&self, id: &RecordId) -> Result<String, FetchError> {
        let request = self
            .client
            .post(self.token_url.clone())
            .form(&[("oid", id.as_str())]);
        let response = send(request, &self.token_url).await?;
        read_text(response, &self.token_url).await
    }

    /// Turns a link found in a token response into an absolute URL
    ///
    /// Relative links are resolved against the token exchange endpoint.
    pub fn resolve_link(&self, link: &str) -> Result<Url, url::ParseError> {
        self.token_url.join(link.trim())
    }

    /// Downloads a document as raw bytes
    pub async fn fetch_document(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = send(self.client.get(url.clone()), url).await?;
        let bytes = response.bytes().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}

async fn send(request: RequestBuilder, url: &Url) -> Result<Response, FetchError> {
    let response = request.send().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

async fn read_text(response: Response, url: &Url) -> Result<String, FetchError> {
    response.text().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })
}
