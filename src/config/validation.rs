use crate::config::types::{Config, CrawlConfig, OutputConfig, PortalConfig, SessionConfig};
use crate::crawler::ListingParser;
use crate::ConfigError;
use reqwest::header::HeaderValue;
use url::Url;

/// Validates the entire configuration
///
/// Runs before any crawling starts; nothing is written to disk when it fails.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_session_config(&config.session)?;
    validate_crawl_config(&config.crawl)?;
    config.initial_window()?;
    validate_portal_config(&config.portal)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.cookie.trim().is_empty() {
        return Err(ConfigError::Validation("cookie cannot be empty".to_string()));
    }

    if HeaderValue::from_str(&config.cookie).is_err() {
        return Err(ConfigError::Validation(
            "cookie contains characters not allowed in an HTTP header".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    for date in [&config.from_date, &config.to_date] {
        if crate::window::parse_date(date).is_none() {
            return Err(ConfigError::InvalidDate(date.clone()));
        }
    }
    Ok(())
}

fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    validate_endpoint("listing-url", &config.listing_url)?;
    validate_endpoint("token-url", &config.token_url)?;

    if config.success_status.is_empty() {
        return Err(ConfigError::Validation(
            "success-status cannot be empty".to_string(),
        ));
    }

    if config.blocks_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "blocks-per-page must be >= 1, got {}",
            config.blocks_per_page
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    // Selector and record pattern are compiled exactly as the crawl compiles them
    ListingParser::from_config(config)?;

    Ok(())
}

fn validate_endpoint(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "root-dir cannot be empty".to_string(),
        ));
    }

    if config.cache_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
