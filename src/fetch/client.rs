// src/fetch/client.rs
use crate::utils::error::FetchError;
use reqwest::{header, StatusCode, Url};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("table_scraper/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the single page download.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Creates a reqwest client configured from the fetch options.
fn build_client(options: &FetchOptions) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(options.user_agent.as_str())
        .timeout(options.timeout)
        .build()
}

/// Checks that `raw` is an absolute http(s) URL.
pub fn parse_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(format!("{} ({})", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!("{} (unsupported scheme '{}')", raw, other))),
    }
}

/// Downloads a page and returns its body as text.
pub async fn download_page(url: &str, options: &FetchOptions) -> Result<String, FetchError> {
    let url = parse_url(url)?;
    let client = build_client(options)?; // Propagate client build error if any

    tracing::info!("Downloading page from: {}", url);
    tracing::debug!("Using User-Agent: {}", options.user_agent);

    let response = client.get(url.clone())
        .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
        .send()
        .await?; // Propagates reqwest::Error as FetchError::Network

    // Check if the request was successful (status code 2xx)
    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Received {} - the site may be refusing automated clients.", status);
            return Err(FetchError::Blocked(status));
        }
        return Err(FetchError::Http(status));
    }

    let body = response.text().await?;
    tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_accepts_http_and_https() {
        assert!(parse_url("https://example.com/stats").is_ok());
        assert!(parse_url("  http://example.com  ").is_ok());
    }

    #[test]
    fn test_parse_url_rejects_missing_scheme() {
        assert!(matches!(parse_url("example.com/stats"), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(parse_url(""), Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        let err = parse_url("ftp://example.com/table.html").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn test_download_invalid_url_fails_before_network() {
        let result = tokio_test::block_on(download_page("not a url", &FetchOptions::default()));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
