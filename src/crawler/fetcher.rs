//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the archiver, including:
//! - Building HTTP clients with a distinguishing user agent and timeouts
//! - GET requests for pages and assets
//! - Error classification into timeout, network and status failures
//!
//! Redirects are followed by the client. No retries are attempted.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// A successfully retrieved resource
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final URL after redirects
    pub final_url: Url,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Raw response body
    pub body: Vec<u8>,
}

impl Fetched {
    /// Returns the media type without parameters, lowercased
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Returns true if the resource should be treated as an HTML document
    ///
    /// Without a Content-Type header the body is sniffed for a doctype or an
    /// `<html>` tag.
    pub fn is_html(&self) -> bool {
        match self.media_type() {
            Some(media) if !media.is_empty() => {
                media == "text/html" || media == "application/xhtml+xml"
            }
            _ => looks_like_html(&self.body),
        }
    }

    /// Returns true if the resource was served as a stylesheet
    pub fn is_css(&self) -> bool {
        self.media_type().as_deref() == Some("text/css")
    }
}

fn looks_like_html(body: &[u8]) -> bool {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let head: Vec<u8> = body[start..]
        .iter()
        .take(16)
        .map(|b| b.to_ascii_lowercase())
        .collect();
    head.starts_with(b"<!doctype html") || head.starts_with(b"<html")
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeout settings
/// * `user_agent` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use offline_archiver::config::Config;
/// use offline_archiver::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves resources over HTTP
///
/// Stateless apart from the connection pool held by the client.
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    client: Client,
}

impl ResourceFetcher {
    /// Creates a fetcher with a client built from the configuration
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(crawler, user_agent)?,
        })
    }

    /// Fetches a URL and returns its body on a 2xx status
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Non-2xx status | `FetchError::HttpStatus` |
    /// | Request or body timeout | `FetchError::Timeout` |
    /// | Connection refused, DNS, TLS, too many redirects | `FetchError::Network` |
    pub async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(Fetched {
            final_url,
            content_type,
            body: body.to_vec(),
        })
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: format!("Connection failed: {}", error),
        }
    } else if error.is_redirect() {
        FetchError::Network {
            url: url.to_string(),
            message: format!("Redirect error: {}", error),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
