//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper:
//! - Building an HTTP client that identifies like a desktop browser
//! - GET requests returning the raw page body
//! - Classifying transport failures into `FetchError`
//!
//! The fetcher is pure transport. Policy checks and pacing are the caller's
//! job.

use crate::config::RequestConfig;
use crate::FetchError;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION,
};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with the configured identity headers
///
/// # Example
///
/// ```no_run
/// use rental_scout::config::RequestConfig;
/// use rental_scout::crawler::build_http_client;
///
/// let client = build_http_client(&RequestConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RequestConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, ACCEPT, &config.accept);
    insert_header(&mut headers, ACCEPT_LANGUAGE, &config.accept_language);
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("Ignoring invalid value for header {}", name),
    }
}

/// Retrieves raw page markup over HTTP
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &RequestConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL and returns its body
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Ok(body)`, possibly empty |
    /// | non-2xx | `FetchError::Status` |
    /// | timeout | `FetchError::Timeout` |
    /// | connection / body error | `FetchError::Http` |
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;
        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
