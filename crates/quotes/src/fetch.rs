// ABOUTME: Fetcher collaborator: the async seam between orchestration and the network.
// ABOUTME: HttpFetcher issues one GET with content-length limits and charset decoding; StaticFetcher serves canned markup.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::document::decode_body;
use crate::error::ScrapeError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Turns a URL into raw markup text, or a fetch failure.
///
/// Implementations make exactly one attempt; there is no retry or caching
/// behind this trait.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Result of a successful HTTP request.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as text, using charset hints from the content-type header.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Fetcher backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    headers: HashMap<String, String>,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, headers: HashMap<String, String>) -> Self {
        Self { client, headers }
    }

    /// Performs the GET and returns the raw response.
    pub async fn get(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        if url.is_empty() {
            return Err(ScrapeError::invalid_url(url, "Fetch", None));
        }

        let parsed_url = url::Url::parse(url).map_err(|e| {
            ScrapeError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        let scheme = parsed_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ScrapeError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        let mut request = self.client.get(parsed_url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| {
            ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
        })?;

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(ScrapeError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large")),
                ));
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::fetch_status(url, status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response.bytes().await.map_err(|e| {
            ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        })?;

        if body.len() > MAX_CONTENT_LENGTH {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }

        Ok(FetchResult {
            status: status.as_u16(),
            url: url.to_string(),
            final_url,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let res = self.get(url).await?;
        if res.final_url != res.url {
            debug!(
                url = %res.url,
                final_url = %res.final_url,
                status = res.status,
                "followed redirect"
            );
        }
        Ok(res.text())
    }
}

/// In-memory fetcher mapping URLs to markup or to an HTTP status failure.
///
/// Unknown URLs fail with status 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Result<String, u16>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `markup` for `url`.
    pub fn page(mut self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Ok(markup.into()));
        self
    }

    /// Fail `url` with the given HTTP status.
    pub fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.pages.insert(url.into(), Err(status));
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        match self.pages.get(url) {
            Some(Ok(markup)) => Ok(markup.clone()),
            Some(Err(status)) => Err(ScrapeError::fetch_status(url, *status)),
            None => Err(ScrapeError::fetch_status(url, 404)),
        }
    }
}
