//! HTTP transport used for page and icon fetches.
//!
//! Plain GET requests, no browser. Follows redirects with a cookie store
//! so redirect-and-cookie gates still resolve, applies a per-request
//! timeout, and retries on 5xx with backoff on 429.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::FinderConfig;

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 10;

/// Base delay before the first retry; doubles on every further attempt.
const BACKOFF_BASE_MS: u64 = 500;
/// Upper bound on a single retry delay.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the Content-Type header names an HTML document.
    ///
    /// A missing header counts as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map_or(true, |ct| {
            let mime = ct.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("text/html") || mime.eq_ignore_ascii_case("application/xhtml+xml")
        })
    }
}

/// A pluggable GET-only HTTP transport.
///
/// Implementations must follow redirects, keep cookies across a redirect
/// chain, and bound every request by a timeout. The transport is shared
/// read-only across lookups.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Default [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    max_body_bytes: usize,
}

impl HttpClient {
    /// Build a client from a finder configuration.
    pub fn new(config: &FinderConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_retries: config.max_retries,
            max_body_bytes: config.max_body_bytes,
        })
    }

    async fn read_body(&self, mut resp: reqwest::Response) -> Result<Vec<u8>> {
        if let Some(len) = resp.content_length() {
            if len as usize > self.max_body_bytes {
                bail!("response body of {len} bytes exceeds {} bytes", self.max_body_bytes);
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if body.len() + chunk.len() > self.max_body_bytes {
                bail!("response body exceeds {} bytes", self.max_body_bytes);
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Exponential backoff for the `attempt`-th retry, starting at 1.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let mut retries = 0u32;

        loop {
            let resp = self.client.get(url).timeout(self.timeout).send().await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();

                    // Retry on 5xx
                    if status >= 500 && retries < self.max_retries {
                        retries += 1;
                        let delay = backoff_delay(retries);
                        tracing::debug!(url, status, retries, "retrying after server error");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    // Backoff on 429
                    if status == 429 && retries < self.max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                        continue;
                    }

                    let final_url = r.url().to_string();
                    let content_type = r
                        .headers()
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .map(|s| s.to_string());
                    let body = self.read_body(r).await?;

                    return Ok(HttpResponse {
                        final_url,
                        status,
                        content_type,
                        body,
                    });
                }
                Err(e) => {
                    // Timeouts are final; anything else gets the same retry budget.
                    if !e.is_timeout() && retries < self.max_retries {
                        retries += 1;
                        let delay = backoff_delay(retries);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}
