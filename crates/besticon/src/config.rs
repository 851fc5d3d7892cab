//! Finder configuration loading and resolution.
//!
//! Values come from explicit settings first, then environment variables,
//! then the defaults below.

use serde::Deserialize;

/// Comma-separated hosts whose lookups always start at the site root.
pub const ENV_HOST_ONLY_DOMAINS: &str = "HOST_ONLY_DOMAINS";
/// HTTP timeout: plain seconds, or a number suffixed with `s` or `ms`.
pub const ENV_HTTP_CLIENT_TIMEOUT: &str = "HTTP_CLIENT_TIMEOUT";
pub const ENV_HTTP_USER_AGENT: &str = "HTTP_USER_AGENT";
pub const ENV_CONCURRENCY: &str = "BESTICON_CONCURRENCY";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                  AppleWebKit/537.36 (KHTML, like Gecko) \
                                  Chrome/131.0.0.0 Safari/537.36";

/// Settings shared by the transport and the fetch pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Retries on 5xx, 429 and connection errors.
    pub max_retries: u32,
    /// Larger response bodies are rejected.
    pub max_body_bytes: usize,
    /// Maximum number of icon fetches in flight per lookup.
    pub concurrency: usize,
    /// Whether fetched icons keep their raw bytes.
    pub keep_image_bytes: bool,
    pub host_only_domains: Vec<String>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 1,
            max_body_bytes: 10 * 1024 * 1024,
            concurrency: 4,
            keep_image_bytes: true,
            host_only_domains: Vec::new(),
        }
    }
}

impl FinderConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(domains) = lookup(ENV_HOST_ONLY_DOMAINS) {
            config.host_only_domains = parse_domain_list(&domains);
        }

        if let Some(raw) = lookup(ENV_HTTP_CLIENT_TIMEOUT) {
            match parse_timeout_ms(&raw) {
                Some(ms) => config.timeout_ms = ms,
                None => tracing::warn!("ignoring invalid {ENV_HTTP_CLIENT_TIMEOUT}={raw}"),
            }
        }

        if let Some(ua) = lookup(ENV_HTTP_USER_AGENT).filter(|ua| !ua.trim().is_empty()) {
            config.user_agent = ua;
        }

        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.concurrency = n,
                _ => tracing::warn!("ignoring invalid {ENV_CONCURRENCY}={raw}"),
            }
        }

        config
    }
}

/// Split a comma-separated domain list, dropping blanks.
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

fn parse_timeout_ms(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Some(ms) = raw.strip_suffix("ms") {
        return ms.trim().parse().ok();
    }
    let secs = raw.strip_suffix('s').unwrap_or(raw);
    secs.trim().parse::<u64>().ok()?.checked_mul(1000)
}
