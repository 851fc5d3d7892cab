//! Per-site hooks consulted before discovery.

use url::Url;

use crate::url_util::host_only;

/// Replaces discovery for selected sites.
///
/// Receives the raw input URL. A non-empty result becomes the candidate
/// list verbatim; an empty one falls through to normal discovery.
pub trait OverrideFinder: Send + Sync {
    fn find_icons(&self, url: &str) -> Vec<String>;
}

impl<F> OverrideFinder for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn find_icons(&self, url: &str) -> Vec<String> {
        self(url)
    }
}

/// Whether `host` is covered by the host-only domain list.
///
/// A listed domain also covers its `www.` variant; `*` covers every host.
pub fn is_host_only_domain(host: &str, domains: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    let bare = host.strip_prefix("www.").unwrap_or(&host);
    domains
        .iter()
        .any(|d| d == "*" || d.eq_ignore_ascii_case(&host) || d.eq_ignore_ascii_case(bare))
}

/// The URL discovery should start from.
///
/// Host-only domains are reduced to their bare `scheme://host/`.
pub fn apply_host_only(url: &Url, domains: &[String]) -> Url {
    match url.host_str() {
        Some(host) if is_host_only_domain(host, domains) => {
            let stripped = host_only(url);
            if stripped != *url {
                tracing::debug!(from = %url, to = %stripped, "host-only domain, using site root");
            }
            stripped
        }
        _ => url.clone(),
    }
}
