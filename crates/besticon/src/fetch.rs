//! Fetch and decode pipeline for icon candidates.
//!
//! Candidates are fetched concurrently with bounded parallelism, then put
//! back into discovery order and stably sorted by descending width, so
//! completion order never shows up in the result.

use futures::stream::{self, StreamExt};

use crate::cancel::CancellationToken;
use crate::config::FinderConfig;
use crate::data_uri::{decode_data_uri, is_data_uri};
use crate::decode::icon_from_bytes;
use crate::http_client::Transport;
use crate::types::Icon;

/// Knobs for one run of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of fetches in flight.
    pub concurrency: usize,
    /// Whether icons keep their raw payload in `image_data`.
    pub keep_image_bytes: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&FinderConfig::default())
    }
}

impl From<&FinderConfig> for FetchOptions {
    fn from(config: &FinderConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            keep_image_bytes: config.keep_image_bytes,
        }
    }
}

/// Fetch and decode every candidate.
///
/// Candidates that yield no bytes are dropped; undecodable ones are kept
/// with their error set. The result is sorted by descending width with
/// discovery order breaking ties.
pub async fn fetch_all(
    transport: &dyn Transport,
    urls: &[String],
    options: &FetchOptions,
    cancel: Option<&CancellationToken>,
) -> Vec<Icon> {
    let fetches = stream::iter(urls.iter().enumerate())
        .map(|(idx, url)| async move { (idx, fetch_icon(transport, url, options).await) })
        .buffer_unordered(options.concurrency.max(1));

    let mut completed: Vec<(usize, Option<Icon>)> = match cancel {
        Some(token) => fetches.take_until(token.cancelled()).collect().await,
        None => fetches.collect().await,
    };

    if cancel.is_some_and(CancellationToken::is_cancelled) {
        tracing::debug!(
            completed = completed.len(),
            total = urls.len(),
            "icon fetch cancelled"
        );
    }

    completed.sort_by_key(|(idx, _)| *idx);
    let mut icons: Vec<Icon> = completed.into_iter().filter_map(|(_, icon)| icon).collect();
    sort_icons(&mut icons);
    icons
}

/// Stable sort by descending width.
pub fn sort_icons(icons: &mut [Icon]) {
    icons.sort_by(|a, b| b.width.cmp(&a.width));
}

/// Fetch and decode a single candidate.
///
/// Returns `None` when there are no bytes to report.
pub async fn fetch_icon(transport: &dyn Transport, url: &str, options: &FetchOptions) -> Option<Icon> {
    let data = if is_data_uri(url) {
        match decode_data_uri(url) {
            Some(data) => data,
            None => {
                tracing::warn!("dropping malformed data URI icon");
                return None;
            }
        }
    } else {
        match transport.get(url).await {
            Ok(resp) if resp.is_success() => resp.body,
            Ok(resp) => {
                tracing::debug!(url, status = resp.status, "icon fetch returned non-success status");
                return None;
            }
            Err(e) => {
                tracing::warn!(url, "icon fetch failed: {e}");
                return None;
            }
        }
    };

    if data.is_empty() {
        tracing::debug!(url, "dropping icon with empty body");
        return None;
    }

    let icon = icon_from_bytes(url, data, options.keep_image_bytes);
    tracing::debug!(
        url,
        format = %icon.format,
        width = icon.width,
        height = icon.height,
        bytes = icon.bytes,
        "fetched icon"
    );
    Some(icon)
}
