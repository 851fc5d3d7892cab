//! Candidate discovery from page markup.
//!
//! Extracts icon links from raw HTML with `scraper`, resolves them against
//! the effective base URL, and appends the conventional root favicon.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::url_util::{effective_base, resolve_reference, root_favicon};

/// `rel` tokens that mark a `<link>` as an icon.
const ICON_RELS: &[&str] = &["icon", "apple-touch-icon", "apple-touch-icon-precomposed"];

/// Candidate icon URLs for a page, in discovery order and deduplicated.
///
/// `page_url` is the final URL the page was served from; a `<base href>`
/// in the markup takes precedence for resolving relative links. The root
/// `/favicon.ico` of `page_url` is always the last candidate.
pub fn find_candidates(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = effective_base(page_url, extract_base_href(&document).as_deref());

    let resolved = extract_icon_links(&document)
        .into_iter()
        .filter_map(|href| resolve_reference(&base, &href));

    dedupe(resolved.chain(root_favicon(page_url)))
}

/// Raw `href` values of icon links, in markup order.
pub fn extract_icon_links(document: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse("link[rel][href]") else {
        return Vec::new();
    };

    document
        .select(&sel)
        .filter(|el| el.value().attr("rel").is_some_and(is_icon_rel))
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// The first `<base href>` value, if any.
pub fn extract_base_href(document: &Html) -> Option<String> {
    let sel = Selector::parse("base[href]").ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
}

/// Whether a `rel` attribute value denotes a favicon or touch icon.
///
/// Matches whole tokens case-insensitively, so `shortcut icon`,
/// `Shortcut  Icon` and `icon shortcut` all qualify but `mask-icon` does not.
pub fn is_icon_rel(rel: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|token| ICON_RELS.iter().any(|r| token.eq_ignore_ascii_case(r)))
}

fn dedupe(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|u| seen.insert(u.clone()))
        .collect()
}
