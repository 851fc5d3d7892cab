//! URL normalization and resolution helpers.

use url::Url;

use crate::data_uri::is_data_uri;
use crate::types::{BesticonError, BesticonResult};

/// Turn user input into an absolute URL.
///
/// Input without a scheme is assumed to be `http`. Non-ASCII hostnames are
/// IDNA-encoded by the parser.
pub fn normalize_url(input: &str) -> BesticonResult<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(BesticonError::InvalidUrl(input.to_string()));
    }

    let candidate = if input.starts_with("//") {
        format!("http:{input}")
    } else if !input.contains("://") {
        format!("http://{input}")
    } else {
        input.to_string()
    };

    let url = Url::parse(&candidate).map_err(|e| BesticonError::InvalidUrl(format!("{input}: {e}")))?;
    if url.host_str().is_none() {
        return Err(BesticonError::InvalidUrl(input.to_string()));
    }
    Ok(url)
}

/// Resolve an attribute value against a base URL.
///
/// `data:` URIs are returned verbatim. Returns `None` for references that
/// cannot be resolved.
pub fn resolve_reference(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if is_data_uri(reference) {
        return Some(reference.to_string());
    }
    base.join(reference).ok().map(|u| u.to_string())
}

/// Resolve the effective base URL of a page from its `<base href>`.
///
/// Falls back to `page_url` when there is no usable base tag.
pub fn effective_base(page_url: &Url, base_href: Option<&str>) -> Url {
    base_href
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// `/favicon.ico` at the root of the page's host.
pub fn root_favicon(page_url: &Url) -> Option<String> {
    page_url.join("/favicon.ico").ok().map(|u| u.to_string())
}

/// The bare `scheme://host[:port]/` of a URL.
pub fn host_only(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_path("/");
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped
}
