//! Inline `data:` URI payloads.

use base64::Engine;
use percent_encoding::percent_decode_str;

/// Whether `url` is a `data:` URI.
pub fn is_data_uri(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Decode the payload of a `data:` URI.
///
/// Supports `;base64` payloads and percent-encoded payloads. Returns `None`
/// for anything that is not a well-formed data URI.
pub fn decode_data_uri(url: &str) -> Option<Vec<u8>> {
    if !is_data_uri(url) {
        return None;
    }
    let (meta, payload) = url[5..].split_once(',')?;

    let is_base64 = meta
        .rsplit(';')
        .next()
        .is_some_and(|p| p.trim().eq_ignore_ascii_case("base64"));

    if is_base64 {
        let cleaned: String = percent_decode_str(payload)
            .decode_utf8_lossy()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned.as_bytes())
            .ok()
    } else {
        Some(percent_decode_str(payload).collect())
    }
}
