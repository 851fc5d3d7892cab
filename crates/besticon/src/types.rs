//! Core data types for fetched icons and lookup errors.

use serde::{Deserialize, Serialize};

/// One fetched icon candidate.
///
/// Entries whose payload could not be decoded are still reported, with
/// `error` set and dimensions and format left at their zero values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Icon {
    /// Absolute URL of the icon, or the full `data:` URI for inline icons.
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Lowercase format tag (`png`, `ico`, `gif`, `jpg`, ...), empty if unknown.
    pub format: String,
    /// Length of the raw payload.
    pub bytes: usize,
    /// Hex-encoded SHA-1 of the raw payload.
    pub sha1sum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<IconError>,
    /// Raw payload, present only when the fetch pipeline keeps image bytes.
    #[serde(skip)]
    pub image_data: Option<Vec<u8>>,
}

impl Icon {
    /// Whether this icon decoded into a known format without error.
    pub fn is_usable(&self) -> bool {
        self.error.is_none() && !self.format.is_empty()
    }
}

/// Why a fetched candidate could not be decoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum IconError {
    #[error("unknown image format")]
    UnknownFormat,

    #[error("failed to decode {format} image: {reason}")]
    Decode { format: String, reason: String },
}

/// Errors that abort a whole lookup or reject a size range.
#[derive(thiserror::Error, Debug)]
pub enum BesticonError {
    #[error("besticon: not found")]
    NotFound,

    #[error("besticon: empty response")]
    EmptyResponse,

    #[error("besticon: bad size")]
    BadSize,

    #[error("besticon: invalid url: {0}")]
    InvalidUrl(String),

    #[error("besticon: cancelled")]
    Cancelled,
}

/// Convenience result type.
pub type BesticonResult<T> = Result<T, BesticonError>;
