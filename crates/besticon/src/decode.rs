//! Format sniffing and header-level dimension extraction.
//!
//! The format is always taken from the payload's signature bytes, never
//! from the URL: plenty of sites serve PNG or GIF data from `favicon.ico`.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use image::{ImageFormat, ImageReader};
use sha1::{Digest, Sha1};

use crate::types::{Icon, IconError};

/// ICO header: reserved (u16), type (u16), image count (u16).
const ICO_HEADER_LEN: usize = 6;
/// ICO directory entry length.
const ICO_ENTRY_LEN: usize = 16;

/// An image format recognised by its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFormat {
    Png,
    Gif,
    Jpeg,
    Ico,
    Bmp,
    WebP,
}

impl IconFormat {
    /// Lowercase tag reported on [`Icon::format`].
    pub fn as_str(self) -> &'static str {
        match self {
            IconFormat::Png => "png",
            IconFormat::Gif => "gif",
            IconFormat::Jpeg => "jpg",
            IconFormat::Ico => "ico",
            IconFormat::Bmp => "bmp",
            IconFormat::WebP => "webp",
        }
    }
}

struct Signature {
    format: IconFormat,
    matches: fn(&[u8]) -> bool,
    dimensions: fn(&[u8]) -> Result<(u32, u32), String>,
}

/// Tried in order; the first matching signature decides the format.
const SIGNATURES: &[Signature] = &[
    Signature {
        format: IconFormat::Png,
        matches: |b| b.starts_with(b"\x89PNG\r\n\x1a\n"),
        dimensions: |b| header_dimensions(b, ImageFormat::Png),
    },
    Signature {
        format: IconFormat::Gif,
        matches: |b| b.starts_with(b"GIF87a") || b.starts_with(b"GIF89a"),
        dimensions: |b| header_dimensions(b, ImageFormat::Gif),
    },
    Signature {
        format: IconFormat::Jpeg,
        matches: |b| b.starts_with(&[0xFF, 0xD8, 0xFF]),
        dimensions: |b| header_dimensions(b, ImageFormat::Jpeg),
    },
    Signature {
        format: IconFormat::Ico,
        matches: |b| b.starts_with(&[0x00, 0x00, 0x01, 0x00]),
        dimensions: ico_dimensions,
    },
    Signature {
        format: IconFormat::Bmp,
        matches: |b| b.starts_with(b"BM"),
        dimensions: |b| header_dimensions(b, ImageFormat::Bmp),
    },
    Signature {
        format: IconFormat::WebP,
        matches: |b| b.len() >= 12 && &b[0..4] == b"RIFF" && &b[8..12] == b"WEBP",
        dimensions: |b| header_dimensions(b, ImageFormat::WebP),
    },
];

/// Detect the format of a payload from its leading bytes.
pub fn sniff_format(data: &[u8]) -> Option<IconFormat> {
    SIGNATURES
        .iter()
        .find(|sig| (sig.matches)(data))
        .map(|sig| sig.format)
}

/// Read the format and pixel dimensions of a payload.
pub fn decode_dimensions(data: &[u8]) -> Result<(IconFormat, u32, u32), IconError> {
    let sig = SIGNATURES
        .iter()
        .find(|sig| (sig.matches)(data))
        .ok_or(IconError::UnknownFormat)?;

    let (width, height) = (sig.dimensions)(data).map_err(|reason| IconError::Decode {
        format: sig.format.as_str().to_string(),
        reason,
    })?;
    Ok((sig.format, width, height))
}

/// Hex-encoded SHA-1 of a payload.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Build an [`Icon`] from a fetched payload.
///
/// Decode failures are recorded on the icon rather than returned.
pub fn icon_from_bytes(url: &str, data: Vec<u8>, keep_image_bytes: bool) -> Icon {
    let mut icon = Icon {
        url: url.to_string(),
        bytes: data.len(),
        sha1sum: sha1_hex(&data),
        ..Default::default()
    };

    match decode_dimensions(&data) {
        Ok((format, width, height)) => {
            icon.format = format.as_str().to_string();
            icon.width = width;
            icon.height = height;
        }
        Err(e) => {
            tracing::debug!(url, "undecodable icon: {e}");
            icon.error = Some(e);
        }
    }

    if keep_image_bytes {
        icon.image_data = Some(data);
    }
    icon
}

fn header_dimensions(data: &[u8], format: ImageFormat) -> Result<(u32, u32), String> {
    ImageReader::with_format(Cursor::new(data), format)
        .into_dimensions()
        .map_err(|e| e.to_string())
}

/// Dimensions of the largest image in an ICO directory.
///
/// A stored width or height of 0 means 256.
fn ico_dimensions(data: &[u8]) -> Result<(u32, u32), String> {
    if data.len() < ICO_HEADER_LEN {
        return Err("truncated ICO header".to_string());
    }
    let mut header = Cursor::new(&data[..ICO_HEADER_LEN]);
    let _reserved = header.read_u16::<LittleEndian>().map_err(|e| e.to_string())?;
    let _kind = header.read_u16::<LittleEndian>().map_err(|e| e.to_string())?;
    let count = header.read_u16::<LittleEndian>().map_err(|e| e.to_string())? as usize;

    if count == 0 {
        return Err("ICO directory is empty".to_string());
    }
    let dir_end = ICO_HEADER_LEN + count * ICO_ENTRY_LEN;
    if data.len() < dir_end {
        return Err(format!("ICO directory truncated: {count} entries"));
    }

    let mut best: Option<(u32, u32)> = None;
    for entry in data[ICO_HEADER_LEN..dir_end].chunks_exact(ICO_ENTRY_LEN) {
        let width = if entry[0] == 0 { 256 } else { entry[0] as u32 };
        let height = if entry[1] == 0 { 256 } else { entry[1] as u32 };

        let mut rest = Cursor::new(&entry[8..]);
        let size = rest.read_u32::<LittleEndian>().map_err(|e| e.to_string())? as usize;
        let offset = rest.read_u32::<LittleEndian>().map_err(|e| e.to_string())? as usize;
        if size == 0 || offset.checked_add(size).map_or(true, |end| end > data.len()) {
            continue;
        }

        if best.map_or(true, |(w, h)| (width, height) > (w, h)) {
            best = Some((width, height));
        }
    }

    best.ok_or_else(|| "ICO directory has no readable images".to_string())
}
