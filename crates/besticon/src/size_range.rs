//! Size range grammar: `"N"` or `"min..perfect..max"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{BesticonError, BesticonResult};

/// Largest icon width a size range may ask for.
pub const MAX_ICON_SIZE: u32 = 500;

const RANGE_SEPARATOR: &str = "..";

/// Acceptable icon widths, with the preferred width in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u32,
    pub perfect: u32,
    pub max: u32,
}

impl SizeRange {
    pub const fn new(min: u32, perfect: u32, max: u32) -> Self {
        Self { min, perfect, max }
    }

    /// Whether `width` lies within `[min, max]`.
    pub fn contains(&self, width: u32) -> bool {
        width >= self.min && width <= self.max
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}..{}", self.min, self.perfect, self.max)
    }
}

impl FromStr for SizeRange {
    type Err = BesticonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size_range(s)
    }
}

/// Parse a size range.
///
/// A single number `N` means "at least N, prefer exactly N, no practical
/// ceiling" and expands to `N..N..MAX_ICON_SIZE`.
pub fn parse_size_range(input: &str) -> BesticonResult<SizeRange> {
    let input = input.trim();
    if input.is_empty() {
        return Err(BesticonError::BadSize);
    }

    let parts: Vec<&str> = input.split(RANGE_SEPARATOR).collect();
    let (min, perfect, max) = match parts.as_slice() {
        [single] => {
            let n = parse_size(single).ok_or(BesticonError::BadSize)?;
            (n, n, MAX_ICON_SIZE)
        }
        [min, perfect, max] => (
            parse_size(min).ok_or(BesticonError::BadSize)?,
            parse_size(perfect).ok_or(BesticonError::BadSize)?,
            parse_size(max).ok_or(BesticonError::BadSize)?,
        ),
        _ => return Err(BesticonError::BadSize),
    };

    // Negative minimums are already rejected by parse_size.
    if max < perfect || perfect < min || max > MAX_ICON_SIZE {
        return Err(BesticonError::BadSize);
    }

    Ok(SizeRange { min, perfect, max })
}

/// Parse one non-negative size component.
pub fn parse_size(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    let n: i64 = token.parse().ok()?;
    u32::try_from(n).ok()
}
