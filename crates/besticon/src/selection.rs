//! Best-icon selection for a size range.

use crate::size_range::SizeRange;
use crate::types::Icon;

/// Pick the icon whose width is closest to `range.perfect`.
///
/// Only usable icons with a width inside `[min, max]` qualify. Ties go to
/// the earlier icon, which after sorting is the larger or earlier-declared
/// one.
pub fn select_icon<'a>(icons: &'a [Icon], range: &SizeRange) -> Option<&'a Icon> {
    icons
        .iter()
        .filter(|icon| icon.is_usable() && range.contains(icon.width))
        .min_by_key(|icon| icon.width.abs_diff(range.perfect))
}
