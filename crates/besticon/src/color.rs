//! Dominant color extraction from decoded icon pixels.

use std::collections::HashMap;

use image::{DynamicImage, GenericImageView, Rgba};

use crate::types::Icon;

/// Icons are downscaled to at most this many pixels per side before sampling.
const SAMPLE_SIZE: u32 = 64;

/// Pixels with lower alpha are treated as background.
const MIN_ALPHA: u8 = 128;

/// Channel bits kept when bucketing colors.
const BUCKET_SHIFT: u8 = 4;

/// Main color of the first icon whose retained bytes decode as an image.
///
/// Returns `None` for an empty list, icons without retained bytes, or
/// payloads that do not decode.
pub fn main_color_for_icons(icons: &[Icon]) -> Option<Rgba<u8>> {
    let img = icons.iter().find_map(|icon| {
        let data = icon.image_data.as_deref()?;
        match image::load_from_memory(data) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::debug!(url = %icon.url, "skipping icon for color sampling: {e}");
                None
            }
        }
    })?;
    main_color(&img)
}

/// Most representative opaque color of an image.
///
/// Colors are bucketed; the most populated bucket wins and its average is
/// returned. Near-white and near-black buckets only win when nothing else
/// is present.
pub fn main_color(img: &DynamicImage) -> Option<Rgba<u8>> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let sample = if w > SAMPLE_SIZE || h > SAMPLE_SIZE {
        img.thumbnail(SAMPLE_SIZE, SAMPLE_SIZE)
    } else {
        img.clone()
    };
    let rgba = sample.to_rgba8();

    // bucket -> (first seen, count, channel sums)
    let mut buckets: HashMap<(u8, u8, u8), (usize, u64, [u64; 3])> = HashMap::new();
    for (seen, px) in rgba.pixels().filter(|px| px.0[3] >= MIN_ALPHA).enumerate() {
        let [r, g, b, _] = px.0;
        let key = (r >> BUCKET_SHIFT, g >> BUCKET_SHIFT, b >> BUCKET_SHIFT);
        let entry = buckets.entry(key).or_insert((seen, 0, [0; 3]));
        entry.1 += 1;
        entry.2[0] += r as u64;
        entry.2[1] += g as u64;
        entry.2[2] += b as u64;
    }

    let pick = |neutral_ok: bool| {
        buckets
            .iter()
            .filter(|(key, _)| neutral_ok || !is_neutral(**key))
            // Most pixels first, then earliest seen for determinism.
            .max_by(|(_, a), (_, b)| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(_, (_, count, sums))| {
                Rgba([
                    (sums[0] / count) as u8,
                    (sums[1] / count) as u8,
                    (sums[2] / count) as u8,
                    255,
                ])
            })
    };

    pick(false).or_else(|| pick(true))
}

fn is_neutral((r, g, b): (u8, u8, u8)) -> bool {
    let max = (1u8 << (8 - BUCKET_SHIFT)) - 1;
    (r == max && g == max && b == max) || (r == 0 && g == 0 && b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn encode_png(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        img.write_with_encoder(encoder).unwrap();
        buf
    }

    fn icon_with_data(data: Vec<u8>) -> Icon {
        Icon {
            url: "http://example.com/icon.png".to_string(),
            format: "png".to_string(),
            image_data: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn test_broken_image_data_yields_none() {
        let icon = icon_with_data(b"broken-image-data".to_vec());
        assert_eq!(main_color_for_icons(&[icon]), None);
    }

    #[test]
    fn test_empty_and_missing_data_yield_none() {
        assert_eq!(main_color_for_icons(&[]), None);
        let mut icon = icon_with_data(Vec::new());
        icon.image_data = None;
        assert_eq!(main_color_for_icons(&[icon]), None);
    }

    #[test]
    fn test_solid_color() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([200, 30, 40, 255])));
        let icon = icon_with_data(encode_png(&img));
        assert_eq!(main_color_for_icons(&[icon]), Some(Rgba([200, 30, 40, 255])));
    }

    #[test]
    fn test_skips_undecodable_icons() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 120, 220, 255])));
        let icons = vec![
            icon_with_data(b"not an image".to_vec()),
            icon_with_data(encode_png(&img)),
        ];
        assert_eq!(main_color_for_icons(&icons), Some(Rgba([10, 120, 220, 255])));
    }

    #[test]
    fn test_prefers_color_over_white_background() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        for x in 0..3 {
            for y in 0..3 {
                img.put_pixel(x, y, Rgba([0, 128, 0, 255]));
            }
        }
        assert_eq!(
            main_color(&DynamicImage::ImageRgba8(img)),
            Some(Rgba([0, 128, 0, 255]))
        );
    }

    #[test]
    fn test_ignores_transparent_pixels() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 0]));
        img.put_pixel(5, 5, Rgba([0, 0, 255, 255]));
        assert_eq!(
            main_color(&DynamicImage::ImageRgba8(img)),
            Some(Rgba([0, 0, 255, 255]))
        );

        let clear = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        assert_eq!(main_color(&DynamicImage::ImageRgba8(clear)), None);
    }

    #[test]
    fn test_all_white_falls_back_to_white() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        assert_eq!(
            main_color(&DynamicImage::ImageRgba8(img)),
            Some(Rgba([255, 255, 255, 255]))
        );
    }
}
