//! Human-readable rendering of lookup results.

use std::io::{self, Write};

use besticon::Icon;

/// One line per icon: dimensions, format, size, url and any decode error.
pub fn write_icon_table(out: &mut impl Write, icons: &[Icon]) -> io::Result<()> {
    if icons.is_empty() {
        return writeln!(out, "no icons found");
    }
    for icon in icons {
        let format = if icon.format.is_empty() { "-" } else { &icon.format };
        write!(
            out,
            "{:>9}  {:<4}  {:>8}  {}",
            format!("{}x{}", icon.width, icon.height),
            format,
            icon.bytes,
            display_url(&icon.url),
        )?;
        if let Some(err) = &icon.error {
            write!(out, "  ({err})")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `#rrggbb` for an RGB triple.
pub fn hex_color([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

const MAX_DATA_URI_DISPLAY: usize = 48;

/// Inline `data:` URIs are shortened; they can be many kilobytes long.
fn display_url(url: &str) -> String {
    if url.starts_with("data:") && url.len() > MAX_DATA_URI_DISPLAY {
        let cut = (0..=MAX_DATA_URI_DISPLAY)
            .rev()
            .find(|&i| url.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}...", &url[..cut])
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use besticon::IconError;

    fn render(icons: &[Icon]) -> String {
        let mut buf = Vec::new();
        write_icon_table(&mut buf, icons).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_table_rows() {
        let ok = Icon {
            url: "https://example.com/apple-touch-icon.png".to_string(),
            width: 180,
            height: 180,
            format: "png".to_string(),
            bytes: 4_096,
            ..Default::default()
        };
        let broken = Icon {
            url: "https://example.com/favicon.ico".to_string(),
            bytes: 12,
            error: Some(IconError::UnknownFormat),
            ..Default::default()
        };
        let text = render(&[ok, broken]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("180x180"));
        assert!(lines[0].contains("png"));
        assert!(lines[0].ends_with("https://example.com/apple-touch-icon.png"));
        assert!(lines[1].contains("0x0"));
        assert!(lines[1].contains(" -  "));
        assert!(lines[1].ends_with("(unknown image format)"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render(&[]), "no icons found\n");
    }

    #[test]
    fn test_data_uri_is_shortened() {
        let long = format!("data:image/png;base64,{}", "A".repeat(200));
        let shown = display_url(&long);
        assert!(shown.len() < long.len());
        assert!(shown.ends_with("..."));
        assert_eq!(display_url("data:,x"), "data:,x");
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color([220, 20, 1]), "#dc1401");
        assert_eq!(hex_color([0, 0, 0]), "#000000");
    }
}
