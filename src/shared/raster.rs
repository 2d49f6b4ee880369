//! Text-document rasterization for the vision classifier.
//!
//! PDFs and images pass through untouched (the classifier consumes both
//! natively); plain text, markdown and CSV are drawn onto a fixed-width
//! white canvas so they can be submitted to the vision endpoint. Glyphs come
//! from an embedded 8x8 bitmap font scaled to the 16px layout font, which
//! keeps the output byte-identical across runs and hosts.

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{ImageFormat, Rgb, RgbImage};
use thiserror::Error;

/// Canvas width in pixels
pub const CANVAS_WIDTH: u32 = 800;

/// Layout font size in pixels
pub const FONT_SIZE: u32 = 16;

/// Padding around the text block
pub const PADDING: u32 = 20;

/// Line height multiplier of 1.2 over the font size
const LINE_HEIGHT: f32 = FONT_SIZE as f32 * 1.2;

/// Embedded glyphs are 8x8; scale them up to the layout font size
const GLYPH_SCALE: u32 = FONT_SIZE / 8;

/// Horizontal advance per character (monospace)
const CHAR_ADVANCE: u32 = 8 * GLYPH_SCALE;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(
        "Unsupported file type for conversion: {0}. Supported types: PDF, \
         images (JPEG, PNG, GIF, WebP), text files, CSV, and Markdown."
    )]
    UnsupportedType(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),
}

/// Outcome of preparing a document for the vision classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Input already consumable by the classifier (PDF or image); bytes
    /// returned unchanged.
    Passthrough(Vec<u8>),
    /// Text content rendered to a PNG raster.
    Png(Vec<u8>),
}

impl Rendered {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Rendered::Passthrough(bytes) | Rendered::Png(bytes) => bytes,
        }
    }
}

/// True for content the renderer treats as plain text
fn is_text_document(content_type: &str, filename: &str) -> bool {
    let name = filename.to_lowercase();
    matches!(content_type, "text/plain" | "text/csv" | "text/markdown")
        || name.ends_with(".txt")
        || name.ends_with(".csv")
        || name.ends_with(".md")
}

/// Prepare a document for image-capable classification.
///
/// PDF and `image/*` inputs are identity passthrough; textual inputs are
/// rendered to PNG; everything else is rejected.
pub fn render_document(
    data: &[u8],
    filename: &str,
    content_type: &str,
) -> Result<Rendered, RenderError> {
    if content_type == "application/pdf" || content_type.starts_with("image/") {
        return Ok(Rendered::Passthrough(data.to_vec()));
    }

    if is_text_document(content_type, filename) {
        let text = String::from_utf8_lossy(data);
        return render_text_to_png(&text).map(Rendered::Png);
    }

    Err(RenderError::UnsupportedType(content_type.to_string()))
}

/// Measured pixel width of a string in the embedded font
fn measure_text(text: &str) -> u32 {
    text.chars().count() as u32 * CHAR_ADVANCE
}

/// Greedy word-wrap: accumulate words until the next one would overflow the
/// drawable width, then start a new line.
fn wrap_lines(text: &str) -> Vec<String> {
    let usable_width = CANVAS_WIDTH - 2 * PADDING;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure_text(&candidate) > usable_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn draw_glyph(canvas: &mut RgbImage, ch: char, origin_x: u32, origin_y: u32) {
    let glyph = BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0u8; 8]);

    for (row_idx, row) in glyph.iter().enumerate() {
        for col_idx in 0..8u32 {
            if (row >> col_idx) & 1 == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let x = origin_x + col_idx * GLYPH_SCALE + dx;
                    let y = origin_y + row_idx as u32 * GLYPH_SCALE + dy;
                    if x < canvas.width() && y < canvas.height() {
                        canvas.put_pixel(x, y, Rgb([0, 0, 0]));
                    }
                }
            }
        }
    }
}

/// Render wrapped text onto a white canvas, black-on-white, top-aligned.
fn render_text_to_png(text: &str) -> Result<Vec<u8>, RenderError> {
    let lines = wrap_lines(text);

    let canvas_height = (lines.len() as f32 * LINE_HEIGHT).ceil() as u32 + 2 * PADDING;
    let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, canvas_height, Rgb([255, 255, 255]));

    for (line_idx, line) in lines.iter().enumerate() {
        let y = PADDING + (line_idx as f32 * LINE_HEIGHT).round() as u32;
        for (char_idx, ch) in line.chars().enumerate() {
            let x = PADDING + char_idx as u32 * CHAR_ADVANCE;
            if x + CHAR_ADVANCE > CANVAS_WIDTH {
                break;
            }
            draw_glyph(&mut canvas, ch, x, y);
        }
    }

    let mut buffer = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| RenderError::Encoding(e.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_is_identity_passthrough() {
        let data = b"%PDF-1.4 fake pdf bytes".to_vec();
        let rendered = render_document(&data, "doc.pdf", "application/pdf").unwrap();
        assert_eq!(rendered, Rendered::Passthrough(data));
    }

    #[test]
    fn images_are_identity_passthrough() {
        let data = vec![0x89, 0x50, 0x4e, 0x47, 1, 2, 3];
        let rendered = render_document(&data, "scan.png", "image/png").unwrap();
        assert_eq!(rendered, Rendered::Passthrough(data));
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let err = render_document(b"zipzip", "archive.zip", "application/zip").unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedType(_)));
    }

    #[test]
    fn text_render_is_deterministic() {
        let data = "Lønnslipp for januar 2026. Utbetalt beløp: 34 500 kr.".as_bytes();

        let first = render_document(data, "lønnslipp.txt", "text/plain").unwrap();
        let second = render_document(data, "lønnslipp.txt", "text/plain").unwrap();

        assert_eq!(first, second);
        match first {
            Rendered::Png(bytes) => {
                // PNG signature
                assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4e, 0x47]);
            }
            Rendered::Passthrough(_) => panic!("text must be rasterized"),
        }
    }

    #[test]
    fn markdown_detected_by_extension_without_mime() {
        let rendered = render_document(b"# Tittel", "notat.md", "application/octet-stream");
        assert!(matches!(rendered, Ok(Rendered::Png(_))));
    }

    #[test]
    fn wrap_is_greedy_on_measured_width() {
        // 47 chars of 16px each fit in the 760px usable width; 48 do not.
        let fits = "a".repeat(47);
        assert_eq!(wrap_lines(&fits).len(), 1);

        let wraps = format!("{} {}", "a".repeat(40), "b".repeat(10));
        let lines = wrap_lines(&wraps);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "a".repeat(40));
        assert_eq!(lines[1], "b".repeat(10));
    }

    #[test]
    fn canvas_height_follows_line_count() {
        let text = "ord ".repeat(200);
        let lines = wrap_lines(&text);
        let rendered = render_text_to_png(&text).unwrap();

        let decoded = image::load_from_memory(&rendered).unwrap();
        let expected = (lines.len() as f32 * LINE_HEIGHT).ceil() as u32 + 2 * PADDING;
        assert_eq!(decoded.height(), expected);
        assert_eq!(decoded.width(), CANVAS_WIDTH);
    }
}
