//! Watermark compositing
//!
//! Stamps a semi-transparent, rotated "viewer • date" line across the
//! rendered page. This is cosmetic deterrence against casual redistribution
//! of screenshots; it is not a security control and does not prevent
//! extraction of the underlying content.
//!
//! Glyphs are rasterized with `fontdue` from a vendored DejaVu Sans Bold
//! face, then composited in place — output dimensions never change.

use std::sync::Arc;

use chrono::Utc;
use fontdue::{Font, FontSettings};
use image::RgbaImage;

static FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

const OPACITY: f32 = 0.15;
const ANGLE_DEGREES: f32 = -20.0;
const COLOR: [u8; 3] = [0xcc, 0x00, 0x00];
/// 48 logical px at device scale 2.
const FONT_PX: f32 = 96.0;

/// Build the overlay label for a viewer.
pub fn label(viewer: Option<&str>) -> String {
    let who = viewer.unwrap_or("Preview");
    format!("{} • {}", who, Utc::now().format("%Y-%m-%d"))
}

#[derive(Clone)]
pub struct Watermarker {
    font: Arc<Font>,
}

impl Default for Watermarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Watermarker {
    pub fn new() -> Self {
        // The face ships inside the binary; failing to parse it is a build
        // defect, not a runtime condition.
        let font = Font::from_bytes(FONT_BYTES, FontSettings::default())
            .expect("vendored watermark font must parse");
        Self {
            font: Arc::new(font),
        }
    }

    /// Composite `text` over the center of `image`, rotated and faded.
    pub fn stamp(&self, image: &mut RgbaImage, text: &str) {
        let mask = self.rasterize_line(text, FONT_PX);
        if mask.width == 0 || mask.height == 0 {
            return;
        }

        let (img_w, img_h) = image.dimensions();
        let cx = img_w as f32 / 2.0;
        let cy = img_h as f32 / 2.0;
        let theta = ANGLE_DEGREES.to_radians();
        let (sin, cos) = theta.sin_cos();

        // Only pixels inside the rotated mask's bounding circle can change.
        let half_w = mask.width as f32 / 2.0;
        let half_h = mask.height as f32 / 2.0;
        let radius = (half_w * half_w + half_h * half_h).sqrt();
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil() as u32).min(img_w);
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let y1 = ((cy + radius).ceil() as u32).min(img_h);

        for y in y0..y1 {
            for x in x0..x1 {
                // Inverse-rotate the image pixel into mask space.
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let u = dx * cos + dy * sin + half_w;
                let v = -dx * sin + dy * cos + half_h;
                if u < 0.0 || v < 0.0 || u >= mask.width as f32 || v >= mask.height as f32 {
                    continue;
                }

                let coverage = mask.at(u as u32, v as u32);
                if coverage == 0 {
                    continue;
                }

                let alpha = (coverage as f32 / 255.0) * OPACITY;
                let pixel = image.get_pixel_mut(x, y);
                for (channel, &tint) in pixel.0.iter_mut().zip(COLOR.iter()).take(3) {
                    *channel =
                        (*channel as f32 * (1.0 - alpha) + tint as f32 * alpha).round() as u8;
                }
            }
        }
    }

    /// Rasterize a single line of text into a coverage mask.
    fn rasterize_line(&self, text: &str, px: f32) -> CoverageMask {
        let (ascent, height) = match self.font.horizontal_line_metrics(px) {
            Some(line) => (
                line.ascent,
                (line.ascent - line.descent).ceil().max(1.0) as u32,
            ),
            None => (px, px.ceil().max(1.0) as u32),
        };

        let width: f32 = text
            .chars()
            .map(|ch| self.font.metrics(ch, px).advance_width)
            .sum();
        let width = width.ceil().max(0.0) as u32;

        let mut mask = CoverageMask::new(width, height);
        let mut pen_x = 0.0f32;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, px);
            let glyph_left = pen_x + metrics.xmin as f32;
            let glyph_top = ascent - metrics.ymin as f32 - metrics.height as f32;
            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let x = glyph_left + gx as f32;
                    let y = glyph_top + gy as f32;
                    if x >= 0.0 && y >= 0.0 {
                        mask.max_at(x as u32, y as u32, coverage);
                    }
                }
            }
            pen_x += metrics.advance_width;
        }

        mask
    }
}

struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    fn at(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    fn max_at(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            let cell = &mut self.data[(y * self.width + x) as usize];
            *cell = (*cell).max(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn white(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn stamp_preserves_dimensions() {
        let watermarker = Watermarker::new();
        let mut image = white(640, 900);
        watermarker.stamp(&mut image, "reader@example.com • 2026-08-27");
        assert_eq!(image.dimensions(), (640, 900));
    }

    #[test]
    fn stamp_tints_some_pixels_red() {
        let watermarker = Watermarker::new();
        let mut image = white(800, 800);
        watermarker.stamp(&mut image, "reader@example.com • 2026-08-27");

        let tinted = image
            .pixels()
            .filter(|p| p.0[0] > p.0[1] && p.0[0] > p.0[2])
            .count();
        assert!(tinted > 0, "expected red-tinted watermark pixels");
    }

    #[test]
    fn corners_stay_untouched() {
        let watermarker = Watermarker::new();
        let mut image = white(1000, 1000);
        watermarker.stamp(&mut image, "x • 2026-08-27");
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(999, 999).0, [255, 255, 255, 255]);
    }

    #[test]
    fn stamp_on_tiny_image_does_not_panic() {
        let watermarker = Watermarker::new();
        let mut image = white(8, 8);
        watermarker.stamp(&mut image, "reader@example.com • 2026-08-27");
        assert_eq!(image.dimensions(), (8, 8));
    }

    #[test]
    fn empty_label_is_a_no_op() {
        let watermarker = Watermarker::new();
        let mut image = white(64, 64);
        let before = image.clone();
        watermarker.stamp(&mut image, "");
        assert_eq!(image.as_raw(), before.as_raw());
    }

    #[test]
    fn label_defaults_to_preview() {
        let text = label(None);
        assert!(text.starts_with("Preview • "));
        // ISO date suffix, e.g. "Preview • 2026-08-27"
        assert_eq!(text.len(), "Preview • 2026-08-27".len());
    }

    #[test]
    fn label_uses_viewer_when_present() {
        let text = label(Some("reader@example.com"));
        assert!(text.starts_with("reader@example.com • "));
    }
}
