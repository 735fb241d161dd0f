//! Drawing capability used by the report compositor, plus a software
//! implementation over `image::RgbaImage` with the `font8x8` bitmap font.

use crate::buffer::PixelBuffer;
use crate::error::{AnalysisError, Result};
use crate::types::Rect;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

const GLYPH_SIZE: i64 = 8;

/// Minimal raster backend: read a region, copy pixels in, fill rectangles,
/// draw a line of text. Coordinates outside the surface are clipped.
pub trait RasterSurface {
    fn dimensions(&self) -> (u32, u32);

    /// Region copy; pixels outside the surface read as transparent black.
    fn pixels(&self, rect: Rect) -> Result<PixelBuffer>;

    /// Raw copy with no blending.
    fn put_pixels(&mut self, x: i32, y: i32, source: &PixelBuffer) -> Result<()>;

    fn put_rect(&mut self, rect: Rect, color: Rgba<u8>) -> Result<()>;

    /// Draws `text` with its baseline at `baseline_y`.
    fn put_text(
        &mut self,
        x: i32,
        baseline_y: i32,
        text: &str,
        size_px: f64,
        color: Rgba<u8>,
    ) -> Result<()>;

    /// Advance width of `text` at `size_px`.
    fn text_width(&self, text: &str, size_px: f64) -> u32;
}

#[derive(Debug, Clone)]
pub struct SoftwareCanvas {
    image: RgbaImage,
}

impl SoftwareCanvas {
    /// Transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let buffer = PixelBuffer::filled(width, height, [0, 0, 0, 0])?;
        Ok(Self {
            image: buffer.into_rgba_image()?,
        })
    }

    pub fn from_buffer(buffer: PixelBuffer) -> Result<Self> {
        Ok(Self {
            image: buffer.into_rgba_image()?,
        })
    }

    pub fn into_buffer(self) -> PixelBuffer {
        PixelBuffer::from_rgba_image(self.image)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Outline drawn outward from `rect` by `thickness` pixels.
    pub fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, thickness: u32) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        let t = i64::from(thickness.max(1));
        let x0 = i64::from(rect.x);
        let y0 = i64::from(rect.y);
        let x1 = rect.x2() - 1;
        let y1 = rect.y2() - 1;
        for i in 0..t {
            for xx in (x0 - i)..=(x1 + i) {
                self.blend_at(xx, y0 - i, color);
                self.blend_at(xx, y1 + i, color);
            }
            for yy in (y0 - i)..=(y1 + i) {
                self.blend_at(x0 - i, yy, color);
                self.blend_at(x1 + i, yy, color);
            }
        }
    }

    fn blend_at(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= i64::from(self.image.width()) || y >= i64::from(self.image.height())
        {
            return;
        }
        let dst = *self.image.get_pixel(x as u32, y as u32);
        self.image
            .put_pixel(x as u32, y as u32, blend_pixel(dst, color));
    }
}

impl RasterSurface for SoftwareCanvas {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn pixels(&self, rect: Rect) -> Result<PixelBuffer> {
        let mut out = PixelBuffer::filled(rect.w, rect.h, [0, 0, 0, 0])?.into_rgba_image()?;
        for oy in 0..rect.h {
            for ox in 0..rect.w {
                let sx = i64::from(rect.x) + i64::from(ox);
                let sy = i64::from(rect.y) + i64::from(oy);
                if sx < 0
                    || sy < 0
                    || sx >= i64::from(self.image.width())
                    || sy >= i64::from(self.image.height())
                {
                    continue;
                }
                out.put_pixel(ox, oy, *self.image.get_pixel(sx as u32, sy as u32));
            }
        }
        Ok(PixelBuffer::from_rgba_image(out))
    }

    fn put_pixels(&mut self, x: i32, y: i32, source: &PixelBuffer) -> Result<()> {
        let (img_w, img_h) = self.image.dimensions();
        for sy in 0..source.height() {
            let ty = i64::from(y) + i64::from(sy);
            if ty < 0 || ty >= i64::from(img_h) {
                continue;
            }
            for sx in 0..source.width() {
                let tx = i64::from(x) + i64::from(sx);
                if tx < 0 || tx >= i64::from(img_w) {
                    continue;
                }
                let Some(px) = source.pixel(i64::from(sx), i64::from(sy)) else {
                    continue;
                };
                self.image.put_pixel(tx as u32, ty as u32, Rgba(px));
            }
        }
        Ok(())
    }

    fn put_rect(&mut self, rect: Rect, color: Rgba<u8>) -> Result<()> {
        let x0 = i64::from(rect.x).max(0);
        let y0 = i64::from(rect.y).max(0);
        let x1 = rect.x2().min(i64::from(self.image.width()));
        let y1 = rect.y2().min(i64::from(self.image.height()));
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_at(x, y, color);
            }
        }
        Ok(())
    }

    fn put_text(
        &mut self,
        x: i32,
        baseline_y: i32,
        text: &str,
        size_px: f64,
        color: Rgba<u8>,
    ) -> Result<()> {
        if !size_px.is_finite() {
            return Err(AnalysisError::Render(format!(
                "font size {size_px} is not finite"
            )));
        }
        let scale = glyph_scale(size_px);
        let top = i64::from(baseline_y) - GLYPH_SIZE * scale;
        let mut cursor_x = i64::from(x);
        for ch in text.chars() {
            let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
            let Some(glyph) = glyph else {
                cursor_x += GLYPH_SIZE * scale;
                continue;
            };
            for (row_idx, row) in glyph.iter().enumerate() {
                let row_bits = *row;
                for col_idx in 0..GLYPH_SIZE {
                    if (row_bits >> col_idx) & 1 == 0 {
                        continue;
                    }
                    let px = cursor_x + col_idx * scale;
                    let py = top + row_idx as i64 * scale;
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.blend_at(px + sx, py + sy, color);
                        }
                    }
                }
            }
            cursor_x += GLYPH_SIZE * scale;
        }
        Ok(())
    }

    fn text_width(&self, text: &str, size_px: f64) -> u32 {
        let advance = GLYPH_SIZE * glyph_scale(size_px);
        (text.chars().count() as i64 * advance).clamp(0, i64::from(u32::MAX)) as u32
    }
}

/// Integer multiple of the 8px bitmap glyph closest to `size_px`.
pub fn glyph_scale(size_px: f64) -> i64 {
    if !size_px.is_finite() {
        return 1;
    }
    ((size_px / GLYPH_SIZE as f64).round() as i64).max(1)
}

/// Source-over compositing of straight-alpha colours.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let dst_a = f64::from(dst[3]) / 255.0;
    let out_a = a + dst_a * inv;
    let channel = |d: u8, s: u8| -> u8 {
        let value = (f64::from(s) * a + f64::from(d) * dst_a * inv) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(dst[0], src[0]),
        channel(dst[1], src[1]),
        channel(dst[2], src[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn opaque_source_replaces_destination() {
        assert_eq!(blend_pixel(Rgba([0, 0, 0, 0]), RED), RED);
        assert_eq!(blend_pixel(Rgba([9, 9, 9, 255]), RED), RED);
    }

    #[test]
    fn transparent_source_keeps_destination() {
        let dst = Rgba([1, 2, 3, 4]);
        assert_eq!(blend_pixel(dst, Rgba([255, 255, 255, 0])), dst);
    }

    #[test]
    fn half_alpha_mixes_over_opaque() {
        let out = blend_pixel(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out[3], 255);
        assert_eq!(out[0], 128);
    }

    #[test]
    fn glyph_scale_rounds_to_nearest_multiple() {
        assert_eq!(glyph_scale(20.0), 3);
        assert_eq!(glyph_scale(16.0), 2);
        assert_eq!(glyph_scale(12.0), 2);
        assert_eq!(glyph_scale(3.0), 1);
        assert_eq!(glyph_scale(f64::NAN), 1);
    }

    #[test]
    fn put_rect_clips_to_canvas() {
        let mut canvas = SoftwareCanvas::new(10, 10).unwrap();
        canvas.put_rect(Rect::new(-5, 8, 100, 100), RED).unwrap();
        assert_eq!(*canvas.image().get_pixel(0, 9), RED);
        assert_eq!(*canvas.image().get_pixel(0, 7), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn pixels_pads_outside_with_transparent_black() {
        let mut canvas = SoftwareCanvas::new(4, 4).unwrap();
        canvas.put_rect(Rect::new(0, 0, 4, 4), RED).unwrap();
        let region = canvas.pixels(Rect::new(2, 2, 4, 4)).unwrap();
        assert_eq!(region.dimensions(), (4, 4));
        assert_eq!(region.pixel(0, 0), Some(RED.0));
        assert_eq!(region.pixel(3, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn put_pixels_copies_raw_bytes() {
        let mut canvas = SoftwareCanvas::new(6, 6).unwrap();
        let source = PixelBuffer::filled(2, 2, [10, 20, 30, 40]).unwrap();
        canvas.put_pixels(4, 4, &source).unwrap();
        canvas.put_pixels(5, -1, &source).unwrap();
        assert_eq!(*canvas.image().get_pixel(4, 4), Rgba([10, 20, 30, 40]));
        assert_eq!(*canvas.image().get_pixel(5, 0), Rgba([10, 20, 30, 40]));
        assert_eq!(*canvas.image().get_pixel(3, 3), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn text_lands_above_baseline() {
        let mut canvas = SoftwareCanvas::new(40, 40).unwrap();
        canvas.put_text(2, 20, "H", 8.0, RED).unwrap();
        let image = canvas.image();
        let inked: Vec<(u32, u32)> = image
            .enumerate_pixels()
            .filter(|(_, _, px)| px[3] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|&(x, y)| (12..20).contains(&y) && (2..10).contains(&x)));
    }

    #[test]
    fn text_width_counts_chars() {
        let canvas = SoftwareCanvas::new(1, 1).unwrap();
        assert_eq!(canvas.text_width("abc", 16.0), 48);
        assert_eq!(canvas.text_width("", 16.0), 0);
    }

    #[test]
    fn stroke_rect_outlines_edges_only() {
        let mut canvas = SoftwareCanvas::new(20, 20).unwrap();
        canvas.stroke_rect(Rect::new(5, 5, 10, 10), RED, 1);
        let image = canvas.image();
        assert_eq!(*image.get_pixel(5, 5), RED);
        assert_eq!(*image.get_pixel(14, 14), RED);
        assert_eq!(*image.get_pixel(10, 10), Rgba([0, 0, 0, 0]));
    }
}
