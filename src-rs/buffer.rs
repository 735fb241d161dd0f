use crate::error::{AnalysisError, Result};
use image::{DynamicImage, RgbaImage};

/// Row-major RGBA8 pixels, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(AnalysisError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Solid fill, mostly useful for building fixtures.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let len = byte_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            data.extend_from_slice(&rgba);
        }
        Self::new(width, height, data)
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba_image(image.to_rgba8())
    }

    pub fn into_rgba_image(self) -> Result<RgbaImage> {
        let (width, height) = (self.width, self.height);
        RgbaImage::from_raw(width, height, self.data).ok_or_else(|| {
            AnalysisError::Render(format!("pixel data does not fit {width}x{height}"))
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 4]> {
        if !self.contains(x, y) {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let px = &self.data[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Weighted brightness of one pixel; `None` outside the buffer.
    pub fn luminance(&self, x: i64, y: i64) -> Option<f64> {
        self.pixel(x, y).map(luminance)
    }
}

/// `0.299·R + 0.587·G + 0.114·B`. Alpha is ignored.
pub fn luminance(rgba: [u8; 4]) -> f64 {
    0.299 * f64::from(rgba[0]) + 0.587 * f64::from(rgba[1]) + 0.114 * f64::from(rgba[2])
}

fn byte_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| AnalysisError::Render(format!("buffer {width}x{height} is too large")))
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::PixelBuffer;
    use crate::types::Rect;

    pub const WHITE: [u8; 4] = [255, 255, 255, 255];
    pub const BLACK: [u8; 4] = [0, 0, 0, 255];

    pub fn set(buffer: &mut PixelBuffer, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = ((y * buffer.width + x) * 4) as usize;
        buffer.data[idx..idx + 4].copy_from_slice(&rgba);
    }

    pub fn fill(buffer: &mut PixelBuffer, rect: Rect, rgba: [u8; 4]) {
        for y in rect.y as u32..rect.y as u32 + rect.h {
            for x in rect.x as u32..rect.x as u32 + rect.w {
                set(buffer, x, y, rgba);
            }
        }
    }

    /// White page with one solid black block.
    pub fn page_with_block(width: u32, height: u32, block: Rect) -> PixelBuffer {
        let mut buffer = PixelBuffer::filled(width, height, WHITE).unwrap();
        fill(&mut buffer, block, BLACK);
        buffer
    }
}
