use crate::buffer::PixelBuffer;
use crate::error::{AnalysisError, Result};
use crate::raster::{RasterSurface, SoftwareCanvas};
use crate::types::Rect;
use image::Rgba;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const PAGE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const RESIDUE: [u8; 4] = [128, 128, 128, 255];

/// Options for a synthetic redacted page.
#[derive(Debug, Clone)]
pub struct SynthOptions {
    pub width: u32,
    pub height: u32,
    pub block: Rect,
    /// Share of block pixels repainted mid-grey, in `[0, 1]`.
    pub noise: f64,
    pub seed: u64,
}

/// White page with one black block. With `noise > 0`, exactly
/// `round(noise * area)` distinct in-bounds block pixels are turned grey,
/// chosen by a seeded shuffle so the output is reproducible.
pub fn synth_page(options: &SynthOptions) -> Result<PixelBuffer> {
    if !(0.0..=1.0).contains(&options.noise) {
        return Err(AnalysisError::InvalidConfig(format!(
            "noise ratio {} must be within [0, 1]",
            options.noise
        )));
    }
    let mut canvas = SoftwareCanvas::new(options.width, options.height)?;
    canvas.put_rect(Rect::new(0, 0, options.width, options.height), PAGE)?;
    canvas.put_rect(options.block, INK)?;
    if options.noise <= 0.0 {
        return Ok(canvas.into_buffer());
    }

    let block = options.block;
    let mut coords: Vec<(i32, i32)> = Vec::new();
    for dy in 0..block.h {
        for dx in 0..block.w {
            let x = i64::from(block.x) + i64::from(dx);
            let y = i64::from(block.y) + i64::from(dy);
            if x >= 0 && y >= 0 && x < i64::from(options.width) && y < i64::from(options.height) {
                coords.push((x as i32, y as i32));
            }
        }
    }
    let wanted = (options.noise * block.area() as f64).round() as usize;
    let mut rng = StdRng::seed_from_u64(options.seed);
    coords.shuffle(&mut rng);

    let dot = PixelBuffer::filled(1, 1, RESIDUE)?;
    for &(x, y) in coords.iter().take(wanted) {
        canvas.put_pixels(x, y, &dot)?;
    }
    Ok(canvas.into_buffer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{is_lazy_redaction, ArtifactClassifier};
    use crate::detect::detect;

    fn options(noise: f64) -> SynthOptions {
        SynthOptions {
            width: 120,
            height: 80,
            block: Rect::new(20, 20, 50, 20),
            noise,
            seed: 42,
        }
    }

    #[test]
    fn clean_page_is_detected_and_clean() {
        let page = synth_page(&options(0.0)).unwrap();
        assert_eq!(detect(&page, 30, 30), Some(Rect::new(20, 20, 50, 20)));
        assert!(!is_lazy_redaction(&page, Rect::new(20, 20, 50, 20)));
        assert_eq!(page.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn noise_greys_exact_pixel_count() {
        let page = synth_page(&options(0.06)).unwrap();
        let report = ArtifactClassifier::default().analyze(&page, Rect::new(20, 20, 50, 20));
        assert_eq!(report.suspicious_pixels, 60);
        assert!(report.lazy);
    }

    #[test]
    fn same_seed_same_page() {
        assert_eq!(
            synth_page(&options(0.3)).unwrap(),
            synth_page(&options(0.3)).unwrap()
        );
    }

    #[test]
    fn rejects_noise_out_of_range() {
        assert!(synth_page(&options(1.2)).is_err());
    }
}
