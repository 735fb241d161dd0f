use crate::buffer::PixelBuffer;
use crate::config::AnalysisConfig;
use crate::types::Rect;
use serde::Serialize;
use tracing::debug;

/// Pixel-uniformity summary for one user-drawn block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArtifactReport {
    /// Pixels whose luminance falls strictly inside the artifact band.
    pub suspicious_pixels: u64,
    pub area: u64,
    pub ratio: f64,
    pub lazy: bool,
}

/// Flags "lazy" redactions whose fill is not uniformly dark.
///
/// This is a density test, not a pattern classifier: compression noise trips
/// it as readily as leftover glyphs.
#[derive(Debug, Clone, Default)]
pub struct ArtifactClassifier {
    config: AnalysisConfig,
}

impl ArtifactClassifier {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Counts mid-tone pixels inside `rect`. Parts of the rect outside the
    /// buffer read as transparent black, so they never count but stay in the
    /// area. The share must strictly exceed `artifact_ratio` to be lazy.
    pub fn analyze(&self, buffer: &PixelBuffer, rect: Rect) -> ArtifactReport {
        let area = rect.area();
        if area == 0 {
            return ArtifactReport {
                suspicious_pixels: 0,
                area: 0,
                ratio: 0.0,
                lazy: false,
            };
        }

        let x0 = i64::from(rect.x).max(0);
        let y0 = i64::from(rect.y).max(0);
        let x1 = rect.x2().min(i64::from(buffer.width()));
        let y1 = rect.y2().min(i64::from(buffer.height()));

        let mut suspicious_pixels = 0u64;
        for y in y0..y1 {
            for x in x0..x1 {
                let Some(luma) = buffer.luminance(x, y) else {
                    continue;
                };
                if luma > self.config.artifact_low && luma < self.config.artifact_high {
                    suspicious_pixels += 1;
                }
            }
        }

        let ratio = suspicious_pixels as f64 / area as f64;
        let lazy = suspicious_pixels as f64 > area as f64 * self.config.artifact_ratio;
        debug!(%rect, suspicious_pixels, area, lazy, "artifact scan");
        ArtifactReport {
            suspicious_pixels,
            area,
            ratio,
            lazy,
        }
    }

    pub fn is_lazy_redaction(&self, buffer: &PixelBuffer, rect: Rect) -> bool {
        self.analyze(buffer, rect).lazy
    }
}

/// [`ArtifactClassifier::is_lazy_redaction`] with default thresholds.
pub fn is_lazy_redaction(buffer: &PixelBuffer, rect: Rect) -> bool {
    ArtifactClassifier::default().is_lazy_redaction(buffer, rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::tests_support::{page_with_block, set, WHITE};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    const GREY: [u8; 4] = [128, 128, 128, 255];

    /// Greys exactly `count` distinct pixels of a 10x10 block at (0,0).
    fn block_with_grey(count: usize) -> PixelBuffer {
        let mut buffer = page_with_block(20, 20, Rect::new(0, 0, 10, 10));
        for i in 0..count {
            set(&mut buffer, (i % 10) as u32, (i / 10) as u32, GREY);
        }
        buffer
    }

    #[test]
    fn uniform_black_is_clean() {
        for size in [1u32, 5, 37] {
            let buffer = page_with_block(40, 40, Rect::new(1, 1, size, size));
            assert!(!is_lazy_redaction(&buffer, Rect::new(1, 1, size, size)));
        }
    }

    #[test]
    fn exactly_five_percent_is_clean() {
        let rect = Rect::new(0, 0, 10, 10);
        let report = ArtifactClassifier::default().analyze(&block_with_grey(5), rect);
        assert_eq!(report.suspicious_pixels, 5);
        assert!(!report.lazy);
        assert!(is_lazy_redaction(&block_with_grey(6), rect));
    }

    #[test]
    fn random_noise_above_cutoff_is_lazy() {
        let rect = Rect::new(10, 10, 50, 40);
        let mut buffer = page_with_block(80, 80, rect);
        let mut coords: Vec<(u32, u32)> = (10..60)
            .flat_map(|x| (10..50).map(move |y| (x, y)))
            .collect();
        coords.shuffle(&mut StdRng::seed_from_u64(7));
        // 6% of 2000
        for &(x, y) in coords.iter().take(120) {
            set(&mut buffer, x, y, [90, 90, 90, 255]);
        }
        assert!(is_lazy_redaction(&buffer, rect));
    }

    #[test]
    fn white_and_near_black_are_not_suspicious() {
        let rect = Rect::new(0, 0, 10, 10);
        let mut buffer = page_with_block(10, 10, rect);
        for x in 0..10 {
            set(&mut buffer, x, 0, WHITE);
            set(&mut buffer, x, 1, [25, 25, 25, 255]);
        }
        let report = ArtifactClassifier::default().analyze(&buffer, rect);
        assert_eq!(report.suspicious_pixels, 0);
        assert!(!report.lazy);
    }

    #[test]
    fn zero_area_is_clean() {
        let buffer = block_with_grey(100);
        assert!(!is_lazy_redaction(&buffer, Rect::new(0, 0, 0, 10)));
        assert!(!is_lazy_redaction(&buffer, Rect::new(0, 0, 10, 0)));
    }

    #[test]
    fn rect_past_buffer_edge_counts_outside_as_dark() {
        let buffer = block_with_grey(100);
        // 100 grey pixels inside, 300 outside the 20x20 buffer
        let report = ArtifactClassifier::default().analyze(&buffer, Rect::new(-10, -10, 20, 20));
        assert_eq!(report.area, 400);
        assert_eq!(report.suspicious_pixels, 100);
        assert!(report.lazy);
    }

    #[test]
    fn custom_ratio_is_honoured() {
        let classifier = ArtifactClassifier::new(AnalysisConfig {
            artifact_ratio: 0.5,
            ..AnalysisConfig::default()
        });
        let rect = Rect::new(0, 0, 10, 10);
        assert!(!classifier.is_lazy_redaction(&block_with_grey(50), rect));
        assert!(classifier.is_lazy_redaction(&block_with_grey(51), rect));
    }
}
