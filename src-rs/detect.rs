//! Redaction block detection from a single probe point.
//!
//! Uses a scanline cross: a horizontal run through the probe, a vertical run
//! through that run's midpoint, then a second horizontal run through the
//! vertical midpoint. Cost is `O(W + H)`. Recovery is exact for solid
//! axis-aligned blocks; rotated or partially occluded blocks yield an
//! approximation and are not handled as general blobs.

use crate::buffer::PixelBuffer;
use crate::config::AnalysisConfig;
use crate::types::Rect;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RegionDetector {
    config: AnalysisConfig,
}

impl RegionDetector {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Maximal dark rectangle containing the probe, or `None` when the probe
    /// is outside the buffer, not dark, or the result is too small.
    pub fn detect(&self, buffer: &PixelBuffer, probe_x: i64, probe_y: i64) -> Option<Rect> {
        if !self.is_dark(buffer, probe_x, probe_y) {
            debug!(probe_x, probe_y, "probe is not on a dark pixel");
            return None;
        }

        let (min_x, max_x) = self.run_horizontal(buffer, probe_x, probe_y);
        let mid_x = (min_x + max_x) / 2;
        let (min_y, max_y) = self.run_vertical(buffer, mid_x, probe_y);
        let mid_y = (min_y + max_y) / 2;
        let (min_x, max_x) = self.run_horizontal(buffer, mid_x, mid_y);

        let rect = Rect {
            x: min_x as i32,
            y: min_y as i32,
            w: (max_x - min_x + 1) as u32,
            h: (max_y - min_y + 1) as u32,
        };
        if rect.is_degenerate(self.config.min_region_side) {
            debug!(%rect, "dark region below minimum size");
            return None;
        }
        debug!(%rect, probe_x, probe_y, "detected redaction block");
        Some(rect)
    }

    fn is_dark(&self, buffer: &PixelBuffer, x: i64, y: i64) -> bool {
        buffer
            .luminance(x, y)
            .is_some_and(|luma| luma < self.config.dark_threshold)
    }

    fn run_horizontal(&self, buffer: &PixelBuffer, x: i64, y: i64) -> (i64, i64) {
        let mut min_x = x;
        let mut max_x = x;
        while self.is_dark(buffer, min_x - 1, y) {
            min_x -= 1;
        }
        while self.is_dark(buffer, max_x + 1, y) {
            max_x += 1;
        }
        (min_x, max_x)
    }

    fn run_vertical(&self, buffer: &PixelBuffer, x: i64, y: i64) -> (i64, i64) {
        let mut min_y = y;
        let mut max_y = y;
        while self.is_dark(buffer, x, min_y - 1) {
            min_y -= 1;
        }
        while self.is_dark(buffer, x, max_y + 1) {
            max_y += 1;
        }
        (min_y, max_y)
    }
}

/// [`RegionDetector::detect`] with default thresholds.
pub fn detect(buffer: &PixelBuffer, probe_x: i64, probe_y: i64) -> Option<Rect> {
    RegionDetector::default().detect(buffer, probe_x, probe_y)
}
