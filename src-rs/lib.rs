//! Pixel-buffer analysis for redaction blocks.
//!
//! Four stateless operations over caller-owned RGBA buffers:
//! [`detect`] finds a dark block from a probe point, [`is_lazy_redaction`]
//! flags non-uniform fills, [`estimate_hidden_length`] converts widths into a
//! character count, and [`compose`] renders an annotated report image.

pub mod buffer;
pub mod classify;
pub mod compose;
pub mod config;
pub mod detect;
pub mod error;
pub mod estimate;
pub mod raster;
pub mod synth;
pub mod types;

pub use buffer::{luminance, PixelBuffer};
pub use classify::{is_lazy_redaction, ArtifactClassifier, ArtifactReport};
pub use compose::{compose, compose_on};
pub use config::AnalysisConfig;
pub use detect::{detect, RegionDetector};
pub use error::{AnalysisError, Result};
pub use estimate::{average_char_width, estimate_hidden_length};
pub use raster::{RasterSurface, SoftwareCanvas};
pub use synth::{synth_page, SynthOptions};
pub use types::{Profile, Rect};
