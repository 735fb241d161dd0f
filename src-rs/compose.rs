use crate::buffer::PixelBuffer;
use crate::error::{AnalysisError, Result};
use crate::raster::{glyph_scale, RasterSurface, SoftwareCanvas};
use crate::types::{Profile, Rect};
use image::Rgba;
use tracing::{debug, instrument};

pub const BAND_HEIGHT: u32 = 150;
pub const TEXT_X: i32 = 20;
pub const DIVIDER_OFFSET: u32 = 10;
pub const TITLE_OFFSET: u32 = 40;
pub const MATCH_OFFSET: u32 = 75;
pub const DETAIL_OFFSET: u32 = 100;
pub const DISCLAIMER_OFFSET: u32 = 135;

pub const TITLE_SIZE: f64 = 20.0;
pub const BODY_SIZE: f64 = 16.0;
pub const DISCLAIMER_SIZE: f64 = 12.0;
/// Name overlay size as a fraction of the redaction height.
pub const NAME_SIZE_RATIO: f64 = 0.7;

pub const TITLE: &str = "REDACTION ANALYSIS REPORT";
pub const DISCLAIMER: &str = "SIMULATED RESULT - NOT A FORENSIC FINDING";

const BAND_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const DIVIDER_COLOR: Rgba<u8> = Rgba([90, 90, 90, 255]);
const TITLE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BODY_COLOR: Rgba<u8> = Rgba([210, 210, 210, 255]);
const DISCLAIMER_COLOR: Rgba<u8> = Rgba([140, 140, 140, 255]);
const PLATE_COLOR: Rgba<u8> = Rgba([150, 24, 24, 255]);
const NAME_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Report image: the source on top, an annotation band below, and the match
/// name stamped over the redaction. The source buffer is never touched.
pub fn compose(buffer: &PixelBuffer, redaction: Rect, profile: &Profile) -> Result<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    let out_height = height.checked_add(BAND_HEIGHT).ok_or_else(|| {
        AnalysisError::Render(format!("report height overflows for source height {height}"))
    })?;
    let mut canvas = SoftwareCanvas::new(width, out_height)?;
    compose_on(&mut canvas, buffer, redaction, profile)?;
    Ok(canvas.into_buffer())
}

/// Renders the report layout onto any surface at least `W x (H + 150)`.
#[instrument(skip_all, fields(width = buffer.width(), height = buffer.height(), redaction = %redaction))]
pub fn compose_on<S: RasterSurface>(
    surface: &mut S,
    buffer: &PixelBuffer,
    redaction: Rect,
    profile: &Profile,
) -> Result<()> {
    let (width, height) = buffer.dimensions();
    let (surface_w, surface_h) = surface.dimensions();
    if surface_w < width || u64::from(surface_h) < u64::from(height) + u64::from(BAND_HEIGHT) {
        return Err(AnalysisError::Render(format!(
            "surface {surface_w}x{surface_h} cannot hold a report for {width}x{height}"
        )));
    }

    surface.put_pixels(0, 0, buffer)?;

    let band_top = to_coord(height)?;
    surface.put_rect(Rect::new(0, band_top, width, BAND_HEIGHT), BAND_COLOR)?;
    surface.put_rect(
        Rect::new(
            TEXT_X,
            offset(height, DIVIDER_OFFSET)?,
            width.saturating_sub(2 * TEXT_X as u32),
            1,
        ),
        DIVIDER_COLOR,
    )?;

    let match_line = format!("SUBJECT MATCH: {}", profile.name.to_uppercase());
    let detail_line = format!(
        "ROLE: {}  |  CLEARANCE: {}",
        profile.role, profile.clearance
    );
    surface.put_text(
        TEXT_X,
        offset(height, TITLE_OFFSET)?,
        TITLE,
        TITLE_SIZE,
        TITLE_COLOR,
    )?;
    surface.put_text(
        TEXT_X,
        offset(height, MATCH_OFFSET)?,
        &match_line,
        BODY_SIZE,
        BODY_COLOR,
    )?;
    surface.put_text(
        TEXT_X,
        offset(height, DETAIL_OFFSET)?,
        &detail_line,
        BODY_SIZE,
        BODY_COLOR,
    )?;
    surface.put_text(
        TEXT_X,
        offset(height, DISCLAIMER_OFFSET)?,
        DISCLAIMER,
        DISCLAIMER_SIZE,
        DISCLAIMER_COLOR,
    )?;

    stamp_name(surface, redaction, &profile.name)?;
    debug!(name = %profile.name, "report composed");
    Ok(())
}

/// Plate over the redaction, then the name centred on both axes.
fn stamp_name<S: RasterSurface>(surface: &mut S, redaction: Rect, name: &str) -> Result<()> {
    if name.is_empty() {
        return Ok(());
    }
    surface.put_rect(redaction, PLATE_COLOR)?;

    let size = NAME_SIZE_RATIO * f64::from(redaction.h);
    let glyph_height = 8 * glyph_scale(size);
    let text_width = i64::from(surface.text_width(name, size));
    let (cx, cy) = redaction.center();
    let x = cx - text_width / 2;
    let baseline = cy - glyph_height / 2 + glyph_height;
    surface.put_text(clamp_coord(x), clamp_coord(baseline), name, size, NAME_COLOR)
}

fn to_coord(value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| AnalysisError::Render(format!("coordinate {value} out of range")))
}

fn offset(height: u32, delta: u32) -> Result<i32> {
    to_coord(height.saturating_add(delta))
}

fn clamp_coord(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
