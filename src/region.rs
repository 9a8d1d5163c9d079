// Region capture: maps a centre-origin logical rectangle onto the pixels of a
// source frame and copies them out.
// Visual: what you selected on the stage becomes a standalone image, at the
// source's own resolution (2x stage -> 2x pixels).

use crate::error::{Error, Result};
use crate::types::{FrameBuffer, LogicalRect, PixelRect, SourceSurface, STAGE_HEIGHT, STAGE_WIDTH, TRANSPARENT};
use image::imageops::{self, FilterType};

/// Compute the source rectangle (top-left origin, actual pixels) for `region`.
///
/// The logical space is centred on the frame with +Y pointing up, so the Y
/// axis is flipped on the way to raster coordinates.
pub fn source_rect(surface: &SourceSurface<'_>, region: &LogicalRect) -> Result<PixelRect> {
    let native = surface.native;
    // Checked before any division: a zero native size means there is no source.
    if !(native.width > 0.0 && native.height > 0.0) {
        return Err(Error::SourceUnavailable(format!(
            "native size {}x{}",
            native.width, native.height
        )));
    }
    if surface.frame.is_empty() {
        return Err(Error::SourceUnavailable("source frame has no pixels".into()));
    }
    validate(region)?;

    let scale_x = surface.frame.width as f64 / native.width;
    let scale_y = surface.frame.height as f64 / native.height;

    Ok(PixelRect {
        x: (native.width / 2.0 + region.center_x - region.width / 2.0) * scale_x,
        y: (native.height / 2.0 - (region.center_y + region.height / 2.0)) * scale_y,
        width: region.width * scale_x,
        height: region.height * scale_y,
    })
}

fn validate(region: &LogicalRect) -> Result<()> {
    if !(region.width.is_finite() && region.width > 0.0)
        || !(region.height.is_finite() && region.height > 0.0)
    {
        return Err(Error::InvalidRegion(format!(
            "size must be positive, got {}x{}",
            region.width, region.height
        )));
    }
    if !region.center_x.is_finite() || !region.center_y.is_finite() {
        return Err(Error::InvalidRegion(format!(
            "centre must be finite, got ({}, {})",
            region.center_x, region.center_y
        )));
    }
    Ok(())
}

/// Copy the pixels under `region` 1:1 into a fresh buffer.
///
/// No clamping: parts of the rectangle that fall outside the source come out
/// fully transparent.
pub fn crop(surface: &SourceSurface<'_>, region: &LogicalRect) -> Result<FrameBuffer> {
    let rect = source_rect(surface, region)?;
    let (out_w, out_h) = output_size(rect.width, rect.height)?;

    let x0 = rect.x.round() as i64;
    let y0 = rect.y.round() as i64;
    let src = surface.frame;

    let mut out = FrameBuffer::new(out_w, out_h, TRANSPARENT);
    for oy in 0..out_h {
        let sy = y0 + oy as i64;
        if sy < 0 || sy >= src.height as i64 {
            continue; // whole row outside -> stays transparent
        }
        let row_ofs = oy * out_w;
        for ox in 0..out_w {
            if let Some(p) = src.get(x0 + ox as i64, sy) {
                out.pixels[row_ofs + ox] = p;
            }
        }
    }
    Ok(out)
}

/// Largest raster a capture may allocate (4096 x 4096 pixels).
pub const MAX_CAPTURE_PIXELS: usize = 4096 * 4096;

/// Round a pixel size and check it is non-empty and within `MAX_CAPTURE_PIXELS`.
fn output_size(width: f64, height: f64) -> Result<(usize, usize)> {
    let (w, h) = (width.round(), height.round());
    if !(w >= 1.0 && h >= 1.0) {
        return Err(Error::InvalidRegion(format!("region rounds to {w}x{h} pixels")));
    }
    // `as` saturates, so oversized floats still fail the checked product below.
    let (w_px, h_px) = (w as usize, h as usize);
    match w_px.checked_mul(h_px) {
        Some(n) if n <= MAX_CAPTURE_PIXELS => Ok((w_px, h_px)),
        _ => Err(Error::InvalidRegion(format!(
            "{w}x{h} pixels exceeds the {MAX_CAPTURE_PIXELS} pixel limit"
        ))),
    }
}

/// Crop, then upscale to the costume resolution.
///
/// The output is `width * bitmap_resolution` pixels wide when measured
/// against a 480×360 frame; sources with a different native size are scaled
/// proportionally. When the crop already has that size it is returned as is.
pub fn capture_region(
    surface: &SourceSurface<'_>,
    region: &LogicalRect,
    bitmap_resolution: u32,
) -> Result<FrameBuffer> {
    if bitmap_resolution == 0 {
        return Err(Error::InvalidRegion("bitmap resolution must be at least 1".into()));
    }
    let cropped = crop(surface, region)?;

    let res = bitmap_resolution as f64;
    let (target_w, target_h) = output_size(
        region.width / surface.native.width * STAGE_WIDTH * res,
        region.height / surface.native.height * STAGE_HEIGHT * res,
    )?;
    if target_w == cropped.width && target_h == cropped.height {
        return Ok(cropped);
    }

    log::debug!(
        "resizing crop {}x{} -> {}x{}",
        cropped.width,
        cropped.height,
        target_w,
        target_h
    );
    // Both sides are at most MAX_CAPTURE_PIXELS, so they fit in u32.
    let resized = imageops::resize(
        &cropped.to_rgba_image(),
        target_w as u32,
        target_h as u32,
        FilterType::Triangle,
    );
    Ok(FrameBuffer::from_rgba_image(&resized))
}
