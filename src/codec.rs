// Image in/out for costumes: PNG data URLs (what the "costume data" and
// "add image as costume" operations speak) and plain files on disk.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;

use crate::error::{Error, Result};
use crate::types::FrameBuffer;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode a frame as `data:image/png;base64,...`.
pub fn encode_data_url(frame: &FrameBuffer) -> Result<String> {
    let png = encode_png(frame)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Decode any base64 `data:image/...` URL the `image` crate understands.
/// Surrounding whitespace is ignored.
pub fn decode_data_url(url: &str) -> Result<FrameBuffer> {
    let url = url.trim();
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::DecodeFailure("not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::DecodeFailure("data URL has no payload".into()))?;
    if !meta.ends_with(";base64") {
        return Err(Error::DecodeFailure(format!("unsupported data URL encoding: {meta}")));
    }
    if !meta.starts_with("image/") {
        return Err(Error::DecodeFailure(format!("not an image: {meta}")));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::DecodeFailure(format!("base64: {e}")))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::DecodeFailure(format!("image data: {e}")))?;
    Ok(FrameBuffer::from_rgba_image(&img.to_rgba8()))
}

/// Load an image from a data URL or a file path.
pub fn load_image(source: &str) -> Result<FrameBuffer> {
    if source.trim_start().starts_with("data:") {
        return decode_data_url(source);
    }
    let img = image::open(source).map_err(|e| Error::DecodeFailure(format!("{source}: {e}")))?;
    Ok(FrameBuffer::from_rgba_image(&img.to_rgba8()))
}

/// Write a frame to `path` as PNG.
pub fn save_png(frame: &FrameBuffer, path: &Path) -> Result<()> {
    let png = encode_png(frame)?;
    std::fs::write(path, png)?;
    Ok(())
}

fn encode_png(frame: &FrameBuffer) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    frame
        .to_rgba_image()
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::DecodeFailure(format!("PNG encode: {e}")))?;
    Ok(out.into_inner())
}
