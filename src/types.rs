// Core types shared by the stage, the camera and the region crop.

use image::{Rgba, RgbaImage};

/// Logical stage size every capture is expressed against (Scratch stage).
pub const STAGE_WIDTH: f64 = 480.0;
pub const STAGE_HEIGHT: f64 = 360.0;

/// Fully transparent pixel; used for anything read outside a source frame.
pub const TRANSPARENT: u32 = 0x0000_0000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // pixel columns
    pub height: usize,     // pixel rows
    pub pixels: Vec<u32>,  // each entry is 0xAARRGGBB (minifb ignores the AA byte)
}

impl FrameBuffer {
    /// A buffer of `width × height` pixels, all set to `fill`.
    pub fn new(width: usize, height: usize, fill: u32) -> Self {
        Self { width, height, pixels: vec![fill; width * height] }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Pixel at (x,y), or `None` outside the buffer.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<u32> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Convert into an `image` RGBA buffer (for resize / flip / PNG encode).
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let p = self.pixels[y as usize * self.width + x as usize];
            Rgba([
                ((p >> 16) & 0xFF) as u8,
                ((p >> 8) & 0xFF) as u8,
                (p & 0xFF) as u8,
                ((p >> 24) & 0xFF) as u8,
            ])
        })
    }

    /// Pack an `image` RGBA buffer back into 0xAARRGGBB pixels.
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        let mut pixels = Vec::with_capacity((w as usize) * (h as usize));
        for px in img.pixels() {
            let [r, g, b, a] = px.0;
            pixels.push(pack_argb(r, g, b, a));
        }
        Self { width: w as usize, height: h as usize, pixels }
    }
}

#[inline]
pub fn pack_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// A region in a centre-origin coordinate space (+Y is up), measured in
/// logical units independent of the pixel density of the source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogicalRect {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl LogicalRect {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self { center_x, center_y, width, height }
    }

    /// The whole frame of the given native size.
    pub fn full(native: NativeSize) -> Self {
        Self::new(0.0, 0.0, native.width, native.height)
    }

    /// Caller-side normalization: missing / non-positive sizes become the
    /// full-frame default. Centre coordinates are left untouched.
    pub fn normalized(self, default: NativeSize) -> Self {
        let fix = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        Self {
            width: fix(self.width, default.width),
            height: fix(self.height, default.height),
            ..self
        }
    }

    /// Rectangle spanning two corner points (any order), in logical units.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self::new((x0 + x1) / 2.0, (y0 + y1) / 2.0, x1 - x0, y1 - y0)
    }
}

/// Nominal (unscaled) size of a frame in logical units, e.g. 480×360.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NativeSize {
    pub width: f64,
    pub height: f64,
}

impl NativeSize {
    pub const STAGE: NativeSize = NativeSize { width: STAGE_WIDTH, height: STAGE_HEIGHT };
}

/// A raster plus the logical size it represents. The actual size is the
/// frame's pixel size, which may be any multiple of the native size.
#[derive(Clone, Copy, Debug)]
pub struct SourceSurface<'a> {
    pub frame: &'a FrameBuffer,
    pub native: NativeSize,
}

impl<'a> SourceSurface<'a> {
    pub fn new(frame: &'a FrameBuffer, native: NativeSize) -> Self {
        Self { frame, native }
    }
}

/// Top-left-origin source rectangle in actual pixels (not yet rounded).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_conversion_keeps_alpha() {
        let fb = FrameBuffer {
            width: 2,
            height: 1,
            pixels: vec![0x80_11_22_33, TRANSPARENT],
        };
        let img = fb.to_rgba_image();
        assert_eq!(img.get_pixel(0, 0).0, [0x11, 0x22, 0x33, 0x80]);
        assert_eq!(FrameBuffer::from_rgba_image(&img), fb);
    }

    #[test]
    fn normalized_replaces_non_positive_sizes() {
        let r = LogicalRect::new(10.0, -5.0, 0.0, -3.0).normalized(NativeSize::STAGE);
        assert_eq!(r, LogicalRect::new(10.0, -5.0, 480.0, 360.0));

        let r = LogicalRect::new(0.0, 0.0, f64::NAN, 20.0).normalized(NativeSize::STAGE);
        assert_eq!(r.width, 480.0);
        assert_eq!(r.height, 20.0);
    }

    #[test]
    fn from_corners_orders_points() {
        let r = LogicalRect::from_corners((10.0, -10.0), (-30.0, 50.0));
        assert_eq!(r, LogicalRect::new(-10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn get_outside_is_none() {
        let fb = FrameBuffer::new(2, 2, 1);
        assert_eq!(fb.get(1, 1), Some(1));
        assert_eq!(fb.get(-1, 0), None);
        assert_eq!(fb.get(2, 0), None);
    }
}
