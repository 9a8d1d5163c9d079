// The stage: a 480x360 logical canvas rendered at `scale` pixels per unit.
// Visual: camera feed stretched to the window, current costume in the middle.
// S snapshots a region of exactly what is rendered here.

use crate::costume::Costume;
use crate::error::{Error, Result};
use crate::region;
use crate::types::{FrameBuffer, LogicalRect, NativeSize, SourceSurface, STAGE_HEIGHT, STAGE_WIDTH};

const BACKDROP: u32 = 0xFFFF_FFFF;

pub struct Stage {
    scale: usize,
    frame: FrameBuffer,
    rendered: bool,
}

impl Stage {
    pub fn new(scale: usize) -> Self {
        let scale = scale.max(1);
        let w = STAGE_WIDTH as usize * scale;
        let h = STAGE_HEIGHT as usize * scale;
        Self { scale, frame: FrameBuffer::new(w, h, BACKDROP), rendered: false }
    }

    /// Window size in pixels.
    pub fn size(&self) -> (usize, usize) {
        (self.frame.width, self.frame.height)
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Draw one stage frame: video backdrop (or plain white), then the costume.
    pub fn render(&mut self, video: Option<&FrameBuffer>, costume: &Costume) {
        match video {
            Some(v) if !v.is_empty() => scale_nearest_into(v, &mut self.frame),
            _ => self.frame.pixels.fill(BACKDROP),
        }
        self.draw_costume(costume);
        self.rendered = true;
    }

    /// Alpha-composite the costume with its rotation centre on the stage centre.
    fn draw_costume(&mut self, costume: &Costume) {
        let img = &costume.image;
        if img.is_empty() {
            return;
        }
        // Stage pixels per costume pixel.
        let k = self.scale as f64 / costume.bitmap_resolution as f64;
        let left = self.frame.width as f64 / 2.0 - costume.rotation_center.0 * k;
        let top = self.frame.height as f64 / 2.0 - costume.rotation_center.1 * k;

        let x0 = left.floor().max(0.0) as usize;
        let y0 = top.floor().max(0.0) as usize;
        let x1 = ((left + img.width as f64 * k).ceil().max(0.0) as usize).min(self.frame.width);
        let y1 = ((top + img.height as f64 * k).ceil().max(0.0) as usize).min(self.frame.height);

        for sy in y0..y1 {
            let cy = ((sy as f64 + 0.5 - top) / k).floor() as i64;
            for sx in x0..x1 {
                let cx = ((sx as f64 + 0.5 - left) / k).floor() as i64;
                let Some(src) = img.get(cx, cy) else { continue };
                let idx = sy * self.frame.width + sx;
                self.frame.pixels[idx] = blend_over(src, self.frame.pixels[idx]);
            }
        }
    }

    /// Window pixel -> stage logical coordinates (centre origin, +Y up).
    pub fn window_to_logical(&self, px: f64, py: f64) -> (f64, f64) {
        let s = self.scale as f64;
        (px / s - STAGE_WIDTH / 2.0, STAGE_HEIGHT / 2.0 - py / s)
    }

    /// Stage logical coordinates -> window pixel.
    pub fn logical_to_window(&self, x: f64, y: f64) -> (f64, f64) {
        let s = self.scale as f64;
        ((x + STAGE_WIDTH / 2.0) * s, (STAGE_HEIGHT / 2.0 - y) * s)
    }

    /// Capture `region` of the last rendered frame as costume pixels.
    pub fn snapshot(&self, region: &LogicalRect, bitmap_resolution: u32) -> Result<FrameBuffer> {
        if !self.rendered {
            return Err(Error::SourceUnavailable("stage has not been rendered yet".into()));
        }
        let surface = SourceSurface::new(&self.frame, NativeSize::STAGE);
        region::capture_region(&surface, region, bitmap_resolution)
    }
}

/// Stretch `src` over the whole of `dst` (nearest neighbour).
fn scale_nearest_into(src: &FrameBuffer, dst: &mut FrameBuffer) {
    for y in 0..dst.height {
        let sy = y * src.height / dst.height;
        let src_row = sy * src.width;
        let dst_row = y * dst.width;
        for x in 0..dst.width {
            let sx = x * src.width / dst.width;
            dst.pixels[dst_row + x] = src.pixels[src_row + sx] | 0xFF00_0000;
        }
    }
}

/// Source-over blend onto an opaque background; result is opaque.
#[inline]
fn blend_over(src: u32, dst: u32) -> u32 {
    let a = (src >> 24) & 0xFF;
    if a == 0xFF {
        return src;
    }
    if a == 0 {
        return dst;
    }
    let inv = 255 - a;
    let mix = |shift: u32| {
        let s = (src >> shift) & 0xFF;
        let d = (dst >> shift) & 0xFF;
        ((s * a + d * inv + 127) / 255) << shift
    };
    0xFF00_0000 | mix(16) | mix(8) | mix(0)
}
