// Window + overlay drawing.
// Visual effects provided here:
// 1) A window that shows the rendered stage.
// 2) A crosshair that follows your mouse.
// 3) The selection rectangle you drag out with the left button.

use crate::error::{Error, Result};
use crate::types::FrameBuffer;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a window sized to the stage.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// True only on the frame the key goes down.
    pub fn pressed_once(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    /// Current mouse position in window pixel coordinates (clamped to the window).
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| (x.max(0.0), y.max(0.0)))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    /// Status line lives in the title bar.
    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

/* ---------- Overlay drawing: clipped horizontal / vertical spans ---------- */

/// Clip the inclusive range [a, b] (any order) to [0, len).
fn clip_span(a: i32, b: i32, len: usize) -> Option<(usize, usize)> {
    let lo = a.min(b).max(0) as i64;
    let hi = (a.max(b) as i64).min(len as i64 - 1);
    (lo <= hi).then(|| (lo as usize, hi as usize))
}

/// Row `y` from x0 to x1 inclusive; the parts outside the buffer are dropped.
fn hspan(fb: &mut FrameBuffer, y: i32, x0: i32, x1: i32, color: u32) {
    if y < 0 || y as usize >= fb.height {
        return;
    }
    if let Some((lo, hi)) = clip_span(x0, x1, fb.width) {
        let row = y as usize * fb.width;
        fb.pixels[row + lo..=row + hi].fill(color);
    }
}

/// Column `x` from y0 to y1 inclusive, clipped like `hspan`.
fn vspan(fb: &mut FrameBuffer, x: i32, y0: i32, y1: i32, color: u32) {
    if x < 0 || x as usize >= fb.width {
        return;
    }
    if let Some((lo, hi)) = clip_span(y0, y1, fb.height) {
        for y in lo..=hi {
            fb.pixels[y * fb.width + x as usize] = color;
        }
    }
}

/// Small "+" centred at (cx,cy), with a one-pixel gap ring around the centre dot.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    hspan(fb, cy, cx - size, cx - 2, color);
    hspan(fb, cy, cx + 2, cx + size, color);
    vspan(fb, cx, cy - size, cy - 2, color);
    vspan(fb, cx, cy + 2, cy + size, color);
    hspan(fb, cy, cx, cx, color);
}

/// Outline of the rectangle spanning two corners (any order), inclusive.
/// Visual: the box around what S / V will capture.
pub fn draw_rect(fb: &mut FrameBuffer, a: (i32, i32), b: (i32, i32), color: u32) {
    hspan(fb, a.1, a.0, b.0, color);
    hspan(fb, b.1, a.0, b.0, color);
    vspan(fb, a.0, a.1, b.1, color);
    vspan(fb, b.0, a.1, b.1, color);
}
