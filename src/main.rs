// What you SEE:
// • The stage: live camera stretched to the window, current costume in the middle.
// • Drag with Left Mouse to select a region (white box). C clears it.
// • S: snapshot the selected stage region (or the whole stage) into a new costume.
// • V: same, but from the raw camera frame (no costume on top).
// • X: delete the current costume. F / G: flip it horizontally / vertically.
// • Left / Right: browse costumes. E: export as PNG. P: print its data URL.
// • ESC quits. The title bar shows the current costume and the last result.

mod camera;
mod codec;
mod config;
mod costume;
mod draw;
mod error;
mod region;
mod stage;
mod types;
mod video;

use std::path::Path;

use camera::CameraCapture;
use config::Config;
use costume::{Costume, Flip, Sprite};
use draw::{draw_crosshair, draw_rect, Drawer};
use error::Result;
use log::{error, info, warn};
use minifb::Key;
use stage::Stage;
use types::{FrameBuffer, LogicalRect, NativeSize};
use video::{FrameSource, VideoCapture};

const APP_NAME: &str = "CostumeX";

#[derive(Clone, Copy, Debug)]
enum CaptureSource {
    Stage,
    Video,
}

struct App {
    config: Config,
    stage: Stage,
    video: VideoCapture,
    sprite: Sprite,
    /// Selection corners in stage logical units.
    drag_start: Option<(f64, f64)>,
    drag_end: Option<(f64, f64)>,
    status: String,
}

impl App {
    fn new(config: Config) -> Self {
        let source: Option<Box<dyn FrameSource>> = match config.camera {
            Some(cam) => match CameraCapture::new(cam.index, cam.width, cam.height) {
                Ok(c) => {
                    let (w, h) = c.resolution();
                    info!("video device ready ({w}x{h})");
                    Some(Box::new(c) as Box<dyn FrameSource>)
                }
                Err(e) => {
                    warn!("{e}; continuing without video");
                    None
                }
            },
            None => None,
        };

        let video = VideoCapture::new(source, config.video_timeout);
        let status = if video.has_device() { "ready".into() } else { "ready (no video)".into() };
        Self {
            stage: Stage::new(config.scale),
            video,
            sprite: load_sprite(&config),
            drag_start: None,
            drag_end: None,
            status,
            config,
        }
    }

    /// Selected rectangle, or the whole stage when nothing usable is selected.
    fn selected_region(&self) -> LogicalRect {
        match (self.drag_start, self.drag_end) {
            (Some(a), Some(b)) => {
                let r = LogicalRect::from_corners(a, b);
                if r.width >= 1.0 && r.height >= 1.0 {
                    return r;
                }
                LogicalRect::full(NativeSize::STAGE)
            }
            _ => LogicalRect::full(NativeSize::STAGE),
        }
    }

    /// Capture the selected region and insert it right after the current costume.
    fn capture(&mut self, source: CaptureSource) -> Result<()> {
        let region = self.selected_region().normalized(NativeSize::STAGE);
        let res = self.config.bitmap_resolution;
        let (image, name) = match source {
            CaptureSource::Stage => (self.stage.snapshot(&region, res)?, "snapshot"),
            CaptureSource::Video => (self.video.capture(&region, res)?, "video"),
        };
        info!(
            "{source:?} capture of {}x{} at ({}, {}) -> {}x{} px",
            region.width, region.height, region.center_x, region.center_y, image.width, image.height
        );

        let at = self.sprite.current_number() as f64 + 1.0;
        let pos = self.sprite.insert(Costume::new(name, image, res), Some(at));
        self.sprite.select(pos);
        self.status = format!("added '{}'", self.sprite.current().name);
        Ok(())
    }

    fn delete_current(&mut self) -> Result<()> {
        let removed = self.sprite.delete_at(self.sprite.current_number())?;
        self.status = format!("deleted '{}'", removed.name);
        Ok(())
    }

    fn flip_current(&mut self, flip: Flip) {
        let costume = self.sprite.current_mut();
        costume.flip(flip);
        info!("flipped '{}' {:?}", costume.name, flip);
        self.status = format!("flipped {flip:?}");
    }

    fn export_current(&mut self) -> Result<()> {
        let dir = &self.config.out_dir;
        std::fs::create_dir_all(dir)?;
        let costume = self.sprite.current();
        let path = dir.join(format!("{}.png", costume.name));
        codec::save_png(&costume.image, &path)?;
        info!("exported '{}' to {}", costume.name, path.display());
        self.status = format!("exported {}", path.display());
        Ok(())
    }

    fn print_current(&mut self) -> Result<()> {
        let url = codec::encode_data_url(&self.sprite.current().image)?;
        println!("{url}");
        self.status = format!("printed data URL ({} bytes)", url.len());
        Ok(())
    }

    /// Route a result into the status line instead of ending the loop.
    fn report(&mut self, action: &str, result: Result<()>) {
        if let Err(e) = result {
            warn!("{action} failed: {e}");
            self.status = format!("{action} failed: {e}");
        }
    }

    fn title(&self) -> String {
        let c = self.sprite.current();
        let (w, h) = c.size();
        format!(
            "{APP_NAME} | {}/{} '{}' {}x{} | {}",
            self.sprite.current_number(),
            self.sprite.len(),
            c.name,
            w,
            h,
            self.status
        )
    }
}

/// Build the sprite from `--costume` sources; falls back to the default costume.
fn load_sprite(config: &Config) -> Sprite {
    let res = config.bitmap_resolution;
    let mut loaded = config.costumes.iter().filter_map(|src| match codec::load_image(src) {
        Ok(img) => Some(Costume::new(costume_name(src), img, res)),
        Err(e) => {
            error!("skipping costume: {e}");
            None
        }
    });

    let mut sprite = Sprite::new(loaded.next().unwrap_or_else(|| costume::default_costume(res)));
    for c in loaded {
        sprite.insert(c, None);
    }
    sprite
}

fn costume_name(source: &str) -> String {
    if source.trim_start().starts_with("data:") {
        return "costume".into();
    }
    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "costume".into())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_args();
    info!("{APP_NAME} starting: {config:?}");

    let mut app = App::new(config);
    let (w, h) = app.stage.size();
    let mut drawer = Drawer::new(APP_NAME, w, h)?;

    // Reusable screen buffer: stage + overlays (overlays never end up in snapshots).
    let mut screen = FrameBuffer::new(w, h, 0);
    let mut last_title = String::new();
    let mut was_down = false;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Fresh camera frame, if the device has one. */
        let refreshed = app.video.refresh().map(|f| f.cloned());
        let video_frame = match refreshed {
            Ok(frame) => frame,
            Err(e) => {
                error!("video device lost: {e}");
                app.video.disconnect();
                app.status = "video device lost".into();
                None
            }
        };

        /* 2) Render the stage (what S captures). */
        app.stage.render(video_frame.as_ref(), app.sprite.current());

        /* 3) Selection drag. */
        let down = drawer.left_mouse_down();
        if let Some((mx, my)) = drawer.mouse_pos() {
            let p = app.stage.window_to_logical(mx as f64, my as f64);
            if down && !was_down {
                app.drag_start = Some(p);
            }
            if down {
                app.drag_end = Some(p);
            }
        }
        was_down = down;

        /* 4) Keys. */
        if drawer.pressed_once(Key::C) {
            app.drag_start = None;
            app.drag_end = None;
        }
        if drawer.pressed_once(Key::S) {
            let r = app.capture(CaptureSource::Stage);
            app.report("snapshot", r);
        }
        if drawer.pressed_once(Key::V) {
            let r = app.capture(CaptureSource::Video);
            app.report("video capture", r);
        }
        if drawer.pressed_once(Key::X) {
            let r = app.delete_current();
            app.report("delete", r);
        }
        if drawer.pressed_once(Key::F) {
            app.flip_current(Flip::Horizontal);
        }
        if drawer.pressed_once(Key::G) {
            app.flip_current(Flip::Vertical);
        }
        if drawer.pressed_once(Key::Right) {
            app.sprite.select_next();
        }
        if drawer.pressed_once(Key::Left) {
            app.sprite.select_previous();
        }
        if drawer.pressed_once(Key::E) {
            let r = app.export_current();
            app.report("export", r);
        }
        if drawer.pressed_once(Key::P) {
            let r = app.print_current();
            app.report("data URL", r);
        }

        /* 5) Overlays on a copy of the stage. */
        screen.pixels.copy_from_slice(&app.stage.frame().pixels);
        if let (Some(a), Some(b)) = (app.drag_start, app.drag_end) {
            let to_px = |p: (f64, f64)| {
                let (x, y) = app.stage.logical_to_window(p.0, p.1);
                (x as i32, y as i32)
            };
            draw_rect(&mut screen, to_px(a), to_px(b), 0xFF_FF_FF_FF);
        }
        if let Some((mx, my)) = drawer.mouse_pos() {
            draw_crosshair(&mut screen, mx as i32, my as i32, 12, 0xFF_FF_CC_33);
        }

        /* 6) Present + status line. */
        drawer.present(&screen)?;
        let title = app.title();
        if title != last_title {
            drawer.set_title(&title);
            last_title = title;
        }
    }

    let names: Vec<&str> = app.sprite.costumes().iter().map(|c| c.name.as_str()).collect();
    info!("{APP_NAME} closing with {} costume(s): {}", app.sprite.len(), names.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app() -> App {
        let config = Config {
            camera: None,
            scale: 1,
            bitmap_resolution: 2,
            video_timeout: Duration::from_millis(10),
            out_dir: std::env::temp_dir(),
            costumes: Vec::new(),
        };
        App::new(config)
    }

    #[test]
    fn snapshot_inserts_after_current_and_selects_it() {
        let mut app = app();
        app.stage.render(None, app.sprite.current());
        app.drag_start = Some((-10.0, 10.0));
        app.drag_end = Some((10.0, -5.0));
        app.capture(CaptureSource::Stage).unwrap();

        assert_eq!(app.sprite.len(), 2);
        assert_eq!(app.sprite.current_number(), 2);
        let c = app.sprite.current();
        assert_eq!(c.name, "snapshot");
        assert_eq!(c.size(), (20.0, 15.0));
    }

    #[test]
    fn tiny_selection_means_whole_stage() {
        let mut app = app();
        app.drag_start = Some((5.0, 5.0));
        app.drag_end = Some((5.2, 5.0));
        assert_eq!(app.selected_region(), LogicalRect::full(NativeSize::STAGE));
    }

    #[test]
    fn failures_go_to_status_not_panic() {
        let mut app = app();
        let r = app.capture(CaptureSource::Video);
        app.report("video capture", r);
        assert!(app.status.starts_with("video capture failed: Source unavailable"));

        let r = app.delete_current();
        app.report("delete", r);
        assert!(app.status.contains("last costume"));
        assert_eq!(app.sprite.len(), 1);
    }

    #[test]
    fn delete_removes_current_even_when_a_name_looks_like_its_number() {
        let mut app = app();
        app.sprite = Sprite::new(Costume::new("2", FrameBuffer::new(2, 2, 0), 2));
        app.sprite.insert(Costume::new("a", FrameBuffer::new(2, 2, 0), 2), None);
        app.sprite.select(2);

        app.delete_current().unwrap();
        let left: Vec<&str> = app.sprite.costumes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(left, ["2"]);
        assert_eq!(app.status, "deleted 'a'");
    }

    #[test]
    fn export_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        app.config.out_dir = dir.path().join("out");
        app.export_current().unwrap();
        let img = codec::load_image(dir.path().join("out/costume1.png").to_str().unwrap()).unwrap();
        assert_eq!(img, app.sprite.current().image);
    }

    #[test]
    fn costume_names_from_sources() {
        assert_eq!(costume_name("/tmp/cat.png"), "cat");
        assert_eq!(costume_name("data:image/png;base64,AAAA"), "costume");
    }
}
