// Video side of capturing: anything that hands out frames, waiting for it to
// become ready, and cropping a region out of the latest frame.
// Visual: V grabs the selected part of the raw camera image (no costume on top).

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::region;
use crate::types::{FrameBuffer, LogicalRect, NativeSize, SourceSurface};

/// Something that produces video frames.
pub trait FrameSource {
    /// `Ok(None)` while the device is not ready yet.
    fn poll_frame(&mut self) -> Result<Option<FrameBuffer>>;
}

/// Poll `source` until it yields a frame or `timeout` runs out.
pub fn wait_for_frame(
    source: &mut dyn FrameSource,
    timeout: Duration,
    interval: Duration,
) -> Result<FrameBuffer> {
    let start = Instant::now();
    loop {
        if let Some(frame) = source.poll_frame()? {
            return Ok(frame);
        }
        if start.elapsed() >= timeout {
            return Err(Error::SourceUnavailable("timed out waiting for video frame".into()));
        }
        thread::sleep(interval);
    }
}

pub struct VideoCapture {
    source: Option<Box<dyn FrameSource>>,
    native: NativeSize,
    timeout: Duration,
    latest: Option<FrameBuffer>,
}

impl VideoCapture {
    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    pub fn new(source: Option<Box<dyn FrameSource>>, timeout: Duration) -> Self {
        Self { source, native: NativeSize::STAGE, timeout, latest: None }
    }

    pub fn has_device(&self) -> bool {
        self.source.is_some()
    }

    /// Pull a fresh frame if the device has one.
    /// Returns the most recent frame seen so far.
    pub fn refresh(&mut self) -> Result<Option<&FrameBuffer>> {
        if let Some(source) = self.source.as_mut() {
            if let Some(frame) = source.poll_frame()? {
                self.latest = Some(frame);
            }
        }
        Ok(self.latest.as_ref())
    }

    /// Forget the device (after it failed); captures then report unavailable.
    pub fn disconnect(&mut self) {
        self.source = None;
    }

    /// Crop `region` (video-centred logical units) out of the newest frame,
    /// waiting up to the configured timeout for the device to be ready.
    pub fn capture(&mut self, region: &LogicalRect, bitmap_resolution: u32) -> Result<FrameBuffer> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| Error::SourceUnavailable("no video device".into()))?;
        let frame = wait_for_frame(source.as_mut(), self.timeout, Self::POLL_INTERVAL)?;
        log::debug!("video frame {}x{} for capture", frame.width, frame.height);

        let out = region::capture_region(&SourceSurface::new(&frame, self.native), region, bitmap_resolution)?;
        self.latest = Some(frame);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Becomes ready after `warmup` polls, then always returns `frame`.
    struct Warming {
        warmup: usize,
        frame: FrameBuffer,
    }

    impl FrameSource for Warming {
        fn poll_frame(&mut self) -> Result<Option<FrameBuffer>> {
            if self.warmup > 0 {
                self.warmup -= 1;
                return Ok(None);
            }
            Ok(Some(self.frame.clone()))
        }
    }

    struct Broken;

    impl FrameSource for Broken {
        fn poll_frame(&mut self) -> Result<Option<FrameBuffer>> {
            Err(Error::DecodeFailure("Fetch frame: device gone".into()))
        }
    }

    fn camera_frame() -> FrameBuffer {
        FrameBuffer::new(640, 480, 0xFF20_4060)
    }

    #[test]
    fn waits_for_device_readiness() {
        let mut src = Warming { warmup: 3, frame: camera_frame() };
        let f = wait_for_frame(&mut src, Duration::from_secs(1), Duration::from_millis(1)).unwrap();
        assert_eq!((f.width, f.height), (640, 480));
    }

    #[test]
    fn gives_up_after_timeout() {
        let mut src = Warming { warmup: usize::MAX, frame: camera_frame() };
        let err = wait_for_frame(&mut src, Duration::from_millis(20), Duration::from_millis(2)).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn device_errors_are_not_retried() {
        let err = wait_for_frame(&mut Broken, Duration::from_secs(1), Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, Error::DecodeFailure(_)));
    }

    #[test]
    fn capture_without_device_is_unavailable() {
        let mut video = VideoCapture::new(None, Duration::from_millis(10));
        assert!(!video.has_device());
        let err = video.capture(&LogicalRect::full(NativeSize::STAGE), 2).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn capture_crops_camera_frame_at_bitmap_resolution() {
        let src = Warming { warmup: 1, frame: camera_frame() };
        let mut video = VideoCapture::new(Some(Box::new(src)), Duration::from_secs(1));
        let out = video.capture(&LogicalRect::new(0.0, 0.0, 120.0, 90.0), 2).unwrap();
        // 640x480 camera over a 480x360 native frame; output is 2x logical.
        assert_eq!((out.width, out.height), (240, 180));

        video.disconnect();
        let err = video.capture(&LogicalRect::full(NativeSize::STAGE), 2).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn refresh_keeps_last_frame_while_not_ready() {
        let src = Warming { warmup: 1, frame: camera_frame() };
        let mut video = VideoCapture::new(Some(Box::new(src)), Duration::from_secs(1));
        assert!(video.refresh().unwrap().is_none());
        assert!(video.refresh().unwrap().is_some());
    }
}
