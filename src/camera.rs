// Opens a camera and converts its frames into stage-ready buffers.
// Visual expectation: each poll gives you the live camera image as
// 0xFFRRGGBB pixels, which the stage then scales to fill the window.

use crate::error::{Error, Result};
use crate::types::{pack_argb, FrameBuffer};
use crate::video::FrameSource;

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

// A small wrapper around nokhwa::Camera so the rest of the tool only sees FrameSource.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` at a target resolution (falls back if not exact).
    /// On success nothing is shown yet; we just hold an open stream.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self> {
        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );

        // Ask for RGB frames, closest to what was requested.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // This fails if no device exists; callers fall back to "no video".
        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The stream might choose a slightly different resolution.
        let actual = cam.resolution();
        log::info!(
            "camera {index} streaming at {}x{} (requested {width}x{height})",
            actual.width(),
            actual.height()
        );

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
        })
    }

    /// Report the actual resolution the camera is delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    /// Grab one frame (blocks until the device delivers it).
    fn poll_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if !self.cam.is_stream_open() {
            return Ok(None);
        }

        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::DecodeFailure(format!("Fetch frame: {e}")))?;

        // ImageBuffer<Rgb<u8>, Vec<u8>>; handles the raw formats for us.
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::DecodeFailure(format!("Decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for pixel in rgb_img.pixels() {
            out.push(pack_argb(pixel[0], pixel[1], pixel[2], 0xFF));
        }

        Ok(Some(FrameBuffer {
            width: w as usize,
            height: h as usize,
            pixels: out,
        }))
    }
}
