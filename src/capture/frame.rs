use anyhow::Result;
use chrono::{DateTime, Local};
use image::{GrayImage, RgbaImage};

/// One capture of the screen.
///
/// Frames are never reused across requests: every `FrameSource::capture`
/// call produces a new one, since the page can change between calls.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
    /// Screen-space position of the frame's top-left pixel
    origin: (i32, i32),
    captured_at: DateTime<Local>,
}

impl Frame {
    /// Creates a frame whose top-left pixel sits at the screen origin.
    pub fn new(image: RgbaImage) -> Self {
        Self::with_origin(image, (0, 0))
    }

    pub fn with_origin(image: RgbaImage, origin: (i32, i32)) -> Self {
        Self {
            image,
            origin,
            captured_at: Local::now(),
        }
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Grayscale copy used for template matching and OCR.
    pub fn to_luma(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }

    /// Converts a pixel position inside the frame to absolute screen coordinates.
    pub fn to_screen(&self, x: u32, y: u32) -> (i32, i32) {
        (self.origin.0 + x as i32, self.origin.1 + y as i32)
    }
}

/// Produces the current frame on demand.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame>;
}
