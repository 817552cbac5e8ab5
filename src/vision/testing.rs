//! Synthetic images for matcher, classifier and watcher tests.

use image::{DynamicImage, GrayImage, Luma};

use crate::capture::Frame;

/// Deterministic high-contrast noise; different seeds give unrelated images.
pub fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    GrayImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        Luma([(state >> 56) as u8])
    })
}

/// A noise frame with each `(image, x, y)` pasted on top.
pub fn frame_with(width: u32, height: u32, seed: u64, patches: &[(&GrayImage, i64, i64)]) -> Frame {
    let mut canvas = noise(width, height, seed);
    for (patch, x, y) in patches {
        image::imageops::replace(&mut canvas, *patch, *x, *y);
    }
    Frame::new(DynamicImage::ImageLuma8(canvas).to_rgba8())
}
