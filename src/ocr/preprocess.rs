use image::GrayImage;
use image::imageops::{self, FilterType};

/// Frames shorter than this are upscaled before recognition.
const MIN_OCR_HEIGHT: u32 = 1000;

/// Average brightness of a grayscale image (0.0 = black, 255.0 = white).
pub fn mean_brightness(img: &GrayImage) -> f32 {
    if img.width() == 0 || img.height() == 0 {
        return 0.0;
    }
    let total: u64 = img.pixels().map(|p| p[0] as u64).sum();
    (total as f64 / (img.width() as u64 * img.height() as u64) as f64) as f32
}

/// Makes text dark on a light background: pages with a mean brightness
/// below the midpoint are inverted.
pub fn normalize_polarity(mut img: GrayImage) -> GrayImage {
    if mean_brightness(&img) < 128.0 {
        imageops::invert(&mut img);
    }
    img
}

/// Doubles small frames so screen-sized glyphs reach a readable height.
pub fn upscale_small(img: GrayImage) -> GrayImage {
    if img.height() >= MIN_OCR_HEIGHT || img.height() == 0 {
        return img;
    }
    imageops::resize(&img, img.width() * 2, img.height() * 2, FilterType::CatmullRom)
}

/// Full preprocessing chain applied before handing a frame to Tesseract.
pub fn prepare_for_ocr(img: GrayImage) -> GrayImage {
    upscale_small(normalize_polarity(img))
}
