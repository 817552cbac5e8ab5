//! Template matching against captured frames.
//!
//! Similarity is zero-mean normalized cross-correlation: 1.0 for an exact
//! copy, around 0.0 for unrelated content, independent of brightness and
//! contrast. The raw correlation comes from `imageproc`; window means and
//! variances come from summed-area tables over the searched image.

use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::template_matching::{MatchTemplateMethod, match_template};

use super::template::Template;
use crate::capture::Frame;

/// Variance below which a window or template is treated as flat.
const FLAT_VARIANCE: f64 = 1e-3;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MatchError {
    #[error("confidence threshold {0} is outside 0.0..=1.0")]
    InvalidThreshold(f32),
    #[error("search scale {0} must be greater than 0.0 and at most 1.0")]
    InvalidScale(f32),
}

/// Where a template was found, in full-resolution frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Similarity in 0.0..=1.0
    pub score: f32,
}

impl MatchRegion {
    /// Center of the region, the point a click should land on.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    fn overlaps(&self, other: &MatchRegion) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Per-pixel sums and squared sums with a zero row and column prepended.
struct SummedArea {
    stride: usize,
    sums: Vec<f64>,
    squares: Vec<f64>,
}

impl SummedArea {
    fn new(img: &GrayImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let stride = w + 1;
        let mut sums = vec![0.0; stride * (h + 1)];
        let mut squares = vec![0.0; stride * (h + 1)];

        for y in 0..h {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = img.get_pixel(x as u32, y as u32)[0] as f64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sums[idx] = sums[y * stride + x + 1] + row_sum;
                squares[idx] = squares[y * stride + x + 1] + row_sq;
            }
        }

        Self {
            stride,
            sums,
            squares,
        }
    }

    /// Returns (sum, sum of squares) over the `w`x`h` window at (x, y).
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let (a, b, c, d) = (y * s + x, y * s + x + w, (y + h) * s + x, (y + h) * s + x + w);
        (
            self.sums[d] - self.sums[b] - self.sums[c] + self.sums[a],
            self.squares[d] - self.squares[b] - self.squares[c] + self.squares[a],
        )
    }
}

/// A frame converted once for any number of template searches.
pub struct SearchImage {
    gray: GrayImage,
    area: SummedArea,
    scale: f32,
}

/// Finds templates in frames at a fixed search scale.
#[derive(Debug, Clone, Copy)]
pub struct TemplateMatcher {
    scale: f32,
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

fn check_threshold(threshold: f32) -> Result<(), MatchError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold(threshold))
    }
}

fn downscale(img: &GrayImage, scale: f32) -> GrayImage {
    if scale >= 1.0 {
        return img.clone();
    }
    let w = ((img.width() as f32 * scale).round() as u32).max(1);
    let h = ((img.height() as f32 * scale).round() as u32).max(1);
    imageops::resize(img, w, h, FilterType::Triangle)
}

impl TemplateMatcher {
    /// `scale` in (0, 1]: frame and template are shrunk by it before searching.
    pub fn new(scale: f32) -> Result<Self, MatchError> {
        if scale > 0.0 && scale <= 1.0 {
            Ok(Self { scale })
        } else {
            Err(MatchError::InvalidScale(scale))
        }
    }

    /// Converts a frame for searching.
    pub fn prepare(&self, frame: &Frame) -> SearchImage {
        let gray = downscale(&frame.to_luma(), self.scale);
        let area = SummedArea::new(&gray);
        SearchImage {
            gray,
            area,
            scale: self.scale,
        }
    }

    /// Every region scoring at least `threshold`, best first.
    ///
    /// Overlapping hits are collapsed onto the best one, so one on-screen
    /// object yields one region.
    pub fn locate_all(
        &self,
        frame: &Frame,
        template: &Template,
        threshold: f32,
    ) -> Result<Vec<MatchRegion>, MatchError> {
        self.locate_all_in(&self.prepare(frame), template, threshold)
    }

    /// The best region scoring at least `threshold`, if any.
    pub fn locate(
        &self,
        frame: &Frame,
        template: &Template,
        threshold: f32,
    ) -> Result<Option<MatchRegion>, MatchError> {
        self.locate_in(&self.prepare(frame), template, threshold)
    }

    pub fn locate_in(
        &self,
        search: &SearchImage,
        template: &Template,
        threshold: f32,
    ) -> Result<Option<MatchRegion>, MatchError> {
        Ok(self
            .locate_all_in(search, template, threshold)?
            .into_iter()
            .next())
    }

    pub fn locate_all_in(
        &self,
        search: &SearchImage,
        template: &Template,
        threshold: f32,
    ) -> Result<Vec<MatchRegion>, MatchError> {
        check_threshold(threshold)?;

        let tpl = downscale(template.image(), search.scale);
        let (tw, th) = tpl.dimensions();
        let (iw, ih) = search.gray.dimensions();
        if tw > iw || th > ih {
            return Ok(Vec::new());
        }

        let n = (tw * th) as f64;
        let tpl_sum: f64 = tpl.pixels().map(|p| p[0] as f64).sum();
        let tpl_mean = tpl_sum / n;
        let tpl_var: f64 = tpl
            .pixels()
            .map(|p| {
                let d = p[0] as f64 - tpl_mean;
                d * d
            })
            .sum();
        if tpl_var < FLAT_VARIANCE * n {
            tracing::debug!("Template {} has no contrast, it cannot match", template.id());
            return Ok(Vec::new());
        }

        let correlation = match_template(&search.gray, &tpl, MatchTemplateMethod::CrossCorrelation);

        let mut candidates = Vec::new();
        for (x, y, value) in correlation.enumerate_pixels() {
            let (sum, sq) = search
                .area
                .window(x as usize, y as usize, tw as usize, th as usize);
            let window_var = sq - sum * sum / n;
            if window_var < FLAT_VARIANCE * n {
                continue;
            }

            let numerator = value[0] as f64 - tpl_mean * sum;
            let score = (numerator / (window_var * tpl_var).sqrt()).clamp(-1.0, 1.0) as f32;
            if score.is_finite() && score >= threshold {
                candidates.push((x, y, score));
            }
        }

        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let (full_w, full_h) = template.dimensions();
        let mut regions: Vec<MatchRegion> = Vec::new();
        for (x, y, score) in candidates {
            let region = MatchRegion {
                x: (x as f32 / search.scale).round() as u32,
                y: (y as f32 / search.scale).round() as u32,
                width: full_w,
                height: full_h,
                score,
            };
            if !regions.iter().any(|kept| kept.overlaps(&region)) {
                regions.push(region);
            }
        }

        Ok(regions)
    }
}
