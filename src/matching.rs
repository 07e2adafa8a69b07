//! Edge-based template matching.
//!
//! Both images are reduced to Canny edge maps before matching, which makes the
//! search insensitive to the colour shift the CAPTCHA applies to the gap:
//! 1. **Grayscale**: luminance `0.299*R + 0.587*G + 0.114*B`
//! 2. **Edges**: Canny with fixed hysteresis thresholds
//! 3. **Correlation**: zero-mean normalized cross-correlation of the tile
//!    edge map slid over the background edge map

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::template_matching::{find_extremes, Extremes};

use crate::error::{Error, Result};

/// Default low hysteresis threshold for Canny edge detection.
pub const DEFAULT_CANNY_LOW: f32 = 50.0;
/// Default high hysteresis threshold for Canny edge detection.
pub const DEFAULT_CANNY_HIGH: f32 = 150.0;

/// Denominators below this are treated as zero variance.
const MIN_DENOMINATOR: f64 = 1e-10;

/// Correlation scores, one per valid template position.
pub type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Best template position on a score map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Left edge of the best match in background coordinates.
    pub x: u32,
    /// Top edge of the best match in background coordinates.
    pub y: u32,
    /// Correlation score at that position, in `[-1, 1]`.
    pub score: f32,
}

/// Convert an RGB image to 8-bit grayscale.
///
/// Uses luminance formula: `0.299*R + 0.587*G + 0.114*B`.
#[must_use]
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let px = img.get_pixel(x, y);
        let lum = 0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = (lum + 0.5).clamp(0.0, 255.0) as u8;
        Luma([value])
    })
}

/// Canny edge map of a grayscale image.
///
/// Edge pixels are 255, everything else 0. `imageproc`'s Canny smooths with a
/// Gaussian (sigma 1.4) and thresholds the L2 Sobel magnitude, whereas OpenCV's
/// `Canny` applies no blur and uses the L1 magnitude by default. The same
/// `low`/`high` values therefore keep a somewhat different set of edges than an
/// OpenCV pipeline calibrated with them.
#[must_use]
pub fn edge_map(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    imageproc::edges::canny(gray, low, high)
}

/// Summed-area tables of pixel values and squared pixel values.
///
/// Both tables are `(width + 1) * (height + 1)` with a zero first row and
/// column, so any window sum is four lookups.
struct IntegralTables {
    stride: usize,
    sum: Vec<f64>,
    sq_sum: Vec<f64>,
}

impl IntegralTables {
    fn new(img: &GrayImage) -> Self {
        let w = img.width() as usize;
        let h = img.height() as usize;
        let stride = w + 1;
        let mut sum = vec![0.0_f64; stride * (h + 1)];
        let mut sq_sum = vec![0.0_f64; stride * (h + 1)];
        let raw = img.as_raw();

        for y in 0..h {
            let mut row = 0.0_f64;
            let mut row_sq = 0.0_f64;
            for x in 0..w {
                let v = f64::from(raw[y * w + x]);
                row += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row;
                sq_sum[(y + 1) * stride + x + 1] = sq_sum[y * stride + x + 1] + row_sq;
            }
        }

        Self {
            stride,
            sum,
            sq_sum,
        }
    }

    /// Sum and squared sum over the `w` x `h` window with top-left `(x, y)`.
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let (a, b, c, d) = (y * s + x, y * s + x + w, (y + h) * s + x, (y + h) * s + x + w);
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sq_sum[d] - self.sq_sum[b] - self.sq_sum[c] + self.sq_sum[a],
        )
    }
}

/// Zero-mean normalized cross-correlation of `template` at every position
/// inside `image`.
///
/// `score = sum((I - mean_I) * (T - mean_T)) / sqrt(sum((I - mean_I)^2) * sum((T - mean_T)^2))`
///
/// The map is `(W - w + 1) x (H - h + 1)`. Windows with zero variance score 0.
///
/// # Errors
///
/// - [`Error::EmptyImage`] if either input has zero size.
/// - [`Error::TileTooLarge`] if the template does not fit inside the image.
/// - [`Error::FlatEdgeMap`] if either input is uniform.
pub fn correlation_map(image: &GrayImage, template: &GrayImage) -> Result<ScoreMap> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();

    if iw == 0 || ih == 0 {
        return Err(Error::EmptyImage { what: "background" });
    }
    if tw == 0 || th == 0 {
        return Err(Error::EmptyImage { what: "tile" });
    }
    if tw > iw || th > ih {
        return Err(Error::TileTooLarge {
            tile: (tw, th),
            background: (iw, ih),
        });
    }

    let n = f64::from(tw) * f64::from(th);
    let t_sum: f64 = template.as_raw().iter().map(|&v| f64::from(v)).sum();
    let t_sq_sum: f64 = template
        .as_raw()
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum();
    let t_mean = t_sum / n;
    let t_var = t_sq_sum - t_sum * t_mean;
    if t_var < MIN_DENOMINATOR {
        return Err(Error::FlatEdgeMap { what: "tile" });
    }

    // sum((T - mean_T) * I) == sum(T * I) - mean_T * sum(I); only non-zero
    // template pixels contribute to the first term.
    let taps: Vec<(usize, usize, f64)> = template
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] != 0)
        .map(|(x, y, p)| (x as usize, y as usize, f64::from(p[0])))
        .collect();

    let tables = IntegralTables::new(image);
    let (i_sum, i_sq_sum) = tables.window(0, 0, iw as usize, ih as usize);
    let i_n = f64::from(iw) * f64::from(ih);
    if i_sq_sum - i_sum * i_sum / i_n < MIN_DENOMINATOR {
        return Err(Error::FlatEdgeMap { what: "background" });
    }

    let raw = image.as_raw();
    let stride = iw as usize;
    let (tw, th) = (tw as usize, th as usize);

    let out_w = iw - template.width() + 1;
    let out_h = ih - template.height() + 1;

    let map = ScoreMap::from_fn(out_w, out_h, |ox, oy| {
        let (x, y) = (ox as usize, oy as usize);
        let (w_sum, w_sq_sum) = tables.window(x, y, tw, th);
        let i_var = w_sq_sum - w_sum * w_sum / n;

        let denom = (t_var * i_var.max(0.0)).sqrt();
        if denom < MIN_DENOMINATOR {
            return Luma([0.0]);
        }

        let cross: f64 = taps
            .iter()
            .map(|&(tx, ty, tv)| tv * f64::from(raw[(y + ty) * stride + x + tx]))
            .sum();
        let numerator = cross - t_mean * w_sum;

        #[allow(clippy::cast_possible_truncation)]
        let score = (numerator / denom).clamp(-1.0, 1.0) as f32;
        Luma([score])
    });

    Ok(map)
}

/// Position of the highest score; ties resolve to the first in row-major order.
#[must_use]
pub fn best_match(scores: &ScoreMap) -> MatchResult {
    let Extremes {
        max_value,
        max_value_location,
        ..
    } = find_extremes(scores);

    MatchResult {
        x: max_value_location.0,
        y: max_value_location.1,
        score: max_value,
    }
}

/// Locate `template_edges` inside `image_edges`.
///
/// # Errors
///
/// Propagates the errors of [`correlation_map`].
pub fn match_edges(image_edges: &GrayImage, template_edges: &GrayImage) -> Result<MatchResult> {
    let scores = correlation_map(image_edges, template_edges)?;
    Ok(best_match(&scores))
}
