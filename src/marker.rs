//! Debug overlay: a vertical line at the detected gap position.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::error::{Error, Result};

/// Suffix appended to the background stem when no output path is given.
pub const RESULT_SUFFIX: &str = "_result.png";

/// Appearance of the marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    /// Line colour.
    pub color: Rgba<u8>,
    /// Line width in pixels, extending to the right of `x`.
    pub width: u32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: Rgba([255, 0, 0, 255]),
            width: 2,
        }
    }
}

/// Draw a full-height vertical line at column `x`.
///
/// Columns outside the image are clipped; a line starting past the right edge
/// leaves the image unchanged.
pub fn draw_vertical_line(image: &mut RgbaImage, x: u32, style: &MarkerStyle) {
    let (width, height) = image.dimensions();
    if x >= width || style.width == 0 || height == 0 {
        return;
    }
    let line_width = style.width.min(width - x);
    // x < width, and image dimensions fit in i32 for any decodable image.
    #[allow(clippy::cast_possible_wrap)]
    let rect = Rect::at(x as i32, 0).of_size(line_width, height);
    draw_filled_rect_mut(image, rect, style.color);
}

/// Load `background`, draw the marker at `x` and write the result.
///
/// When `target` is `None` the output path is derived with
/// [`default_output_path`]. The input file is never modified. Returns the
/// path that was written.
///
/// # Errors
///
/// - [`Error::UnsupportedSuffix`] if no target is given and none can be derived.
/// - [`Error::Decode`] if the background cannot be read.
/// - [`Error::Write`] / [`Error::UnsupportedFormat`] if saving fails.
pub fn draw_marker(
    x: u32,
    background: &Path,
    target: Option<&Path>,
    style: &MarkerStyle,
) -> Result<PathBuf> {
    let output = match target {
        Some(t) => t.to_path_buf(),
        None => default_output_path(background)?,
    };

    let mut img = image::open(background)
        .map_err(|source| Error::Decode {
            path: background.to_path_buf(),
            source,
        })?
        .to_rgba8();

    if x >= img.width() {
        log::warn!(
            "marker x={x} lies outside {} (width {}); nothing drawn",
            background.display(),
            img.width()
        );
    }
    draw_vertical_line(&mut img, x, style);

    save_image(&img, &output)?;
    log::info!("marker written to {}", output.display());
    Ok(output)
}

/// Save an RGBA image, choosing the encoder from the path extension.
///
/// JPEG has no alpha, so it is flattened to RGB and written at quality 100.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let write_err = |source: image::ImageError| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let file = std::fs::File::create(path)
                .map_err(|e| write_err(image::ImageError::IoError(e)))?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            rgb.write_with_encoder(encoder).map_err(write_err)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save_with_format(path, format).map_err(write_err)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Derive the marker output path from a background path.
///
/// The file name's `.jpg` or `.png` extension is replaced by `_result.png`:
/// `"captcha/bg1.jpg"` becomes `"captcha/bg1_result.png"`. The rest of the
/// name is kept as raw `OsStr`, so non-UTF-8 names work.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSuffix`] for any other or missing extension.
pub fn default_output_path(background: &Path) -> Result<PathBuf> {
    let unsupported = || Error::UnsupportedSuffix {
        path: background.to_path_buf(),
    };

    let ext = background.extension().ok_or_else(unsupported)?;
    if ext != "jpg" && ext != "png" {
        return Err(unsupported());
    }
    let stem = background.file_stem().ok_or_else(unsupported)?;

    let mut name = stem.to_os_string();
    name.push(RESULT_SUFFIX);
    Ok(background.with_file_name(name))
}
