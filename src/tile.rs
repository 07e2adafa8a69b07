//! Tile preparation: strip the transparent padding around the puzzle piece.
//!
//! Slider tiles usually ship as a full-height strip with the piece drawn
//! somewhere inside and everything else fully transparent. Only the visible
//! region takes part in matching.

use image::{DynamicImage, RgbImage};

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Rectangle covering a whole `width` x `height` image.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Minimal rectangle enclosing every pixel with a non-zero alpha.
///
/// Returns `None` when the image has no alpha channel, and an empty box when
/// every pixel is fully transparent.
#[must_use]
pub fn alpha_bounding_box(image: &DynamicImage) -> Option<BoundingBox> {
    if !image.color().has_alpha() {
        return None;
    }

    let rgba = image.to_rgba8();
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);
    let mut any = false;

    for (x, y, px) in rgba.enumerate_pixels() {
        if px[3] > 0 {
            any = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !any {
        return Some(BoundingBox::full(0, 0));
    }

    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Crop the tile to its visible region and drop the alpha channel.
///
/// Tiles without alpha are returned as-is (converted to RGB). The returned
/// box describes the region that was kept, in tile coordinates.
#[must_use]
pub fn trim_transparent(image: &DynamicImage) -> (RgbImage, BoundingBox) {
    match alpha_bounding_box(image) {
        Some(bbox) => {
            let cropped = image
                .crop_imm(bbox.x, bbox.y, bbox.width, bbox.height)
                .to_rgb8();
            (cropped, bbox)
        }
        None => {
            let rgb = image.to_rgb8();
            let bbox = BoundingBox::full(rgb.width(), rgb.height());
            (rgb, bbox)
        }
    }
}
