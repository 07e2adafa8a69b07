//! Error types for the slider-solver crate.

use std::path::PathBuf;

/// Errors that can occur while locating a gap or rendering its marker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A supplied path does not resolve to a readable, decodable image.
    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// The trimmed tile does not fit inside the background.
    #[error(
        "tile ({}x{}) is larger than background ({}x{})",
        tile.0, tile.1, background.0, background.1
    )]
    TileTooLarge {
        /// Tile size after trimming, `(width, height)`.
        tile: (u32, u32),
        /// Background size, `(width, height)`.
        background: (u32, u32),
    },

    /// The tile has an alpha channel but no visible pixel.
    #[error("tile {} is fully transparent", path.display())]
    EmptyTile {
        /// Path of the tile image.
        path: PathBuf,
    },

    /// One of the images has zero width or height.
    #[error("{what} image has zero size")]
    EmptyImage {
        /// Which image was empty (`"background"` or `"tile"`).
        what: &'static str,
    },

    /// Canny thresholds must satisfy `0 <= low <= high`.
    #[error("invalid Canny thresholds: low {low}, high {high}")]
    InvalidThresholds {
        /// Low hysteresis threshold.
        low: f32,
        /// High hysteresis threshold.
        high: f32,
    },

    /// An edge map is uniform, so its correlation is undefined.
    #[error("{what} edge map has no edges; correlation is undefined")]
    FlatEdgeMap {
        /// Which edge map was flat (`"background"` or `"tile"`).
        what: &'static str,
    },

    /// No output path was given and none can be derived from the input.
    #[error("cannot derive output path from {}: expected a .jpg or .png suffix", path.display())]
    UnsupportedSuffix {
        /// Background path the derivation was attempted on.
        path: PathBuf,
    },

    /// The output image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The annotated image could not be written.
    #[error("failed to write image {}: {source}", path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying encoder error.
        source: image::ImageError,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
