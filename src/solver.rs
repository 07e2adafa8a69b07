//! Gap locator for a background/tile image pair.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::marker::{self, MarkerStyle};
use crate::matching::{self, MatchResult, DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW};
use crate::tile::{self, BoundingBox};

/// Pixels added to the matched x to reach the slider's reference point.
pub const DEFAULT_OFFSET_CALIBRATION: u32 = 10;

/// Options controlling detection and marker rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Low hysteresis threshold for Canny edge detection.
    pub canny_low: f32,
    /// High hysteresis threshold for Canny edge detection.
    pub canny_high: f32,
    /// Constant added to the matched x coordinate.
    pub offset_calibration: u32,
    /// Marker line appearance.
    pub marker: MarkerStyle,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            canny_low: DEFAULT_CANNY_LOW,
            canny_high: DEFAULT_CANNY_HIGH,
            offset_calibration: DEFAULT_OFFSET_CALIBRATION,
            marker: MarkerStyle::default(),
        }
    }
}

/// Full outcome of a gap search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapMatch {
    /// Calibrated horizontal offset: `location.0 + offset_calibration`.
    pub offset: u32,
    /// Top-left corner of the best match in the background.
    pub location: (u32, u32),
    /// Correlation score at `location`.
    pub score: f32,
    /// Region of the tile that took part in matching.
    pub tile_region: BoundingBox,
}

/// Solver for one background/tile pair.
///
/// Paths are stored as given and only touched when [`detect_distance`]
/// or [`locate`] runs. Every call decodes the images afresh.
///
/// [`detect_distance`]: SliderSolver::detect_distance
/// [`locate`]: SliderSolver::locate
#[derive(Debug, Clone)]
pub struct SliderSolver {
    background: PathBuf,
    tile: PathBuf,
    config: SolverConfig,
}

impl SliderSolver {
    /// Create a solver with the default configuration.
    pub fn new(background: impl Into<PathBuf>, tile: impl Into<PathBuf>) -> Self {
        Self::with_config(background, tile, SolverConfig::default())
    }

    /// Create a solver with an explicit configuration.
    pub fn with_config(
        background: impl Into<PathBuf>,
        tile: impl Into<PathBuf>,
        config: SolverConfig,
    ) -> Self {
        Self {
            background: background.into(),
            tile: tile.into(),
            config,
        }
    }

    /// Background image path.
    #[must_use]
    pub fn background(&self) -> &Path {
        &self.background
    }

    /// Tile image path.
    #[must_use]
    pub fn tile(&self) -> &Path {
        &self.tile
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Horizontal distance, in pixels, the slider has to travel.
    ///
    /// # Errors
    ///
    /// See [`SliderSolver::locate`].
    pub fn detect_distance(&self) -> Result<u32> {
        self.locate().map(|m| m.offset)
    }

    /// Locate the gap and report the full match.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] if either image cannot be read.
    /// - [`Error::EmptyTile`] if the tile's alpha channel hides every pixel.
    /// - [`Error::TileTooLarge`] if the trimmed tile exceeds the background.
    /// - [`Error::FlatEdgeMap`] if either image yields no edges.
    /// - [`Error::InvalidThresholds`] if the configured Canny thresholds are out of order.
    pub fn locate(&self) -> Result<GapMatch> {
        let (low, high) = (self.config.canny_low, self.config.canny_high);
        if !(0.0..=high).contains(&low) {
            return Err(Error::InvalidThresholds { low, high });
        }

        let bg = open_image(&self.background)?;
        let tile_img = open_image(&self.tile)?;
        log::debug!(
            "background {}x{}, tile {}x{} ({:?})",
            bg.width(),
            bg.height(),
            tile_img.width(),
            tile_img.height(),
            tile_img.color()
        );

        let (tile_rgb, tile_region) = tile::trim_transparent(&tile_img);
        if tile_region.is_empty() {
            return Err(Error::EmptyTile {
                path: self.tile.clone(),
            });
        }
        log::debug!("tile region after trimming: {tile_region:?}");

        let bg_edges = matching::edge_map(&matching::to_grayscale(&bg.to_rgb8()), low, high);
        let tile_edges = matching::edge_map(&matching::to_grayscale(&tile_rgb), low, high);

        let MatchResult { x, y, score } = matching::match_edges(&bg_edges, &tile_edges)?;
        let offset = x.saturating_add(self.config.offset_calibration);
        log::debug!("best match at ({x}, {y}) score {score:.4}, offset {offset}");

        if offset >= bg.width() {
            log::warn!(
                "offset {offset} is at or beyond background width {} for {}",
                bg.width(),
                self.background.display()
            );
        }

        Ok(GapMatch {
            offset,
            location: (x, y),
            score,
            tile_region,
        })
    }

    /// Draw the marker line at `x` on `background` and save it.
    ///
    /// Uses this solver's marker style. Returns the path written, which is
    /// `target` when given and `<background stem>_result.png` otherwise.
    ///
    /// # Errors
    ///
    /// See [`marker::draw_marker`].
    pub fn draw_line(&self, x: u32, background: &Path, target: Option<&Path>) -> Result<PathBuf> {
        marker::draw_marker(x, background, target, &self.config.marker)
    }
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}
