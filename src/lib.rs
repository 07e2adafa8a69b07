//! Locate the gap of a slider-puzzle CAPTCHA.
//!
//! A slider CAPTCHA shows a background with a cut-out gap and a separate tile
//! (the puzzle piece, usually padded with transparent pixels). This crate
//! finds how far the tile has to travel horizontally by matching the Canny
//! edge map of the trimmed tile against the edge map of the background.
//!
//! # Quick Start
//!
//! ```no_run
//! use slider_solver::SliderSolver;
//!
//! let solver = SliderSolver::new("bg1.png", "t1.png");
//! let distance = solver.detect_distance().expect("detection failed");
//! println!("slide by {distance}px");
//! ```
//!
//! # Verifying a result
//!
//! The marker renderer draws a red vertical line at the detected offset so the
//! result can be checked by eye. Without an explicit target the image lands
//! next to the background as `<name>_result.png`.
//!
//! ```no_run
//! use std::path::Path;
//! use slider_solver::SliderSolver;
//!
//! let solver = SliderSolver::new("bg1.png", "t1.png");
//! let distance = solver.detect_distance().unwrap();
//! let written = solver.draw_line(distance, Path::new("bg1.png"), None).unwrap();
//! assert_eq!(written, Path::new("bg1_result.png"));
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod marker;
pub mod matching;
mod solver;
pub mod tile;

pub use error::{Error, Result};
pub use marker::{default_output_path, draw_marker, MarkerStyle};
pub use matching::{MatchResult, DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW};
pub use solver::{GapMatch, SliderSolver, SolverConfig, DEFAULT_OFFSET_CALIBRATION};
pub use tile::BoundingBox;
