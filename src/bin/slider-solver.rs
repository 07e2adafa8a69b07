use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use rayon::prelude::*;

use slider_solver::{
    GapMatch, MarkerStyle, SliderSolver, SolverConfig, DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW,
    DEFAULT_OFFSET_CALIBRATION,
};

#[derive(Parser)]
#[command(
    name = "slider-solver",
    about = "Locate the gap of a slider-puzzle CAPTCHA",
    version,
    after_help = "Simple usage: slider-solver bg.png tile.png  (prints the slide distance)\n\n\
                  Several pairs may be given: slider-solver bg1.png t1.png bg2.png t2.png"
)]
struct Cli {
    /// Background and tile images, in pairs
    #[arg(required = true, num_args = 2.., value_names = ["BACKGROUND", "TILE"])]
    images: Vec<PathBuf>,

    /// Draw a marker line at the detected offset
    #[arg(short, long)]
    draw: bool,

    /// Marker output file (single pair only; default: {name}_result.png)
    #[arg(short, long, requires = "draw")]
    output: Option<PathBuf>,

    /// Low Canny hysteresis threshold
    #[arg(long, default_value_t = DEFAULT_CANNY_LOW)]
    canny_low: f32,

    /// High Canny hysteresis threshold
    #[arg(long, default_value_t = DEFAULT_CANNY_HIGH)]
    canny_high: f32,

    /// Pixels added to the matched x coordinate
    #[arg(long, default_value_t = DEFAULT_OFFSET_CALIBRATION)]
    offset: u32,

    /// Marker line width in pixels
    #[arg(long, default_value_t = 2)]
    marker_width: u32,

    /// Also print match position and correlation score
    #[arg(short, long)]
    score: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            match cli.verbose {
                0 => log::LevelFilter::Warn,
                1 => log::LevelFilter::Info,
                _ => log::LevelFilter::Debug,
            }
        })
        .parse_default_env()
        .init();

    if cli.images.len() % 2 != 0 {
        eprintln!("Error: images must be given as BACKGROUND TILE pairs");
        process::exit(1);
    }

    if !(0.0..=cli.canny_high).contains(&cli.canny_low) {
        eprintln!("Error: Canny thresholds must satisfy 0 <= low <= high");
        process::exit(1);
    }

    let pairs: Vec<(PathBuf, PathBuf)> = cli
        .images
        .chunks_exact(2)
        .map(|p| (p[0].clone(), p[1].clone()))
        .collect();

    if cli.output.is_some() && pairs.len() > 1 {
        eprintln!("Error: --output can only be used with a single pair");
        process::exit(1);
    }

    let config = SolverConfig {
        canny_low: cli.canny_low,
        canny_high: cli.canny_high,
        offset_calibration: cli.offset,
        marker: MarkerStyle {
            width: cli.marker_width,
            ..MarkerStyle::default()
        },
    };

    // One independent solver per pair; collect keeps the input order.
    let results: Vec<_> = pairs
        .par_iter()
        .map(|(bg, tile)| SliderSolver::with_config(bg, tile, config.clone()).locate())
        .collect();
    let single = pairs.len() == 1;
    let mut fail_count = 0u32;

    for ((bg, tile), result) in pairs.iter().zip(results) {
        match result {
            Ok(m) => {
                print_match(bg, tile, &m, single, cli.score);
                if cli.draw {
                    let solver = SliderSolver::with_config(bg, tile, config.clone());
                    match solver.draw_line(m.offset, bg, cli.output.as_deref()) {
                        Ok(path) => log::info!("[OK] marker saved to {}", path.display()),
                        Err(e) => {
                            eprintln!("[FAIL] {}: {e}", bg.display());
                            fail_count += 1;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("[FAIL] {} + {}: {e}", bg.display(), tile.display());
                fail_count += 1;
            }
        }
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_match(bg: &Path, tile: &Path, m: &GapMatch, single: bool, score: bool) {
    let detail = if score {
        format!(
            " (match at {},{} score {:.3})",
            m.location.0, m.location.1, m.score
        )
    } else {
        String::new()
    };

    if single {
        println!("{}{detail}", m.offset);
    } else {
        println!("{} + {} -> {}{detail}", bg.display(), tile.display(), m.offset);
    }
}
