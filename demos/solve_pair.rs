//! Locate the gap for one background/tile pair and draw the marker.
//!
//! Usage:
//! ```sh
//! cargo run --example solve_pair -- bg.png tile.png
//! ```

use std::env;
use std::path::Path;
use std::process;

use slider_solver::SliderSolver;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <background> <tile>", args[0]);
        process::exit(1);
    }

    let solver = SliderSolver::new(&args[1], &args[2]);
    let gap = match solver.locate() {
        Ok(gap) => gap,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    println!(
        "Distance: {}px (match at {:?}, score {:.3})",
        gap.offset, gap.location, gap.score
    );

    match solver.draw_line(gap.offset, Path::new(&args[1]), None) {
        Ok(path) => println!("Marker: {}", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
