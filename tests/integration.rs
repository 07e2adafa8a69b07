use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use slider_solver::{Error, SliderSolver, SolverConfig};

const BG_WIDTH: u32 = 320;
const BG_HEIGHT: u32 = 160;
const GAP_X: u32 = 137;
const GAP_Y: u32 = 55;
const PIECE: u32 = 48;
const TILE_WIDTH: u32 = 60;
const TILE_PAD_X: u32 = 6;
const TOLERANCE: i64 = 3;

fn hash(a: u32, b: u32, salt: u32) -> u32 {
    let mut h = a.wrapping_mul(0x9E37_79B1)
        ^ b.wrapping_mul(0x85EB_CA77)
        ^ salt.wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h
}

/// Two overlapping block grids with unrelated periods, so edges never repeat.
fn background() -> RgbImage {
    RgbImage::from_fn(BG_WIDTH, BG_HEIGHT, |x, y| {
        let a = hash(x / 13, y / 11, 1);
        let b = hash(x / 7 + 100, y / 17, 2);
        let ch = |c: u32| -> u8 {
            let va = (a >> (8 * c)) & 0xff;
            let vb = (b >> (8 * c)) & 0xff;
            u8::try_from(va / 2 + vb / 2).unwrap()
        };
        Rgb([ch(0), ch(1), ch(2)])
    })
}

fn piece(bg: &RgbImage) -> RgbImage {
    image::imageops::crop_imm(bg, GAP_X, GAP_Y, PIECE, PIECE).to_image()
}

/// Full-height tile strip, transparent except for the puzzle piece.
fn padded_tile(bg: &RgbImage) -> RgbaImage {
    let piece = piece(bg);
    let mut tile = RgbaImage::new(TILE_WIDTH, BG_HEIGHT);
    for (x, y, px) in piece.enumerate_pixels() {
        tile.put_pixel(TILE_PAD_X + x, GAP_Y + y, Rgba([px[0], px[1], px[2], 255]));
    }
    tile
}

struct Fixture {
    tmp: tempfile::TempDir,
    bg: PathBuf,
    tile: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bg_img = background();
        let bg = dir.path().join("bg1.png");
        let tile = dir.path().join("t1.png");
        bg_img.save(&bg).unwrap();
        padded_tile(&bg_img).save(&tile).unwrap();
        Self {
            tmp: dir,
            bg,
            tile,
        }
    }

    fn dir(&self) -> &Path {
        self.tmp.path()
    }
}

fn assert_near(actual: u32, expected: u32) {
    let diff = (i64::from(actual) - i64::from(expected)).abs();
    assert!(
        diff <= TOLERANCE,
        "expected {expected} +/- {TOLERANCE}, got {actual}"
    );
}

#[test]
fn detects_gap_behind_transparent_padding() {
    let fx = Fixture::new();
    let distance = SliderSolver::new(&fx.bg, &fx.tile).detect_distance().unwrap();
    assert_near(distance, GAP_X + 10);
}

#[test]
fn locate_reports_trimmed_region_and_position() {
    let fx = Fixture::new();
    let m = SliderSolver::new(&fx.bg, &fx.tile).locate().unwrap();

    assert_eq!(m.tile_region.x, TILE_PAD_X);
    assert_eq!(m.tile_region.y, GAP_Y);
    assert_eq!((m.tile_region.width, m.tile_region.height), (PIECE, PIECE));
    assert_near(m.location.0, GAP_X);
    assert_near(m.location.1, GAP_Y);
    assert_eq!(m.offset, m.location.0 + 10);
    assert!(m.score > 0.5, "true position should correlate well, got {}", m.score);
}

#[test]
fn detects_gap_for_tile_without_alpha() {
    let fx = Fixture::new();
    let opaque = fx.dir().join("t_opaque.png");
    piece(&background()).save(&opaque).unwrap();

    let m = SliderSolver::new(&fx.bg, &opaque).locate().unwrap();
    assert_eq!(m.tile_region.x, 0);
    assert_eq!(m.tile_region.y, 0);
    assert_near(m.offset, GAP_X + 10);
}

#[test]
fn detection_is_deterministic() {
    let fx = Fixture::new();
    let first = SliderSolver::new(&fx.bg, &fx.tile).locate().unwrap();
    let second = SliderSolver::new(&fx.bg, &fx.tile).locate().unwrap();
    assert_eq!(first, second);
}

#[test]
fn offset_calibration_is_configurable() {
    let fx = Fixture::new();
    let default = SliderSolver::new(&fx.bg, &fx.tile).detect_distance().unwrap();

    let config = SolverConfig {
        offset_calibration: 0,
        ..SolverConfig::default()
    };
    let raw = SliderSolver::with_config(&fx.bg, &fx.tile, config)
        .detect_distance()
        .unwrap();
    assert_eq!(default, raw + 10);
}

#[test]
fn missing_tile_is_a_decode_error() {
    let fx = Fixture::new();
    let missing = fx.dir().join("nonexistent_slider.png");
    match SliderSolver::new(&fx.bg, &missing).detect_distance() {
        Err(Error::Decode { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn corrupt_background_is_a_decode_error() {
    let fx = Fixture::new();
    let corrupt = fx.dir().join("corrupt.png");
    std::fs::write(&corrupt, b"definitely not a png").unwrap();
    assert!(matches!(
        SliderSolver::new(&corrupt, &fx.tile).detect_distance(),
        Err(Error::Decode { .. })
    ));
}

#[test]
fn tile_larger_than_background_is_rejected() {
    let fx = Fixture::new();
    let small_bg = fx.dir().join("small_bg.png");
    image::imageops::crop_imm(&background(), 0, 0, 30, 30)
        .to_image()
        .save(&small_bg)
        .unwrap();

    assert!(matches!(
        SliderSolver::new(&small_bg, &fx.tile).detect_distance(),
        Err(Error::TileTooLarge {
            tile: (PIECE, PIECE),
            background: (30, 30)
        })
    ));
}

#[test]
fn fully_transparent_tile_is_rejected() {
    let fx = Fixture::new();
    let empty = fx.dir().join("empty_tile.png");
    RgbaImage::new(TILE_WIDTH, BG_HEIGHT).save(&empty).unwrap();

    assert!(matches!(
        SliderSolver::new(&fx.bg, &empty).detect_distance(),
        Err(Error::EmptyTile { .. })
    ));
}

#[test]
fn tile_without_edges_is_rejected() {
    let fx = Fixture::new();
    let flat = fx.dir().join("flat_tile.png");
    RgbImage::from_pixel(20, 20, Rgb([90, 120, 30])).save(&flat).unwrap();

    assert!(matches!(
        SliderSolver::new(&fx.bg, &flat).detect_distance(),
        Err(Error::FlatEdgeMap { what: "tile" })
    ));
}

#[test]
fn background_without_edges_is_rejected() {
    let fx = Fixture::new();
    let flat_bg = fx.dir().join("flat_bg.png");
    RgbImage::from_pixel(200, 80, Rgb([128, 128, 128]))
        .save(&flat_bg)
        .unwrap();
    let checker = fx.dir().join("checker_tile.png");
    RgbImage::from_fn(30, 30, |x, y| {
        if (x / 5 + y / 5) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
    .save(&checker)
    .unwrap();

    let result = SliderSolver::new(&flat_bg, &checker).detect_distance();
    assert!(
        matches!(result, Err(Error::FlatEdgeMap { what: "background" })),
        "expected flat background error, got {result:?}"
    );
}

#[test]
fn draw_line_derives_result_path() {
    let fx = Fixture::new();
    let solver = SliderSolver::new(&fx.bg, &fx.tile);

    let written = solver.draw_line(147, &fx.bg, None).unwrap();
    assert_eq!(written, fx.dir().join("bg1_result.png"));
    assert!(written.exists());

    let marked = image::open(&written).unwrap().to_rgba8();
    assert_eq!(marked.dimensions(), (BG_WIDTH, BG_HEIGHT));
    for y in [0, BG_HEIGHT / 2, BG_HEIGHT - 1] {
        assert_eq!(*marked.get_pixel(147, y), Rgba([255, 0, 0, 255]));
        assert_eq!(*marked.get_pixel(148, y), Rgba([255, 0, 0, 255]));
    }

    let original = image::open(&fx.bg).unwrap().to_rgba8();
    assert_eq!(marked.get_pixel(146, 0), original.get_pixel(146, 0));
    assert_eq!(marked.get_pixel(149, 0), original.get_pixel(149, 0));
}

#[test]
fn draw_line_writes_exactly_to_explicit_target() {
    let fx = Fixture::new();
    let before = std::fs::read(&fx.bg).unwrap();
    let target = fx.dir().join("custom_output.png");

    let written = SliderSolver::new(&fx.bg, &fx.tile)
        .draw_line(20, &fx.bg, Some(target.as_path()))
        .unwrap();

    assert_eq!(written, target);
    assert!(target.exists());
    assert!(!fx.dir().join("bg1_result.png").exists());
    assert_eq!(std::fs::read(&fx.bg).unwrap(), before, "input must not change");
}

#[test]
fn draw_line_on_jpg_background_writes_png() {
    let fx = Fixture::new();
    let jpg = fx.dir().join("bg2.jpg");
    background().save(&jpg).unwrap();

    let written = SliderSolver::new(&jpg, &fx.tile)
        .draw_line(50, &jpg, None)
        .unwrap();
    assert_eq!(written, fx.dir().join("bg2_result.png"));
    assert_eq!(
        image::ImageFormat::from_path(&written).unwrap(),
        image::ImageFormat::Png
    );
    assert!(image::open(&written).is_ok());
}

#[test]
fn draw_line_without_known_suffix_fails() {
    let fx = Fixture::new();
    let bmp = fx.dir().join("bg3.bmp");
    background().save(&bmp).unwrap();

    assert!(matches!(
        SliderSolver::new(&bmp, &fx.tile).draw_line(10, &bmp, None),
        Err(Error::UnsupportedSuffix { .. })
    ));
}

#[test]
fn draw_line_into_missing_directory_fails() {
    let fx = Fixture::new();
    let target = fx.dir().join("no_such_dir").join("out.png");
    let result = SliderSolver::new(&fx.bg, &fx.tile).draw_line(10, &fx.bg, Some(target.as_path()));
    assert!(
        matches!(result, Err(Error::Write { .. } | Error::Io(_))),
        "expected write failure, got {result:?}"
    );
}

#[test]
fn independent_solvers_run_in_parallel() {
    let fx = Fixture::new();
    let expected = SliderSolver::new(&fx.bg, &fx.tile).locate().unwrap();

    let (bg, tile) = (&fx.bg, &fx.tile);
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || SliderSolver::new(bg, tile).locate()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result.unwrap(), expected);
    }
}

#[test]
fn end_to_end_detect_then_draw() {
    let fx = Fixture::new();
    let solver = SliderSolver::new(&fx.bg, &fx.tile);

    let distance = solver.detect_distance().unwrap();
    assert!(distance > 0 && distance < 500, "distance {distance} out of range");

    let written = solver.draw_line(distance, solver.background(), None).unwrap();
    assert!(written.ends_with("bg1_result.png"));
    assert!(image::open(&written).is_ok());
}
