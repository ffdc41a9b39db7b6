//! Transform regression test
//!
//! Quarter turns and mirrored scales are exact pixel permutations, clipped
//! placements are windows of the full placement, and rotations by
//! arbitrary angles cover the expected area with the source colour.

use dibkit_core::{Dib, Matrix, PixelFormat, Rect};
use dibkit_test::{RegParams, images};
use dibkit_transform::{
    Decomposition, DibTransformExt, ImageTransformer, ResampleOptions, TransformError,
};

fn place(src: &Dib, m: Matrix, opts: ResampleOptions, clip: Option<Rect>) -> (Dib, i32, i32) {
    let mut t = ImageTransformer::new(src, &m, &opts, clip).expect("transformer");
    while t.continue_(None).expect("continue") {}
    t.into_result().expect("result")
}

/// Count of pixels where `out(x, y) != src(map(x, y))`.
fn mismatches(out: &Dib, src: &Dib, map: impl Fn(u32, u32) -> (u32, u32)) -> u32 {
    let mut bad = 0;
    for y in 0..out.height() {
        for x in 0..out.width() {
            let (sx, sy) = map(x, y);
            if out.pixel_argb(x, y) != src.pixel_argb(sx, sy) {
                bad += 1;
            }
        }
    }
    bad
}

#[test]
fn transform_reg() {
    let mut rp = RegParams::new("transform");

    test_quarter_turns(&mut rp);
    test_mirrors(&mut rp);
    test_clipped_turn(&mut rp);
    test_general_rotation(&mut rp);

    assert!(rp.cleanup(), "transform regression test failed");
}

fn test_quarter_turns(rp: &mut RegParams) {
    for format in [PixelFormat::RGB_24, PixelFormat::RGB_32, PixelFormat::ARGB_32] {
        let src = images::coordinate_colors(20, 10, format).expect("colors");

        let m = Matrix::new(0.0, -20.0, 10.0, 0.0, 0.0, 20.0);
        let t = ImageTransformer::new(&src, &m, &ResampleOptions::default(), None)
            .expect("transformer");
        rp.compare_values(1.0, if t.decomposition() == Decomposition::Rotate { 1.0 } else { 0.0 }, 0.0);
        let (out, left, top) = place(&src, m, ResampleOptions::default(), None);
        rp.compare_values(10.0, f64::from(out.width()), 0.0);
        rp.compare_values(20.0, f64::from(out.height()), 0.0);
        rp.compare_values(0.0, f64::from(left + top), 0.0);
        let bad = mismatches(&out, &src, |x, y| (19 - y, 9 - x));
        rp.compare_values(0.0, f64::from(bad), 0.0);

        let m = Matrix::new(0.0, 20.0, -10.0, 0.0, 10.0, 0.0);
        let (out, _, _) = place(&src, m, ResampleOptions::bilinear(), None);
        let bad = mismatches(&out, &src, |x, y| (y, x));
        rp.compare_values(0.0, f64::from(bad), 0.0);
        rp.check_dib(&out).expect("checksum");
    }
}

fn test_mirrors(rp: &mut RegParams) {
    let src = images::coordinate_colors(20, 10, PixelFormat::RGB_24).expect("colors");

    // half turn
    let (out, left, top) = src
        .transform_to(&Matrix::new(-20.0, 0.0, 0.0, 10.0, 20.0, 0.0), &ResampleOptions::default())
        .expect("transform")
        .expect("result");
    rp.compare_values(0.0, f64::from(left + top), 0.0);
    let bad = mismatches(&out, &src, |x, y| (19 - x, 9 - y));
    rp.compare_values(0.0, f64::from(bad), 0.0);

    // upright placement keeps the rows in order
    let (out, left, top) = src
        .transform_to(&Matrix::new(20.0, 0.0, 0.0, -10.0, 5.0, 17.0), &ResampleOptions::default())
        .expect("transform")
        .expect("result");
    rp.compare_values(5.0, f64::from(left), 0.0);
    rp.compare_values(7.0, f64::from(top), 0.0);
    rp.compare_dibs(&src, &out);
}

fn test_clipped_turn(rp: &mut RegParams) {
    let src = images::coordinate_colors(20, 10, PixelFormat::RGB_32).expect("colors");
    let m = Matrix::new(0.0, -20.0, 10.0, 0.0, 0.0, 20.0);
    let (full, _, _) = place(&src, m, ResampleOptions::default(), None);

    let clip = Rect::new(3, 4, 8, 15);
    let (part, left, top) = place(&src, m, ResampleOptions::default(), Some(clip));
    rp.compare_values(3.0, f64::from(left), 0.0);
    rp.compare_values(4.0, f64::from(top), 0.0);
    rp.compare_values(5.0, f64::from(part.width()), 0.0);
    rp.compare_values(11.0, f64::from(part.height()), 0.0);
    let bad = mismatches(&part, &full, |x, y| (x + 3, y + 4));
    rp.compare_values(0.0, f64::from(bad), 0.0);
}

fn test_general_rotation(rp: &mut RegParams) {
    let src = images::solid(10, 10, PixelFormat::ARGB_32, 0xff00_80ff).expect("solid");
    // scale 20 rotated by atan(4/3)
    let m = Matrix::new(12.0, 16.0, -16.0, 12.0, 16.0, 0.0);
    for opts in [
        ResampleOptions::default(),
        ResampleOptions::bicubic(),
        ResampleOptions::no_smoothing(),
    ] {
        let (out, left, top) = place(&src, m, opts, None);
        rp.compare_values(0.0, f64::from(left + top), 0.0);
        rp.compare_values(28.0, f64::from(out.width()), 0.0);
        rp.compare_values(28.0, f64::from(out.height()), 0.0);

        let mut covered = 0u32;
        let mut wrong = 0u32;
        for y in 0..out.height() {
            for x in 0..out.width() {
                match out.pixel_argb(x, y) {
                    Some(0) => {}
                    Some(0xff00_80ff) => covered += 1,
                    _ => wrong += 1,
                }
            }
        }
        eprintln!("  {opts:?}: {covered} pixels covered");
        rp.compare_values(0.0, f64::from(wrong), 0.0);
        rp.compare_values(420.0, f64::from(covered), 60.0);
        rp.compare_values(f64::from(0xff00_80ffu32), f64::from(out.pixel_argb(14, 14).unwrap_or(0)), 0.0);
    }

    let mask = images::solid(10, 10, PixelFormat::MASK_8, 0xffff_ffff).expect("mask");
    let (out, _, _) = place(&mask, m, ResampleOptions::default(), None);
    rp.compare_values(1.0, if out.format() == PixelFormat::MASK_8 { 1.0 } else { 0.0 }, 0.0);
    rp.compare_values(255.0, f64::from(out.scanline(14)[14]), 0.0);
    rp.compare_values(0.0, f64::from(out.scanline(0)[0]), 0.0);
}

#[test]
fn transform_pause_reg() {
    let mut rp = RegParams::new("transform_pause");
    let src = images::horizontal_ramp(1000, 1000).expect("large ramp");
    let m = Matrix::new(300.0, 0.0, 0.0, -200.0, 0.0, 200.0);
    let opts = ResampleOptions::default();

    let (plain, _, _) = place(&src, m, opts, None);

    let mut t = ImageTransformer::new(&src, &m, &opts, None).expect("transformer");
    let mut resumed = 0;
    let mut always = || true;
    while t.continue_(Some(&mut always)).expect("continue") {
        resumed += 1;
    }
    let (paused, _, _) = t.into_result().expect("result");
    eprintln!("  resumed {} times", resumed);
    rp.compare_values(1.0, if resumed > 0 { 1.0 } else { 0.0 }, 0.0);
    rp.compare_dibs(&plain, &paused);

    assert!(rp.cleanup(), "transform pause regression test failed");
}

fn try_place(
    src: &Dib,
    m: Matrix,
    clip: Option<Rect>,
) -> Result<Option<(Dib, i32, i32)>, TransformError> {
    let mut t = ImageTransformer::new(src, &m, &ResampleOptions::default(), clip)?;
    while t.continue_(None)? {}
    Ok(t.into_result())
}

#[test]
fn transform_extreme_reg() {
    let mut rp = RegParams::new("transform_extreme");
    let src = images::solid(4, 4, PixelFormat::ARGB_32, 0xff40_8020).expect("solid");
    let window = Some(Rect::new(0, 0, 4, 4));
    let nan = f32::NAN;
    let inf = f32::INFINITY;

    // placements beyond the coordinate range, or not finite, draw nothing
    for m in [
        Matrix::new(1e10, 0.0, 0.0, 4.0, -5e9, 0.0),
        Matrix::new(0.0, 1e10, 4.0, 0.0, 0.0, -5e9),
        Matrix::new(3e9, 1e9, -1e9, 3e9, 0.0, 0.0),
        Matrix::new(nan, 0.0, 0.0, 4.0, 0.0, 0.0),
        Matrix::new(4.0, 0.0, 0.0, 4.0, inf, 0.0),
        Matrix::new(4.0, inf, -inf, 4.0, 0.0, 0.0),
    ] {
        let placed = try_place(&src, m, window).expect("out-of-range placement");
        rp.compare_values(0.0, if placed.is_some() { 1.0 } else { 0.0 }, 0.0);
    }

    // singular and nearly singular matrices never panic
    for m in [
        Matrix::new(4.0, 4.0, 4.0, 4.0, 0.0, 0.0),
        Matrix::new(4.0, 4.0, 4.0, 4.0001, 0.0, 0.0),
        Matrix::new(1e-20, 0.0, 0.0, 1e-20, 0.0, 0.0),
        Matrix::new(0.0, 0.0, 0.0, 0.0, 2.0, 2.0),
    ] {
        match try_place(&src, m, Some(Rect::new(0, 0, 8, 8))) {
            Ok(Some((out, _, _))) => {
                rp.compare_values(1.0, if out.width() <= 8 && out.height() <= 8 { 1.0 } else { 0.0 }, 0.0);
            }
            Ok(None) | Err(_) => {}
        }
    }

    // huge but representable placements work through a small clip
    let big = Matrix::new(1e8, 0.0, 0.0, -1e8, 0.0, 1e8);
    let (out, left, top) = try_place(&src, big, window)
        .expect("huge scale")
        .expect("visible window");
    rp.compare_values(0.0, f64::from(left + top), 0.0);
    rp.compare_values(4.0, f64::from(out.width()), 0.0);
    rp.compare_values(f64::from(0xff40_8020u32), f64::from(out.pixel_argb(3, 3).unwrap_or(0)), 0.0);

    let turned = Matrix::new(6e7, 8e7, -8e7, 6e7, 0.0, 0.0);
    let placed = try_place(&src, turned, Some(Rect::new(-4, 4, 4, 12))).expect("huge rotation");
    if let Some((out, _, _)) = placed {
        rp.compare_values(1.0, if out.width() <= 8 && out.height() <= 8 { 1.0 } else { 0.0 }, 0.0);
    }

    // an unclipped huge result is too large to allocate
    let unclipped = try_place(&src, Matrix::scale(1e8, 1e8), None);
    rp.compare_values(1.0, if unclipped.is_err() { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "transform extreme regression test failed");
}
