//! Synthetic test images
//!
//! Deterministic bitmaps used by the regression tests in place of image
//! files on disk.

use crate::error::TestResult;
use dibkit_core::{Dib, DibMut, PixelFormat, color};

/// 8 bpp gray bitmap whose value rises left to right, `x * 256 / width`.
///
/// At width 256 every column holds its own x coordinate.
pub fn horizontal_ramp(width: u32, height: u32) -> TestResult<Dib> {
    let mut dib = DibMut::new(width, height, PixelFormat::PAL_8)?;
    for y in 0..height {
        let row = dib.scanline_mut(y);
        for x in 0..width {
            row[x as usize] = (x * 256 / width) as u8;
        }
    }
    Ok(dib.into())
}

/// 1 bpp mask of `cell x cell` squares, the top-left square set.
pub fn checkerboard_mask(width: u32, height: u32, cell: u32) -> TestResult<Dib> {
    let cell = cell.max(1);
    let mut dib = DibMut::new(width, height, PixelFormat::MASK_1)?;
    for y in 0..height {
        for x in 0..width {
            if (x / cell + y / cell) % 2 == 0 {
                dib.set_pixel_argb(x, y, 0xffff_ffff);
            }
        }
    }
    Ok(dib.into())
}

/// Bitmap of one colour in any format.
pub fn solid(width: u32, height: u32, format: PixelFormat, argb: u32) -> TestResult<Dib> {
    let mut dib = DibMut::new(width, height, format)?;
    dib.clear(argb);
    Ok(dib.into())
}

/// Opaque bitmap in which every pixel has a distinct colour:
/// red = x, green = y, blue = `x ^ y` (all modulo 256).
pub fn coordinate_colors(width: u32, height: u32, format: PixelFormat) -> TestResult<Dib> {
    let mut dib = DibMut::new(width, height, format)?;
    for y in 0..height {
        for x in 0..width {
            dib.set_pixel_argb(x, y, color::argb(0xff, x as u8, y as u8, (x ^ y) as u8));
        }
    }
    Ok(dib.into())
}

/// Smooth RGB gradient: red across, green down, blue along the diagonal.
pub fn gradient(width: u32, height: u32, format: PixelFormat) -> TestResult<Dib> {
    let mut dib = DibMut::new(width, height, format)?;
    let span_x = width.saturating_sub(1).max(1);
    let span_y = height.saturating_sub(1).max(1);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / span_x) as u8;
            let g = (y * 255 / span_y) as u8;
            let b = ((x + y) * 255 / (span_x + span_y)) as u8;
            dib.set_pixel_argb(x, y, color::argb(0xff, r, g, b));
        }
    }
    Ok(dib.into())
}

/// Copy of `dib` with a `MASK_8` alpha plane holding `alpha(x, y)`.
pub fn with_alpha_plane(dib: &Dib, alpha: impl Fn(u32, u32) -> u8) -> TestResult<Dib> {
    let mut mask = DibMut::new(dib.width(), dib.height(), PixelFormat::MASK_8)?;
    for y in 0..dib.height() {
        let row = mask.scanline_mut(y);
        for x in 0..dib.width() {
            row[x as usize] = alpha(x, y);
        }
    }
    let mut out = dib.to_mut();
    out.set_alpha_mask(Some(mask.into()))?;
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_ramp() {
        let ramp = horizontal_ramp(256, 2).unwrap();
        assert_eq!(ramp.scanline(1)[200], 200);
        let ramp = horizontal_ramp(4, 1).unwrap();
        assert_eq!(&ramp.scanline(0)[..4], &[0, 64, 128, 192]);
    }

    #[test]
    fn test_checkerboard() {
        let cb = checkerboard_mask(4, 4, 2).unwrap();
        assert_eq!(cb.pixel_argb(0, 0), Some(0xffff_ffff));
        assert_eq!(cb.pixel_argb(2, 0), Some(0xff00_0000));
        assert_eq!(cb.pixel_argb(2, 2), Some(0xffff_ffff));
    }

    #[test]
    fn test_coordinate_colors_distinct() {
        let dib = coordinate_colors(20, 20, PixelFormat::RGB_24).unwrap();
        assert_eq!(dib.pixel_argb(3, 5), Some(color::argb(0xff, 3, 5, 6)));
    }

    #[test]
    fn test_with_alpha_plane() {
        let dib = solid(3, 3, PixelFormat::RGB_24, 0xff00_ff00).unwrap();
        let dib = with_alpha_plane(&dib, |x, _| (x * 100) as u8).unwrap();
        assert_eq!(dib.pixel_argb(2, 1), Some(0xc800_ff00));
    }
}
