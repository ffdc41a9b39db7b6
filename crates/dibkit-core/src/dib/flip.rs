//! Mirroring and transposition

use super::access::{get_bit, set_bit};
use super::{Dib, DibMut};
use crate::error::Result;

impl Dib {
    /// Mirrored copy of the bitmap.
    ///
    /// `flip_x` mirrors columns, `flip_y` mirrors rows. Works at bit level
    /// for 1 bpp bitmaps; palette and alpha plane follow.
    pub fn flip(&self, flip_x: bool, flip_y: bool) -> Result<Dib> {
        let w = self.width();
        let h = self.height();
        let mut out = DibMut::new(w, h, self.format())?;
        out.set_palette(self.palette().cloned())?;

        let bpp = usize::from(self.bpp());
        let row_bytes = (w as usize * bpp).div_ceil(8);
        for y in 0..h {
            let src_row = if flip_y { h - 1 - y } else { y };
            let src = self.scanline(src_row);
            let dst = out.scanline_mut(y);
            if !flip_x {
                dst[..row_bytes].copy_from_slice(&src[..row_bytes]);
            } else if bpp == 1 {
                for x in 0..w as usize {
                    set_bit(dst, x, get_bit(src, w as usize - 1 - x));
                }
            } else {
                let n = bpp / 8;
                for x in 0..w as usize {
                    let sx = w as usize - 1 - x;
                    dst[x * n..x * n + n].copy_from_slice(&src[sx * n..sx * n + n]);
                }
            }
        }

        if let Some(mask) = self.alpha_mask() {
            out.set_alpha_mask(Some(mask.flip(flip_x, flip_y)?))?;
        }
        Ok(out.into())
    }

    /// Transposed copy of the bitmap, `height x width`.
    ///
    /// Output pixel `(x, y)` is read from source column
    /// `flip_y ? width-1-y : y` and source row `flip_x ? height-1-x : x`.
    /// `swap_xy(true, false)` is therefore a clockwise quarter turn and
    /// `swap_xy(false, true)` a counter-clockwise one.
    pub fn swap_xy(&self, flip_x: bool, flip_y: bool) -> Result<Dib> {
        let w = self.width();
        let h = self.height();
        let mut out = DibMut::new(h, w, self.format())?;
        out.set_palette(self.palette().cloned())?;

        let bpp = usize::from(self.bpp());
        for y in 0..w {
            let src_col = (if flip_y { w - 1 - y } else { y }) as usize;
            let dst = out.scanline_mut(y);
            for x in 0..h {
                let src_row = if flip_x { h - 1 - x } else { x };
                let src = self.scanline(src_row);
                let xs = x as usize;
                if bpp == 1 {
                    set_bit(dst, xs, get_bit(src, src_col));
                } else {
                    let n = bpp / 8;
                    dst[xs * n..xs * n + n].copy_from_slice(&src[src_col * n..src_col * n + n]);
                }
            }
        }

        if let Some(mask) = self.alpha_mask() {
            out.set_alpha_mask(Some(mask.swap_xy(flip_x, flip_y)?))?;
        }
        Ok(out.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelFormat;

    fn pattern(format: PixelFormat, w: u32, h: u32) -> Dib {
        let mut m = DibMut::new(w, h, format).unwrap();
        for y in 0..h {
            for x in 0..w {
                let on = (x * 7 + y * 3) % 5 < 2;
                let v = if format.bpp() == 1 {
                    if on { 0xffff_ffff } else { 0xff00_0000 }
                } else {
                    0xff00_0000 | (x * 20) << 16 | (y * 30) << 8 | (x + y)
                };
                m.set_pixel_argb(x, y, v);
            }
        }
        m.into()
    }

    #[test]
    fn test_flip_all_depths() {
        for format in [
            PixelFormat::MASK_1,
            PixelFormat::RGB_24,
            PixelFormat::ARGB_32,
        ] {
            let dib = pattern(format, 11, 5);
            let f = dib.flip(true, true).unwrap();
            for y in 0..5 {
                for x in 0..11 {
                    assert_eq!(f.pixel_argb(x, y), dib.pixel_argb(10 - x, 4 - y));
                }
            }
            let same = dib.flip(false, false).unwrap();
            assert_eq!(same.buffer(), dib.buffer());
            let twice = dib.flip(true, false).unwrap().flip(true, false).unwrap();
            assert_eq!(twice.buffer(), dib.buffer());
        }
    }

    #[test]
    fn test_swap_xy_transpose() {
        for format in [PixelFormat::MASK_1, PixelFormat::RGB_32] {
            let dib = pattern(format, 13, 6);
            let t = dib.swap_xy(false, false).unwrap();
            assert_eq!((t.width(), t.height()), (6, 13));
            for y in 0..13 {
                for x in 0..6 {
                    assert_eq!(t.pixel_argb(x, y), dib.pixel_argb(y, x));
                }
            }
        }
    }

    #[test]
    fn test_swap_xy_quarter_turns() {
        let dib = pattern(PixelFormat::RGB_24, 4, 3);
        let cw = dib.swap_xy(true, false).unwrap();
        for y in 0..4 {
            for x in 0..3 {
                assert_eq!(cw.pixel_argb(x, y), dib.pixel_argb(y, 2 - x));
            }
        }
        let ccw = dib.swap_xy(false, true).unwrap();
        for y in 0..4 {
            for x in 0..3 {
                assert_eq!(ccw.pixel_argb(x, y), dib.pixel_argb(3 - y, x));
            }
        }
    }

    #[test]
    fn test_swap_xy_moves_alpha_plane() {
        let mut m = DibMut::new(3, 2, PixelFormat::CMYKA_32).unwrap();
        m.set_pixel_argb(2, 0, 0x11ff_ffff);
        let dib: Dib = m.into();
        let t = dib.swap_xy(false, false).unwrap();
        assert_eq!(t.alpha_mask().unwrap().scanline(2)[0], 0x11);
    }
}
