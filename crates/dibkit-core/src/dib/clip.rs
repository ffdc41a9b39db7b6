//! Sub-image extraction

use super::access::{get_bit, set_bit};
use super::{Dib, DibMut};
use crate::error::Result;
use crate::rect::Rect;

impl Dib {
    /// Copy the part of the bitmap inside `clip`.
    ///
    /// `clip` is intersected with the bitmap bounds first; an empty
    /// intersection yields `Ok(None)`. The palette is copied and the alpha
    /// plane is clipped alongside.
    pub fn clone_rect(&self, clip: &Rect) -> Result<Option<Dib>> {
        let bounds = Rect::from_size(self.width() as i32, self.height() as i32);
        let Some(rect) = bounds.intersect(clip) else {
            return Ok(None);
        };
        if rect == bounds {
            return Ok(Some(self.deep_clone()));
        }

        let width = rect.width() as u32;
        let height = rect.height() as u32;
        let mut out = DibMut::new(width, height, self.format())?;
        out.set_palette(self.palette().cloned())?;

        let left = rect.left as usize;
        let bpp = usize::from(self.bpp());
        for row in 0..height {
            let src = self.scanline(rect.top as u32 + row);
            let dst = out.scanline_mut(row);
            if bpp == 1 {
                if left % 8 == 0 {
                    let bytes = (width as usize).div_ceil(8);
                    dst[..bytes].copy_from_slice(&src[left / 8..left / 8 + bytes]);
                } else {
                    for x in 0..width as usize {
                        set_bit(dst, x, get_bit(src, left + x));
                    }
                }
            } else {
                let bytes_pp = bpp / 8;
                let len = width as usize * bytes_pp;
                let start = left * bytes_pp;
                dst[..len].copy_from_slice(&src[start..start + len]);
            }
        }

        if let Some(mask) = self.alpha_mask() {
            out.set_alpha_mask(mask.clone_rect(&rect)?)?;
        }
        Ok(Some(out.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelFormat;

    fn numbered(format: PixelFormat, w: u32, h: u32) -> Dib {
        let mut m = DibMut::new(w, h, format).unwrap();
        for y in 0..h {
            for x in 0..w {
                let v = (x * 16 + y) as u8;
                m.set_pixel_argb(x, y, 0xff00_0000 | u32::from(v) << 16 | u32::from(v));
            }
        }
        m.into()
    }

    #[test]
    fn test_clone_rect_rgb() {
        let dib = numbered(PixelFormat::RGB_24, 8, 6);
        let sub = dib.clone_rect(&Rect::new(2, 1, 5, 4)).unwrap().unwrap();
        assert_eq!((sub.width(), sub.height()), (3, 3));
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(sub.pixel_argb(x, y), dib.pixel_argb(x + 2, y + 1));
            }
        }
    }

    #[test]
    fn test_clone_rect_unaligned_bits() {
        let mut m = DibMut::new(20, 2, PixelFormat::MASK_1).unwrap();
        for x in (0..20).step_by(3) {
            m.set_pixel_argb(x, 1, 0xffff_ffff);
        }
        let dib: Dib = m.into();
        for left in [0, 3, 8, 11] {
            let sub = dib.clone_rect(&Rect::new(left, 0, 20, 2)).unwrap().unwrap();
            for x in 0..sub.width() {
                assert_eq!(
                    sub.pixel_argb(x, 1),
                    dib.pixel_argb(x + left as u32, 1),
                    "left {left} x {x}"
                );
            }
        }
    }

    #[test]
    fn test_clone_rect_outside_and_full() {
        let dib = numbered(PixelFormat::PAL_8, 4, 4);
        assert!(dib.clone_rect(&Rect::new(4, 0, 8, 4)).unwrap().is_none());
        let full = dib.clone_rect(&Rect::new(-5, -5, 50, 50)).unwrap().unwrap();
        assert_eq!(full.buffer(), dib.buffer());
    }

    #[test]
    fn test_clone_rect_clips_alpha_plane() {
        let mut m = DibMut::new(4, 4, PixelFormat::CMYKA_32).unwrap();
        m.set_pixel_argb(3, 3, 0x20ff_ffff);
        let dib: Dib = m.into();
        let sub = dib.clone_rect(&Rect::new(2, 2, 4, 4)).unwrap().unwrap();
        let mask = sub.alpha_mask().unwrap();
        assert_eq!((mask.width(), mask.height()), (2, 2));
        assert_eq!(mask.scanline(1)[1], 0x20);
        assert_eq!(mask.scanline(0)[0], 0xff);
    }
}
