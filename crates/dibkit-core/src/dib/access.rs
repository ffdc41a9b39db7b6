//! Pixel access
//!
//! Per-pixel decoding and encoding. These are convenience paths for tests
//! and diagnostics; bulk operations work on whole scanlines.

use super::{Dib, DibData, DibMut};
use crate::ChannelKind;
use crate::color;

/// Read bit `x` of a 1 bpp scanline (MSB first).
#[inline]
pub(crate) fn get_bit(scan: &[u8], x: usize) -> bool {
    scan[x / 8] & (0x80 >> (x % 8)) != 0
}

/// Write bit `x` of a 1 bpp scanline (MSB first).
#[inline]
pub(crate) fn set_bit(scan: &mut [u8], x: usize, on: bool) {
    let mask = 0x80 >> (x % 8);
    if on {
        scan[x / 8] |= mask;
    } else {
        scan[x / 8] &= !mask;
    }
}

impl DibData {
    fn pixel_argb(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let scan = self.scanline(y);
        let xs = x as usize;
        let argb = match self.format.kind() {
            ChannelKind::Mask => {
                let v = if self.format.bpp() == 1 {
                    if get_bit(scan, xs) { 0xff } else { 0 }
                } else {
                    scan[xs]
                };
                color::argb(0xff, v, v, v)
            }
            ChannelKind::Palette => {
                let index = if self.format.bpp() == 1 {
                    usize::from(get_bit(scan, xs))
                } else {
                    usize::from(scan[xs])
                };
                self.palette_argb(index)
            }
            ChannelKind::Rgb => {
                let p = &scan[xs * self.format.bytes_per_pixel()..];
                color::argb(0xff, p[2], p[1], p[0])
            }
            ChannelKind::Argb => {
                let p = &scan[xs * 4..];
                color::argb(p[3], p[2], p[1], p[0])
            }
            ChannelKind::Cmyk | ChannelKind::Cmyka => {
                let p = &scan[xs * 4..];
                color::cmyk_to_argb(color::cmyk(p[0], p[1], p[2], p[3]))
            }
        };
        match (&self.alpha_mask, self.format.kind()) {
            (Some(mask), kind) if kind != ChannelKind::Argb => {
                let a = mask.scanline(y)[xs];
                Some((argb & 0x00ff_ffff) | (u32::from(a) << 24))
            }
            _ => Some(argb),
        }
    }
}

impl Dib {
    /// Decoded ARGB value of one pixel.
    ///
    /// Masks read as opaque gray, palette indices are resolved, CMYK goes
    /// through the fixed CMYK heuristic and an alpha plane supplies the
    /// alpha byte. Returns `None` outside the bitmap.
    pub fn pixel_argb(&self, x: u32, y: u32) -> Option<u32> {
        self.inner.pixel_argb(x, y)
    }
}

impl DibMut {
    /// Decoded ARGB value of one pixel, see [`Dib::pixel_argb`].
    pub fn pixel_argb(&self, x: u32, y: u32) -> Option<u32> {
        self.inner.pixel_argb(x, y)
    }

    /// Write the nearest representation of `argb` at `(x, y)`.
    ///
    /// Masks store the gray value (1 bpp: set when gray >= 128), palette
    /// bitmaps store the nearest palette index, and the alpha plane (if
    /// any) receives the alpha byte. Out-of-range coordinates are ignored.
    pub fn set_pixel_argb(&mut self, x: u32, y: u32, argb: u32) {
        if x >= self.width() || y >= self.height() {
            return;
        }
        let format = self.format();
        let (a, r, g, b) = color::decode_argb(argb);
        let gray = color::rgb_to_gray(r, g, b);
        let index = match format.kind() {
            ChannelKind::Palette => match self.palette() {
                Some(p) => p.nearest_index(argb).unwrap_or(0),
                None if format.bpp() == 1 => usize::from(gray >= 128),
                None => usize::from(gray),
            },
            _ => 0,
        };
        let xs = x as usize;
        let scan = self.scanline_mut(y);
        match format.kind() {
            ChannelKind::Mask if format.bpp() == 1 => set_bit(scan, xs, gray >= 128),
            ChannelKind::Mask => scan[xs] = gray,
            ChannelKind::Palette if format.bpp() == 1 => set_bit(scan, xs, index != 0),
            ChannelKind::Palette => scan[xs] = index as u8,
            ChannelKind::Rgb => {
                let bpp = format.bytes_per_pixel();
                let p = &mut scan[xs * bpp..xs * bpp + bpp];
                p[0] = b;
                p[1] = g;
                p[2] = r;
                if bpp == 4 {
                    p[3] = 0xff;
                }
            }
            ChannelKind::Argb => {
                scan[xs * 4..xs * 4 + 4].copy_from_slice(&[b, g, r, a]);
            }
            ChannelKind::Cmyk | ChannelKind::Cmyka => {
                let (c, m, y, k) = rgb_to_cmyk(r, g, b);
                scan[xs * 4..xs * 4 + 4].copy_from_slice(&[c, m, y, k]);
            }
        }
        if format.kind() != ChannelKind::Argb {
            let width = self.width() as usize;
            let height = self.height() as usize;
            if let Some(plane) = self.alpha_mask_data_mut() {
                let pitch = plane.len() / height;
                debug_assert!(pitch >= width);
                plane[y as usize * pitch + xs] = a;
            }
        }
    }
}

/// Approximate inverse of [`color::cmyk_to_rgb`].
fn rgb_to_cmyk(r: u8, g: u8, b: u8) -> (u8, u8, u8, u8) {
    let max = r.max(g).max(b);
    if max == 0 {
        return (0, 0, 0, 255);
    }
    let k = 255 - max;
    let inv = |v: u8| -> u8 { (255 - u32::from(v) * 255 / u32::from(max)) as u8 };
    (inv(r), inv(g), inv(b), k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Palette, PixelFormat};

    #[test]
    fn test_bits() {
        let mut scan = [0u8; 2];
        set_bit(&mut scan, 0, true);
        set_bit(&mut scan, 9, true);
        assert_eq!(scan, [0x80, 0x40]);
        assert!(get_bit(&scan, 9));
        set_bit(&mut scan, 0, false);
        assert_eq!(scan[0], 0);
    }

    #[test]
    fn test_rgb_roundtrip() {
        for format in [PixelFormat::RGB_24, PixelFormat::RGB_32] {
            let mut dib = DibMut::new(3, 2, format).unwrap();
            dib.set_pixel_argb(2, 1, 0xff12_3456);
            assert_eq!(dib.pixel_argb(2, 1), Some(0xff12_3456));
            assert_eq!(dib.pixel_argb(3, 1), None);
        }
        let mut dib = DibMut::new(1, 1, PixelFormat::ARGB_32).unwrap();
        dib.set_pixel_argb(0, 0, 0x8012_3456);
        assert_eq!(dib.pixel_argb(0, 0), Some(0x8012_3456));
    }

    #[test]
    fn test_mask_and_palette_encoding() {
        let mut mask = DibMut::new(9, 1, PixelFormat::MASK_1).unwrap();
        mask.set_pixel_argb(8, 0, 0xffff_ffff);
        assert_eq!(mask.scanline(0)[1], 0x80);
        assert_eq!(mask.pixel_argb(8, 0), Some(0xffff_ffff));
        assert_eq!(mask.pixel_argb(7, 0), Some(0xff00_0000));

        let mut pal = DibMut::new(2, 1, PixelFormat::PAL_8).unwrap();
        pal.set_palette(Some(Palette::from_argb(vec![0xff00_0000, 0xffff_0000]).unwrap()))
            .unwrap();
        pal.set_pixel_argb(1, 0, 0xfff0_1010);
        assert_eq!(pal.scanline(0)[1], 1);
        assert_eq!(pal.pixel_argb(1, 0), Some(0xffff_0000));
    }

    #[test]
    fn test_cmyk_pixels() {
        let mut dib = DibMut::new(1, 1, PixelFormat::CMYK_32).unwrap();
        dib.set_pixel_argb(0, 0, 0xff00_00ff);
        assert_eq!(&dib.scanline(0)[..4], &[255, 255, 0, 0]);
        assert_eq!(dib.pixel_argb(0, 0), Some(0xff00_00ff));
    }

    #[test]
    fn test_alpha_plane_pixels() {
        let mut dib = DibMut::new(2, 2, PixelFormat::CMYKA_32).unwrap();
        dib.set_pixel_argb(1, 1, 0x40ff_ffff);
        assert_eq!(dib.pixel_argb(1, 1), Some(0x40ff_ffff));
        assert_eq!(dib.alpha_mask().unwrap().scanline(1)[1], 0x40);
        assert_eq!(dib.alpha_mask().unwrap().scanline(0)[0], 0xff);
    }
}
