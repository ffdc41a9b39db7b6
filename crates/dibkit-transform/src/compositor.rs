//! Compositing scanlines onto a destination bitmap
//!
//! [`BitmapComposer`] is the device-facing [`ScanlineComposer`]: instead
//! of storing rows it blends them source-over into an existing RGB or
//! ARGB bitmap at a given position, clipped to a rectangle.

use crate::composer::ScanlineComposer;
use crate::error::{TransformError, TransformResult};
use dibkit_core::{ChannelKind, DibMut, Palette, PixelFormat, Rect, color};

/// Blends incoming rows into a caller-owned `RGB_24`, `RGB_32` or
/// `ARGB_32` bitmap
///
/// Row alpha (intrinsic or from the alpha argument) is multiplied by a
/// global `bitmap_alpha`. Mask rows paint `mask_color` with the mask value
/// as coverage.
pub struct BitmapComposer<'a> {
    dest: &'a mut DibMut,
    left: i32,
    top: i32,
    clip: Rect,
    bitmap_alpha: u8,
    mask_color: u32,
    src_format: Option<PixelFormat>,
    src_palette: [u32; 256],
    width: i32,
}

impl<'a> BitmapComposer<'a> {
    /// Composite into `dest` with the incoming origin at `(left, top)`.
    ///
    /// `clip` (in `dest` coordinates) defaults to the whole bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidParameters`] if `dest` is not an
    /// RGB or ARGB bitmap.
    pub fn new(
        dest: &'a mut DibMut,
        left: i32,
        top: i32,
        clip: Option<Rect>,
        bitmap_alpha: u8,
        mask_color: u32,
    ) -> TransformResult<Self> {
        if !matches!(dest.format().kind(), ChannelKind::Rgb | ChannelKind::Argb) {
            return Err(TransformError::InvalidParameters(format!(
                "cannot composite into {}",
                dest.format()
            )));
        }
        let bounds = Rect::from_size(dest.width() as i32, dest.height() as i32);
        let clip = match clip {
            Some(c) => bounds.intersect(&c).unwrap_or_default(),
            None => bounds,
        };
        Ok(Self {
            dest,
            left,
            top,
            clip,
            bitmap_alpha,
            mask_color,
            src_format: None,
            src_palette: [0; 256],
            width: 0,
        })
    }

    fn source_pixel(&self, format: PixelFormat, scan: &[u8], x: usize) -> (u32, u8, u8, u8) {
        match format.kind() {
            ChannelKind::Mask => {
                let (a, r, g, b) = color::decode_argb(self.mask_color);
                (u32::from(a) * u32::from(scan[x]) / 255, r, g, b)
            }
            ChannelKind::Palette => {
                let (a, r, g, b) = color::decode_argb(self.src_palette[usize::from(scan[x])]);
                (u32::from(a), r, g, b)
            }
            ChannelKind::Rgb => {
                let n = format.bytes_per_pixel();
                let p = &scan[x * n..];
                (255, p[2], p[1], p[0])
            }
            ChannelKind::Argb => {
                let p = &scan[x * 4..];
                (u32::from(p[3]), p[2], p[1], p[0])
            }
            ChannelKind::Cmyk | ChannelKind::Cmyka => {
                let p = &scan[x * 4..];
                let (r, g, b) = color::cmyk_to_rgb(p[0], p[1], p[2], p[3]);
                (255, r, g, b)
            }
        }
    }
}

impl ScanlineComposer for BitmapComposer<'_> {
    fn set_info(
        &mut self,
        width: i32,
        _height: i32,
        format: PixelFormat,
        palette: Option<&Palette>,
    ) -> TransformResult<()> {
        if format.bpp() == 1 {
            return Err(TransformError::InvalidParameters(format!(
                "cannot composite {} rows",
                format
            )));
        }
        self.src_palette = match palette {
            Some(p) => p.to_argb_table(),
            None => Palette::gray_ramp(256)?.to_argb_table(),
        };
        self.src_format = Some(format);
        self.width = width;
        Ok(())
    }

    fn compose_scanline(&mut self, line: i32, scanline: &[u8], alpha: Option<&[u8]>) {
        let Some(format) = self.src_format else {
            return;
        };
        let y = self.top + line;
        if y < self.clip.top || y >= self.clip.bottom {
            return;
        }
        let dest_format = self.dest.format();
        let n = dest_format.bytes_per_pixel();
        let dest_has_alpha = dest_format.kind() == ChannelKind::Argb;

        let x_start = (self.clip.left - self.left).max(0);
        let x_end = (self.clip.right - self.left).min(self.width);
        for x in x_start..x_end {
            let xs = x as usize;
            let (mut a, r, g, b) = self.source_pixel(format, scanline, xs);
            if let Some(plane) = alpha {
                a = a * u32::from(plane[xs]) / 255;
            }
            a = a * u32::from(self.bitmap_alpha) / 255;
            if a == 0 {
                continue;
            }

            let dx = (self.left + x) as usize;
            let row = self.dest.scanline_mut(y as u32);
            let p = &mut row[dx * n..dx * n + n];
            if dest_has_alpha {
                let da = u32::from(p[3]);
                let back = da * (255 - a) / 255;
                let out_a = a + back;
                let mix = |src: u8, dst: u8| -> u8 {
                    ((u32::from(src) * a + u32::from(dst) * back) / out_a) as u8
                };
                p[0] = mix(b, p[0]);
                p[1] = mix(g, p[1]);
                p[2] = mix(r, p[2]);
                p[3] = out_a as u8;
            } else {
                let mix = |src: u8, dst: u8| -> u8 {
                    ((u32::from(src) * a + u32::from(dst) * (255 - a)) / 255) as u8
                };
                p[0] = mix(b, p[0]);
                p[1] = mix(g, p[1]);
                p[2] = mix(r, p[2]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(format: PixelFormat) -> DibMut {
        let mut d = DibMut::new(6, 4, format).unwrap();
        d.clear(0xffff_ffff);
        d
    }

    #[test]
    fn test_opaque_rows_with_offset_and_clip() {
        let mut dest = white(PixelFormat::RGB_24);
        {
            let mut c =
                BitmapComposer::new(&mut dest, 2, 1, Some(Rect::new(0, 0, 5, 2)), 255, 0).unwrap();
            c.set_info(2, 2, PixelFormat::RGB_24, None).unwrap();
            c.compose_scanline(0, &[0, 0, 255, 0, 0, 255], None);
            c.compose_scanline(1, &[0, 0, 255, 0, 0, 255], None);
        }
        assert_eq!(dest.pixel_argb(2, 1), Some(0xffff_0000));
        assert_eq!(dest.pixel_argb(3, 1), Some(0xffff_0000));
        assert_eq!(dest.pixel_argb(1, 1), Some(0xffff_ffff));
        // row 2 is outside the clip
        assert_eq!(dest.pixel_argb(2, 2), Some(0xffff_ffff));
    }

    #[test]
    fn test_alpha_plane_and_global_alpha() {
        let mut dest = white(PixelFormat::RGB_32);
        {
            let mut c = BitmapComposer::new(&mut dest, 0, 0, None, 255, 0).unwrap();
            c.set_info(2, 1, PixelFormat::RGB_24, None).unwrap();
            c.compose_scanline(0, &[0, 0, 0, 0, 0, 0], Some(&[255, 0]));
        }
        assert_eq!(dest.pixel_argb(0, 0), Some(0xff00_0000));
        assert_eq!(dest.pixel_argb(1, 0), Some(0xffff_ffff));

        let mut dest = white(PixelFormat::RGB_24);
        {
            let mut c = BitmapComposer::new(&mut dest, 0, 0, None, 0, 0).unwrap();
            c.set_info(1, 1, PixelFormat::RGB_24, None).unwrap();
            c.compose_scanline(0, &[0, 0, 0], None);
        }
        assert_eq!(dest.pixel_argb(0, 0), Some(0xffff_ffff));
    }

    #[test]
    fn test_mask_rows_paint_fill_color() {
        let mut dest = DibMut::new(2, 1, PixelFormat::ARGB_32).unwrap();
        {
            let mut c = BitmapComposer::new(&mut dest, 0, 0, None, 255, 0xff00_ff00).unwrap();
            c.set_info(2, 1, PixelFormat::MASK_8, None).unwrap();
            c.compose_scanline(0, &[255, 0], None);
        }
        assert_eq!(dest.pixel_argb(0, 0), Some(0xff00_ff00));
        assert_eq!(dest.pixel_argb(1, 0), Some(0x0000_0000));
    }

    #[test]
    fn test_rejects_indexed_destination() {
        let mut dest = DibMut::new(2, 2, PixelFormat::PAL_8).unwrap();
        assert!(BitmapComposer::new(&mut dest, 0, 0, None, 255, 0).is_err());
    }
}
