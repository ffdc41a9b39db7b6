//! Pixel format conversion
//!
//! [`convert_buffer`] converts a window of a source bitmap into a
//! caller-provided buffer of another format. Supported destinations are
//! `MASK_8`, `PAL_8`, `RGB_24`, `RGB_32` and `ARGB_32`; every source
//! format can be read.
//!
//! All channel arithmetic is integer with truncation. CMYK sources go
//! through [`color::cmyk_to_rgb`]; gray uses [`color::rgb_to_gray`].

pub mod quantize;

use crate::dib::{Dib, DibMut, get_bit};
use crate::error::{Error, Result};
use crate::format::{ChannelKind, PixelFormat};
use crate::palette::Palette;
use crate::color;
use quantize::pixel_rgb;
use tracing::debug;

/// Convert the `width x height` window of `src` at `(src_left, src_top)`
/// into `dest_buf`, laid out as `dest_format` rows of `dest_pitch` bytes.
///
/// Returns the palette the destination needs, if any: indexed output from
/// a palette source carries the source palette (CMYK entries converted),
/// and re-quantised RGB output carries the histogram palette. Gray output
/// returns `None` (the default gray ramp applies).
///
/// # Errors
///
/// - [`Error::InvalidParameter`] if the window leaves the source bounds
/// - [`Error::InvalidPitch`] if `dest_pitch` is below the minimum pitch
/// - [`Error::EmptyBuffer`] if `dest_buf` is shorter than `dest_pitch * height`
/// - [`Error::UnsupportedConversion`] for `MASK_1`, `PAL_1` and CMYK
///   destinations
#[allow(clippy::too_many_arguments)]
pub fn convert_buffer(
    dest_format: PixelFormat,
    dest_buf: &mut [u8],
    dest_pitch: usize,
    width: u32,
    height: u32,
    src: &Dib,
    src_left: u32,
    src_top: u32,
) -> Result<Option<Palette>> {
    let src_format = src.format();
    if src_left.checked_add(width).is_none_or(|r| r > src.width())
        || src_top.checked_add(height).is_none_or(|b| b > src.height())
    {
        return Err(Error::InvalidParameter(format!(
            "window {}x{} at ({}, {}) exceeds source {}x{}",
            width,
            height,
            src_left,
            src_top,
            src.width(),
            src.height()
        )));
    }
    let min_pitch = dest_format.min_pitch(width).unwrap_or(usize::MAX);
    if dest_pitch < min_pitch {
        return Err(Error::InvalidPitch {
            pitch: dest_pitch,
            width,
            format: dest_format,
        });
    }
    let needed = dest_pitch.saturating_mul(height as usize);
    if dest_buf.len() < needed {
        return Err(Error::EmptyBuffer {
            needed,
            actual: dest_buf.len(),
        });
    }
    if width == 0 || height == 0 {
        return Ok(None);
    }

    let window = Window {
        src,
        left: src_left as usize,
        top: src_top,
        width: width as usize,
        height,
        dest_pitch,
    };

    match (dest_format.kind(), dest_format.bpp()) {
        (ChannelKind::Mask, 8) => {
            window.to_gray(dest_buf);
            Ok(None)
        }
        (ChannelKind::Palette, 8) => {
            if src_format.bpp() <= 8 {
                match src.palette() {
                    Some(palette) => {
                        window.copy_indices(dest_buf);
                        Ok(Some(palette.to_argb_palette()))
                    }
                    None => {
                        window.to_gray(dest_buf);
                        Ok(None)
                    }
                }
            } else {
                window.requantize(dest_buf).map(Some)
            }
        }
        (ChannelKind::Rgb, _) | (ChannelKind::Argb, _) => {
            window.to_rgb(dest_buf, dest_format);
            Ok(None)
        }
        _ => Err(Error::UnsupportedConversion {
            src: src_format,
            dst: dest_format,
        }),
    }
}

struct Window<'a> {
    src: &'a Dib,
    left: usize,
    top: u32,
    width: usize,
    height: u32,
    dest_pitch: usize,
}

impl Window<'_> {
    fn rows<'b>(
        &'b self,
        dest_buf: &'b mut [u8],
    ) -> impl Iterator<Item = (&'b [u8], &'b mut [u8])> + 'b {
        dest_buf
            .chunks_mut(self.dest_pitch)
            .take(self.height as usize)
            .enumerate()
            .map(move |(y, dst)| (self.src.scanline(self.top + y as u32), dst))
    }

    fn to_gray(&self, dest_buf: &mut [u8]) {
        let src = self.src;
        let (left, width) = (self.left, self.width);
        match src.bpp() {
            1 => {
                let g0 = color::argb_to_gray(src.palette_argb(0));
                let g1 = color::argb_to_gray(src.palette_argb(1));
                for (scan, dst) in self.rows(dest_buf) {
                    for (x, out) in dst[..width].iter_mut().enumerate() {
                        *out = if get_bit(scan, left + x) { g1 } else { g0 };
                    }
                }
            }
            8 => match src.palette() {
                None => {
                    for (scan, dst) in self.rows(dest_buf) {
                        dst[..width].copy_from_slice(&scan[left..left + width]);
                    }
                }
                Some(palette) => {
                    let table = palette.to_gray_table();
                    for (scan, dst) in self.rows(dest_buf) {
                        for (out, &index) in dst[..width].iter_mut().zip(&scan[left..]) {
                            *out = table[usize::from(index)];
                        }
                    }
                }
            },
            _ => {
                let bytes_pp = src.format().bytes_per_pixel();
                let cmyk = src.format().is_cmyk();
                for (scan, dst) in self.rows(dest_buf) {
                    for (x, out) in dst[..width].iter_mut().enumerate() {
                        *out = color::argb_to_gray(pixel_rgb(scan, left + x, bytes_pp, cmyk));
                    }
                }
            }
        }
    }

    fn copy_indices(&self, dest_buf: &mut [u8]) {
        let (left, width) = (self.left, self.width);
        if self.src.bpp() == 1 {
            for (scan, dst) in self.rows(dest_buf) {
                for (x, out) in dst[..width].iter_mut().enumerate() {
                    *out = u8::from(get_bit(scan, left + x));
                }
            }
        } else {
            for (scan, dst) in self.rows(dest_buf) {
                dst[..width].copy_from_slice(&scan[left..left + width]);
            }
        }
    }

    fn requantize(&self, dest_buf: &mut [u8]) -> Result<Palette> {
        let quant = quantize::build_palette(
            self.src,
            self.left as u32,
            self.top,
            self.width as u32,
            self.height,
        )?;
        debug!(
            colors = quant.entries().len(),
            width = self.width,
            height = self.height,
            "re-quantised RGB window to 8 bpp"
        );
        let bytes_pp = self.src.format().bytes_per_pixel();
        let cmyk = self.src.format().is_cmyk();
        let (left, width) = (self.left, self.width);
        for (scan, dst) in self.rows(dest_buf) {
            for (x, out) in dst[..width].iter_mut().enumerate() {
                let rgb = pixel_rgb(scan, left + x, bytes_pp, cmyk);
                *out = quant.index_of(rgb).unwrap_or_default();
            }
        }
        Ok(quant.into_palette())
    }

    fn to_rgb(&self, dest_buf: &mut [u8], dest_format: PixelFormat) {
        let src = self.src;
        let (left, width) = (self.left, self.width);
        let n = dest_format.bytes_per_pixel();
        let keep_alpha =
            dest_format.kind() == ChannelKind::Argb && src.format().kind() == ChannelKind::Argb;

        let put = |dst: &mut [u8], x: usize, argb: u32| {
            let p = &mut dst[x * n..x * n + n];
            p[0] = color::blue(argb);
            p[1] = color::green(argb);
            p[2] = color::red(argb);
            if n == 4 {
                p[3] = if keep_alpha { color::alpha(argb) } else { 0xff };
            }
        };

        match src.bpp() {
            1 => {
                let c0 = src.palette_argb(0);
                let c1 = src.palette_argb(1);
                for (scan, dst) in self.rows(dest_buf) {
                    for x in 0..width {
                        put(dst, x, if get_bit(scan, left + x) { c1 } else { c0 });
                    }
                }
            }
            8 => {
                let table: Vec<u32> = (0..256).map(|i| src.palette_argb(i)).collect();
                for (scan, dst) in self.rows(dest_buf) {
                    for x in 0..width {
                        put(dst, x, table[usize::from(scan[left + x])]);
                    }
                }
            }
            _ => {
                let bytes_pp = src.format().bytes_per_pixel();
                let cmyk = src.format().is_cmyk();
                for (scan, dst) in self.rows(dest_buf) {
                    for x in 0..width {
                        let mut argb = pixel_rgb(scan, left + x, bytes_pp, cmyk);
                        if keep_alpha {
                            argb |= u32::from(scan[(left + x) * 4 + 3]) << 24;
                        }
                        put(dst, x, argb);
                    }
                }
            }
        }
    }
}

impl Dib {
    /// Copy of the bitmap in another format.
    ///
    /// The same format yields a byte-identical [`deep_clone`](Dib::deep_clone).
    /// Otherwise the pixels go through [`convert_buffer`] and the output
    /// palette is attached. An alpha plane is folded into the alpha byte of
    /// `ARGB_32` output and carried over as a plane for other non-mask
    /// outputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedConversion`] for destinations
    /// [`convert_buffer`] cannot produce.
    pub fn clone_convert(&self, format: PixelFormat) -> Result<Dib> {
        if format == self.format() {
            return Ok(self.deep_clone());
        }
        let mut out = DibMut::new(self.width(), self.height(), format)?;
        let pitch = out.pitch();
        let palette = convert_buffer(
            format,
            out.buffer_mut(),
            pitch,
            self.width(),
            self.height(),
            self,
            0,
            0,
        )?;
        out.set_palette(palette)?;

        if let Some(mask) = self.alpha_mask() {
            if format.kind() == ChannelKind::Argb {
                for y in 0..self.height() {
                    let alpha = mask.scanline(y);
                    let dst = out.scanline_mut(y);
                    for (x, &a) in alpha.iter().take(self.width() as usize).enumerate() {
                        dst[x * 4 + 3] = a;
                    }
                }
            } else if !format.is_mask() {
                out.set_alpha_mask(Some(mask.deep_clone()))?;
            }
        }
        Ok(out.into())
    }
}
