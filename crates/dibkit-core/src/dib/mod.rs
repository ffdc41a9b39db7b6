//! DIB - Device-independent bitmap
//!
//! The [`Dib`] structure is the image container of dibkit. It holds a
//! packed, row-major, top-down pixel buffer in one of the
//! [`PixelFormat`]s, an optional [`Palette`] and an optional 8 bpp alpha
//! plane.
//!
//! # Pixel layout
//!
//! - Every row occupies `pitch` bytes; `pitch` is a multiple of 4 and at
//!   least `ceil(width * bpp / 8)`
//! - 1 bpp pixels are packed MSB first
//! - 24/32 bpp pixels store B,G,R(,A) or C,M,Y,K in increasing addresses
//!
//! # Ownership model
//!
//! `Dib` uses `Arc` for cheap cloning (shared ownership).
//! To modify pixel data, convert to `DibMut` via [`Dib::try_into_mut`]
//! or [`Dib::to_mut`], then convert back with `Into<Dib>`.

mod access;
mod clip;
mod flip;

pub(crate) use access::{get_bit, set_bit};

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::palette::Palette;
use crate::{ChannelKind, color};
use std::sync::Arc;

/// Allocation ceiling for a single pixel buffer, in bytes.
pub const MAX_BUFFER_BYTES: usize = 1 << 29;

/// Internal bitmap data
#[derive(Debug, Clone)]
struct DibData {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    palette: Option<Palette>,
    alpha_mask: Option<Dib>,
    buffer: Vec<u8>,
}

impl DibData {
    fn alloc(width: u32, height: u32, format: PixelFormat, pitch: Option<usize>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let min_pitch = format.min_pitch(width).ok_or(Error::SizeOverflow {
            requested: u64::MAX,
            limit: MAX_BUFFER_BYTES as u64,
        })?;
        let pitch = pitch.unwrap_or(min_pitch);
        if pitch < min_pitch || pitch % 4 != 0 {
            return Err(Error::InvalidPitch {
                pitch,
                width,
                format,
            });
        }
        let size = (pitch as u64) * u64::from(height);
        if size > MAX_BUFFER_BYTES as u64 {
            return Err(Error::SizeOverflow {
                requested: size,
                limit: MAX_BUFFER_BYTES as u64,
            });
        }

        let alpha_mask = if format.kind() == ChannelKind::Cmyka {
            let mut mask = DibData::alloc(width, height, PixelFormat::MASK_8, None)?;
            mask.buffer.fill(0xff);
            Some(Dib {
                inner: Arc::new(mask),
            })
        } else {
            None
        };

        Ok(DibData {
            width,
            height,
            pitch,
            format,
            palette: None,
            alpha_mask,
            buffer: vec![0; size as usize],
        })
    }

    fn deep_copy(&self) -> Self {
        DibData {
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            format: self.format,
            palette: self.palette.clone(),
            alpha_mask: self.alpha_mask.as_ref().map(Dib::deep_clone),
            buffer: self.buffer.clone(),
        }
    }

    fn scanline(&self, row: u32) -> &[u8] {
        let start = row as usize * self.pitch;
        &self.buffer[start..start + self.pitch]
    }

    fn palette_argb(&self, index: usize) -> u32 {
        if let Some(argb) = self.palette.as_ref().and_then(|p| p.argb(index)) {
            return argb;
        }
        if self.format.bpp() == 1 {
            if index == 0 { 0xff00_0000 } else { 0xffff_ffff }
        } else {
            let v = index as u8;
            color::argb(0xff, v, v, v)
        }
    }

    fn check_palette(&self, palette: &Palette) -> Result<()> {
        if !self.format.is_palette() {
            return Err(Error::PaletteNotAllowed(self.format));
        }
        let max = self.format.max_palette_len();
        if palette.len() > max {
            return Err(Error::PaletteTooLarge {
                len: palette.len(),
                max,
            });
        }
        Ok(())
    }

    fn check_alpha_mask(&self, mask: &Dib) -> Result<()> {
        if self.format.is_mask() || mask.format() != PixelFormat::MASK_8 {
            return Err(Error::InvalidParameter(format!(
                "alpha plane must be {} attached to a non-mask bitmap",
                PixelFormat::MASK_8
            )));
        }
        if mask.width() != self.width || mask.height() != self.height {
            return Err(Error::MaskSizeMismatch {
                expected: (self.width, self.height),
                actual: (mask.width(), mask.height()),
            });
        }
        Ok(())
    }
}

/// Immutable device-independent bitmap
///
/// Cloning is cheap (shares data via `Arc`). Use [`Dib::deep_clone`] for
/// an independent copy.
#[derive(Debug, Clone)]
pub struct Dib {
    inner: Arc<DibData>,
}

impl Dib {
    /// Create a new bitmap with a zeroed buffer and the minimum pitch.
    ///
    /// `CMYKA_32` bitmaps get a fully opaque alpha plane.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for a zero width or height and
    /// [`Error::SizeOverflow`] when the buffer would exceed
    /// [`MAX_BUFFER_BYTES`].
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        Ok(Dib {
            inner: Arc::new(DibData::alloc(width, height, format, None)?),
        })
    }

    /// Create a new bitmap with an explicit row pitch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPitch`] if `pitch` is smaller than the
    /// minimum pitch or not a multiple of 4.
    pub fn with_pitch(width: u32, height: u32, format: PixelFormat, pitch: usize) -> Result<Self> {
        Ok(Dib {
            inner: Arc::new(DibData::alloc(width, height, format, Some(pitch))?),
        })
    }

    /// Get the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the row pitch in bytes.
    #[inline]
    pub fn pitch(&self) -> usize {
        self.inner.pitch
    }

    /// Get the pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.inner.format
    }

    /// Get the bits per pixel.
    #[inline]
    pub fn bpp(&self) -> u8 {
        self.inner.format.bpp()
    }

    /// Get the palette, if any.
    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.inner.palette.as_ref()
    }

    /// Get the separate alpha plane, if any.
    #[inline]
    pub fn alpha_mask(&self) -> Option<&Dib> {
        self.inner.alpha_mask.as_ref()
    }

    /// Whether the bitmap carries alpha, intrinsically or as a plane.
    pub fn has_alpha(&self) -> bool {
        self.inner.format.kind() == ChannelKind::Argb || self.inner.alpha_mask.is_some()
    }

    /// Whether pixel colours are CMYK, directly or through a CMYK palette.
    pub fn is_cmyk_image(&self) -> bool {
        self.inner.format.is_cmyk()
            || (self.inner.format.is_palette()
                && self.inner.palette.as_ref().is_some_and(Palette::is_cmyk))
    }

    /// Whether the format is a coverage mask.
    #[inline]
    pub fn is_mask(&self) -> bool {
        self.inner.format.is_mask()
    }

    /// Get the raw pixel buffer.
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.inner.buffer
    }

    /// Get one row of the buffer, `pitch` bytes long.
    ///
    /// # Panics
    ///
    /// Panics if `row >= height`.
    #[inline]
    pub fn scanline(&self, row: u32) -> &[u8] {
        self.inner.scanline(row)
    }

    /// Palette entry `index` as ARGB.
    ///
    /// Without a palette, 1 bpp bitmaps read black/white and 8 bpp bitmaps
    /// read as a gray ramp.
    pub fn palette_argb(&self, index: usize) -> u32 {
        self.inner.palette_argb(index)
    }

    /// Check whether two bitmaps have the same dimensions.
    pub fn sizes_equal(&self, other: &Dib) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }

    /// Create a deep copy of this bitmap, including palette and alpha plane.
    ///
    /// Unlike `clone()` which shares data via Arc, this creates
    /// a completely independent copy.
    pub fn deep_clone(&self) -> Self {
        Dib {
            inner: Arc::new(self.inner.deep_copy()),
        }
    }

    /// Try to get mutable access to the bitmap data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<DibMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(DibMut { inner: data }),
            Err(arc) => Err(Dib { inner: arc }),
        }
    }

    /// Create a mutable copy of this bitmap.
    pub fn to_mut(&self) -> DibMut {
        DibMut {
            inner: self.inner.deep_copy(),
        }
    }

    /// Independent copy of the alpha plane.
    pub fn clone_alpha_mask(&self) -> Option<Dib> {
        self.inner.alpha_mask.as_ref().map(Dib::deep_clone)
    }

    /// Alpha of every pixel as a `MASK_8` bitmap.
    ///
    /// ARGB bitmaps yield their alpha bytes; bitmaps with an alpha plane
    /// yield a copy of it; all others yield `None`.
    pub fn extract_alpha(&self) -> Result<Option<Dib>> {
        if self.format().kind() == ChannelKind::Argb {
            let mut mask = DibMut::new(self.width(), self.height(), PixelFormat::MASK_8)?;
            for y in 0..self.height() {
                let src = self.scanline(y);
                let dst = mask.scanline_mut(y);
                for (x, out) in dst.iter_mut().take(self.width() as usize).enumerate() {
                    *out = src[x * 4 + 3];
                }
            }
            return Ok(Some(mask.into()));
        }
        Ok(self.clone_alpha_mask())
    }
}

/// Mutable device-independent bitmap
///
/// Allows modification of pixel data. Convert back to an immutable
/// [`Dib`] using `Into<Dib>`.
#[derive(Debug)]
pub struct DibMut {
    inner: DibData,
}

impl DibMut {
    /// Create a new zeroed mutable bitmap.
    ///
    /// # Errors
    ///
    /// Same as [`Dib::new`].
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        Ok(DibMut {
            inner: DibData::alloc(width, height, format, None)?,
        })
    }

    /// Get the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the row pitch in bytes.
    #[inline]
    pub fn pitch(&self) -> usize {
        self.inner.pitch
    }

    /// Get the pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.inner.format
    }

    /// Get the palette, if any.
    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.inner.palette.as_ref()
    }

    /// Get the separate alpha plane, if any.
    #[inline]
    pub fn alpha_mask(&self) -> Option<&Dib> {
        self.inner.alpha_mask.as_ref()
    }

    /// Get the raw pixel buffer.
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.inner.buffer
    }

    /// Get the raw pixel buffer mutably.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.inner.buffer
    }

    /// Get one row of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `row >= height`.
    #[inline]
    pub fn scanline(&self, row: u32) -> &[u8] {
        self.inner.scanline(row)
    }

    /// Get one row of the buffer mutably.
    ///
    /// # Panics
    ///
    /// Panics if `row >= height`.
    #[inline]
    pub fn scanline_mut(&mut self, row: u32) -> &mut [u8] {
        let start = row as usize * self.inner.pitch;
        let end = start + self.inner.pitch;
        &mut self.inner.buffer[start..end]
    }

    /// Palette entry `index` as ARGB, see [`Dib::palette_argb`].
    pub fn palette_argb(&self, index: usize) -> u32 {
        self.inner.palette_argb(index)
    }

    /// Attach or remove the palette.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteNotAllowed`] for non-palette formats and
    /// [`Error::PaletteTooLarge`] for more than `2^bpp` entries.
    pub fn set_palette(&mut self, palette: Option<Palette>) -> Result<()> {
        if let Some(p) = &palette {
            self.inner.check_palette(p)?;
        }
        self.inner.palette = palette;
        Ok(())
    }

    /// Attach or remove the alpha plane.
    ///
    /// # Errors
    ///
    /// The plane must be `MASK_8` with the same dimensions, and mask
    /// bitmaps cannot carry one.
    pub fn set_alpha_mask(&mut self, mask: Option<Dib>) -> Result<()> {
        if let Some(m) = &mask {
            self.inner.check_alpha_mask(m)?;
        }
        self.inner.alpha_mask = mask;
        Ok(())
    }

    /// Fill every pixel with the representation of `argb` in this format.
    pub fn clear(&mut self, argb: u32) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.set_pixel_argb(x, y, argb);
            }
        }
    }

    pub(crate) fn alpha_mask_data_mut(&mut self) -> Option<&mut Vec<u8>> {
        self.inner
            .alpha_mask
            .as_mut()
            .map(|m| &mut Arc::make_mut(&mut m.inner).buffer)
    }
}

impl From<DibMut> for Dib {
    fn from(dib: DibMut) -> Self {
        Dib {
            inner: Arc::new(dib.inner),
        }
    }
}
