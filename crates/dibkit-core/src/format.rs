//! Pixel formats
//!
//! A [`PixelFormat`] is a bit depth paired with a [`ChannelKind`]. Only a
//! fixed set of combinations exists; the named constants cover all of them.

use crate::error::{Error, Result};
use std::fmt;

/// How the bits of a pixel are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Coverage values, no colour
    Mask,
    /// Palette indices (gray ramp when no palette is attached)
    Palette,
    /// B,G,R bytes, optionally followed by a pad byte
    Rgb,
    /// B,G,R,A bytes
    Argb,
    /// C,M,Y,K bytes
    Cmyk,
    /// C,M,Y,K bytes plus a separate alpha plane
    Cmyka,
}

/// Pixel format of a [`Dib`](crate::Dib)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    bpp: u8,
    kind: ChannelKind,
}

impl PixelFormat {
    /// 1 bit per pixel coverage mask, MSB first
    pub const MASK_1: Self = Self::raw(1, ChannelKind::Mask);
    /// 8 bit coverage mask
    pub const MASK_8: Self = Self::raw(8, ChannelKind::Mask);
    /// 1 bit palette index
    pub const PAL_1: Self = Self::raw(1, ChannelKind::Palette);
    /// 8 bit palette index
    pub const PAL_8: Self = Self::raw(8, ChannelKind::Palette);
    /// B,G,R
    pub const RGB_24: Self = Self::raw(24, ChannelKind::Rgb);
    /// B,G,R,pad
    pub const RGB_32: Self = Self::raw(32, ChannelKind::Rgb);
    /// B,G,R,A
    pub const ARGB_32: Self = Self::raw(32, ChannelKind::Argb);
    /// C,M,Y,K
    pub const CMYK_32: Self = Self::raw(32, ChannelKind::Cmyk);
    /// C,M,Y,K with an alpha plane
    pub const CMYKA_32: Self = Self::raw(32, ChannelKind::Cmyka);

    const fn raw(bpp: u8, kind: ChannelKind) -> Self {
        Self { bpp, kind }
    }

    /// Build a format from a depth and a channel kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for combinations that do not exist,
    /// e.g. 24 bpp palette or 8 bpp RGB.
    pub fn new(bpp: u8, kind: ChannelKind) -> Result<Self> {
        let valid = match kind {
            ChannelKind::Mask | ChannelKind::Palette => matches!(bpp, 1 | 8),
            ChannelKind::Rgb => matches!(bpp, 24 | 32),
            ChannelKind::Argb | ChannelKind::Cmyk | ChannelKind::Cmyka => bpp == 32,
        };
        if valid {
            Ok(Self::raw(bpp, kind))
        } else {
            Err(Error::InvalidFormat { bpp, kind })
        }
    }

    /// Bits per pixel.
    #[inline]
    pub const fn bpp(self) -> u8 {
        self.bpp
    }

    /// Channel interpretation.
    #[inline]
    pub const fn kind(self) -> ChannelKind {
        self.kind
    }

    /// Whether the format itself carries alpha (ARGB or CMYKA).
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self.kind, ChannelKind::Argb | ChannelKind::Cmyka)
    }

    #[inline]
    pub const fn is_mask(self) -> bool {
        matches!(self.kind, ChannelKind::Mask)
    }

    #[inline]
    pub const fn is_palette(self) -> bool {
        matches!(self.kind, ChannelKind::Palette)
    }

    #[inline]
    pub const fn is_cmyk(self) -> bool {
        matches!(self.kind, ChannelKind::Cmyk | ChannelKind::Cmyka)
    }

    /// Whole bytes per pixel; 0 for 1 bpp formats.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.bpp as usize / 8
    }

    /// Number of colour components stored per pixel.
    ///
    /// Alpha is not counted, and the pad byte of `RGB_32` is not counted.
    pub const fn components(self) -> usize {
        match self.kind {
            ChannelKind::Mask | ChannelKind::Palette => 1,
            ChannelKind::Rgb | ChannelKind::Argb => 3,
            ChannelKind::Cmyk | ChannelKind::Cmyka => 4,
        }
    }

    /// Largest palette a bitmap of this format may carry.
    pub const fn max_palette_len(self) -> usize {
        if self.is_palette() { 1 << self.bpp } else { 0 }
    }

    /// Minimum row pitch in bytes for `width` pixels, rounded up to a
    /// multiple of 4.
    ///
    /// Returns `None` if the computation overflows.
    pub fn min_pitch(self, width: u32) -> Option<usize> {
        let bits = u64::from(width).checked_mul(u64::from(self.bpp))?;
        let bytes = bits.div_ceil(8);
        let pitch = bytes.checked_add(3)? / 4 * 4;
        usize::try_from(pitch).ok()
    }

    /// Format produced when this format is stretched.
    ///
    /// 1 bpp formats widen to 8 bpp so that resampled edges keep their
    /// intermediate values. Palette expansion to RGB depends on whether a
    /// palette is attached and is decided by the stretcher.
    pub const fn widened(self) -> Self {
        match (self.bpp, self.kind) {
            (1, ChannelKind::Mask) => Self::MASK_8,
            (1, ChannelKind::Palette) => Self::PAL_8,
            _ => self,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            ChannelKind::Mask => "MASK",
            ChannelKind::Palette => "PAL",
            ChannelKind::Rgb => "RGB",
            ChannelKind::Argb => "ARGB",
            ChannelKind::Cmyk => "CMYK",
            ChannelKind::Cmyka => "CMYKA",
        };
        write!(f, "{}_{}", name, self.bpp)
    }
}
