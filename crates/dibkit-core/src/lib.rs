//! dibkit-core - Device-independent bitmaps
//!
//! This crate provides the fundamental data structures of the dibkit
//! image pipeline:
//!
//! - [`Dib`] / [`DibMut`] - Packed, top-down bitmap (immutable / mutable)
//! - [`PixelFormat`] - Bit depth and channel interpretation
//! - [`Palette`] - Up to 256 ARGB or CMYK entries for indexed bitmaps
//! - [`Rect`] - Integer rectangle with exclusive right/bottom edges
//! - [`Matrix`] / [`FloatRect`] - 2-D affine transform and float rectangle
//! - [`convert_buffer`] - Conversion between pixel formats
//!
//! # See also
//!
//! `dibkit-transform` for resampling and affine transformation.

pub mod convert;
pub mod dib;
pub mod error;
pub mod format;
pub mod matrix;
pub mod palette;
pub mod rect;

pub use convert::{convert_buffer, quantize};
pub use dib::{Dib, DibMut, MAX_BUFFER_BYTES};
pub use error::{Error, Result};
pub use format::{ChannelKind, PixelFormat};
pub use matrix::{FloatRect, MAX_COORD, Matrix};
pub use palette::Palette;
pub use rect::Rect;

/// Packed colour values and channel conversions.
///
/// # Pixel format
///
/// ARGB values are packed as `0xAARRGGBB`; CMYK values as
/// `C << 24 | M << 16 | Y << 8 | K`. In bitmap memory the channels are
/// stored little-endian: B,G,R,A for ARGB and C,M,Y,K for CMYK.
pub mod color {
    /// Pack alpha, red, green and blue into an ARGB value.
    #[inline]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
        ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    /// Extract alpha from an ARGB value.
    #[inline]
    pub const fn alpha(argb: u32) -> u8 {
        (argb >> 24) as u8
    }

    /// Extract red from an ARGB value.
    #[inline]
    pub const fn red(argb: u32) -> u8 {
        (argb >> 16) as u8
    }

    /// Extract green from an ARGB value.
    #[inline]
    pub const fn green(argb: u32) -> u8 {
        (argb >> 8) as u8
    }

    /// Extract blue from an ARGB value.
    #[inline]
    pub const fn blue(argb: u32) -> u8 {
        argb as u8
    }

    /// Decompose an ARGB value into `(a, r, g, b)`.
    #[inline]
    pub const fn decode_argb(argb: u32) -> (u8, u8, u8, u8) {
        (alpha(argb), red(argb), green(argb), blue(argb))
    }

    /// Pack cyan, magenta, yellow and black into a CMYK value.
    #[inline]
    pub const fn cmyk(c: u8, m: u8, y: u8, k: u8) -> u32 {
        ((c as u32) << 24) | ((m as u32) << 16) | ((y as u32) << 8) | k as u32
    }

    /// Decompose a CMYK value into `(c, m, y, k)`.
    #[inline]
    pub const fn decode_cmyk(cmyk: u32) -> (u8, u8, u8, u8) {
        ((cmyk >> 24) as u8, (cmyk >> 16) as u8, (cmyk >> 8) as u8, cmyk as u8)
    }

    /// Convert CMYK to RGB with the fixed heuristic
    /// `r = (255 - c) * (255 - k) / 255` (likewise g from m, b from y).
    ///
    /// This is not colour-managed.
    #[inline]
    pub const fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> (u8, u8, u8) {
        let k_inv = 255 - k as u32;
        let r = (255 - c as u32) * k_inv / 255;
        let g = (255 - m as u32) * k_inv / 255;
        let b = (255 - y as u32) * k_inv / 255;
        (r as u8, g as u8, b as u8)
    }

    /// Convert a packed CMYK value to an opaque ARGB value.
    #[inline]
    pub const fn cmyk_to_argb(cmyk: u32) -> u32 {
        let (c, m, y, k) = decode_cmyk(cmyk);
        let (r, g, b) = cmyk_to_rgb(c, m, y, k);
        argb(0xff, r, g, b)
    }

    /// Luminance as `(r*30 + g*59 + b*11) / 100`.
    #[inline]
    pub const fn rgb_to_gray(r: u8, g: u8, b: u8) -> u8 {
        ((r as u32 * 30 + g as u32 * 59 + b as u32 * 11) / 100) as u8
    }

    /// Luminance of an ARGB value (alpha ignored).
    #[inline]
    pub const fn argb_to_gray(argb: u32) -> u8 {
        rgb_to_gray(red(argb), green(argb), blue(argb))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_argb_pack_unpack() {
            let v = argb(0x80, 0x11, 0x22, 0x33);
            assert_eq!(v, 0x8011_2233);
            assert_eq!(decode_argb(v), (0x80, 0x11, 0x22, 0x33));
        }

        #[test]
        fn test_cmyk_heuristic() {
            assert_eq!(cmyk_to_rgb(0, 0, 0, 0), (255, 255, 255));
            assert_eq!(cmyk_to_rgb(0, 0, 0, 255), (0, 0, 0));
            assert_eq!(cmyk_to_rgb(255, 0, 0, 0), (0, 255, 255));
            assert_eq!(cmyk_to_rgb(0, 128, 0, 0), (255, 127, 255));
            assert_eq!(cmyk_to_argb(cmyk(0, 0, 255, 0)), 0xffff_ff00);
        }

        #[test]
        fn test_gray() {
            assert_eq!(rgb_to_gray(255, 255, 255), 255);
            assert_eq!(rgb_to_gray(0, 0, 0), 0);
            assert_eq!(rgb_to_gray(255, 0, 0), 76);
            assert_eq!(rgb_to_gray(0, 255, 0), 150);
            assert_eq!(rgb_to_gray(0, 0, 255), 28);
            assert_eq!(argb_to_gray(0x00ff_ffff), 255);
        }
    }
}
