//! Palette - Colour table for indexed bitmaps
//!
//! A palette maps the indices of `PAL_1` / `PAL_8` bitmaps to colours.
//! Entries are either ARGB (`0xAARRGGBB`) or, for CMYK images, packed
//! CMYK values. An indexed bitmap without a palette reads as a gray ramp.

use crate::color;
use crate::error::{Error, Result};

/// Colour table for indexed bitmaps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<u32>,
    cmyk: bool,
}

impl Palette {
    /// Maximum number of entries of any palette
    pub const MAX_ENTRIES: usize = 256;

    /// Create a palette of ARGB entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteTooLarge`] for more than 256 entries.
    pub fn from_argb(entries: Vec<u32>) -> Result<Self> {
        Self::with_entries(entries, false)
    }

    /// Create a palette of packed CMYK entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteTooLarge`] for more than 256 entries.
    pub fn from_cmyk(entries: Vec<u32>) -> Result<Self> {
        Self::with_entries(entries, true)
    }

    fn with_entries(entries: Vec<u32>, cmyk: bool) -> Result<Self> {
        if entries.len() > Self::MAX_ENTRIES {
            return Err(Error::PaletteTooLarge {
                len: entries.len(),
                max: Self::MAX_ENTRIES,
            });
        }
        Ok(Self { entries, cmyk })
    }

    /// Create an opaque gray ramp from black to white with `len` entries.
    ///
    /// A single-entry ramp is black.
    pub fn gray_ramp(len: usize) -> Result<Self> {
        let entries = (0..len)
            .map(|i| {
                let v = if len > 1 { (i * 255 / (len - 1)) as u8 } else { 0 };
                color::argb(0xff, v, v, v)
            })
            .collect();
        Self::from_argb(entries)
    }

    /// Create a 256-entry ARGB ramp running from `from` to `to`.
    ///
    /// Each channel is interpolated independently as
    /// `from + (to - from) * i / 255`.
    pub fn interpolated(from: u32, to: u32) -> Self {
        let (a0, r0, g0, b0) = color::decode_argb(from);
        let (a1, r1, g1, b1) = color::decode_argb(to);
        let lerp = |c0: u8, c1: u8, i: i32| -> u8 {
            (i32::from(c0) + (i32::from(c1) - i32::from(c0)) * i / 255) as u8
        };
        let entries = (0..256)
            .map(|i| {
                color::argb(
                    lerp(a0, a1, i),
                    lerp(r0, r1, i),
                    lerp(g0, g1, i),
                    lerp(b0, b1, i),
                )
            })
            .collect();
        Self {
            entries,
            cmyk: false,
        }
    }

    /// Get the number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether entries are packed CMYK values
    #[inline]
    pub fn is_cmyk(&self) -> bool {
        self.cmyk
    }

    /// Raw entries, ARGB or CMYK depending on [`is_cmyk`](Self::is_cmyk)
    #[inline]
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Get a raw entry by index
    pub fn get(&self, index: usize) -> Option<u32> {
        self.entries.get(index).copied()
    }

    /// Get an entry as ARGB, converting CMYK entries.
    pub fn argb(&self, index: usize) -> Option<u32> {
        self.get(index).map(|v| {
            if self.cmyk {
                color::cmyk_to_argb(v)
            } else {
                v
            }
        })
    }

    /// All 256 possible indices resolved to ARGB.
    ///
    /// Indices beyond the palette fall back to the 8 bpp gray ramp.
    pub fn to_argb_table(&self) -> [u32; 256] {
        let mut table = [0u32; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = self.argb(i).unwrap_or_else(|| {
                let v = i as u8;
                color::argb(0xff, v, v, v)
            });
        }
        table
    }

    /// All 256 possible indices resolved to gray values.
    pub fn to_gray_table(&self) -> [u8; 256] {
        let argb = self.to_argb_table();
        let mut table = [0u8; 256];
        for (slot, &v) in table.iter_mut().zip(argb.iter()) {
            *slot = color::argb_to_gray(v);
        }
        table
    }

    /// Copy of this palette with every entry converted to ARGB.
    pub fn to_argb_palette(&self) -> Self {
        Self {
            entries: (0..self.len()).filter_map(|i| self.argb(i)).collect(),
            cmyk: false,
        }
    }

    /// Index of the entry closest to `argb` by squared RGB distance.
    ///
    /// Ties resolve to the lowest index. Returns `None` for an empty palette.
    pub fn nearest_index(&self, argb: u32) -> Option<usize> {
        let (_, r, g, b) = color::decode_argb(argb);
        (0..self.len())
            .filter_map(|i| self.argb(i).map(|e| (i, e)))
            .min_by_key(|&(i, e)| (rgb_distance_sq(r, g, b, e), i))
            .map(|(i, _)| i)
    }
}

/// Squared Euclidean distance between an RGB triple and an ARGB value.
pub(crate) fn rgb_distance_sq(r: u8, g: u8, b: u8, argb: u32) -> u32 {
    let dr = i32::from(r) - i32::from(color::red(argb));
    let dg = i32::from(g) - i32::from(color::green(argb));
    let db = i32::from(b) - i32::from(color::blue(argb));
    (dr * dr + dg * dg + db * db) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_ramp() {
        let pal = Palette::gray_ramp(2).unwrap();
        assert_eq!(pal.entries(), &[0xff00_0000, 0xffff_ffff]);
        let pal = Palette::gray_ramp(256).unwrap();
        assert_eq!(pal.get(128), Some(0xff80_8080));
        assert!(Palette::gray_ramp(257).is_err());
    }

    #[test]
    fn test_interpolated_endpoints() {
        let pal = Palette::interpolated(0xff00_0000, 0xffff_0080);
        assert_eq!(pal.len(), 256);
        assert_eq!(pal.get(0), Some(0xff00_0000));
        assert_eq!(pal.get(255), Some(0xffff_0080));
        assert_eq!(color::red(pal.get(128).unwrap()), 128);
    }

    #[test]
    fn test_cmyk_palette_resolves_to_argb() {
        let pal = Palette::from_cmyk(vec![color::cmyk(0, 0, 0, 0), color::cmyk(0, 0, 0, 255)])
            .unwrap();
        assert!(pal.is_cmyk());
        assert_eq!(pal.argb(0), Some(0xffff_ffff));
        assert_eq!(pal.argb(1), Some(0xff00_0000));
        let argb = pal.to_argb_palette();
        assert!(!argb.is_cmyk());
        assert_eq!(argb.entries(), &[0xffff_ffff, 0xff00_0000]);
    }

    #[test]
    fn test_tables_fill_missing_with_ramp() {
        let pal = Palette::from_argb(vec![0xffff_0000]).unwrap();
        let table = pal.to_argb_table();
        assert_eq!(table[0], 0xffff_0000);
        assert_eq!(table[200], 0xffc8_c8c8);
        let gray = pal.to_gray_table();
        assert_eq!(gray[0], 76);
        assert_eq!(gray[200], 200);
    }

    #[test]
    fn test_nearest_index_first_minimum() {
        let pal = Palette::from_argb(vec![0xff00_0000, 0xff10_1010, 0xff10_1010]).unwrap();
        assert_eq!(pal.nearest_index(0xff0f_0f0f), Some(1));
        assert_eq!(pal.nearest_index(0xff00_0001), Some(0));
        assert_eq!(Palette::from_argb(vec![]).unwrap().nearest_index(0), None);
    }
}
