//! Palette re-quantisation
//!
//! Builds an 8 bpp palette for 24/32 bpp pixels from an exact colour
//! histogram. With at most 256 distinct colours the mapping is lossless;
//! beyond that the 256 most frequent colours form the palette and every
//! other colour maps to its nearest entry.

use crate::color;
use crate::dib::Dib;
use crate::error::Result;
use crate::palette::{Palette, rgb_distance_sq};
use std::collections::HashMap;

/// Palette built from a source window plus the colour-to-index mapping
#[derive(Debug, Clone)]
pub struct QuantizedPalette {
    palette: Palette,
    lookup: HashMap<u32, u8>,
}

impl QuantizedPalette {
    /// Opaque ARGB entries, most frequent colour first.
    pub fn entries(&self) -> &[u32] {
        self.palette.entries()
    }

    /// Palette index for a 24-bit `0xRRGGBB` colour seen in the source.
    ///
    /// Colours that were not in the histogram return `None`.
    pub fn index_of(&self, rgb: u32) -> Option<u8> {
        self.lookup.get(&(rgb & 0x00ff_ffff)).copied()
    }

    /// The palette itself.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Consume into the palette.
    pub fn into_palette(self) -> Palette {
        self.palette
    }
}

/// Read the colour of pixel `x` of a 24/32 bpp scanline as `0xRRGGBB`.
#[inline]
pub(crate) fn pixel_rgb(scan: &[u8], x: usize, bytes_pp: usize, cmyk: bool) -> u32 {
    let p = &scan[x * bytes_pp..];
    if cmyk {
        color::cmyk_to_argb(color::cmyk(p[0], p[1], p[2], p[3])) & 0x00ff_ffff
    } else {
        color::argb(0, p[2], p[1], p[0])
    }
}

/// Build the palette for the `width x height` window of `src` at
/// `(left, top)`.
///
/// Entries are ordered by descending frequency, ties by ascending colour
/// value. The caller guarantees the window lies inside `src` and that
/// `src` is 24 or 32 bpp.
pub fn build_palette(
    src: &Dib,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> Result<QuantizedPalette> {
    let bytes_pp = src.format().bytes_per_pixel();
    let cmyk = src.format().is_cmyk();

    let mut histogram: HashMap<u32, u32> = HashMap::new();
    for row in top..top + height {
        let scan = src.scanline(row);
        for x in left as usize..(left + width) as usize {
            *histogram.entry(pixel_rgb(scan, x, bytes_pp, cmyk)).or_insert(0) += 1;
        }
    }

    let mut colors: Vec<(u32, u32)> = histogram.into_iter().collect();
    colors.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let kept = colors.len().min(Palette::MAX_ENTRIES);
    let palette: Vec<u32> = colors[..kept]
        .iter()
        .map(|&(rgb, _)| 0xff00_0000 | rgb)
        .collect();

    let mut lookup = HashMap::with_capacity(colors.len());
    for (index, &(rgb, _)) in colors[..kept].iter().enumerate() {
        lookup.insert(rgb, index as u8);
    }
    for &(rgb, _) in &colors[kept..] {
        lookup.insert(rgb, nearest(&palette, rgb));
    }

    Ok(QuantizedPalette {
        palette: Palette::from_argb(palette)?,
        lookup,
    })
}

fn nearest(palette: &[u32], rgb: u32) -> u8 {
    let (_, r, g, b) = color::decode_argb(rgb);
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (i, &entry) in palette.iter().enumerate() {
        let dist = rgb_distance_sq(r, g, b, entry);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DibMut, PixelFormat};

    #[test]
    fn test_few_colors_exact_and_ordered() {
        let mut m = DibMut::new(4, 1, PixelFormat::RGB_24).unwrap();
        m.set_pixel_argb(0, 0, 0xff00_00ff);
        m.set_pixel_argb(1, 0, 0xffff_0000);
        m.set_pixel_argb(2, 0, 0xffff_0000);
        m.set_pixel_argb(3, 0, 0xff00_ff00);
        let dib: Dib = m.into();
        let q = build_palette(&dib, 0, 0, 4, 1).unwrap();
        assert_eq!(q.entries(), &[0xffff_0000, 0xff00_00ff, 0xff00_ff00]);
        assert_eq!(q.index_of(0xff_0000), Some(0));
        assert_eq!(q.index_of(0x00_00ff), Some(1));
        assert_eq!(q.index_of(0x12_3456), None);
    }

    #[test]
    fn test_window_only() {
        let mut m = DibMut::new(3, 2, PixelFormat::RGB_32).unwrap();
        m.clear(0xff10_2030);
        m.set_pixel_argb(0, 0, 0xffff_ffff);
        let dib: Dib = m.into();
        let q = build_palette(&dib, 1, 0, 2, 2).unwrap();
        assert_eq!(q.entries(), &[0xff10_2030]);
    }

    #[test]
    fn test_nearest_first_minimum() {
        let palette = [0xff00_0000, 0xff02_0000, 0xff00_0002];
        assert_eq!(nearest(&palette, 0x01_0000), 0);
        assert_eq!(nearest(&palette, 0x00_0002), 2);
    }
}
