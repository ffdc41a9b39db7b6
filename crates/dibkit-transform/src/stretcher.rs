//! Stretching a bitmap to a new size
//!
//! [`ImageStretcher`] chooses the output format, announces it to the
//! composer and either runs a [`StretchEngine`] or, with
//! `interpolate_downsample`, a quick nearest-neighbour pass.
//!
//! # Output formats
//!
//! | source               | output                         |
//! |----------------------|--------------------------------|
//! | `MASK_1`             | `MASK_8`                       |
//! | `PAL_1`              | `PAL_8`, palette interpolated  |
//! | `PAL_8` with palette | `RGB_24`                       |
//! | anything else        | unchanged                      |

use crate::composer::ScanlineComposer;
use crate::error::TransformResult;
use crate::options::ResampleOptions;
use crate::pause::{PAUSE_CHECK_ROWS, PauseIndicator};
use crate::stretch_engine::{StretchEngine, dest_bounds};
use dibkit_core::{ChannelKind, Dib, Palette, PixelFormat, Rect, color};
use tracing::{debug, trace};

/// Sources with fewer pixels than this are stretched to completion inside
/// [`ImageStretcher::start`].
pub const MAX_PROGRESSIVE_PIXELS: u64 = 1_000_000;

/// Output format and palette of a stretch of `source`.
pub fn stretched_format(source: &Dib) -> (PixelFormat, Option<Palette>) {
    let format = source.format();
    match (format.bpp(), format.kind()) {
        (1, ChannelKind::Mask) => (PixelFormat::MASK_8, None),
        (1, ChannelKind::Palette) => {
            let palette = source
                .palette()
                .map(|_| Palette::interpolated(source.palette_argb(0), source.palette_argb(1)));
            (PixelFormat::PAL_8, palette)
        }
        (8, ChannelKind::Palette) if source.palette().is_some() => (PixelFormat::RGB_24, None),
        _ => (format, source.palette().cloned()),
    }
}

/// Resumable stretch of one bitmap into a [`ScanlineComposer`]
///
/// # Examples
///
/// ```
/// use dibkit_core::{DibMut, PixelFormat, Rect};
/// use dibkit_transform::{BitmapStorer, ImageStretcher, ResampleOptions};
///
/// let source = DibMut::new(8, 8, PixelFormat::RGB_24).unwrap().into();
/// let mut stretcher = ImageStretcher::new(
///     &source,
///     4,
///     4,
///     &Rect::from_size(4, 4),
///     &ResampleOptions::default(),
/// );
/// let mut storer = BitmapStorer::new();
/// let mut more = stretcher.start(&mut storer).unwrap();
/// while more {
///     more = stretcher.continue_(None, &mut storer).unwrap();
/// }
/// let dib = storer.take_bitmap().unwrap().unwrap();
/// assert_eq!((dib.width(), dib.height()), (4, 4));
/// ```
pub struct ImageStretcher {
    source: Dib,
    dest_width: i32,
    dest_height: i32,
    clip: Rect,
    options: ResampleOptions,
    dest_format: PixelFormat,
    dest_palette: Option<Palette>,
    engine: Option<StretchEngine>,
    quick: Option<QuickStretch>,
}

impl ImageStretcher {
    /// Prepare a stretch of `source` to `dest_width × dest_height`
    /// (negative values mirror), limited to `clip` in destination
    /// coordinates.
    pub fn new(
        source: &Dib,
        dest_width: i32,
        dest_height: i32,
        clip: &Rect,
        options: &ResampleOptions,
    ) -> Self {
        let (dest_format, dest_palette) = stretched_format(source);
        Self {
            source: source.clone(),
            dest_width,
            dest_height,
            clip: *clip,
            options: *options,
            dest_format,
            dest_palette,
            engine: None,
            quick: None,
        }
    }

    /// Format announced to the composer.
    pub fn dest_format(&self) -> PixelFormat {
        self.dest_format
    }

    /// Palette announced to the composer.
    pub fn dest_palette(&self) -> Option<&Palette> {
        self.dest_palette.as_ref()
    }

    /// Announce the output and start stretching.
    ///
    /// Returns `true` if [`continue_`](Self::continue_) must be called to
    /// finish; `false` when the output is complete or empty.
    pub fn start(&mut self, composer: &mut dyn ScanlineComposer) -> TransformResult<bool> {
        if self.dest_width == 0 || self.dest_height == 0 {
            return Ok(false);
        }
        let bounds = dest_bounds(self.dest_width, self.dest_height)?;
        let Some(clip) = bounds.intersect(&self.clip).filter(|c| !c.is_empty()) else {
            return Ok(false);
        };
        self.clip = clip;
        composer.set_info(
            clip.width(),
            clip.height(),
            self.dest_format,
            self.dest_palette.as_ref(),
        )?;

        let pixels = u64::from(self.source.width()) * u64::from(self.source.height());
        if self.options.interpolate_downsample {
            debug!(
                dest_width = self.dest_width,
                dest_height = self.dest_height,
                "quick downsample"
            );
            self.quick = Some(self.prepare_quick());
        } else {
            let mut engine = StretchEngine::new(
                self.dest_format,
                self.dest_width,
                self.dest_height,
                &clip,
                &self.source,
                &self.options,
            )?;
            if !engine.start_stretch_horz()? {
                return Ok(false);
            }
            self.engine = Some(engine);
        }

        if pixels < MAX_PROGRESSIVE_PIXELS {
            return self.continue_(None, composer);
        }
        Ok(true)
    }

    /// Resume a stretch started with [`start`](Self::start).
    ///
    /// Returns `true` while more work remains.
    pub fn continue_(
        &mut self,
        pause: Option<&mut dyn PauseIndicator>,
        composer: &mut dyn ScanlineComposer,
    ) -> TransformResult<bool> {
        if let Some(mut quick) = self.quick.take() {
            let more = self.stretch_quick(&mut quick, pause, composer);
            if more {
                self.quick = Some(quick);
            }
            return Ok(more);
        }
        let Some(engine) = self.engine.as_mut() else {
            return Ok(false);
        };
        let more = engine.continue_(pause, composer)?;
        if !more {
            self.engine = None;
        }
        Ok(more)
    }

    fn prepare_quick(&self) -> QuickStretch {
        let expand = self.source.format().is_palette() && self.dest_format.kind() == ChannelKind::Rgb;
        let palette = if expand {
            self.source.palette().map(Palette::to_argb_table)
        } else {
            None
        };
        let columns = (self.clip.left..self.clip.right)
            .map(|x| nearest_source(x, self.dest_width, self.source.width()))
            .collect();
        QuickStretch {
            columns,
            palette,
            next_row: self.clip.top,
        }
    }

    /// Emit quick-path rows from `quick.next_row` on; `true` when paused.
    fn stretch_quick(
        &self,
        quick: &mut QuickStretch,
        mut pause: Option<&mut dyn PauseIndicator>,
        composer: &mut dyn ScanlineComposer,
    ) -> bool {
        let src_format = self.source.format();
        let src_bytes = src_format.bytes_per_pixel();
        let dest_bytes = self.dest_format.bytes_per_pixel();
        let plane = match src_format.kind() {
            ChannelKind::Argb => None,
            _ => self.source.alpha_mask(),
        };

        let width = quick.columns.len();
        let mut line = vec![0u8; width * dest_bytes];
        let mut alpha_line = vec![0u8; if plane.is_some() { width } else { 0 }];

        let mut rows = 0usize;
        while quick.next_row < self.clip.bottom {
            if rows > 0
                && rows % PAUSE_CHECK_ROWS == 0
                && let Some(p) = pause.as_deref_mut()
                && p.need_to_pause()
            {
                trace!(row = quick.next_row, "quick downsample paused");
                return true;
            }
            let dest_y = quick.next_row;
            let src_y = nearest_source(dest_y, self.dest_height, self.source.height()) as u32;
            let scan = self.source.scanline(src_y);
            for (i, &src_x) in quick.columns.iter().enumerate() {
                let out = &mut line[i * dest_bytes..][..dest_bytes];
                if src_format.bpp() == 1 {
                    let on = (scan[src_x >> 3] >> (7 - (src_x & 7))) & 1 != 0;
                    out[0] = if on { 0xff } else { 0 };
                } else if let Some(table) = &quick.palette {
                    let (_, r, g, b) = color::decode_argb(table[usize::from(scan[src_x])]);
                    out.copy_from_slice(&[b, g, r]);
                } else {
                    out.copy_from_slice(&scan[src_x * src_bytes..][..src_bytes]);
                }
            }
            let alpha = match plane {
                Some(mask) => {
                    let row = mask.scanline(src_y);
                    for (a, &src_x) in alpha_line.iter_mut().zip(&quick.columns) {
                        *a = row[src_x];
                    }
                    Some(alpha_line.as_slice())
                }
                None => None,
            };
            composer.compose_scanline(dest_y - self.clip.top, &line, alpha);
            quick.next_row += 1;
            rows += 1;
        }
        false
    }
}

/// Row cursor and column map of a nearest-neighbour stretch
struct QuickStretch {
    columns: Vec<usize>,
    palette: Option<[u32; 256]>,
    next_row: i32,
}

/// Source pixel sampled for destination pixel `dest` of a `dest_len` axis.
fn nearest_source(dest: i32, dest_len: i32, src_len: u32) -> usize {
    let src_len = i64::from(src_len);
    let pos = i64::from(dest) * src_len / i64::from(dest_len.unsigned_abs());
    let pos = if dest_len < 0 { src_len - pos - 1 } else { pos };
    pos.clamp(0, src_len - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::BitmapStorer;
    use dibkit_core::DibMut;

    #[test]
    fn test_stretched_format() {
        let mask: Dib = DibMut::new(4, 4, PixelFormat::MASK_1).unwrap().into();
        assert_eq!(stretched_format(&mask), (PixelFormat::MASK_8, None));

        let mut pal1 = DibMut::new(4, 4, PixelFormat::PAL_1).unwrap();
        pal1.set_palette(Some(
            Palette::from_argb(vec![0xffff_0000, 0xff00_00ff]).unwrap(),
        ))
        .unwrap();
        let (format, palette) = stretched_format(&pal1.into());
        assert_eq!(format, PixelFormat::PAL_8);
        let palette = palette.unwrap();
        assert_eq!(palette.len(), 256);
        assert_eq!(palette.argb(0), Some(0xffff_0000));
        assert_eq!(palette.argb(255), Some(0xff00_00ff));

        let gray: Dib = DibMut::new(4, 4, PixelFormat::PAL_8).unwrap().into();
        assert_eq!(stretched_format(&gray), (PixelFormat::PAL_8, None));

        let mut pal8 = DibMut::new(4, 4, PixelFormat::PAL_8).unwrap();
        pal8.set_palette(Some(Palette::gray_ramp(16).unwrap()))
            .unwrap();
        assert_eq!(stretched_format(&pal8.into()).0, PixelFormat::RGB_24);

        let argb: Dib = DibMut::new(4, 4, PixelFormat::ARGB_32).unwrap().into();
        assert_eq!(stretched_format(&argb).0, PixelFormat::ARGB_32);
    }

    #[test]
    fn test_zero_size_is_noop() {
        let source: Dib = DibMut::new(4, 4, PixelFormat::RGB_24).unwrap().into();
        let mut storer = BitmapStorer::new();
        let opts = ResampleOptions::default();
        let mut s = ImageStretcher::new(&source, 0, 4, &Rect::from_size(4, 4), &opts);
        assert!(!s.start(&mut storer).unwrap());
        let mut s = ImageStretcher::new(&source, 4, 4, &Rect::new(5, 5, 9, 9), &opts);
        assert!(!s.start(&mut storer).unwrap());
        assert!(storer.take_bitmap().unwrap().is_none());
    }

    #[test]
    fn test_quick_path_mirrored() {
        let mut d = DibMut::new(4, 2, PixelFormat::MASK_8).unwrap();
        d.scanline_mut(0)[..4].copy_from_slice(&[1, 2, 3, 4]);
        d.scanline_mut(1)[..4].copy_from_slice(&[5, 6, 7, 8]);
        let source: Dib = d.into();
        let mut storer = BitmapStorer::new();
        let mut s = ImageStretcher::new(
            &source,
            -2,
            -2,
            &Rect::from_size(2, 2),
            &ResampleOptions::downsample(),
        );
        assert!(!s.start(&mut storer).unwrap());
        let out = storer.take_bitmap().unwrap().unwrap();
        assert_eq!(&out.scanline(0)[..2], &[8, 6]);
        assert_eq!(&out.scanline(1)[..2], &[4, 2]);
    }

    #[test]
    fn test_quick_path_palette_and_alpha() {
        let mut d = DibMut::new(2, 1, PixelFormat::PAL_8).unwrap();
        d.set_palette(Some(
            Palette::from_argb(vec![0xff10_2030, 0xff40_5060]).unwrap(),
        ))
        .unwrap();
        d.scanline_mut(0)[..2].copy_from_slice(&[1, 0]);
        let mut mask = DibMut::new(2, 1, PixelFormat::MASK_8).unwrap();
        mask.scanline_mut(0)[..2].copy_from_slice(&[0x11, 0x22]);
        d.set_alpha_mask(Some(mask.into())).unwrap();
        let source: Dib = d.into();

        let mut storer = BitmapStorer::new();
        let mut s = ImageStretcher::new(
            &source,
            4,
            1,
            &Rect::from_size(4, 1),
            &ResampleOptions::downsample(),
        );
        s.start(&mut storer).unwrap();
        let out = storer.take_bitmap().unwrap().unwrap();
        assert_eq!(out.format(), PixelFormat::RGB_24);
        assert_eq!(&out.scanline(0)[..6], &[0x60, 0x50, 0x40, 0x60, 0x50, 0x40]);
        assert_eq!(
            &out.alpha_mask().unwrap().scanline(0)[..4],
            &[0x11, 0x11, 0x22, 0x22]
        );
    }

    #[test]
    fn test_large_source_is_resumable() {
        let source: Dib = DibMut::new(1000, 1000, PixelFormat::MASK_8).unwrap().into();
        let mut storer = BitmapStorer::new();
        let mut s = ImageStretcher::new(
            &source,
            10,
            10,
            &Rect::from_size(10, 10),
            &ResampleOptions::default(),
        );
        assert!(s.start(&mut storer).unwrap());
        let mut stop = || true;
        let mut calls = 0;
        while s.continue_(Some(&mut stop), &mut storer).unwrap() {
            calls += 1;
        }
        assert_eq!(calls, 99);
        let out = storer.take_bitmap().unwrap().unwrap();
        assert_eq!((out.width(), out.height()), (10, 10));
    }

    #[test]
    fn test_large_quick_stretch_is_resumable() {
        let mut d = DibMut::new(1200, 1000, PixelFormat::RGB_24).unwrap();
        for y in 0..1000u32 {
            for (x, px) in d.scanline_mut(y)[..3600].chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&[x as u8, y as u8, (x / 7) as u8]);
            }
        }
        let source: Dib = d.into();
        let clip = Rect::from_size(300, 250);
        let opts = ResampleOptions::downsample();

        let mut plain = BitmapStorer::new();
        let mut s = ImageStretcher::new(&source, 300, 250, &clip, &opts);
        assert!(s.start(&mut plain).unwrap());
        while s.continue_(None, &mut plain).unwrap() {}
        let plain = plain.take_bitmap().unwrap().unwrap();

        let mut paused = BitmapStorer::new();
        let mut s = ImageStretcher::new(&source, 300, 250, &clip, &opts);
        assert!(s.start(&mut paused).unwrap());
        let mut stop = || true;
        let mut calls = 0;
        while s.continue_(Some(&mut stop), &mut paused).unwrap() {
            calls += 1;
        }
        // 250 rows, a pause after every 10
        assert_eq!(calls, 24);
        let paused = paused.take_bitmap().unwrap().unwrap();
        assert_eq!(plain.buffer(), paused.buffer());
        assert_eq!(&paused.scanline(249)[..3], &source.scanline(996)[..3]);
    }
}
