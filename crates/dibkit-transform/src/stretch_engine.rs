//! Two-pass separable resampling
//!
//! [`StretchEngine`] resamples a source bitmap into a destination of any
//! size (negative sizes mirror the axis), producing only the rows and
//! columns inside a destination clip rectangle.
//!
//! # Algorithm
//!
//! 1. Horizontal pass: every source row inside the source clip is
//!    resampled to the destination clip width and stored in an
//!    intermediate buffer. This pass can pause every
//!    [`PAUSE_CHECK_ROWS`] rows.
//! 2. Vertical pass: every destination row is computed from the
//!    intermediate rows and handed to a [`ScanlineComposer`].
//!
//! Weighted sums are 16.16 fixed point. Pixels with alpha are weighted by
//! their coverage in both passes, so colour under transparent pixels does
//! not bleed into neighbours.

use crate::composer::ScanlineComposer;
use crate::error::{TransformError, TransformResult};
use crate::options::ResampleOptions;
use crate::pause::{PAUSE_CHECK_ROWS, PauseIndicator};
use crate::weight::{FIXED_ONE, PixelWeight, WeightTable};
use dibkit_core::{ChannelKind, Dib, MAX_BUFFER_BYTES, PixelFormat, Rect, color};
use tracing::{debug, trace, warn};

/// Per-pixel conversion performed while resampling
///
/// Selected from the source and destination formats when the engine is
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMethod {
    /// 1 bpp bits to 8 bpp coverage (0 or 255 before filtering)
    OneBppToEightBpp,
    /// 1 bpp bits to colour through the two palette entries
    OneBppToManyBpp,
    /// 8 bpp values filtered directly
    EightBppToEightBpp,
    /// 8 bpp values filtered with an alpha plane
    EightBppToEightBppWithAlpha,
    /// 8 bpp indices expanded to colour through the palette
    EightBppToManyBpp,
    /// 8 bpp indices expanded to colour, with an alpha plane
    EightBppToManyBppWithAlpha,
    /// Colour components filtered directly
    ManyBppToManyBpp,
    /// Colour components filtered with intrinsic or plane alpha
    ManyBppToManyBppWithAlpha,
}

impl TransformMethod {
    fn select(src: PixelFormat, has_alpha: bool, dest: PixelFormat) -> TransformResult<Self> {
        let unsupported = || {
            TransformError::Core(dibkit_core::Error::UnsupportedConversion { src, dst: dest })
        };
        if dest.bpp() == 1 {
            return Err(unsupported());
        }
        let dest_comps = dest.components();
        let method = match (src.bpp(), dest_comps) {
            (1, 1) => Self::OneBppToEightBpp,
            (1, 3) => Self::OneBppToManyBpp,
            (8, 1) if has_alpha => Self::EightBppToEightBppWithAlpha,
            (8, 1) => Self::EightBppToEightBpp,
            (8, 3) if has_alpha => Self::EightBppToManyBppWithAlpha,
            (8, 3) => Self::EightBppToManyBpp,
            (24 | 32, n) if n == src.components() && n > 1 => {
                if has_alpha {
                    Self::ManyBppToManyBppWithAlpha
                } else {
                    Self::ManyBppToManyBpp
                }
            }
            _ => return Err(unsupported()),
        };
        Ok(method)
    }

    /// Whether the method carries alpha through both passes.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::EightBppToEightBppWithAlpha
                | Self::EightBppToManyBppWithAlpha
                | Self::ManyBppToManyBppWithAlpha
        )
    }

    fn uses_palette(self) -> bool {
        matches!(
            self,
            Self::OneBppToManyBpp | Self::EightBppToManyBpp | Self::EightBppToManyBppWithAlpha
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Horizontal,
    Vertical,
    Done,
}

/// Resumable two-pass stretch of one bitmap
pub struct StretchEngine {
    state: State,
    method: TransformMethod,
    source: Dib,
    options: ResampleOptions,
    dest_format: PixelFormat,
    dest_width: i32,
    dest_height: i32,
    dest_clip: Rect,
    src_clip: Rect,
    /// Colour components per intermediate pixel
    dest_comps: usize,
    inter_pitch: usize,
    inter_buf: Vec<u8>,
    inter_alpha: Vec<u8>,
    palette: Box<[u32; 256]>,
    current_row: i32,
    weights_horz: Option<WeightTable>,
}

impl StretchEngine {
    /// Prepare a stretch of `source` to `dest_width × dest_height`
    /// (negative values mirror), producing the part inside `clip`.
    ///
    /// `clip` is in destination coordinates and is intersected with the
    /// destination bounds.
    ///
    /// # Errors
    ///
    /// Returns [`dibkit_core::Error::UnsupportedConversion`] (wrapped) if
    /// the source cannot be resampled into `dest_format`.
    pub fn new(
        dest_format: PixelFormat,
        dest_width: i32,
        dest_height: i32,
        clip: &Rect,
        source: &Dib,
        options: &ResampleOptions,
    ) -> TransformResult<Self> {
        let src_format = source.format();
        let has_alpha = src_format.bpp() > 1 && source.has_alpha();
        let method = TransformMethod::select(src_format, has_alpha, dest_format)?;

        let mut options = *options;
        let src_w = i64::from(source.width());
        let src_h = i64::from(source.height());
        let abs_w = i64::from(dest_width.unsigned_abs());
        let abs_h = i64::from(dest_height.unsigned_abs());
        if !options.no_smoothing
            && !options.has_any_interpolation()
            && abs_w > 0
            && abs_h / 8 < src_w * src_h / abs_w
        {
            debug!(dest_width, dest_height, "promoting area filter to bilinear");
            options.interpolate_bilinear = true;
        }

        let dest_bounds = dest_bounds(dest_width, dest_height)?;
        let dest_clip = dest_bounds.intersect(clip).unwrap_or_default();
        let src_clip = if dest_clip.is_empty() {
            Rect::default()
        } else {
            source_clip(&dest_clip, dest_width, dest_height, source, &options)
        };

        let mut palette = Box::new([0u32; 256]);
        if method.uses_palette() {
            for (i, slot) in palette.iter_mut().enumerate() {
                *slot = source.palette_argb(i);
            }
        }

        Ok(Self {
            state: State::Initial,
            method,
            source: source.clone(),
            options,
            dest_format,
            dest_width,
            dest_height,
            dest_clip,
            src_clip,
            dest_comps: dest_format.components(),
            inter_pitch: 0,
            inter_buf: Vec::new(),
            inter_alpha: Vec::new(),
            palette,
            current_row: 0,
            weights_horz: None,
        })
    }

    /// Selected per-pixel conversion.
    pub fn method(&self) -> TransformMethod {
        self.method
    }

    /// Destination rectangle that will be produced.
    pub fn dest_clip(&self) -> Rect {
        self.dest_clip
    }

    /// Source rectangle read by the horizontal pass.
    pub fn src_clip(&self) -> Rect {
        self.src_clip
    }

    /// Options in effect, after any automatic promotion.
    pub fn options(&self) -> &ResampleOptions {
        &self.options
    }

    /// Allocate the intermediate buffers and build the horizontal weights.
    ///
    /// Returns `false` when there is nothing to produce.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::SizeOverflow`] if the intermediate buffer
    /// would exceed [`MAX_BUFFER_BYTES`].
    pub fn start_stretch_horz(&mut self) -> TransformResult<bool> {
        if self.state != State::Initial {
            return Err(TransformError::InvalidState("stretch already started"));
        }
        if self.dest_clip.is_empty() || self.src_clip.is_empty() {
            self.state = State::Done;
            return Ok(false);
        }

        let width = self.dest_clip.width() as u64;
        let rows = self.src_clip.height() as u64;
        let pitch = width * self.dest_comps as u64;
        let requested = pitch * rows;
        if requested > MAX_BUFFER_BYTES as u64 {
            warn!(requested, "intermediate buffer too large");
            return Err(TransformError::SizeOverflow {
                requested,
                limit: MAX_BUFFER_BYTES as u64,
            });
        }
        self.inter_pitch = pitch as usize;
        self.inter_buf = vec![0; requested as usize];
        if self.method.has_alpha() {
            self.inter_alpha = vec![0; (width * rows) as usize];
        }

        self.weights_horz = Some(WeightTable::calc(
            self.dest_width,
            self.dest_clip.left,
            self.dest_clip.right,
            self.source.width() as i32,
            self.src_clip.left,
            self.src_clip.right,
            &self.options,
        )?);
        self.current_row = self.src_clip.top;
        self.state = State::Horizontal;
        debug!(
            method = ?self.method,
            dest = ?self.dest_clip,
            src = ?self.src_clip,
            "stretch started"
        );
        Ok(true)
    }

    /// Run the horizontal pass from the stored row.
    ///
    /// Returns `true` if `pause` asked to stop before the pass finished.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::WeightLookup`] if a destination column's
    /// weights fall outside the source clip.
    pub fn continue_stretch_horz(
        &mut self,
        pause: Option<&mut dyn PauseIndicator>,
    ) -> TransformResult<bool> {
        if self.state != State::Horizontal {
            return Err(TransformError::InvalidState("horizontal pass not running"));
        }
        let table = self
            .weights_horz
            .take()
            .ok_or(TransformError::InvalidState("horizontal weights missing"))?;
        let result = self.run_horz(&table, pause);
        self.weights_horz = Some(table);
        result
    }

    fn run_horz(
        &mut self,
        table: &WeightTable,
        mut pause: Option<&mut dyn PauseIndicator>,
    ) -> TransformResult<bool> {
        let mut rows = 0usize;
        while self.current_row < self.src_clip.bottom {
            if rows > 0
                && rows % PAUSE_CHECK_ROWS == 0
                && let Some(p) = pause.as_deref_mut()
                && p.need_to_pause()
            {
                trace!(row = self.current_row, "horizontal pass paused");
                return Ok(true);
            }
            self.stretch_row(table, self.current_row)?;
            self.current_row += 1;
            rows += 1;
        }
        Ok(false)
    }

    fn stretch_row(&mut self, table: &WeightTable, src_y: i32) -> TransformResult<()> {
        let method = self.method;
        let comps = self.dest_comps;
        let src_format = self.source.format();
        let bytes_pp = src_format.bytes_per_pixel();
        let intrinsic_alpha = src_format.kind() == ChannelKind::Argb;
        let scan = self.source.scanline(src_y as u32);
        let alpha_row = if method.has_alpha() && !intrinsic_alpha {
            self.source.alpha_mask().map(|m| m.scanline(src_y as u32))
        } else {
            None
        };

        let width = self.dest_clip.width() as usize;
        let row = (src_y - self.src_clip.top) as usize;
        let out_row = &mut self.inter_buf[row * self.inter_pitch..][..width * comps];
        let palette = &*self.palette;

        let mut px = [0u8; 4];
        for (i, dest_x) in (self.dest_clip.left..self.dest_clip.right).enumerate() {
            let pw = checked_weight(table, dest_x, self.src_clip.left, self.src_clip.right)?;
            let out = &mut out_row[i * comps..][..comps];
            if method.has_alpha() {
                let mut acc = [0i64; 4];
                let mut acc_a = 0i64;
                for (src_x, w) in pw.taps() {
                    if w == 0 {
                        continue;
                    }
                    let x = src_x as usize;
                    read_source(method, palette, bytes_pp, scan, x, &mut px);
                    let a = if intrinsic_alpha {
                        scan[x * 4 + 3]
                    } else {
                        alpha_row.map_or(0xff, |r| r[x])
                    };
                    let wa = i64::from(w) * i64::from(a);
                    acc_a += wa;
                    for (sum, &c) in acc.iter_mut().zip(&px[..comps]) {
                        *sum += wa * i64::from(c);
                    }
                }
                self.inter_alpha[row * width + i] = from_fixed(acc_a);
                unpremultiply(&acc[..comps], acc_a, out);
            } else {
                let mut acc = [0i64; 4];
                for (src_x, w) in pw.taps() {
                    if w == 0 {
                        continue;
                    }
                    read_source(method, palette, bytes_pp, scan, src_x as usize, &mut px);
                    for (sum, &c) in acc.iter_mut().zip(&px[..comps]) {
                        *sum += i64::from(w) * i64::from(c);
                    }
                }
                for (o, &sum) in out.iter_mut().zip(&acc) {
                    *o = from_fixed(sum);
                }
            }
        }
        Ok(())
    }

    /// Run the vertical pass, emitting every destination clip row to
    /// `composer` in increasing order.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::WeightLookup`] if a destination row's
    /// weights fall outside the source clip.
    pub fn stretch_vert(&mut self, composer: &mut dyn ScanlineComposer) -> TransformResult<()> {
        if self.state != State::Vertical {
            return Err(TransformError::InvalidState("vertical pass not ready"));
        }
        let table = WeightTable::calc(
            self.dest_height,
            self.dest_clip.top,
            self.dest_clip.bottom,
            self.source.height() as i32,
            self.src_clip.top,
            self.src_clip.bottom,
            &self.options,
        )?;

        let comps = self.dest_comps;
        let width = self.dest_clip.width() as usize;
        let dest_kind = self.dest_format.kind();
        let dest_bytes = self.dest_format.bytes_per_pixel();
        let with_alpha = self.method.has_alpha();
        let alpha_in_pixel = dest_kind == ChannelKind::Argb;

        let mut line = vec![0u8; width * dest_bytes];
        let mut alpha_line = vec![0u8; if with_alpha { width } else { 0 }];
        let mut px = [0u8; 4];

        for dest_y in self.dest_clip.top..self.dest_clip.bottom {
            let pw = checked_weight(&table, dest_y, self.src_clip.top, self.src_clip.bottom)?;
            for i in 0..width {
                let mut acc = [0i64; 4];
                let alpha = if with_alpha {
                    let mut acc_a = 0i64;
                    for (src_y, w) in pw.taps() {
                        let row = (src_y - self.src_clip.top) as usize;
                        let wa = i64::from(w) * i64::from(self.inter_alpha[row * width + i]);
                        acc_a += wa;
                        let p = &self.inter_buf[row * self.inter_pitch + i * comps..][..comps];
                        for (sum, &c) in acc.iter_mut().zip(p) {
                            *sum += wa * i64::from(c);
                        }
                    }
                    unpremultiply(&acc[..comps], acc_a, &mut px[..comps]);
                    Some(from_fixed(acc_a))
                } else {
                    for (src_y, w) in pw.taps() {
                        let row = (src_y - self.src_clip.top) as usize;
                        let p = &self.inter_buf[row * self.inter_pitch + i * comps..][..comps];
                        for (sum, &c) in acc.iter_mut().zip(p) {
                            *sum += i64::from(w) * i64::from(c);
                        }
                    }
                    for (o, &sum) in px.iter_mut().zip(&acc[..comps]) {
                        *o = from_fixed(sum);
                    }
                    None
                };

                let out = &mut line[i * dest_bytes..][..dest_bytes];
                match dest_kind {
                    ChannelKind::Mask | ChannelKind::Palette => out[0] = px[0],
                    ChannelKind::Rgb => {
                        out[..3].copy_from_slice(&px[..3]);
                        if dest_bytes == 4 {
                            out[3] = 0xff;
                        }
                    }
                    ChannelKind::Argb => {
                        out[..3].copy_from_slice(&px[..3]);
                        out[3] = alpha.unwrap_or(0xff);
                    }
                    ChannelKind::Cmyk | ChannelKind::Cmyka => out.copy_from_slice(&px[..4]),
                }
                if let Some(a) = alpha
                    && !alpha_in_pixel
                {
                    alpha_line[i] = a;
                }
            }

            let alpha_arg = (with_alpha && !alpha_in_pixel).then_some(alpha_line.as_slice());
            composer.compose_scanline(dest_y - self.dest_clip.top, &line, alpha_arg);
        }
        debug!(rows = self.dest_clip.height(), "stretch finished");
        Ok(())
    }

    /// Drive the state machine one step.
    ///
    /// Returns `true` while more work remains (the horizontal pass was
    /// paused); `false` once every row has been emitted.
    pub fn continue_(
        &mut self,
        pause: Option<&mut dyn PauseIndicator>,
        composer: &mut dyn ScanlineComposer,
    ) -> TransformResult<bool> {
        if self.state == State::Initial && !self.start_stretch_horz()? {
            return Ok(false);
        }
        if self.state == State::Horizontal {
            if self.continue_stretch_horz(pause)? {
                return Ok(true);
            }
            self.weights_horz = None;
            self.state = State::Vertical;
        }
        if self.state == State::Vertical {
            self.stretch_vert(composer)?;
            self.inter_buf = Vec::new();
            self.inter_alpha = Vec::new();
            self.state = State::Done;
        }
        Ok(false)
    }
}

/// Source rectangle whose pixels feed `dest_clip`, with room for the
/// interpolation taps, clamped to the source bounds.
/// Destination rectangle of a `width × height` stretch; negative sizes
/// mirror.
///
/// # Errors
///
/// [`TransformError::InvalidParameters`] when a size has no positive
/// counterpart in `i32`.
pub(crate) fn dest_bounds(width: i32, height: i32) -> TransformResult<Rect> {
    match (width.checked_abs(), height.checked_abs()) {
        (Some(w), Some(h)) => Ok(Rect::from_size(w, h)),
        _ => {
            warn!(width, height, "stretch size out of range");
            Err(TransformError::InvalidParameters(format!(
                "stretch size {width} x {height}"
            )))
        }
    }
}

fn source_clip(
    dest_clip: &Rect,
    dest_width: i32,
    dest_height: i32,
    source: &Dib,
    options: &ResampleOptions,
) -> Rect {
    let margin = if options.no_smoothing {
        0
    } else if options.interpolate_bicubic {
        2
    } else if options.interpolate_bilinear {
        1
    } else {
        0
    };
    let src_w = source.width() as i32;
    let src_h = source.height() as i32;
    let axis = |lo: i32, hi: i32, dest_len: i32, src_len: i32| -> (i32, i32) {
        let scale = f64::from(src_len) / f64::from(dest_len);
        let base = if dest_len < 0 { f64::from(src_len) } else { 0.0 };
        let a = f64::from(lo) * scale + base;
        let b = f64::from(hi) * scale + base;
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let start = a.floor() as i32 - margin;
        let end = b.ceil() as i32 + margin;
        // nearest sampling of a zero-width span still reads one pixel
        (start, end.max(start + 1))
    };
    let (left, right) = axis(dest_clip.left, dest_clip.right, dest_width, src_w);
    let (top, bottom) = axis(dest_clip.top, dest_clip.bottom, dest_height, src_h);
    Rect::new(left, top, right, bottom)
        .intersect(&Rect::from_size(src_w, src_h))
        .unwrap_or_default()
}

fn checked_weight(
    table: &WeightTable,
    dest_pixel: i32,
    src_min: i32,
    src_max: i32,
) -> TransformResult<PixelWeight<'_>> {
    match table.pixel_weight(dest_pixel) {
        Some(pw) if pw.src_start >= src_min && pw.src_end < src_max => Ok(pw),
        _ => {
            warn!(dest_pixel, src_min, src_max, "weight lookup failed");
            Err(TransformError::WeightLookup { pixel: dest_pixel })
        }
    }
}

fn read_source(
    method: TransformMethod,
    palette: &[u32; 256],
    bytes_pp: usize,
    scan: &[u8],
    x: usize,
    out: &mut [u8; 4],
) {
    let expand = |argb: u32, out: &mut [u8; 4]| {
        let (_, r, g, b) = color::decode_argb(argb);
        out[0] = b;
        out[1] = g;
        out[2] = r;
    };
    match method {
        TransformMethod::OneBppToEightBpp => {
            out[0] = if bit(scan, x) { 0xff } else { 0 };
        }
        TransformMethod::OneBppToManyBpp => {
            expand(palette[usize::from(bit(scan, x))], out);
        }
        TransformMethod::EightBppToEightBpp | TransformMethod::EightBppToEightBppWithAlpha => {
            out[0] = scan[x];
        }
        TransformMethod::EightBppToManyBpp | TransformMethod::EightBppToManyBppWithAlpha => {
            expand(palette[usize::from(scan[x])], out);
        }
        TransformMethod::ManyBppToManyBpp | TransformMethod::ManyBppToManyBppWithAlpha => {
            let p = &scan[x * bytes_pp..];
            let n = bytes_pp.min(4);
            out[..n].copy_from_slice(&p[..n]);
        }
    }
}

#[inline]
fn bit(scan: &[u8], x: usize) -> bool {
    (scan[x >> 3] >> (7 - (x & 7))) & 1 != 0
}

#[inline]
fn from_fixed(sum: i64) -> u8 {
    (sum.clamp(0, 0xff * i64::from(FIXED_ONE)) >> 16) as u8
}

/// Colour of coverage-weighted sums `acc` with total coverage `acc_a`.
fn unpremultiply(acc: &[i64], acc_a: i64, out: &mut [u8]) {
    for (o, &sum) in out.iter_mut().zip(acc) {
        *o = if acc_a > 0 {
            (sum / acc_a).clamp(0, 0xff) as u8
        } else {
            0
        };
    }
}
