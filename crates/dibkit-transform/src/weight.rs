//! Resampling weight tables
//!
//! A [`WeightTable`] lists, for every destination pixel along one axis,
//! the contiguous window of source pixels that contribute to it and their
//! 16.16 fixed-point weights. Every window sums to exactly [`FIXED_ONE`].
//!
//! # Filter selection
//!
//! | condition                              | filter   |
//! |----------------------------------------|----------|
//! | `no_smoothing`                         | nearest  |
//! | `abs(scale) >= 1`                      | area     |
//! | `abs(scale) < 1`, bicubic requested    | bicubic  |
//! | `abs(scale) < 1`, bilinear requested   | bilinear |
//! | otherwise                              | nearest  |
//!
//! where `scale = src_len / dest_len`. A negative `dest_len` mirrors the
//! axis.

use crate::error::{TransformError, TransformResult};
use crate::kernel::cubic_taps;
use crate::options::ResampleOptions;
use std::ops::Range;
use tracing::warn;

/// 1.0 in 16.16 fixed point
pub const FIXED_ONE: i32 = 1 << 16;

/// Source window and weights for one destination pixel
#[derive(Debug, Clone, Copy)]
pub struct PixelWeight<'a> {
    /// First contributing source pixel
    pub src_start: i32,
    /// Last contributing source pixel (inclusive)
    pub src_end: i32,
    /// Weights of `src_start..=src_end`
    pub weights: &'a [i32],
}

impl PixelWeight<'_> {
    /// Weight of source pixel `src`, or `None` outside the window.
    #[inline]
    pub fn weight_for(&self, src: i32) -> Option<i32> {
        if src < self.src_start || src > self.src_end {
            return None;
        }
        self.weights.get((src - self.src_start) as usize).copied()
    }

    /// Sum of all weights.
    pub fn total(&self) -> i64 {
        self.weights.iter().map(|&w| i64::from(w)).sum()
    }

    /// `(source pixel, weight)` pairs of the window.
    pub fn taps(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.src_start..=self.src_end).zip(self.weights.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    Area,
    Nearest,
    Bilinear,
    Bicubic,
}

/// Per-destination-pixel resampling weights along one axis
#[derive(Debug, Clone)]
pub struct WeightTable {
    dest_min: i32,
    dest_max: i32,
    slot_len: usize,
    starts: Vec<i32>,
    ends: Vec<i32>,
    weights: Vec<i32>,
}

impl WeightTable {
    /// Build the weights mapping destination pixels `dest_min..dest_max` of
    /// a `dest_len` axis onto source pixels `src_min..src_max` of a
    /// `src_len` axis.
    ///
    /// # Errors
    ///
    /// - [`TransformError::InvalidParameters`] for a zero `dest_len`, a
    ///   non-positive `src_len` or an empty source range
    /// - [`TransformError::WeightWindowOverflow`] if a window does not fit
    ///   its slot
    pub fn calc(
        dest_len: i32,
        dest_min: i32,
        dest_max: i32,
        src_len: i32,
        src_min: i32,
        src_max: i32,
        options: &ResampleOptions,
    ) -> TransformResult<Self> {
        if dest_len == 0 || src_len <= 0 || src_min >= src_max || dest_min > dest_max {
            return Err(TransformError::InvalidParameters(format!(
                "weight table dest {dest_len} [{dest_min}, {dest_max}) src {src_len} [{src_min}, {src_max})"
            )));
        }

        let scale = f64::from(src_len) / f64::from(dest_len);
        let base = if dest_len < 0 { f64::from(src_len) } else { 0.0 };
        let ext = if options.interpolate_bicubic { 3 } else { 1 };
        let slot_len = scale.abs().ceil() as usize + ext;
        let count = (dest_max - dest_min) as usize;

        let filter = if options.no_smoothing {
            Filter::Nearest
        } else if scale.abs() >= 1.0 {
            Filter::Area
        } else if options.interpolate_bicubic {
            Filter::Bicubic
        } else if options.interpolate_bilinear {
            Filter::Bilinear
        } else {
            Filter::Nearest
        };

        let mut table = WeightTable {
            dest_min,
            dest_max,
            slot_len,
            starts: vec![0; count],
            ends: vec![0; count],
            weights: vec![0; count * slot_len],
        };

        let last = src_max - 1;
        for dest_pixel in dest_min..dest_max {
            let d = f64::from(dest_pixel);
            let center = d * scale + scale / 2.0 + base;
            match filter {
                Filter::Nearest => {
                    let pos = (center.floor() as i32).clamp(src_min, last);
                    table.set_single(dest_pixel, pos)?;
                }
                Filter::Bilinear => {
                    let start = (center - 0.5).floor() as i32;
                    let lo = start.max(src_min);
                    let hi = (start + 1).min(last);
                    if lo >= hi {
                        table.set_single(dest_pixel, lo.min(last))?;
                        continue;
                    }
                    let right = ((center - f64::from(start) - 0.5) * f64::from(FIXED_ONE))
                        .round()
                        .clamp(0.0, f64::from(FIXED_ONE)) as i32;
                    let slot = table.set_window(dest_pixel, lo, hi)?;
                    slot[0] = FIXED_ONE - right;
                    slot[1] = right;
                }
                Filter::Bicubic => {
                    let s = (center - 0.5).floor() as i32;
                    let frac = ((center - f64::from(s) - 0.5) * 256.0).round() as i32;
                    let taps = cubic_taps(frac);
                    let lo = (s - 1).clamp(src_min, last);
                    let hi = (s + 2).clamp(src_min, last);
                    let slot = table.set_window(dest_pixel, lo, hi)?;
                    for (k, tap) in taps.iter().enumerate() {
                        let pos = (s - 1 + k as i32).clamp(src_min, last);
                        slot[(pos - lo) as usize] += tap << 8;
                    }
                }
                Filter::Area => {
                    let a = d * scale + base;
                    let b = a + scale;
                    let (lo_f, hi_f) = if a <= b { (a, b) } else { (b, a) };
                    let lo = (lo_f.floor() as i32).max(src_min);
                    let hi = (hi_f.floor() as i32).min(last);
                    if lo > hi {
                        table.set_single(dest_pixel, lo.min(last))?;
                        continue;
                    }
                    let slot = table.set_window(dest_pixel, lo, hi)?;
                    let mut remaining = FIXED_ONE;
                    let mut carry = 0.0f64;
                    for j in lo..hi {
                        let e0 = (f64::from(j) - base) / scale;
                        let e1 = (f64::from(j) + 1.0 - base) / scale;
                        let (e0, e1) = if e0 <= e1 { (e0, e1) } else { (e1, e0) };
                        let overlap = (e1.min(d + 1.0) - e0.max(d)).max(0.0);
                        let exact = overlap * f64::from(FIXED_ONE) + carry;
                        let fixed = (exact.round() as i32).clamp(0, remaining);
                        carry = exact - f64::from(fixed);
                        slot[(j - lo) as usize] = fixed;
                        remaining -= fixed;
                    }
                    slot[(hi - lo) as usize] = remaining;
                }
            }
        }
        Ok(table)
    }

    fn set_single(&mut self, dest_pixel: i32, pos: i32) -> TransformResult<()> {
        self.set_window(dest_pixel, pos, pos)?[0] = FIXED_ONE;
        Ok(())
    }

    fn set_window(&mut self, dest_pixel: i32, start: i32, end: i32) -> TransformResult<&mut [i32]> {
        let len = (end - start + 1) as usize;
        if len > self.slot_len {
            warn!(dest_pixel, len, slot = self.slot_len, "weight window overflow");
            return Err(TransformError::WeightWindowOverflow {
                len,
                slot: self.slot_len,
            });
        }
        let index = (dest_pixel - self.dest_min) as usize;
        self.starts[index] = start;
        self.ends[index] = end;
        let slot = &mut self.weights[index * self.slot_len..(index + 1) * self.slot_len];
        slot.fill(0);
        Ok(&mut slot[..len])
    }

    /// Weights of one destination pixel, `None` outside the table's range.
    pub fn pixel_weight(&self, dest_pixel: i32) -> Option<PixelWeight<'_>> {
        if dest_pixel < self.dest_min || dest_pixel >= self.dest_max {
            return None;
        }
        let index = (dest_pixel - self.dest_min) as usize;
        let src_start = self.starts[index];
        let src_end = self.ends[index];
        let offset = index * self.slot_len;
        let len = (src_end - src_start + 1) as usize;
        Some(PixelWeight {
            src_start,
            src_end,
            weights: &self.weights[offset..offset + len],
        })
    }

    /// Destination pixels covered by the table.
    pub fn dest_range(&self) -> Range<i32> {
        self.dest_min..self.dest_max
    }

    /// Number of weights reserved per destination pixel.
    pub fn slot_len(&self) -> usize {
        self.slot_len
    }
}
