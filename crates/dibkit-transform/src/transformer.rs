//! Affine transformation of bitmaps
//!
//! An image placement matrix maps the unit square onto the device. The
//! [`ImageTransformer`] reduces every placement to a stretch followed by
//! a cheap fix-up:
//!
//! 1. **Rotate**: quarter turns stretch to the transposed size, then
//!    swap the axes
//! 2. **Scale**: axis-aligned placements are a (possibly mirrored)
//!    stretch
//! 3. **General**: the image is stretched so that the matrix becomes a
//!    pure rotation/shear, then every destination pixel is sampled from
//!    the stretched image through a 24.8 fixed-point inverse matrix
//!
//! Results of the general case are `ARGB_32` (`MASK_8` for masks);
//! destination pixels that fall outside the image stay zero.

use crate::composer::BitmapStorer;
use crate::error::TransformResult;
use crate::kernel::cubic_taps;
use crate::options::ResampleOptions;
use crate::pause::PauseIndicator;
use crate::stretcher::ImageStretcher;
use dibkit_core::{ChannelKind, Dib, DibMut, FloatRect, Matrix, Palette, PixelFormat, Rect, color};
use tracing::debug;

/// How a placement matrix is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decomposition {
    /// Stretch to the transposed size, then swap the axes
    Rotate,
    /// Stretch only
    Scale,
    /// Stretch, then resample through the inverse matrix
    General,
}

#[derive(Debug, Clone, Copy)]
enum Plan {
    Rotate { flip_x: bool, flip_y: bool },
    Scale,
    General { result_to_stretch: FixedMatrix },
}

/// Affine matrix in 24.8 fixed point
#[derive(Debug, Clone, Copy)]
struct FixedMatrix {
    a: i64,
    b: i64,
    c: i64,
    d: i64,
    e: i64,
    f: i64,
}

impl FixedMatrix {
    /// Largest linear coefficient; beyond it one destination pixel spans
    /// more than a million source pixels.
    const MAX_SCALE: f64 = (1 << 20) as f64;
    const MAX_OFFSET: f64 = (1u64 << 40) as f64;

    /// Fixed-point copy of `m`, `None` when a coefficient is not finite or
    /// too large for the per-pixel products to stay inside `i64`.
    fn new(m: &Matrix) -> Option<Self> {
        let linear = [m.a, m.b, m.c, m.d];
        let offset = [m.e, m.f];
        let in_range = |v: &f32, limit: f64| v.is_finite() && f64::from(*v).abs() <= limit;
        if !linear.iter().all(|v| in_range(v, Self::MAX_SCALE))
            || !offset.iter().all(|v| in_range(v, Self::MAX_OFFSET))
        {
            return None;
        }
        let fix = |v: f32| (f64::from(v) * 256.0).round() as i64;
        Some(Self {
            a: fix(m.a),
            b: fix(m.b),
            c: fix(m.c),
            d: fix(m.d),
            e: fix(m.e),
            f: fix(m.f),
        })
    }

    /// Image of pixel `(col, row)` plus half a pixel, in 1/256 pixel.
    fn center(&self, col: i64, row: i64) -> (i64, i64) {
        (
            self.a * col + self.c * row + self.e + 128,
            self.b * col + self.d * row + self.f + 128,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sampler {
    Nearest,
    Bilinear,
    Bicubic,
}

impl Sampler {
    fn select(options: &ResampleOptions) -> Self {
        if options.interpolate_bicubic {
            Sampler::Bicubic
        } else if options.interpolate_downsample || options.no_smoothing {
            Sampler::Nearest
        } else {
            Sampler::Bilinear
        }
    }
}

/// Source pixels and 8-bit weights contributing to one destination pixel
struct Footprint {
    xs: [usize; 4],
    ys: [usize; 4],
    wx: [i32; 4],
    wy: [i32; 4],
    n: usize,
}

impl Footprint {
    /// Footprint of a sample centred at `(cx, cy)` (1/256 pixel) in a
    /// `width × height` image, `None` outside the image.
    fn at(sampler: Sampler, cx: i64, cy: i64, width: usize, height: usize) -> Option<Self> {
        let w = width as i64;
        let h = height as i64;
        let px = cx.div_euclid(256);
        let py = cy.div_euclid(256);
        if px < 0 || px > w || py < 0 || py > h {
            return None;
        }
        let clamp_x = |v: i64| v.clamp(0, w - 1) as usize;
        let clamp_y = |v: i64| v.clamp(0, h - 1) as usize;

        let mut fp = Footprint {
            xs: [0; 4],
            ys: [0; 4],
            wx: [0; 4],
            wy: [0; 4],
            n: 0,
        };
        match sampler {
            Sampler::Nearest => {
                fp.n = 1;
                fp.xs[0] = clamp_x(px);
                fp.ys[0] = clamp_y(py);
                fp.wx[0] = 256;
                fp.wy[0] = 256;
            }
            Sampler::Bilinear => {
                fp.n = 2;
                let (x0, fx) = ((cx - 128).div_euclid(256), (cx - 128).rem_euclid(256) as i32);
                let (y0, fy) = ((cy - 128).div_euclid(256), (cy - 128).rem_euclid(256) as i32);
                fp.xs[..2].copy_from_slice(&[clamp_x(x0), clamp_x(x0 + 1)]);
                fp.ys[..2].copy_from_slice(&[clamp_y(y0), clamp_y(y0 + 1)]);
                fp.wx[..2].copy_from_slice(&[256 - fx, fx]);
                fp.wy[..2].copy_from_slice(&[256 - fy, fy]);
            }
            Sampler::Bicubic => {
                fp.n = 4;
                let (x0, fx) = ((cx - 128).div_euclid(256), (cx - 128).rem_euclid(256) as i32);
                let (y0, fy) = ((cy - 128).div_euclid(256), (cy - 128).rem_euclid(256) as i32);
                for k in 0..4 {
                    fp.xs[k] = clamp_x(x0 - 1 + k as i64);
                    fp.ys[k] = clamp_y(y0 - 1 + k as i64);
                }
                fp.wx = cubic_taps(fx);
                fp.wy = cubic_taps(fy);
            }
        }
        Some(fp)
    }

    /// Weighted value of one 8-bit channel.
    fn interpolate(&self, read: impl Fn(usize, usize) -> u8) -> u8 {
        let mut sum = 0i64;
        for j in 0..self.n {
            let mut row = 0i64;
            for i in 0..self.n {
                row += i64::from(self.wx[i]) * i64::from(read(self.xs[i], self.ys[j]));
            }
            sum += row * i64::from(self.wy[j]);
        }
        (sum.clamp(0, 0xff << 16) >> 16) as u8
    }
}

/// Resumable affine transformation of one bitmap
///
/// # Examples
///
/// ```
/// use dibkit_core::{DibMut, Matrix, PixelFormat};
/// use dibkit_transform::{ImageTransformer, ResampleOptions};
///
/// let source = DibMut::new(4, 2, PixelFormat::RGB_24).unwrap().into();
/// // quarter turn: 4x2 becomes 2x4
/// let matrix = Matrix::new(0.0, -4.0, 2.0, 0.0, 0.0, 4.0);
/// let mut t = ImageTransformer::new(&source, &matrix, &ResampleOptions::default(), None).unwrap();
/// while t.continue_(None).unwrap() {}
/// let (dib, left, top) = t.into_result().unwrap();
/// assert_eq!((dib.width(), dib.height(), left, top), (2, 4, 0, 0));
/// ```
pub struct ImageTransformer {
    options: ResampleOptions,
    decomposition: Decomposition,
    plan: Option<Plan>,
    result: Rect,
    stretcher: Option<ImageStretcher>,
    storer: BitmapStorer,
    output: Option<Dib>,
    finished: bool,
}

impl ImageTransformer {
    /// Prepare the placement of `source` through `matrix`, limited to
    /// `clip` in device coordinates, and start the stretch.
    ///
    /// An empty result rectangle, a singular matrix or a placement reaching
    /// beyond [`MAX_COORD`](dibkit_core::MAX_COORD) yields a transformer
    /// with no result.
    pub fn new(
        source: &Dib,
        matrix: &Matrix,
        options: &ResampleOptions,
        clip: Option<Rect>,
    ) -> TransformResult<Self> {
        let unit = matrix.unit_rect();
        let full = unit.closest_rect();
        let coefficients = [matrix.a, matrix.b, matrix.c, matrix.d, matrix.e, matrix.f];
        let placeable = unit.fits_coords() && coefficients.iter().all(|v| v.is_finite());
        let result = match clip {
            Some(c) if placeable => full.intersect(&c).unwrap_or_default(),
            None if placeable => full,
            _ => {
                debug!(?matrix, "placement outside the coordinate range");
                Rect::default()
            }
        };
        let mut transformer = Self {
            options: *options,
            decomposition: Decomposition::General,
            plan: None,
            result,
            stretcher: None,
            storer: BitmapStorer::new(),
            output: None,
            finished: true,
        };
        if result.is_empty() {
            return Ok(transformer);
        }
        let result_clip = result.offset(-full.left, -full.top);

        let (a, b, c, d) = (matrix.a, matrix.b, matrix.c, matrix.d);
        let (decomposition, stretcher, plan) = if a.abs() < b.abs() / 20.0
            && d.abs() < c.abs() / 20.0
            && a.abs() < 0.5
            && d.abs() < 0.5
        {
            let flip_x = c > 0.0;
            let flip_y = b < 0.0;
            let clip = swap_clip(&result_clip, full.width(), full.height(), flip_x, flip_y);
            let stretcher =
                ImageStretcher::new(source, full.height(), full.width(), &clip, options);
            (Decomposition::Rotate, stretcher, Plan::Rotate { flip_x, flip_y })
        } else if b.abs() < 0.05 && c.abs() < 0.05 {
            let dest_w = (if a > 0.0 { a.ceil() } else { a.floor() }) as i32;
            let dest_h = (if d > 0.0 { -d.ceil() } else { -d.floor() }) as i32;
            let stretcher = ImageStretcher::new(source, dest_w, dest_h, &result_clip, options);
            (Decomposition::Scale, stretcher, Plan::Scale)
        } else {
            let stretch_w = a.hypot(b).ceil() as i32;
            let stretch_h = c.hypot(d).ceil() as i32;
            if stretch_w <= 0 || stretch_h <= 0 {
                return Ok(transformer);
            }
            let (sw, sh) = (stretch_w as f32, stretch_h as f32);
            let stretch_to_dest = Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, sh).concat(&Matrix::new(
                a / sw,
                b / sw,
                c / sh,
                d / sh,
                matrix.e,
                matrix.f,
            ));
            let Some(dest_to_stretch) = stretch_to_dest.inverse() else {
                debug!(?matrix, "singular placement matrix");
                return Ok(transformer);
            };
            let Some(stretch_clip) = dest_to_stretch
                .transform_rect(&FloatRect::from_rect(&result))
                .outer_rect()
                .intersect(&Rect::from_size(stretch_w, stretch_h))
                .filter(|r| !r.is_empty())
            else {
                return Ok(transformer);
            };
            let result_to_stretch = Matrix::translation(result.left as f32, result.top as f32)
                .concat(&dest_to_stretch)
                .translate(-stretch_clip.left as f32, -stretch_clip.top as f32);
            let stretcher =
                ImageStretcher::new(source, stretch_w, stretch_h, &stretch_clip, options);
            let Some(result_to_stretch) = FixedMatrix::new(&result_to_stretch) else {
                debug!(?matrix, "inverse placement out of fixed-point range");
                return Ok(transformer);
            };
            let plan = Plan::General { result_to_stretch };
            (Decomposition::General, stretcher, plan)
        };
        debug!(?decomposition, ?result, "transform planned");

        transformer.decomposition = decomposition;
        transformer.plan = Some(plan);
        transformer.finished = false;
        let mut stretcher = stretcher;
        if stretcher.start(&mut transformer.storer)? {
            transformer.stretcher = Some(stretcher);
        }
        Ok(transformer)
    }

    /// Decomposition chosen for the matrix.
    pub fn decomposition(&self) -> Decomposition {
        self.decomposition
    }

    /// Continue the transformation.
    ///
    /// Returns `true` while more work remains.
    pub fn continue_(&mut self, pause: Option<&mut dyn PauseIndicator>) -> TransformResult<bool> {
        if self.finished {
            return Ok(false);
        }
        if let Some(stretcher) = self.stretcher.as_mut() {
            if stretcher.continue_(pause, &mut self.storer)? {
                return Ok(true);
            }
            self.stretcher = None;
        }
        self.finish()?;
        self.finished = true;
        Ok(false)
    }

    fn finish(&mut self) -> TransformResult<()> {
        let (Some(plan), Some(stretched)) = (self.plan, self.storer.take_bitmap()?) else {
            return Ok(());
        };
        let output = match plan {
            Plan::Rotate { flip_x, flip_y } => stretched.swap_xy(flip_x, flip_y)?,
            Plan::Scale => stretched,
            Plan::General { result_to_stretch } => self.resample(&stretched, &result_to_stretch)?,
        };
        self.output = Some(output);
        Ok(())
    }

    fn resample(&self, stretched: &Dib, m: &FixedMatrix) -> TransformResult<Dib> {
        let width = self.result.width() as u32;
        let height = self.result.height() as u32;
        let sampler = Sampler::select(&self.options);
        let is_mask = stretched.is_mask();
        let format = if is_mask {
            PixelFormat::MASK_8
        } else {
            PixelFormat::ARGB_32
        };
        let mut out = DibMut::new(width, height, format)?;
        let palette = stretched
            .palette()
            .map(Palette::to_argb_table)
            .unwrap_or_else(gray_table);

        let src_w = stretched.width() as usize;
        let src_h = stretched.height() as usize;
        for row in 0..height {
            let line = out.scanline_mut(row);
            for col in 0..width {
                let (cx, cy) = m.center(i64::from(col), i64::from(row));
                let Some(fp) = Footprint::at(sampler, cx, cy, src_w, src_h) else {
                    continue;
                };
                let x = col as usize;
                if is_mask {
                    line[x] = calc_mask(stretched, &fp);
                } else {
                    let argb = match stretched.format().kind() {
                        ChannelKind::Palette | ChannelKind::Mask => {
                            calc_mono(stretched, &fp, &palette)
                        }
                        _ => calc_color(stretched, &fp),
                    };
                    let (a, r, g, b) = color::decode_argb(argb);
                    line[x * 4..x * 4 + 4].copy_from_slice(&[b, g, r, a]);
                }
            }
        }
        Ok(out.into())
    }

    /// Device rectangle covered by the result.
    pub fn result_rect(&self) -> Option<Rect> {
        self.output.as_ref().map(|_| self.result)
    }

    /// Transformed bitmap, once [`continue_`](Self::continue_) returned
    /// `false`.
    pub fn result(&self) -> Option<&Dib> {
        self.output.as_ref()
    }

    /// Transformed bitmap and its device position.
    pub fn into_result(self) -> Option<(Dib, i32, i32)> {
        let (left, top) = (self.result.left, self.result.top);
        self.output.map(|dib| (dib, left, top))
    }
}

/// Clip rectangle of the stretched (not yet transposed) image feeding
/// `clip` of a `width × height` rotated result.
fn swap_clip(clip: &Rect, width: i32, height: i32, flip_x: bool, flip_y: bool) -> Rect {
    let (left, right) = if flip_y {
        (height - clip.bottom, height - clip.top)
    } else {
        (clip.top, clip.bottom)
    };
    let (top, bottom) = if flip_x {
        (width - clip.right, width - clip.left)
    } else {
        (clip.left, clip.right)
    };
    Rect::new(left, top, right, bottom).normalize()
}

fn gray_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let v = i as u8;
        *slot = color::argb(0xff, v, v, v);
    }
    table
}

fn calc_mask(src: &Dib, fp: &Footprint) -> u8 {
    fp.interpolate(|x, y| src.scanline(y as u32)[x])
}

fn calc_mono(src: &Dib, fp: &Footprint, palette: &[u32; 256]) -> u32 {
    let index = fp.interpolate(|x, y| src.scanline(y as u32)[x]);
    let argb = palette[usize::from(index)];
    match src.alpha_mask() {
        Some(mask) => {
            let a = fp.interpolate(|x, y| mask.scanline(y as u32)[x]);
            (argb & 0x00ff_ffff) | (u32::from(a) << 24)
        }
        None => argb,
    }
}

fn calc_color(src: &Dib, fp: &Footprint) -> u32 {
    let format = src.format();
    let bytes = format.bytes_per_pixel();
    let channel = |k: usize| fp.interpolate(|x, y| src.scanline(y as u32)[x * bytes + k]);
    let a = if format.kind() == ChannelKind::Argb {
        channel(3)
    } else if let Some(mask) = src.alpha_mask() {
        fp.interpolate(|x, y| mask.scanline(y as u32)[x])
    } else {
        0xff
    };
    if format.is_cmyk() {
        let (r, g, b) = color::cmyk_to_rgb(channel(0), channel(1), channel(2), channel(3));
        color::argb(a, r, g, b)
    } else {
        color::argb(a, channel(2), channel(1), channel(0))
    }
}
