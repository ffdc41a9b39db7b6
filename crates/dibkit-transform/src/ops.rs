//! One-shot stretch and transform of a [`Dib`]
//!
//! These run an [`ImageStretcher`] or [`ImageTransformer`] to completion
//! without pausing.

use crate::composer::BitmapStorer;
use crate::error::TransformResult;
use crate::options::ResampleOptions;
use crate::stretch_engine::dest_bounds;
use crate::stretcher::ImageStretcher;
use crate::transformer::ImageTransformer;
use dibkit_core::{Dib, Matrix, Rect};

/// Stretch `dib` to `dest_width × dest_height` (negative values mirror).
///
/// With `clip`, only that part of the destination is produced. A
/// same-size stretch without a clip returns a copy of the source.
/// Returns `Ok(None)` for a zero size or an empty clip.
pub fn stretch_to(
    dib: &Dib,
    dest_width: i32,
    dest_height: i32,
    options: &ResampleOptions,
    clip: Option<&Rect>,
) -> TransformResult<Option<Dib>> {
    if dest_width == 0 || dest_height == 0 {
        return Ok(None);
    }
    if dest_width == dib.width() as i32 && dest_height == dib.height() as i32 {
        return match clip {
            None => Ok(Some(dib.deep_clone())),
            Some(c) => Ok(dib.clone_rect(c)?),
        };
    }
    let full = dest_bounds(dest_width, dest_height)?;
    let clip = clip.copied().unwrap_or(full);
    let mut stretcher = ImageStretcher::new(dib, dest_width, dest_height, &clip, options);
    let mut storer = BitmapStorer::new();
    let mut more = stretcher.start(&mut storer)?;
    while more {
        more = stretcher.continue_(None, &mut storer)?;
    }
    storer.take_bitmap()
}

/// Place `dib` through `matrix`, returning the bitmap and its device
/// position, or `None` when nothing is visible.
pub fn transform_to(
    dib: &Dib,
    matrix: &Matrix,
    options: &ResampleOptions,
) -> TransformResult<Option<(Dib, i32, i32)>> {
    let mut transformer = ImageTransformer::new(dib, matrix, options, None)?;
    while transformer.continue_(None)? {}
    Ok(transformer.into_result())
}

/// Stretch and transform as methods on [`Dib`]
pub trait DibTransformExt {
    /// See [`stretch_to`].
    fn stretch_to(
        &self,
        dest_width: i32,
        dest_height: i32,
        options: &ResampleOptions,
        clip: Option<&Rect>,
    ) -> TransformResult<Option<Dib>>;

    /// See [`transform_to`].
    fn transform_to(
        &self,
        matrix: &Matrix,
        options: &ResampleOptions,
    ) -> TransformResult<Option<(Dib, i32, i32)>>;
}

impl DibTransformExt for Dib {
    fn stretch_to(
        &self,
        dest_width: i32,
        dest_height: i32,
        options: &ResampleOptions,
        clip: Option<&Rect>,
    ) -> TransformResult<Option<Dib>> {
        stretch_to(self, dest_width, dest_height, options, clip)
    }

    fn transform_to(
        &self,
        matrix: &Matrix,
        options: &ResampleOptions,
    ) -> TransformResult<Option<(Dib, i32, i32)>> {
        transform_to(self, matrix, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dibkit_core::{DibMut, PixelFormat};

    fn sample() -> Dib {
        let mut d = DibMut::new(3, 2, PixelFormat::RGB_24).unwrap();
        for y in 0..2u32 {
            for (i, v) in d.scanline_mut(y)[..9].iter_mut().enumerate() {
                *v = (i as u32 * 20 + y * 3) as u8;
            }
        }
        d.into()
    }

    #[test]
    fn test_same_size_is_copy() {
        let src = sample();
        let out = src
            .stretch_to(3, 2, &ResampleOptions::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(out.buffer(), src.buffer());

        let clip = Rect::new(1, 0, 3, 1);
        let out = stretch_to(&src, 3, 2, &ResampleOptions::default(), Some(&clip))
            .unwrap()
            .unwrap();
        assert_eq!((out.width(), out.height()), (2, 1));
        assert_eq!(&out.scanline(0)[..6], &src.scanline(0)[3..9]);
    }

    #[test]
    fn test_zero_size_is_none() {
        let src = sample();
        assert!(stretch_to(&src, 0, 5, &ResampleOptions::default(), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_mirrored_same_size() {
        let src = sample();
        let out = stretch_to(&src, -3, 2, &ResampleOptions::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(&out.scanline(0)[..3], &src.scanline(0)[6..9]);
        assert_eq!(&out.scanline(0)[6..9], &src.scanline(0)[..3]);
    }

    #[test]
    fn test_transform_identity_scale() {
        let src = sample();
        let (out, left, top) = src
            .transform_to(&Matrix::new(3.0, 0.0, 0.0, -2.0, 0.0, 2.0), &ResampleOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!((left, top), (0, 0));
        assert_eq!(out.buffer(), src.buffer());
    }
}
