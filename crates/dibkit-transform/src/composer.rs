//! Scanline sinks
//!
//! Stretching and transformation produce their output one scanline at a
//! time. A [`ScanlineComposer`] receives those rows; [`BitmapStorer`]
//! assembles them into a [`Dib`].

use crate::error::TransformResult;
use dibkit_core::{Dib, DibMut, Error, Palette, PixelFormat};
use tracing::warn;

/// Receiver of resampled scanlines.
///
/// # Contract
///
/// - [`set_info`](Self::set_info) is called once, before any row.
/// - [`compose_scanline`](Self::compose_scanline) is called exactly once
///   per output row, with `line` increasing from 0 to `height - 1`.
/// - `scanline` holds `width` pixels in the announced format; `alpha`, when
///   present, holds `width` coverage bytes for the same row.
pub trait ScanlineComposer {
    /// Announce the output size, format and palette.
    fn set_info(
        &mut self,
        width: i32,
        height: i32,
        format: PixelFormat,
        palette: Option<&Palette>,
    ) -> TransformResult<()>;

    /// Deliver row `line`.
    fn compose_scanline(&mut self, line: i32, scanline: &[u8], alpha: Option<&[u8]>);
}

/// Composer that stores the rows it receives as a bitmap
#[derive(Debug, Default)]
pub struct BitmapStorer {
    bitmap: Option<DibMut>,
    alpha: Option<DibMut>,
    alpha_error: Option<Error>,
}

impl BitmapStorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished bitmap, with the alpha plane attached if alpha rows arrived.
    ///
    /// Returns `None` before [`set_info`](ScanlineComposer::set_info) or
    /// after the bitmap was taken.
    ///
    /// # Errors
    ///
    /// The error that prevented allocating the alpha plane, if alpha rows
    /// arrived but could not be stored.
    pub fn take_bitmap(&mut self) -> TransformResult<Option<Dib>> {
        let Some(mut bitmap) = self.bitmap.take() else {
            return Ok(None);
        };
        if let Some(err) = self.alpha_error.take() {
            self.alpha = None;
            return Err(err.into());
        }
        if let Some(alpha) = self.alpha.take() {
            bitmap.set_alpha_mask(Some(alpha.into()))?;
        }
        Ok(Some(bitmap.into()))
    }

    /// Replace the stored bitmap with a post-processed one.
    pub fn replace(&mut self, bitmap: Dib) {
        self.alpha = None;
        self.alpha_error = None;
        self.bitmap = Some(bitmap.to_mut());
    }
}

impl ScanlineComposer for BitmapStorer {
    fn set_info(
        &mut self,
        width: i32,
        height: i32,
        format: PixelFormat,
        palette: Option<&Palette>,
    ) -> TransformResult<()> {
        let mut bitmap = DibMut::new(width.max(0) as u32, height.max(0) as u32, format)?;
        bitmap.set_palette(palette.cloned())?;
        self.bitmap = Some(bitmap);
        self.alpha = None;
        self.alpha_error = None;
        Ok(())
    }

    fn compose_scanline(&mut self, line: i32, scanline: &[u8], alpha: Option<&[u8]>) {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return;
        };
        if line < 0 || line as u32 >= bitmap.height() {
            return;
        }
        let row = bitmap.scanline_mut(line as u32);
        let n = row.len().min(scanline.len());
        row[..n].copy_from_slice(&scanline[..n]);

        if let Some(alpha) = alpha {
            if self.alpha.is_none() && self.alpha_error.is_none() && !bitmap.format().is_mask() {
                match DibMut::new(bitmap.width(), bitmap.height(), PixelFormat::MASK_8) {
                    Ok(plane) => self.alpha = Some(plane),
                    Err(err) => {
                        warn!(%err, "cannot allocate alpha plane");
                        self.alpha_error = Some(err);
                    }
                }
            }
            if let Some(plane) = self.alpha.as_mut() {
                let row = plane.scanline_mut(line as u32);
                let n = row.len().min(alpha.len());
                row[..n].copy_from_slice(&alpha[..n]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;

    #[test]
    fn test_storer_assembles_rows() {
        let mut storer = BitmapStorer::new();
        storer.set_info(3, 2, PixelFormat::MASK_8, None).unwrap();
        storer.compose_scanline(0, &[1, 2, 3], None);
        storer.compose_scanline(1, &[4, 5, 6], None);
        storer.compose_scanline(2, &[7, 8, 9], None);
        let dib = storer.take_bitmap().unwrap().unwrap();
        assert_eq!(&dib.scanline(0)[..3], &[1, 2, 3]);
        assert_eq!(&dib.scanline(1)[..3], &[4, 5, 6]);
        assert!(storer.take_bitmap().unwrap().is_none());
    }

    #[test]
    fn test_storer_alpha_rows() {
        let mut storer = BitmapStorer::new();
        let palette = Palette::gray_ramp(256).unwrap();
        storer
            .set_info(2, 1, PixelFormat::PAL_8, Some(&palette))
            .unwrap();
        storer.compose_scanline(0, &[9, 10], Some(&[0x80, 0x40]));
        let dib = storer.take_bitmap().unwrap().unwrap();
        assert_eq!(dib.palette(), Some(&palette));
        assert_eq!(&dib.alpha_mask().unwrap().scanline(0)[..2], &[0x80, 0x40]);
    }

    #[test]
    fn test_storer_rejects_empty_size() {
        let mut storer = BitmapStorer::new();
        assert!(storer.set_info(0, 4, PixelFormat::RGB_24, None).is_err());
    }

    #[test]
    fn test_storer_reports_alpha_plane_failure() {
        // a 1 bpp bitmap fits, an 8 bpp plane of the same size does not
        let mut storer = BitmapStorer::new();
        storer.set_info(65536, 8200, PixelFormat::PAL_1, None).unwrap();
        storer.compose_scanline(0, &[0xff; 8192], Some(&[0x80; 65536]));
        storer.compose_scanline(1, &[0x0f; 8192], Some(&[0x80; 65536]));
        let err = storer.take_bitmap().unwrap_err();
        assert!(matches!(
            err,
            TransformError::Core(Error::SizeOverflow { .. })
        ));
        assert!(storer.take_bitmap().unwrap().is_none());
    }
}
