//! dibkit-transform - Resampling and affine transformation
//!
//! This crate resamples [`dibkit_core::Dib`] bitmaps:
//!
//! - [`WeightTable`] - Per-pixel filter weights (area, nearest, bilinear,
//!   bicubic) in 16.16 fixed point
//! - [`StretchEngine`] - Resumable two-pass separable stretch
//! - [`ImageStretcher`] - Format selection and quick downsampling around
//!   the engine
//! - [`ImageTransformer`] - Placement of a bitmap through an affine matrix
//! - [`ScanlineComposer`] - Receiver of output rows, with
//!   [`BitmapStorer`] and [`BitmapComposer`] implementations
//! - [`stretch_to`] / [`transform_to`] - One-shot helpers, also available
//!   through [`DibTransformExt`]
//!
//! Long operations poll a [`PauseIndicator`] every [`PAUSE_CHECK_ROWS`]
//! rows and can be resumed with their `continue_` method.

pub mod composer;
pub mod compositor;
mod error;
pub mod kernel;
pub mod ops;
pub mod options;
pub mod pause;
pub mod stretch_engine;
pub mod stretcher;
pub mod transformer;
pub mod weight;

pub use composer::{BitmapStorer, ScanlineComposer};
pub use compositor::BitmapComposer;
pub use error::{TransformError, TransformResult};
pub use kernel::{CUBIC_TABLE, cubic_taps};
pub use ops::{DibTransformExt, stretch_to, transform_to};
pub use options::ResampleOptions;
pub use pause::{PAUSE_CHECK_ROWS, PauseIndicator};
pub use stretch_engine::{StretchEngine, TransformMethod};
pub use stretcher::{ImageStretcher, MAX_PROGRESSIVE_PIXELS, stretched_format};
pub use transformer::{Decomposition, ImageTransformer};
pub use weight::{FIXED_ONE, PixelWeight, WeightTable};
