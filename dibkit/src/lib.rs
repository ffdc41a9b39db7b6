//! dibkit - Device-independent bitmap pipeline
//!
//! Packed bitmaps with pixel-format conversion, resampling and affine
//! placement.
//!
//! # Overview
//!
//! - Bitmaps, formats, palettes and geometry (re-exported from
//!   `dibkit-core`)
//! - Stretching and affine transformation in [`transform`]
//!
//! # Example
//!
//! ```
//! use dibkit::transform::{DibTransformExt, ResampleOptions};
//! use dibkit::{Dib, DibMut, PixelFormat};
//!
//! let mut red = DibMut::new(2, 2, PixelFormat::RGB_24).unwrap();
//! red.clear(0xffff_0000);
//! let red: Dib = red.into();
//! let big = red
//!     .stretch_to(4, 4, &ResampleOptions::default(), None)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(big.pixel_argb(3, 3), Some(0xffff_0000));
//! ```

// Re-export core types (primary data structures used everywhere)
pub use dibkit_core::*;

// Re-export the transform crate as a module to avoid name conflicts
pub use dibkit_transform as transform;
