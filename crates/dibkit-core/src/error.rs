//! Error types for dibkit-core
//!
//! Provides a unified error type for all bitmap and format-conversion
//! operations in the core crate. Degenerate requests (zero-sized outputs,
//! empty clips) are not errors; callers report them as `None` or `false`.

use crate::format::{ChannelKind, PixelFormat};
use thiserror::Error;

/// dibkit-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid bitmap dimensions
    #[error("invalid bitmap dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Bit depth and channel kind do not form a known pixel format
    #[error("invalid pixel format: {bpp} bpp {kind:?}")]
    InvalidFormat { bpp: u8, kind: ChannelKind },

    /// Row pitch too small for the width, or not 4-byte aligned
    #[error("invalid pitch {pitch} for {width} pixels of {format}")]
    InvalidPitch {
        pitch: usize,
        width: u32,
        format: PixelFormat,
    },

    /// Requested buffer exceeds the allocation ceiling
    #[error("buffer of {requested} bytes exceeds limit of {limit} bytes")]
    SizeOverflow { requested: u64, limit: u64 },

    /// No conversion path between the two formats
    #[error("unsupported conversion: {src} -> {dst}")]
    UnsupportedConversion { src: PixelFormat, dst: PixelFormat },

    /// Palette longer than the format can index
    #[error("palette has {len} entries, at most {max} allowed")]
    PaletteTooLarge { len: usize, max: usize },

    /// Palette attached to a format that has no indices
    #[error("palette not allowed for format {0}")]
    PaletteNotAllowed(PixelFormat),

    /// Alpha plane does not match the bitmap it is attached to
    #[error("alpha mask mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    MaskSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Destination buffer shorter than `pitch * height`
    #[error("buffer too small: need {needed} bytes, have {actual}")]
    EmptyBuffer { needed: usize, actual: usize },
}

/// Result type alias for dibkit-core operations
pub type Result<T> = std::result::Result<T, Error>;
