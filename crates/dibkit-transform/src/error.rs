//! Error types for dibkit-transform

use thiserror::Error;

/// Errors that can occur while resampling or transforming bitmaps
#[derive(Debug, Error)]
pub enum TransformError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] dibkit_core::Error),

    /// A resampling window is wider than its weight-table slot
    #[error("weight window of {len} taps exceeds slot of {slot}")]
    WeightWindowOverflow { len: usize, slot: usize },

    /// A destination pixel has no weights, or its weights reach outside
    /// the source rows/columns that were prepared for it
    #[error("no usable weights for destination pixel {pixel}")]
    WeightLookup { pixel: i32 },

    /// Intermediate buffer exceeds the allocation ceiling
    #[error("intermediate buffer of {requested} bytes exceeds limit of {limit} bytes")]
    SizeOverflow { requested: u64, limit: u64 },

    /// Operation called in the wrong state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Transformation result expected but not produced
    #[error("stretched bitmap missing")]
    MissingBitmap,

    /// Invalid transformation parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Singular matrix (non-invertible)
    #[error("singular transformation matrix")]
    SingularMatrix,
}

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
