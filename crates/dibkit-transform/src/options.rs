//! Resampling options

/// Filter selection for stretching and transforming
///
/// The default is box (area) filtering when shrinking and nearest
/// sampling when enlarging; the flags refine that choice.
///
/// # Examples
///
/// ```
/// use dibkit_transform::ResampleOptions;
///
/// let opts = ResampleOptions::bicubic();
/// assert!(opts.interpolate_bicubic);
/// assert!(opts.has_any_interpolation());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResampleOptions {
    /// Sample the nearest source pixel only, in every direction
    pub no_smoothing: bool,
    /// Bilinear interpolation when enlarging
    pub interpolate_bilinear: bool,
    /// Bicubic interpolation when enlarging
    pub interpolate_bicubic: bool,
    /// Quick nearest-neighbour path that skips the weight tables entirely
    pub interpolate_downsample: bool,
}

impl ResampleOptions {
    /// Bilinear interpolation.
    pub fn bilinear() -> Self {
        Self {
            interpolate_bilinear: true,
            ..Self::default()
        }
    }

    /// Bicubic interpolation.
    pub fn bicubic() -> Self {
        Self {
            interpolate_bicubic: true,
            ..Self::default()
        }
    }

    /// Nearest sampling everywhere.
    pub fn no_smoothing() -> Self {
        Self {
            no_smoothing: true,
            ..Self::default()
        }
    }

    /// Quick nearest-neighbour downsampling.
    pub fn downsample() -> Self {
        Self {
            interpolate_downsample: true,
            ..Self::default()
        }
    }

    /// Whether bilinear or bicubic interpolation was requested.
    pub fn has_any_interpolation(&self) -> bool {
        self.interpolate_bilinear || self.interpolate_bicubic
    }
}
