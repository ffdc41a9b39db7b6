//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur during regression testing
#[derive(Debug, Error)]
pub enum TestError {
    /// Building a synthetic test image failed
    #[error("failed to build test image: {0}")]
    Image(#[from] dibkit_core::Error),

    /// Golden file exists but cannot be parsed
    #[error("malformed golden file '{path}'")]
    MalformedGolden { path: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
