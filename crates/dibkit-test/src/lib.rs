//! dibkit-test - Regression test framework for dibkit
//!
//! This crate provides the regression harness shared by the dibkit crates,
//! supporting three modes:
//!
//! - **Generate**: Record checksums of results as golden files
//! - **Compare**: Compare results with golden files when present
//! - **Display**: Run tests without golden comparison
//!
//! It also builds the synthetic images the tests run on (see [`images`])
//! and installs a `tracing` subscriber so library logs show up in test
//! output.
//!
//! # Usage
//!
//! ```ignore
//! use dibkit_test::{RegParams, images};
//!
//! let mut rp = RegParams::new("stretch");
//! let src = images::horizontal_ramp(256, 16)?;
//! rp.compare_values(256.0, src.width() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "generate", "compare", or "display"
//! - `RUST_LOG`: `tracing` filter directives, e.g. `dibkit_transform=debug`

mod error;
pub mod images;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode, checksum};

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call repeatedly; only the first call installs anything.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // dibkit-test is at crates/dibkit-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the golden files directory
pub fn golden_dir() -> String {
    format!("{}/tests/golden", workspace_root())
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
