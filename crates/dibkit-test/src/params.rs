//! Regression test parameters and operations

use crate::error::{TestError, TestResult};
use crate::{golden_dir, init_tracing, regout_dir};
use dibkit_core::Dib;
use std::fs;
use std::path::Path;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Generate golden files
    Generate,
    /// Compare with golden files (default)
    #[default]
    Compare,
    /// Display mode - run without comparison
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "generate" => Self::Generate,
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// FNV-1a digest of a bitmap's geometry, format and significant bytes.
///
/// Row padding is excluded, so bitmaps that differ only in pitch hash
/// equal. Palette entries and the alpha plane are included.
pub fn checksum(dib: &Dib) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn feed(hash: &mut u64, bytes: &[u8]) {
        for &b in bytes {
            *hash ^= u64::from(b);
            *hash = hash.wrapping_mul(PRIME);
        }
    }

    let mut hash = OFFSET;
    feed(&mut hash, &dib.width().to_le_bytes());
    feed(&mut hash, &dib.height().to_le_bytes());
    feed(&mut hash, dib.format().to_string().as_bytes());
    let row_bytes = (dib.width() as usize * usize::from(dib.bpp())).div_ceil(8);
    for y in 0..dib.height() {
        feed(&mut hash, &dib.scanline(y)[..row_bytes]);
    }
    if let Some(palette) = dib.palette() {
        for entry in palette.entries() {
            feed(&mut hash, &entry.to_le_bytes());
        }
    }
    if let Some(mask) = dib.alpha_mask() {
        feed(&mut hash, &checksum(mask).to_le_bytes());
    }
    hash
}

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, mode, and success status.
pub struct RegParams {
    /// Name of the test (e.g., "stretch")
    pub test_name: String,
    /// Current test index (incremented before each check)
    index: usize,
    /// Test mode (generate, compare, or display)
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// Installs the test `tracing` subscriber and makes sure the golden
    /// and regout directories exist.
    pub fn new(test_name: &str) -> Self {
        init_tracing();
        let mode = RegTestMode::from_env();

        let _ = fs::create_dir_all(golden_dir());
        let _ = fs::create_dir_all(regout_dir());

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta {
            self.fail(format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            ));
            false
        } else {
            true
        }
    }

    /// Compare two bitmaps pixel by pixel
    ///
    /// Dimensions and formats must match, and every pixel must decode to
    /// the same ARGB value.
    pub fn compare_dibs(&mut self, dib1: &Dib, dib2: &Dib) -> bool {
        self.index += 1;

        if !dib1.sizes_equal(dib2) || dib1.format() != dib2.format() {
            self.fail(format!(
                "Failure in {}_reg: dib comparison for index {} - {}x{} {} vs {}x{} {}",
                self.test_name,
                self.index,
                dib1.width(),
                dib1.height(),
                dib1.format(),
                dib2.width(),
                dib2.height(),
                dib2.format()
            ));
            return false;
        }

        for y in 0..dib1.height() {
            for x in 0..dib1.width() {
                let p1 = dib1.pixel_argb(x, y);
                let p2 = dib2.pixel_argb(x, y);
                if p1 != p2 {
                    self.fail(format!(
                        "Failure in {}_reg: dib comparison for index {} - pixel mismatch at ({}, {}): {:08x?} vs {:08x?}",
                        self.test_name, self.index, x, y, p1, p2
                    ));
                    return false;
                }
            }
        }

        true
    }

    /// Compare two byte arrays
    ///
    /// # Returns
    ///
    /// `true` if data is identical, `false` otherwise.
    pub fn compare_bytes(&mut self, data1: &[u8], data2: &[u8]) -> bool {
        self.index += 1;

        if data1 != data2 {
            let first = data1.iter().zip(data2).position(|(a, b)| a != b);
            self.fail(format!(
                "Failure in {}_reg: byte comparison for index {}\n\
                 sizes: {} vs {}, first difference at {:?}",
                self.test_name,
                self.index,
                data1.len(),
                data2.len(),
                first
            ));
            false
        } else {
            true
        }
    }

    /// Record the checksum of `dib` and check it against its golden file
    ///
    /// In generate mode the checksum becomes the golden file. In compare
    /// mode a missing golden file is reported and skipped; a differing
    /// one is a failure. Display mode only writes the local file.
    pub fn check_dib(&mut self, dib: &Dib) -> TestResult<()> {
        self.index += 1;
        let text = format!("{:016x}\n", checksum(dib));

        let local_path = format!(
            "{}/{}.{:02}.txt",
            regout_dir(),
            self.test_name,
            self.index
        );
        fs::write(&local_path, &text)?;

        let golden_path = format!(
            "{}/{}.{:02}.txt",
            golden_dir(),
            self.test_name,
            self.index
        );

        match self.mode {
            RegTestMode::Generate => {
                fs::write(&golden_path, &text)?;
                eprintln!("Generated: {}", golden_path);
            }
            RegTestMode::Compare => {
                if !Path::new(&golden_path).exists() {
                    eprintln!(
                        "{}_reg, index {}: no golden file {}, skipping",
                        self.test_name, self.index, golden_path
                    );
                    return Ok(());
                }
                let golden = fs::read_to_string(&golden_path)?;
                if u64::from_str_radix(golden.trim(), 16).is_err() {
                    return Err(TestError::MalformedGolden { path: golden_path });
                }
                if golden.trim() != text.trim() {
                    self.fail(format!(
                        "Failure in {}_reg, index {}: checksum {} differs from {}",
                        self.test_name,
                        self.index,
                        text.trim(),
                        golden_path
                    ));
                }
            }
            RegTestMode::Display => {}
        }

        Ok(())
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all checks passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dibkit_core::{DibMut, PixelFormat};

    #[test]
    fn test_mode_from_env() {
        let mode = RegTestMode::from_env();
        assert!(matches!(
            mode,
            RegTestMode::Compare | RegTestMode::Generate | RegTestMode::Display
        ));
    }

    #[test]
    fn test_compare_values() {
        let mut rp = RegParams::new("params_values");
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert!(rp.is_success());
        assert!(!rp.compare_values(100.0, 102.0, 1.0));
        assert!(!rp.is_success());
        assert_eq!(rp.index(), 2);
        assert_eq!(rp.failures().len(), 1);
    }

    #[test]
    fn test_compare_dibs() {
        let mut rp = RegParams::new("params_dibs");
        let mut a = DibMut::new(3, 2, PixelFormat::RGB_24).unwrap();
        a.set_pixel_argb(1, 1, 0xff12_3456);
        let a: Dib = a.into();
        let b = a.deep_clone();
        assert!(rp.compare_dibs(&a, &b));
        let mut c = b.to_mut();
        c.set_pixel_argb(2, 0, 0xffff_ffff);
        assert!(!rp.compare_dibs(&a, &c.into()));
        let d = Dib::new(3, 2, PixelFormat::RGB_32).unwrap();
        assert!(!rp.compare_dibs(&a, &d));
    }

    #[test]
    fn test_checksum_ignores_padding() {
        let a = Dib::new(3, 2, PixelFormat::RGB_24).unwrap();
        let b = Dib::with_pitch(3, 2, PixelFormat::RGB_24, 32).unwrap();
        assert_eq!(checksum(&a), checksum(&b));
        let c = Dib::new(2, 3, PixelFormat::RGB_24).unwrap();
        assert_ne!(checksum(&a), checksum(&c));
    }

    #[test]
    fn test_compare_bytes() {
        let mut rp = RegParams::new("params_bytes");
        assert!(rp.compare_bytes(&[1, 2, 3], &[1, 2, 3]));
        assert!(!rp.compare_bytes(&[1, 2, 3], &[1, 9, 3]));
    }
}
