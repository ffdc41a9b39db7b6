//! Cubic convolution kernel
//!
//! [`CUBIC_TABLE`] samples the cubic kernel with `a = -1` at `x = i / 256`
//! for `i` in `0..=512`, scaled by 256:
//!
//! - `|x| < 1`: `1 - 2x^2 + |x|^3`
//! - `1 <= |x| < 2`: `4 - 8|x| + 5x^2 - |x|^3`
//!
//! The table is built at compile time with exact integer arithmetic.

/// Kernel weights scaled by 256, indexed by distance in 1/256 pixel.
pub static CUBIC_TABLE: [i16; 513] = build_table();

const fn round_div(num: i64, den: i64) -> i64 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

const fn kernel_at(i: i64) -> i16 {
    // numerators over 256^3 / 256 = 65536
    let v = if i < 256 {
        16_777_216 - 512 * i * i + i * i * i
    } else {
        67_108_864 - 524_288 * i + 1280 * i * i - i * i * i
    };
    round_div(v, 65_536) as i16
}

const fn build_table() -> [i16; 513] {
    let mut table = [0i16; 513];
    let mut i = 0;
    while i < 513 {
        table[i] = kernel_at(i as i64);
        i += 1;
    }
    table
}

/// Four tap weights (scaled by 256) for a sample at fractional offset
/// `frac / 256` past tap 1. Taps sit at -1, 0, +1, +2.
///
/// The weights always sum to exactly 256: rounding residue is absorbed
/// by whichever centre tap is heavier.
pub fn cubic_taps(frac: i32) -> [i32; 4] {
    let w = frac.clamp(0, 256) as usize;
    let mut taps = [
        i32::from(CUBIC_TABLE[256 + w]),
        i32::from(CUBIC_TABLE[w]),
        i32::from(CUBIC_TABLE[256 - w]),
        i32::from(CUBIC_TABLE[512 - w]),
    ];
    let residue = 256 - taps.iter().sum::<i32>();
    if taps[1] >= taps[2] {
        taps[1] += residue;
    } else {
        taps[2] += residue;
    }
    taps
}
