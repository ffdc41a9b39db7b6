//! Affine matrix and float rectangles
//!
//! [`Matrix`] maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`. Image
//! placement matrices map the unit square onto the device; image space is
//! y-up, so row 0 of a bitmap sits at `y = 1` of the unit square.

use crate::rect::Rect;

/// Largest coordinate magnitude of a rectangle derived from float edges.
///
/// Integer rectangles stay inside `±MAX_COORD`, so their widths and
/// offsets never overflow `i32`.
pub const MAX_COORD: i32 = 1 << 29;

fn to_coord(v: f32) -> i32 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(-(MAX_COORD as f32), MAX_COORD as f32) as i32
}

/// A rectangle with float edges, `top <= bottom` in y-down device space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl FloatRect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from an integer rectangle
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(
            rect.left as f32,
            rect.top as f32,
            rect.right as f32,
            rect.bottom as f32,
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether every edge is finite and within [`MAX_COORD`].
    pub fn fits_coords(&self) -> bool {
        let limit = MAX_COORD as f32;
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite() && v.abs() <= limit)
    }

    /// Smallest integer rectangle containing this one (floor/ceil),
    /// clamped to [`MAX_COORD`].
    pub fn outer_rect(&self) -> Rect {
        Rect::new(
            to_coord(self.left.floor()),
            to_coord(self.top.floor()),
            to_coord(self.right.ceil()),
            to_coord(self.bottom.ceil()),
        )
    }

    /// Integer rectangle that best matches this one.
    ///
    /// Each axis gets `ceil(extent)` pixels, starting at whichever of
    /// `floor(start)` / `ceil(start)` leaves the smaller total edge error.
    /// A non-zero extent therefore always yields at least one pixel.
    pub fn closest_rect(&self) -> Rect {
        let (left, right) = match_float_range(self.left, self.right);
        let (top, bottom) = match_float_range(self.top, self.bottom);
        Rect::new(left, top, right, bottom)
    }
}

fn match_float_range(f1: f32, f2: f32) -> (i32, i32) {
    let length = (f2 - f1).ceil();
    let f1_floor = f1.floor();
    let f1_ceil = f1.ceil();
    let error1 = f1 - f1_floor + (f2 - f1_floor - length).abs();
    let error2 = f1_ceil - f1 + (f2 - f1_ceil - length).abs();
    let start = if error1 > error2 { f1_ceil } else { f1_floor };
    (to_coord(start), to_coord(start + length))
}

/// 2-D affine transformation matrix
///
/// Stored as `[a b c d e f]`; see the module documentation for the mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    /// Create a matrix from its six coefficients
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity matrix
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Create a translation matrix
    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Create a scaling matrix
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Compose: the result applies `self` first, then `other`.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix::new(
            self.a * other.a + self.b * other.c,
            self.a * other.b + self.b * other.d,
            self.c * other.a + self.d * other.c,
            self.c * other.b + self.d * other.d,
            self.e * other.a + self.f * other.c + other.e,
            self.e * other.b + self.f * other.d + other.f,
        )
    }

    /// Compute the inverse matrix.
    ///
    /// Returns `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Matrix::new(
            self.d / det,
            -self.b / det,
            -self.c / det,
            self.a / det,
            (self.c * self.f - self.d * self.e) / det,
            (self.b * self.e - self.a * self.f) / det,
        ))
    }

    /// Append a translation.
    pub fn translate(&self, x: f32, y: f32) -> Matrix {
        Matrix::new(self.a, self.b, self.c, self.d, self.e + x, self.f + y)
    }

    /// Transform a point
    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Bounding box of the four transformed corners of `rect`
    pub fn transform_rect(&self, rect: &FloatRect) -> FloatRect {
        let corners = [
            self.transform_point(rect.left, rect.top),
            self.transform_point(rect.right, rect.top),
            self.transform_point(rect.left, rect.bottom),
            self.transform_point(rect.right, rect.bottom),
        ];
        let mut out = FloatRect::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1);
        for &(x, y) in &corners[1..] {
            out.left = out.left.min(x);
            out.right = out.right.max(x);
            out.top = out.top.min(y);
            out.bottom = out.bottom.max(y);
        }
        out
    }

    /// Image of the unit square
    pub fn unit_rect(&self) -> FloatRect {
        self.transform_rect(&FloatRect::new(0.0, 0.0, 1.0, 1.0))
    }

    /// Length of the image of the unit x vector
    pub fn x_unit(&self) -> f32 {
        self.a.hypot(self.b)
    }

    /// Length of the image of the unit y vector
    pub fn y_unit(&self) -> f32 {
        self.c.hypot(self.d)
    }

    /// Whether the matrix is (nearly) a pure 90 or 270 degree rotation
    /// plus scaling.
    pub fn is_90_rotation(&self) -> bool {
        (self.a * 1000.0).abs() < self.b.abs() && (self.d * 1000.0).abs() < self.c.abs()
    }

    /// Whether the matrix is (nearly) a pure axis-aligned scaling.
    pub fn is_scaled(&self) -> bool {
        (self.b * 1000.0).abs() < self.a.abs() && (self.c * 1000.0).abs() < self.d.abs()
    }
}
