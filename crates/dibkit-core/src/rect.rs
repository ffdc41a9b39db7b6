//! Rect - Integer rectangle
//!
//! Edges are stored directly; `right` and `bottom` are exclusive.

/// An integer rectangle with exclusive right and bottom edges
///
/// Unlike a float rectangle this is always axis-aligned in device space,
/// with y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left x coordinate (inclusive)
    pub left: i32,
    /// Top y coordinate (inclusive)
    pub top: i32,
    /// Right x coordinate (exclusive)
    pub right: i32,
    /// Bottom y coordinate (exclusive)
    pub bottom: i32,
}

impl Rect {
    /// Create a rectangle from its edges
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle at the origin with the given size
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Get the width
    #[inline]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Get the height
    #[inline]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Check if the rectangle covers no pixels
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Check if a point is inside the rectangle
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Swap edges so that `left <= right` and `top <= bottom`
    pub fn normalize(&self) -> Rect {
        Rect::new(
            self.left.min(self.right),
            self.top.min(self.bottom),
            self.left.max(self.right),
            self.top.max(self.bottom),
        )
    }

    /// Compute the intersection of two rectangles
    ///
    /// Returns `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() { None } else { Some(r) }
    }

    /// Translate the rectangle by (dx, dy)
    pub const fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }
}
