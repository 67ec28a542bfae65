//! Geometry primitives for control placement.
//!
//! All coordinates are screen pixels with the origin at the top-left and
//! `y` growing downwards. A [`Rect`] with zero width or height is valid and
//! contains no points.

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// X position (left edge).
    pub x: f32,
    /// Y position (top edge).
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// A zero-sized rect at the origin.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle from position and size.
    #[must_use]
    pub const fn from_pos_size(pos: (f32, f32), size: (f32, f32)) -> Self {
        Self {
            x: pos.0,
            y: pos.1,
            width: size.0,
            height: size.1,
        }
    }

    /// Returns the top-left corner.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns the right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Returns the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Returns true if the rectangle covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns true if the point is inside the rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom edges are not.
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns true if the point is inside the rectangle.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        self.contains(point.x, point.y)
    }

    /// Returns true if `other` lies entirely within this rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns true if two rectangles intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns the intersection of two rectangles, or None if they don't intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(Self::new(x, y, right - x, bottom - y))
    }

    /// Clips this rectangle to `bounds`.
    ///
    /// Unlike [`Rect::intersection`] this always returns a rectangle inside
    /// `bounds`: when the two do not overlap the result is an empty rectangle
    /// pinned to the nearest edge of `bounds`.
    #[must_use]
    pub fn clip(&self, bounds: &Self) -> Self {
        let x = self.x.clamp(bounds.x, bounds.right().max(bounds.x));
        let y = self.y.clamp(bounds.y, bounds.bottom().max(bounds.y));
        let right = self.right().clamp(x, bounds.right().max(x));
        let bottom = self.bottom().clamp(y, bounds.bottom().max(y));
        Self::new(x, y, right - x, bottom - y)
    }

    /// Returns this rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Returns this rectangle with the given origin and the same size.
    #[must_use]
    pub fn with_origin(&self, origin: Point) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }

    /// Shrinks the rectangle by a per-side inset.
    #[must_use]
    pub fn inset(&self, padding: Padding) -> Self {
        Self::new(
            self.x + padding.left,
            self.y + padding.top,
            (self.width - padding.horizontal()).max(0.0),
            (self.height - padding.vertical()).max(0.0),
        )
    }
}

/// Per-side spacing, used for box padding and frame insets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Padding {
    /// Left inset.
    pub left: f32,
    /// Top inset.
    pub top: f32,
    /// Right inset.
    pub right: f32,
    /// Bottom inset.
    pub bottom: f32,
}

impl Padding {
    /// No padding.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates padding from left, top, right, bottom.
    #[must_use]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Same inset on every side.
    #[must_use]
    pub const fn uniform(amount: f32) -> Self {
        Self::new(amount, amount, amount, amount)
    }

    /// Left plus right.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top plus bottom.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    /// Sums two insets side by side.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::new(
            self.left + other.left,
            self.top + other.top,
            self.right + other.right,
            self.bottom + other.bottom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);

        assert!(rect.contains(50.0, 30.0));
        assert!(rect.contains(10.0, 20.0));
        assert!(!rect.contains(110.0, 30.0));
        assert!(!rect.contains(5.0, 30.0));
        assert!(!rect.contains(50.0, 80.0));
    }

    #[test]
    fn test_clip_partial_overlap() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let clipped = Rect::new(80.0, -10.0, 40.0, 40.0).clip(&bounds);

        assert_eq!(clipped, Rect::new(80.0, 0.0, 20.0, 30.0));
        assert!(bounds.contains_rect(&clipped));
    }

    #[test]
    fn test_clip_disjoint_is_empty_inside_bounds() {
        let bounds = Rect::new(10.0, 10.0, 50.0, 50.0);
        let clipped = Rect::new(200.0, 0.0, 20.0, 20.0).clip(&bounds);

        assert!(clipped.is_empty());
        assert!(bounds.contains_rect(&clipped));
        assert!(!clipped.contains(60.0, 10.0));
    }

    #[test]
    fn test_inset_and_translate() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0).inset(Padding::new(4.0, 2.0, 6.0, 8.0));
        assert_eq!(rect, Rect::new(4.0, 2.0, 90.0, 40.0));
        assert_eq!(rect.translate(1.0, -2.0).origin(), Point::new(5.0, 0.0));
    }
}
