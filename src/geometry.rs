//! Shared geometry types used across layout, paint, and hit testing.
//!
//! Everything here is plain value math: rectangles in logical pixels and the
//! translation-only transform accumulated along a hit-test path.

/// A point in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rect at the origin with the given size.
    pub const fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Containment uses half-open edges: the left/top edge is inside, the
    /// right/bottom edge is not.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// The smallest rect covering both inputs.
    ///
    /// Union is associative, commutative, and idempotent, which is what lets
    /// dirty areas merge in any order.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(left, top, right - left, bottom - top)
    }

    /// The overlap of both inputs; degenerate (zero-size) when they don't touch.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        Rect::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Accumulated window-to-local coordinate transform along a hit-test path.
///
/// The path invariant only ever composes widget offsets and scroll offsets,
/// so the transform is a pure translation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub dx: f32,
    pub dy: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { dx: 0.0, dy: 0.0 };

    /// Compose a further translation onto this transform.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.dx += dx;
        self.dy += dy;
    }

    /// Map a window-space point into the local space this transform targets.
    pub fn apply(&self, x: f32, y: f32) -> Point {
        Point::new(x + self.dx, y + self.dy)
    }
}
