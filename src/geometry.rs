use serde::{Deserialize, Serialize};

/// Integer pixel coordinate. Canvas space, origin top-left, y grows down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with *inclusive* corners: a rect spanning a single
/// pixel has `min == max`. Inclusive corners match how two-corner drawing
/// gestures behave — the rect between identical press/release points still
/// covers one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Single-pixel rect at `p`.
    pub const fn at(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// Smallest rect covering both corner points, in any order.
    pub fn spanning(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Number of columns covered (inclusive corners, so never zero).
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1).max(0) as u32
    }

    /// Grow to cover `p`.
    pub fn include(self, p: Point) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    pub fn union(self, other: Rect) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Outset by `n` pixels on every side.
    pub fn padded(self, n: i32) -> Self {
        Self {
            min_x: self.min_x - n,
            min_y: self.min_y - n,
            max_x: self.max_x + n,
            max_y: self.max_y + n,
        }
    }

    /// Map a canvas-space rect to view space under an integer zoom factor.
    /// The whole zoomed footprint of every covered pixel is included.
    pub fn scaled(self, zoom: u32) -> Self {
        let z = zoom as i32;
        Self {
            min_x: self.min_x * z,
            min_y: self.min_y * z,
            max_x: (self.max_x + 1) * z - 1,
            max_y: (self.max_y + 1) * z - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanning_orders_corners() {
        let r = Rect::spanning(Point::new(5, 1), Point::new(2, 8));
        assert_eq!(r, Rect::new(2, 1, 5, 8));
        assert_eq!(r.width(), 4);
        assert_eq!(r.height(), 8);
    }

    #[test]
    fn single_pixel_rect_has_unit_size() {
        let r = Rect::at(Point::new(3, 3));
        assert_eq!(r.width(), 1);
        assert_eq!(r.height(), 1);
    }

    #[test]
    fn scaled_covers_zoomed_pixels() {
        let r = Rect::new(1, 1, 2, 2).scaled(4);
        assert_eq!(r, Rect::new(4, 4, 11, 11));
    }
}
