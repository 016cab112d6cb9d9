use serde::{Deserialize, Serialize};

/// A pixel position in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in pixel coordinates, corners `(x1, y1)`-`(x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from detector float coordinates, truncating toward zero.
    pub fn from_f64(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1 as i32,
            y1: y1 as i32,
            x2: x2 as i32,
            y2: y2 as i32,
        }
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        self.x1 <= point.x && point.x <= self.x2 && self.y1 <= point.y && point.y <= self.y2
    }

    /// True when both extents are strictly positive.
    pub fn is_well_formed(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Bottom-center of the box, approximating where a standing person's feet are.
    pub fn bottom_center(&self) -> Point {
        Point {
            x: (i64::from(self.x1) + i64::from(self.x2)).div_euclid(2) as i32,
            y: self.y2,
        }
    }

    pub fn top_left(&self) -> Point {
        Point {
            x: self.x1,
            y: self.y1,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}
