use crate::core::math::{lerp, Float};
use super::{Point2f, Vector2f};

/// An axis aligned 2D bounding box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds2f {
    pub min: Point2f,
    pub max: Point2f
}

impl Bounds2f {
    pub fn new(p1: Point2f, p2: Point2f) -> Bounds2f {
        Bounds2f {
            min: p1.min(&p2),
            max: p1.max(&p2)
        }
    }

    /// Creates a Bounds2f that encompasses a single point.
    pub fn from_point(p: Point2f) -> Bounds2f {
        Bounds2f { min: p, max: p }
    }

    /// Returns a new bounds encompassing both operands.
    pub fn union(&self, b: &Bounds2f) -> Bounds2f {
        Bounds2f {
            min: self.min.min(&b.min),
            max: self.max.max(&b.max)
        }
    }

    /// Returns a new bounds grown to contain the given point.
    pub fn union_point(&self, p: &Point2f) -> Bounds2f {
        Bounds2f {
            min: self.min.min(p),
            max: self.max.max(p)
        }
    }

    /// Test if a point is inside the bounds, boundary included.
    pub fn inside(&self, p: &Point2f) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y
    }

    /// Linearly interpolates between the corners of the box by the given
    /// amount in each dimension.
    pub fn lerp(&self, t: &Point2f) -> Point2f {
        Point2f {
            x: lerp(t.x, self.min.x, self.max.x),
            y: lerp(t.y, self.min.y, self.max.y)
        }
    }

    /// The vector along the box diagonal.
    pub fn diagonal(&self) -> Vector2f {
        self.max - self.min
    }

    pub fn area(&self) -> Float {
        let d = self.diagonal();
        d.x * d.y
    }

    /// Returns the bounds padded by delta on every side.
    pub fn expand(&self, delta: Float) -> Bounds2f {
        Bounds2f {
            min: self.min - Vector2f::new(delta, delta),
            max: self.max + Vector2f::new(delta, delta)
        }
    }
}

impl Default for Bounds2f {
    /// A default constructor with min and max set to violate min < max, so
    /// that the first union collapses onto its operand.
    fn default() -> Bounds2f {
        Bounds2f {
            min: Point2f::new(Float::MAX, Float::MAX),
            max: Point2f::new(Float::MIN, Float::MIN)
        }
    }
}
