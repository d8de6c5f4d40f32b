use std::ops::*;
use crate::core::math::Float;
use super::{Vector2f, Vector3f};

/// Representation of a 2D point.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point2f {
    pub x: Float,
    pub y: Float
}

impl Point2f {
    #[inline]
    pub fn new(x: Float, y: Float) -> Point2f {
        Point2f { x, y }
    }

    #[inline]
    pub fn zero() -> Point2f {
        Point2f { x: 0.0, y: 0.0 }
    }

    /// Returns a component wise minimum.
    #[inline]
    pub fn min(&self, o: &Point2f) -> Point2f {
        Point2f::new(self.x.min(o.x), self.y.min(o.y))
    }

    /// Returns a component wise maximum.
    #[inline]
    pub fn max(&self, o: &Point2f) -> Point2f {
        Point2f::new(self.x.max(o.x), self.y.max(o.y))
    }

    pub fn distance(&self, o: &Point2f) -> Float {
        (*self - *o).length()
    }
}

impl Add<Vector2f> for Point2f {
    type Output = Point2f;
    fn add(self, v: Vector2f) -> Point2f {
        Point2f::new(self.x + v.x, self.y + v.y)
    }
}

impl Sub for Point2f {
    type Output = Vector2f;
    fn sub(self, o: Point2f) -> Vector2f {
        Vector2f::new(self.x - o.x, self.y - o.y)
    }
}

impl Sub<Vector2f> for Point2f {
    type Output = Point2f;
    fn sub(self, v: Vector2f) -> Point2f {
        Point2f::new(self.x - v.x, self.y - v.y)
    }
}

impl Mul<Float> for Point2f {
    type Output = Point2f;
    fn mul(self, s: Float) -> Point2f {
        Point2f::new(self.x * s, self.y * s)
    }
}

impl Mul<Point2f> for Float {
    type Output = Point2f;
    fn mul(self, p: Point2f) -> Point2f {
        p * self
    }
}

/// A 2D point with integer coordinates, used for raster addressing.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Point2i {
    pub x: i32,
    pub y: i32
}

impl Point2i {
    #[inline]
    pub fn new(x: i32, y: i32) -> Point2i {
        Point2i { x, y }
    }
}

/// Representation of a 3D point.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point3f {
    pub x: Float,
    pub y: Float,
    pub z: Float
}

impl Point3f {
    #[inline]
    pub fn new(x: Float, y: Float, z: Float) -> Point3f {
        Point3f { x, y, z }
    }

    #[inline]
    pub fn zero() -> Point3f {
        Point3f { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn distance(&self, o: &Point3f) -> Float {
        (*self - *o).length()
    }
}

impl Add<Vector3f> for Point3f {
    type Output = Point3f;
    fn add(self, v: Vector3f) -> Point3f {
        Point3f::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub for Point3f {
    type Output = Vector3f;
    fn sub(self, o: Point3f) -> Vector3f {
        Vector3f::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Sub<Vector3f> for Point3f {
    type Output = Point3f;
    fn sub(self, v: Vector3f) -> Point3f {
        Point3f::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl From<Point3f> for Vector3f {
    fn from(p: Point3f) -> Vector3f {
        Vector3f::new(p.x, p.y, p.z)
    }
}
