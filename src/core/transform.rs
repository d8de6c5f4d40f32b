use std::ops::Mul;
use super::geometry::{Normal3f, Point3f, Ray, Vector3f};
use super::math::Float;
use super::matrix::Matrix4x4;

/// An affine transformation, stored with its inverse so that inverting is
/// free at application sites.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub m: Matrix4x4,
    pub m_inv: Matrix4x4
}

impl Transform {
    pub fn new(m: Matrix4x4) -> Transform {
        Transform {
            m,
            m_inv: m.inverse()
        }
    }

    pub fn from_pair(m: Matrix4x4, m_inv: Matrix4x4) -> Transform {
        Transform { m, m_inv }
    }

    /// Return the inverse of this transform.
    pub fn inverse(&self) -> Transform {
        Transform {
            m: self.m_inv,
            m_inv: self.m
        }
    }

    /// Test if this transform is the identity.
    pub fn is_identity(&self) -> bool {
        self.m == Matrix4x4::default()
    }

    /// Create a transform representing a translation.
    pub fn translate(delta: &Vector3f) -> Transform {
        Transform {
            m: Matrix4x4::new(
                1.0, 0.0, 0.0, delta.x,
                0.0, 1.0, 0.0, delta.y,
                0.0, 0.0, 1.0, delta.z,
                0.0, 0.0, 0.0, 1.0
            ),
            m_inv: Matrix4x4::new(
                1.0, 0.0, 0.0, -delta.x,
                0.0, 1.0, 0.0, -delta.y,
                0.0, 0.0, 1.0, -delta.z,
                0.0, 0.0, 0.0, 1.0
            )
        }
    }

    /// Create a transform representing a scale.
    pub fn scale(x: Float, y: Float, z: Float) -> Transform {
        Transform {
            m: Matrix4x4::new(
                x, 0.0, 0.0, 0.0,
                0.0, y, 0.0, 0.0,
                0.0, 0.0, z, 0.0,
                0.0, 0.0, 0.0, 1.0
            ),
            m_inv: Matrix4x4::new(
                1.0 / x, 0.0, 0.0, 0.0,
                0.0, 1.0 / y, 0.0, 0.0,
                0.0, 0.0, 1.0 / z, 0.0,
                0.0, 0.0, 0.0, 1.0
            )
        }
    }

    /// Create a world-to-camera transform for a camera at pos looking at
    /// look, with the given up vector.
    pub fn look_at(pos: &Point3f, look: &Point3f, up: &Vector3f) -> Transform {
        let mut camera_to_world = Matrix4x4::default();
        // Initialize fourth column of viewing matrix
        camera_to_world.m[0][3] = pos.x;
        camera_to_world.m[1][3] = pos.y;
        camera_to_world.m[2][3] = pos.z;
        camera_to_world.m[3][3] = 1.0;
        // Initialize first three columns of viewing matrix
        let dir = (*look - *pos).normalize();
        let right = up.normalize().cross(&dir).normalize();
        let new_up = dir.cross(&right);
        camera_to_world.m[0][0] = right.x;
        camera_to_world.m[1][0] = right.y;
        camera_to_world.m[2][0] = right.z;
        camera_to_world.m[3][0] = 0.0;
        camera_to_world.m[0][1] = new_up.x;
        camera_to_world.m[1][1] = new_up.y;
        camera_to_world.m[2][1] = new_up.z;
        camera_to_world.m[3][1] = 0.0;
        camera_to_world.m[0][2] = dir.x;
        camera_to_world.m[1][2] = dir.y;
        camera_to_world.m[2][2] = dir.z;
        camera_to_world.m[3][2] = 0.0;
        Transform {
            m: camera_to_world.inverse(),
            m_inv: camera_to_world
        }
    }

    /// Transform a point, with the homogeneous divide when needed.
    pub fn transform_point(&self, p: &Point3f) -> Point3f {
        let x = self.m.m[0][0] * p.x + self.m.m[0][1] * p.y + self.m.m[0][2] * p.z + self.m.m[0][3];
        let y = self.m.m[1][0] * p.x + self.m.m[1][1] * p.y + self.m.m[1][2] * p.z + self.m.m[1][3];
        let z = self.m.m[2][0] * p.x + self.m.m[2][1] * p.y + self.m.m[2][2] * p.z + self.m.m[2][3];
        let w = self.m.m[3][0] * p.x + self.m.m[3][1] * p.y + self.m.m[3][2] * p.z + self.m.m[3][3];
        if w == 1.0 {
            Point3f::new(x, y, z)
        } else {
            Point3f::new(x / w, y / w, z / w)
        }
    }

    /// Transform a vector (no translation).
    pub fn transform_vector(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(
            self.m.m[0][0] * v.x + self.m.m[0][1] * v.y + self.m.m[0][2] * v.z,
            self.m.m[1][0] * v.x + self.m.m[1][1] * v.y + self.m.m[1][2] * v.z,
            self.m.m[2][0] * v.x + self.m.m[2][1] * v.y + self.m.m[2][2] * v.z
        )
    }

    /// Transform a surface normal with the inverse transpose.
    pub fn transform_normal(&self, n: &Normal3f) -> Normal3f {
        Normal3f::new(
            self.m_inv.m[0][0] * n.x + self.m_inv.m[1][0] * n.y + self.m_inv.m[2][0] * n.z,
            self.m_inv.m[0][1] * n.x + self.m_inv.m[1][1] * n.y + self.m_inv.m[2][1] * n.z,
            self.m_inv.m[0][2] * n.x + self.m_inv.m[1][2] * n.y + self.m_inv.m[2][2] * n.z
        )
    }

    /// Transform a ray, carrying its parametric and spectral state along.
    pub fn transform_ray(&self, r: &Ray) -> Ray {
        Ray {
            o: self.transform_point(&r.o),
            d: self.transform_vector(&r.d),
            t_max: r.t_max,
            time: r.time,
            wavelength: r.wavelength,
            medium: r.medium.clone()
        }
    }
}

impl Default for Transform {
    fn default() -> Transform {
        Transform {
            m: Matrix4x4::default(),
            m_inv: Matrix4x4::default()
        }
    }
}

impl Mul for Transform {
    type Output = Transform;
    fn mul(self, t2: Transform) -> Transform {
        Transform {
            m: self.m.mul(&t2.m),
            m_inv: t2.m_inv.mul(&self.m_inv)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_flips_z() {
        let t = Transform::scale(1.0, 1.0, -1.0);
        let p = t.transform_point(&Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(p, Point3f::new(1.0, 2.0, -3.0));
        // applying the flip twice is the identity
        let p2 = t.transform_point(&p);
        assert_eq!(p2, Point3f::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn translate_moves_points_not_vectors() {
        let t = Transform::translate(&Vector3f::new(1.0, 0.0, 0.0));
        assert_eq!(t.transform_point(&Point3f::zero()), Point3f::new(1.0, 0.0, 0.0));
        assert_eq!(t.transform_vector(&Vector3f::new(0.0, 1.0, 0.0)), Vector3f::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn compose_then_invert_round_trips() {
        let t = Transform::translate(&Vector3f::new(3.0, -1.0, 2.0)) * Transform::scale(2.0, 2.0, 2.0);
        let p = Point3f::new(0.5, 0.25, -1.5);
        let q = t.inverse().transform_point(&t.transform_point(&p));
        assert!((q - p).length() < 1e-5);
    }
}
