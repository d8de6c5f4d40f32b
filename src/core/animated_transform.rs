use super::geometry::{Point3f, Ray, Vector3f};
use super::math::{lerp, Float};
use super::matrix::Matrix4x4;
use super::quaternion::{slerp, Quaternion};
use super::transform::Transform;

/// A transform that varies over a time interval, interpolating between two
/// keyframe transforms. Each keyframe is decomposed into translation,
/// rotation and scale so the components can be interpolated independently.
#[derive(Debug, Copy, Clone)]
pub struct AnimatedTransform {
    start_transform: Transform,
    end_transform: Transform,
    start_time: Float,
    end_time: Float,
    actually_animated: bool,
    t: [Vector3f; 2],
    r: [Quaternion; 2],
    s: [Matrix4x4; 2]
}

impl AnimatedTransform {
    pub fn new(
        start_transform: Transform,
        start_time: Float,
        end_transform: Transform,
        end_time: Float
    ) -> AnimatedTransform {
        let actually_animated = start_transform != end_transform;
        let (t0, r0, s0) = AnimatedTransform::decompose(&start_transform.m);
        let (t1, mut r1, s1) = AnimatedTransform::decompose(&end_transform.m);
        // Flip second quaternion if needed to select the shortest path
        if r0.dot(&r1) < 0.0 {
            r1 = -r1;
        }
        AnimatedTransform {
            start_transform,
            end_transform,
            start_time,
            end_time,
            actually_animated,
            t: [t0, t1],
            r: [r0, r1],
            s: [s0, s1]
        }
    }

    /// A constant transform over all time.
    pub fn constant(t: Transform) -> AnimatedTransform {
        AnimatedTransform::new(t, 0.0, t, 1.0)
    }

    /// Decompose an affine matrix into translation, rotation and scale,
    /// extracting the rotation by iterated polar decomposition.
    fn decompose(m: &Matrix4x4) -> (Vector3f, Quaternion, Matrix4x4) {
        // Extract translation _t_ from transformation matrix
        let t = Vector3f::new(m.m[0][3], m.m[1][3], m.m[2][3]);

        // Compute new transformation matrix _mm_ without translation
        let mut mm = *m;
        for i in 0..3 {
            mm.m[i][3] = 0.0;
        }
        mm.m[3] = [0.0, 0.0, 0.0, 1.0];

        // Extract rotation _rot_ from transformation matrix
        let mut rot = mm;
        let mut norm: Float = 1.0;
        let mut count = 0;
        while count < 100 && norm > 0.0001 {
            // Compute next matrix _rnext_ in series
            let mut rnext = Matrix4x4::default();
            let rit = rot.transpose().inverse();
            for i in 0..4 {
                for j in 0..4 {
                    rnext.m[i][j] = 0.5 * (rot.m[i][j] + rit.m[i][j]);
                }
            }

            // Compute norm of difference between _rot_ and _rnext_
            norm = 0.0;
            for i in 0..3 {
                let n = (rot.m[i][0] - rnext.m[i][0]).abs()
                    + (rot.m[i][1] - rnext.m[i][1]).abs()
                    + (rot.m[i][2] - rnext.m[i][2]).abs();
                norm = norm.max(n);
            }
            rot = rnext;
            count += 1;
        }
        let rquat = Quaternion::from_transform(&Transform::new(rot));

        // Compute scale _s_ using rotation and original matrix
        let s = rot.inverse().mul(&mm);
        (t, rquat, s)
    }

    /// The transform at a given time, clamped to the keyframe interval.
    pub fn interpolate(&self, time: Float) -> Transform {
        // Handle boundary conditions for matrix interpolation
        if !self.actually_animated || time <= self.start_time {
            return self.start_transform;
        }
        if time >= self.end_time {
            return self.end_transform;
        }
        let dt = (time - self.start_time) / (self.end_time - self.start_time);

        // Interpolate translation at _dt_
        let trans = self.t[0] * (1.0 - dt) + self.t[1] * dt;

        // Interpolate rotation at _dt_
        let rotate = slerp(dt, &self.r[0], &self.r[1]);

        // Interpolate scale at _dt_
        let mut scale = Matrix4x4::default();
        for i in 0..3 {
            for j in 0..3 {
                scale.m[i][j] = lerp(dt, self.s[0].m[i][j], self.s[1].m[i][j]);
            }
        }

        // Compute interpolated matrix as product of interpolated components
        Transform::translate(&trans) * rotate.to_transform() * Transform::new(scale)
    }

    pub fn transform_point(&self, time: Float, p: &Point3f) -> Point3f {
        self.interpolate(time).transform_point(p)
    }

    pub fn transform_vector(&self, time: Float, v: &Vector3f) -> Vector3f {
        self.interpolate(time).transform_vector(v)
    }

    /// Transform a ray at the ray's own time.
    pub fn transform_ray(&self, r: &Ray) -> Ray {
        if !self.actually_animated {
            self.start_transform.transform_ray(r)
        } else {
            self.interpolate(r.time).transform_ray(r)
        }
    }
}
