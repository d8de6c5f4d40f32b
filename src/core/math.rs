//! Scalar type definitions and numeric utilities.
use std::ops::{Add, Mul, Sub};

#[cfg(feature = "float_as_double")]
mod float_mod {
    pub type Float = f64;
    pub mod consts {
        pub use std::f64::consts::*;
        pub const MACHINE_EPSILON: f64 = std::f64::EPSILON * 0.5;
        pub const INFINITY: f64 = std::f64::INFINITY;
    }
}
#[cfg(not(feature = "float_as_double"))]
mod float_mod {
    pub type Float = f32;
    pub mod consts {
        pub use std::f32::consts::*;
        pub const MACHINE_EPSILON: f32 = std::f32::EPSILON * 0.5;
        pub const INFINITY: f32 = std::f32::INFINITY;
    }
}

pub use float_mod::Float;
pub mod consts {
    use super::float_mod::Float;
    pub use super::float_mod::consts::*;
    pub const INV_PI: Float = 1.0 / PI;
    pub const SHADOW_EPSILON: Float = 0.0001;
}

/// Linearly interpolate between two values.
#[inline]
pub fn lerp<S, T>(t: S, a: T, b: T) -> T
where
S: num::One + Sub<S, Output = S> + Copy,
T: Add<T, Output = T> + Mul<S, Output = T>
{
    a * (S::one() - t) + b * t
}

/// Solve a quadratic a t^2 + b t + c = 0, returning the two roots in
/// ascending order. The discriminant is evaluated in f64 to limit
/// cancellation error.
#[inline]
pub fn quadratic(a: Float, b: Float, c: Float, t0: &mut Float, t1: &mut Float) -> bool {
    // Find quadratic discriminant
    let discrim = b as f64 * b as f64 - 4.0 * a as f64 * c as f64;
    if discrim < 0.0 {
        return false;
    }
    let root_discrim = discrim.sqrt();

    // Compute quadratic _t_ values
    let q = if (b as f64) < 0.0 {
        -0.5 * (b as f64 - root_discrim)
    } else {
        -0.5 * (b as f64 + root_discrim)
    };
    *t0 = (q / a as f64) as Float;
    *t1 = (c as f64 / q) as Float;
    if *t0 > *t1 {
        std::mem::swap(t0, t1);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_two_roots() {
        let mut t0 = 0.0;
        let mut t1 = 0.0;
        // (t - 1)(t - 3) = t^2 - 4t + 3
        assert!(quadratic(1.0, -4.0, 3.0, &mut t0, &mut t1));
        assert!((t0 - 1.0).abs() < 1e-6);
        assert!((t1 - 3.0).abs() < 1e-6);
    }

    #[test]
    fn quadratic_no_real_roots() {
        let mut t0 = 0.0;
        let mut t1 = 0.0;
        assert!(!quadratic(1.0, 0.0, 1.0, &mut t0, &mut t1));
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(0.0 as Float, 2.0, 8.0), 2.0);
        assert_eq!(lerp(1.0 as Float, 2.0, 8.0), 8.0);
        assert_eq!(lerp(0.5 as Float, 2.0, 8.0), 5.0);
    }
}
