use std::fmt;
use std::sync::Arc;
use crate::core::math::{consts, Float};
use crate::core::medium::Medium;
use super::{Point3f, Vector3f};

/// Reference wavelength (nm) used when a caller does not request a
/// particular one; dispersion vanishes there.
pub const DEFAULT_WAVELENGTH: Float = 550.0;

/// A ray with an origin, direction and parametric extent. The wavelength
/// rides along so that a dispersive lens system can bend each spectral
/// sample differently.
#[derive(Clone)]
pub struct Ray {
    pub o: Point3f,
    pub d: Vector3f,
    pub t_max: Float,
    pub time: Float,
    pub wavelength: Float,
    pub medium: Option<Arc<dyn Medium + Send + Sync>>
}

impl Ray {
    pub fn new(o: Point3f, d: Vector3f) -> Ray {
        Ray {
            o,
            d,
            t_max: consts::INFINITY,
            time: 0.0,
            wavelength: DEFAULT_WAVELENGTH,
            medium: None
        }
    }

    /// Return the point at parameter t along the ray.
    pub fn point_at_time(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

impl Default for Ray {
    fn default() -> Ray {
        Ray {
            o: Point3f::zero(),
            d: Vector3f::zero(),
            t_max: consts::INFINITY,
            time: 0.0,
            wavelength: DEFAULT_WAVELENGTH,
            medium: None
        }
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[o=({}, {}, {}), d=({}, {}, {}), t_max={}, time={}]",
            self.o.x, self.o.y, self.o.z, self.d.x, self.d.y, self.d.z,
            self.t_max, self.time)
    }
}
