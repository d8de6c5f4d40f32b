use std::sync::Arc;
use super::geometry::{Normal3f, Point3f, Ray, Vector3f};
use super::math::Float;
use super::medium::Medium;

/// A point on a surface, a lens or in a medium that rays can be spawned
/// from or connected to.
#[derive(Default, Clone)]
pub struct Interaction {
    pub p: Point3f,
    pub time: Float,
    pub n: Normal3f,
    pub medium: Option<Arc<dyn Medium + Send + Sync>>
}

impl Interaction {
    pub fn new(
        p: Point3f,
        time: Float,
        medium: Option<Arc<dyn Medium + Send + Sync>>
    ) -> Interaction {
        Interaction {
            p,
            time,
            n: Normal3f::default(),
            medium
        }
    }

    /// Spawn a ray leaving this point in direction d.
    pub fn spawn_ray(&self, d: &Vector3f) -> Ray {
        let mut r = Ray::new(self.p, *d);
        r.time = self.time;
        r.medium = self.medium.clone();
        r
    }

    /// Spawn a ray from this point toward another interaction point.
    pub fn spawn_ray_to(&self, it: &Interaction) -> Ray {
        let mut r = Ray::new(self.p, it.p - self.p);
        r.t_max = 1.0 - crate::core::math::consts::SHADOW_EPSILON;
        r.time = self.time;
        r.medium = self.medium.clone();
        r
    }
}

/// The two endpoints of a potential connection between a scene point and
/// the camera. Occlusion along the segment is resolved by the surrounding
/// light transport code, which owns the scene.
#[derive(Default, Clone)]
pub struct VisibilityTester {
    p0: Interaction,
    p1: Interaction
}

impl VisibilityTester {
    pub fn new(p0: Interaction, p1: Interaction) -> VisibilityTester {
        VisibilityTester { p0, p1 }
    }

    pub fn p0(&self) -> &Interaction {
        &self.p0
    }

    pub fn p1(&self) -> &Interaction {
        &self.p1
    }

    /// The one-sided shadow ray from p0 toward p1 for the caller to test
    /// against its scene.
    pub fn test_ray(&self) -> Ray {
        self.p0.spawn_ray_to(&self.p1)
    }
}
