use std::fmt;
use std::sync::Arc;
use super::animated_transform::AnimatedTransform;
use super::film::Film;
use super::geometry::{Point2f, Ray, Vector3f};
use super::interaction::{Interaction, VisibilityTester};
use super::math::Float;
use super::medium::Medium;
use super::spectrum::Spectrum;

/// The camera interface the renderer drives. `generate_ray` is the hot
/// path; the remaining queries exist for bidirectional light transport,
/// which needs to evaluate and sample the camera's importance.
pub trait Camera: Send + Sync {
    fn get_camera_to_world(&self) -> AnimatedTransform;

    fn get_shutter_open(&self) -> Float;

    fn get_shutter_close(&self) -> Float;

    fn get_film(&self) -> Arc<Film>;

    fn get_medium(&self) -> Option<Arc<dyn Medium + Send + Sync>> {
        None
    }

    /// Generate the world-space ray for a film sample. Returns the
    /// radiometric weight the ray's contribution is scaled by; zero means
    /// the sample produced no ray.
    fn generate_ray(&self, sample: &CameraSample, ray: &mut Ray) -> Float;

    /// Importance emitted by the camera along the given world-space ray,
    /// optionally reporting where the ray meets the film.
    fn we(&self, _ray: &Ray, _p_raster2: Option<&mut Point2f>) -> Spectrum {
        error!("Camera::we() is not implemented!");
        Spectrum::new(0.0)
    }

    /// Positional and directional densities for sampling the given ray.
    fn pdf_we(&self, _ray: &Ray) -> (Float, Float) {
        error!("Camera::pdf_we() is not implemented!");
        (0.0, 0.0)
    }

    /// Sample a point on the camera's aperture as seen from a reference
    /// point, returning the incident importance, direction, density,
    /// raster position and a visibility test for the connection.
    fn sample_wi(
        &self,
        _iref: &Interaction,
        _u: &Point2f,
        _wi: &mut Vector3f,
        _pdf: &mut Float,
        _p_raster: Option<&mut Point2f>,
        _vis: &mut VisibilityTester
    ) -> Spectrum {
        error!("Camera::sample_wi() is not implemented!");
        Spectrum::new(0.0)
    }
}

/// The sample values a sampler hands the camera for one ray: a raster
/// position, a lens position in [0,1)^2 and a shutter time in [0,1).
#[derive(Default, Debug, Copy, Clone)]
pub struct CameraSample {
    pub p_film: Point2f,
    pub p_lens: Point2f,
    pub time: Float
}

impl fmt::Display for CameraSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ p_film: ({}, {}), p_lens: ({}, {}), time {} ]",
            self.p_film.x, self.p_film.y, self.p_lens.x, self.p_lens.y, self.time)
    }
}
