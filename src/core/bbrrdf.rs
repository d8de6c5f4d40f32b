//! Bispectral bidirectional reflection and reradiation. Fluorescent
//! surfaces redistribute energy across wavelengths, so instead of a scalar
//! spectrum the scattering functions return a reradiation matrix whose
//! entry (i, j) couples incident band j to exitant band i.
use nalgebra::DMatrix;
use super::geometry::{Point2f, Vector3f};
use super::math::{consts::INV_PI, Float};
use super::reflection::{abs_cos_theta, same_hemisphere};
use super::sampling::cosine_sample_hemisphere;

/// A reradiation matrix over the sampled spectral bands.
pub type PhotoLumi = DMatrix<Float>;

/// The closed set of reradiation models. The variant set is fixed at build
/// time; light transport dispatches over it with a match.
#[derive(Debug, Clone)]
pub enum Bbrrdf {
    Surface(SurfaceBbrrdf)
}

impl Bbrrdf {
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> PhotoLumi {
        match self {
            Bbrrdf::Surface(s) => s.f(wo, wi)
        }
    }

    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        sample: &Point2f,
        pdf: &mut Float
    ) -> PhotoLumi {
        match self {
            Bbrrdf::Surface(s) => s.sample_f(wo, wi, sample, pdf)
        }
    }

    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        match self {
            Bbrrdf::Surface(s) => s.pdf(wo, wi)
        }
    }
}

/// Diffuse reradiating surface: directionally Lambertian, spectrally
/// governed by its reradiation matrix.
#[derive(Debug, Clone)]
pub struct SurfaceBbrrdf {
    re_rad_matrix: PhotoLumi
}

impl SurfaceBbrrdf {
    pub fn new(re_rad_matrix: PhotoLumi) -> SurfaceBbrrdf {
        SurfaceBbrrdf { re_rad_matrix }
    }

    pub fn f(&self, _wo: &Vector3f, _wi: &Vector3f) -> PhotoLumi {
        &self.re_rad_matrix * INV_PI
    }

    pub fn sample_f(
        &self,
        wo: &Vector3f,
        wi: &mut Vector3f,
        sample: &Point2f,
        pdf: &mut Float
    ) -> PhotoLumi {
        // Cosine-sample the hemisphere, flipping the direction if necessary
        *wi = cosine_sample_hemisphere(sample);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }
        *pdf = self.pdf(wo, wi);
        self.f(wo, wi)
    }

    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if same_hemisphere(wo, wi) {
            abs_cos_theta(wi) * INV_PI
        } else {
            0.0
        }
    }
}
