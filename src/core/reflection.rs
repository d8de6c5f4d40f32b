use super::geometry::{Normal3f, Vector3f};
use super::math::Float;

#[inline]
pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}

#[inline]
pub fn abs_cos_theta(w: &Vector3f) -> Float {
    w.z.abs()
}

#[inline]
pub fn same_hemisphere(w: &Vector3f, wp: &Vector3f) -> bool {
    w.z * wp.z > 0.0
}

#[inline]
pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    -*wo + 2.0 * wo.dot(n) * *n
}

/// Refract `wi` about the surface normal `n` for the relative index of
/// refraction `eta` = etaI / etaT. Returns false on total internal
/// reflection, in which case `wt` is left untouched.
#[inline]
pub fn refract(wi: &Vector3f, n: &Normal3f, eta: Float, wt: &mut Vector3f) -> bool {
    // Compute cos theta_t using Snell's law
    let cos_theta_i = n.dot_vec(wi);
    let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
    let sin2_theta_t = eta * eta * sin2_theta_i;

    // Handle total internal reflection for transmission
    if sin2_theta_t >= 1.0 {
        return false;
    }
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
    *wt = eta * -*wi + (eta * cos_theta_i - cos_theta_t) * Vector3f::from(*n);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refraction_obeys_snells_law() {
        let n = Normal3f::new(0.0, 0.0, 1.0);
        // incoming at 30 degrees off the normal
        let theta_i = (30.0 as Float).to_radians();
        let wi = Vector3f::new(theta_i.sin(), 0.0, theta_i.cos());
        let eta = 1.0 / 1.5;
        let mut wt = Vector3f::zero();
        assert!(refract(&wi, &n, eta, &mut wt));
        let sin_theta_t = (wt.x * wt.x + wt.y * wt.y).sqrt() / wt.length();
        assert!((sin_theta_t - eta * theta_i.sin()).abs() < 1e-5);
        // transmitted ray continues into the opposite hemisphere
        assert!(wt.z < 0.0);
    }

    #[test]
    fn normal_incidence_passes_straight_through() {
        let n = Normal3f::new(0.0, 0.0, 1.0);
        let wi = Vector3f::new(0.0, 0.0, 1.0);
        let mut wt = Vector3f::zero();
        assert!(refract(&wi, &n, 1.0 / 1.5, &mut wt));
        assert!(wt.x.abs() < 1e-6 && wt.y.abs() < 1e-6);
        assert!(wt.z < 0.0);
    }

    #[test]
    fn total_internal_reflection_fails() {
        let n = Normal3f::new(0.0, 0.0, 1.0);
        // grazing exit from dense glass
        let theta_i = (80.0 as Float).to_radians();
        let wi = Vector3f::new(theta_i.sin(), 0.0, theta_i.cos());
        let mut wt = Vector3f::zero();
        assert!(!refract(&wi, &n, 1.5, &mut wt));
    }
}
