use super::geometry::{Point2f, Vector2f, Vector3f};
use super::math::{consts, Float};

/// Map a uniform sample in [0,1)^2 onto the unit disk, preserving relative
/// areas by mapping concentric squares to concentric circles.
pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    // Map uniform random numbers to $[-1,1]^2$
    let u_offset = *u * 2.0 - Vector2f::new(1.0, 1.0);

    // Handle degeneracy at the origin
    if u_offset.x == 0.0 && u_offset.y == 0.0 {
        return Point2f::zero();
    }

    // Apply concentric mapping to point
    let theta: Float;
    let r: Float;
    if u_offset.x.abs() > u_offset.y.abs() {
        r = u_offset.x;
        theta = consts::FRAC_PI_4 * (u_offset.y / u_offset.x);
    } else {
        r = u_offset.y;
        theta = consts::FRAC_PI_2 - consts::FRAC_PI_4 * (u_offset.x / u_offset.y);
    }
    r * Point2f::new(theta.cos(), theta.sin())
}

/// Cosine-weighted hemisphere sample via projection of the disk mapping.
pub fn cosine_sample_hemisphere(u: &Point2f) -> Vector3f {
    let d = concentric_sample_disk(u);
    let z = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();
    Vector3f::new(d.x, d.y, z)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * consts::INV_PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Rng;

    #[test]
    fn disk_samples_stay_inside_unit_disk() {
        let mut rng = Rng::new(1);
        for _ in 0..10_000 {
            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let p = concentric_sample_disk(&u);
            assert!(p.x * p.x + p.y * p.y <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn disk_mapping_center_and_corner() {
        assert_eq!(concentric_sample_disk(&Point2f::new(0.5, 0.5)), Point2f::zero());
        let p = concentric_sample_disk(&Point2f::new(1.0, 0.5));
        assert!((p.x - 1.0).abs() < 1e-5 && p.y.abs() < 1e-5);
    }

    #[test]
    fn hemisphere_samples_face_up() {
        let mut rng = Rng::new(5);
        for _ in 0..1000 {
            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let w = cosine_sample_hemisphere(&u);
            assert!(w.z >= 0.0);
            assert!((w.length() - 1.0).abs() < 1e-4);
        }
    }
}
