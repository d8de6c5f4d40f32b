use super::geometry::{Bounds2f, Point2f, Point2i};
use super::math::Float;

/// The physical sensing area of the camera. Reconstruction and image
/// output live with the renderer; the lens system only needs the film's
/// pixel resolution and physical extent.
pub struct Film {
    pub full_resolution: Point2i,
    /// Length of the sensor diagonal in metres.
    pub diagonal: Float
}

impl Film {
    /// Build a film from a pixel resolution and a diagonal given in
    /// millimetres, the unit lens descriptions use.
    pub fn new(resolution: Point2i, diagonal: Float) -> Film {
        info!("Created film with full resolution {}x{} and diagonal {}mm",
            resolution.x, resolution.y, diagonal);
        Film {
            full_resolution: resolution,
            diagonal: diagonal * 0.001
        }
    }

    /// The bounds of the sensing area in metres, centred on the optical
    /// axis, with the aspect ratio of the pixel resolution.
    pub fn get_physical_extent(&self) -> Bounds2f {
        let aspect = self.full_resolution.y as Float / self.full_resolution.x as Float;
        let x = (self.diagonal * self.diagonal / (1.0 + aspect * aspect)).sqrt();
        let y = aspect * x;
        Bounds2f::new(
            Point2f::new(-x / 2.0, -y / 2.0),
            Point2f::new(x / 2.0, y / 2.0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_extent_matches_diagonal() {
        let film = Film::new(Point2i::new(800, 600), 35.0);
        let extent = film.get_physical_extent();
        let d = extent.diagonal();
        assert!((d.length() - 0.035).abs() < 1e-6);
        // 4:3 aspect carried over from the resolution
        assert!((d.y / d.x - 0.75).abs() < 1e-6);
    }
}
