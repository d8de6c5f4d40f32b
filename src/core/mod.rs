pub mod math;
pub mod geometry;
pub mod matrix;
pub mod transform;
pub mod quaternion;
pub mod animated_transform;
pub mod spectrum;
pub mod film;
pub mod camera;
pub mod interaction;
pub mod medium;
pub mod rng;
pub mod sampling;
pub mod low_discrepancy;
pub mod reflection;
pub mod bbrrdf;
pub mod floatfile;
pub mod stats;
