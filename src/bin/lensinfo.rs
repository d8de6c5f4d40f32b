//! Load a lens description file, solve its focus and print the resulting
//! lens geometry. Useful for sanity-checking a lens file before a render.
//!
//!     lensinfo <lensfile> [focus distance in meters]

use std::process::exit;
use std::sync::Arc;
use lenscam::cameras::realistic::{load_lens_data, RealisticCamera};
use lenscam::core::animated_transform::AnimatedTransform;
use lenscam::core::film::Film;
use lenscam::core::geometry::Point2i;
use lenscam::core::math::Float;
use lenscam::core::transform::Transform;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: lensinfo <lensfile> [focus distance in meters]");
        exit(1);
    }
    let lens_file = &args[1];
    let focus_distance: Float = if args.len() == 3 {
        match args[2].parse() {
            Ok(d) => d,
            Err(_) => {
                eprintln!("lensinfo: invalid focus distance \"{}\"", args[2]);
                exit(1);
            }
        }
    } else {
        10.0
    };

    let lens_data = match load_lens_data(lens_file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("lensinfo: cannot load \"{}\": {}", lens_file, e);
            exit(1);
        }
    };
    println!("{}: {} lens elements", lens_file, lens_data.len() / 4);

    let film = Arc::new(Film::new(Point2i::new(1920, 1080), 35.0));
    let camera = RealisticCamera::new(
        AnimatedTransform::constant(Transform::default()),
        0.0, 1.0,
        1.0e6,  // leave the stop at the diameter given in the file
        0.0,    // film distance comes from the focus solve
        focus_distance,
        false, false, false,
        &lens_data,
        film,
        None);

    println!("focus target:            {} m", focus_distance);
    println!("film to rear element:    {} m", camera.lens_rear_z());
    println!("film to front element:   {} m", camera.lens_front_z());
    println!("rear element radius:     {} m", camera.rear_element_radius());
    println!("measured focus distance: {} m", camera.focus_distance(camera.lens_rear_z()));
}
