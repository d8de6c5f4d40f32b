pub mod realistic;

pub use realistic::{LensElementInterface, RealisticCamera};
