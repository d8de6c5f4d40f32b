#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

extern crate rayon;

pub mod core;
pub mod cameras;
