//! Image-file squeezing pipeline.

mod process;

pub use process::{Config, Pipeline};
