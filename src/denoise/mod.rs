//! Patch-based denoising primitives.

mod nl_means;

pub use nl_means::NlMeans;
