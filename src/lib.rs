//! # `feature-squeeze`
//!
//! Feature squeezing transforms for image classifiers.
//!
//! Feature squeezing lowers the precision of an input image so that small,
//! high-frequency adversarial perturbations are attenuated while the visible
//! content survives. Four squeezers are provided: color bit-depth reduction,
//! local median smoothing, local mean smoothing, and non-local means
//! denoising. Each accepts a single grayscale image, a single channel-first
//! image, or a batch of channel-first images, and returns a new tensor of the
//! same shape.
//!
//! ## Example
//!
//! ```
//! use feature_squeeze::{bit_depth_squeeze, median_filter_squeeze, ImageTensor};
//! use ndarray::Array3;
//!
//! # fn main() -> feature_squeeze::Result<()> {
//! let image = ImageTensor::Chw(Array3::from_elem((3, 32, 32), 0.42));
//!
//! let squeezed = median_filter_squeeze(&bit_depth_squeeze(&image, 4)?, 2)?;
//! assert_eq!(squeezed.shape(), image.shape());
//! # Ok(())
//! # }
//! ```

pub mod denoise;
pub mod error;
pub mod filter;
pub mod image;
pub mod pipeline;
pub mod squeeze;
pub mod tensor;

pub use error::{Error, Result};
pub use pipeline::{Config, Pipeline};
pub use squeeze::{
    bit_depth_squeeze, mean_filter_squeeze, median_filter_squeeze, non_local_means_squeeze,
    squeeze_chain, Squeezer,
};
pub use tensor::ImageTensor;
