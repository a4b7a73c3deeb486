//! Image loading utilities.

use std::path::Path;

use image::DynamicImage;
use ndarray::{Array2, Array3};

use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

use super::{MAX_SAMPLE, RGB_CHANNELS};

/// Load an image from disk as a tensor scaled to [0, 1].
///
/// The image keeps its original size. With `grayscale` set it is converted
/// to luma and returned as [`ImageTensor::Gray`] (height, width); otherwise it
/// is converted to RGB and returned as [`ImageTensor::Chw`] (3, height, width).
///
/// # Errors
///
/// Returns an error if the image cannot be loaded or decoded.
pub fn load_image<P: AsRef<Path>>(path: P, grayscale: bool) -> Result<ImageTensor> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        width = img.width(),
        height = img.height(),
        grayscale,
        "decoded {}",
        path.display()
    );

    Ok(image_to_tensor(&img, grayscale))
}

/// Convert a `DynamicImage` to a [0, 1] tensor.
fn image_to_tensor(img: &DynamicImage, grayscale: bool) -> ImageTensor {
    if grayscale {
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();
        ImageTensor::Gray(Array2::from_shape_fn(
            (height as usize, width as usize),
            |(y, x)| {
                // Safe: indices are bounded by the image dimensions, which are u32
                #[allow(clippy::cast_possible_truncation)]
                let pixel = luma.get_pixel(x as u32, y as u32);
                f32::from(pixel[0]) / MAX_SAMPLE
            },
        ))
    } else {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        ImageTensor::Chw(Array3::from_shape_fn(
            (RGB_CHANNELS, height as usize, width as usize),
            |(c, y, x)| {
                #[allow(clippy::cast_possible_truncation)]
                let pixel = rgb.get_pixel(x as u32, y as u32);
                f32::from(pixel[c]) / MAX_SAMPLE
            },
        ))
    }
}
