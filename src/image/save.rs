//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::{ArrayView2, ArrayView3, Axis};

use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

use super::{MAX_SAMPLE, RGB_CHANNELS};

/// Save a tensor as an image file.
///
/// The tensor is:
/// 1. Clamped to [0, 1] and scaled to [0, 255]
/// 2. Written as luma (grayscale or single-channel) or RGB (three channels)
/// 3. Saved to the specified path (format inferred from extension)
///
/// A batch is accepted only when it holds exactly one image.
///
/// # Arguments
///
/// * `tensor` - Tensor with values in [0, 1]
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the tensor shape has no image equivalent or the image
/// cannot be saved.
pub fn save_image<P: AsRef<Path>>(tensor: &ImageTensor, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let img = tensor_to_image(tensor)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            img.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("wrote {}", path.display());
    Ok(())
}

/// Convert a [0, 1] tensor to an 8-bit image.
fn tensor_to_image(tensor: &ImageTensor) -> Result<DynamicImage> {
    match tensor {
        ImageTensor::Gray(plane) => Ok(DynamicImage::ImageLuma8(plane_to_luma(plane.view()))),
        ImageTensor::Chw(chw) => chw_to_image(chw.view()),
        ImageTensor::Nchw(batch) if batch.len_of(Axis(0)) == 1 => {
            chw_to_image(batch.index_axis(Axis(0), 0))
        }
        ImageTensor::Nchw(batch) => Err(Error::ShapeMismatch {
            expected: "a batch of one image".to_string(),
            actual: format!("{:?}", batch.shape()),
        }),
    }
}

fn chw_to_image(chw: ArrayView3<'_, f32>) -> Result<DynamicImage> {
    match chw.len_of(Axis(0)) {
        1 => Ok(DynamicImage::ImageLuma8(plane_to_luma(
            chw.index_axis(Axis(0), 0),
        ))),
        RGB_CHANNELS => {
            let (_, height, width) = chw.dim();
            let mut img = RgbImage::new(dimension(width)?, dimension(height)?);
            for (x, y, pixel) in img.enumerate_pixels_mut() {
                let (x, y) = (x as usize, y as usize);
                for c in 0..RGB_CHANNELS {
                    pixel[c] = denormalize(chw[[c, y, x]]);
                }
            }
            Ok(DynamicImage::ImageRgb8(img))
        }
        channels => Err(Error::ShapeMismatch {
            expected: "1 or 3 channels".to_string(),
            actual: format!("{channels} channels"),
        }),
    }
}

// Safe: tensors written here come from decoded images, whose dimensions fit in u32
#[allow(clippy::cast_possible_truncation)]
fn plane_to_luma(plane: ArrayView2<'_, f32>) -> GrayImage {
    let (height, width) = plane.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        image::Luma([denormalize(plane[[y as usize, x as usize]])])
    })
}

fn dimension(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::ShapeMismatch {
        expected: "image dimensions that fit in u32".to_string(),
        actual: len.to_string(),
    })
}

/// Denormalize a value from [0, 1] to [0, 255] with clamping and rounding.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * MAX_SAMPLE).round().clamp(0.0, MAX_SAMPLE) as u8
}
