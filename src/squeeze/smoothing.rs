//! Local spatial smoothing (median and mean).

use ndarray::{ArrayD, ArrayViewD};

use crate::error::{Error, Result};
use crate::filter::{self, BoundaryMode};
use crate::tensor::ImageTensor;

type WindowFilter =
    for<'a> fn(ArrayViewD<'a, f32>, &[usize], BoundaryMode) -> Result<ArrayD<f32>>;

pub(crate) fn check_window_size(size: i32) -> Result<usize> {
    usize::try_from(size)
        .ok()
        .filter(|&size| size > 0)
        .ok_or_else(|| Error::invalid("size", format!("must be positive, got {size}")))
}

/// Window extents spanning `size` x `size` over height and width and 1 elsewhere.
#[must_use]
pub fn spatial_window(x: &ImageTensor, size: usize) -> Vec<usize> {
    match x {
        ImageTensor::Gray(_) => vec![size, size],
        ImageTensor::Chw(_) => vec![1, size, size],
        ImageTensor::Nchw(_) => vec![1, 1, size, size],
    }
}

/// Apply a local median filter to an image or batch of images.
///
/// Each pixel is replaced by the median of the `size` x `size` window around
/// it within its own channel and sample. Edges are reflected.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `size` is not positive, or the
/// filter's error if it rejects the input.
pub fn median_filter_squeeze(x: &ImageTensor, size: i32) -> Result<ImageTensor> {
    smooth(x, size, filter::median_filter)
}

/// Apply a local mean filter to an image or batch of images.
///
/// Same window placement and edge handling as [`median_filter_squeeze`].
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `size` is not positive, or the
/// filter's error if it rejects the input.
pub fn mean_filter_squeeze(x: &ImageTensor, size: i32) -> Result<ImageTensor> {
    smooth(x, size, filter::uniform_filter)
}

fn smooth(x: &ImageTensor, size: i32, window_filter: WindowFilter) -> Result<ImageTensor> {
    let size = check_window_size(size)?;
    let window = spatial_window(x, size);
    tracing::debug!(shape = ?x.shape(), ?window, "smoothing");

    let smoothed = window_filter(x.view_dyn(), &window, BoundaryMode::Reflect)?;
    if smoothed.shape() != x.shape() {
        return Err(Error::ShapeMismatch {
            expected: format!("{:?}", x.shape()),
            actual: format!("{:?}", smoothed.shape()),
        });
    }
    ImageTensor::from_dyn(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3, Array4, Axis};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type Squeeze = fn(&ImageTensor, i32) -> Result<ImageTensor>;

    const SMOOTHERS: [(&str, Squeeze); 2] = [
        ("median", median_filter_squeeze),
        ("mean", mean_filter_squeeze),
    ];

    fn random_tensor(shape: &[usize], seed: u64) -> ImageTensor {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = ArrayD::from_shape_fn(shape, |_| rng.random::<f32>());
        ImageTensor::from_dyn(data).unwrap()
    }

    #[test]
    fn test_window_follows_rank() {
        let gray = ImageTensor::Gray(Array2::zeros((4, 4)));
        let chw = ImageTensor::Chw(Array3::zeros((3, 4, 4)));
        let nchw = ImageTensor::Nchw(Array4::zeros((2, 3, 4, 4)));

        assert_eq!(spatial_window(&gray, 3), vec![3, 3]);
        assert_eq!(spatial_window(&chw, 3), vec![1, 3, 3]);
        assert_eq!(spatial_window(&nchw, 3), vec![1, 1, 3, 3]);
    }

    #[test]
    fn test_shape_and_variant_preserved() {
        for (name, squeeze) in SMOOTHERS {
            for shape in [&[5, 6][..], &[3, 5, 6][..], &[2, 3, 5, 6][..]] {
                let x = random_tensor(shape, 1);
                let out = squeeze(&x, 3).unwrap();
                assert_eq!(out.shape(), x.shape(), "{name} {shape:?}");
                assert_eq!(out.rank(), x.rank());
            }
        }
    }

    #[test]
    fn test_constant_image_unchanged() {
        let x = ImageTensor::Chw(Array3::from_elem((3, 5, 4), 0.7));

        for (name, squeeze) in SMOOTHERS {
            for size in 1..=6 {
                let out = squeeze(&x, size).unwrap();
                assert_eq!(out, x, "{name} size {size}");
            }
        }
    }

    #[test]
    fn test_channels_do_not_mix() {
        let mut rng = StdRng::seed_from_u64(9);
        let img = Array3::from_shape_fn((2, 8, 8), |(c, _, _)| {
            if c == 0 {
                rng.random_range(0.0_f32..0.3)
            } else {
                rng.random_range(0.7_f32..1.0)
            }
        });
        let x = ImageTensor::Chw(img);

        for (name, squeeze) in SMOOTHERS {
            let ImageTensor::Chw(out) = squeeze(&x, 3).unwrap() else {
                panic!("{name} changed the variant");
            };
            let low = out.index_axis(Axis(0), 0);
            let high = out.index_axis(Axis(0), 1);
            assert!(low.iter().all(|&v| v < 0.3 + 1e-6), "{name}");
            assert!(high.iter().all(|&v| v >= 0.7 - 1e-6), "{name}");
        }
    }

    #[test]
    fn test_batch_samples_do_not_mix() {
        let batch = random_tensor(&[3, 2, 6, 6], 5);
        let ImageTensor::Nchw(samples) = &batch else {
            unreachable!()
        };

        for (name, squeeze) in SMOOTHERS {
            let ImageTensor::Nchw(out) = squeeze(&batch, 3).unwrap() else {
                panic!("{name} changed the variant");
            };
            for (i, sample) in samples.outer_iter().enumerate() {
                let alone = squeeze(&ImageTensor::Chw(sample.to_owned()), 3).unwrap();
                let ImageTensor::Chw(alone) = alone else {
                    panic!("{name} changed the variant");
                };
                assert_eq!(out.index_axis(Axis(0), i), alone, "{name} sample {i}");
            }
        }
    }

    #[test]
    fn test_median_window_on_gray() {
        let mut img = Array2::<f32>::zeros((5, 5));
        img[[2, 2]] = 1.0;

        let out = median_filter_squeeze(&ImageTensor::Gray(img), 3).unwrap();

        assert!(out.view_dyn().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mean_window_on_gray() {
        let mut img = Array2::<f32>::zeros((5, 5));
        img[[2, 2]] = 9.0;

        let ImageTensor::Gray(out) = mean_filter_squeeze(&ImageTensor::Gray(img), 3).unwrap()
        else {
            panic!("variant changed");
        };

        assert!((out[[1, 1]] - 1.0).abs() < 1e-6);
        assert!((out[[2, 2]] - 1.0).abs() < 1e-6);
        assert!(out[[0, 0]].abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let x = ImageTensor::Gray(Array2::zeros((4, 4)));

        for (name, squeeze) in SMOOTHERS {
            for size in [0, -2] {
                let err = squeeze(&x, size).unwrap_err();
                assert!(err.is_invalid_argument(), "{name} {size}");
            }
        }
    }

    #[test]
    fn test_filter_failure_reaches_caller() {
        let empty = ImageTensor::Gray(Array2::zeros((0, 3)));
        let tiny = ImageTensor::Gray(Array2::from_elem((2, 2), 0.5));

        for (name, squeeze) in SMOOTHERS {
            let err = squeeze(&empty, 3).unwrap_err();
            assert!(matches!(err, Error::Primitive { .. }), "{name} empty: {err}");

            let err = squeeze(&tiny, 20_000).unwrap_err();
            assert!(matches!(err, Error::Primitive { .. }), "{name} oversized: {err}");
        }
    }
}
