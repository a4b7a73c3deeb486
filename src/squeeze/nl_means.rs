//! Non-local means squeezing over channel-first images and batches.

use ndarray::{stack, Array3, ArrayView3, Axis};
use rayon::prelude::*;

use crate::denoise::NlMeans;
use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

pub(crate) fn check_patch_params(patch_size: i32, patch_distance: i32) -> Result<(usize, usize)> {
    let patch_size = usize::try_from(patch_size)
        .ok()
        .filter(|&size| size % 2 == 1)
        .ok_or_else(|| {
            Error::invalid(
                "patch_size",
                format!("must be odd and positive, got {patch_size}"),
            )
        })?;
    let patch_distance = usize::try_from(patch_distance)
        .ok()
        .filter(|&distance| distance > 0)
        .ok_or_else(|| {
            Error::invalid(
                "patch_distance",
                format!("must be positive, got {patch_distance}"),
            )
        })?;
    Ok((patch_size, patch_distance))
}

/// Apply non-local means denoising to an image or batch of images.
///
/// Grayscale images are denoised directly with the requested `fast_mode`.
/// Channel-first images and batches are denoised per sample through a
/// channel-last view, and always in fast mode: exact mode is too costly per
/// multi-channel call, so the request is overridden.
///
/// Batch samples are processed in parallel and independently; each output
/// sample depends only on the matching input sample.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `patch_size` is not odd and positive
/// or `patch_distance` is not positive, or the denoiser's error if it rejects
/// a sample.
pub fn non_local_means_squeeze(
    x: &ImageTensor,
    patch_size: i32,
    patch_distance: i32,
    fast_mode: bool,
) -> Result<ImageTensor> {
    let (patch_size, patch_distance) = check_patch_params(patch_size, patch_distance)?;
    let nlm = NlMeans {
        patch_size,
        patch_distance,
        fast_mode,
        ..NlMeans::default()
    };

    match x {
        ImageTensor::Gray(image) => {
            let denoised = nlm.denoise(image.view().insert_axis(Axis(2)))?;
            Ok(ImageTensor::Gray(denoised.index_axis_move(Axis(2), 0)))
        }
        ImageTensor::Chw(image) => {
            let nlm = forced_fast(nlm);
            with_channel_last(image.view(), |hwc| nlm.denoise(hwc)).map(ImageTensor::Chw)
        }
        ImageTensor::Nchw(batch) => {
            let nlm = forced_fast(nlm);
            if batch.len_of(Axis(0)) == 0 {
                return Ok(x.clone());
            }
            let samples = batch
                .axis_iter(Axis(0))
                .into_par_iter()
                .map(|sample| with_channel_last(sample, |hwc| nlm.denoise(hwc)))
                .collect::<Result<Vec<Array3<f32>>>>()?;
            let views: Vec<ArrayView3<'_, f32>> = samples.iter().map(Array3::view).collect();
            let stacked = stack(Axis(0), &views).map_err(|err| Error::ShapeMismatch {
                expected: format!("{:?}", batch.shape()),
                actual: err.to_string(),
            })?;
            Ok(ImageTensor::Nchw(stacked))
        }
    }
}

fn forced_fast(nlm: NlMeans) -> NlMeans {
    if !nlm.fast_mode {
        tracing::debug!("exact non-local means requested for a multi-channel image, using fast mode");
    }
    NlMeans {
        fast_mode: true,
        ..nlm
    }
}

/// Run `f` on a (height, width, channel) view of `chw` and return its result
/// in (channel, height, width) order.
fn with_channel_last<F>(chw: ArrayView3<'_, f32>, f: F) -> Result<Array3<f32>>
where
    F: FnOnce(ArrayView3<'_, f32>) -> Result<Array3<f32>>,
{
    let (channels, height, width) = chw.dim();
    let hwc = f(chw.permuted_axes([1, 2, 0]))?;
    if hwc.dim() != (height, width, channels) {
        return Err(Error::ShapeMismatch {
            expected: format!("{:?}", [height, width, channels]),
            actual: format!("{:?}", hwc.shape()),
        });
    }
    Ok(hwc.permuted_axes([2, 0, 1]).as_standard_layout().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array4};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(shape: (usize, usize, usize), seed: u64) -> Array3<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array3::from_shape_fn(shape, |_| rng.random::<f32>())
    }

    #[test]
    fn test_shape_preserved_for_every_rank() {
        let gray = ImageTensor::Gray(noise((1, 6, 7), 1).index_axis_move(Axis(0), 0));
        let chw = ImageTensor::Chw(noise((3, 6, 7), 2));
        let (first, second) = (noise((3, 6, 7), 3), noise((3, 6, 7), 4));
        let nchw = ImageTensor::Nchw(stack(Axis(0), &[first.view(), second.view()]).unwrap());

        for x in [gray, chw, nchw] {
            let out = non_local_means_squeeze(&x, 3, 2, true).unwrap();
            assert_eq!(out.shape(), x.shape());
            assert_eq!(out.rank(), x.rank());
        }
    }

    #[test]
    fn test_batch_matches_individual_samples() {
        let noisy = noise((3, 8, 8), 11);
        let flat = Array3::<f32>::from_elem((3, 8, 8), 0.4);
        let batch = ImageTensor::Nchw(stack(Axis(0), &[noisy.view(), flat.view()]).unwrap());

        let ImageTensor::Nchw(out) = non_local_means_squeeze(&batch, 3, 2, true).unwrap() else {
            panic!("variant changed");
        };

        for (i, sample) in [noisy, flat].into_iter().enumerate() {
            let ImageTensor::Chw(alone) =
                non_local_means_squeeze(&ImageTensor::Chw(sample), 3, 2, true).unwrap()
            else {
                panic!("variant changed");
            };
            assert_eq!(out.index_axis(Axis(0), i), alone, "sample {i}");
        }
        assert!(out
            .index_axis(Axis(0), 1)
            .iter()
            .all(|&v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_multichannel_forces_fast_mode() {
        let image = noise((3, 6, 6), 21);
        let x = ImageTensor::Chw(image);

        let exact_requested = non_local_means_squeeze(&x, 3, 2, false).unwrap();
        let fast_requested = non_local_means_squeeze(&x, 3, 2, true).unwrap();

        assert_eq!(exact_requested, fast_requested);
    }

    #[test]
    fn test_gray_honors_requested_mode() {
        let image = noise((1, 8, 8), 13).index_axis_move(Axis(0), 0);
        let x = ImageTensor::Gray(image.clone());

        let exact = non_local_means_squeeze(&x, 5, 2, false).unwrap();
        let fast = non_local_means_squeeze(&x, 5, 2, true).unwrap();

        let direct = NlMeans {
            patch_size: 5,
            patch_distance: 2,
            fast_mode: false,
            ..NlMeans::default()
        }
        .denoise(image.view().insert_axis(Axis(2)))
        .unwrap()
        .index_axis_move(Axis(2), 0);
        assert_eq!(exact, ImageTensor::Gray(direct));
        assert_ne!(exact, fast);
    }

    #[test]
    fn test_channel_first_round_trip() {
        let mut image = Array3::<f32>::zeros((2, 5, 4));
        image.index_axis_mut(Axis(0), 1).fill(1.0);

        let ImageTensor::Chw(out) =
            non_local_means_squeeze(&ImageTensor::Chw(image.clone()), 3, 2, true).unwrap()
        else {
            panic!("variant changed");
        };

        for (a, b) in out.iter().zip(image.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_invalid_patch_params() {
        let x = ImageTensor::Gray(Array2::zeros((4, 4)));

        for (size, distance) in [(0, 2), (-3, 2), (4, 2), (3, 0), (3, -1)] {
            let err = non_local_means_squeeze(&x, size, distance, true).unwrap_err();
            assert!(err.is_invalid_argument(), "({size}, {distance})");
        }
    }

    #[test]
    fn test_empty_batch_passes_through() {
        let x = ImageTensor::Nchw(Array4::zeros((0, 3, 4, 4)));

        let out = non_local_means_squeeze(&x, 3, 2, true).unwrap();

        assert_eq!(out, x);
    }

    #[test]
    fn test_denoiser_failure_reaches_caller() {
        let empty_image = ImageTensor::Chw(Array3::zeros((0, 4, 4)));
        let err = non_local_means_squeeze(&empty_image, 3, 1, true).unwrap_err();
        assert!(matches!(err, Error::Primitive { .. }), "{err}");

        let empty_axis = ImageTensor::Gray(Array2::zeros((0, 4)));
        let err = non_local_means_squeeze(&empty_axis, 3, 1, false).unwrap_err();
        assert!(matches!(err, Error::Primitive { .. }), "{err}");
    }
}
