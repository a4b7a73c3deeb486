//! Color bit-depth reduction.

use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

/// Deepest supported bit depth; beyond this the grid is finer than `f32` resolves.
pub const MAX_BIT_DEPTH: i32 = 24;

pub(crate) fn check_bit_depth(bit_depth: i32) -> Result<()> {
    if !(1..=MAX_BIT_DEPTH).contains(&bit_depth) {
        return Err(Error::invalid(
            "bit_depth",
            format!("must be between 1 and {MAX_BIT_DEPTH}, got {bit_depth}"),
        ));
    }
    Ok(())
}

/// Reduce the color bit depth of an image or batch of images.
///
/// Every element of `x` (scaled to [0, 1]) is snapped to the nearest of the
/// `2^bit_depth` evenly spaced levels `k / (2^bit_depth - 1)`. Ties round to
/// even. Purely elementwise, so every rank is handled the same way.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `bit_depth` is not in `1..=24`.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn bit_depth_squeeze(x: &ImageTensor, bit_depth: i32) -> Result<ImageTensor> {
    check_bit_depth(bit_depth)?;

    let precision = ((1_u32 << bit_depth) - 1) as f32;
    Ok(x.mapv(|v| (v * precision).round_ties_even() / precision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, Array4};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_one_bit_linspace() {
        let input = Array1::linspace(0.0_f32, 1.0, 16)
            .into_shape_with_order((4, 4))
            .unwrap();
        let x = ImageTensor::Gray(input.clone());

        let out = bit_depth_squeeze(&x, 1).unwrap();

        let ImageTensor::Gray(out) = out else {
            panic!("variant changed");
        };
        for (&got, &v) in out.iter().zip(input.iter()) {
            let nearest = if v < 0.5 { 0.0 } else { 1.0 };
            assert!((got - nearest).abs() < f32::EPSILON, "{v} -> {got}");
        }
    }

    #[test]
    fn test_values_on_grid_and_idempotent() {
        let mut rng = StdRng::seed_from_u64(42);
        let x = ImageTensor::Nchw(Array4::from_shape_fn((2, 3, 5, 5), |_| rng.random::<f32>()));

        for bit_depth in 1..=8 {
            let levels = ((1_u32 << bit_depth) - 1) as f32;
            let once = bit_depth_squeeze(&x, bit_depth).unwrap();
            assert_eq!(once.shape(), x.shape());

            for &v in once.view_dyn() {
                let k = v * levels;
                assert!((k - k.round()).abs() < 1e-4, "{v} not on the {bit_depth}-bit grid");
                assert!((0.0..=levels).contains(&k.round()));
            }

            let twice = bit_depth_squeeze(&once, bit_depth).unwrap();
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_eight_bit_is_near_identity_for_8bit_images() {
        let x = ImageTensor::Gray(Array2::from_shape_fn((16, 16), |(y, x)| {
            f32::from(u8::try_from(y * 16 + x).unwrap()) / 255.0
        }));

        let out = bit_depth_squeeze(&x, 8).unwrap();

        for (a, b) in out.view_dyn().iter().zip(x.view_dyn()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_non_positive_bit_depth() {
        let x = ImageTensor::Gray(Array2::zeros((2, 2)));

        for bit_depth in [0, -3, MAX_BIT_DEPTH + 1] {
            let err = bit_depth_squeeze(&x, bit_depth).unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }
}
