//! Windowed mean (box) filter.

use ndarray::{ArrayD, ArrayView1, ArrayViewD, ArrayViewMut1, Axis, Zip};

use super::{check_window, window_offsets, BoundaryMode};
use crate::error::Result;

/// Replace every element with the mean of the window around it.
///
/// The box is separable, so it is applied as one 1D pass per axis whose
/// extent is larger than 1. Sums are accumulated in `f64`.
///
/// # Errors
///
/// Returns [`crate::Error::Primitive`] if `size` does not have one extent per
/// axis, contains a zero extent, has an extent more than twice the axis
/// length, or the input is empty.
pub fn uniform_filter(
    input: ArrayViewD<'_, f32>,
    size: &[usize],
    mode: BoundaryMode,
) -> Result<ArrayD<f32>> {
    check_window("uniform_filter", &input, size)?;

    let mut current = input.to_owned();
    for (axis, &extent) in size.iter().enumerate() {
        if extent == 1 {
            continue;
        }
        let mut next = ArrayD::<f32>::zeros(current.raw_dim());
        Zip::from(current.lanes(Axis(axis)))
            .and(next.lanes_mut(Axis(axis)))
            .for_each(|src, dst| uniform_1d(src, dst, extent, mode));
        current = next;
    }
    Ok(current)
}

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn uniform_1d(src: ArrayView1<'_, f32>, mut dst: ArrayViewMut1<'_, f32>, extent: usize, mode: BoundaryMode) {
    let len = src.len();
    let offsets = window_offsets(extent);
    for (i, out) in dst.iter_mut().enumerate() {
        let sum: f64 = offsets
            .clone()
            .map(|offset| {
                mode.resolve(i as isize + offset, len)
                    .map_or(mode.fill_value(), |j| src[j])
            })
            .map(f64::from)
            .sum();
        *out = (sum / extent as f64) as f32;
    }
}
