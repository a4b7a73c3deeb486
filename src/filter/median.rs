//! Windowed median filter.

use ndarray::{ArrayD, ArrayViewD};

use super::{check_window, window_offsets, BoundaryMode};
use crate::error::Result;

/// Replace every element with the median of the window around it.
///
/// `size[k]` is the window extent along axis `k`; an extent of 1 leaves that
/// axis out of the window entirely. For even-sized windows the upper median
/// is taken.
///
/// # Errors
///
/// Returns [`crate::Error::Primitive`] if `size` does not have one extent per
/// axis, contains a zero extent, has an extent more than twice the axis
/// length, or the input is empty.
#[allow(clippy::cast_possible_wrap)]
pub fn median_filter(
    input: ArrayViewD<'_, f32>,
    size: &[usize],
    mode: BoundaryMode,
) -> Result<ArrayD<f32>> {
    check_window("median_filter", &input, size)?;

    let footprint = footprint(size);
    let shape = input.shape().to_vec();
    let mut window = Vec::with_capacity(footprint.len());
    let mut coord = vec![0usize; shape.len()];

    Ok(ArrayD::from_shape_fn(input.raw_dim(), |index| {
        window.clear();
        'samples: for offsets in &footprint {
            for (axis, &offset) in offsets.iter().enumerate() {
                if let Some(i) = mode.resolve(index[axis] as isize + offset, shape[axis]) {
                    coord[axis] = i;
                } else {
                    window.push(mode.fill_value());
                    continue 'samples;
                }
            }
            window.push(input[coord.as_slice()]);
        }
        let mid = window.len() / 2;
        *window.select_nth_unstable_by(mid, f32::total_cmp).1
    }))
}

/// Every offset vector inside the window.
fn footprint(size: &[usize]) -> Vec<Vec<isize>> {
    size.iter().fold(vec![Vec::new()], |acc, &extent| {
        acc.into_iter()
            .flat_map(|prefix| {
                window_offsets(extent).map(move |offset| {
                    let mut offsets = prefix.clone();
                    offsets.push(offset);
                    offsets
                })
            })
            .collect()
    })
}
