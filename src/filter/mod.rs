//! N-dimensional windowed filters with configurable boundary handling.
//!
//! These are the numerical primitives behind the median and mean squeezers.
//! They know nothing about images: the caller decides which axes the window
//! spans by passing an extent of 1 for every axis that must stay untouched.

mod median;
mod uniform;

pub use median::median_filter;
pub use uniform::uniform_filter;

use ndarray::ArrayViewD;

use crate::error::{Error, Result};

/// Boundary handling mode for windowed filters.
///
/// Determines which value is read when the window hangs over the array edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoundaryMode {
    /// Reflect: d c b a | a b c d | d c b a (half-sample symmetric)
    #[default]
    Reflect,
    /// Mirror: d c b | a b c d | c b a (whole-sample symmetric)
    Mirror,
    /// Nearest edge value: a a a a | a b c d | d d d d
    Nearest,
    /// Wrap (periodic): a b c d | a b c d | a b c d
    Wrap,
    /// Pad with a constant value: k k k k | a b c d | k k k k
    Constant(f32),
}

impl BoundaryMode {
    /// Map a possibly out-of-range index onto `0..len`.
    ///
    /// Returns `None` only for [`BoundaryMode::Constant`] when the index is outside.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn resolve(self, index: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&index) {
            return Some(index as usize);
        }
        match self {
            Self::Reflect => Some(reflect_index(index, len)),
            Self::Mirror => {
                if len == 1 {
                    return Some(0);
                }
                let period = 2 * n - 2;
                let m = index.rem_euclid(period);
                Some(if m < n { m } else { period - m } as usize)
            }
            Self::Nearest => Some(index.clamp(0, n - 1) as usize),
            Self::Wrap => Some(index.rem_euclid(n) as usize),
            Self::Constant(_) => None,
        }
    }

    /// Value substituted for out-of-range samples.
    #[must_use]
    pub const fn fill_value(self) -> f32 {
        match self {
            Self::Constant(value) => value,
            _ => 0.0,
        }
    }
}

/// Half-sample symmetric index mapping, valid for any distance from the edge.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub(crate) fn reflect_index(index: isize, len: usize) -> usize {
    let n = len as isize;
    let m = index.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}

/// Offsets covered by a window of `size` samples centred at `size / 2`.
#[allow(clippy::cast_possible_wrap)]
fn window_offsets(size: usize) -> std::ops::RangeInclusive<isize> {
    let before = (size / 2) as isize;
    let after = (size - size / 2) as isize - 1;
    -before..=after
}

fn check_window(op: &'static str, input: &ArrayViewD<'_, f32>, size: &[usize]) -> Result<()> {
    if size.len() != input.ndim() {
        return Err(Error::primitive(
            op,
            format!(
                "window has {} axes but input has {}",
                size.len(),
                input.ndim()
            ),
        ));
    }
    if size.contains(&0) {
        return Err(Error::primitive(
            op,
            format!("window extents must be positive, got {size:?}"),
        ));
    }
    if input.is_empty() {
        return Err(Error::primitive(
            op,
            format!("input of shape {:?} is empty", input.shape()),
        ));
    }
    // Past one full reflected period the window only revisits samples.
    for (axis, (&extent, &len)) in size.iter().zip(input.shape()).enumerate() {
        if extent > 2 * len {
            return Err(Error::primitive(
                op,
                format!(
                    "window extent {extent} along axis {axis} exceeds twice the axis length {len}"
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_repeats_edge_sample() {
        // d c b a | a b c d | d c b a
        let mapped: Vec<usize> = (-4..8)
            .map(|i| BoundaryMode::Reflect.resolve(i, 4).unwrap())
            .collect();
        assert_eq!(mapped, vec![3, 2, 1, 0, 0, 1, 2, 3, 3, 2, 1, 0]);
    }

    #[test]
    fn test_reflect_beyond_one_period() {
        assert_eq!(reflect_index(-3, 2), 1);
        assert_eq!(reflect_index(5, 2), 1);
        assert_eq!(reflect_index(-1, 1), 0);
        assert_eq!(reflect_index(7, 1), 0);
    }

    #[test]
    fn test_other_modes() {
        assert_eq!(BoundaryMode::Mirror.resolve(-1, 4), Some(1));
        assert_eq!(BoundaryMode::Mirror.resolve(4, 4), Some(2));
        assert_eq!(BoundaryMode::Nearest.resolve(-3, 4), Some(0));
        assert_eq!(BoundaryMode::Wrap.resolve(-1, 4), Some(3));
        assert_eq!(BoundaryMode::Constant(0.5).resolve(4, 4), None);
        assert_eq!(BoundaryMode::Constant(0.5).resolve(2, 4), Some(2));
    }

    #[test]
    fn test_window_offsets() {
        assert_eq!(window_offsets(1), 0..=0);
        assert_eq!(window_offsets(2), -1..=0);
        assert_eq!(window_offsets(3), -1..=1);
        assert_eq!(window_offsets(4), -2..=1);
    }
}
