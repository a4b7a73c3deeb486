//! Rank-tagged image tensors.

use ndarray::{Array2, Array3, Array4, ArrayD, ArrayViewD, Ix2, Ix3, Ix4};

use crate::error::{Error, Result};

/// An image or batch of images with values conventionally in [0, 1].
///
/// The variant fixes which axes are spatial, so every transform dispatches
/// with an exhaustive `match` instead of inspecting `ndim()` at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageTensor {
    /// Single grayscale image, axes (height, width).
    Gray(Array2<f32>),
    /// Single channel-first image, axes (channel, height, width).
    Chw(Array3<f32>),
    /// Batch of channel-first images, axes (batch, channel, height, width).
    Nchw(Array4<f32>),
}

impl ImageTensor {
    /// Classify a dynamically shaped array by rank.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the rank is not 2, 3, or 4.
    pub fn from_dyn(array: ArrayD<f32>) -> Result<Self> {
        match array.ndim() {
            2 => Ok(Self::Gray(into_fixed::<Ix2>(array)?)),
            3 => Ok(Self::Chw(into_fixed::<Ix3>(array)?)),
            4 => Ok(Self::Nchw(into_fixed::<Ix4>(array)?)),
            rank => Err(Error::unsupported_rank(rank)),
        }
    }

    /// Number of axes.
    #[must_use]
    pub const fn rank(&self) -> usize {
        match self {
            Self::Gray(_) => 2,
            Self::Chw(_) => 3,
            Self::Nchw(_) => 4,
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Gray(a) => a.shape(),
            Self::Chw(a) => a.shape(),
            Self::Nchw(a) => a.shape(),
        }
    }

    /// Borrow the data as a dynamic-rank view.
    #[must_use]
    pub fn view_dyn(&self) -> ArrayViewD<'_, f32> {
        match self {
            Self::Gray(a) => a.view().into_dyn(),
            Self::Chw(a) => a.view().into_dyn(),
            Self::Nchw(a) => a.view().into_dyn(),
        }
    }

    #[must_use]
    pub fn into_dyn(self) -> ArrayD<f32> {
        match self {
            Self::Gray(a) => a.into_dyn(),
            Self::Chw(a) => a.into_dyn(),
            Self::Nchw(a) => a.into_dyn(),
        }
    }

    /// Apply an elementwise function, keeping the variant.
    #[must_use]
    pub fn mapv<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        match self {
            Self::Gray(a) => Self::Gray(a.mapv(&f)),
            Self::Chw(a) => Self::Chw(a.mapv(&f)),
            Self::Nchw(a) => Self::Nchw(a.mapv(&f)),
        }
    }
}

/// Convert a dynamic array whose rank was already checked.
fn into_fixed<D: ndarray::Dimension>(array: ArrayD<f32>) -> Result<ndarray::Array<f32, D>> {
    let actual = format!("{:?}", array.shape());
    array
        .into_dimensionality::<D>()
        .map_err(|_| Error::ShapeMismatch {
            expected: format!("{}D tensor", D::NDIM.unwrap_or(0)),
            actual,
        })
}

impl TryFrom<ArrayD<f32>> for ImageTensor {
    type Error = Error;

    fn try_from(array: ArrayD<f32>) -> Result<Self> {
        Self::from_dyn(array)
    }
}

impl From<Array2<f32>> for ImageTensor {
    fn from(array: Array2<f32>) -> Self {
        Self::Gray(array)
    }
}

impl From<Array3<f32>> for ImageTensor {
    fn from(array: Array3<f32>) -> Self {
        Self::Chw(array)
    }
}

impl From<Array4<f32>> for ImageTensor {
    fn from(array: Array4<f32>) -> Self {
        Self::Nchw(array)
    }
}
