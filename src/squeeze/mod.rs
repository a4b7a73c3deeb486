//! Feature squeezing transforms.
//!
//! Each squeezer lowers the precision of an image along one axis (color depth,
//! local smoothness, patch redundancy). All of them take an [`ImageTensor`],
//! return a new tensor of the same variant and shape, and leave the input
//! untouched.

mod bit_depth;
mod nl_means;
mod smoothing;

pub use bit_depth::{bit_depth_squeeze, MAX_BIT_DEPTH};
pub use nl_means::non_local_means_squeeze;
pub use smoothing::{mean_filter_squeeze, median_filter_squeeze, spatial_window};

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayD, ArrayViewD};

use crate::error::{Error, Result};
use crate::tensor::ImageTensor;

/// One configured squeezer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Squeezer {
    /// Reduce each value to `bit_depth` bits.
    BitDepth { bit_depth: i32 },
    /// Local median over a `size` x `size` window.
    Median { size: i32 },
    /// Local mean over a `size` x `size` window.
    Mean { size: i32 },
    /// Non-local means denoising.
    NonLocalMeans {
        patch_size: i32,
        patch_distance: i32,
        fast_mode: bool,
    },
}

impl Squeezer {
    /// Short name used in logs and the textual form.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BitDepth { .. } => "bit-depth",
            Self::Median { .. } => "median",
            Self::Mean { .. } => "mean",
            Self::NonLocalMeans { .. } => "nl-means",
        }
    }

    /// Validate the parameters without touching any data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if any parameter is out of range.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::BitDepth { bit_depth } => bit_depth::check_bit_depth(bit_depth),
            Self::Median { size } | Self::Mean { size } => {
                smoothing::check_window_size(size).map(|_| ())
            }
            Self::NonLocalMeans {
                patch_size,
                patch_distance,
                ..
            } => nl_means::check_patch_params(patch_size, patch_distance).map(|_| ()),
        }
    }

    /// Apply this squeezer to `x`.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying transform.
    pub fn apply(&self, x: &ImageTensor) -> Result<ImageTensor> {
        match *self {
            Self::BitDepth { bit_depth } => bit_depth_squeeze(x, bit_depth),
            Self::Median { size } => median_filter_squeeze(x, size),
            Self::Mean { size } => mean_filter_squeeze(x, size),
            Self::NonLocalMeans {
                patch_size,
                patch_distance,
                fast_mode,
            } => non_local_means_squeeze(x, patch_size, patch_distance, fast_mode),
        }
    }

    /// Apply this squeezer to an array of unchecked rank.
    ///
    /// Parameters and rank are both checked before any data is copied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for invalid parameters or a rank
    /// outside 2..=4, otherwise the error of the underlying transform.
    pub fn apply_dyn(&self, x: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        self.validate()?;
        if !(2..=4).contains(&x.ndim()) {
            return Err(Error::unsupported_rank(x.ndim()));
        }
        let tensor = ImageTensor::from_dyn(x.to_owned())?;
        self.apply(&tensor).map(ImageTensor::into_dyn)
    }
}

impl fmt::Display for Squeezer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::BitDepth { bit_depth } => write!(f, "{}:{bit_depth}", self.name()),
            Self::Median { size } | Self::Mean { size } => write!(f, "{}:{size}", self.name()),
            Self::NonLocalMeans {
                patch_size,
                patch_distance,
                fast_mode,
            } => {
                write!(f, "{}:{patch_size}:{patch_distance}", self.name())?;
                if !fast_mode {
                    f.write_str(":exact")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Squeezer {
    type Err = Error;

    /// Parse `bit-depth:<bits>`, `median:<size>`, `mean:<size>` or
    /// `nl-means:<patch_size>:<patch_distance>[:exact]`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split(':');
        let kind = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let int = |index: usize, name: &str| -> Result<i32> {
            let raw = args
                .get(index)
                .ok_or_else(|| Error::invalid(name, format!("missing in {s:?}")))?;
            raw.parse()
                .map_err(|_| Error::invalid(name, format!("{raw:?} is not an integer")))
        };
        let arity = |expected: &[usize]| -> Result<()> {
            if expected.contains(&args.len()) {
                Ok(())
            } else {
                Err(Error::invalid(
                    "squeezer",
                    format!("wrong number of parameters in {s:?}"),
                ))
            }
        };

        let squeezer = match kind.as_str() {
            "bit-depth" | "bits" => {
                arity(&[1])?;
                Self::BitDepth {
                    bit_depth: int(0, "bit_depth")?,
                }
            }
            "median" => {
                arity(&[1])?;
                Self::Median {
                    size: int(0, "size")?,
                }
            }
            "mean" => {
                arity(&[1])?;
                Self::Mean {
                    size: int(0, "size")?,
                }
            }
            "nl-means" | "nlm" => {
                arity(&[2, 3])?;
                let fast_mode = match args.get(2).copied() {
                    None | Some("fast") => true,
                    Some("exact") => false,
                    Some(other) => {
                        return Err(Error::invalid(
                            "fast_mode",
                            format!("expected \"fast\" or \"exact\", got {other:?}"),
                        ))
                    }
                };
                Self::NonLocalMeans {
                    patch_size: int(0, "patch_size")?,
                    patch_distance: int(1, "patch_distance")?,
                    fast_mode,
                }
            }
            other => {
                return Err(Error::invalid(
                    "squeezer",
                    format!("unknown method {other:?}"),
                ))
            }
        };

        squeezer.validate()?;
        Ok(squeezer)
    }
}

/// Apply `squeezers` to `x` in order.
///
/// An empty chain returns a copy of `x`.
///
/// # Errors
///
/// Returns the first error raised by any squeezer; every squeezer is
/// validated before the first one runs.
pub fn squeeze_chain(x: &ImageTensor, squeezers: &[Squeezer]) -> Result<ImageTensor> {
    for squeezer in squeezers {
        squeezer.validate()?;
    }
    squeezers.iter().try_fold(x.clone(), |current, squeezer| {
        tracing::debug!(%squeezer, "applying squeezer");
        squeezer.apply(&current)
    })
}
