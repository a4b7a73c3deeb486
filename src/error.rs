//! Custom error types for feature-squeeze.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the feature-squeeze library.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument is out of range, including tensors of unsupported rank.
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// A filtering or denoising primitive rejected its input.
    #[error("{op} failed: {reason}")]
    Primitive { op: &'static str, reason: String },

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_rank(rank: usize) -> Self {
        Self::invalid(
            "tensor",
            format!("expected a 2D, 3D, or 4D tensor, received a tensor of dim {rank}"),
        )
    }

    pub(crate) fn primitive(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Primitive {
            op,
            reason: reason.into(),
        }
    }

    /// Whether this error was raised by argument validation rather than by a primitive.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

/// Result type alias for feature-squeeze operations.
pub type Result<T> = std::result::Result<T, Error>;
