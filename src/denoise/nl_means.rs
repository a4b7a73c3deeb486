//! Non-local means denoising of a single channel-last image.

use ndarray::{Array2, Array3, ArrayView3};

use crate::error::{Error, Result};
use crate::filter::reflect_index;

/// Non-local means parameters.
///
/// Each output pixel is a weighted average of the pixels within
/// `patch_distance` of it, where the weight of a candidate falls off with the
/// mean squared difference between the `patch_size` x `patch_size` patches
/// centred on the two pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlMeans {
    /// Side length of the comparison patches. Must be odd.
    pub patch_size: usize,

    /// Search radius in pixels.
    pub patch_distance: usize,

    /// Cut-off distance; larger values smooth more.
    pub h: f32,

    /// Expected noise standard deviation, subtracted from patch distances.
    pub sigma: f32,

    /// Use uniform patch weights computed with summed-area tables instead of
    /// a Gaussian-weighted patch distance.
    pub fast_mode: bool,
}

impl Default for NlMeans {
    fn default() -> Self {
        Self {
            patch_size: 7,
            patch_distance: 11,
            h: 0.1,
            sigma: 0.0,
            fast_mode: true,
        }
    }
}

/// Geometry shared by both search strategies.
#[derive(Debug, Clone, Copy)]
struct Layout {
    height: usize,
    width: usize,
    channels: usize,
    /// Half patch size.
    offset: usize,
    /// Padding on every spatial side of the working copy.
    pad: usize,
}

impl NlMeans {
    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.patch_size == 0 || self.patch_size % 2 == 0 {
            return Err(Error::primitive(
                "denoise_nl_means",
                format!("patch_size must be odd and positive, got {}", self.patch_size),
            ));
        }
        if self.patch_distance == 0 {
            return Err(Error::primitive(
                "denoise_nl_means",
                "patch_distance must be positive",
            ));
        }
        if !(self.h.is_finite() && self.h > 0.0) {
            return Err(Error::primitive(
                "denoise_nl_means",
                format!("h must be positive, got {}", self.h),
            ));
        }
        if !(self.sigma.is_finite() && self.sigma >= 0.0) {
            return Err(Error::primitive(
                "denoise_nl_means",
                format!("sigma must be non-negative, got {}", self.sigma),
            ));
        }
        Ok(())
    }

    /// Denoise one image laid out as (height, width, channel).
    ///
    /// Any strides are accepted, so a permuted view of a channel-first image
    /// can be passed without copying. Patches that cross the border read
    /// reflected samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Primitive`] if the parameters are invalid or the image
    /// has an empty axis.
    pub fn denoise(&self, image: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        self.validate()?;

        let (height, width, channels) = image.dim();
        if height == 0 || width == 0 || channels == 0 {
            return Err(Error::primitive(
                "denoise_nl_means",
                format!("image of shape {:?} is empty", image.shape()),
            ));
        }

        let offset = self.patch_size / 2;
        let layout = Layout {
            height,
            width,
            channels,
            offset,
            pad: offset + self.patch_distance,
        };
        let padded = reflect_pad(image, layout.pad);

        Ok(if self.fast_mode {
            self.search_fast(&padded, layout)
        } else {
            self.search_exact(&padded, layout)
        })
    }

    fn weight(&self, distance: f64) -> f64 {
        let variance = 2.0 * f64::from(self.sigma) * f64::from(self.sigma);
        let h2 = f64::from(self.h) * f64::from(self.h);
        (-(distance - variance).max(0.0) / h2).exp()
    }

    /// Gaussian patch weights normalised to sum to `1 / channels`.
    #[allow(clippy::cast_precision_loss)]
    fn patch_kernel(&self, channels: usize) -> Array2<f64> {
        let offset = (self.patch_size / 2) as f64;
        let spread = (self.patch_size as f64 - 1.0) / 4.0;
        let mut kernel = Array2::from_shape_fn((self.patch_size, self.patch_size), |(y, x)| {
            if spread == 0.0 {
                return 1.0;
            }
            let dy = y as f64 - offset;
            let dx = x as f64 - offset;
            (-(dy * dy + dx * dx) / (2.0 * spread * spread)).exp()
        });
        let total = kernel.sum() * channels as f64;
        kernel /= total;
        kernel
    }

    fn search_exact(&self, padded: &Array3<f32>, layout: Layout) -> Array3<f32> {
        let Layout {
            height,
            width,
            channels,
            offset,
            pad,
        } = layout;
        let reach = self.patch_distance;
        let kernel = self.patch_kernel(channels);
        let corner = pad - offset;

        let mut out = Array3::<f32>::zeros((height, width, channels));
        let mut acc = vec![0.0_f64; channels];

        for y in 0..height {
            for x in 0..width {
                acc.fill(0.0);
                let mut total = 0.0_f64;

                for sy in y.saturating_sub(reach)..=(y + reach).min(height - 1) {
                    for sx in x.saturating_sub(reach)..=(x + reach).min(width - 1) {
                        let mut distance = 0.0_f64;
                        for ((py, px), &k) in kernel.indexed_iter() {
                            for ch in 0..channels {
                                let a = padded[[y + corner + py, x + corner + px, ch]];
                                let b = padded[[sy + corner + py, sx + corner + px, ch]];
                                let diff = f64::from(a - b);
                                distance += k * diff * diff;
                            }
                        }

                        let w = self.weight(distance);
                        total += w;
                        for (ch, sum) in acc.iter_mut().enumerate() {
                            *sum += w * f64::from(padded[[sy + pad, sx + pad, ch]]);
                        }
                    }
                }

                // The pixel always matches itself with weight 1, so total >= 1.
                for (ch, sum) in acc.iter().enumerate() {
                    #[allow(clippy::cast_possible_truncation)]
                    let value = (sum / total) as f32;
                    out[[y, x, ch]] = value;
                }
            }
        }

        out
    }

    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation
    )]
    fn search_fast(&self, padded: &Array3<f32>, layout: Layout) -> Array3<f32> {
        let Layout {
            height,
            width,
            channels,
            offset,
            pad,
        } = layout;
        let reach = self.patch_distance as isize;
        let size = self.patch_size;
        let norm = (size * size * channels) as f64;

        // Patch centres span the image; patch samples span it plus `offset` on each side.
        let rows = height + 2 * offset;
        let cols = width + 2 * offset;
        let corner = pad - offset;

        let mut acc = Array3::<f64>::zeros((height, width, channels));
        let mut totals = Array2::<f64>::zeros((height, width));
        let mut table = Array2::<f64>::zeros((rows + 1, cols + 1));

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                // Summed-area table of the squared difference between the image and its shift.
                for r in 0..rows {
                    let mut row_sum = 0.0_f64;
                    let sr = ((corner + r) as isize + dy) as usize;
                    for c in 0..cols {
                        let sc = ((corner + c) as isize + dx) as usize;
                        for ch in 0..channels {
                            let diff = f64::from(padded[[corner + r, corner + c, ch]] - padded[[sr, sc, ch]]);
                            row_sum += diff * diff;
                        }
                        table[[r + 1, c + 1]] = table[[r, c + 1]] + row_sum;
                    }
                }

                for y in 0..height {
                    let ty = y as isize + dy;
                    if ty < 0 || ty >= height as isize {
                        continue;
                    }
                    for x in 0..width {
                        let tx = x as isize + dx;
                        if tx < 0 || tx >= width as isize {
                            continue;
                        }
                        let patch = table[[y + size, x + size]] - table[[y, x + size]]
                            - table[[y + size, x]]
                            + table[[y, x]];
                        let w = self.weight(patch / norm);
                        totals[[y, x]] += w;
                        let (ty, tx) = (ty as usize, tx as usize);
                        for ch in 0..channels {
                            acc[[y, x, ch]] += w * f64::from(padded[[ty + pad, tx + pad, ch]]);
                        }
                    }
                }
            }
        }

        Array3::from_shape_fn((height, width, channels), |(y, x, ch)| {
            (acc[[y, x, ch]] / totals[[y, x]]) as f32
        })
    }
}

/// Copy `image` into a buffer padded by `pad` reflected samples on both spatial axes.
#[allow(clippy::cast_possible_wrap)]
fn reflect_pad(image: ArrayView3<'_, f32>, pad: usize) -> Array3<f32> {
    let (height, width, channels) = image.dim();
    let shift = pad as isize;
    Array3::from_shape_fn(
        (height + 2 * pad, width + 2 * pad, channels),
        |(y, x, ch)| {
            let sy = reflect_index(y as isize - shift, height);
            let sx = reflect_index(x as isize - shift, width);
            image[[sy, sx, ch]]
        },
    )
}
