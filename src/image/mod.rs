//! Image loading and saving utilities.

mod load;
mod save;

pub use load::load_image;
pub use save::save_image;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Largest 8-bit sample value, used to scale between `u8` and [0, 1].
const MAX_SAMPLE: f32 = 255.0;
