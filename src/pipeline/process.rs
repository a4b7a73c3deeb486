//! File-to-file squeezing pipeline.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::image;
use crate::squeeze::Squeezer;
use crate::tensor::ImageTensor;

/// Configuration for the squeezing pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Squeezers applied in order.
    pub squeezers: Vec<Squeezer>,

    /// Load images as single-channel luma instead of RGB.
    pub grayscale: bool,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,

    /// Draw a progress bar while squeezers run.
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            squeezers: vec![Squeezer::BitDepth { bit_depth: 5 }],
            grayscale: false,
            output_quality: 95,
            show_progress: true,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.squeezers.is_empty() {
            return Err(Error::InvalidArgument {
                name: "squeezers".to_string(),
                reason: "at least one squeezer is required".to_string(),
            });
        }

        for squeezer in &self.squeezers {
            squeezer.validate()?;
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidArgument {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

/// Loads an image, runs the configured squeezers over it and saves the result.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Squeeze an image file into another image file.
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input image
    /// * `output_path` - Path to save the processed image
    ///
    /// # Errors
    ///
    /// Returns an error if loading, squeezing or saving fails. Nothing is
    /// written when a squeezer fails.
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<()> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        tracing::info!("Processing image: {}", input_path.display());
        let tensor = image::load_image(input_path, self.config.grayscale)?;

        let squeezed = self.run(&tensor)?;

        tracing::info!("Saving output to: {}", output_path.display());
        image::save_image(&squeezed, output_path, self.config.output_quality)?;

        tracing::info!("Processing complete");
        Ok(())
    }

    /// Run the configured squeezers over an in-memory tensor.
    ///
    /// # Errors
    ///
    /// Returns the first squeezer error.
    pub fn run(&self, tensor: &ImageTensor) -> Result<ImageTensor> {
        let pb = if self.config.show_progress {
            let pb = ProgressBar::new(self.config.squeezers.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} Squeezing [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("valid template")
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut current = tensor.clone();
        for squeezer in &self.config.squeezers {
            pb.set_message(squeezer.to_string());
            tracing::info!("Applying {squeezer} to tensor of shape {:?}", current.shape());
            current = squeezer.apply(&current)?;
            pb.inc(1);
        }

        pb.finish_with_message("done");
        Ok(current)
    }
}
