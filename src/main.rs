//! `feature-squeeze` CLI - Apply feature squeezing to an image file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_squeeze::{Config, Pipeline, Squeezer};

/// Reduce the precision of an image with one or more feature squeezers.
#[derive(Parser, Debug)]
#[command(name = "feature-squeeze")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image path.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Squeezer to apply, repeatable and applied in order:
    /// bit-depth:<bits>, median:<size>, mean:<size>,
    /// nl-means:<patch_size>:<patch_distance>[:exact].
    #[arg(short = 's', long = "squeeze", value_name = "SPEC", required = true)]
    squeezers: Vec<Squeezer>,

    /// Load the image as grayscale instead of RGB.
    #[arg(short, long)]
    grayscale: bool,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Hide the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("feature_squeeze={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let config = Config {
        squeezers: args.squeezers.clone(),
        grayscale: args.grayscale,
        output_quality: args.quality,
        show_progress: !args.no_progress,
    };

    let pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;

    pipeline
        .process(&args.input, &args.output)
        .context("Failed to process image")?;

    println!(
        "Successfully processed {} -> {}",
        args.input.display(),
        args.output.display()
    );

    Ok(())
}
