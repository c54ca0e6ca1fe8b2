use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use histeq_eval::save_gray_image;
use ndarray::Array2;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Writes a low-contrast grayscale test image: a diagonal gradient between
/// `low` and `high` with a slightly brighter square in the middle.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Parameters {
    ///Image height in pixels.
    #[arg(long)]
    height: usize,
    ///Image width in pixels.
    #[arg(long)]
    width: usize,
    ///Darkest intensity of the gradient.
    #[arg(long, default_value_t = 90)]
    low: u8,
    ///Brightest intensity of the gradient.
    #[arg(long, default_value_t = 160)]
    high: u8,
    ///Output file path.
    #[arg(long, default_value = "test_gradient.png")]
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let params = Parameters::parse();
    if params.width == 0 || params.height == 0 || params.low > params.high {
        error!(?params, "need a non-empty image and low <= high");
        return ExitCode::FAILURE;
    }

    let (h, w) = (params.height, params.width);
    let span = f32::from(params.high - params.low);
    let diagonal = (h + w).saturating_sub(2).max(1) as f32;
    let square = (h.min(w) / 4, h / 2, w / 2);

    let img = Array2::from_shape_fn((h, w), |(y, x)| {
        let base = f32::from(params.low) + span * (y + x) as f32 / diagonal;
        let inside = y.abs_diff(square.1) < square.0 && x.abs_diff(square.2) < square.0;
        let lift = if inside { span * 0.15 } else { 0.0 };
        (base + lift).round().min(f32::from(params.high)) as u8
    });

    match save_gray_image(&params.output, &img.view()) {
        Ok(()) => {
            info!(path = %params.output.display(), h, w, "test image generated");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
