use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use histeq_eval::{
    run, ClaheParams, ComparisonConfig, HistogramEqualizer, ImageInput, Method, ReportSink,
    RunConfig, TableReport, TileGrid, Variant,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Compares global and adaptive histogram equalization of a grayscale image.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Parameters {
    ///Path to the input image.
    input: PathBuf,
    ///Clip limit of the adaptive variant, relative to the average bin height.
    #[arg(long, default_value_t = 1000.0)]
    clip_limit: f32,
    ///Tile rows of the adaptive variant.
    #[arg(long, default_value_t = 8)]
    tiles_h: usize,
    ///Tile columns of the adaptive variant.
    #[arg(long, default_value_t = 8)]
    tiles_w: usize,
    ///Directory for enhanced images and histogram graphs.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    ///Do not write any image files.
    #[arg(long)]
    no_images: bool,
    ///Write enhanced images but skip the histogram graphs.
    #[arg(long)]
    no_plots: bool,
}

impl From<Parameters> for RunConfig {
    fn from(params: Parameters) -> Self {
        let adaptive = ClaheParams::new(params.clip_limit, TileGrid::new(params.tiles_h, params.tiles_w));
        RunConfig {
            input: ImageInput::Path(params.input),
            comparison: ComparisonConfig {
                variants: vec![
                    Variant::new("STD HE", Method::HE),
                    Variant::new("AHE", Method::CLAHE(adaptive)),
                ],
            },
            output_dir: (!params.no_images).then_some(params.output_dir),
            plot_histograms: !params.no_plots,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = RunConfig::from(Parameters::parse());
    let mut table = TableReport::new(std::io::stdout().lock());
    let mut sinks: [&mut dyn ReportSink; 1] = [&mut table];

    match run(&config, &HistogramEqualizer, &mut sinks) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
