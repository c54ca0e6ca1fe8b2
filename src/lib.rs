use std::borrow::Cow;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma};
use ndarray::{Array2, ArrayView2};
use tracing::{debug, info};

pub mod compare;
pub mod equalize;
pub mod error;
pub mod histogram;
pub mod metrics;
mod plot_histogram;
pub mod report;

pub use compare::{compare, Comparison, ComparisonConfig, ScoredImage, Scores, Variant, ORIGINAL};
pub use equalize::{ClaheParams, Enhancer, HistogramEqualizer, Method, TileGrid};
pub use error::{EvalError, Result};
pub use metrics::{ambe, entropy, mean, std_dev, Metric};
pub use report::{PngReport, ReportSink, TableReport};

/// Where the image under evaluation comes from.
#[derive(Clone, Debug)]
pub enum ImageInput {
    Path(PathBuf),
    Image(Array2<u8>),
}

/// Everything a single evaluation run depends on.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input: ImageInput,
    pub comparison: ComparisonConfig,
    /// Enhanced images and graphs are written here when set.
    pub output_dir: Option<PathBuf>,
    pub plot_histograms: bool,
}

impl RunConfig {
    pub fn new(input: ImageInput) -> Self {
        Self {
            input,
            comparison: ComparisonConfig::default(),
            output_dir: None,
            plot_histograms: true,
        }
    }
}

/// Converts to a `(height, width)` array indexed by `(row, column)`.
pub fn gray_image_to_array(image: GrayImage) -> Result<Array2<u8>> {
    let (w, h) = image.dimensions();
    Ok(Array2::from_shape_vec((h as usize, w as usize), image.into_raw())?)
}

pub fn array_to_gray_image(array: &ArrayView2<u8>) -> GrayImage {
    let (h, w) = array.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| Luma([array[[y as usize, x as usize]]]))
}

/// Reads an image file as 8-bit grayscale. Colour images are converted to luma.
pub fn load_gray_image(path: &Path) -> Result<Array2<u8>> {
    if !path.exists() {
        return Err(EvalError::NotFound(path.to_path_buf()));
    }
    let image = image::open(path).map_err(|source| EvalError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if !matches!(image, DynamicImage::ImageLuma8(_)) {
        debug!(color = ?image.color(), "converting to 8-bit luma");
    }
    let gray = image.into_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Err(EvalError::EmptyImage);
    }
    info!(path = %path.display(), width = gray.width(), height = gray.height(), "image loaded");
    gray_image_to_array(gray)
}

pub fn save_gray_image(path: &Path, array: &ArrayView2<u8>) -> Result<()> {
    array_to_gray_image(array)
        .save(path)
        .map_err(|source| EvalError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), "image written");
    Ok(())
}

/// Loads the input, compares all configured variants and hands the result to
/// every sink, then to a [`PngReport`] if an output directory is configured.
pub fn run<E: Enhancer + ?Sized>(
    config: &RunConfig,
    enhancer: &E,
    sinks: &mut [&mut dyn ReportSink],
) -> Result<Comparison> {
    let original: Cow<Array2<u8>> = match &config.input {
        ImageInput::Path(path) => Cow::Owned(load_gray_image(path)?),
        ImageInput::Image(image) => Cow::Borrowed(image),
    };

    let comparison = compare(&original.view(), &config.comparison, enhancer)?;

    for sink in sinks.iter_mut() {
        sink.report(&comparison)?;
    }
    if let Some(dir) = &config.output_dir {
        PngReport::new(dir)
            .with_histograms(config.plot_histograms)
            .report(&comparison)?;
    }
    Ok(comparison)
}
