use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, enhancing, scoring or reporting an image.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The input path does not exist.
    #[error("Image not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be decoded as an image.
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The image has zero pixels.
    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Clip limit must be a positive finite number, got {0}")]
    InvalidClipLimit(f32),

    #[error("Tile grid must be at least 1x1, got {rows}x{cols}")]
    InvalidTileGrid { rows: usize, cols: usize },

    /// The enhancement provider could not produce a variant.
    #[error("Enhancement failed: {0}")]
    Enhancement(String),

    /// Two images that must share a shape do not.
    #[error("Image dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Failed to write {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Two variants would share a name, or a variant is named like the original.
    #[error("Duplicate variant name: {0}")]
    DuplicateVariant(String),

    #[error("Pixel buffer does not match image shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Plotting failed: {0}")]
    Plot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
