//! Image quality metrics used to compare an original image with its enhanced
//! variants.
//!
//! All functions are pure and recompute from the pixels they are given.

use std::fmt;

use ndarray::ArrayView2;

use crate::error::{EvalError, Result};
use crate::histogram::{calc_hist, probability_distribution};

/// A metric reported for every image in a comparison.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Entropy,
    Contrast,
    Ambe,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Entropy, Metric::Contrast, Metric::Ambe];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Entropy => "Entropy (Detail)",
            Metric::Contrast => "Std Dev (Contrast)",
            Metric::Ambe => "AMBE (Brightness Err)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn ensure_not_empty(image: &ArrayView2<u8>) -> Result<()> {
    if image.is_empty() {
        return Err(EvalError::EmptyImage);
    }
    Ok(())
}

/// Shannon entropy in bits of the 256-bin intensity histogram.
///
/// Levels that never occur are skipped, `0 * log2(0)` has no contribution.
/// The result lies in `[0, 8]`.
pub fn entropy(image: &ArrayView2<u8>) -> Result<f64> {
    ensure_not_empty(image)?;
    let prob_dist = probability_distribution(&calc_hist(image))?;
    let sum: f64 = prob_dist
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| p * p.log2())
        .sum();
    // -0.0 for single-level images
    Ok((-sum).max(0.0))
}

/// Mean intensity. Samples are summed as integers before the division.
pub fn mean(image: &ArrayView2<u8>) -> Result<f64> {
    ensure_not_empty(image)?;
    let sum: u64 = image.iter().map(|v| u64::from(*v)).sum();
    Ok(sum as f64 / image.len() as f64)
}

/// Population standard deviation of the intensities, used as the contrast
/// measure for every image in a comparison.
pub fn std_dev(image: &ArrayView2<u8>) -> Result<f64> {
    ensure_not_empty(image)?;
    Ok(image.mapv(f64::from).std(0.0))
}

/// Absolute mean brightness error between an original and an enhanced image.
///
/// Both images must have the same shape.
pub fn ambe(original: &ArrayView2<u8>, enhanced: &ArrayView2<u8>) -> Result<f64> {
    if original.dim() != enhanced.dim() {
        return Err(EvalError::DimensionMismatch {
            expected: original.dim(),
            actual: enhanced.dim(),
        });
    }
    Ok((mean(original)? - mean(enhanced)?).abs())
}
