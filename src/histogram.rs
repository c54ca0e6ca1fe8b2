use ndarray::{Array1, ArrayView2, Axis};
use ndarray_stats::QuantileExt;
use num_traits::{sign::Unsigned, Bounded, PrimInt};

use crate::error::{EvalError, Result};

/// Number of intensity levels of an 8-bit image.
pub const LEVELS: usize = 256;

/// Counts pixels per intensity level. The histogram has `max_value + 1` bins.
///
/// Counts are kept as integers so that bins of very large images stay exact.
pub fn calc_hist<I>(img_array: &ArrayView2<I>) -> Array1<u64>
where
    I: PrimInt + Unsigned + Bounded,
    usize: From<I>,
{
    let level = usize::from(I::max_value()) + 1;
    let mut hist: Array1<u64> = Array1::zeros((level,));
    img_array.for_each(|v| hist[usize::from(*v)] += 1);
    hist
}

/// Normalizes a histogram by its total count. Empty bins stay at zero.
pub fn probability_distribution(hist: &Array1<u64>) -> Result<Array1<f64>> {
    let total = hist.sum();
    if total == 0 {
        return Err(EvalError::EmptyImage);
    }
    let total = total as f64;
    Ok(hist.mapv(|count| count as f64 / total))
}

/// Clips every bin at `clip_limit` times the average bin height, but never
/// below one count, and spreads the removed mass evenly over all bins. Total
/// mass is unchanged.
pub fn clip_hist(hist: &mut Array1<f32>, clip_limit: f32) {
    let bins = hist.len() as f32;
    let threshold = (clip_limit * hist.sum() / bins).max(1.0);
    let excess: f32 = hist
        .iter()
        .filter(|v| **v > threshold)
        .map(|v| v - threshold)
        .sum();
    if excess <= 0.0 {
        return;
    }
    let spread = excess / bins;
    hist.mapv_inplace(|v| v.min(threshold) + spread);
}

/// Cumulative histogram scaled so that the last level maps to the top of the
/// 8-bit range.
pub fn calc_hist_cdf(hist: &Array1<f32>) -> Array1<f32> {
    let max_level = (LEVELS - 1) as f32;
    let mut hist_cumsum = hist.clone();
    hist_cumsum.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);

    let total = hist_cumsum.max().map_or(0.0, |m| *m);
    if total <= 0.0 {
        return hist_cumsum;
    }
    hist_cumsum *= max_level / total;
    hist_cumsum
}

#[cfg(test)]
mod tests {
    use super::*;
    use more_asserts::{assert_ge, assert_le};
    use ndarray::{array, Array2};

    #[test]
    fn test_calc_hist_counts_levels() {
        let img = array![[0u8, 0, 255], [7, 7, 7]];
        let hist = calc_hist(&img.view());
        assert_eq!(hist.len(), LEVELS);
        assert_eq!(hist[0], 2);
        assert_eq!(hist[7], 3);
        assert_eq!(hist[255], 1);
        assert_eq!(hist.sum(), 6);
    }

    #[test]
    fn test_calc_hist_u16_has_full_range() {
        let img = array![[0u16, 65535]];
        let hist = calc_hist(&img.view());
        assert_eq!(hist.len(), 65536);
        assert_eq!(hist[65535], 1);
    }

    #[test]
    fn test_probability_distribution_sums_to_one() {
        let img = Array2::from_shape_fn((13, 17), |(r, c)| ((r * 31 + c * 7) % 256) as u8);
        let prob = probability_distribution(&calc_hist(&img.view())).unwrap();
        assert!((prob.sum() - 1.0).abs() < 1e-6);
        assert!(prob.iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn test_probability_distribution_of_empty_histogram() {
        let hist: Array1<u64> = Array1::zeros((LEVELS,));
        assert!(matches!(
            probability_distribution(&hist),
            Err(EvalError::EmptyImage)
        ));
    }

    #[test]
    fn test_clip_hist_keeps_mass() {
        let mut hist: Array1<f32> = Array1::zeros((LEVELS,));
        hist[10] = 900.0;
        hist[20] = 100.0;
        let before = hist.sum();
        clip_hist(&mut hist, 4.0);
        let threshold = 4.0 * before / LEVELS as f32;
        assert!((hist.sum() - before).abs() < 1e-2);
        assert_le!(hist[10], threshold + before / LEVELS as f32);
        assert_ge!(hist[0], 0.0);
        assert!(hist[0] > 0.0);
    }

    #[test]
    fn test_clip_threshold_has_one_count_floor() {
        let mut hist: Array1<f32> = Array1::zeros((LEVELS,));
        hist[40] = 16.0;
        hist[41] = 16.0;
        clip_hist(&mut hist, 0.01);
        let spread = 30.0 / LEVELS as f32;
        assert!((hist[40] - (1.0 + spread)).abs() < 1e-5);
        assert!((hist[0] - spread).abs() < 1e-5);
        assert!((hist.sum() - 32.0).abs() < 1e-3);
    }

    #[test]
    fn test_clip_hist_without_excess_is_noop() {
        let mut hist: Array1<f32> = Array1::from_elem((LEVELS,), 2.0);
        let expected = hist.clone();
        clip_hist(&mut hist, 1.5);
        assert_eq!(hist, expected);
    }

    #[test]
    fn test_cdf_is_monotonic_and_ends_at_top() {
        let mut hist: Array1<f32> = Array1::zeros((LEVELS,));
        hist[3] = 5.0;
        hist[100] = 10.0;
        hist[200] = 5.0;
        let cdf = calc_hist_cdf(&hist);
        assert!(cdf.windows(2).into_iter().all(|w| w[0] <= w[1]));
        assert_eq!(cdf[0], 0.0);
        assert!((cdf[3] - 63.75).abs() < 1e-4);
        assert!((cdf[255] - 255.0).abs() < 1e-4);
    }
}
