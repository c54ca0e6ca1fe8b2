use ndarray::{s, Array1, Array2, ArrayView2};

use crate::error::{EvalError, Result};
use crate::histogram::{calc_hist, calc_hist_cdf, clip_hist, LEVELS};

/// Number of tiles along each axis for contrast-limited equalization.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub rows: usize,
    pub cols: usize,
}

impl TileGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(8, 8)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClaheParams {
    /// Bin limit relative to the average bin height of a tile histogram.
    /// Large values effectively turn clipping off.
    pub clip_limit: f32,
    pub tile_grid: TileGrid,
}

impl ClaheParams {
    pub fn new(clip_limit: f32, tile_grid: TileGrid) -> Self {
        Self { clip_limit, tile_grid }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.clip_limit.is_finite() || self.clip_limit <= 0.0 {
            return Err(EvalError::InvalidClipLimit(self.clip_limit));
        }
        let TileGrid { rows, cols } = self.tile_grid;
        if rows == 0 || cols == 0 {
            return Err(EvalError::InvalidTileGrid { rows, cols });
        }
        Ok(())
    }
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self::new(1000.0, TileGrid::default())
    }
}

/// Enhancement applied to produce a variant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Method {
    HE,
    CLAHE(ClaheParams),
}

impl Method {
    pub fn validate(&self) -> Result<()> {
        match self {
            Method::HE => Ok(()),
            Method::CLAHE(params) => params.validate(),
        }
    }

    pub fn apply<E: Enhancer + ?Sized>(&self, enhancer: &E, image: &ArrayView2<u8>) -> Result<Array2<u8>> {
        match self {
            Method::HE => enhancer.global_equalize(image),
            Method::CLAHE(params) => enhancer.adaptive_equalize(image, params),
        }
    }
}

/// Produces enhanced images with the same shape as their input.
pub trait Enhancer {
    fn global_equalize(&self, image: &ArrayView2<u8>) -> Result<Array2<u8>>;

    fn adaptive_equalize(&self, image: &ArrayView2<u8>, params: &ClaheParams) -> Result<Array2<u8>>;
}

/// Histogram equalization on 8-bit grayscale arrays.
#[derive(Copy, Clone, Debug, Default)]
pub struct HistogramEqualizer;

impl Enhancer for HistogramEqualizer {
    fn global_equalize(&self, image: &ArrayView2<u8>) -> Result<Array2<u8>> {
        he_2d(image)
    }

    fn adaptive_equalize(&self, image: &ArrayView2<u8>, params: &ClaheParams) -> Result<Array2<u8>> {
        clahe_2d(image, params)
    }
}

/// Global histogram equalization. The lowest occupied level maps to 0 and
/// the highest to 255. A single-level image is returned unchanged.
pub fn he_2d(img_array: &ArrayView2<u8>) -> Result<Array2<u8>> {
    if img_array.is_empty() {
        return Err(EvalError::EmptyImage);
    }
    let hist = calc_hist(img_array);
    let total = img_array.len() as u64;
    let cdf_min = hist.iter().copied().find(|c| *c > 0).unwrap_or(0);
    if cdf_min == total {
        return Ok(img_array.to_owned());
    }

    let scale = (LEVELS - 1) as f64 / (total - cdf_min) as f64;
    let mut cumsum = 0u64;
    let lut: Vec<u8> = hist
        .iter()
        .map(|count| {
            cumsum += count;
            let mapped = cumsum.saturating_sub(cdf_min) as f64 * scale;
            mapped.round().clamp(0.0, 255.0) as u8
        })
        .collect();

    Ok(img_array.mapv(|v| lut[usize::from(v)]))
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into `tile_grid` tiles. Every tile gets its own clipped
/// histogram mapping and each pixel is bilinearly interpolated between the
/// mappings of the four nearest tile centres.
pub fn clahe_2d(img_array: &ArrayView2<u8>, params: &ClaheParams) -> Result<Array2<u8>> {
    params.validate()?;
    if img_array.is_empty() {
        return Err(EvalError::EmptyImage);
    }
    let (m, n) = img_array.dim();

    let bounds_m = tile_bounds(m, params.tile_grid.rows);
    let bounds_n = tile_bounds(n, params.tile_grid.cols);
    tracing::trace!(blocks_m = bounds_m.len() - 1, blocks_n = bounds_n.len() - 1, "clahe tiling");

    let maps: Vec<Vec<Array1<f32>>> = bounds_m
        .windows(2)
        .map(|rows| {
            bounds_n
                .windows(2)
                .map(|cols| {
                    let block_view = img_array.slice(s![rows[0]..rows[1], cols[0]..cols[1]]);
                    let mut hist = calc_hist(&block_view).mapv(|c| c as f32);
                    clip_hist(&mut hist, params.clip_limit);
                    calc_hist_cdf(&hist)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let row_weights = interpolation_weights(m, &bounds_m);
    let col_weights = interpolation_weights(n, &bounds_n);

    let result = Array2::from_shape_fn((m, n), |(i, j)| {
        let (r0, r1, wy) = row_weights[i];
        let (c0, c1, wx) = col_weights[j];
        let v = usize::from(img_array[[i, j]]);
        let upper = (1.0 - wx) * maps[r0][c0][v] + wx * maps[r0][c1][v];
        let lower = (1.0 - wx) * maps[r1][c0][v] + wx * maps[r1][c1][v];
        ((1.0 - wy) * upper + wy * lower).round().clamp(0.0, 255.0) as u8
    });
    Ok(result)
}

/// Tile boundaries along an axis of `len` pixels. The remainder is spread so
/// tile sizes differ by at most one pixel. An axis shorter than the requested
/// tile count gets one tile per pixel.
pub fn tile_bounds(len: usize, tiles: usize) -> Vec<usize> {
    let tiles = tiles.min(len).max(1);
    (0..=tiles).map(|k| k * len / tiles).collect()
}

/// For each position along an axis: the two neighbouring tile indices and the
/// weight of the second one. Tile centres sit at `(start + end) / 2`;
/// positions outside the outermost centres clamp to the nearest tile.
fn interpolation_weights(len: usize, bounds: &[usize]) -> Vec<(usize, usize, f32)> {
    let centres: Vec<f32> = bounds
        .windows(2)
        .map(|w| (w[0] + w[1]) as f32 / 2.0)
        .collect();
    let last = centres.len() - 1;
    (0..len)
        .map(|p| {
            let pos = p as f32;
            let hi = centres.partition_point(|c| *c <= pos);
            if hi == 0 {
                (0, 0, 0.0)
            } else if hi > last {
                (last, last, 0.0)
            } else {
                let lo = hi - 1;
                (lo, hi, (pos - centres[lo]) / (centres[hi] - centres[lo]))
            }
        })
        .collect()
}
