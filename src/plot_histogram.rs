use std::error::Error;
use std::path::Path;

use ndarray::{s, Array1, ArrayView2};
use ndarray_stats::QuantileExt;
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, ChartBuilder, Color, DrawingArea, DrawingBackend, IntoDrawingArea,
    LineSeries, RGBColor, Rectangle, BLACK, WHITE,
};

use crate::error::{EvalError, Result};
use crate::histogram::LEVELS;

const PANEL_WIDTH: u32 = 800;
const PANEL_HEIGHT: u32 = 600;
const THUMBNAIL_SIDE: usize = 128;

type PlotResult<T> = std::result::Result<T, Box<dyn Error>>;

/// One histogram chart.
pub(crate) struct HistogramPanel {
    pub title: String,
    pub hist: Array1<u64>,
    pub color: RGBColor,
}

/// One grayscale image chart.
pub(crate) struct ImagePanel<'a> {
    pub title: String,
    pub image: ArrayView2<'a, u8>,
}

/// Draws a single histogram as a line graph into a PNG file.
pub(crate) fn plot_histogram(filename: &Path, panel: &HistogramPanel) -> Result<()> {
    let render = || -> PlotResult<()> {
        let root = BitMapBackend::new(filename, (PANEL_WIDTH, PANEL_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        draw_histogram(&root, panel)?;
        root.present()?;
        Ok(())
    };
    render().map_err(|e| plot_error(filename, e))
}

/// Draws the images on the top row and their histograms below, one column
/// per image, under a common caption.
pub(crate) fn plot_comparison(
    filename: &Path,
    caption: &str,
    images: &[ImagePanel],
    histograms: &[HistogramPanel],
) -> Result<()> {
    let render = || -> PlotResult<()> {
        let columns = images.len().max(histograms.len()).max(1);
        let root = BitMapBackend::new(filename, (PANEL_WIDTH * columns as u32, PANEL_HEIGHT * 2))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let body = root.titled(caption, ("sans-serif", 28))?;

        let areas = body.split_evenly((2, columns));
        let (top, bottom) = areas.split_at(columns);
        for (area, panel) in top.iter().zip(images) {
            draw_image(area, panel)?;
        }
        for (area, panel) in bottom.iter().zip(histograms) {
            draw_histogram(area, panel)?;
        }
        root.present()?;
        Ok(())
    };
    render().map_err(|e| plot_error(filename, e))
}

fn plot_error(filename: &Path, e: Box<dyn Error>) -> EvalError {
    EvalError::Plot(format!("{}: {}", filename.display(), e))
}

fn draw_histogram<DB>(area: &DrawingArea<DB, Shift>, panel: &HistogramPanel) -> PlotResult<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let max_count = *panel.hist.max()? as f32;
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0..LEVELS, 0.0..(max_count * 1.05).max(1.0))?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .draw()?;

    chart.draw_series(LineSeries::new(
        panel.hist.iter().enumerate().map(|(x, y)| (x, *y as f32)),
        &panel.color,
    ))?;
    Ok(())
}

/// Nearest-neighbour thumbnail drawn one filled cell per sample, row 0 on top.
fn draw_image<DB>(area: &DrawingArea<DB, Shift>, panel: &ImagePanel) -> PlotResult<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (h, w) = panel.image.dim();
    let step = h.max(w).div_ceil(THUMBNAIL_SIDE).max(1) as isize;
    let thumb = panel.image.slice(s![..;step, ..;step]);
    let (rows, cols) = thumb.dim();

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 22))
        .margin(10)
        .build_cartesian_2d(0..cols, 0..rows)?;

    chart.draw_series(thumb.indexed_iter().map(|((r, c), v)| {
        let top = rows - r;
        Rectangle::new([(c, top), (c + 1, top - 1)], RGBColor(*v, *v, *v).filled())
    }))?;
    Ok(())
}
