//! Reporting sinks fed with a finished [`Comparison`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use plotters::prelude::{RGBColor, BLACK, BLUE, GREEN};
use tracing::info;

use crate::compare::{Comparison, ScoredImage};
use crate::error::Result;
use crate::histogram::calc_hist;
use crate::metrics::Metric;
use crate::plot_histogram::{plot_comparison, plot_histogram, HistogramPanel, ImagePanel};
use crate::save_gray_image;

const COLORS: [RGBColor; 3] = [BLACK, BLUE, GREEN];
const LABEL_WIDTH: usize = 21;
const CELL_WIDTH: usize = 10;

pub trait ReportSink {
    fn report(&mut self, comparison: &Comparison) -> Result<()>;
}

/// Plain text table with one column per image.
pub struct TableReport<W: Write> {
    out: W,
}

impl<W: Write> TableReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:<width$.4}", v, width = CELL_WIDTH),
        None => format!("{:<width$}", "N/A", width = CELL_WIDTH),
    }
}

impl<W: Write> ReportSink for TableReport<W> {
    fn report(&mut self, comparison: &Comparison) -> Result<()> {
        let header = format!(
            "{:<label$} | {}",
            "METRIC",
            comparison
                .entries
                .iter()
                .map(|e| format!("{:<width$}", e.name, width = CELL_WIDTH))
                .join(" | "),
            label = LABEL_WIDTH
        );
        let width = header.trim_end().len();

        writeln!(self.out)?;
        writeln!(self.out, "{}", "=".repeat(width))?;
        writeln!(self.out, "{}", header.trim_end())?;
        writeln!(self.out, "{}", "-".repeat(width))?;
        for metric in Metric::ALL {
            let cells = comparison
                .entries
                .iter()
                .map(|e| format_cell(e.scores.get(metric)))
                .join(" | ");
            let row = format!("{:<label$} | {}", metric.label(), cells, label = LABEL_WIDTH);
            writeln!(self.out, "{}", row.trim_end())?;
        }
        writeln!(self.out, "{}", "=".repeat(width))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

/// File name fragment for an image name: lowercase, spaces as underscores.
pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .join("_")
}

fn histogram_title(entry: &ScoredImage) -> String {
    format!("{} Hist", entry.name)
}

fn image_title(entry: &ScoredImage) -> String {
    match entry.scores.ambe {
        Some(ambe) => format!("{} | AMBE {:.2} (Lower is better)", entry.name, ambe),
        None => entry.name.clone(),
    }
}

fn comparison_caption(comparison: &Comparison) -> String {
    let entropies = comparison
        .entries
        .iter()
        .map(|e| format!("{} Entropy: {:.2}", e.name, e.scores.entropy))
        .join(" | ");
    format!("Quantitative Comparison | {}", entropies)
}

/// Writes enhanced images and histogram graphs into a directory.
pub struct PngReport {
    output_dir: PathBuf,
    histograms: bool,
}

impl PngReport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            histograms: true,
        }
    }

    /// Skips the histogram graphs, only enhanced images are written.
    pub fn with_histograms(mut self, histograms: bool) -> Self {
        self.histograms = histograms;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn image_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("enhanced_{}_image.png", slug(name)))
    }

    pub fn histogram_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("graph_{}_Hist.png", slug(name)))
    }

    pub fn comparison_path(&self) -> PathBuf {
        self.output_dir.join("comparison.png")
    }
}

impl ReportSink for PngReport {
    fn report(&mut self, comparison: &Comparison) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        for variant in comparison.variants() {
            save_gray_image(&self.image_path(&variant.name), &variant.image.view())?;
        }
        if !self.histograms {
            return Ok(());
        }

        let panels = comparison
            .entries
            .iter()
            .zip(COLORS.iter().cycle())
            .map(|(entry, color)| HistogramPanel {
                title: histogram_title(entry),
                hist: calc_hist(&entry.image.view()),
                color: *color,
            })
            .collect::<Vec<_>>();

        for (entry, panel) in comparison.entries.iter().zip(&panels) {
            plot_histogram(&self.histogram_path(&entry.name), panel)?;
        }
        let images = comparison
            .entries
            .iter()
            .map(|entry| ImagePanel {
                title: image_title(entry),
                image: entry.image.view(),
            })
            .collect::<Vec<_>>();
        plot_comparison(
            &self.comparison_path(),
            &comparison_caption(comparison),
            &images,
            &panels,
        )?;
        info!(dir = %self.output_dir.display(), graphs = panels.len() + 1, "histograms written");
        Ok(())
    }
}
