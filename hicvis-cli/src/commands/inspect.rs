//! Inspect command: decode a payload and summarise what it contains.

use anyhow::{Context, Result};
use clap::Args;
use hicvis_core::histogram::percentile_threshold;
use hicvis_core::{decode, Histogram, RasterImage, Transform, VoronoiSet};
use serde::Serialize;
use std::path::PathBuf;

use crate::commands::read_payload;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Raw payload returned by the server
    #[arg(long, required = true)]
    pub payload: PathBuf,

    /// Multiplier applied to the stored cell areas
    #[arg(long, default_value = "1.0")]
    pub area_scale: f64,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSummary {
    pub raster_width: u32,
    pub raster_height: u32,
    pub total_count: u64,
    pub max_count: u32,
    pub nonzero_bins: usize,
    pub density_threshold: u32,
    pub cells: usize,
    pub clipped_cells: usize,
    /// `(min, max)` of `ln(area)` over unclipped cells
    pub log_area_range: Option<(f64, f64)>,
    /// Centre of the fullest `ln(area)` histogram bin over unclipped cells
    pub log_area_peak: Option<f64>,
}

impl PayloadSummary {
    pub fn new(raster: &RasterImage, voronoi: &VoronoiSet, config: &Config) -> Self {
        let area_histogram = Histogram::build(
            voronoi.polygons.iter().filter(|p| !p.clipped).map(|p| p.area),
            config.viewer.histogram_bins,
            Transform::Ln,
        );
        let log_area_peak = area_histogram.as_ref().and_then(|h| {
            h.counts
                .iter()
                .enumerate()
                .max_by_key(|&(_, &count)| count)
                .map(|(bin, _)| h.value_at(bin) + h.bin_width / 2.0)
        });

        Self {
            raster_width: raster.width,
            raster_height: raster.height,
            total_count: raster.total_count(),
            max_count: raster.max_count(),
            nonzero_bins: raster.nonzero_values().count(),
            density_threshold: percentile_threshold(raster.data.iter().copied(), config.viewer.percentile),
            cells: voronoi.len(),
            clipped_cells: voronoi.polygons.iter().filter(|p| p.clipped).count(),
            log_area_range: voronoi.min_max_log_area(),
            log_area_peak,
        }
    }
}

impl std::fmt::Display for PayloadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Raster:            {} x {}", self.raster_width, self.raster_height)?;
        writeln!(f, "Total contacts:    {}", self.total_count)?;
        writeln!(f, "Max bin count:     {}", self.max_count)?;
        writeln!(f, "Nonzero bins:      {}", self.nonzero_bins)?;
        writeln!(f, "Density threshold: {}", self.density_threshold)?;
        writeln!(f, "Voronoi cells:     {} ({} clipped)", self.cells, self.clipped_cells)?;
        match self.log_area_range {
            Some((lo, hi)) => writeln!(f, "ln(area) range:    {:.3} .. {:.3}", lo, hi)?,
            None => writeln!(f, "ln(area) range:    -")?,
        }
        match self.log_area_peak {
            Some(peak) => write!(f, "ln(area) peak:     {:.3}", peak),
            None => write!(f, "ln(area) peak:     -"),
        }
    }
}

pub fn execute(config: &Config, args: InspectArgs) -> Result<()> {
    log::info!("Inspecting payload {}", args.payload.display());
    let bytes = read_payload(&args.payload)?;
    let (raster, voronoi) = decode(&bytes, args.area_scale)
        .with_context(|| format!("Failed to decode payload {}", args.payload.display()))?;

    let summary = PayloadSummary::new(&raster, &voronoi, config);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}
