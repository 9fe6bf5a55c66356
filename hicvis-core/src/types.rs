use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HicvisError;

pub type GenomicPos = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Reflect across the diagonal `x == y`.
    pub fn swapped(self) -> Self {
        Self { x: self.y, y: self.x }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A single Voronoi cell as delivered by the server.
///
/// `points` is an open ring: the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub area: f64,
    /// Cell touches the data boundary; excluded from area statistics.
    pub clipped: bool,
    pub centroid: Point,
    pub data_point: Point,
}

impl Polygon {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }

    pub fn log_area(&self) -> f64 {
        self.area.ln()
    }

    /// Whether the ring has enough points to enclose any area.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 3
    }

    /// Copy of this cell reflected across the diagonal, used to fill the
    /// half of a symmetric self-comparison matrix the server omits.
    pub fn mirrored(&self) -> Self {
        Self {
            points: self.points.iter().map(|p| p.swapped()).collect(),
            area: self.area,
            clipped: self.clipped,
            centroid: self.centroid.swapped(),
            data_point: self.data_point.swapped(),
        }
    }
}

/// All cells returned for one view request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoronoiSet {
    pub polygons: Vec<Polygon>,
}

impl VoronoiSet {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Log areas of cells that do not touch the data boundary.
    pub fn unclipped_log_areas(&self) -> impl Iterator<Item = f64> + '_ {
        self.polygons
            .iter()
            .filter(|p| !p.clipped)
            .map(|p| p.log_area())
            .filter(|a| a.is_finite())
    }

    pub fn min_max_log_area(&self) -> Option<(f64, f64)> {
        self.unclipped_log_areas().fold(None, |acc, a| match acc {
            None => Some((a, a)),
            Some((min, max)) => Some((min.min(a), max.max(a))),
        })
    }
}

/// Row-major bin counts covering the same extent as the Voronoi set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, data: Vec<u32>) -> Self {
        Self { width, height, data }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y as usize) * (self.width as usize) + x as usize).copied()
    }

    /// Number of contacts in view.
    pub fn total_count(&self) -> u64 {
        self.data.iter().map(|&v| v as u64).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    pub fn nonzero_values(&self) -> impl Iterator<Item = u32> + '_ {
        self.data.iter().copied().filter(|&v| v > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Length")]
    pub length: GenomicPos,
}

impl Chromosome {
    pub fn new(name: impl Into<String>, length: GenomicPos) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    /// Name in `chrN` form, as used by interaction pair keys.
    pub fn name_with_chr(&self) -> String {
        with_chr_prefix(&self.name)
    }
}

pub fn with_chr_prefix(name: &str) -> String {
    if name.starts_with("chr") {
        name.to_string()
    } else {
        format!("chr{}", name)
    }
}

/// Point annotation drawn over both views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Interaction {
    pub source_chrom: String,
    pub source_start: GenomicPos,
    pub source_end: GenomicPos,
    pub target_chrom: String,
    pub target_start: GenomicPos,
    pub target_end: GenomicPos,
}

impl Interaction {
    /// Data-space x/y ranges for the `(source, target)` pair, swapping
    /// coordinates when the interaction was recorded the other way round.
    pub fn oriented(&self, source: &Chromosome, target: &Chromosome) -> Option<((f64, f64), (f64, f64))> {
        let src = source.name_with_chr();
        let tar = target.name_with_chr();
        let own_src = with_chr_prefix(&self.source_chrom);
        let own_tar = with_chr_prefix(&self.target_chrom);

        let forward = (
            (self.source_start as f64, self.source_end as f64),
            (self.target_start as f64, self.target_end as f64),
        );
        if own_src == src && own_tar == tar {
            Some(forward)
        } else if own_src == tar && own_tar == src {
            Some((forward.1, forward.0))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    X,
    Y,
}

/// A genome-browser locus, `chr:start-end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locus {
    pub chr: String,
    pub start: i64,
    pub end: i64,
}

impl Locus {
    pub fn new(chr: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            chr: chr.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}

impl FromStr for Locus {
    type Err = HicvisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HicvisError::InvalidLocus(s.to_string());

        let (chr, range) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        let parse = |v: &str| v.replace(',', "").trim().parse::<i64>().map_err(|_| invalid());

        if chr.is_empty() {
            return Err(invalid());
        }
        Ok(Locus::new(chr, parse(start)?, parse(end)?))
    }
}
