//! Fixed-width histograms and the quantizing colour scale they calibrate

use serde::{Deserialize, Serialize};

/// Value transform applied before binning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    #[default]
    Identity,
    Ln,
}

impl Transform {
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Transform::Identity => v,
            Transform::Ln => v.ln(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bin_width: f64,
    pub counts: Vec<u32>,
    pub transform: Transform,
}

impl Histogram {
    /// Bin `transform(v)` for every sample into `num_bins` equal-width bins.
    ///
    /// Non-finite transformed values are skipped. Returns `None` when no
    /// finite sample remains or `num_bins` is zero.
    pub fn build<I>(values: I, num_bins: usize, transform: Transform) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        if num_bins == 0 {
            return None;
        }

        let samples: Vec<f64> = values
            .into_iter()
            .map(|v| transform.apply(v))
            .filter(|v| v.is_finite())
            .collect();

        let (min, max) = samples.iter().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

        let mut histogram = Self {
            min,
            max,
            bin_width: (max - min) / num_bins as f64,
            counts: vec![0; num_bins],
            transform,
        };
        for v in samples {
            let bin = histogram.bin_of_transformed(v);
            histogram.counts[bin] += 1;
        }
        Some(histogram)
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    fn bin_of_transformed(&self, t: f64) -> usize {
        if self.bin_width <= 0.0 {
            return 0;
        }
        let raw = ((t - self.min) / self.bin_width).round();
        raw.clamp(0.0, (self.counts.len() - 1) as f64) as usize
    }

    /// Bin index for an untransformed sample.
    pub fn bin_index(&self, v: f64) -> usize {
        self.bin_of_transformed(self.transform.apply(v))
    }

    /// Largest bin count, used to scale the legend's bar heights.
    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Transformed value at the left edge of `bin`.
    pub fn value_at(&self, bin: usize) -> f64 {
        self.min + bin as f64 * self.bin_width
    }
}

/// Threshold for the density image: the `percentile` element of the sorted
/// nonzero values. Falls back to 1 when every value is zero.
pub fn percentile_threshold<I>(values: I, percentile: f64) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let mut nonzero: Vec<u32> = values.into_iter().filter(|&v| v > 0).collect();
    if nonzero.is_empty() {
        return 1;
    }
    nonzero.sort_unstable();

    let last = nonzero.len() - 1;
    let index = ((last as f64) * percentile.clamp(0.0, 1.0)).round() as usize;
    nonzero[index.min(last)]
}

/// Recalibration of one end of a scale's domain, issued from a legend click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DomainOverride {
    Low(f64),
    High(f64),
}

/// Maps a continuous domain onto `buckets` equal slices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizeScale {
    pub domain: (f64, f64),
    pub buckets: usize,
}

impl QuantizeScale {
    pub fn new(d0: f64, d1: f64, buckets: usize) -> Self {
        Self {
            domain: (d0, d1),
            buckets: buckets.max(1),
        }
    }

    /// Scale spanning the histogram's full transformed range.
    pub fn from_histogram(histogram: &Histogram, buckets: usize) -> Self {
        Self::new(histogram.min, histogram.max, buckets)
    }

    pub fn bucket(&self, v: f64) -> usize {
        let (d0, d1) = self.domain;
        let span = d1 - d0;
        if !(span > 0.0) || v.is_nan() {
            return 0;
        }
        let raw = (self.buckets as f64 * (v - d0) / span).floor();
        raw.clamp(0.0, (self.buckets - 1) as f64) as usize
    }

    pub fn with_override(self, change: DomainOverride) -> Self {
        let (d0, d1) = self.domain;
        let domain = match change {
            DomainOverride::Low(v) => (v, d1),
            DomainOverride::High(v) => (d0, v),
        };
        Self { domain, ..self }
    }
}
