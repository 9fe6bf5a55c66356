//! Colour legend: a histogram of the coloured values above a colour strip,
//! with markers at the current quantize domain.
//!
//! Bar heights are log-scaled so sparse tails stay visible. Clicking a bin
//! picks `Histogram::value_at(bin)` as a new domain end.

use hicvis_core::{Histogram, Point};

use crate::canvas::DrawContext;
use crate::colour::{Colour, ColourScale};

const STRIP_HEIGHT: f64 = 10.0;
const MARKER_HALF_WIDTH: f64 = 5.0;

/// Canvas rectangle the legend occupies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LegendRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    fn bin_width(&self, histogram: &Histogram) -> f64 {
        self.width / histogram.num_bins().max(1) as f64
    }

    /// Histogram bin under canvas x, if inside the legend.
    pub fn bin_at(&self, histogram: &Histogram, x: f64) -> Option<usize> {
        let rel = x - self.x;
        if !(0.0..self.width).contains(&rel) {
            return None;
        }
        Some(((rel / self.bin_width(histogram)) as usize).min(histogram.num_bins().saturating_sub(1)))
    }

    /// Canvas x of a value in the histogram's (transformed) domain.
    fn x_of(&self, histogram: &Histogram, value: f64) -> f64 {
        if histogram.bin_width > 0.0 {
            self.x + (value - histogram.min) / histogram.bin_width * self.bin_width(histogram)
        } else {
            self.x
        }
    }
}

/// Height of a bar, relative to `available`, on a log scale.
pub fn bar_height(count: u32, max_count: u32, available: f64) -> f64 {
    match (count, max_count) {
        (0, _) => 0.0,
        (_, 0 | 1) => available,
        (c, m) => ((c as f64).ln() / (m as f64).ln() * available).clamp(0.0, available),
    }
}

pub fn draw_legend(ctx: &mut dyn DrawContext, histogram: &Histogram, scale: &ColourScale, rect: &LegendRect) {
    let bars_bottom = rect.y + rect.height - STRIP_HEIGHT;
    let available = (rect.height - STRIP_HEIGHT).max(0.0);
    let bin_px = rect.bin_width(histogram);
    let max_count = histogram.max_count();

    ctx.set_alpha(1.0);
    ctx.set_fill(Colour::BLACK);
    for (i, &count) in histogram.counts.iter().enumerate() {
        let h = bar_height(count, max_count, available);
        if h > 0.0 {
            ctx.fill_rect(rect.x + i as f64 * bin_px, bars_bottom - h, bin_px, h);
        }
    }

    for i in 0..histogram.num_bins() {
        ctx.set_fill(scale.colour(histogram.value_at(i)));
        ctx.fill_rect(rect.x + i as f64 * bin_px, bars_bottom, bin_px, STRIP_HEIGHT);
    }

    ctx.set_fill(Colour::BLACK);
    let (d0, d1) = scale.quantize.domain;
    for value in [d0, d1] {
        let x = rect.x_of(histogram, value);
        ctx.fill_polygon(&[
            Point::new(x, bars_bottom),
            Point::new(x - MARKER_HALF_WIDTH, rect.y + rect.height),
            Point::new(x + MARKER_HALF_WIDTH, rect.y + rect.height),
        ]);
    }
}
