//! Viewer settings
//!
//! Every field has a default so a partial `[viewer]` table is enough.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{HicvisError, HicvisResult};
use crate::request::BinSizing;
use crate::view::AxisLayout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Quiet period before coalesced view requests are sent, in ms
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_smoothing_iterations")]
    pub smoothing_iterations: u32,

    /// Buffer size the server draws cells at
    #[serde(default = "default_draw_size")]
    pub draw_width: u32,
    #[serde(default = "default_draw_size")]
    pub draw_height: u32,

    /// Size of each view canvas, margins included
    #[serde(default = "default_canvas_size")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_size")]
    pub canvas_height: u32,

    #[serde(default = "default_desired_bins")]
    pub desired_bins: u32,
    #[serde(default = "default_min_bin_size")]
    pub min_bin_size: f64,
    #[serde(default = "default_max_bin_count")]
    pub max_bin_count: u32,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default = "default_colour_count")]
    pub colour_count: usize,

    /// Percentile of nonzero bins used as the density saturation point
    #[serde(default = "default_percentile")]
    pub percentile: f64,

    /// Cells with a smaller area are not drawn
    #[serde(default = "default_noise_floor")]
    pub noise_floor: f64,

    #[serde(default = "default_axis_margin")]
    pub axis_margin: f64,
    #[serde(default = "default_tick_count")]
    pub tick_count: usize,
    #[serde(default)]
    pub tick_decimals: usize,

    #[serde(default)]
    pub contacts: ContactStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactStyle {
    /// Minimum half-size of a marker in pixels
    #[serde(default = "default_contact_size")]
    pub size: f64,
    #[serde(default = "default_contact_opacity")]
    pub opacity: f64,
    #[serde(default = "default_contact_colour")]
    pub edge_colour: String,
    #[serde(default = "default_edge_width")]
    pub edge_width: f64,
    #[serde(default = "default_true")]
    pub fill: bool,
    #[serde(default = "default_contact_colour")]
    pub fill_colour: String,
}

fn default_debounce_ms() -> u64 {
    50
}
fn default_smoothing_iterations() -> u32 {
    1
}
fn default_draw_size() -> u32 {
    1600
}
fn default_canvas_size() -> u32 {
    800
}
fn default_desired_bins() -> u32 {
    200
}
fn default_min_bin_size() -> f64 {
    1.0
}
fn default_max_bin_count() -> u32 {
    1000
}
fn default_histogram_bins() -> usize {
    700
}
fn default_colour_count() -> usize {
    100
}
fn default_percentile() -> f64 {
    0.97
}
fn default_noise_floor() -> f64 {
    14.0
}
fn default_axis_margin() -> f64 {
    50.0
}
fn default_tick_count() -> usize {
    5
}
fn default_contact_size() -> f64 {
    10.0
}
fn default_contact_opacity() -> f64 {
    0.7
}
fn default_contact_colour() -> String {
    "#286DC9".to_string()
}
fn default_edge_width() -> f64 {
    2.0
}
fn default_true() -> bool {
    true
}

impl Default for ContactStyle {
    fn default() -> Self {
        Self {
            size: default_contact_size(),
            opacity: default_contact_opacity(),
            edge_colour: default_contact_colour(),
            edge_width: default_edge_width(),
            fill: true,
            fill_colour: default_contact_colour(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            smoothing_iterations: default_smoothing_iterations(),
            draw_width: default_draw_size(),
            draw_height: default_draw_size(),
            canvas_width: default_canvas_size(),
            canvas_height: default_canvas_size(),
            desired_bins: default_desired_bins(),
            min_bin_size: default_min_bin_size(),
            max_bin_count: default_max_bin_count(),
            histogram_bins: default_histogram_bins(),
            colour_count: default_colour_count(),
            percentile: default_percentile(),
            noise_floor: default_noise_floor(),
            axis_margin: default_axis_margin(),
            tick_count: default_tick_count(),
            tick_decimals: 0,
            contacts: ContactStyle::default(),
        }
    }
}

impl ViewerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn bin_sizing(&self) -> BinSizing {
        BinSizing {
            desired_bins: self.desired_bins,
            min_bin_size: self.min_bin_size,
            max_bin_count: self.max_bin_count,
        }
    }

    pub fn layout(&self) -> AxisLayout {
        AxisLayout::new(self.canvas_width as f64, self.canvas_height as f64, self.axis_margin)
    }

    pub fn validate(&self) -> HicvisResult<()> {
        if !(0.0..=1.0).contains(&self.percentile) {
            return Err(HicvisError::config(format!(
                "percentile must be within [0, 1], got {}",
                self.percentile
            )));
        }
        if self.histogram_bins == 0 || self.colour_count == 0 {
            return Err(HicvisError::config("histogram_bins and colour_count must be positive"));
        }
        if self.draw_width == 0 || self.draw_height == 0 {
            return Err(HicvisError::config("draw buffer must not be empty"));
        }
        if 2.0 * self.axis_margin >= self.canvas_width.min(self.canvas_height) as f64 {
            return Err(HicvisError::config(format!(
                "axis margin {} leaves no room in a {}x{} canvas",
                self.axis_margin, self.canvas_width, self.canvas_height
            )));
        }
        if self.tick_count < 2 {
            return Err(HicvisError::config("tick_count must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.contacts.opacity) {
            return Err(HicvisError::config("contact opacity must be within [0, 1]"));
        }
        Ok(())
    }
}
