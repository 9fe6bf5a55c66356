//! Visible-window state shared by the density and Voronoi views
//!
//! `ViewState` owns the data extent of the current chromosome pair and the
//! window inside it. Every change of the window goes through
//! [`ViewState::update_view`], which returns a [`ViewChange`] the renderers
//! repaint from.
//!
//! Two pixel frames are used:
//! - *screen*: the whole canvas, y growing downwards, axis area inset by the
//!   layout margins;
//! - *axis*: the inset plot area only, also y-down, where `(0, 0)` is the top
//!   left corner of the plot.

use serde::{Deserialize, Serialize};

use crate::types::{Chromosome, Interaction, Point};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Full extent of a chromosome pair.
    pub fn of_pair(source: &Chromosome, target: &Chromosome) -> Self {
        Self::new(0.0, source.length as f64, 0.0, target.length as f64)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Swap reversed ends so `min <= max` on both axes.
    pub fn ordered(self) -> Self {
        Self::new(
            self.min_x.min(self.max_x),
            self.min_x.max(self.max_x),
            self.min_y.min(self.max_y),
            self.min_y.max(self.max_y),
        )
    }

    /// Clamp into `outer`, keeping the ordering invariant.
    pub fn clamped_to(self, outer: &Bounds) -> Self {
        let b = self.ordered();
        let clamp = |v: f64, lo: f64, hi: f64| if v.is_nan() { lo } else { v.clamp(lo, hi) };
        Self::new(
            clamp(b.min_x, outer.min_x, outer.max_x),
            clamp(b.max_x, outer.min_x, outer.max_x),
            clamp(b.min_y, outer.min_y, outer.max_y),
            clamp(b.max_y, outer.min_y, outer.max_y),
        )
        .ordered()
    }
}

/// Canvas size and the margins reserved for tick labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLayout {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl AxisLayout {
    pub fn new(canvas_width: f64, canvas_height: f64, margin: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
            offset_x: margin,
            offset_y: margin,
        }
    }

    pub fn axis_width(&self) -> f64 {
        (self.canvas_width - 2.0 * self.offset_x).max(0.0)
    }

    pub fn axis_height(&self) -> f64 {
        (self.canvas_height - 2.0 * self.offset_y).max(0.0)
    }
}

impl Default for AxisLayout {
    fn default() -> Self {
        Self::new(800.0, 800.0, 50.0)
    }
}

/// Emitted by every view transition; renderers repaint from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewChange {
    pub view: Bounds,
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Pixel position along the axis, in screen coordinates.
    pub position: f64,
    pub value: f64,
    pub label: String,
    pub anchor: TickAnchor,
}

/// Interaction marker in axis pixel coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMarker {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Data-space rectangle chosen by dragging over a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSelected {
    pub min: Point,
    pub max: Point,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    data: Bounds,
    view: Bounds,
    source: Chromosome,
    target: Chromosome,
    interactions: Vec<Interaction>,
    pub layout: AxisLayout,
    pub tick_count: usize,
    pub tick_decimals: usize,
    revision: u64,
}

impl ViewState {
    pub fn new(source: Chromosome, target: Chromosome, layout: AxisLayout) -> Self {
        let data = Bounds::of_pair(&source, &target);
        Self {
            data,
            view: data,
            source,
            target,
            interactions: Vec::new(),
            layout,
            tick_count: 5,
            tick_decimals: 0,
            revision: 0,
        }
    }

    pub fn data_bounds(&self) -> Bounds {
        self.data
    }

    pub fn view_bounds(&self) -> Bounds {
        self.view
    }

    pub fn source(&self) -> &Chromosome {
        &self.source
    }

    pub fn target(&self) -> &Chromosome {
        &self.target
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Source and target are the same chromosome.
    pub fn is_intrachromosome(&self) -> bool {
        self.source == self.target
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn set_interactions(&mut self, interactions: Vec<Interaction>) {
        self.interactions = interactions;
    }

    /// Switch chromosome pair; data and view reset to the full new extent.
    pub fn set_chrom_pair(&mut self, source: Chromosome, target: Chromosome) -> ViewChange {
        self.data = Bounds::of_pair(&source, &target);
        self.source = source;
        self.target = target;
        self.update_view(self.data.min_x, self.data.max_x, self.data.min_y, self.data.max_y)
    }

    /// The one path by which the visible window changes.
    ///
    /// Reversed ends are swapped and the window is clamped into the data
    /// extent rather than rejected.
    pub fn update_view(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> ViewChange {
        self.view = Bounds::new(min_x, max_x, min_y, max_y).clamped_to(&self.data);
        self.revision += 1;
        log::debug!(
            "View {}x{} -> [{:.0}, {:.0}] x [{:.0}, {:.0}] (rev {})",
            self.source.name,
            self.target.name,
            self.view.min_x,
            self.view.max_x,
            self.view.min_y,
            self.view.max_y,
            self.revision
        );
        ViewChange {
            view: self.view,
            revision: self.revision,
        }
    }

    /// Double-click: back to the full data extent.
    pub fn reset_view(&mut self) -> ViewChange {
        let d = self.data;
        self.update_view(d.min_x, d.max_x, d.min_y, d.max_y)
    }

    /// Normalised position inside the plot area, y up. Values outside
    /// `[0, 1]` lie in the margins.
    pub fn screen_to_axis(&self, screen: Point) -> Point {
        let l = &self.layout;
        let x = (screen.x - l.offset_x) / l.axis_width();
        let y = ((l.canvas_height - l.offset_y) - screen.y) / l.axis_height();
        Point::new(x, y)
    }

    pub fn axis_to_data(&self, axis: Point) -> Point {
        let v = &self.view;
        Point::new(v.min_x + axis.x * v.width(), v.min_y + axis.y * v.height())
    }

    /// Data coordinate under the pointer, if it is over the plot area.
    pub fn data_at(&self, screen: Point) -> Option<Point> {
        let axis = self.screen_to_axis(screen);
        let inside = (0.0..=1.0).contains(&axis.x) && (0.0..=1.0).contains(&axis.y);
        inside.then(|| self.axis_to_data(axis))
    }

    /// Data coordinate to axis pixels (top-left origin).
    pub fn data_to_axis_pixels(&self, data: Point) -> Point {
        let v = &self.view;
        let w = self.layout.axis_width();
        let h = self.layout.axis_height();
        Point::new(
            (data.x - v.min_x) / v.width() * w,
            h - (data.y - v.min_y) / v.height() * h,
        )
    }

    fn tick_fractions(&self) -> impl Iterator<Item = (usize, f64)> {
        let n = self.tick_count.max(2);
        (0..n).map(move |i| (i, i as f64 / (n - 1) as f64))
    }

    fn anchor_for(&self, i: usize) -> TickAnchor {
        let last = self.tick_count.max(2) - 1;
        match i {
            0 => TickAnchor::Start,
            i if i == last => TickAnchor::End,
            _ => TickAnchor::Middle,
        }
    }

    fn label(&self, value: f64) -> String {
        format!("{:.*}", self.tick_decimals, value)
    }

    /// Evenly spaced ticks along the bottom axis.
    pub fn x_ticks(&self) -> Vec<Tick> {
        let l = self.layout;
        self.tick_fractions()
            .map(|(i, f)| {
                let value = self.view.min_x + f * self.view.width();
                Tick {
                    position: l.offset_x + f * l.axis_width(),
                    value,
                    label: self.label(value),
                    anchor: self.anchor_for(i),
                }
            })
            .collect()
    }

    /// Evenly spaced ticks along the left axis; `position` is a screen y.
    pub fn y_ticks(&self) -> Vec<Tick> {
        let l = self.layout;
        self.tick_fractions()
            .map(|(i, f)| {
                let value = self.view.min_y + f * self.view.height();
                Tick {
                    position: l.canvas_height - l.offset_y - f * l.axis_height(),
                    value,
                    label: self.label(value),
                    anchor: self.anchor_for(i),
                }
            })
            .collect()
    }

    /// Markers for the interactions of the current pair that fall in view.
    ///
    /// Each marker spans the interaction's ranges but is never smaller than
    /// `min_half_size` pixels either side of its centre.
    pub fn contact_markers(&self, min_half_size: f64) -> Vec<ContactMarker> {
        let v = self.view;
        let x_scale = self.layout.axis_width() / v.width();
        let y_scale = self.layout.axis_height() / v.height();
        if !x_scale.is_finite() || !y_scale.is_finite() {
            return Vec::new();
        }

        self.interactions
            .iter()
            .filter_map(|i| i.oriented(&self.source, &self.target))
            .filter_map(|((xs, xe), (ys, ye))| {
                let centre = Point::new((xs + xe) / 2.0, (ys + ye) / 2.0);
                if !v.contains(centre) {
                    return None;
                }
                let half_w = ((xe - xs).abs() / 2.0 * x_scale).max(min_half_size);
                let half_h = ((ye - ys).abs() / 2.0 * y_scale).max(min_half_size);
                let c = self.data_to_axis_pixels(centre);
                Some(ContactMarker {
                    x: c.x - half_w,
                    y: c.y - half_h,
                    width: half_w * 2.0,
                    height: half_h * 2.0,
                })
            })
            .collect()
    }
}

/// Press/release tracking for drag-to-zoom.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragSelection {
    start: Option<Point>,
}

impl DragSelection {
    pub fn press(&mut self, screen: Point) {
        self.start = Some(screen);
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    /// Screen rectangle to outline while dragging.
    pub fn rubber_band(&self, current: Point) -> Option<(Point, Point)> {
        self.start.map(|s| (s, current))
    }

    /// Finish the drag. A click without movement selects nothing.
    pub fn release(&mut self, screen: Point, view: &ViewState) -> Option<RegionSelected> {
        let start = self.start.take()?;
        let a = view.screen_to_axis(start);
        let b = view.screen_to_axis(screen);
        if a == b {
            return None;
        }

        let min = view.axis_to_data(Point::new(a.x.min(b.x), a.y.min(b.y)));
        let max = view.axis_to_data(Point::new(a.x.max(b.x), a.y.max(b.y)));
        Some(RegionSelected { min, max })
    }
}
