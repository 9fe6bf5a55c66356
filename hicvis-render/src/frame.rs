//! Full view frame: background, data layer, contacts and axes
//!
//! Layers are drawn in *plot space*: origin at the bottom left of the axis
//! area, y up, one unit per axis pixel. [`PlotGeometry`] carries the affine
//! map from plot space to the canvas; the triangle view folds the square
//! plot about its diagonal so the self-comparison reads as a right triangle.

use hicvis_core::view::{TickAnchor, ViewState};
use hicvis_core::{AxisLayout, ContactStyle, Dataset, Point, QuantizeScale, ScaleTarget, Session, ViewerConfig};
use serde::{Deserialize, Serialize};

use crate::canvas::{Affine, DrawContext, MapPoint, TextAnchor, TextStyle};
use crate::colour::{Colour, ColourScale};
use crate::density;
use crate::voronoi::{self, Viewport, VoronoiStyle};

const TICK_LENGTH: f64 = 5.0;
const LABEL_GAP: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Density,
    #[default]
    Voronoi,
}

/// Display settings shared by the interactive canvas and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub layer: Layer,
    #[serde(default)]
    pub voronoi: VoronoiStyle,
    /// Colour the density layer with its quantize scale instead of grayscale
    #[serde(default)]
    pub density_colour: bool,
    #[serde(default = "default_true")]
    pub show_axes: bool,
    #[serde(default = "default_true")]
    pub show_contacts: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            layer: Layer::default(),
            voronoi: VoronoiStyle::default(),
            density_colour: false,
            show_axes: true,
            show_contacts: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotGeometry {
    pub width: f64,
    pub height: f64,
    pub transform: Affine,
    pub triangle: bool,
}

impl PlotGeometry {
    pub fn new(layout: &AxisLayout, triangle: bool) -> Self {
        let (w, h) = (layout.axis_width(), layout.axis_height());
        let normal = Affine::new([1.0, 0.0, 0.0, -1.0, layout.offset_x, layout.offset_y + h]);
        if triangle {
            // Rotate by -45 degrees and scale by 1/sqrt(2): the diagonal
            // becomes the bottom edge, the upper-left corner the apex.
            let fold = Affine::new([0.5, -0.5, 0.5, 0.5, 0.0, 0.0]);
            Self {
                width: w,
                height: w,
                transform: normal * fold,
                triangle,
            }
        } else {
            Self {
                width: w,
                height: h,
                transform: normal,
                triangle,
            }
        }
    }

    /// Outline of the visible plot region, in plot space.
    pub fn outline(&self) -> Vec<Point> {
        if self.triangle {
            vec![
                Point::new(0.0, 0.0),
                Point::new(self.width, self.height),
                Point::new(0.0, self.height),
            ]
        } else {
            vec![
                Point::new(0.0, 0.0),
                Point::new(self.width, 0.0),
                Point::new(self.width, self.height),
                Point::new(0.0, self.height),
            ]
        }
    }

    fn to_canvas(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| self.transform.map_point(p)).collect()
    }
}

/// Everything a frame is drawn from.
pub struct Scene<'a> {
    pub view: &'a ViewState,
    pub dataset: Option<&'a Dataset>,
    pub voronoi_scale: Option<QuantizeScale>,
    pub density_scale: Option<QuantizeScale>,
    pub triangle: bool,
    pub config: &'a ViewerConfig,
}

impl<'a> Scene<'a> {
    pub fn from_session(session: &'a Session) -> Self {
        Self {
            view: session.view(),
            dataset: session.dataset(),
            voronoi_scale: session.scale(ScaleTarget::Voronoi),
            density_scale: session.scale(ScaleTarget::Density),
            triangle: session.triangle_view(),
            config: session.config(),
        }
    }
}

/// Draw one complete view onto `ctx`.
pub fn render_frame(ctx: &mut dyn DrawContext, scene: &Scene, render: &RenderConfig, text: &TextStyle) {
    let plot = PlotGeometry::new(&scene.view.layout, scene.triangle);

    let l = scene.view.layout;
    ctx.set_alpha(1.0);
    ctx.set_fill(Colour::LIGHT_GRAY);
    ctx.fill_rect(0.0, 0.0, l.canvas_width, l.canvas_height);

    match (render.layer, scene.dataset) {
        (Layer::Density, Some(dataset)) => paint_density(ctx, scene, dataset, render, &plot),
        (Layer::Voronoi, Some(dataset)) => paint_voronoi(ctx, scene, dataset, render, &plot),
        (_, None) => log::debug!("No dataset loaded, drawing an empty frame"),
    }

    if render.show_contacts {
        draw_contacts(ctx, scene.view, &plot, &scene.config.contacts);
    }
    if render.show_axes {
        draw_axes(ctx, scene.view, &plot, text);
    }
}

fn paint_density(ctx: &mut dyn DrawContext, scene: &Scene, dataset: &Dataset, render: &RenderConfig, plot: &PlotGeometry) {
    let scale = match (render.density_colour, scene.density_scale) {
        (true, Some(q)) => Some(ColourScale::new(q)),
        _ => None,
    };
    let mut bitmap = density::render_bitmap(&dataset.raster, dataset.density_threshold, scale.as_ref());
    if plot.triangle {
        density::mask_lower_triangle(&mut bitmap);
    }
    density::paint(ctx, &bitmap, plot);
}

fn paint_voronoi(ctx: &mut dyn DrawContext, scene: &Scene, dataset: &Dataset, render: &RenderConfig, plot: &PlotGeometry) {
    let scale = scene.voronoi_scale.map(ColourScale::new);

    ctx.set_fill(voronoi::background(scale.as_ref(), &render.voronoi));
    ctx.fill_polygon(&plot.to_canvas(&plot.outline()));

    let viewport = Viewport::new(scene.view.view_bounds(), plot.width, plot.height);
    let polygons = voronoi::to_view_polygons(
        &dataset.voronoi,
        &viewport,
        plot.triangle,
        scene.view.is_intrachromosome(),
        scene.config.noise_floor,
    );
    voronoi::paint(ctx, &polygons, scale.as_ref(), &render.voronoi, &plot.transform);
}

/// Draw interaction markers over the plot.
pub fn draw_contacts(ctx: &mut dyn DrawContext, view: &ViewState, plot: &PlotGeometry, style: &ContactStyle) {
    let markers = if plot.triangle {
        // Markers are laid out on the unfolded square plot.
        let mut square = view.clone();
        let l = view.layout;
        square.layout = AxisLayout {
            canvas_width: plot.width + 2.0 * l.offset_x,
            canvas_height: plot.height + 2.0 * l.offset_y,
            ..l
        };
        square.contact_markers(style.size)
    } else {
        view.contact_markers(style.size)
    };
    if markers.is_empty() {
        return;
    }

    let edge = parse_colour(&style.edge_colour, "edge");
    let fill = parse_colour(&style.fill_colour, "fill");
    ctx.set_alpha(style.opacity);
    ctx.set_stroke(edge, style.edge_width);
    ctx.set_fill(fill);

    for m in markers {
        // Axis pixels are y-down; plot space is y-up.
        let top = plot.height - m.y;
        let bottom = top - m.height;
        if plot.triangle && (top + bottom) / 2.0 < m.x + m.width / 2.0 {
            continue;
        }
        let corners = plot.to_canvas(&[
            Point::new(m.x, bottom),
            Point::new(m.x + m.width, bottom),
            Point::new(m.x + m.width, top),
            Point::new(m.x, top),
        ]);
        if style.fill {
            ctx.fill_polygon(&corners);
        }
        ctx.stroke_polygon(&corners);
    }
    ctx.set_alpha(1.0);
}

fn parse_colour(hex: &str, what: &str) -> Colour {
    Colour::parse_hex(hex).unwrap_or_else(|| {
        log::warn!("Invalid contact {} colour '{}', using black", what, hex);
        Colour::BLACK
    })
}

fn text_anchor(anchor: TickAnchor) -> TextAnchor {
    match anchor {
        TickAnchor::Start => TextAnchor::Start,
        TickAnchor::Middle => TextAnchor::Middle,
        TickAnchor::End => TextAnchor::End,
    }
}

/// Axis lines, ticks and labels. The triangle view only has an x axis,
/// running along the folded diagonal.
pub fn draw_axes(ctx: &mut dyn DrawContext, view: &ViewState, plot: &PlotGeometry, text: &TextStyle) {
    let l = view.layout;
    let bottom = l.canvas_height - l.offset_y;
    let right = l.offset_x + l.axis_width();

    ctx.set_stroke(Colour::BLACK, 1.0);
    ctx.set_fill(Colour::BLACK);
    ctx.line(Point::new(l.offset_x, bottom), Point::new(right, bottom));

    for tick in view.x_ticks() {
        ctx.line(Point::new(tick.position, bottom), Point::new(tick.position, bottom + TICK_LENGTH));
        let style = TextStyle {
            anchor: text_anchor(tick.anchor),
            ..text.clone()
        };
        ctx.text(
            Point::new(tick.position, bottom + TICK_LENGTH + text.font_size),
            &tick.label,
            &style,
        );
    }
    ctx.text(
        Point::new(l.offset_x + l.axis_width() / 2.0, bottom + TICK_LENGTH + 2.0 * text.font_size + 4.0),
        &view.source().name,
        text,
    );

    if plot.triangle {
        return;
    }

    ctx.line(Point::new(l.offset_x, l.offset_y), Point::new(l.offset_x, bottom));
    let label_style = TextStyle {
        anchor: TextAnchor::End,
        ..text.clone()
    };
    for tick in view.y_ticks() {
        ctx.line(Point::new(l.offset_x - TICK_LENGTH, tick.position), Point::new(l.offset_x, tick.position));
        ctx.text(
            Point::new(l.offset_x - LABEL_GAP, tick.position + text.font_size / 3.0),
            &tick.label,
            &label_style,
        );
    }
    let name_at = Point::new(l.offset_x / 3.0, l.offset_y + l.axis_height() / 2.0);
    ctx.text(
        name_at,
        &view.target().name,
        &TextStyle {
            rotation: -90.0,
            ..text.clone()
        },
    );
}
