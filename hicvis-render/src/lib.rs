/*!
# HiCVis Rendering

Draws the density and Voronoi views of a contact map through a small
[`DrawContext`](canvas::DrawContext) trait, with two implementations: an
in-memory RGBA canvas and an SVG builder.

## Layers

1. **Density**: raw bin counts as a nearest-neighbour scaled bitmap
2. **Voronoi**: one polygon per contact cell, coloured by log area
3. **Overlays**: interaction markers, axes, and the colour legend

The same frame code backs the interactive canvas and SVG/PNG export.
*/

pub mod canvas;
pub mod colour;
pub mod density;
pub mod export;
pub mod frame;
pub mod legend;
pub mod voronoi;

pub use canvas::{polygon_path, Affine, BezPath, DrawContext, MapPoint, PixelCanvas, SvgCanvas, TextAnchor, TextStyle};
pub use colour::{Colour, ColourScale, Gradient};
pub use export::{ExportConfig, Exporter};
pub use frame::{render_frame, Layer, PlotGeometry, RenderConfig, Scene};
pub use legend::{draw_legend, LegendRect};
pub use voronoi::{to_view_polygons, ViewPolygon, Viewport, VoronoiStyle};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
