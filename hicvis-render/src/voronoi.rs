/*!
# Voronoi Layer

Stored cells are in data (base-pair) coordinates. Before painting they are
filtered, clipped to the view, and rescaled into a `width x height` target
rectangle. For a chromosome against itself the server only sends one half of
the symmetric matrix, so each cell is also mirrored across the diagonal.
*/

use hicvis_core::{Bounds, ClipRegion, Point, VoronoiSet};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::canvas::{Affine, DrawContext, MapPoint};
use crate::colour::{Colour, ColourScale};

/// Display toggles for the Voronoi layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiStyle {
    #[serde(default)]
    pub edges: bool,
    #[serde(default)]
    pub centroids: bool,
    #[serde(default)]
    pub data_points: bool,
    /// Side of the centroid and data point squares, in pixels
    #[serde(default = "default_dot_size")]
    pub dot_size: f64,
}

fn default_dot_size() -> f64 {
    5.0
}

impl Default for VoronoiStyle {
    fn default() -> Self {
        Self {
            edges: false,
            centroids: false,
            data_points: false,
            dot_size: default_dot_size(),
        }
    }
}

/// Target rectangle that view coordinates are rescaled into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub view: Bounds,
    pub offset: Point,
    pub width: f64,
    pub height: f64,
    /// Put the view's minimum y at the top edge instead of the bottom.
    pub flip_y: bool,
}

impl Viewport {
    pub fn new(view: Bounds, width: f64, height: f64) -> Self {
        Self {
            view,
            offset: Point::new(0.0, 0.0),
            width,
            height,
            flip_y: false,
        }
    }

    pub fn bin_size(&self) -> (f64, f64) {
        (self.view.width() / self.width, self.view.height() / self.height)
    }

    /// Data coordinate to target coordinate, without clamping.
    pub fn map(&self, p: Point) -> Point {
        let (bx, by) = self.bin_size();
        let x = (p.x - self.view.min_x) / bx;
        let mut y = (p.y - self.view.min_y) / by;
        if self.flip_y {
            y = self.height - y;
        }
        Point::new(self.offset.x + x, self.offset.y + y)
    }

    fn map_clamped(&self, p: Point) -> Point {
        let q = self.map(p);
        Point::new(
            q.x.clamp(self.offset.x, self.offset.x + self.width),
            q.y.clamp(self.offset.y, self.offset.y + self.height),
        )
    }
}

/// A cell ready to paint, in target coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPolygon {
    pub points: Vec<Point>,
    pub log_area: f64,
    pub centroid: Point,
    pub data_point: Point,
    /// Generated by reflecting a stored cell across the diagonal.
    pub mirrored: bool,
}

/// Convert stored cells into paintable polygons for `viewport`.
///
/// Cells with an area below `noise_floor` are skipped, as are cells whose
/// clipped ring has fewer than three points. With `intrachromosome` set,
/// every stored cell is also reflected across the diagonal, clipped and
/// rescaled on its own.
pub fn to_view_polygons(
    voronoi: &VoronoiSet,
    viewport: &Viewport,
    diagonal: bool,
    intrachromosome: bool,
    noise_floor: f64,
) -> Vec<ViewPolygon> {
    let (bx, by) = viewport.bin_size();
    if !(bx.is_finite() && by.is_finite() && bx > 0.0 && by > 0.0) {
        log::warn!("Degenerate viewport {:?}, no cells drawn", viewport.view);
        return Vec::new();
    }

    let start = Instant::now();
    let region = ClipRegion::for_view(&viewport.view, diagonal);
    let mut out = Vec::with_capacity(voronoi.len() * if intrachromosome { 2 } else { 1 });

    for cell in voronoi.polygons.iter().filter(|p| p.area >= noise_floor) {
        let variants = if intrachromosome {
            vec![(cell.clone(), false), (cell.mirrored(), true)]
        } else {
            vec![(cell.clone(), false)]
        };

        for (variant, mirrored) in variants {
            let clipped = variant.clip(&region);
            if !clipped.is_drawable() {
                continue;
            }
            out.push(ViewPolygon {
                points: clipped.points.iter().map(|&p| viewport.map_clamped(p)).collect(),
                log_area: cell.log_area(),
                centroid: viewport.map(variant.centroid),
                data_point: viewport.map(variant.data_point),
                mirrored,
            });
        }
    }

    log::debug!(
        "Converted {} cells to {} view polygons in {:?}",
        voronoi.len(),
        out.len(),
        start.elapsed()
    );
    out
}

/// Colour used behind the cells; gaps between them show through.
pub fn background(scale: Option<&ColourScale>, style: &VoronoiStyle) -> Colour {
    match scale {
        Some(scale) if !(style.edges || style.centroids) => scale.gradient.at(0.0),
        _ => Colour::BLACK,
    }
}

/// Paint polygons produced by [`to_view_polygons`]. `transform` maps the
/// viewport's target coordinates onto the canvas.
pub fn paint(
    ctx: &mut dyn DrawContext,
    polygons: &[ViewPolygon],
    scale: Option<&ColourScale>,
    style: &VoronoiStyle,
    transform: &Affine,
) {
    let start = Instant::now();
    ctx.set_stroke(Colour::BLACK, 1.0);

    for polygon in polygons {
        let fill = scale.map(|s| s.colour(polygon.log_area)).unwrap_or(Colour::GRAY);
        let points: Vec<Point> = polygon.points.iter().map(|&p| transform.map_point(p)).collect();
        ctx.set_fill(fill);
        ctx.fill_polygon(&points);
        if style.edges {
            ctx.stroke_polygon(&points);
        }
    }

    ctx.set_fill(Colour::BLACK);
    let half = style.dot_size / 2.0;
    let markers = polygons.iter().flat_map(|p| {
        let centroid = style.centroids.then_some(p.centroid);
        let data_point = style.data_points.then_some(p.data_point);
        centroid.into_iter().chain(data_point)
    });
    for marker in markers {
        let c = transform.map_point(marker);
        ctx.fill_rect(c.x - half, c.y - half, style.dot_size, style.dot_size);
    }

    log::debug!("Painted {} polygons in {:?}", polygons.len(), start.elapsed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::SvgCanvas;
    use hicvis_core::{Polygon, QuantizeScale};

    fn cell(points: &[(f64, f64)], area: f64) -> Polygon {
        Polygon {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            area,
            clipped: false,
            centroid: Point::new(points[0].0, points[0].1),
            data_point: Point::new(points[0].0, points[0].1),
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(Bounds::new(0.0, 100.0, 0.0, 100.0), 200.0, 200.0)
    }

    #[test]
    fn test_rescale_and_clamp() {
        let set = VoronoiSet::new(vec![cell(&[(10.0, 10.0), (150.0, 10.0), (10.0, 50.0)], 100.0)]);
        let polys = to_view_polygons(&set, &viewport(), false, false, 14.0);
        assert_eq!(polys.len(), 1);
        assert!(polys[0].points.contains(&Point::new(20.0, 20.0)));
        assert!(polys[0].points.iter().all(|p| p.x <= 200.0 && p.y <= 200.0));
        assert_eq!(polys[0].log_area, 100f64.ln());
    }

    #[test]
    fn test_noise_floor_and_degenerate_cells_dropped() {
        let set = VoronoiSet::new(vec![
            cell(&[(10.0, 10.0), (20.0, 10.0), (10.0, 20.0)], 13.9),
            cell(&[(500.0, 500.0), (600.0, 500.0), (500.0, 600.0)], 100.0),
        ]);
        assert!(to_view_polygons(&set, &viewport(), false, false, 14.0).is_empty());
    }

    #[test]
    fn test_intrachromosome_mirror_swaps_points() {
        let set = VoronoiSet::new(vec![cell(&[(10.0, 30.0), (40.0, 30.0), (40.0, 60.0)], 50.0)]);
        let polys = to_view_polygons(&set, &viewport(), false, true, 14.0);
        assert_eq!(polys.len(), 2);
        let (original, mirror) = (&polys[0], &polys[1]);
        assert!(!original.mirrored && mirror.mirrored);
        for p in &original.points {
            assert!(mirror.points.contains(&p.swapped()), "missing mirror of {:?}", p);
        }
        assert_eq!(mirror.centroid, original.centroid.swapped());
    }

    #[test]
    fn test_diagonal_region_keeps_upper_half_only() {
        let below = cell(&[(60.0, 10.0), (90.0, 10.0), (90.0, 40.0)], 50.0);
        let set = VoronoiSet::new(vec![below]);
        let polys = to_view_polygons(&set, &viewport(), true, false, 14.0);
        assert!(polys.is_empty());

        let polys = to_view_polygons(&set, &viewport(), true, true, 14.0);
        assert_eq!(polys.len(), 1);
        assert!(polys[0].mirrored);
    }

    #[test]
    fn test_flip_y() {
        let mut vp = viewport();
        vp.flip_y = true;
        assert_eq!(vp.map(Point::new(0.0, 0.0)), Point::new(0.0, 200.0));
        assert_eq!(vp.map(Point::new(100.0, 100.0)), Point::new(200.0, 0.0));
    }

    #[test]
    fn test_paint_draws_markers_when_enabled() {
        let set = VoronoiSet::new(vec![cell(&[(10.0, 10.0), (50.0, 10.0), (10.0, 50.0)], 100.0)]);
        let polys = to_view_polygons(&set, &viewport(), false, false, 14.0);
        let scale = ColourScale::new(QuantizeScale::new(0.0, 10.0, 100));

        let mut plain = SvgCanvas::new(200, 200);
        paint(&mut plain, &polys, Some(&scale), &VoronoiStyle::default(), &Affine::IDENTITY);
        assert_eq!(plain.element_count(), 1);

        let style = VoronoiStyle {
            edges: true,
            centroids: true,
            data_points: true,
            ..Default::default()
        };
        let mut full = SvgCanvas::new(200, 200);
        paint(&mut full, &polys, Some(&scale), &style, &Affine::IDENTITY);
        assert_eq!(full.element_count(), 4);
        assert_eq!(background(Some(&scale), &style), Colour::BLACK);
        assert_eq!(background(Some(&scale), &VoronoiStyle::default()), Colour::SADDLE_BROWN);
    }
}
