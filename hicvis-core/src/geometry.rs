//! Convex polygon clipping (Sutherland–Hodgman)
//!
//! Clip regions are small convex rings: the visible rectangle, or the upper
//! triangle of it when a chromosome is compared with itself.

use crate::types::{Point, Polygon};
use crate::view::Bounds;

/// Denominators below this are treated as parallel edges.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Convex clip boundary, wound counter-clockwise in data space.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRegion {
    points: Vec<Point>,
}

impl ClipRegion {
    pub fn rectangle(bounds: &Bounds) -> Self {
        Self {
            points: vec![
                Point::new(bounds.min_x, bounds.min_y),
                Point::new(bounds.max_x, bounds.min_y),
                Point::new(bounds.max_x, bounds.max_y),
                Point::new(bounds.min_x, bounds.max_y),
            ],
        }
    }

    /// Half of the view above the diagonal.
    pub fn diagonal(bounds: &Bounds) -> Self {
        Self {
            points: vec![
                Point::new(bounds.min_x, bounds.min_y),
                Point::new(bounds.max_x, bounds.max_y),
                Point::new(bounds.min_x, bounds.max_y),
            ],
        }
    }

    pub fn for_view(bounds: &Bounds, diagonal: bool) -> Self {
        if diagonal {
            Self::diagonal(bounds)
        } else {
            Self::rectangle(bounds)
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |j| (self.points[j], self.points[(j + 1) % n]))
    }
}

/// Whether `p` lies strictly on the interior side of the edge `p1 -> p2`.
pub fn inside(p: Point, p1: Point, p2: Point) -> bool {
    (p2.y - p1.y) * p.x + (p1.x - p2.x) * p.y + (p2.x * p1.y - p1.x * p2.y) < 0.0
}

/// Intersection of the infinite lines through `cp1 -> cp2` and `s -> e`.
///
/// Returns `None` for parallel (or numerically parallel) lines.
pub fn intersection(cp1: Point, cp2: Point, s: Point, e: Point) -> Option<Point> {
    let dc = Point::new(cp1.x - cp2.x, cp1.y - cp2.y);
    let dp = Point::new(s.x - e.x, s.y - e.y);

    let n1 = cp1.x * cp2.y - cp1.y * cp2.x;
    let n2 = s.x * e.y - s.y * e.x;

    let denom = dc.x * dp.y - dc.y * dp.x;
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let p = Point::new((n1 * dp.x - n2 * dc.x) / denom, (n1 * dp.y - n2 * dc.y) / denom);
    p.is_finite().then_some(p)
}

/// Clip a ring against a convex region, producing a new ring.
///
/// A parallel-edge intersection contributes no point. The result is empty
/// if any produced coordinate is non-finite; callers must also discard
/// results with fewer than three points.
pub fn clip_ring(subject: &[Point], region: &ClipRegion) -> Vec<Point> {
    let mut output: Vec<Point> = subject.to_vec();
    let mut input: Vec<Point> = Vec::with_capacity(subject.len() + 4);

    for (cp1, cp2) in region.edges() {
        if output.is_empty() {
            break;
        }
        std::mem::swap(&mut input, &mut output);
        output.clear();

        let n = input.len();
        for i in 0..n {
            let s = input[i];
            let e = input[(i + 1) % n];

            match (inside(s, cp1, cp2), inside(e, cp1, cp2)) {
                (true, true) => output.push(e),
                (false, true) => {
                    output.extend(intersection(cp1, cp2, s, e));
                    output.push(e);
                }
                (true, false) => output.extend(intersection(cp1, cp2, s, e)),
                (false, false) => {}
            }
        }
    }

    if output.iter().all(|p| p.is_finite()) {
        output
    } else {
        Vec::new()
    }
}

impl Polygon {
    /// Clip against `region`, returning a new polygon that keeps this
    /// cell's area, flags and reference points.
    pub fn clip(&self, region: &ClipRegion) -> Polygon {
        Polygon {
            points: clip_ring(&self.points, region),
            area: self.area,
            clipped: self.clipped,
            centroid: self.centroid,
            data_point: self.data_point,
        }
    }
}

/// Signed shoelace area; positive for counter-clockwise rings.
pub fn ring_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(min: f64, max: f64) -> Vec<Point> {
        vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
        ]
    }

    fn view(min: f64, max: f64) -> Bounds {
        Bounds::new(min, max, min, max)
    }

    /// Rings are equal up to a cyclic rotation of their start point.
    fn assert_same_ring(a: &[Point], b: &[Point]) {
        assert_eq!(a.len(), b.len(), "{:?} vs {:?}", a, b);
        let n = a.len();
        let matches = (0..n).any(|shift| {
            (0..n).all(|i| {
                let p = a[i];
                let q = b[(i + shift) % n];
                (p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9
            })
        });
        assert!(matches, "{:?} is not a rotation of {:?}", a, b);
    }

    #[test]
    fn test_inside_polygon_is_unchanged() {
        let subject = vec![
            Point::new(2.5, 2.0),
            Point::new(7.25, 3.0),
            Point::new(6.0, 8.5),
            Point::new(3.0, 6.0),
        ];
        let clipped = clip_ring(&subject, &ClipRegion::rectangle(&view(0.0, 10.0)));
        assert_same_ring(&clipped, &subject);
    }

    #[test]
    fn test_outside_polygon_degenerates() {
        let subject = square(20.0, 30.0);
        let clipped = clip_ring(&subject, &ClipRegion::rectangle(&view(0.0, 10.0)));
        assert!(clipped.len() < 3);
    }

    #[test]
    fn test_covering_polygon_becomes_region() {
        let region = ClipRegion::rectangle(&view(0.0, 10.0));
        let clipped = clip_ring(&square(-5.0, 15.0), &region);
        assert_same_ring(&clipped, region.points());
    }

    #[test]
    fn test_clip_is_idempotent() {
        let region = ClipRegion::rectangle(&view(0.0, 10.0));
        let subject = vec![Point::new(-4.0, 3.0), Point::new(6.0, -2.0), Point::new(12.0, 7.0), Point::new(4.0, 14.0)];
        let once = clip_ring(&subject, &region);
        let twice = clip_ring(&once, &region);
        assert!(once.len() >= 3);
        assert_same_ring(&twice, &once);
    }

    #[test]
    fn test_diagonal_region_keeps_upper_triangle() {
        let region = ClipRegion::diagonal(&view(0.0, 10.0));
        let clipped = clip_ring(&square(-5.0, 15.0), &region);
        assert_same_ring(&clipped, region.points());
        assert_abs_diff_eq!(ring_area(&clipped), 50.0, epsilon = 1e-9);

        let below = vec![Point::new(6.0, 1.0), Point::new(9.0, 1.0), Point::new(9.0, 4.0)];
        assert!(clip_ring(&below, &region).len() < 3);
    }

    #[test]
    fn test_half_overlap_area() {
        let region = ClipRegion::rectangle(&view(0.0, 10.0));
        let subject = vec![Point::new(5.0, 2.0), Point::new(15.0, 2.0), Point::new(15.0, 6.0), Point::new(5.0, 6.0)];
        let clipped = clip_ring(&subject, &region);
        assert_abs_diff_eq!(ring_area(&clipped), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_parallel_intersection_is_none() {
        let p = intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_clip_does_not_touch_subject() {
        let polygon = Polygon {
            points: square(-5.0, 15.0),
            area: 400.0,
            clipped: true,
            centroid: Point::new(5.0, 5.0),
            data_point: Point::new(4.0, 4.0),
        };
        let before = polygon.clone();
        let clipped = polygon.clip(&ClipRegion::rectangle(&view(0.0, 10.0)));
        assert_eq!(polygon, before);
        assert_eq!(clipped.area, 400.0);
        assert!(clipped.clipped);
        assert_eq!(clipped.points.len(), 4);
    }

    #[test]
    fn test_non_finite_input_is_dropped() {
        let subject = vec![Point::new(f64::NAN, 1.0), Point::new(5.0, 1.0), Point::new(5.0, 5.0)];
        let clipped = clip_ring(&subject, &ClipRegion::rectangle(&view(0.0, 10.0)));
        assert!(clipped.iter().all(|p| p.is_finite()));
    }
}
