//! Geometry kernel: intersections, angles between lines and arc sampling
//!
//! Everything here is a pure function of its inputs. Derived values such as an
//! intersection are recomputed on every call and never cached, so a moved line
//! can never leave a stale vertex behind.

use serde::Deserialize;
use thiserror::Error;

use super::types::{BoundingBox, Line, Point};

/// Determinants smaller than this are treated as parallel lines
const PARALLEL_EPSILON: f64 = 1e-9;

/// Slack allowed on segment parameters so shared endpoints still intersect
const PARAM_EPSILON: f64 = 1e-9;

/// Errors raised by the geometry kernel
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    /// Zero-length line or coincident points
    #[error("degenerate geometry: {reason}")]
    Degenerate { reason: String },

    /// The two lines never meet
    #[error("lines are parallel and have no intersection")]
    Parallel,

    /// The extended lines meet, but outside at least one of the segments
    #[error("segments do not intersect")]
    DisjointSegments,
}

impl GeometryError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate {
            reason: reason.into(),
        }
    }
}

/// Which of the two complementary sweeps between two lines to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleKind {
    /// The sweep of at most 180 degrees
    #[default]
    Inward,
    /// The complementary sweep of at least 180 degrees
    Outward,
}

/// Arc geometry between two lines, angles in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleGeometry {
    pub vertex: Point,
    /// Direction of the first ray, in [0, 360)
    pub start_angle: f64,
    /// Positive sweep from the start ray (y-down, so clockwise on screen)
    pub sweep_angle: f64,
}

impl AngleGeometry {
    pub fn end_angle(&self) -> f64 {
        normalize_degrees(self.start_angle + self.sweep_angle)
    }

    /// Direction halfway through the sweep
    pub fn bisector_angle(&self) -> f64 {
        normalize_degrees(self.start_angle + self.sweep_angle / 2.0)
    }

    /// Point on the start ray at the given distance from the vertex
    pub fn start_point(&self, radius: f64) -> Point {
        polar(self.vertex, radius, self.start_angle)
    }

    /// Point on the end ray at the given distance from the vertex
    pub fn end_point(&self, radius: f64) -> Point {
        polar(self.vertex, radius, self.end_angle())
    }
}

/// Intersect two lines.
///
/// With `infinite` set, both lines are extended without bounds; otherwise the
/// intersection must lie on both segments. Parallel and coincident lines have
/// no single intersection and yield `None`.
pub fn intersect(a: &Line, b: &Line, infinite: bool) -> Option<Point> {
    let r = a.direction();
    let s = b.direction();
    let det = cross(r, s);
    let scale = r.length() * s.length();
    if scale <= f64::EPSILON || det.abs() <= PARALLEL_EPSILON * scale {
        return None;
    }

    let offset = b.start - a.start;
    let t = cross(offset, s) / det;
    let u = cross(offset, r) / det;

    if !infinite {
        let in_range = |v: f64| (-PARAM_EPSILON..=1.0 + PARAM_EPSILON).contains(&v);
        if !in_range(t) || !in_range(u) {
            return None;
        }
    }

    // Averaging both parametric solutions keeps intersect(a, b) == intersect(b, a)
    let from_a = a.start + r * t;
    let from_b = b.start + s * u;
    Some(Point::new(
        (from_a.x + from_b.x) / 2.0,
        (from_a.y + from_b.y) / 2.0,
    ))
}

/// Compute the arc between two lines around their (extended) intersection.
pub fn angle_between(a: &Line, b: &Line, kind: AngleKind) -> Result<AngleGeometry, GeometryError> {
    if a.is_degenerate() {
        return Err(GeometryError::degenerate("first line has zero length"));
    }
    if b.is_degenerate() {
        return Err(GeometryError::degenerate("second line has zero length"));
    }

    let vertex = intersect(a, b, true).ok_or(GeometryError::Parallel)?;
    let theta_a = direction_degrees(arm_direction(a, vertex));
    let theta_b = direction_degrees(arm_direction(b, vertex));

    let delta = normalize_degrees(theta_b - theta_a);
    let (inward_start, inward_sweep) = if delta <= 180.0 {
        (theta_a, delta)
    } else {
        (theta_b, 360.0 - delta)
    };

    let geometry = match kind {
        AngleKind::Inward => AngleGeometry {
            vertex,
            start_angle: inward_start,
            sweep_angle: inward_sweep,
        },
        AngleKind::Outward => AngleGeometry {
            vertex,
            start_angle: normalize_degrees(inward_start + inward_sweep),
            sweep_angle: 360.0 - inward_sweep,
        },
    };
    Ok(geometry)
}

/// Sample an arc into `resolution + 1` evenly spaced points.
pub fn arc_points(
    vertex: Point,
    radius: f64,
    start_angle: f64,
    sweep_angle: f64,
    resolution: usize,
) -> Vec<Point> {
    let steps = resolution.max(1);
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            polar(vertex, radius, start_angle + sweep_angle * t)
        })
        .collect()
}

/// Check whether two closed segments touch or cross
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    fn orient(a: Point, b: Point, c: Point) -> f64 {
        cross(b - a, c - a)
    }
    fn on_segment(a: Point, b: Point, p: Point) -> bool {
        p.x >= a.x.min(b.x) - 1e-9
            && p.x <= a.x.max(b.x) + 1e-9
            && p.y >= a.y.min(b.y) - 1e-9
            && p.y <= a.y.max(b.y) + 1e-9
    }

    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);

    if ((o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0))
        && ((o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0))
    {
        return true;
    }
    (o1.abs() <= 1e-9 && on_segment(a, b, c))
        || (o2.abs() <= 1e-9 && on_segment(a, b, d))
        || (o3.abs() <= 1e-9 && on_segment(c, d, a))
        || (o4.abs() <= 1e-9 && on_segment(c, d, b))
}

/// Check whether a segment touches or crosses a rectangle (edges included)
pub fn segment_intersects_rect(a: Point, b: Point, rect: &BoundingBox) -> bool {
    if a.x.max(b.x) < rect.x
        || a.x.min(b.x) > rect.right()
        || a.y.max(b.y) < rect.y
        || a.y.min(b.y) > rect.bottom()
    {
        return false;
    }
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    let corners = [
        Point::new(rect.x, rect.y),
        Point::new(rect.right(), rect.y),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.x, rect.bottom()),
    ];
    (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
}

/// Check whether a segment passes through the open interior of a rectangle.
///
/// Running along an edge or touching a corner does not count.
pub fn segment_enters_interior(a: Point, b: Point, rect: &BoundingBox) -> bool {
    // Liang-Barsky clipping against the open box
    let d = b - a;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    let checks = [
        (-d.x, a.x - rect.x),
        (d.x, rect.right() - a.x),
        (-d.y, a.y - rect.y),
        (d.y, rect.bottom() - a.y),
    ];
    for (p, q) in checks {
        if p.abs() <= f64::EPSILON {
            if q <= 1e-9 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 >= t1 {
            return false;
        }
    }
    let mid = a + d * ((t0 + t1) / 2.0);
    t1 - t0 > 1e-9 && rect.contains_strict(mid)
}

/// Shortest distance from a point to a segment
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Shortest distance between a segment and a rectangle, zero when they touch
pub fn segment_rect_distance(a: Point, b: Point, rect: &BoundingBox) -> f64 {
    if segment_intersects_rect(a, b, rect) {
        return 0.0;
    }
    let corners = [
        Point::new(rect.x, rect.y),
        Point::new(rect.right(), rect.y),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.x, rect.bottom()),
    ];
    corners
        .into_iter()
        .map(|c| point_segment_distance(c, a, b))
        .fold(rect.distance_to(a).min(rect.distance_to(b)), f64::min)
}

/// Shortest distance between a polyline and a rectangle
pub fn path_rect_distance(path: &[Point], rect: &BoundingBox) -> f64 {
    match path {
        [] => f64::INFINITY,
        [p] => rect.distance_to(*p),
        _ => path
            .windows(2)
            .map(|w| segment_rect_distance(w[0], w[1], rect))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Map any angle in degrees into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

fn polar(center: Point, radius: f64, degrees: f64) -> Point {
    let rad = degrees.to_radians();
    Point::new(center.x + radius * rad.cos(), center.y + radius * rad.sin())
}

fn direction_degrees(v: Point) -> f64 {
    normalize_degrees(v.y.atan2(v.x).to_degrees())
}

/// Ray from the vertex along the line, toward its farther endpoint.
fn arm_direction(line: &Line, vertex: Point) -> Point {
    let to_start = line.start - vertex;
    let to_end = line.end - vertex;
    if to_start.length() > to_end.length() + 1e-9 {
        to_start
    } else {
        to_end
    }
}
