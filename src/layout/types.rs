//! Core geometric types shared by positioning, routing and label placement

use std::ops::{Add, Mul, Sub};

use serde::Deserialize;

use crate::theme::TintColors;

use super::anchors::BoxModel;
use super::element::ElementGeometry;
use super::error::Diagnostic;
use super::geometry::{AngleGeometry, GeometryError};

/// A 2D point in the coordinate system (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Euclidean length of the vector from the origin to this point
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: Point) -> f64 {
        (*self - other).length()
    }

    /// Unit vector in the same direction, or `None` for the zero vector
    pub fn normalized(&self) -> Option<Point> {
        let len = self.length();
        if len <= f64::EPSILON {
            None
        } else {
            Some(Point::new(self.x / len, self.y / len))
        }
    }

    /// Approximate equality used when comparing derived geometry
    pub fn approx_eq(&self, other: Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Intrinsic size of an element, as reported by content measurement
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A bounding box representing the spatial extent of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized bounding box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Smallest box containing both points
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Box of the given size centered on a point
    pub fn centered_at(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point of the bounding box
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Check if this bounding box contains a point (edges included)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Check if a point lies strictly inside the box
    pub fn contains_strict(&self, point: Point) -> bool {
        point.x > self.x && point.x < self.right() && point.y > self.y && point.y < self.bottom()
    }

    /// Check if this bounding box intersects another
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Compute the union of two bounding boxes (smallest box containing both)
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Expand this bounding box to include a point
    pub fn expand_to_include(&self, point: Point) -> BoundingBox {
        let x = self.x.min(point.x);
        let y = self.y.min(point.y);
        let right = self.right().max(point.x);
        let bottom = self.bottom().max(point.y);
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Grow the box by `amount` on every side
    pub fn inflate(&self, amount: f64) -> BoundingBox {
        BoundingBox::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    /// Shrink the box by `amount` on every side, never below zero size
    pub fn inset(&self, amount: f64) -> BoundingBox {
        let dx = amount.min(self.width / 2.0);
        let dy = amount.min(self.height / 2.0);
        BoundingBox::new(
            self.x + dx,
            self.y + dy,
            self.width - dx * 2.0,
            self.height - dy * 2.0,
        )
    }

    pub fn translate(&self, delta: Point) -> BoundingBox {
        BoundingBox::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Distance from a point to the box outline (zero when inside)
    pub fn distance_to(&self, point: Point) -> f64 {
        let dx = (self.x - point.x).max(0.0).max(point.x - self.right());
        let dy = (self.y - point.y).max(0.0).max(point.y - self.bottom());
        dx.hypot(dy)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// A straight line segment
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// Vector from start to end
    pub fn direction(&self) -> Point {
        self.end - self.start
    }

    pub fn is_degenerate(&self) -> bool {
        self.length() <= 1e-9
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_corners(self.start, self.end)
    }

    pub fn translate(&self, delta: Point) -> Line {
        Line::new(self.start + delta, self.end + delta)
    }
}

/// Layout of a text label attached to a connection or an angle
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub text: String,
    /// Center of the label box
    pub position: Point,
    pub bounds: BoundingBox,
    /// False when the placement budget ran out and the label may overlap
    pub overlap_resolved: bool,
}

/// How a connection path was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    /// Found by grid search around obstacles
    Routed,
    /// The straight segment was already clear
    Direct,
    /// No clear path exists; the path is a straight fallback
    Unrouted,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routed => "routed",
            Self::Direct => "direct",
            Self::Unrouted => "unrouted",
        }
    }
}

/// A positioned top-level element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementLayout {
    pub id: String,
    /// Element kind name, e.g. `shape` or `line`
    pub kind: &'static str,
    pub geometry: ElementGeometry,
    pub text: Option<String>,
    pub colors: Option<TintColors>,
}

/// A flowchart node at its absolute position
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub text: String,
    pub bounds: BoundingBox,
    pub colors: TintColors,
}

/// A routed connection between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionLayout {
    pub from: String,
    pub to: String,
    pub path: Vec<Point>,
    pub status: RouteStatus,
    pub label: Option<LabelLayout>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowchartLayout {
    pub id: String,
    pub bounds: BoundingBox,
    pub nodes: Vec<NodeLayout>,
    pub connections: Vec<ConnectionLayout>,
}

impl FlowchartLayout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connection(&self, from: &str, to: &str) -> Option<&ConnectionLayout> {
        self.connections
            .iter()
            .find(|c| c.from == from && c.to == to)
    }
}

/// A resolved angle marker
#[derive(Debug, Clone, PartialEq)]
pub struct AngleLayout {
    pub id: String,
    pub geometry: AngleGeometry,
    pub radius: f64,
    /// Sampled arc, start to end
    pub arc: Vec<Point>,
    pub label: Option<LabelLayout>,
    /// Arc start and end points, present when debug output was requested
    pub debug_points: Option<(Point, Point)>,
}

/// An element that could not be laid out without aborting the pass
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFailure {
    pub id: String,
    pub error: GeometryError,
}

/// Frozen result of one layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub artboard: BoxModel,
    /// Shapes, text and lines in declaration order
    pub elements: Vec<ElementLayout>,
    pub flowcharts: Vec<FlowchartLayout>,
    pub angles: Vec<AngleLayout>,
    pub failures: Vec<ElementFailure>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SceneLayout {
    pub fn element(&self, id: &str) -> Option<&ElementLayout> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn flowchart(&self, id: &str) -> Option<&FlowchartLayout> {
        self.flowcharts.iter().find(|f| f.id == id)
    }

    pub fn angle(&self, id: &str) -> Option<&AngleLayout> {
        self.angles.iter().find(|a| a.id == id)
    }
}
