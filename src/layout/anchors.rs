//! Named anchor points on element geometry
//!
//! Anchors are never stored on an element. Every query derives them from the
//! current bounding box or line geometry, so they cannot drift out of sync.

use std::collections::BTreeMap;

use super::geometry::AngleGeometry;
use super::types::{BoundingBox, Line, Point};

/// Prefix used for anchors on the padded content box of a box-model element
pub const CONTENT_BOX_PREFIX: &str = "contentBox.";

/// The nine anchors every box-shaped element exposes
pub const BOX_ANCHORS: [&str; 9] = [
    "topLeft",
    "topCenter",
    "topRight",
    "centerLeft",
    "center",
    "centerRight",
    "bottomLeft",
    "bottomCenter",
    "bottomRight",
];

/// Mapping from anchor name to position, in a stable order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnchorSet {
    points: BTreeMap<String, Point>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The nine box anchors of a bounding box
    pub fn from_box(bounds: &BoundingBox) -> Self {
        let mut set = Self::new();
        set.extend_box("", bounds);
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, point: Point) {
        self.points.insert(name.into(), point);
    }

    /// Add the nine box anchors, each name prefixed with `prefix`
    pub fn extend_box(&mut self, prefix: &str, bounds: &BoundingBox) {
        let xs = [bounds.x, bounds.x + bounds.width / 2.0, bounds.right()];
        let ys = [bounds.y, bounds.y + bounds.height / 2.0, bounds.bottom()];
        for (i, name) in BOX_ANCHORS.iter().enumerate() {
            let point = Point::new(xs[i % 3], ys[i / 3]);
            self.points.insert(format!("{prefix}{name}"), point);
        }
    }

    pub fn get(&self, name: &str) -> Option<Point> {
        self.points.get(name).copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.points.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> {
        self.points.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Capability shared by every geometric kind that can be positioned against or routed from
pub trait HasAnchors {
    fn anchors(&self) -> AnchorSet;

    /// Look up a single anchor; `None` for unknown names
    fn anchor(&self, name: &str) -> Option<Point> {
        self.anchors().get(name)
    }
}

impl HasAnchors for BoundingBox {
    fn anchors(&self) -> AnchorSet {
        AnchorSet::from_box(self)
    }

    fn anchor(&self, name: &str) -> Option<Point> {
        box_anchor(self, name)
    }
}

/// A border box with an inner content box shrunk by padding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxModel {
    pub border: BoundingBox,
    pub padding: f64,
}

impl BoxModel {
    pub fn new(border: BoundingBox, padding: f64) -> Self {
        Self { border, padding }
    }

    pub fn content_box(&self) -> BoundingBox {
        self.border.inset(self.padding)
    }
}

impl HasAnchors for BoxModel {
    fn anchors(&self) -> AnchorSet {
        let mut set = AnchorSet::from_box(&self.border);
        set.extend_box(CONTENT_BOX_PREFIX, &self.content_box());
        set
    }

    fn anchor(&self, name: &str) -> Option<Point> {
        match name.strip_prefix(CONTENT_BOX_PREFIX) {
            Some(inner) => box_anchor(&self.content_box(), inner),
            None => box_anchor(&self.border, name),
        }
    }
}

impl HasAnchors for Line {
    fn anchors(&self) -> AnchorSet {
        let mut set = AnchorSet::from_box(&self.bounds());
        set.insert("start", self.start);
        set.insert("end", self.end);
        set.insert("midpoint", self.midpoint());
        set
    }

    fn anchor(&self, name: &str) -> Option<Point> {
        match name {
            "start" => Some(self.start),
            "end" => Some(self.end),
            "midpoint" => Some(self.midpoint()),
            other => box_anchor(&self.bounds(), other),
        }
    }
}

/// Arc geometry together with the radius it is drawn at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleMarker {
    pub geometry: AngleGeometry,
    pub radius: f64,
}

impl HasAnchors for AngleMarker {
    fn anchors(&self) -> AnchorSet {
        let mut set = AnchorSet::new();
        set.insert("vertex", self.geometry.vertex);
        set.insert("arcStart", self.geometry.start_point(self.radius));
        set.insert("arcEnd", self.geometry.end_point(self.radius));
        set
    }
}

fn box_anchor(bounds: &BoundingBox, name: &str) -> Option<Point> {
    let index = BOX_ANCHORS.iter().position(|n| *n == name)?;
    let xs = [bounds.x, bounds.x + bounds.width / 2.0, bounds.right()];
    let ys = [bounds.y, bounds.y + bounds.height / 2.0, bounds.bottom()];
    Some(Point::new(xs[index % 3], ys[index / 3]))
}
