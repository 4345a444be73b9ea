//! Geometry of a declared element in its local frame or at its resolved position

use super::anchors::{AnchorSet, BoxModel, HasAnchors};
use super::types::{BoundingBox, Line, Point};

/// A node box inside a flowchart, relative to the flowchart origin until resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub id: String,
    pub bounds: BoundingBox,
}

/// Positionable geometry of one element
///
/// Local geometry has its bounding-box origin at (0, 0). Translating it by the
/// resolved origin yields the absolute geometry; nothing else is stored.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementGeometry {
    /// Box-shaped content: shapes, text and the artboard
    Box(BoxModel),
    Line(Line),
    /// A flowchart's extent together with its node boxes
    Flowchart {
        bounds: BoundingBox,
        nodes: Vec<NodeBox>,
    },
}

impl ElementGeometry {
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Self::Box(model) => model.border,
            Self::Line(line) => line.bounds(),
            Self::Flowchart { bounds, .. } => *bounds,
        }
    }

    pub fn translate(&self, delta: Point) -> ElementGeometry {
        match self {
            Self::Box(model) => {
                Self::Box(BoxModel::new(model.border.translate(delta), model.padding))
            }
            Self::Line(line) => Self::Line(line.translate(delta)),
            Self::Flowchart { bounds, nodes } => Self::Flowchart {
                bounds: bounds.translate(delta),
                nodes: nodes
                    .iter()
                    .map(|n| NodeBox {
                        id: n.id.clone(),
                        bounds: n.bounds.translate(delta),
                    })
                    .collect(),
            },
        }
    }

    /// Move the geometry so its bounding box starts at `origin`
    pub fn placed_at(&self, origin: Point) -> ElementGeometry {
        self.translate(origin - self.bounds().origin())
    }

    /// Same geometry moved into its local frame (bounding box at the origin)
    pub fn to_local(&self) -> ElementGeometry {
        self.placed_at(Point::origin())
    }

    pub fn node(&self, id: &str) -> Option<&NodeBox> {
        match self {
            Self::Flowchart { nodes, .. } => nodes.iter().find(|n| n.id == id),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }
}

impl HasAnchors for ElementGeometry {
    fn anchors(&self) -> AnchorSet {
        match self {
            Self::Box(model) => model.anchors(),
            Self::Line(line) => line.anchors(),
            Self::Flowchart { bounds, .. } => bounds.anchors(),
        }
    }

    fn anchor(&self, name: &str) -> Option<Point> {
        match self {
            Self::Box(model) => model.anchor(name),
            Self::Line(line) => line.anchor(name),
            Self::Flowchart { bounds, .. } => bounds.anchor(name),
        }
    }
}
