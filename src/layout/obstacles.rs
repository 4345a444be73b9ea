//! Obstacle model: node boxes grown by padding and spacing
//!
//! Built once per flowchart before routing and only read afterwards.

use super::element::NodeBox;
use super::geometry::{path_rect_distance, segment_intersects_rect};
use super::types::{BoundingBox, Point};

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: String,
    /// The node box itself
    pub bounds: BoundingBox,
    /// The region connectors must stay out of
    pub inflated: BoundingBox,
}

/// All obstacles of one flowchart
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
    inflation: f64,
}

impl ObstacleSet {
    /// Inflate every node box by `inflation` on each side
    pub fn from_nodes(nodes: &[NodeBox], inflation: f64) -> Self {
        let obstacles = nodes
            .iter()
            .map(|node| Obstacle {
                id: node.id.clone(),
                bounds: node.bounds,
                inflated: node.bounds.inflate(inflation),
            })
            .collect();
        Self {
            obstacles,
            inflation,
        }
    }

    pub fn inflation(&self) -> f64 {
        self.inflation
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    /// Smallest box covering every inflated obstacle
    pub fn extent(&self) -> Option<BoundingBox> {
        self.obstacles
            .iter()
            .map(|o| o.inflated)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Does the segment touch any inflated obstacle not listed in `exempt`?
    pub fn segment_blocked(&self, a: Point, b: Point, exempt: &[&str]) -> bool {
        self.considered(exempt)
            .any(|o| segment_intersects_rect(a, b, &o.inflated))
    }

    /// Smallest distance from a path to any node box not listed in `exempt`
    pub fn clearance(&self, path: &[Point], exempt: &[&str]) -> Option<f64> {
        self.considered(exempt)
            .map(|o| path_rect_distance(path, &o.bounds))
            .reduce(f64::min)
    }

    fn considered<'a>(&'a self, exempt: &'a [&'a str]) -> impl Iterator<Item = &'a Obstacle> + 'a {
        self.obstacles
            .iter()
            .filter(move |o| !exempt.contains(&o.id.as_str()))
    }
}
