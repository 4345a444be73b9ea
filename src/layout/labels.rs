//! Label placement for connections and angle markers
//!
//! A label starts at its natural anchor (the midpoint of a path's longest
//! segment) and is nudged along the segment normal, alternating sides, until
//! its box clears every blocker and every label placed before it.

use super::config::LayoutConfig;
use super::measure::TextMeasure;
use super::types::{BoundingBox, LabelLayout, Point};

/// Midpoint of the longest segment and that segment's unit normal.
///
/// The normal points up for left-to-right segments and right for downward
/// ones. Ties between equally long segments go to the earlier one.
pub fn label_anchor(path: &[Point]) -> Option<(Point, Point)> {
    let mut best: Option<(f64, Point, Point)> = None;
    for segment in path.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        let length = a.distance(b);
        if best.map_or(true, |(l, _, _)| length > l) {
            best = Some((length, a, b));
        }
    }
    let (_, a, b) = best?;
    let mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let normal = (b - a)
        .normalized()
        .map(|d| Point::new(d.y, -d.x))
        .unwrap_or(Point::new(0.0, -1.0));
    Some((mid, normal))
}

/// Places labels one after another so later labels avoid earlier ones
pub struct LabelPlacer<'a> {
    config: &'a LayoutConfig,
    measure: &'a dyn TextMeasure,
    blockers: Vec<BoundingBox>,
    placed: Vec<BoundingBox>,
}

impl<'a> LabelPlacer<'a> {
    pub fn new(
        config: &'a LayoutConfig,
        measure: &'a dyn TextMeasure,
        blockers: impl IntoIterator<Item = BoundingBox>,
    ) -> Self {
        Self {
            config,
            measure,
            blockers: blockers.into_iter().collect(),
            placed: Vec::new(),
        }
    }

    /// Label a connection path
    pub fn place_on_path(&mut self, text: &str, path: &[Point]) -> LabelLayout {
        let (anchor, normal) = label_anchor(path).unwrap_or_else(|| {
            (
                path.first().copied().unwrap_or_default(),
                Point::new(0.0, -1.0),
            )
        });
        self.place_at(text, anchor, normal)
    }

    /// Label centered on `anchor`, nudged along `normal` when blocked
    pub fn place_at(&mut self, text: &str, anchor: Point, normal: Point) -> LabelLayout {
        let size = self.measure.measure(text, self.config.font_size);
        let pad = self.config.label_padding;
        let box_at = |center: Point| BoundingBox::centered_at(center, size).inflate(pad);

        let mut candidates = vec![anchor];
        for k in 1..=self.config.label_attempts {
            let step = normal * (k as f64 * self.config.label_nudge);
            candidates.push(anchor + step);
            candidates.push(anchor - step);
        }

        let found = candidates
            .into_iter()
            .find(|&center| !self.collides(&box_at(center)));

        let (position, overlap_resolved) = match found {
            Some(center) => (center, true),
            None => (anchor, false),
        };
        let bounds = box_at(position);
        self.placed.push(bounds);
        LabelLayout {
            text: text.to_string(),
            position,
            bounds,
            overlap_resolved,
        }
    }

    fn collides(&self, candidate: &BoundingBox) -> bool {
        self.blockers
            .iter()
            .chain(self.placed.iter())
            .any(|b| b.intersects(candidate))
    }
}
