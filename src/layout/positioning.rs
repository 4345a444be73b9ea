//! Positioning resolver: turns relative-anchor constraints into absolute origins
//!
//! Constraints form a directed graph from a referenced element to the element
//! that depends on it. The graph is sorted with Kahn's algorithm, always picking
//! the lowest declaration index among the ready elements, so identical scenes
//! resolve in an identical order.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::scene::{AnchorRef, ElementPath, PositionConstraint, ARTBOARD_ID};

use super::anchors::{AngleMarker, BoxModel, HasAnchors};
use super::element::ElementGeometry;
use super::error::LayoutError;
use super::find_similar;
use super::geometry::{angle_between, intersect, AngleKind, GeometryError};
use super::types::{Line, Point};

/// Maximum edit distance for "did you mean" suggestions
const SUGGESTION_DISTANCE: usize = 2;

/// One element as seen by the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct PositionInput {
    pub id: String,
    pub kind: InputKind,
    pub constraint: Option<PositionConstraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    /// Geometry in its local frame and the origin used when unconstrained
    Placed {
        local: ElementGeometry,
        origin: Point,
    },
    /// An angle follows its two lines and has no origin of its own
    Angle {
        lines: [String; 2],
        kind: AngleKind,
        radius: f64,
    },
}

impl PositionInput {
    pub fn placed(id: impl Into<String>, geometry: &ElementGeometry) -> Self {
        Self {
            id: id.into(),
            kind: InputKind::Placed {
                local: geometry.to_local(),
                origin: geometry.bounds().origin(),
            },
            constraint: None,
        }
    }

    pub fn angle(id: impl Into<String>, lines: [String; 2], kind: AngleKind, radius: f64) -> Self {
        Self {
            id: id.into(),
            kind: InputKind::Angle { lines, kind, radius },
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Option<PositionConstraint>) -> Self {
        self.constraint = constraint;
        self
    }

    /// Element ids this input must be resolved after
    fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        if let InputKind::Angle { lines, .. } = &self.kind {
            refs.extend(lines.iter().map(String::as_str));
        }
        if let Some(constraint) = &self.constraint {
            match &constraint.relative_to {
                AnchorRef::Element { target, .. } => refs.push(target.element.as_str()),
                AnchorRef::Intersection { first, second } => {
                    refs.push(first.as_str());
                    refs.push(second.as_str());
                }
                AnchorRef::Point(_) => {}
            }
        }
        refs
    }
}

/// Absolute geometry of every element after a resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPositions {
    artboard: BoxModel,
    order: Vec<String>,
    geometries: HashMap<String, ElementGeometry>,
    angles: HashMap<String, Result<AngleMarker, GeometryError>>,
}

impl ResolvedPositions {
    fn new(artboard: BoxModel) -> Self {
        Self {
            artboard,
            order: Vec::new(),
            geometries: HashMap::new(),
            angles: HashMap::new(),
        }
    }

    pub fn artboard(&self) -> &BoxModel {
        &self.artboard
    }

    /// Element ids in the order they were resolved
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn geometry(&self, id: &str) -> Option<&ElementGeometry> {
        self.geometries.get(id)
    }

    /// Resolved origin (bounding-box top-left) of a placed element
    pub fn origin(&self, id: &str) -> Option<Point> {
        self.geometry(id).map(|g| g.bounds().origin())
    }

    /// Angle marker, or the geometry error that prevented computing it
    pub fn angle(&self, id: &str) -> Option<&Result<AngleMarker, GeometryError>> {
        self.angles.get(id)
    }

    /// Resolve an anchor reference against the current geometry
    pub fn anchor(&self, reference: &AnchorRef) -> Result<Point, LayoutError> {
        match reference {
            AnchorRef::Point(p) => Ok(*p),
            AnchorRef::Intersection { first, second } => {
                let a = self.line(first)?;
                let b = self.line(second)?;
                intersect(&a, &b, false).ok_or_else(|| {
                    let source = if intersect(&a, &b, true).is_some() {
                        GeometryError::DisjointSegments
                    } else {
                        GeometryError::Parallel
                    };
                    LayoutError::geometry(reference.to_string(), source)
                })
            }
            AnchorRef::Element { target, anchor } => self.element_anchor(target, anchor),
        }
    }

    fn element_anchor(&self, target: &ElementPath, anchor: &str) -> Result<Point, LayoutError> {
        if target.element == ARTBOARD_ID {
            return match &target.node {
                None => lookup(&self.artboard, ARTBOARD_ID, anchor),
                Some(_) => Err(LayoutError::dangling(target.to_string(), vec![])),
            };
        }

        if let Some(geometry) = self.geometries.get(&target.element) {
            return match &target.node {
                None => lookup(geometry, &target.element, anchor),
                Some(node_id) => match geometry.node(node_id) {
                    Some(node) => lookup(&node.bounds, &target.to_string(), anchor),
                    None => {
                        let suggestions = match geometry {
                            ElementGeometry::Flowchart { nodes, .. } => find_similar(
                                nodes.iter().map(|n| n.id.as_str()),
                                node_id,
                                SUGGESTION_DISTANCE,
                            )
                            .into_iter()
                            .map(|s| format!("{}.{}", target.element, s))
                            .collect(),
                            _ => vec![],
                        };
                        Err(LayoutError::dangling(target.to_string(), suggestions))
                    }
                },
            };
        }

        match self.angles.get(&target.element) {
            Some(Ok(marker)) if target.node.is_none() => lookup(marker, &target.element, anchor),
            Some(Err(error)) => Err(LayoutError::geometry(&target.element, error.clone())),
            _ => Err(LayoutError::dangling(
                target.to_string(),
                self.suggest(&target.element),
            )),
        }
    }

    fn line(&self, id: &str) -> Result<Line, LayoutError> {
        match self.geometries.get(id) {
            Some(ElementGeometry::Line(line)) => Ok(*line),
            Some(_) => Err(LayoutError::invalid_layout(id, "expected a line element")),
            None if self.angles.contains_key(id) => {
                Err(LayoutError::invalid_layout(id, "expected a line element"))
            }
            None => Err(LayoutError::dangling(id, self.suggest(id))),
        }
    }

    fn suggest(&self, id: &str) -> Vec<String> {
        let known = self
            .geometries
            .keys()
            .chain(self.angles.keys())
            .map(String::as_str)
            .chain(std::iter::once(ARTBOARD_ID));
        find_similar(known, id, SUGGESTION_DISTANCE)
    }
}

fn lookup<A: HasAnchors + ?Sized>(
    provider: &A,
    element: &str,
    anchor: &str,
) -> Result<Point, LayoutError> {
    provider
        .anchor(anchor)
        .ok_or_else(|| LayoutError::unknown_anchor(element, anchor, provider.anchors().names()))
}

/// Resolve every input to absolute geometry.
///
/// Structural problems (unknown ids, cycles, unknown anchors) abort the pass.
/// Angles whose lines are parallel or degenerate are kept as errors in the
/// result and only become fatal if another element is positioned against them.
pub fn resolve_positions(
    artboard: BoxModel,
    inputs: &[PositionInput],
) -> Result<ResolvedPositions, LayoutError> {
    let index = index_inputs(inputs)?;
    let dependencies = collect_dependencies(inputs, &index)?;
    let order = topological_order(inputs, &dependencies)?;

    let mut resolved = ResolvedPositions::new(artboard);
    for i in order {
        let input = &inputs[i];
        match &input.kind {
            InputKind::Placed { local, origin } => {
                let origin = match &input.constraint {
                    Some(constraint) => {
                        constrained_origin(&resolved, &input.id, local, constraint)?
                    }
                    None => *origin,
                };
                debug!(
                    element = input.id.as_str(),
                    x = origin.x,
                    y = origin.y;
                    "Resolved element position"
                );
                resolved
                    .geometries
                    .insert(input.id.clone(), local.placed_at(origin));
            }
            InputKind::Angle { lines, kind, radius } => {
                let a = resolved.line(&lines[0])?;
                let b = resolved.line(&lines[1])?;
                let marker = angle_between(&a, &b, *kind).map(|geometry| AngleMarker {
                    geometry,
                    radius: *radius,
                });
                if let Err(error) = &marker {
                    debug!(
                        element = input.id.as_str(),
                        error:% = error;
                        "Angle geometry unavailable"
                    );
                }
                resolved.angles.insert(input.id.clone(), marker);
            }
        }
        resolved.order.push(input.id.clone());
    }
    Ok(resolved)
}

fn constrained_origin(
    resolved: &ResolvedPositions,
    id: &str,
    local: &ElementGeometry,
    constraint: &PositionConstraint,
) -> Result<Point, LayoutError> {
    let target = resolved.anchor(&constraint.relative_to)?;
    let own = lookup(local, id, &constraint.relative_from)?;
    Ok(target - own + constraint.offset)
}

fn index_inputs(inputs: &[PositionInput]) -> Result<HashMap<&str, usize>, LayoutError> {
    let mut index = HashMap::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        if input.id.is_empty() {
            return Err(LayoutError::invalid_layout("", "element id must not be empty"));
        }
        if input.id == ARTBOARD_ID {
            return Err(LayoutError::invalid_layout(
                &input.id,
                "'artboard' is reserved for the root drawing area",
            ));
        }
        if input.id.contains('.') {
            return Err(LayoutError::invalid_layout(
                &input.id,
                "element ids must not contain '.'",
            ));
        }
        if index.insert(input.id.as_str(), i).is_some() {
            return Err(LayoutError::DuplicateId {
                id: input.id.clone(),
            });
        }
    }
    Ok(index)
}

fn collect_dependencies(
    inputs: &[PositionInput],
    index: &HashMap<&str, usize>,
) -> Result<Vec<Vec<usize>>, LayoutError> {
    inputs
        .iter()
        .map(|input| {
            if matches!(input.kind, InputKind::Angle { .. }) && input.constraint.is_some() {
                return Err(LayoutError::invalid_layout(
                    &input.id,
                    "angles follow their lines and cannot be positioned",
                ));
            }
            let mut deps = BTreeSet::new();
            for reference in input.references() {
                if reference == ARTBOARD_ID {
                    continue;
                }
                match index.get(reference) {
                    Some(&dep) => {
                        deps.insert(dep);
                    }
                    None => {
                        let known = index.keys().copied().chain(std::iter::once(ARTBOARD_ID));
                        return Err(LayoutError::dangling(
                            reference,
                            find_similar(known, reference, SUGGESTION_DISTANCE),
                        ));
                    }
                }
            }
            Ok(deps.into_iter().collect())
        })
        .collect()
}

/// Kahn's algorithm over declaration indices
fn topological_order(
    inputs: &[PositionInput],
    dependencies: &[Vec<usize>],
) -> Result<Vec<usize>, LayoutError> {
    let n = inputs.len();
    let mut dependents = vec![Vec::new(); n];
    let mut pending: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    for (i, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &next in &dependents[i] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() < n {
        let cycle = extract_cycle(&pending, dependencies)
            .into_iter()
            .map(|i| inputs[i].id.clone())
            .collect();
        return Err(LayoutError::cyclic(cycle));
    }
    Ok(order)
}

/// Walk unresolved dependencies from the lowest unresolved index until a node repeats.
///
/// Every unresolved node still waits on another unresolved node, so the walk
/// cannot leave the unresolved set.
fn extract_cycle(pending: &[usize], dependencies: &[Vec<usize>]) -> Vec<usize> {
    let Some(start) = (0..pending.len()).find(|&i| pending[i] > 0) else {
        return Vec::new();
    };
    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = dependencies[current].iter().find(|&&d| pending[d] > 0) else {
            return path;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle = path.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::BoundingBox;
    use pretty_assertions::assert_eq;

    fn artboard() -> BoxModel {
        BoxModel::new(BoundingBox::new(0.0, 0.0, 800.0, 600.0), 20.0)
    }

    fn rect(id: &str, w: f64, h: f64) -> PositionInput {
        PositionInput::placed(
            id,
            &ElementGeometry::Box(BoxModel::new(BoundingBox::new(0.0, 0.0, w, h), 0.0)),
        )
    }

    fn line(id: &str, start: Point, end: Point) -> PositionInput {
        PositionInput::placed(id, &ElementGeometry::Line(Line::new(start, end)))
    }

    fn constraint(from: &str, to: AnchorRef, dx: f64, dy: f64) -> Option<PositionConstraint> {
        Some(PositionConstraint::new(from, to, Point::new(dx, dy)))
    }

    #[test]
    fn test_content_box_placement() {
        let inputs = vec![rect("title", 100.0, 30.0).with_constraint(constraint(
            "topLeft",
            AnchorRef::element("artboard", "contentBox.topLeft"),
            0.0,
            0.0,
        ))];
        let resolved = resolve_positions(artboard(), &inputs).unwrap();
        assert_eq!(resolved.origin("title"), Some(Point::new(20.0, 20.0)));
    }

    #[test]
    fn test_chain_resolves_in_dependency_order() {
        let inputs = vec![
            rect("c", 10.0, 10.0).with_constraint(constraint(
                "topLeft",
                AnchorRef::element("b", "topRight"),
                5.0,
                0.0,
            )),
            rect("b", 10.0, 10.0).with_constraint(constraint(
                "topLeft",
                AnchorRef::element("a", "topRight"),
                5.0,
                0.0,
            )),
            rect("a", 10.0, 10.0),
        ];
        let resolved = resolve_positions(artboard(), &inputs).unwrap();
        assert_eq!(resolved.order(), &["a", "b", "c"]);
        assert_eq!(resolved.origin("c"), Some(Point::new(30.0, 0.0)));
    }

    #[test]
    fn test_relative_from_center() {
        let inputs = vec![rect("dot", 10.0, 20.0).with_constraint(constraint(
            "center",
            AnchorRef::Point(Point::new(100.0, 100.0)),
            0.0,
            0.0,
        ))];
        let resolved = resolve_positions(artboard(), &inputs).unwrap();
        assert_eq!(resolved.origin("dot"), Some(Point::new(95.0, 90.0)));
    }

    #[test]
    fn test_two_element_cycle() {
        let inputs = vec![
            rect("a", 10.0, 10.0).with_constraint(constraint(
                "topLeft",
                AnchorRef::element("b", "topLeft"),
                0.0,
                0.0,
            )),
            rect("b", 10.0, 10.0).with_constraint(constraint(
                "topLeft",
                AnchorRef::element("a", "topLeft"),
                0.0,
                0.0,
            )),
        ];
        match resolve_positions(artboard(), &inputs) {
            Err(LayoutError::CyclicConstraint { cycle }) => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let inputs = vec![rect("a", 10.0, 10.0).with_constraint(constraint(
            "topLeft",
            AnchorRef::element("a", "bottomRight"),
            0.0,
            0.0,
        ))];
        match resolve_positions(artboard(), &inputs) {
            Err(LayoutError::CyclicConstraint { cycle }) => assert_eq!(cycle, vec!["a", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_reference_suggests() {
        let inputs = vec![
            rect("server", 10.0, 10.0),
            rect("client", 10.0, 10.0).with_constraint(constraint(
                "topLeft",
                AnchorRef::element("servr", "topRight"),
                0.0,
                0.0,
            )),
        ];
        let err = resolve_positions(artboard(), &inputs).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"unknown element 'servr' (did you mean: server?)");
    }

    #[test]
    fn test_unknown_anchor_lists_valid_names() {
        let inputs = vec![line("l", Point::origin(), Point::new(10.0, 0.0))
            .with_constraint(constraint("middle", AnchorRef::Point(Point::origin()), 0.0, 0.0))];
        match resolve_positions(artboard(), &inputs) {
            Err(LayoutError::UnknownAnchor { element, anchor, valid_anchors }) => {
                assert_eq!(element, "l");
                assert_eq!(anchor, "middle");
                assert!(valid_anchors.contains("midpoint"));
            }
            other => panic!("expected unknown anchor, got {other:?}"),
        }
    }

    #[test]
    fn test_intersection_reference() {
        let inputs = vec![
            line("h", Point::new(100.0, 300.0), Point::new(500.0, 300.0)),
            line("v", Point::new(300.0, 150.0), Point::new(300.0, 450.0)),
            rect("marker", 10.0, 10.0).with_constraint(constraint(
                "center",
                AnchorRef::intersection("h", "v"),
                0.0,
                0.0,
            )),
        ];
        let resolved = resolve_positions(artboard(), &inputs).unwrap();
        assert_eq!(resolved.origin("marker"), Some(Point::new(295.0, 295.0)));
    }

    #[test]
    fn test_intersection_of_parallel_lines_fails() {
        let inputs = vec![
            line("a", Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            line("b", Point::new(0.0, 5.0), Point::new(10.0, 5.0)),
            rect("x", 1.0, 1.0).with_constraint(constraint(
                "center",
                AnchorRef::intersection("a", "b"),
                0.0,
                0.0,
            )),
        ];
        let err = resolve_positions(artboard(), &inputs).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Geometry {
                source: GeometryError::Parallel,
                ..
            }
        ));
    }

    #[test]
    fn test_constrained_line_moves_as_a_whole() {
        let inputs = vec![line("l", Point::new(50.0, 50.0), Point::new(150.0, 80.0))
            .with_constraint(constraint(
                "start",
                AnchorRef::Point(Point::new(0.0, 0.0)),
                10.0,
                0.0,
            ))];
        let resolved = resolve_positions(artboard(), &inputs).unwrap();
        let moved = resolved.geometry("l").and_then(ElementGeometry::as_line).copied();
        assert_eq!(
            moved,
            Some(Line::new(Point::new(10.0, 0.0), Point::new(110.0, 30.0)))
        );
    }

    #[test]
    fn test_angle_follows_lines() {
        let inputs = vec![
            PositionInput::angle(
                "corner",
                ["h".to_string(), "v".to_string()],
                AngleKind::Inward,
                20.0,
            ),
            line("h", Point::new(100.0, 300.0), Point::new(500.0, 300.0)),
            line("v", Point::new(300.0, 150.0), Point::new(300.0, 450.0)),
        ];
        let resolved = resolve_positions(artboard(), &inputs).unwrap();
        assert_eq!(resolved.order(), &["h", "v", "corner"]);
        let marker = resolved.angle("corner").unwrap().as_ref().unwrap();
        assert_eq!(marker.geometry.sweep_angle, 90.0);
        assert_eq!(
            resolved.anchor(&AnchorRef::element("corner", "vertex")).unwrap(),
            Point::new(300.0, 300.0)
        );
    }

    #[test]
    fn test_parallel_angle_is_not_fatal() {
        let inputs = vec![
            line("a", Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            line("b", Point::new(0.0, 5.0), Point::new(10.0, 5.0)),
            PositionInput::angle("bad", ["a".to_string(), "b".to_string()], AngleKind::Inward, 5.0),
        ];
        let resolved = resolve_positions(artboard(), &inputs).unwrap();
        assert_eq!(resolved.angle("bad"), Some(&Err(GeometryError::Parallel)));
    }

    #[test]
    fn test_constrained_angle_rejected() {
        let inputs = vec![
            line("a", Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            PositionInput::angle("x", ["a".to_string(), "a".to_string()], AngleKind::Inward, 5.0)
                .with_constraint(constraint("vertex", AnchorRef::Point(Point::origin()), 0.0, 0.0)),
        ];
        assert!(matches!(
            resolve_positions(artboard(), &inputs),
            Err(LayoutError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn test_duplicate_and_reserved_ids() {
        let dup = vec![rect("a", 1.0, 1.0), rect("a", 1.0, 1.0)];
        assert!(matches!(
            resolve_positions(artboard(), &dup),
            Err(LayoutError::DuplicateId { .. })
        ));
        let reserved = vec![rect("artboard", 1.0, 1.0)];
        assert!(matches!(
            resolve_positions(artboard(), &reserved),
            Err(LayoutError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let inputs = vec![
            rect("a", 40.0, 20.0).with_constraint(constraint(
                "center",
                AnchorRef::element("artboard", "contentBox.center"),
                0.0,
                0.0,
            )),
            rect("b", 10.0, 10.0).with_constraint(constraint(
                "topCenter",
                AnchorRef::element("a", "bottomCenter"),
                0.0,
                8.0,
            )),
        ];
        let first = resolve_positions(artboard(), &inputs).unwrap();
        let second = resolve_positions(artboard(), &inputs).unwrap();
        assert_eq!(first, second);
    }
}
