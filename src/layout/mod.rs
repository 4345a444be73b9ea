//! Layout engine for computing element positions, routes and labels
//!
//! This module takes a declared scene and computes its geometry in one pass:
//! content is measured, positions are resolved, flowchart connections are
//! routed and labeled, and angle markers are derived from their lines. The
//! result is a frozen [`SceneLayout`].

pub mod anchors;
pub mod config;
pub mod element;
pub mod error;
pub mod flowchart;
pub mod geometry;
pub mod labels;
pub mod measure;
pub mod obstacles;
pub mod positioning;
pub mod routing;
pub mod types;

pub use anchors::{AnchorSet, HasAnchors};
pub use config::LayoutConfig;
pub use error::{Diagnostic, LayoutError};
pub use geometry::{angle_between, arc_points, intersect, AngleGeometry, AngleKind, GeometryError};
pub use measure::{EstimatedTextMeasure, TextMeasure};
pub use positioning::{resolve_positions, ResolvedPositions};
pub use types::*;

use log::{debug, info, warn};

use crate::scene::{ElementKind, Scene};
use crate::theme::Theme;

use anchors::BoxModel;
use element::ElementGeometry;
use labels::LabelPlacer;
use positioning::PositionInput;

/// Lay out a scene.
///
/// Structural errors abort the pass. Degenerate angles, unreachable routes and
/// crowded labels are recovered locally and reported in
/// [`SceneLayout::diagnostics`]. The same inputs always give the same layout.
pub fn layout_scene(
    scene: &Scene,
    config: &LayoutConfig,
    theme: &Theme,
    measure: &dyn TextMeasure,
) -> Result<SceneLayout, LayoutError> {
    config.validate()?;
    info!(elements = scene.elements.len(); "Laying out scene");

    let board = &scene.artboard;
    if !(board.width > 0.0 && board.height > 0.0 && board.padding >= 0.0) {
        return Err(LayoutError::invalid_layout(
            crate::scene::ARTBOARD_ID,
            "artboard needs a positive size and non-negative padding",
        ));
    }
    let artboard = BoxModel::new(
        BoundingBox::new(0.0, 0.0, board.width, board.height),
        board.padding,
    );

    // Measure content and build local geometry
    let mut inputs = Vec::with_capacity(scene.elements.len());
    let mut flowchart_configs = Vec::new();
    for decl in &scene.elements {
        let input = match &decl.kind {
            ElementKind::Shape(shape) => {
                if !(shape.width >= 0.0 && shape.height >= 0.0 && shape.padding >= 0.0) {
                    return Err(LayoutError::invalid_layout(
                        &decl.id,
                        "shape size and padding must not be negative",
                    ));
                }
                let border = BoundingBox::from_origin_size(
                    shape.at.unwrap_or_default(),
                    Size::new(shape.width, shape.height),
                );
                let model = BoxModel::new(border, shape.padding);
                PositionInput::placed(&decl.id, &ElementGeometry::Box(model))
            }
            ElementKind::Text(text) => {
                let font_size = text.font_size.unwrap_or(config.font_size);
                let content = measure.measure(&text.content, font_size);
                let size = Size::new(
                    content.width + text.padding * 2.0,
                    content.height + text.padding * 2.0,
                );
                let border = BoundingBox::from_origin_size(text.at.unwrap_or_default(), size);
                let model = BoxModel::new(border, text.padding);
                PositionInput::placed(&decl.id, &ElementGeometry::Box(model))
            }
            ElementKind::Line(line) => {
                PositionInput::placed(&decl.id, &ElementGeometry::Line(line.line()))
            }
            ElementKind::Angle(angle) => {
                if !(angle.radius > 0.0) {
                    return Err(LayoutError::invalid_layout(
                        &decl.id,
                        "angle radius must be positive",
                    ));
                }
                PositionInput::angle(&decl.id, angle.between.clone(), angle.kind, angle.radius)
            }
            ElementKind::Flowchart(chart) => {
                let chart_config = flowchart::effective_config(config, chart)?;
                let geometry =
                    flowchart::flowchart_geometry(&decl.id, chart, &chart_config, measure)?;
                flowchart_configs.push(chart_config);
                PositionInput::placed(&decl.id, &geometry)
            }
        };
        inputs.push(input.with_constraint(decl.position.clone()));
    }

    info!("Resolving positions");
    let resolved = resolve_positions(artboard, &inputs)?;

    let mut labels = LabelPlacer::new(
        config,
        measure,
        label_blockers(scene, &resolved, &flowchart_configs),
    );
    let mut diagnostics = Vec::new();
    let mut elements = Vec::new();
    let mut flowcharts = Vec::new();
    let mut chart_configs = flowchart_configs.iter();
    for decl in &scene.elements {
        let Some(geometry) = resolved.geometry(&decl.id) else {
            continue;
        };
        let (text, colors) = match &decl.kind {
            ElementKind::Shape(shape) => (None, Some(theme.resolve(shape.tint.as_deref()).clone())),
            ElementKind::Text(t) => (
                Some(t.content.clone()),
                Some(theme.resolve(t.tint.as_deref()).clone()),
            ),
            ElementKind::Line(_) => (None, None),
            ElementKind::Flowchart(chart) => {
                let chart_config = chart_configs.next().ok_or_else(|| {
                    LayoutError::invalid_layout(&decl.id, "missing flowchart configuration")
                })?;
                info!(
                    flowchart = decl.id.as_str(),
                    connections = chart.connections.len();
                    "Routing flowchart",
                );
                flowcharts.push(flowchart::layout_flowchart(
                    &decl.id,
                    chart,
                    geometry,
                    chart_config,
                    theme,
                    &mut labels,
                    &mut diagnostics,
                )?);
                continue;
            }
            ElementKind::Angle(_) => continue,
        };
        elements.push(ElementLayout {
            id: decl.id.clone(),
            kind: decl.kind.name(),
            geometry: geometry.clone(),
            text,
            colors,
        });
    }

    let (angles, failures) =
        layout_angles(scene, &resolved, config, &mut labels, &mut diagnostics);

    info!(diagnostics = diagnostics.len(); "Layout complete");
    Ok(SceneLayout {
        artboard,
        elements,
        flowcharts,
        angles,
        failures,
        diagnostics,
    })
}

/// Boxes every label must stay clear of: shapes, text and inflated flowchart nodes
fn label_blockers(
    scene: &Scene,
    resolved: &ResolvedPositions,
    flowchart_configs: &[LayoutConfig],
) -> Vec<BoundingBox> {
    let mut chart_configs = flowchart_configs.iter();
    let mut blockers = Vec::new();
    for decl in &scene.elements {
        let is_flowchart = matches!(decl.kind, ElementKind::Flowchart(_));
        let chart_config = if is_flowchart { chart_configs.next() } else { None };
        let Some(geometry) = resolved.geometry(&decl.id) else {
            continue;
        };
        match (geometry, chart_config) {
            (ElementGeometry::Box(_), _) => blockers.push(geometry.bounds()),
            (ElementGeometry::Flowchart { .. }, Some(chart_config)) => {
                blockers.extend(flowchart::label_blockers(geometry, chart_config));
            }
            _ => {}
        }
    }
    blockers
}

fn layout_angles(
    scene: &Scene,
    resolved: &ResolvedPositions,
    config: &LayoutConfig,
    labels: &mut LabelPlacer<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<AngleLayout>, Vec<ElementFailure>) {
    let mut angles = Vec::new();
    let mut failures = Vec::new();

    for decl in &scene.elements {
        let ElementKind::Angle(angle) = &decl.kind else {
            continue;
        };
        let marker = match resolved.angle(&decl.id) {
            Some(Ok(marker)) => marker,
            Some(Err(error)) => {
                warn!(element = decl.id.as_str(), error:% = error; "Skipping angle");
                diagnostics.push(Diagnostic::AngleFailed {
                    element: decl.id.clone(),
                    error: error.clone(),
                });
                failures.push(ElementFailure {
                    id: decl.id.clone(),
                    error: error.clone(),
                });
                continue;
            }
            None => continue,
        };

        let g = marker.geometry;
        let arc = arc_points(
            g.vertex,
            marker.radius,
            g.start_angle,
            g.sweep_angle,
            config.arc_resolution,
        );
        let label = angle.label.as_ref().map(|text| {
            let rad = g.bisector_angle().to_radians();
            let direction = Point::new(rad.cos(), rad.sin());
            let anchor = g.vertex + direction * (marker.radius + config.label_gap);
            let label = labels.place_at(text, anchor, direction);
            if !label.overlap_resolved {
                warn!(
                    owner = decl.id.as_str(),
                    label = text.as_str();
                    "Label overlap could not be resolved"
                );
                diagnostics.push(Diagnostic::LabelOverlapUnresolved {
                    owner: decl.id.clone(),
                    text: text.clone(),
                });
            }
            label
        });
        let debug_points = angle
            .debug
            .then(|| (g.start_point(marker.radius), g.end_point(marker.radius)));
        debug!(
            element = decl.id.as_str(),
            start = g.start_angle,
            sweep = g.sweep_angle;
            "Resolved angle",
        );

        angles.push(AngleLayout {
            id: decl.id.clone(),
            geometry: g,
            radius: marker.radius,
            arc,
            label,
            debug_points,
        });
    }
    (angles, failures)
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    if a_chars.is_empty() {
        return n;
    }
    if n == 0 {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut row = vec![0usize; n + 1];
    for (i, ca) in a_chars.iter().enumerate() {
        row[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(*ca != b_chars[j - 1]);
            row[j] = (prev[j] + 1).min(row[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[n]
}

/// Find similar identifiers within a maximum edit distance, closest first
pub(crate) fn find_similar<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    target: &str,
    max_distance: usize,
) -> Vec<String> {
    let mut matches: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|name| {
            let dist = levenshtein_distance(name, target);
            (dist <= max_distance && dist > 0).then_some((dist, name))
        })
        .collect();

    matches.sort();
    matches.dedup();
    matches
        .into_iter()
        .map(|(_, name)| name.to_string())
        .take(3)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{
        AnchorRef, AngleConfig, ArtboardConfig, ConnectionConfig, ElementDecl, FlowchartConfig,
        NodeConfig, PositionConstraint,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_levenshtein_same() {
        assert_eq!(levenshtein_distance("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_off() {
        assert_eq!(levenshtein_distance("server", "servr"), 1);
        assert_eq!(levenshtein_distance("server", "servar"), 1);
    }

    #[test]
    fn test_levenshtein_different() {
        assert_eq!(levenshtein_distance("cat", "dog"), 3);
        assert_eq!(levenshtein_distance("", "dog"), 3);
    }

    #[test]
    fn test_find_similar() {
        let defined = ["server", "client", "database"];
        let suggestions = find_similar(defined, "servr", 2);
        assert_eq!(suggestions, vec!["server".to_string()]);
    }

    #[test]
    fn test_find_similar_orders_by_distance() {
        let suggestions = find_similar(["ab", "a", "abc"], "abd", 2);
        assert_eq!(suggestions, vec!["ab", "abc", "a"]);
    }

    fn scene() -> Scene {
        Scene::new(ArtboardConfig {
            width: 400.0,
            height: 300.0,
            padding: 10.0,
        })
    }

    #[test]
    fn test_text_is_measured() {
        let scene = scene().with_element(ElementDecl::text("t", "abcd").positioned(
            PositionConstraint::new(
                "topLeft",
                AnchorRef::element("artboard", "contentBox.topLeft"),
                Point::origin(),
            ),
        ));
        let layout = layout_scene(
            &scene,
            &LayoutConfig::default(),
            &Theme::default(),
            &EstimatedTextMeasure::default(),
        )
        .unwrap();
        let t = layout.element("t").unwrap();
        assert_eq!(t.geometry.bounds().origin(), Point::new(10.0, 10.0));
        assert_eq!(t.geometry.bounds().width, 28.0);
        assert_eq!(t.text.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_degenerate_angle_is_reported_not_fatal() {
        let scene = scene()
            .with_element(ElementDecl::line("a", Point::new(0.0, 0.0), Point::new(10.0, 0.0)))
            .with_element(ElementDecl::line("b", Point::new(0.0, 5.0), Point::new(10.0, 5.0)))
            .with_element(ElementDecl::angle("ab", "a", "b", AngleKind::Inward, 5.0));
        let layout = layout_scene(
            &scene,
            &LayoutConfig::default(),
            &Theme::default(),
            &EstimatedTextMeasure::default(),
        )
        .unwrap();
        assert!(layout.angles.is_empty());
        assert_eq!(layout.failures.len(), 1);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::AngleFailed {
                element: "ab".to_string(),
                error: GeometryError::Parallel,
            }]
        );
    }

    fn labeled_chart(offset: f64) -> FlowchartConfig {
        FlowchartConfig {
            at: Some(Point::new(0.0, offset)),
            nodes: vec![
                NodeConfig::new("a", "A", Point::new(0.0, 100.0)).with_size(60.0, 40.0),
                NodeConfig::new("b", "B", Point::new(300.0, 100.0)).with_size(60.0, 40.0),
            ],
            connections: vec![ConnectionConfig::new("a", "b").with_label("same")],
            ..FlowchartConfig::default()
        }
    }

    #[test]
    fn test_labels_avoid_labels_of_other_flowcharts() {
        let scene = scene()
            .with_element(ElementDecl::flowchart("one", labeled_chart(0.0)))
            .with_element(ElementDecl::flowchart("two", labeled_chart(4.0)));
        let layout = layout_scene(
            &scene,
            &LayoutConfig::default(),
            &Theme::default(),
            &EstimatedTextMeasure::default(),
        )
        .unwrap();

        let label = |i: usize| layout.flowcharts[i].connections[0].label.clone().unwrap();
        let (first, second) = (label(0), label(1));
        assert_eq!(first.position, Point::new(180.0, 120.0));
        assert!(first.overlap_resolved && second.overlap_resolved);
        assert!(!first.bounds.intersects(&second.bounds));
        assert!(layout.diagnostics.is_empty());
    }

    #[test]
    fn test_angle_label_avoids_flowchart_nodes() {
        let chart = FlowchartConfig {
            nodes: vec![NodeConfig::new("n", "N", Point::new(110.0, 210.0)).with_size(20.0, 20.0)],
            ..FlowchartConfig::default()
        };
        let marker = AngleConfig {
            between: ["h".to_string(), "v".to_string()],
            kind: AngleKind::Inward,
            radius: 20.0,
            label: Some("x".to_string()),
            debug: false,
        };
        let scene = scene()
            .with_element(ElementDecl::flowchart("flow", chart))
            .with_element(ElementDecl::line(
                "h",
                Point::new(0.0, 200.0),
                Point::new(200.0, 200.0),
            ))
            .with_element(ElementDecl::line(
                "v",
                Point::new(100.0, 100.0),
                Point::new(100.0, 300.0),
            ))
            .with_element(ElementDecl::new("hv", ElementKind::Angle(marker)));
        let config = LayoutConfig::default();
        let layout = layout_scene(
            &scene,
            &config,
            &Theme::default(),
            &EstimatedTextMeasure::default(),
        )
        .unwrap();

        let label = layout.angle("hv").unwrap().label.as_ref().unwrap();
        let node = layout.flowcharts[0].node("n").unwrap().bounds;
        assert!(label.overlap_resolved);
        assert!(!label.bounds.intersects(&node.inflate(config.obstacle_inflation())));
    }

    #[test]
    fn test_smothered_angle_label_is_reported() {
        let chart = FlowchartConfig {
            nodes: vec![NodeConfig::new("n", "", Point::new(0.0, 100.0)).with_size(300.0, 200.0)],
            ..FlowchartConfig::default()
        };
        let marker = AngleConfig {
            between: ["h".to_string(), "v".to_string()],
            kind: AngleKind::Inward,
            radius: 20.0,
            label: Some("x".to_string()),
            debug: false,
        };
        let scene = scene()
            .with_element(ElementDecl::flowchart("flow", chart))
            .with_element(ElementDecl::line(
                "h",
                Point::new(0.0, 200.0),
                Point::new(200.0, 200.0),
            ))
            .with_element(ElementDecl::line(
                "v",
                Point::new(100.0, 100.0),
                Point::new(100.0, 300.0),
            ))
            .with_element(ElementDecl::new("hv", ElementKind::Angle(marker)));
        let layout = layout_scene(
            &scene,
            &LayoutConfig::default(),
            &Theme::default(),
            &EstimatedTextMeasure::default(),
        )
        .unwrap();

        let label = layout.angle("hv").unwrap().label.as_ref().unwrap();
        assert!(!label.overlap_resolved);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::LabelOverlapUnresolved {
                owner: "hv".to_string(),
                text: "x".to_string(),
            }]
        );
    }

    #[test]
    fn test_invalid_artboard() {
        let scene = Scene::new(ArtboardConfig {
            width: 0.0,
            height: 10.0,
            padding: 0.0,
        });
        assert!(matches!(
            layout_scene(
                &scene,
                &LayoutConfig::default(),
                &Theme::default(),
                &EstimatedTextMeasure::default()
            ),
            Err(LayoutError::InvalidLayout { .. })
        ));
    }
}
