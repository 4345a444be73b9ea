//! Flowchart layout: node sizing, connection routing and connection labels

use std::collections::HashSet;

use log::{debug, warn};

use crate::scene::FlowchartConfig;
use crate::theme::Theme;

use super::anchors::HasAnchors;
use super::config::LayoutConfig;
use super::element::{ElementGeometry, NodeBox};
use super::error::{Diagnostic, LayoutError};
use super::find_similar;
use super::labels::LabelPlacer;
use super::measure::TextMeasure;
use super::obstacles::ObstacleSet;
use super::routing::{best_edges, Endpoint, Router};
use super::types::{
    BoundingBox, ConnectionLayout, FlowchartLayout, NodeLayout, Point, RouteStatus, Size,
};

/// Layout configuration with the flowchart's own overrides applied
pub fn effective_config(
    base: &LayoutConfig,
    flowchart: &FlowchartConfig,
) -> Result<LayoutConfig, LayoutError> {
    let mut config = base.clone();
    if let Some(v) = flowchart.min_spacing {
        config.min_spacing = v;
    }
    if let Some(v) = flowchart.node_padding {
        config.node_padding = v;
    }
    if let Some(v) = flowchart.grid_size {
        config.grid_size = v;
    }
    config.validate()?;
    Ok(config)
}

/// Node boxes at the flowchart's declared location.
///
/// Node positions are relative to the flowchart origin. Nodes without an
/// explicit size are sized from their text plus the node text padding.
pub fn flowchart_geometry(
    id: &str,
    flowchart: &FlowchartConfig,
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
) -> Result<ElementGeometry, LayoutError> {
    let origin = flowchart.at.unwrap_or_default();
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(flowchart.nodes.len());
    let mut bounds = BoundingBox::new(origin.x, origin.y, 0.0, 0.0);

    for node in &flowchart.nodes {
        let path = format!("{id}.{}", node.id);
        if node.id.is_empty() || node.id.contains('.') {
            return Err(LayoutError::invalid_layout(
                path,
                "node ids must be non-empty and must not contain '.'",
            ));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(LayoutError::DuplicateId { id: path });
        }

        let size = node_size(node.width, node.height, &node.text, config, measure);
        if !(size.width >= 0.0 && size.height >= 0.0) {
            return Err(LayoutError::invalid_layout(path, "node size must not be negative"));
        }
        let node_bounds = BoundingBox::from_origin_size(origin + node.position, size);
        bounds = bounds.union(&node_bounds);
        nodes.push(NodeBox {
            id: node.id.clone(),
            bounds: node_bounds,
        });
    }
    Ok(ElementGeometry::Flowchart { bounds, nodes })
}

fn node_size(
    width: Option<f64>,
    height: Option<f64>,
    text: &str,
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
) -> Size {
    match (width, height) {
        (Some(w), Some(h)) => Size::new(w, h),
        _ => {
            let text_size = measure.measure(text, config.font_size);
            let pad = config.node_text_padding * 2.0;
            Size::new(
                width.unwrap_or(text_size.width + pad),
                height.unwrap_or(text_size.height + pad),
            )
        }
    }
}

/// Node boxes grown by the flowchart's routing inflation, for label placement
pub fn label_blockers(geometry: &ElementGeometry, config: &LayoutConfig) -> Vec<BoundingBox> {
    match geometry {
        ElementGeometry::Flowchart { nodes, .. } => nodes
            .iter()
            .map(|n| n.bounds.inflate(config.obstacle_inflation()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Route every connection of a positioned flowchart and label the routes.
///
/// Connections are routed in declaration order; non-fatal problems are
/// appended to `diagnostics`. Labels go through the scene-wide `labels` so
/// they avoid labels placed by earlier flowcharts.
pub fn layout_flowchart(
    id: &str,
    flowchart: &FlowchartConfig,
    geometry: &ElementGeometry,
    config: &LayoutConfig,
    theme: &Theme,
    labels: &mut LabelPlacer<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<FlowchartLayout, LayoutError> {
    let (bounds, boxes) = match geometry {
        ElementGeometry::Flowchart { bounds, nodes } => (*bounds, nodes.as_slice()),
        _ => return Err(LayoutError::invalid_layout(id, "expected flowchart geometry")),
    };

    let nodes: Vec<NodeLayout> = flowchart
        .nodes
        .iter()
        .zip(boxes)
        .map(|(decl, placed)| NodeLayout {
            id: decl.id.clone(),
            text: decl.text.clone(),
            bounds: placed.bounds,
            colors: theme.resolve(decl.tint.as_deref()).clone(),
        })
        .collect();

    let find_node = |node_id: &str| {
        boxes.iter().find(|n| n.id == node_id).ok_or_else(|| {
            let suggestions = find_similar(boxes.iter().map(|n| n.id.as_str()), node_id, 2)
                .into_iter()
                .map(|s| format!("{id}.{s}"))
                .collect();
            LayoutError::dangling(format!("{id}.{node_id}"), suggestions)
        })
    };

    let mut endpoints = Vec::with_capacity(flowchart.connections.len());
    for connection in &flowchart.connections {
        let from = find_node(&connection.from)?;
        let to = find_node(&connection.to)?;
        let (from_edge, to_edge) = best_edges(&from.bounds, &to.bounds);
        let start = match &connection.from_anchor {
            Some(name) => Endpoint::new(&from.id, from.bounds, node_anchor(id, from, name)?),
            None => Endpoint::on_edge(&from.id, from.bounds, from_edge),
        };
        let end = match &connection.to_anchor {
            Some(name) => Endpoint::new(&to.id, to.bounds, node_anchor(id, to, name)?),
            None => Endpoint::on_edge(&to.id, to.bounds, to_edge),
        };
        endpoints.push((start, end));
    }

    let mut connections = Vec::with_capacity(endpoints.len());
    if !endpoints.is_empty() {
        let obstacles = ObstacleSet::from_nodes(boxes, config.obstacle_inflation());
        let anchors: Vec<Point> = endpoints
            .iter()
            .flat_map(|(s, e)| [s.anchor, e.anchor])
            .collect();
        let mut router = Router::new(id, &obstacles, &anchors, config)?;

        for (connection, (start, end)) in flowchart.connections.iter().zip(&endpoints) {
            let route = router.route(start, end);
            debug!(
                flowchart = id,
                from = connection.from.as_str(),
                to = connection.to.as_str(),
                status = route.status.as_str(),
                points = route.path.len();
                "Routed connection",
            );
            if route.status == RouteStatus::Unrouted {
                warn!(
                    flowchart = id,
                    from = connection.from.as_str(),
                    to = connection.to.as_str();
                    "No collision-free route, drawing a direct segment",
                );
                diagnostics.push(Diagnostic::UnreachableRoute {
                    from: format!("{id}.{}", connection.from),
                    to: format!("{id}.{}", connection.to),
                });
            }
            connections.push(ConnectionLayout {
                from: connection.from.clone(),
                to: connection.to.clone(),
                path: route.path,
                status: route.status,
                label: None,
            });
        }
    }

    for (layout, connection) in connections.iter_mut().zip(&flowchart.connections) {
        let Some(text) = &connection.label else {
            continue;
        };
        let label = labels.place_on_path(text, &layout.path);
        if !label.overlap_resolved {
            let owner = format!("{id}.{}->{}", connection.from, connection.to);
            warn!(
                owner = owner.as_str(),
                label = text.as_str();
                "Label overlap could not be resolved"
            );
            diagnostics.push(Diagnostic::LabelOverlapUnresolved {
                owner,
                text: text.clone(),
            });
        }
        layout.label = Some(label);
    }

    Ok(FlowchartLayout {
        id: id.to_string(),
        bounds,
        nodes,
        connections,
    })
}

fn node_anchor(flowchart: &str, node: &NodeBox, name: &str) -> Result<Point, LayoutError> {
    node.bounds.anchor(name).ok_or_else(|| {
        LayoutError::unknown_anchor(
            format!("{flowchart}.{}", node.id),
            name,
            node.bounds.anchors().names(),
        )
    })
}
