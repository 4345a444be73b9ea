//! Scene declarations: the typed input to a layout pass
//!
//! Each element kind has its own configuration struct. Scenes can be built in
//! code or loaded from TOML; keys a struct does not know are ignored so that
//! styling options meant for other collaborators pass through harmlessly.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::SceneFileError;
use crate::layout::geometry::AngleKind;
use crate::layout::{Line, Point};

/// Id under which the artboard is addressable
pub const ARTBOARD_ID: &str = "artboard";

/// A complete scene: the artboard and the elements drawn on it
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub artboard: ArtboardConfig,
    #[serde(default)]
    pub elements: Vec<ElementDecl>,
}

/// Root drawing area; its content box is the usual positioning reference
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ArtboardConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub padding: f64,
}

impl Default for ArtboardConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            padding: 0.0,
        }
    }
}

/// One declared element
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElementDecl {
    pub id: String,
    #[serde(default)]
    pub position: Option<PositionConstraint>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Closed set of element kinds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    Shape(ShapeConfig),
    Text(TextConfig),
    Line(LineConfig),
    Angle(AngleConfig),
    Flowchart(FlowchartConfig),
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shape(_) => "shape",
            Self::Text(_) => "text",
            Self::Line(_) => "line",
            Self::Angle(_) => "angle",
            Self::Flowchart(_) => "flowchart",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Ellipse,
}

/// Box-shaped element with an explicit size
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapeConfig {
    #[serde(default)]
    pub shape: ShapeKind,
    pub width: f64,
    pub height: f64,
    /// Box-model padding between the border and the content box
    #[serde(default)]
    pub padding: f64,
    /// Origin used when the element has no position constraint
    #[serde(default)]
    pub at: Option<Point>,
    #[serde(default)]
    pub tint: Option<String>,
}

/// Text sized by the content measurement collaborator
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextConfig {
    pub content: String,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub padding: f64,
    #[serde(default)]
    pub at: Option<Point>,
    #[serde(default)]
    pub tint: Option<String>,
}

/// Straight line; a position constraint moves it as a whole
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LineConfig {
    pub start: Point,
    pub end: Point,
}

impl LineConfig {
    pub fn line(&self) -> Line {
        Line::new(self.start, self.end)
    }
}

/// Angle marker between two line elements
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AngleConfig {
    pub between: [String; 2],
    #[serde(rename = "type", default)]
    pub kind: AngleKind,
    pub radius: f64,
    #[serde(default)]
    pub label: Option<String>,
    /// Also expose the arc's computed end points
    #[serde(default)]
    pub debug: bool,
}

/// Flowchart with nodes placed in its local frame and routed connections
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FlowchartConfig {
    #[serde(default)]
    pub at: Option<Point>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    /// Overrides for the layout configuration defaults
    #[serde(default)]
    pub min_spacing: Option<f64>,
    #[serde(default)]
    pub node_padding: Option<f64>,
    #[serde(default)]
    pub grid_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub position: Point,
    /// Measured from the text when absent
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub tint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionConfig {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub from_anchor: Option<String>,
    #[serde(default)]
    pub to_anchor: Option<String>,
}

/// Place `relative_from` on this element at `relative_to` plus `offset`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionConstraint {
    #[serde(default = "default_relative_from")]
    pub relative_from: String,
    pub relative_to: AnchorRef,
    #[serde(default)]
    pub offset: Point,
}

fn default_relative_from() -> String {
    "topLeft".to_string()
}

/// Element addressed by a reference: a top-level element or a flowchart node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    pub element: String,
    pub node: Option<String>,
}

impl ElementPath {
    pub fn element(id: impl Into<String>) -> Self {
        Self {
            element: id.into(),
            node: None,
        }
    }

    pub fn node(flowchart: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            element: flowchart.into(),
            node: Some(node.into()),
        }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "{}.{}", self.element, node),
            None => write!(f, "{}", self.element),
        }
    }
}

/// A point some other element provides
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAnchorRef")]
pub enum AnchorRef {
    /// Named anchor on an element, e.g. `artboard.contentBox.topLeft` or `flow.build.center`
    Element { target: ElementPath, anchor: String },
    /// Intersection of two line elements, written `intersection(a, b)`
    Intersection { first: String, second: String },
    /// Absolute coordinate
    Point(Point),
}

impl AnchorRef {
    pub fn element(id: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self::Element {
            target: ElementPath::element(id),
            anchor: anchor.into(),
        }
    }

    pub fn node(
        flowchart: impl Into<String>,
        node: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        Self::Element {
            target: ElementPath::node(flowchart, node),
            anchor: anchor.into(),
        }
    }

    pub fn intersection(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::Intersection {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Parse the textual reference form.
    ///
    /// The anchor is the last dotted segment, or the last two when the first of
    /// them is `contentBox`. What precedes it names an element, optionally
    /// followed by a flowchart node id.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if let Some(inner) = text
            .strip_prefix("intersection(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
            return match parts.as_slice() {
                [a, b] if !a.is_empty() && !b.is_empty() => Ok(Self::intersection(*a, *b)),
                _ => Err(format!("intersection needs exactly two line ids: '{text}'")),
            };
        }

        let segments: Vec<&str> = text.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(format!("malformed anchor reference '{text}'"));
        }
        let anchor_len = if segments.len() >= 3 && segments[segments.len() - 2] == "contentBox" {
            2
        } else {
            1
        };
        if segments.len() <= anchor_len {
            return Err(format!(
                "anchor reference '{text}' must name an element and an anchor"
            ));
        }
        let (path, anchor) = segments.split_at(segments.len() - anchor_len);
        let target = match path {
            [element] => ElementPath::element(*element),
            [flowchart, node] => ElementPath::node(*flowchart, *node),
            _ => return Err(format!("too many path segments in '{text}'")),
        };
        Ok(Self::Element {
            target,
            anchor: anchor.join("."),
        })
    }
}

impl fmt::Display for AnchorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element { target, anchor } => write!(f, "{target}.{anchor}"),
            Self::Intersection { first, second } => write!(f, "intersection({first}, {second})"),
            Self::Point(p) => write!(f, "({}, {})", p.x, p.y),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnchorRef {
    Text(String),
    Point(Point),
}

impl TryFrom<RawAnchorRef> for AnchorRef {
    type Error = String;

    fn try_from(raw: RawAnchorRef) -> Result<Self, Self::Error> {
        match raw {
            RawAnchorRef::Text(text) => AnchorRef::parse(&text),
            RawAnchorRef::Point(p) => Ok(AnchorRef::Point(p)),
        }
    }
}

impl PositionConstraint {
    pub fn new(relative_from: impl Into<String>, relative_to: AnchorRef, offset: Point) -> Self {
        Self {
            relative_from: relative_from.into(),
            relative_to,
            offset,
        }
    }
}

impl ElementDecl {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            position: None,
            kind,
        }
    }

    /// Rectangle of the given size
    pub fn rect(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self::new(
            id,
            ElementKind::Shape(ShapeConfig {
                shape: ShapeKind::Rect,
                width,
                height,
                padding: 0.0,
                at: None,
                tint: None,
            }),
        )
    }

    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            id,
            ElementKind::Text(TextConfig {
                content: content.into(),
                font_size: None,
                padding: 0.0,
                at: None,
                tint: None,
            }),
        )
    }

    pub fn line(id: impl Into<String>, start: Point, end: Point) -> Self {
        Self::new(id, ElementKind::Line(LineConfig { start, end }))
    }

    pub fn angle(
        id: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        kind: AngleKind,
        radius: f64,
    ) -> Self {
        Self::new(
            id,
            ElementKind::Angle(AngleConfig {
                between: [first.into(), second.into()],
                kind,
                radius,
                label: None,
                debug: false,
            }),
        )
    }

    pub fn flowchart(id: impl Into<String>, config: FlowchartConfig) -> Self {
        Self::new(id, ElementKind::Flowchart(config))
    }

    /// Attach a position constraint
    pub fn positioned(mut self, constraint: PositionConstraint) -> Self {
        self.position = Some(constraint);
        self
    }

    /// Set the unconstrained origin of a shape, text or flowchart
    pub fn at(mut self, origin: Point) -> Self {
        match &mut self.kind {
            ElementKind::Shape(c) => c.at = Some(origin),
            ElementKind::Text(c) => c.at = Some(origin),
            ElementKind::Flowchart(c) => c.at = Some(origin),
            ElementKind::Line(_) | ElementKind::Angle(_) => {}
        }
        self
    }
}

impl NodeConfig {
    pub fn new(id: impl Into<String>, text: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            position,
            width: None,
            height: None,
            tint: None,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

impl ConnectionConfig {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            from_anchor: None,
            to_anchor: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_anchors(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_anchor = Some(from.into());
        self.to_anchor = Some(to.into());
        self
    }
}

impl Scene {
    pub fn new(artboard: ArtboardConfig) -> Self {
        Self {
            artboard,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: ElementDecl) -> Self {
        self.elements.push(element);
        self
    }

    /// Load a scene from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SceneFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a scene from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SceneFileError> {
        toml::from_str(content).map_err(SceneFileError::from)
    }

    pub fn element(&self, id: &str) -> Option<&ElementDecl> {
        self.elements.iter().find(|e| e.id == id)
    }
}

impl FromStr for Scene {
    type Err = SceneFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml(s)
    }
}
