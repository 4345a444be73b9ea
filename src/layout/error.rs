//! Error and diagnostic types for the layout engine

use std::fmt;

use thiserror::Error;

use super::geometry::GeometryError;

/// Structural errors that abort a layout pass
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Reference to an element id that is not part of the scene
    #[error("unknown element '{id}'{}", format_suggestions(suggestions))]
    DanglingReference { id: String, suggestions: Vec<String> },

    /// Circular dependency in position constraints
    #[error("circular constraint dependency: {}", cycle.join(" -> "))]
    CyclicConstraint { cycle: Vec<String> },

    /// Anchor name that the referenced element does not expose
    #[error("invalid anchor '{anchor}' on element '{element}' (valid anchors: {valid_anchors})")]
    UnknownAnchor {
        element: String,
        anchor: String,
        valid_anchors: String,
    },

    /// Two declarations share an id
    #[error("duplicate element id '{id}'")]
    DuplicateId { id: String },

    /// Invalid element declaration
    #[error("invalid layout for element '{element}': {reason}")]
    InvalidLayout { element: String, reason: String },

    /// Invalid layout configuration value
    #[error("invalid configuration '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Routing grid would exceed the configured cell budget
    #[error("routing grid for '{flowchart}' needs {cells} cells (limit {max}); increase grid_size")]
    GridTooLarge {
        flowchart: String,
        cells: usize,
        max: usize,
    },

    /// Geometry needed for positioning could not be computed
    #[error("geometry error on '{element}': {source}")]
    Geometry {
        element: String,
        #[source]
        source: GeometryError,
    },
}

impl LayoutError {
    /// Create a dangling reference error with suggestions
    pub fn dangling(id: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::DanglingReference {
            id: id.into(),
            suggestions,
        }
    }

    /// Create a circular constraint error
    pub fn cyclic(cycle: Vec<String>) -> Self {
        Self::CyclicConstraint { cycle }
    }

    /// Create an unknown anchor error listing what the element does offer
    pub fn unknown_anchor(
        element: impl Into<String>,
        anchor: impl Into<String>,
        valid_anchors: Vec<String>,
    ) -> Self {
        Self::UnknownAnchor {
            element: element.into(),
            anchor: anchor.into(),
            valid_anchors: valid_anchors.join(", "),
        }
    }

    /// Create an invalid layout error
    pub fn invalid_layout(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLayout {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn geometry(element: impl Into<String>, source: GeometryError) -> Self {
        Self::Geometry {
            element: element.into(),
            source,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Non-fatal outcomes recorded while laying out a scene
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// No collision-free route; the connection was drawn as a straight fallback
    UnreachableRoute { from: String, to: String },

    /// A label ran out of nudge attempts and may overlap something
    LabelOverlapUnresolved { owner: String, text: String },

    /// An angle marker could not be computed and was left out
    AngleFailed { element: String, error: GeometryError },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreachableRoute { from, to } => {
                write!(f, "no route from '{from}' to '{to}', using a direct segment")
            }
            Self::LabelOverlapUnresolved { owner, text } => {
                write!(f, "label '{text}' on '{owner}' could not avoid overlap")
            }
            Self::AngleFailed { element, error } => {
                write!(f, "angle '{element}' skipped: {error}")
            }
        }
    }
}
