//! Configuration for the layout engine

use super::error::LayoutError;

/// Configuration options for layout computation
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Side length of a routing grid cell
    pub grid_size: f64,

    /// Minimum clearance between a connector and a node (half is applied per side)
    pub min_spacing: f64,

    /// Padding added around each node before routing
    pub node_padding: f64,

    /// Upper bound on routing grid cells per flowchart
    pub max_grid_cells: usize,

    /// Allow diagonal moves in the routing grid
    pub diagonal_moves: bool,

    /// Penalize cells already used by earlier connectors
    pub avoid_connectors: bool,

    /// Extra cost, in grid steps, for entering a cell another connector uses
    pub connector_penalty: f64,

    /// Perpendicular distance moved per label placement attempt
    pub label_nudge: f64,

    /// Number of nudges tried on each side of a connector
    pub label_attempts: usize,

    /// Padding around label text when testing for overlap
    pub label_padding: f64,

    /// Number of segments used to sample angle arcs
    pub arc_resolution: usize,

    /// Distance between an angle arc and its label
    pub label_gap: f64,

    /// Padding between node text and node border for auto-sized nodes
    pub node_text_padding: f64,

    /// Default font size for text and labels
    pub font_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            min_spacing: 20.0,
            node_padding: 10.0,
            max_grid_cells: 250_000,
            diagonal_moves: false,
            avoid_connectors: false,
            connector_penalty: 2.0,
            label_nudge: 12.0,
            label_attempts: 6,
            label_padding: 4.0,
            arc_resolution: 32,
            label_gap: 8.0,
            node_text_padding: 12.0,
            font_size: 14.0,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the routing grid cell size
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the minimum connector clearance
    pub fn with_min_spacing(mut self, min_spacing: f64) -> Self {
        self.min_spacing = min_spacing;
        self
    }

    /// Set the node padding used for obstacles
    pub fn with_node_padding(mut self, node_padding: f64) -> Self {
        self.node_padding = node_padding;
        self
    }

    /// Set the routing grid cell budget
    pub fn with_max_grid_cells(mut self, max_grid_cells: usize) -> Self {
        self.max_grid_cells = max_grid_cells;
        self
    }

    pub fn with_diagonal_moves(mut self, enabled: bool) -> Self {
        self.diagonal_moves = enabled;
        self
    }

    pub fn with_connector_avoidance(mut self, enabled: bool) -> Self {
        self.avoid_connectors = enabled;
        self
    }

    /// Set how labels are nudged off obstacles
    pub fn with_label_nudge(mut self, nudge: f64, attempts: usize) -> Self {
        self.label_nudge = nudge;
        self.label_attempts = attempts;
        self
    }

    /// Distance by which node boxes are grown to form routing obstacles
    pub fn obstacle_inflation(&self) -> f64 {
        self.node_padding + self.min_spacing / 2.0
    }

    /// Reject values that would make routing meaningless or unbounded
    pub fn validate(&self) -> Result<(), LayoutError> {
        let positive = [
            ("grid_size", self.grid_size),
            ("min_spacing", self.min_spacing),
            ("node_padding", self.node_padding),
            ("font_size", self.font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::invalid_config(
                    name,
                    format!("must be a positive number, got {value}"),
                ));
            }
        }
        let non_negative = [
            ("connector_penalty", self.connector_penalty),
            ("label_nudge", self.label_nudge),
            ("label_padding", self.label_padding),
            ("label_gap", self.label_gap),
            ("node_text_padding", self.node_text_padding),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LayoutError::invalid_config(
                    name,
                    format!("must not be negative, got {value}"),
                ));
            }
        }
        if self.max_grid_cells == 0 {
            return Err(LayoutError::invalid_config(
                "max_grid_cells",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
