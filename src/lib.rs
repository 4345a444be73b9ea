//! Tracery - declarative diagram geometry
//!
//! This library resolves anchor-based positioning constraints, computes angle
//! markers between lines and routes flowchart connectors around obstacles.
//! Scenes are declared in code or TOML; the result is a frozen [`SceneLayout`].
//!
//! # Example
//!
//! ```rust
//! use tracery::render;
//!
//! let dump = render(r#"
//! [[elements]]
//! id = "server"
//! kind = "shape"
//! width = 100
//! height = 50
//! "#).unwrap();
//! assert!(dump.contains("shape server 0,0 100x50"));
//! ```

pub mod error;
pub mod layout;
pub mod renderer;
pub mod scene;
pub mod theme;

pub use error::SceneFileError;
pub use layout::{
    layout_scene, Diagnostic, EstimatedTextMeasure, LayoutConfig, LayoutError, SceneLayout,
    TextMeasure,
};
pub use renderer::render_text;
pub use scene::Scene;
pub use theme::Theme;

use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// The scene source could not be read or parsed
    #[error("scene error: {0}")]
    Scene(#[from] SceneFileError),

    /// Error during layout
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// Configuration for the complete render pipeline
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Layout configuration
    pub layout: LayoutConfig,
    /// Tint palette for nodes and shapes
    pub theme: Theme,
    /// Text measurement used for text, auto-sized nodes and labels
    pub measure: EstimatedTextMeasure,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }

    /// Set the theme for tint resolution
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

/// Render a TOML scene to its text dump with default configuration
pub fn render(source: &str) -> Result<String, RenderError> {
    render_with_config(source, &RenderConfig::default())
}

/// Render a TOML scene to its text dump with custom configuration
///
/// # Example
///
/// ```rust
/// use tracery::{render_with_config, LayoutConfig, RenderConfig};
///
/// let config = RenderConfig::new().with_layout(LayoutConfig::default().with_grid_size(5.0));
/// let dump = render_with_config("[artboard]\nwidth = 200\nheight = 100\n", &config).unwrap();
/// assert_eq!(dump, "artboard 0,0 200x100 padding 0\n");
/// ```
pub fn render_with_config(source: &str, config: &RenderConfig) -> Result<String, RenderError> {
    Ok(layout_source(source, config)?.dump())
}

/// Parse a TOML scene and lay it out
pub fn layout_source(source: &str, config: &RenderConfig) -> Result<SceneLayout, RenderError> {
    let scene: Scene = source.parse()?;
    let layout = layout_scene(&scene, &config.layout, &config.theme, &config.measure)?;
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_positioned_shape() {
        let dump = render(
            r#"
[artboard]
width = 400
height = 300
padding = 20

[[elements]]
id = "box"
kind = "shape"
width = 100
height = 50
tint = "blue"

[elements.position]
relative_to = "artboard.contentBox.topLeft"
"#,
        )
        .unwrap();
        insta::assert_snapshot!(dump, @r"
        artboard 0,0 400x300 padding 20
        shape box 20,20 100x50 fill=#e3f2fd
        ");
    }

    #[test]
    fn test_render_angle() {
        let dump = render(
            r#"
[[elements]]
id = "h"
kind = "line"
start = { x = 100, y = 300 }
end = { x = 500, y = 300 }

[[elements]]
id = "v"
kind = "line"
start = { x = 300, y = 150 }
end = { x = 300, y = 450 }

[[elements]]
id = "corner"
kind = "angle"
between = ["h", "v"]
radius = 20
"#,
        )
        .unwrap();
        assert!(dump.contains("angle corner vertex 300,300 start 0 sweep 90 radius 20"));
    }

    #[test]
    fn test_render_bad_toml_is_scene_error() {
        let err = render("[[elements]]\nid = \"x\"\nkind = \"blob\"\n").unwrap_err();
        assert!(matches!(err, RenderError::Scene(SceneFileError::Parse { .. })));
    }

    #[test]
    fn test_render_undefined_reference_error() {
        let err = render(
            r#"
[[elements]]
id = "a"
kind = "shape"
width = 10
height = 10

[elements.position]
relative_to = "ghost.center"
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Layout(LayoutError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_render_is_repeatable() {
        let source = "[[elements]]\nid = \"t\"\nkind = \"text\"\ncontent = \"hi\"\n";
        assert_eq!(render(source).unwrap(), render(source).unwrap());
    }
}
