//! Tint palettes for flowchart nodes and connectors
//!
//! A theme is an explicit context value handed to the layout pass. There is no
//! process-wide registry: callers that want a different palette load one and
//! pass it in.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing themes
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("failed to read theme file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse theme TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Colors derived from a single tint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TintColors {
    pub fill: String,
    pub stroke: String,
    pub text: String,
}

impl TintColors {
    fn new(fill: &str, stroke: &str, text: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            text: text.to_string(),
        }
    }
}

/// A named set of tints
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: Option<String>,
    /// Colors used when no tint, or an unknown tint, is requested
    pub neutral: TintColors,
    pub tints: BTreeMap<String, TintColors>,
}

#[derive(Deserialize)]
struct TomlTheme {
    metadata: Option<TomlMetadata>,
    neutral: Option<TintColors>,
    #[serde(default)]
    tints: BTreeMap<String, TintColors>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

/// Built-in palette: (tint, fill, stroke, text)
const DEFAULT_TINTS: [(&str, &str, &str, &str); 6] = [
    ("blue", "#e3f2fd", "#1565c0", "#0d47a1"),
    ("green", "#e8f5e9", "#2e7d32", "#1b5e20"),
    ("orange", "#fff3e0", "#e65100", "#bf360c"),
    ("red", "#ffebee", "#c62828", "#b71c1c"),
    ("purple", "#f3e5f5", "#6a1b9a", "#4a148c"),
    ("gray", "#f5f5f5", "#616161", "#212121"),
];

impl Theme {
    /// Load a theme from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ThemeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a theme from a TOML string; tints not listed fall back to the built-in palette
    pub fn from_toml(content: &str) -> Result<Self, ThemeError> {
        let parsed: TomlTheme = toml::from_str(content)?;
        let mut theme = Self::default();
        theme.name = parsed.metadata.and_then(|m| m.name);
        if let Some(neutral) = parsed.neutral {
            theme.neutral = neutral;
        }
        theme.tints.extend(parsed.tints);
        Ok(theme)
    }

    /// Resolve a tint name to concrete colors
    pub fn resolve(&self, tint: Option<&str>) -> &TintColors {
        match tint {
            None => &self.neutral,
            Some(name) => self.tints.get(name).unwrap_or_else(|| {
                debug!(tint = name; "Unknown tint, using neutral colors");
                &self.neutral
            }),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        let tints = DEFAULT_TINTS
            .iter()
            .map(|(name, fill, stroke, text)| {
                (name.to_string(), TintColors::new(fill, stroke, text))
            })
            .collect();
        Self {
            name: None,
            neutral: TintColors::new("#ffffff", "#333333", "#333333"),
            tints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = Theme::default();
        assert_eq!(theme.resolve(Some("blue")).stroke, "#1565c0");
        assert_eq!(theme.resolve(None).fill, "#ffffff");
    }

    #[test]
    fn test_unknown_tint_is_neutral() {
        let theme = Theme::default();
        assert_eq!(theme.resolve(Some("chartreuse")), &theme.neutral);
    }

    #[test]
    fn test_parse_toml_overrides() {
        let toml_str = r##"
[metadata]
name = "Night"

[neutral]
fill = "#000000"
stroke = "#eeeeee"
text = "#ffffff"

[tints.blue]
fill = "#001133"
stroke = "#3399ff"
text = "#ccddff"
"##;
        let theme = Theme::from_toml(toml_str).expect("Should parse");
        assert_eq!(theme.name, Some("Night".to_string()));
        assert_eq!(theme.resolve(None).fill, "#000000");
        assert_eq!(theme.resolve(Some("blue")).fill, "#001133");
        // Built-in tints survive
        assert_eq!(theme.resolve(Some("green")).stroke, "#2e7d32");
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = Theme::from_toml("this is not valid toml {{{{");
        assert!(matches!(result, Err(ThemeError::Parse(_))));
    }
}
