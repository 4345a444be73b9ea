//! Content measurement used to size text, auto-sized nodes and labels

use super::types::Size;

/// Reports the intrinsic size of a piece of text
///
/// Layout treats this as a black box that runs before constraint resolution.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f64) -> Size;
}

/// Font-free estimate based on average glyph proportions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedTextMeasure {
    /// Average glyph width as a fraction of the font size
    pub char_width: f64,
    /// Line height as a fraction of the font size
    pub line_height: f64,
}

impl Default for EstimatedTextMeasure {
    fn default() -> Self {
        Self {
            char_width: 0.5,
            line_height: 1.2,
        }
    }
}

impl TextMeasure for EstimatedTextMeasure {
    fn measure(&self, text: &str, font_size: f64) -> Size {
        if text.is_empty() {
            return Size::new(0.0, 0.0);
        }
        let lines: Vec<&str> = text.lines().collect();
        let longest = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        Size::new(
            longest as f64 * font_size * self.char_width,
            lines.len().max(1) as f64 * font_size * self.line_height,
        )
    }
}
