//! Plain-text rendering of layout results
//!
//! The dump lists every computed coordinate in declaration order with fixed
//! number formatting, so two equal layouts always render to the same text.

use std::fmt::Write;

use crate::layout::element::ElementGeometry;
use crate::layout::{
    AngleLayout, BoundingBox, ConnectionLayout, FlowchartLayout, LabelLayout, Point, SceneLayout,
};

/// Build the dump line by line
struct TextBuilder {
    out: String,
    indent: usize,
}

impl TextBuilder {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Format a coordinate with at most two decimals and no negative zero
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let mut s = format!("{rounded:.2}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

fn point(p: Point) -> String {
    format!("{},{}", num(p.x), num(p.y))
}

fn rect(b: &BoundingBox) -> String {
    format!("{} {}x{}", point(b.origin()), num(b.width), num(b.height))
}

fn path(points: &[Point]) -> String {
    points.iter().map(|p| point(*p)).collect::<Vec<_>>().join(" ")
}

fn label(builder: &mut TextBuilder, label: &LabelLayout) {
    let mut text = format!("label {:?} at {}", label.text, point(label.position));
    if !label.overlap_resolved {
        text.push_str(" overlapping");
    }
    builder.line(text);
}

fn connection(builder: &mut TextBuilder, c: &ConnectionLayout) {
    builder.line(format!(
        "connection {} -> {} {}: {}",
        c.from,
        c.to,
        c.status.as_str(),
        path(&c.path)
    ));
    if let Some(l) = &c.label {
        builder.nested(|b| label(b, l));
    }
}

fn flowchart(builder: &mut TextBuilder, f: &FlowchartLayout) {
    builder.line(format!("flowchart {} {}", f.id, rect(&f.bounds)));
    builder.nested(|b| {
        for node in &f.nodes {
            b.line(format!(
                "node {} {} {:?} fill={}",
                node.id,
                rect(&node.bounds),
                node.text,
                node.colors.fill
            ));
        }
        for c in &f.connections {
            connection(b, c);
        }
    });
}

fn angle(builder: &mut TextBuilder, a: &AngleLayout) {
    let g = &a.geometry;
    builder.line(format!(
        "angle {} vertex {} start {} sweep {} radius {}",
        a.id,
        point(g.vertex),
        num(g.start_angle),
        num(g.sweep_angle),
        num(a.radius)
    ));
    builder.nested(|b| {
        if let Some(l) = &a.label {
            label(b, l);
        }
        if let Some((start, end)) = a.debug_points {
            b.line(format!("arc {} -> {}", point(start), point(end)));
        }
    });
}

/// Render a layout as deterministic text
pub fn render_text(layout: &SceneLayout) -> String {
    let mut builder = TextBuilder::new();
    builder.line(format!(
        "artboard {} padding {}",
        rect(&layout.artboard.border),
        num(layout.artboard.padding)
    ));

    for element in &layout.elements {
        let mut text = match &element.geometry {
            ElementGeometry::Box(model) if model.padding > 0.0 => format!(
                "{} {} {} padding {}",
                element.kind,
                element.id,
                rect(&model.border),
                num(model.padding)
            ),
            ElementGeometry::Line(line) => format!(
                "{} {} {} -> {}",
                element.kind,
                element.id,
                point(line.start),
                point(line.end)
            ),
            other => format!("{} {} {}", element.kind, element.id, rect(&other.bounds())),
        };
        if let Some(content) = &element.text {
            let _ = write!(text, " {content:?}");
        }
        if let Some(colors) = &element.colors {
            let _ = write!(text, " fill={}", colors.fill);
        }
        builder.line(text);
    }

    for f in &layout.flowcharts {
        flowchart(&mut builder, f);
    }
    for a in &layout.angles {
        angle(&mut builder, a);
    }
    for failure in &layout.failures {
        builder.line(format!("failed {}: {}", failure.id, failure.error));
    }
    for diagnostic in &layout.diagnostics {
        builder.line(format!("warning: {diagnostic}"));
    }
    builder.finish()
}

impl SceneLayout {
    /// Stable text rendering of every computed coordinate
    pub fn dump(&self) -> String {
        render_text(self)
    }
}
