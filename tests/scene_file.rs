//! Loading scenes from TOML files and laying them out end to end.

use std::path::{Path, PathBuf};

use tracery::layout::{HasAnchors, Point, RouteStatus};
use tracery::{
    layout_scene, render_with_config, EstimatedTextMeasure, LayoutConfig, RenderConfig, Scene,
    SceneFileError, Theme,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn release() -> Scene {
    Scene::from_file(&fixture("release.toml")).expect("fixture should load")
}

#[test]
fn test_fixture_lays_out_without_diagnostics() {
    let layout = layout_scene(
        &release(),
        &LayoutConfig::default(),
        &Theme::default(),
        &EstimatedTextMeasure::default(),
    )
    .unwrap();
    assert!(layout.diagnostics.is_empty(), "{:?}", layout.diagnostics);
    assert!(layout.failures.is_empty());

    let title = layout.element("title").unwrap();
    assert_eq!(title.geometry.bounds().origin(), Point::new(20.0, 20.0));
    assert_eq!(title.colors.as_ref().unwrap().fill, "#e3f2fd");

    let flow = layout.flowchart("flow").unwrap();
    assert_eq!(flow.node("fix-bugs").unwrap().colors.fill, "#fff3e0");
    assert_eq!(
        flow.connection("build", "test").unwrap().path,
        vec![Point::new(530.0, 210.0), Point::new(530.0, 240.0)]
    );
    let feedback = flow.connection("fix-bugs", "build").unwrap();
    assert_eq!(feedback.status, RouteStatus::Routed);
    assert_eq!(feedback.label.as_ref().unwrap().text, "retry");

    let note = layout.element("note").unwrap();
    let left = note.geometry.anchor("centerLeft").unwrap();
    assert!(left.approx_eq(Point::new(622.0, 270.0), 1e-9));

    let corner = layout.angle("corner").unwrap();
    assert!(corner.geometry.vertex.approx_eq(Point::new(200.0, 500.0), 1e-9));
    assert!((corner.geometry.start_angle - 90.0).abs() < 1e-9);
    assert!((corner.geometry.sweep_angle - 270.0).abs() < 1e-9);
    let (start, end) = corner.debug_points.unwrap();
    assert!(start.approx_eq(Point::new(200.0, 524.0), 1e-9));
    assert!(end.approx_eq(Point::new(224.0, 500.0), 1e-9));
    assert_eq!(corner.arc.len(), 33);
    assert!(corner.label.is_some());
}

#[test]
fn test_fixture_dump() {
    let source = std::fs::read_to_string(fixture("release.toml")).unwrap();
    let dump = render_with_config(&source, &RenderConfig::default()).unwrap();
    let lines: Vec<&str> = dump.lines().collect();

    assert_eq!(lines[0], "artboard 0,0 800x600 padding 20");
    assert_eq!(lines[1], "text title 20,20 160x24 \"Release pipeline\" fill=#e3f2fd");
    assert!(dump.contains("  connection build -> test direct: 530,210 530,240\n"));
    assert!(dump.contains("  connection fix-bugs -> build routed: 390,360 "));
    assert!(dump.contains("angle corner vertex 200,500 start 90 sweep 270 radius 24\n"));
    assert!(dump.contains("\n  arc 200,524 -> 224,500\n"));
    assert!(!dump.contains("warning:"));
}

#[test]
fn test_from_str_matches_from_file() {
    let source = std::fs::read_to_string(fixture("release.toml")).unwrap();
    let parsed: Scene = source.parse().unwrap();
    assert_eq!(parsed, release());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Scene::from_file(&fixture("does-not-exist.toml")).unwrap_err();
    assert!(matches!(err, SceneFileError::Io(_)));
}

#[test]
fn test_parse_error_report_points_at_source() {
    let source = "[[elements]]\nid = \"a\"\nkind = \"shape\"\nwidth = \"wide\"\nheight = 10\n";
    let err = source.parse::<Scene>().unwrap_err();
    assert!(matches!(err, SceneFileError::Parse { .. }));

    let report = err.format(source, "broken.toml");
    assert!(report.contains("broken.toml"));
}

#[test]
fn test_bad_anchor_reference_is_parse_error() {
    let source = r#"
[[elements]]
id = "a"
kind = "shape"
width = 10
height = 10

[elements.position]
relative_to = "artboard"
"#;
    let err = source.parse::<Scene>().unwrap_err();
    assert!(err.to_string().contains("must name an element and an anchor"));
}
