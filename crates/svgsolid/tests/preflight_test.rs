use svgsolid::*;

const OPEN_TRIANGLE: &str = include_str!("data/open_triangle.svg");
const OPEN_LINE: &str = include_str!("data/open_line.svg");
const BADGE: &str = include_str!("data/badge.svg");
const SQUARE_WITH_HOLE: &str = include_str!("data/square_with_hole.svg");

fn preflight(markup: &str, settings: ProfileSettings) -> PreflightResult {
    let pipeline = GeometryPipeline::new(settings);
    let parsed = pipeline.parse(markup).expect("Failed to parse fixture");
    pipeline.preflight(&parsed)
}

#[test]
fn test_single_open_triangle_passes_with_one_warning() {
    let result = preflight(OPEN_TRIANGLE, ProfileSettings::default());
    assert!(result.passed, "Issues: {:?}", result.issues);
    assert_eq!(result.count(Severity::Warning), 1);
    assert_eq!(result.count(Severity::Error), 0);
    assert!(result.issues[0].message.contains("open path"));
    assert_eq!(result.stats.open_paths, 1);
    assert_eq!(result.stats.closed_paths, 0);
}

#[test]
fn test_open_stroke_without_closed_paths_fails() {
    let result = preflight(OPEN_LINE, ProfileSettings::default());
    assert!(!result.passed);
    assert!(result.count(Severity::Error) >= 1);
    assert!(result.errors().any(|i| i.message.contains("No closed shapes")));
}

#[test]
fn test_unsupported_features_are_reported() {
    let result = preflight(BADGE, ProfileSettings::default());
    assert!(result.passed, "Issues: {:?}", result.issues);
    let messages: Vec<&str> = result.issues.iter().map(|i| i.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("text element")), "{messages:?}");
    assert!(messages.iter().any(|m| m.contains("stroke-only")), "{messages:?}");
    assert!(messages.iter().any(|m| m.contains("Gradients")), "{messages:?}");
    assert!(result.stats.path_count >= 4);
}

#[test]
fn test_stats_cover_every_subpath() {
    let result = preflight(SQUARE_WITH_HOLE, ProfileSettings::default());
    assert!(result.passed);
    assert_eq!(result.stats.path_count, 2);
    assert_eq!(result.stats.closed_paths, 2);
    assert!((result.stats.bounding_box.width - 10.0).abs() < 1e-6);
    assert!((result.stats.bounding_box.height - 10.0).abs() < 1e-6);
    assert!(!result.stats.has_intersections);
}

#[test]
fn test_tiny_islands_counted() {
    let settings = ProfileSettings {
        remove_islands_threshold: 50.0,
        ..ProfileSettings::default()
    };
    let result = preflight(SQUARE_WITH_HOLE, settings);
    // the 2.5 radius hole is below 50 units of area, the square is not
    assert_eq!(result.stats.tiny_islands_count, 1);
    assert!(result.passed);
}

#[test]
fn test_preflight_json_shape() {
    let result = preflight(OPEN_TRIANGLE, ProfileSettings::default());
    let json: serde_json::Value = serde_json::to_value(&result).expect("Failed to serialize");
    assert_eq!(json["passed"], true);
    assert_eq!(json["issues"][0]["severity"], "warning");
    assert_eq!(json["stats"]["openPaths"], 1);
    assert!(json["stats"]["boundingBox"]["width"].as_f64().expect("width") > 39.0);
}
