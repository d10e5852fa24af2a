use crate::geometry::{Path, KERNEL_TOLERANCE};
use crate::import::ParsedOutline;
use crate::settings::ProfileSettings;
use crate::validate::is_valid_path;
use geo::algorithm::line_intersection::line_intersection;
use geo::{Coord, Line};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Average segment count per path above which simplification is suggested.
const DENSE_PATH_SEGMENTS: f64 = 500.0;

/// Self-intersection is only checked on this many leading paths.
const INTERSECTION_CHECK_PATHS: usize = 3;

/// Enclosed area below which an open path is treated as a bare stroke.
const CLOSABLE_AREA_EPSILON: f64 = 1e-9;

const MAX_PRINT_DIMENSION: f64 = 300.0;
const MIN_PRINT_DIMENSION: f64 = 5.0;
const FINE_DETAIL_DIMENSION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl Issue {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            detail: None,
            suggested_fix: None,
        }
    }

    fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightStats {
    pub path_count: usize,
    pub closed_paths: usize,
    pub open_paths: usize,
    pub total_points: usize,
    pub bounding_box: BoundingBox,
    pub has_intersections: bool,
    pub tiny_islands_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightResult {
    pub passed: bool,
    pub issues: Vec<Issue>,
    pub stats: PreflightStats,
}

impl PreflightResult {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }
}

/// Diagnose parsed outlines without modifying them.
pub fn run_preflight(parsed: &ParsedOutline, settings: &ProfileSettings) -> PreflightResult {
    let paths = &parsed.paths;
    let mut issues = Vec::new();

    let invalid = paths.iter().filter(|p| !is_valid_path(p)).count();
    if invalid > 0 {
        issues.push(
            Issue::new(
                Severity::Error,
                format!("{invalid} invalid or degenerate path(s) found"),
            )
            .fix("Remove zero-length or malformed shapes from the source file"),
        );
    }
    if parsed.rejected > 0 {
        issues.push(Issue::new(
            Severity::Info,
            format!("{} degenerate path(s) were skipped while reading", parsed.rejected),
        ));
    }

    let closed_paths = paths.iter().filter(|p| p.is_closed()).count();
    let open: Vec<&Path> = paths.iter().filter(|p| !p.is_closed()).collect();
    if !open.is_empty() {
        issues.push(
            Issue::new(Severity::Warning, format!("{} open path(s) found", open.len()))
                .detail("Open paths are closed automatically before extrusion")
                .fix("Close the paths in your editor for predictable results"),
        );
        let closable = open
            .iter()
            .any(|p| p.area() > CLOSABLE_AREA_EPSILON);
        if closed_paths == 0 && !closable {
            issues.push(
                Issue::new(Severity::Error, "No closed shapes to extrude")
                    .detail("Every path is an open stroke that encloses no area")
                    .fix("Convert strokes to filled outlines before uploading"),
            );
        }
    }

    let total_points: usize = paths.iter().map(Path::segment_count).sum();
    if !paths.is_empty() {
        let average = total_points as f64 / paths.len() as f64;
        if average > DENSE_PATH_SEGMENTS {
            let suggested = if settings.simplify_tolerance > 0.0 {
                settings.simplify_tolerance * 2.0
            } else {
                0.1
            };
            issues.push(
                Issue::new(Severity::Warning, "Paths are very detailed")
                    .detail(format!("Average of {average:.0} points per path"))
                    .fix(format!("Set the simplify tolerance to {suggested}")),
            );
        }
    }

    let has_intersections = paths
        .iter()
        .take(INTERSECTION_CHECK_PATHS)
        .any(self_intersects);
    if has_intersections {
        issues.push(
            Issue::new(Severity::Info, "Self-intersecting path detected")
                .detail("Overlapping regions are merged during processing"),
        );
    }

    let threshold = settings.remove_islands_threshold;
    let tiny_islands_count = if threshold > 0.0 {
        paths.iter().filter(|p| p.area() < threshold).count()
    } else {
        0
    };
    if tiny_islands_count > 0 {
        issues.push(
            Issue::new(
                Severity::Info,
                format!("{tiny_islands_count} tiny island(s) will be removed"),
            )
            .detail(format!("Area below {threshold}")),
        );
    }

    let width = parsed.bounds.width();
    let height = parsed.bounds.height();
    let largest = width.max(height);
    if largest > MAX_PRINT_DIMENSION {
        issues.push(
            Issue::new(Severity::Warning, "Design is very large")
                .detail(format!("Largest dimension is {largest:.1} units"))
                .fix("Scale the design down to fit the print bed"),
        );
    } else if largest < MIN_PRINT_DIMENSION {
        issues.push(
            Issue::new(Severity::Warning, "Design is too small to print reliably")
                .detail(format!("Largest dimension is {largest:.2} units"))
                .fix("Scale the design up"),
        );
    } else if largest < FINE_DETAIL_DIMENSION {
        issues.push(
            Issue::new(Severity::Warning, "Design is small; fine details may be lost")
                .detail(format!("Largest dimension is {largest:.2} units")),
        );
    }

    let census = parsed.census;
    if census.text_elements > 0 {
        issues.push(
            Issue::new(
                Severity::Warning,
                format!("{} text element(s) are not converted", census.text_elements),
            )
            .fix("Convert text to outlines before uploading"),
        );
    }
    if census.images > 0 {
        issues.push(
            Issue::new(
                Severity::Warning,
                format!("{} raster image(s) will be ignored", census.images),
            )
            .detail("Only vector outlines can be extruded"),
        );
    }
    if census.paint_servers > 0 {
        issues.push(
            Issue::new(Severity::Info, "Gradients and patterns are treated as solid fill"),
        );
    }
    if census.stroke_only > 0 {
        issues.push(
            Issue::new(
                Severity::Warning,
                format!("{} stroke-only shape(s) will be ignored", census.stroke_only),
            )
            .fix("Convert strokes to filled outlines"),
        );
    }

    let passed = !issues.iter().any(|i| i.severity == Severity::Error);
    PreflightResult {
        passed,
        issues,
        stats: PreflightStats {
            path_count: paths.len(),
            closed_paths,
            open_paths: open.len(),
            total_points,
            bounding_box: BoundingBox { width, height },
            has_intersections,
            tiny_islands_count,
        },
    }
}

/// True when two non-adjacent edges of the flattened outline touch or cross.
fn self_intersects(path: &Path) -> bool {
    let points = path.flatten(KERNEL_TOLERANCE);
    if points.len() < 4 {
        return false;
    }
    let mut edges: Vec<Line<f64>> = points
        .windows(2)
        .map(|pair| Line::new(coord(pair[0]), coord(pair[1])))
        .collect();
    if path.is_closed() {
        edges.push(Line::new(coord(points[points.len() - 1]), coord(points[0])));
    }

    let wraps = path.is_closed();
    let n = edges.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if wraps && i == 0 && j == n - 1 {
                continue;
            }
            if line_intersection(edges[i], edges[j]).is_some() {
                return true;
            }
        }
    }
    false
}

fn coord(p: Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::MarkupCensus;
    use crate::geometry::{CompoundPath, OutlineGroup, OutlineNode};
    use kurbo::Rect;

    fn parsed(paths: Vec<Path>) -> ParsedOutline {
        let bounds = paths
            .iter()
            .map(Path::bounding_box)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        ParsedOutline {
            root: OutlineNode::Group(OutlineGroup::new(
                None,
                paths.iter().cloned().map(OutlineNode::Path).collect(),
            )),
            compound: CompoundPath::new(paths.clone()),
            elements: paths.iter().cloned().map(|p| CompoundPath::new(vec![p])).collect(),
            paths,
            bounds,
            rejected: 0,
            census: MarkupCensus::default(),
        }
    }

    #[test]
    fn clean_square_passes_without_issues() {
        let result = run_preflight(
            &parsed(vec![Path::rectangle(0.0, 0.0, 50.0, 50.0)]),
            &ProfileSettings::default(),
        );
        assert!(result.passed);
        assert!(result.issues.is_empty());
        assert_eq!(result.stats.path_count, 1);
        assert_eq!(result.stats.closed_paths, 1);
        assert_eq!(result.stats.total_points, 4);
        assert_eq!(result.stats.bounding_box.width, 50.0);
    }

    #[test]
    fn lone_open_triangle_warns_once_and_passes() {
        let triangle = Path::from_points([(0.0, 0.0), (40.0, 0.0), (20.0, 30.0)], false);
        let result = run_preflight(&parsed(vec![triangle]), &ProfileSettings::default());
        assert!(result.passed);
        assert_eq!(result.count(Severity::Warning), 1);
        assert_eq!(result.count(Severity::Error), 0);
        assert_eq!(result.stats.open_paths, 1);
    }

    #[test]
    fn open_stroke_without_area_is_an_error() {
        let stroke = Path::from_points([(0.0, 0.0), (40.0, 0.0)], false);
        let result = run_preflight(&parsed(vec![stroke]), &ProfileSettings::default());
        assert!(!result.passed);
        assert_eq!(result.count(Severity::Error), 1);
    }

    #[test]
    fn dense_paths_suggest_doubled_tolerance() {
        let points: Vec<(f64, f64)> = (0..600)
            .map(|i| {
                let t = i as f64 / 600.0 * std::f64::consts::TAU;
                (50.0 * t.cos(), 50.0 * t.sin())
            })
            .collect();
        let settings = ProfileSettings {
            simplify_tolerance: 0.25,
            ..ProfileSettings::default()
        };
        let result = run_preflight(&parsed(vec![Path::from_points(points, true)]), &settings);
        let dense = result
            .issues
            .iter()
            .find(|i| i.message.contains("detailed"))
            .expect("density warning");
        assert_eq!(dense.severity, Severity::Warning);
        assert!(dense.suggested_fix.as_deref().unwrap_or("").contains("0.5"));
    }

    #[test]
    fn bow_tie_is_reported_as_intersecting() {
        let bow_tie =
            Path::from_points([(0.0, 0.0), (20.0, 20.0), (20.0, 0.0), (0.0, 20.0)], true);
        let result = run_preflight(&parsed(vec![bow_tie]), &ProfileSettings::default());
        assert!(result.stats.has_intersections);
        assert!(result.passed);
    }

    #[test]
    fn tiny_islands_are_counted_against_the_threshold() {
        let paths = vec![
            Path::rectangle(0.0, 0.0, 40.0, 40.0),
            Path::rectangle(50.0, 0.0, 1.0, 1.0),
        ];
        let settings = ProfileSettings {
            remove_islands_threshold: 2.0,
            ..ProfileSettings::default()
        };
        let result = run_preflight(&parsed(paths.clone()), &settings);
        assert_eq!(result.stats.tiny_islands_count, 1);

        let result = run_preflight(&parsed(paths), &ProfileSettings::default());
        assert_eq!(result.stats.tiny_islands_count, 0);
    }

    #[test]
    fn size_warnings_follow_largest_dimension() {
        let huge = run_preflight(
            &parsed(vec![Path::rectangle(0.0, 0.0, 400.0, 10.0)]),
            &ProfileSettings::default(),
        );
        assert!(huge.issues.iter().any(|i| i.message.contains("large")));

        let tiny = run_preflight(
            &parsed(vec![Path::rectangle(0.0, 0.0, 2.0, 2.0)]),
            &ProfileSettings::default(),
        );
        assert!(tiny.issues.iter().any(|i| i.message.contains("too small")));

        let small = run_preflight(
            &parsed(vec![Path::rectangle(0.0, 0.0, 8.0, 8.0)]),
            &ProfileSettings::default(),
        );
        assert!(small.issues.iter().any(|i| i.message.contains("fine details")));
        assert!(small.passed);
    }

    #[test]
    fn census_findings_become_issues() {
        let mut outline = parsed(vec![Path::rectangle(0.0, 0.0, 50.0, 50.0)]);
        outline.census = MarkupCensus {
            text_elements: 2,
            images: 1,
            paint_servers: 1,
            stroke_only: 3,
        };
        let result = run_preflight(&outline, &ProfileSettings::default());
        assert_eq!(result.count(Severity::Warning), 3);
        assert_eq!(result.count(Severity::Info), 1);
        assert!(result.passed);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = run_preflight(
            &parsed(vec![Path::from_points([(0.0, 0.0), (40.0, 0.0)], false)]),
            &ProfileSettings::default(),
        );
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"suggestedFix\""));
        assert!(json.contains("\"tinyIslandsCount\""));
        assert!(json.contains("\"severity\":\"error\""));
    }
}
