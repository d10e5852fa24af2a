use crate::error::{ConvertError, Result, ValidationError};
use crate::geometry::{CompoundPath, FillRule, OutlineGroup, OutlineNode, Path, Segment};
use crate::markup::MarkupCensus;
use crate::validate::check_path;
use kurbo::{Point, Rect, Vec2};
use tracing::debug;

/// Everything the parse stage extracted from one markup document.
#[derive(Debug, Clone)]
pub struct ParsedOutline {
    /// The imported node tree, including paths that failed validation.
    pub root: OutlineNode,
    /// Independent copies of every valid path, in document order.
    pub paths: Vec<Path>,
    /// The valid paths grouped by the markup element that drew them, each with
    /// that element's fill rule.
    pub elements: Vec<CompoundPath>,
    /// Region built from all valid paths.
    pub compound: CompoundPath,
    /// Union of the valid paths' bounds.
    pub bounds: Rect,
    /// Paths in the tree that failed validation and were left out.
    pub rejected: usize,
    pub census: MarkupCensus,
}

/// Parse outline markup into validated paths.
pub fn parse_outline(markup: &str) -> Result<ParsedOutline> {
    let census = MarkupCensus::scan(markup)?;

    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(markup.as_bytes(), &opt)
        .map_err(|err| ConvertError::Parse(format!("failed to parse SVG: {err}")))?;

    let root = OutlineNode::Group(import_group(tree.root()));
    let mut collector = PathCollector::default();
    collector.visit(&root);

    let bounds = match collector.bounds {
        Some(bounds) if !collector.paths.is_empty() => bounds,
        _ => {
            let reason = match &collector.first_rejection {
                Some(reason) => format!("; first rejection: {reason}"),
                None => String::new(),
            };
            return Err(ConvertError::Parse(format!(
                "no valid outlines found ({} rejected{reason})",
                collector.rejected
            )));
        }
    };

    debug!(
        valid = collector.paths.len(),
        rejected = collector.rejected,
        "parsed outline markup"
    );

    let compound = CompoundPath::new(collector.paths.clone());
    Ok(ParsedOutline {
        root,
        paths: collector.paths,
        elements: collector.elements,
        compound,
        bounds,
        rejected: collector.rejected,
        census,
    })
}

/// Recursive-descent walk over the node tree that gathers valid paths.
#[derive(Debug, Default)]
struct PathCollector {
    paths: Vec<Path>,
    elements: Vec<CompoundPath>,
    bounds: Option<Rect>,
    rejected: usize,
    first_rejection: Option<ValidationError>,
}

impl PathCollector {
    fn visit(&mut self, node: &OutlineNode) {
        match node {
            OutlineNode::Path(path) => {
                if self.collect(path) {
                    self.elements.push(CompoundPath::new(vec![path.clone()]));
                }
            }
            OutlineNode::Compound(compound) => {
                let valid: Vec<Path> = compound
                    .children()
                    .iter()
                    .filter(|child| self.collect(child))
                    .cloned()
                    .collect();
                if !valid.is_empty() {
                    self.elements
                        .push(CompoundPath::new(valid).with_fill_rule(compound.fill_rule()));
                }
            }
            OutlineNode::Group(group) => {
                for child in &group.children {
                    self.visit(child);
                }
            }
        }
    }

    /// Record `path` if it is valid; returns whether it was kept.
    fn collect(&mut self, path: &Path) -> bool {
        if let Err(reason) = check_path(path) {
            self.rejected += 1;
            self.first_rejection.get_or_insert(reason);
            return false;
        }
        let rect = path.bounding_box();
        self.bounds = Some(match self.bounds {
            Some(bounds) => bounds.union(rect),
            None => rect,
        });
        self.paths.push(path.clone());
        true
    }
}

/// Convert a usvg group, keeping only visible filled geometry.
fn import_group(group: &usvg::Group) -> OutlineGroup {
    let mut children = Vec::new();
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => {
                let imported = import_group(g);
                if !imported.children.is_empty() {
                    children.push(OutlineNode::Group(imported));
                }
            }
            usvg::Node::Path(path) => {
                if !path.is_visible() || path.fill().is_none() {
                    // Stroke-only geometry is reported by the markup census.
                    continue;
                }
                if let Some(node) = import_path(path) {
                    children.push(node);
                }
            }
            usvg::Node::Image(_) => {
                // Raster content has no outline.
            }
            usvg::Node::Text(_) => {
                // Unconverted text is reported by the markup census.
            }
        }
    }
    let id = (!group.id().is_empty()).then(|| group.id().to_string());
    OutlineGroup::new(id, children)
}

fn import_path(path: &usvg::Path) -> Option<OutlineNode> {
    let data = path.data().clone().transform(path.abs_transform())?;
    let fill_rule = match path.fill().map(usvg::Fill::rule) {
        Some(usvg::FillRule::EvenOdd) => FillRule::EvenOdd,
        _ => FillRule::NonZero,
    };
    let mut subpaths = convert_tiny_skia_path(&data);
    match subpaths.len() {
        0 => None,
        1 => subpaths.pop().map(OutlineNode::Path),
        _ => Some(OutlineNode::Compound(
            CompoundPath::new(subpaths).with_fill_rule(fill_rule),
        )),
    }
}

/// Split a tiny-skia path into subpaths of anchors with relative handles.
///
/// Markup is y-down; coordinates are flipped so stored outlines are y-up.
fn convert_tiny_skia_path(path: &tiny_skia_path::Path) -> Vec<Path> {
    let mut builder = SubpathBuilder::default();
    for segment in path.segments() {
        match segment {
            tiny_skia_path::PathSegment::MoveTo(p) => {
                builder.finish(false);
                builder.segments.push(Segment::new(p.x as f64, -(p.y as f64)));
            }
            tiny_skia_path::PathSegment::LineTo(p) => {
                builder.line_to(flip(p));
            }
            tiny_skia_path::PathSegment::QuadTo(p1, p2) => {
                builder.quad_to(flip(p1), flip(p2));
            }
            tiny_skia_path::PathSegment::CubicTo(p1, p2, p3) => {
                builder.cubic_to(flip(p1), flip(p2), flip(p3));
            }
            tiny_skia_path::PathSegment::Close => {
                builder.finish(true);
            }
        }
    }
    builder.finish(false);
    builder.paths
}

fn flip(p: tiny_skia_path::Point) -> Point {
    Point::new(p.x as f64, -(p.y as f64))
}

#[derive(Debug, Default)]
struct SubpathBuilder {
    segments: Vec<Segment>,
    paths: Vec<Path>,
}

impl SubpathBuilder {
    fn current(&self) -> Point {
        self.segments
            .last()
            .map(|s| s.point)
            .unwrap_or(Point::ORIGIN)
    }

    fn ensure_started(&mut self) {
        if self.segments.is_empty() {
            // A drawing command right after a close starts where that subpath began.
            let start = self
                .paths
                .last()
                .and_then(|p| p.segments().first().map(|s| s.point))
                .unwrap_or(Point::ORIGIN);
            self.segments.push(Segment::new(start.x, start.y));
        }
    }

    fn line_to(&mut self, to: Point) {
        self.ensure_started();
        self.segments.push(Segment::new(to.x, to.y));
    }

    fn quad_to(&mut self, control: Point, to: Point) {
        self.ensure_started();
        let from = self.current();
        // Degree elevation: each cubic handle sits 2/3 of the way to the quad control.
        let c1 = from + (control - from) * (2.0 / 3.0);
        let c2 = to + (control - to) * (2.0 / 3.0);
        self.cubic_to(c1, c2, to);
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) {
        self.ensure_started();
        if let Some(last) = self.segments.last_mut() {
            last.handle_out = non_zero(c1 - last.point);
        }
        self.segments
            .push(Segment::with_handles(to, non_zero(c2 - to), None));
    }

    fn finish(&mut self, closed: bool) {
        if self.segments.is_empty() {
            return;
        }
        let segments = std::mem::take(&mut self.segments);
        let path = Path::new(segments, false);
        self.paths.push(if closed { path.closed() } else { path });
    }
}

fn non_zero(handle: Vec2) -> Option<Vec2> {
    (handle != Vec2::ZERO).then_some(handle)
}
