use crate::geometry::{CompoundPath, Orientation, Path, Segment};
use kurbo::{BezPath, PathEl, Point, Vec2};

/// Flattening tolerance for curves in the extruded mesh.
pub const MESH_TOLERANCE: f64 = 0.05;

const DUPLICATE_EPSILON: f64 = 1e-9;

/// A flat solid region: one counter-clockwise outer ring and its clockwise holes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarShape {
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl PlanarShape {
    pub fn rings(&self) -> impl Iterator<Item = &Vec<Point>> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    /// Enclosed area with holes subtracted.
    pub fn area(&self) -> f64 {
        ring_area(&self.outer) - self.holes.iter().map(|h| ring_area(h).abs()).sum::<f64>()
    }
}

/// Group the children of a region into solids with holes.
///
/// A clockwise path becomes a hole of the most recent solid; anything else (or a
/// clockwise path before any solid) starts a new solid. This relies on the region
/// already being consistently oriented and nested.
pub fn build_shapes(compound: &CompoundPath) -> Vec<PlanarShape> {
    let mut shapes: Vec<PlanarShape> = Vec::new();
    for path in compound.children() {
        let ring = flatten_outline(path);
        if ring.len() < 3 {
            continue;
        }
        let clockwise = path.orientation() == Orientation::Clockwise;
        match shapes.last_mut() {
            Some(solid) if clockwise => solid.holes.push(orient(ring, false)),
            _ => shapes.push(PlanarShape {
                outer: orient(ring, true),
                holes: Vec::new(),
            }),
        }
    }
    shapes
}

/// Planar outline of one path. An edge is a cubic only when the arriving anchor
/// has an incoming handle and the departing anchor an outgoing one, both finite;
/// anything else is a straight edge.
pub fn outline_curve(path: &Path) -> BezPath {
    let mut bez = BezPath::new();
    let segments = path.segments();
    let Some(first) = segments.first() else {
        return bez;
    };
    bez.move_to(first.point);
    for pair in segments.windows(2) {
        push_edge(&mut bez, &pair[0], &pair[1]);
    }
    if path.is_closed() && segments.len() > 1 {
        push_edge(&mut bez, &segments[segments.len() - 1], first);
    }
    bez.close_path();
    bez
}

fn push_edge(bez: &mut BezPath, prev: &Segment, current: &Segment) {
    match (finite_handle(prev.handle_out), finite_handle(current.handle_in)) {
        (Some(out), Some(inc)) if prev.point.is_finite() && current.point.is_finite() => {
            bez.curve_to(prev.point + out, current.point + inc, current.point);
        }
        _ => bez.line_to(current.point),
    }
}

fn finite_handle(handle: Option<Vec2>) -> Option<Vec2> {
    handle.filter(|h| h.is_finite())
}

/// Flatten a path into a ring without a repeated closing point.
pub fn flatten_outline(path: &Path) -> Vec<Point> {
    let mut ring: Vec<Point> = Vec::new();
    kurbo::flatten(outline_curve(path), MESH_TOLERANCE, |el| {
        if let PathEl::MoveTo(p) | PathEl::LineTo(p) = el {
            if p.is_finite()
                && ring
                    .last()
                    .map_or(true, |last| last.distance(p) > DUPLICATE_EPSILON)
            {
                ring.push(p);
            }
        }
    });
    while ring.len() > 1 && ring[0].distance(ring[ring.len() - 1]) <= DUPLICATE_EPSILON {
        ring.pop();
    }
    ring
}

/// Shoelace area, positive for counter-clockwise rings.
pub fn ring_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

fn orient(mut ring: Vec<Point>, counter_clockwise: bool) -> Vec<Point> {
    if (ring_area(&ring) > 0.0) != counter_clockwise {
        ring.reverse();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn square_with_hole_nests() {
        let outer = Path::rectangle(0.0, 0.0, 10.0, 10.0);
        let hole = Path::circle((5.0, 5.0), 2.0).oriented(Orientation::Clockwise);
        let shapes = build_shapes(&CompoundPath::new(vec![outer, hole]));
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].holes.len(), 1);
        assert!(ring_area(&shapes[0].outer) > 0.0);
        assert!(ring_area(&shapes[0].holes[0]) < 0.0);
        // the flattened hole is inscribed in the circle, so it removes a little less
        let expected = 100.0 - std::f64::consts::PI * 4.0;
        assert!(shapes[0].area() >= expected);
        assert_relative_eq!(shapes[0].area(), expected, epsilon = 0.5);
    }

    #[test]
    fn counter_clockwise_paths_start_new_solids() {
        let a = Path::rectangle(0.0, 0.0, 5.0, 5.0);
        let b = Path::rectangle(10.0, 0.0, 5.0, 5.0);
        let shapes = build_shapes(&CompoundPath::new(vec![a, b]));
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().all(|s| s.holes.is_empty()));
    }

    #[test]
    fn leading_clockwise_path_becomes_a_solid() {
        let lone = Path::rectangle(0.0, 0.0, 5.0, 5.0).reversed();
        let shapes = build_shapes(&CompoundPath::new(vec![lone]));
        assert_eq!(shapes.len(), 1);
        assert!(ring_area(&shapes[0].outer) > 0.0);
    }

    #[test]
    fn one_sided_handle_is_a_straight_edge() {
        let mut segments = Path::rectangle(0.0, 0.0, 4.0, 4.0).segments().to_vec();
        segments[1].handle_in = Some(Vec2::new(-1.0, 2.0));
        let path = Path::new(segments, true);
        assert_eq!(flatten_outline(&path).len(), 4);
    }

    #[test]
    fn nan_handle_degrades_to_line() {
        let mut segments = Path::rectangle(0.0, 0.0, 4.0, 4.0).segments().to_vec();
        segments[0].handle_out = Some(Vec2::new(f64::NAN, 0.0));
        segments[1].handle_in = Some(Vec2::new(-1.0, 1.0));
        let path = Path::new(segments, true);
        let ring = flatten_outline(&path);
        assert_eq!(ring.len(), 4);
        assert_relative_eq!(ring_area(&ring), 16.0);
    }

    #[test]
    fn curves_are_flattened() {
        let ring = flatten_outline(&Path::circle((0.0, 0.0), 10.0));
        assert!(ring.len() > 16);
        let full = std::f64::consts::PI * 100.0;
        assert!(ring_area(&ring) <= full);
        assert_relative_eq!(ring_area(&ring), full, epsilon = 2.5);
    }
}
