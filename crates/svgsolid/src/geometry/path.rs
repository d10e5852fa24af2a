use kurbo::{BezPath, ParamCurveArclen, PathEl, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Accuracy used when measuring curve arc length.
const ARCLEN_ACCURACY: f64 = 1e-6;

/// Anchors closer than this are treated as the same point when closing a path.
const COINCIDENT_EPSILON: f64 = 1e-9;

/// Cubic handle length for a quarter circle.
const CIRCLE_KAPPA: f64 = 0.552_284_749_830_793_4;

/// An anchor point with optional cubic control handles, stored relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub point: Point,
    /// Handle of the curve arriving at this anchor.
    pub handle_in: Option<Vec2>,
    /// Handle of the curve leaving this anchor.
    pub handle_out: Option<Vec2>,
}

impl Segment {
    /// A corner anchor without handles.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            handle_in: None,
            handle_out: None,
        }
    }

    pub fn with_handles(point: Point, handle_in: Option<Vec2>, handle_out: Option<Vec2>) -> Self {
        Self {
            point,
            handle_in,
            handle_out,
        }
    }

    /// True when the anchor and every present handle are finite.
    pub fn is_finite(&self) -> bool {
        self.point.is_finite()
            && self.handle_in.map_or(true, |h| h.is_finite())
            && self.handle_out.map_or(true, |h| h.is_finite())
    }

    fn reversed(&self) -> Self {
        Self {
            point: self.point,
            handle_in: self.handle_out,
            handle_out: self.handle_in,
        }
    }
}

/// Traversal direction of a closed outline, in y-up coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
}

/// An ordered run of segments, optionally closed back onto its first anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
    closed: bool,
}

impl Path {
    pub fn new(segments: Vec<Segment>, closed: bool) -> Self {
        Self { segments, closed }
    }

    /// Build a polygonal path from corner points.
    pub fn from_points<I>(points: I, closed: bool) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let segments = points
            .into_iter()
            .map(|(x, y)| Segment::new(x, y))
            .collect();
        Self::new(segments, closed)
    }

    /// Axis-aligned rectangle, counter-clockwise.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_points(
            [
                (x, y),
                (x + width, y),
                (x + width, y + height),
                (x, y + height),
            ],
            true,
        )
    }

    /// Circle built from four cubic arcs, counter-clockwise.
    pub fn circle(center: (f64, f64), radius: f64) -> Self {
        let k = radius * CIRCLE_KAPPA;
        let (cx, cy) = center;
        let segments = vec![
            Segment::with_handles(
                Point::new(cx + radius, cy),
                Some(Vec2::new(0.0, -k)),
                Some(Vec2::new(0.0, k)),
            ),
            Segment::with_handles(
                Point::new(cx, cy + radius),
                Some(Vec2::new(k, 0.0)),
                Some(Vec2::new(-k, 0.0)),
            ),
            Segment::with_handles(
                Point::new(cx - radius, cy),
                Some(Vec2::new(0.0, k)),
                Some(Vec2::new(0.0, -k)),
            ),
            Segment::with_handles(
                Point::new(cx, cy - radius),
                Some(Vec2::new(-k, 0.0)),
                Some(Vec2::new(k, 0.0)),
            ),
        ];
        Self::new(segments, true)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// A closed copy of this path. A trailing anchor that duplicates the first one
    /// is merged into it.
    pub fn closed(&self) -> Path {
        let mut segments = self.segments.clone();
        if !self.closed && segments.len() > 2 {
            let first = segments[0].point;
            let last = segments[segments.len() - 1];
            if first.distance(last.point) < COINCIDENT_EPSILON {
                segments[0].handle_in = last.handle_in;
                segments.pop();
            }
        }
        Path::new(segments, true)
    }

    /// The same outline traversed in the opposite direction.
    pub fn reversed(&self) -> Path {
        let segments = self.segments.iter().rev().map(Segment::reversed).collect();
        Path::new(segments, self.closed)
    }

    /// Convert to a kurbo path. An edge is a cubic when either of its handles is present.
    pub fn to_bezpath(&self) -> BezPath {
        let mut bez = BezPath::new();
        let Some(first) = self.segments.first() else {
            return bez;
        };
        bez.move_to(first.point);
        for pair in self.segments.windows(2) {
            push_edge(&mut bez, &pair[0], &pair[1]);
        }
        if self.closed && self.segments.len() > 1 {
            push_edge(&mut bez, &self.segments[self.segments.len() - 1], first);
            bez.close_path();
        }
        bez
    }

    pub fn bounding_box(&self) -> Rect {
        self.to_bezpath().bounding_box()
    }

    /// Perimeter length, including the closing edge of a closed path.
    pub fn length(&self) -> f64 {
        self.to_bezpath()
            .segments()
            .map(|seg| seg.arclen(ARCLEN_ACCURACY))
            .sum()
    }

    /// Signed area of the region the path encloses once closed.
    /// Positive for counter-clockwise outlines.
    pub fn signed_area(&self) -> f64 {
        let mut bez = self.to_bezpath();
        if !self.closed && self.segments.len() > 1 {
            bez.close_path();
        }
        bez.area()
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn orientation(&self) -> Orientation {
        if self.signed_area() < 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::CounterClockwise
        }
    }

    /// A copy traversed in the requested direction.
    pub fn oriented(&self, orientation: Orientation) -> Path {
        if self.orientation() == orientation {
            self.clone()
        } else {
            self.reversed()
        }
    }

    /// Flatten curves into a polyline. Consecutive duplicates are dropped, and for a
    /// closed path the closing point is not repeated.
    pub fn flatten(&self, tolerance: f64) -> Vec<Point> {
        let mut points: Vec<Point> = Vec::new();
        kurbo::flatten(self.to_bezpath(), tolerance, |el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => {
                if points
                    .last()
                    .map_or(true, |last| last.distance(p) > COINCIDENT_EPSILON)
                {
                    points.push(p);
                }
            }
            _ => {}
        });
        if self.closed && points.len() > 1 {
            let first = points[0];
            if points[points.len() - 1].distance(first) <= COINCIDENT_EPSILON {
                points.pop();
            }
        }
        points
    }
}

fn push_edge(bez: &mut BezPath, from: &Segment, to: &Segment) {
    if from.handle_out.is_none() && to.handle_in.is_none() {
        bez.line_to(to.point);
        return;
    }
    let c1 = from.point + from.handle_out.unwrap_or(Vec2::ZERO);
    let c2 = to.point + to.handle_in.unwrap_or(Vec2::ZERO);
    bez.curve_to(c1, c2, to.point);
}
