use crate::error::{ConvertError, Result};
use crate::geometry::path::Path;
use crate::geometry::KERNEL_TOLERANCE;
use geo::{Coord, LineString, Simplify};

/// Reduce the anchor count of a path with Ramer-Douglas-Peucker at `tolerance`.
///
/// Curves are flattened first, so the result is always polygonal.
pub fn simplify_path(path: &Path, tolerance: f64) -> Result<Path> {
    let mut coords: Vec<Coord<f64>> = path
        .flatten(KERNEL_TOLERANCE)
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    if path.is_closed() {
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
    }

    let simplified = LineString::new(coords).simplify(&tolerance);
    let mut points: Vec<(f64, f64)> = simplified.0.iter().map(|c| (c.x, c.y)).collect();
    if path.is_closed() && points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() < 2 {
        return Err(ConvertError::kernel(
            "simplify",
            format!("simplification left {} point(s)", points.len()),
        ));
    }
    Ok(Path::from_points(points, path.is_closed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collinear_points_are_removed() {
        let path = Path::from_points(
            [
                (0.0, 0.0),
                (5.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
            ],
            true,
        );
        let simplified = simplify_path(&path, 0.1).expect("simplify");
        assert_eq!(simplified.segment_count(), 4);
        assert!(simplified.is_closed());
        assert!((simplified.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn circle_loses_points_at_coarse_tolerance() {
        let circle = Path::circle((0.0, 0.0), 10.0);
        let dense = circle.flatten(KERNEL_TOLERANCE).len();
        let simplified = simplify_path(&circle, 0.5).expect("simplify");
        assert!(simplified.segment_count() < dense);
        assert!(simplified.segment_count() >= 4);
    }

    #[test]
    fn open_path_stays_open() {
        let path = Path::from_points([(0.0, 0.0), (1.0, 0.001), (2.0, 0.0)], false);
        let simplified = simplify_path(&path, 0.1).expect("simplify");
        assert!(!simplified.is_closed());
        assert_eq!(simplified.segment_count(), 2);
    }
}
