use crate::error::{ConvertError, Result};
use crate::geometry::path::{Orientation, Path};
use crate::geometry::{from_kernel_polygons, to_kernel_polygons};
use clipper2::{inflate, EndType, JoinType, PathType};

/// Corners sharper than this ratio of the offset distance are squared off.
const MITER_LIMIT: f64 = 2.0;
/// Arc tolerance for round joins (unused for miter joins).
const ARC_TOLERANCE: f64 = 0.25;

/// Grow (`delta > 0`) or shrink (`delta < 0`) the region enclosed by one path.
///
/// The outline is handed to the kernel counter-clockwise so the sign of `delta`
/// always means outward expansion, then the original orientation is restored.
/// When shrinking splits the outline, the largest piece is kept.
pub fn offset_path(path: &Path, delta: f64) -> Result<Path> {
    let orientation = path.orientation();
    let outline = path.closed().oriented(Orientation::CounterClockwise);

    let input = to_kernel_polygons(std::slice::from_ref(&outline), PathType::Subject);
    let offset_polygons = inflate(
        input,
        delta,
        JoinType::Miter,
        EndType::ClosedPolygon,
        MITER_LIMIT,
        ARC_TOLERANCE,
    );

    let largest = from_kernel_polygons(&offset_polygons)
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .ok_or_else(|| ConvertError::kernel("offset", "outline collapsed during offset"))?;

    Ok(largest.oriented(orientation))
}
