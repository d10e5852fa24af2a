use clipper2::{Path as KernelPath, PathType, Polygon, Polygons, Vertex};

pub mod boolean;
pub mod ids;
pub mod offset;
pub mod path;
pub mod region;
pub mod node;
pub mod simplify;

// Re-export public types
pub use ids::ConversionId;
pub use path::{Orientation, Path, Segment};
pub use region::{CompoundPath, FillRule};
pub use node::{OutlineGroup, OutlineNode};

/// Flattening tolerance used when handing curves to the polygon kernel.
pub const KERNEL_TOLERANCE: f64 = 0.01;

/// Convert one outline to a closed kernel polygon path.
fn to_kernel_path(path: &Path) -> KernelPath {
    let vertices: Vec<Vertex> = path
        .flatten(KERNEL_TOLERANCE)
        .iter()
        .map(|p| Vertex::new(p.x, p.y))
        .collect();
    KernelPath::new(vertices, true)
}

/// Wrap a set of outlines as one kernel polygon of the given role.
pub(crate) fn to_kernel_polygons(paths: &[Path], path_type: PathType) -> Polygons {
    let kernel_paths: Vec<KernelPath> = paths.iter().map(to_kernel_path).collect();
    Polygons::new(vec![Polygon::new(kernel_paths, path_type)])
}

/// Collect every closed ring of a kernel result. Rings with fewer than three
/// vertices enclose nothing and are skipped.
pub(crate) fn from_kernel_polygons(polygons: &Polygons) -> Vec<Path> {
    let mut paths = Vec::new();
    for polygon in polygons.polygons() {
        for ring in polygon.paths() {
            let points: Vec<(f64, f64)> = ring.vertices().iter().map(|v| (v.x(), v.y())).collect();
            if points.len() >= 3 {
                paths.push(Path::from_points(points, true));
            }
        }
    }
    paths
}
