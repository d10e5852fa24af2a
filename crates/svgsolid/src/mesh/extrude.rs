use crate::deadline::Deadline;
use crate::error::{ConvertError, Result};
use crate::geometry::CompoundPath;
use crate::mesh::shape::{build_shapes, ring_area, PlanarShape};
use crate::mesh::Mesh;
use crate::safe::{guarded, Checked};
use crate::settings::ProfileSettings;
use crate::validate::check_compound;
use geo::{Contains, Coord, Intersects, LineString, Polygon as GeoPolygon};
use glam::Vec3;
use kurbo::{Point, Vec2};
use tracing::{debug, info, warn};

/// Inset rings may not move a corner further than this multiple of the bevel size.
const MAX_MITER_RATIO: f64 = 2.0;

impl Checked for Mesh {
    fn is_sound(&self) -> bool {
        let count = self.positions.len();
        !self.is_empty()
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < count)
            && self.positions.iter().all(|p| p.is_finite())
    }
}

/// The merged mesh plus a record of how it was assembled.
#[derive(Debug, Clone)]
pub struct BuiltMesh {
    pub mesh: Mesh,
    /// Triangle count of every merged piece, body shapes first, then base shapes.
    pub piece_triangles: Vec<usize>,
    /// Vertex count of every merged piece, in the same order.
    pub piece_vertices: Vec<usize>,
    pub base_kept: bool,
    pub warnings: Vec<String>,
}

/// Extrudes a processed region into one printable mesh.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    thickness: f64,
    base_thickness: f64,
    bevel: f64,
}

impl MeshBuilder {
    pub fn new(settings: &ProfileSettings) -> Self {
        Self {
            thickness: settings.thickness,
            base_thickness: settings.base_thickness,
            bevel: settings.bevel,
        }
    }

    pub fn build(&self, compound: &CompoundPath, deadline: &Deadline) -> Result<BuiltMesh> {
        if !(self.thickness.is_finite() && self.thickness > 0.0) {
            return Err(ConvertError::kernel(
                "extrude",
                format!("thickness must be positive, got {}", self.thickness),
            ));
        }
        check_compound(compound)?;
        let shapes = build_shapes(compound);
        if shapes.is_empty() {
            return Err(ConvertError::kernel(
                "extrude",
                "region contains no closed shape to extrude",
            ));
        }
        debug!(shapes = shapes.len(), "planar shapes built");

        let mut warnings = Vec::new();
        let bevel = self.bevel.max(0.0).min(self.thickness / 2.0);

        let mut body = Vec::with_capacity(shapes.len());
        for (index, shape) in shapes.iter().enumerate() {
            deadline.check("extrude")?;
            body.push(self.extrude_body(index, shape, bevel, &mut warnings)?);
        }

        let base = if self.base_thickness > 0.0 {
            self.extrude_base(&shapes, deadline, &mut warnings)?
        } else {
            None
        };

        let mut mesh = Mesh::new();
        let mut piece_triangles = Vec::with_capacity(body.len() * 2);
        let mut piece_vertices = Vec::with_capacity(body.len() * 2);
        let raise = match base {
            Some(_) => Vec3::new(0.0, 0.0, self.base_thickness as f32),
            None => Vec3::ZERO,
        };
        for mut piece in body {
            piece.translate(raise);
            piece_triangles.push(piece.triangle_count());
            piece_vertices.push(piece.vertex_count());
            mesh.merge(&piece);
        }
        let base_kept = base.is_some();
        for piece in base.into_iter().flatten() {
            piece_triangles.push(piece.triangle_count());
            piece_vertices.push(piece.vertex_count());
            mesh.merge(&piece);
        }

        mesh.recenter();
        mesh.compute_normals();
        info!(
            triangles = mesh.triangle_count(),
            pieces = piece_triangles.len(),
            base_kept,
            "mesh built"
        );

        Ok(BuiltMesh {
            mesh,
            piece_triangles,
            piece_vertices,
            base_kept,
            warnings,
        })
    }

    fn extrude_body(
        &self,
        index: usize,
        shape: &PlanarShape,
        bevel: f64,
        warnings: &mut Vec<String>,
    ) -> Result<Mesh> {
        if bevel > 0.0 {
            match guarded("bevel", || extrude_shape(shape, self.thickness, bevel)) {
                Ok(mesh) => return Ok(mesh),
                Err(err) => {
                    warn!(index, error = %err, "bevel failed, extruding without it");
                    warnings.push(format!("shape {index}: bevel could not be applied"));
                }
            }
        }
        guarded("extrude", || extrude_shape(shape, self.thickness, 0.0)).map_err(|err| {
            ConvertError::kernel(
                "extrude",
                format!(
                    "shape {index} could not be extruded ({err}); \
                     the outline may self-intersect or contain degenerate curves"
                ),
            )
        })
    }

    /// The base slab, or `None` when any of its pieces fails.
    fn extrude_base(
        &self,
        shapes: &[PlanarShape],
        deadline: &Deadline,
        warnings: &mut Vec<String>,
    ) -> Result<Option<Vec<Mesh>>> {
        let mut pieces = Vec::with_capacity(shapes.len());
        for (index, shape) in shapes.iter().enumerate() {
            deadline.check("base")?;
            match guarded("base", || extrude_shape(shape, self.base_thickness, 0.0)) {
                Ok(mesh) => pieces.push(mesh),
                Err(err) => {
                    warn!(index, error = %err, "base extrusion failed, dropping base");
                    warnings.push("base could not be built and was left out".to_string());
                    return Ok(None);
                }
            }
        }
        Ok(Some(pieces))
    }
}

/// Extrude one shape to `z ∈ [0, height]`. A positive `bevel` chamfers the top edge.
pub fn extrude_shape(shape: &PlanarShape, height: f64, bevel: f64) -> Result<Mesh> {
    let mut mesh = Mesh::new();

    let bottom = triangulate(&shape.outer, &shape.holes)?;
    push_cap(&mut mesh, &bottom, 0.0, false);

    if bevel <= 0.0 {
        for ring in shape.rings() {
            push_walls(&mut mesh, ring, ring, 0.0, height);
        }
        push_cap(&mut mesh, &bottom, height, true);
        return Ok(mesh);
    }

    let shoulder = height - bevel;
    let outer = inset_ring(&shape.outer, bevel)?;
    let holes = shape
        .holes
        .iter()
        .map(|hole| inset_ring(hole, bevel))
        .collect::<Result<Vec<_>>>()?;
    check_insets_apart(&outer, &holes)?;
    let top = triangulate(&outer, &holes)?;

    for (ring, inset) in shape.rings().zip(std::iter::once(&outer).chain(holes.iter())) {
        push_walls(&mut mesh, ring, ring, 0.0, shoulder);
        push_walls(&mut mesh, ring, inset, shoulder, height);
    }
    push_cap(&mut mesh, &top, height, true);
    Ok(mesh)
}

/// A triangulated planar region: vertices plus counter-clockwise triangles.
#[derive(Debug)]
struct CapTriangles {
    points: Vec<Point>,
    triangles: Vec<[usize; 3]>,
}

fn triangulate(outer: &[Point], holes: &[Vec<Point>]) -> Result<CapTriangles> {
    let mut points: Vec<Point> = outer.to_vec();
    let mut hole_indices = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_indices.push(points.len());
        points.extend_from_slice(hole);
    }
    let data: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();

    let indices = guarded("triangulate", || {
        earcutr::earcut(&data, &hole_indices, 2)
            .map_err(|err| ConvertError::kernel("triangulate", format!("{err:?}")))
    })?;
    if indices.is_empty() || indices.len() % 3 != 0 || indices.iter().any(|&i| i >= points.len())
    {
        return Err(ConvertError::kernel(
            "triangulate",
            "outline produced no usable triangles",
        ));
    }

    let triangles = indices
        .chunks_exact(3)
        .map(|tri| {
            let [a, b, c] = [tri[0], tri[1], tri[2]];
            if (points[b] - points[a]).cross(points[c] - points[a]) < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect();
    Ok(CapTriangles { points, triangles })
}

fn push_cap(mesh: &mut Mesh, cap: &CapTriangles, z: f64, facing_up: bool) {
    for &[a, b, c] in &cap.triangles {
        let (a, b, c) = (
            lift(cap.points[a], z),
            lift(cap.points[b], z),
            lift(cap.points[c], z),
        );
        if facing_up {
            mesh.push_face(a, b, c);
        } else {
            mesh.push_face(a, c, b);
        }
    }
}

/// Side band from `lower` at `z0` to `upper` at `z1`. Both rings have the same
/// vertex count and keep the solid on their left.
fn push_walls(mesh: &mut Mesh, lower: &[Point], upper: &[Point], z0: f64, z1: f64) {
    let n = lower.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let a = lift(lower[i], z0);
        let b = lift(lower[j], z0);
        let c = lift(upper[j], z1);
        let d = lift(upper[i], z1);
        mesh.push_quad(a, b, c, d);
    }
}

/// Move every vertex toward the solid side (left of travel) by `distance`,
/// measured perpendicular to the adjacent edges.
fn inset_ring(ring: &[Point], distance: f64) -> Result<Vec<Point>> {
    let n = ring.len();
    let mut inset = Vec::with_capacity(n);
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let here = ring[i];
        let next = ring[(i + 1) % n];
        let left_in = left_normal(here - prev);
        let left_out = left_normal(next - here);
        let (Some(n1), Some(n2)) = (left_in, left_out) else {
            return Err(ConvertError::kernel("bevel", "ring has a zero-length edge"));
        };

        let sum = n1 + n2;
        let offset = if sum.hypot() < 1e-9 {
            n1 * distance
        } else {
            let bisector = sum.normalize();
            let cos_half = bisector.dot(n1).max(1e-9);
            bisector * (distance / cos_half).min(distance * MAX_MITER_RATIO)
        };
        inset.push(here + offset);
    }

    let before = ring_area(ring);
    let after = ring_area(&inset);
    if before.signum() != after.signum() || (before > 0.0 && after >= before) {
        return Err(ConvertError::kernel(
            "bevel",
            "bevel is too large for this outline",
        ));
    }
    Ok(inset)
}

/// Inset holes must stay strictly inside the inset outline and clear of each other,
/// otherwise the chamfer walls pass through one another.
fn check_insets_apart(outer: &[Point], holes: &[Vec<Point>]) -> Result<()> {
    if holes.is_empty() {
        return Ok(());
    }
    let outline = GeoPolygon::new(closed_line(outer), vec![]);
    let hole_lines: Vec<LineString<f64>> = holes.iter().map(|hole| closed_line(hole)).collect();
    for (i, line) in hole_lines.iter().enumerate() {
        let crossing = !outline.contains(line)
            || hole_lines[i + 1..].iter().any(|other| line.intersects(other));
        if crossing {
            return Err(ConvertError::kernel(
                "bevel",
                "bevel is wider than the wall between an outline and its hole",
            ));
        }
    }
    Ok(())
}

fn closed_line(ring: &[Point]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    LineString::new(coords)
}

fn left_normal(edge: Vec2) -> Option<Vec2> {
    let length = edge.hypot();
    (length > 1e-12).then(|| Vec2::new(-edge.y, edge.x) / length)
}

fn lift(p: Point, z: f64) -> Vec3 {
    Vec3::new(p.x as f32, p.y as f32, z as f32)
}
