//! Extruded triangle meshes built from a processed region.

use glam::Vec3;

pub mod extrude;
pub mod shape;

pub use extrude::{BuiltMesh, MeshBuilder};
pub use shape::{build_shapes, PlanarShape};

/// Indexed triangle mesh. Every three indices form one counter-clockwise face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append a vertex and return its index.
    pub(crate) fn push_vertex(&mut self, position: Vec3) -> u32 {
        self.positions.push(position);
        self.normals.push(Vec3::ZERO);
        (self.positions.len() - 1) as u32
    }

    pub(crate) fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Emit a triangle with its own three vertices.
    pub(crate) fn push_face(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let ia = self.push_vertex(a);
        let ib = self.push_vertex(b);
        let ic = self.push_vertex(c);
        self.push_triangle(ia, ib, ic);
    }

    /// Emit a planar quad `a b c d` as two faces.
    pub(crate) fn push_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3) {
        let ia = self.push_vertex(a);
        let ib = self.push_vertex(b);
        let ic = self.push_vertex(c);
        let id = self.push_vertex(d);
        self.push_triangle(ia, ib, ic);
        self.push_triangle(ia, ic, id);
    }

    /// Concatenate `other`, offsetting its indices by the current vertex count.
    /// Vertices are never welded across pieces.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    pub fn translate(&mut self, delta: Vec3) {
        for p in &mut self.positions {
            *p += delta;
        }
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Move the bounding-box centre to the origin.
    pub fn recenter(&mut self) {
        if let Some((lo, hi)) = self.bounds() {
            self.translate(-(lo + hi) * 0.5);
        }
    }

    /// Area-weighted vertex normals.
    pub fn compute_normals(&mut self) {
        self.normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            self.normals[a] += face;
            self.normals[b] += face;
            self.normals[c] += face;
        }
        for n in &mut self.normals {
            *n = n.normalize_or_zero();
        }
    }

    /// Unit normal of triangle `index`, from its winding.
    pub fn face_normal(&self, index: usize) -> Vec3 {
        let [a, b, c] = self.triangle(index);
        (b - a).cross(c - a).normalize_or_zero()
    }

    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let base = index * 3;
        [
            self.positions[self.indices[base] as usize],
            self.positions[self.indices[base + 1] as usize],
            self.positions[self.indices[base + 2] as usize],
        ]
    }

    /// Enclosed volume via the divergence theorem. Only meaningful for closed,
    /// consistently wound meshes.
    pub fn volume(&self) -> f64 {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                let a = self.positions[tri[0] as usize].as_dvec3();
                let b = self.positions[tri[1] as usize].as_dvec3();
                let c = self.positions[tri[2] as usize].as_dvec3();
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }
}
