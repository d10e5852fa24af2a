//! STL serialization of a finished mesh, binary and ASCII.

use crate::error::{ConvertError, Result};
use crate::mesh::Mesh;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Bytes per binary STL triangle record: normal, three vertices, attribute count.
const BINARY_RECORD_LEN: usize = 50;
const BINARY_HEADER_LEN: usize = 80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

/// Serialize `mesh` in the requested format.
pub fn export(mesh: &Mesh, format: StlFormat, name: &str) -> Result<Vec<u8>> {
    match format {
        StlFormat::Binary => to_binary_stl(mesh, name),
        StlFormat::Ascii => to_ascii_stl(mesh, name).map(String::into_bytes),
    }
}

fn check_exportable(mesh: &Mesh) -> Result<usize> {
    let triangles = mesh.triangle_count();
    if triangles == 0 {
        return Err(ConvertError::Export("mesh has no triangles".to_string()));
    }
    let count = mesh.vertex_count();
    if let Some(index) = mesh.indices.iter().find(|&&i| i as usize >= count) {
        return Err(ConvertError::Export(format!(
            "index {index} out of range (vertex count = {count})"
        )));
    }
    Ok(triangles)
}

/// Binary STL: 80-byte header, little-endian u32 triangle count, then one
/// 50-byte record per triangle.
pub fn to_binary_stl(mesh: &Mesh, name: &str) -> Result<Vec<u8>> {
    let triangles = check_exportable(mesh)?;
    let count = u32::try_from(triangles)
        .map_err(|_| ConvertError::Export(format!("{triangles} triangles exceed the format limit")))?;

    let mut buf = Vec::with_capacity(BINARY_HEADER_LEN + 4 + triangles * BINARY_RECORD_LEN);
    let header = format!("binary STL: {name}");
    let header = header.as_bytes();
    buf.extend_from_slice(&header[..header.len().min(BINARY_HEADER_LEN)]);
    buf.resize(BINARY_HEADER_LEN, 0u8);
    buf.extend_from_slice(&count.to_le_bytes());

    for index in 0..triangles {
        let normal = mesh.face_normal(index);
        for value in normal.to_array() {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for vertex in mesh.triangle(index) {
            for value in vertex.to_array() {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

/// ASCII STL facet list.
pub fn to_ascii_stl(mesh: &Mesh, name: &str) -> Result<String> {
    let triangles = check_exportable(mesh)?;
    let mut out = String::with_capacity(triangles * 256);
    let fmt_err = |_: std::fmt::Error| ConvertError::Export("failed to format STL text".to_string());

    writeln!(out, "solid {name}").map_err(fmt_err)?;
    for index in 0..triangles {
        let n = mesh.face_normal(index);
        writeln!(out, "  facet normal {} {} {}", n.x, n.y, n.z).map_err(fmt_err)?;
        out.push_str("    outer loop\n");
        for v in mesh.triangle(index) {
            writeln!(out, "      vertex {} {} {}", v.x, v.y, v.z).map_err(fmt_err)?;
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    writeln!(out, "endsolid {name}").map_err(fmt_err)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn single_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.push_face(Vec3::ZERO, Vec3::X, Vec3::Y);
        mesh
    }

    #[test]
    fn binary_layout() {
        let bytes = to_binary_stl(&single_triangle(), "part").expect("export");
        assert_eq!(bytes.len(), 80 + 4 + 50);
        assert!(bytes.starts_with(b"binary STL: part"));
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);
        // normal z component
        let nz = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert_eq!(nz, 1.0);
        // second vertex x
        let x = f32::from_le_bytes([bytes[108], bytes[109], bytes[110], bytes[111]]);
        assert_eq!(x, 1.0);
    }

    #[test]
    fn long_names_are_truncated_in_header() {
        let name = "x".repeat(200);
        let bytes = to_binary_stl(&single_triangle(), &name).expect("export");
        assert_eq!(bytes.len(), 134);
    }

    #[test]
    fn ascii_facets() {
        let text = to_ascii_stl(&single_triangle(), "part").expect("export");
        assert!(text.starts_with("solid part\n"));
        assert!(text.contains("facet normal 0 0 1"));
        assert_eq!(text.matches("vertex").count(), 3);
        assert!(text.trim_end().ends_with("endsolid part"));
    }

    #[test]
    fn empty_mesh_is_an_export_error() {
        assert!(matches!(
            export(&Mesh::new(), StlFormat::Binary, "empty"),
            Err(ConvertError::Export(_))
        ));
    }

    #[test]
    fn out_of_range_index_is_an_export_error() {
        let mut mesh = single_triangle();
        mesh.indices[2] = 9;
        let err = to_ascii_stl(&mesh, "bad").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
