mod deadline;
mod error;
mod export;
mod generation;
mod geometry;
mod import;
mod markup;
mod mesh;
mod pipeline;
mod preflight;
mod safe;
mod settings;
mod validate;

pub use deadline::Deadline;
pub use error::{ConvertError, Result, ValidationError};
pub use export::{export, to_ascii_stl, to_binary_stl, StlFormat};
pub use generation::{generate, spawn_generate, GenerateOptions, GenerationResult};
pub use geometry::*;
pub use import::{parse_outline, ParsedOutline};
pub use markup::MarkupCensus;
pub use mesh::{build_shapes, BuiltMesh, Mesh, MeshBuilder, PlanarShape};
pub use pipeline::{anchor_points, GeometryPipeline, ProcessedOutline};
pub use preflight::{run_preflight, BoundingBox, Issue, PreflightResult, PreflightStats, Severity};
pub use safe::{
    guarded, safe_close, safe_create_and_unite, safe_offset, safe_simplify, safe_unite, Checked,
    MIN_OFFSET,
};
pub use settings::ProfileSettings;
pub use validate::{check_compound, check_path, is_valid_compound, is_valid_path};
