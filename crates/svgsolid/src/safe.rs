//! Crash containment around every geometry kernel call.
//!
//! The kernels (clipper2, geo, earcutr) can panic or hand back corrupt outlines on
//! degenerate input. [`guarded`] turns such a call into a total function: the call
//! runs under `catch_unwind`, its output is validated, and any fault or invalid
//! result becomes a logged [`ConvertError::GeometryOperation`]. Timeouts pass
//! through untouched so they are never absorbed by a fallback.

use crate::deadline::Deadline;
use crate::error::{ConvertError, Result};
use crate::geometry::boolean::unite;
use crate::geometry::offset::offset_path;
use crate::geometry::simplify::simplify_path;
use crate::geometry::{CompoundPath, Path};
use crate::validate::{is_valid_compound, is_valid_path};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Offsets with a smaller magnitude than this are no-ops.
pub const MIN_OFFSET: f64 = 0.001;

/// Output validation applied by [`guarded`].
pub trait Checked {
    fn is_sound(&self) -> bool;
}

impl Checked for Path {
    fn is_sound(&self) -> bool {
        is_valid_path(self)
    }
}

impl Checked for CompoundPath {
    fn is_sound(&self) -> bool {
        is_valid_compound(self)
    }
}

impl Checked for Vec<usize> {
    fn is_sound(&self) -> bool {
        true
    }
}

/// Run a kernel call under crash containment and validate what it returns.
pub fn guarded<T, F>(name: &'static str, op: F) -> Result<T>
where
    T: Checked,
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) if value.is_sound() => Ok(value),
        Ok(Ok(_)) => {
            warn!(operation = name, "kernel returned structurally invalid geometry");
            Err(ConvertError::kernel(name, "kernel returned invalid geometry"))
        }
        Ok(Err(err)) if err.is_timeout() => Err(err),
        Ok(Err(err)) => {
            warn!(operation = name, error = %err, "kernel call failed");
            Err(match err {
                ConvertError::GeometryOperation { .. } => err,
                other => ConvertError::kernel(name, other.to_string()),
            })
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            warn!(operation = name, %reason, "kernel call panicked");
            Err(ConvertError::kernel(name, format!("panicked: {reason}")))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Close an open path. Returns the input unchanged if closing fails.
pub fn safe_close(path: &Path) -> Path {
    if path.is_closed() {
        return path.clone();
    }
    guarded("close", || Ok(path.closed())).unwrap_or_else(|_| path.clone())
}

/// Simplify at `tolerance`. No-op when the tolerance is not positive or the input is
/// invalid; returns the input when simplification fails.
pub fn safe_simplify(path: &Path, tolerance: f64, deadline: &Deadline) -> Result<Path> {
    if tolerance <= 0.0 || !is_valid_path(path) {
        return Ok(path.clone());
    }
    deadline.check("simplify")?;
    let result = guarded("simplify", || simplify_path(path, tolerance));
    deadline.check("simplify")?;
    match result {
        Ok(simplified) => Ok(simplified),
        Err(err) if err.is_timeout() => Err(err),
        Err(_) => Ok(path.clone()),
    }
}

/// Offset by `delta`. Identity when `|delta| < MIN_OFFSET`; returns the input when the
/// kernel fails so the caller always has an outline to continue with.
pub fn safe_offset(path: &Path, delta: f64, deadline: &Deadline) -> Result<Path> {
    if delta.abs() < MIN_OFFSET || !delta.is_finite() {
        return Ok(path.clone());
    }
    deadline.check("offset")?;
    let result = guarded("offset", || offset_path(path, delta));
    deadline.check("offset")?;
    match result {
        Ok(offset) => Ok(offset),
        Err(err) if err.is_timeout() => Err(err),
        Err(_) => Ok(path.clone()),
    }
}

/// Union two regions. `None` when either input is invalid or the kernel fails.
pub fn safe_unite(
    a: &CompoundPath,
    b: &CompoundPath,
    deadline: &Deadline,
) -> Result<Option<CompoundPath>> {
    if !is_valid_compound(a) || !is_valid_compound(b) {
        debug!("skipping union of invalid input");
        return Ok(None);
    }
    deadline.check("union")?;
    let result = guarded("union", || unite(a, b));
    deadline.check("union")?;
    match result {
        Ok(united) => Ok(Some(united)),
        Err(err) if err.is_timeout() => Err(err),
        Err(_) => Ok(None),
    }
}

/// Build one region from the valid members of `paths`, resolving overlaps by uniting
/// it with itself. Paths are read by orientation under the non-zero rule, so
/// clockwise paths only cut holes where they lie inside counter-clockwise ones.
/// Falls back to the un-united region if the union fails; `None` only when no
/// path is valid.
pub fn safe_create_and_unite(paths: &[Path], deadline: &Deadline) -> Result<Option<CompoundPath>> {
    let valid: Vec<Path> = paths.iter().filter(|p| is_valid_path(p)).cloned().collect();
    if valid.is_empty() {
        return Ok(None);
    }
    if valid.len() < paths.len() {
        debug!(dropped = paths.len() - valid.len(), "invalid paths left out of region");
    }

    let compound = CompoundPath::new(valid);
    match safe_unite(&compound, &compound, deadline)? {
        Some(united) => Ok(Some(united)),
        None => {
            warn!("union failed, keeping the un-united region");
            Ok(Some(compound))
        }
    }
}
