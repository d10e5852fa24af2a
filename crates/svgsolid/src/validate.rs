//! Structural soundness checks applied before and after every geometry operation.

use crate::error::ValidationError;
use crate::geometry::{CompoundPath, Path};

/// Check a path against the validity invariants, reporting the first violation.
pub fn check_path(path: &Path) -> Result<(), ValidationError> {
    let count = path.segment_count();
    if count < 2 {
        return Err(ValidationError::TooFewSegments { count });
    }

    // Finiteness first: bounds and length are meaningless over NaN.
    if let Some(index) = path.segments().iter().position(|s| !s.is_finite()) {
        return Err(ValidationError::NonFiniteCoordinate { index });
    }

    let bounds = path.bounding_box();
    let (width, height) = (bounds.width(), bounds.height());
    if !width.is_finite() || !height.is_finite() || (width == 0.0 && height == 0.0) {
        return Err(ValidationError::DegenerateBounds { width, height });
    }

    let length = path.length();
    if !length.is_finite() || length <= 0.0 {
        return Err(ValidationError::ZeroLength { length });
    }

    Ok(())
}

/// Check a compound and every child.
pub fn check_compound(compound: &CompoundPath) -> Result<(), ValidationError> {
    if compound.is_empty() {
        return Err(ValidationError::EmptyCompound);
    }
    for (index, child) in compound.children().iter().enumerate() {
        check_path(child).map_err(|source| ValidationError::InvalidChild {
            index,
            source: Box::new(source),
        })?;
    }
    Ok(())
}

pub fn is_valid_path(path: &Path) -> bool {
    check_path(path).is_ok()
}

pub fn is_valid_compound(compound: &CompoundPath) -> bool {
    check_compound(compound).is_ok()
}
