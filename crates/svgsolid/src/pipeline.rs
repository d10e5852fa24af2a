use crate::deadline::Deadline;
use crate::error::{ConvertError, Result};
use crate::geometry::boolean::resolve_nesting;
use crate::geometry::{CompoundPath, Orientation, Path};
use crate::import::{parse_outline, ParsedOutline};
use crate::preflight::{run_preflight, PreflightResult};
use crate::safe::{safe_close, safe_create_and_unite, safe_offset, safe_simplify, MIN_OFFSET};
use crate::settings::ProfileSettings;
use crate::validate::{check_path, is_valid_path};
use tracing::{debug, info, warn};

/// The single region produced by [`GeometryPipeline::process`].
#[derive(Debug, Clone)]
pub struct ProcessedOutline {
    pub compound: CompoundPath,
    /// Paths dropped or left unmodified along the way.
    pub warnings: Vec<String>,
}

/// Working context for one conversion request.
///
/// Nothing is shared between pipelines; every stage works on its own copies.
#[derive(Debug, Clone)]
pub struct GeometryPipeline {
    settings: ProfileSettings,
    deadline: Deadline,
}

impl GeometryPipeline {
    pub fn new(settings: ProfileSettings) -> Self {
        Self {
            settings,
            deadline: Deadline::none(),
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn settings(&self) -> &ProfileSettings {
        &self.settings
    }

    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    pub fn parse(&self, markup: &str) -> Result<ParsedOutline> {
        self.deadline.check("parse")?;
        let parsed = parse_outline(markup)?;
        info!(
            paths = parsed.paths.len(),
            rejected = parsed.rejected,
            "parsed outlines"
        );
        Ok(parsed)
    }

    pub fn preflight(&self, parsed: &ParsedOutline) -> PreflightResult {
        let result = run_preflight(parsed, &self.settings);
        info!(
            passed = result.passed,
            issues = result.issues.len(),
            "preflight finished"
        );
        result
    }

    /// Turn parsed outlines into one validated region.
    ///
    /// Each markup element is cleaned and resolved into solids and holes under its
    /// own fill rule before offsetting, so holes shrink when solids grow. Elements
    /// are only combined by the final union.
    ///
    /// Does not consult preflight; blocking on a failing preflight is the caller's call.
    pub fn process(&self, parsed: &ParsedOutline) -> Result<ProcessedOutline> {
        let mut warnings = Vec::new();
        let settings = &self.settings;

        let mut elements = Vec::with_capacity(parsed.elements.len());
        let mut index = 0usize;
        for element in &parsed.elements {
            let mut cleaned = Vec::with_capacity(element.len());
            for path in element.children() {
                let current = index;
                index += 1;
                if let Some(path) = self.clean_path(current, path, &mut warnings)? {
                    cleaned.push(path);
                }
            }
            if !cleaned.is_empty() {
                elements.push(resolve_nesting(cleaned, element.fill_rule()));
            }
        }
        if elements.is_empty() {
            return Err(ConvertError::processing(
                "simplify",
                "No valid paths remained after closing and simplification. \
                 Try a smaller simplify tolerance or clean up the source shape.",
            ));
        }
        debug!(elements = elements.len(), "paths closed, simplified and nested");

        if settings.offset.abs() > MIN_OFFSET {
            let mut index = 0usize;
            for rings in &mut elements {
                for ring in rings.iter_mut() {
                    // Holes move against the solid so the material grows or shrinks as one.
                    let delta = match ring.orientation() {
                        Orientation::Clockwise => -settings.offset,
                        Orientation::CounterClockwise => settings.offset,
                    };
                    let moved = safe_offset(ring, delta, &self.deadline)?;
                    if is_valid_path(&moved) {
                        *ring = moved;
                    } else {
                        warn!(index, "offset produced an invalid path, keeping the original");
                        warnings.push(format!("path {index}: offset failed, original kept"));
                    }
                    index += 1;
                }
            }
            debug!(offset = settings.offset, "paths offset");
        }

        let mut survivors: Vec<Path> = Vec::new();
        let threshold = settings.remove_islands_threshold;
        let mut removed = 0usize;
        for rings in elements {
            if threshold > 0.0 {
                removed += remove_islands(rings, threshold, &mut survivors);
            } else {
                survivors.extend(rings);
            }
        }
        if removed > 0 {
            debug!(removed, threshold, "islands removed");
            warnings.push(format!("{removed} island(s) below area {threshold} removed"));
        }
        if !survivors.iter().any(|p| p.orientation() == Orientation::CounterClockwise) {
            return Err(ConvertError::processing(
                "islands",
                format!(
                    "Every shape is smaller than the remove-islands threshold ({threshold}). \
                     Reduce the remove-islands threshold."
                ),
            ));
        }

        let compound = safe_create_and_unite(&survivors, &self.deadline)?.ok_or_else(|| {
            ConvertError::processing(
                "union",
                "Could not combine the shapes into one region. \
                 Simplify the source shape or remove overlapping details.",
            )
        })?;
        info!(
            paths = compound.len(),
            holes = compound.hole_count(),
            "region built"
        );

        Ok(ProcessedOutline { compound, warnings })
    }

    /// Close and simplify one path; `None` when a step leaves it invalid.
    fn clean_path(
        &self,
        index: usize,
        path: &Path,
        warnings: &mut Vec<String>,
    ) -> Result<Option<Path>> {
        self.deadline.check("close")?;
        if !is_valid_path(path) {
            return Ok(None);
        }
        let closed = safe_close(path);
        if let Err(reason) = check_path(&closed) {
            drop_path(warnings, index, "closing", &reason.to_string());
            return Ok(None);
        }
        if self.settings.simplify_tolerance <= 0.0 {
            return Ok(Some(closed));
        }
        let simplified = safe_simplify(&closed, self.settings.simplify_tolerance, &self.deadline)?;
        match check_path(&simplified) {
            Ok(()) => Ok(Some(simplified)),
            Err(reason) => {
                drop_path(warnings, index, "simplification", &reason.to_string());
                Ok(None)
            }
        }
    }
}

/// Move the rings of one nested element into `kept`, leaving out solids below
/// `threshold` together with their holes, and holes below it. Returns how many
/// rings were left out.
fn remove_islands(rings: Vec<Path>, threshold: f64, kept: &mut Vec<Path>) -> usize {
    let mut removed = 0;
    let mut parent_removed = false;
    for ring in rings {
        let small = ring.area() < threshold;
        if ring.orientation() == Orientation::CounterClockwise {
            parent_removed = small;
        }
        if small || parent_removed {
            removed += 1;
        } else {
            kept.push(ring);
        }
    }
    removed
}

fn drop_path(warnings: &mut Vec<String>, index: usize, stage: &str, reason: &str) {
    warn!(index, stage, reason, "path dropped");
    warnings.push(format!("path {index} dropped after {stage}: {reason}"));
}

/// Paths of a processed region with their coordinates, used for determinism checks.
pub fn anchor_points(compound: &CompoundPath) -> Vec<Vec<(f64, f64)>> {
    compound
        .children()
        .iter()
        .map(|path: &Path| path.segments().iter().map(|s| (s.point.x, s.point.y)).collect())
        .collect()
}
