use crate::geometry::path::{Orientation, Path};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// How overlapping children of one outline element decide what is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillRule {
    /// Filled wherever the winding number is not zero.
    #[default]
    NonZero,
    /// Filled wherever a ray crosses the outline an odd number of times.
    EvenOdd,
}

/// A region built from several paths. Nesting and orientation decide which
/// children are solid outlines and which are holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompoundPath {
    children: Vec<Path>,
    #[serde(default)]
    fill_rule: FillRule,
}

impl CompoundPath {
    pub fn new(children: Vec<Path>) -> Self {
        Self {
            children,
            fill_rule: FillRule::NonZero,
        }
    }

    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn children(&self) -> &[Path] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Path> {
        self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Union of the children's bounds, or `None` for an empty compound.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.children
            .iter()
            .map(Path::bounding_box)
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Net area: solids count positive, clockwise holes negative.
    pub fn signed_area(&self) -> f64 {
        self.children.iter().map(Path::signed_area).sum()
    }

    pub fn segment_count(&self) -> usize {
        self.children.iter().map(Path::segment_count).sum()
    }

    /// Number of children traversed clockwise.
    pub fn hole_count(&self) -> usize {
        self.children
            .iter()
            .filter(|p| p.orientation() == Orientation::Clockwise)
            .count()
    }
}
