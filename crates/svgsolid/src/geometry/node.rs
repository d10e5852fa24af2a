use crate::geometry::path::Path;
use crate::geometry::region::CompoundPath;

/// One node of an imported outline document.
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineNode {
    /// A single-subpath outline.
    Path(Path),
    /// An outline element made of several subpaths.
    Compound(CompoundPath),
    /// A group or layer containing further nodes.
    Group(OutlineGroup),
}

/// A named container of nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlineGroup {
    pub id: Option<String>,
    pub children: Vec<OutlineNode>,
}

impl OutlineGroup {
    pub fn new(id: Option<String>, children: Vec<OutlineNode>) -> Self {
        Self { id, children }
    }
}

impl OutlineNode {
    /// Total number of paths beneath this node, valid or not.
    pub fn path_count(&self) -> usize {
        match self {
            OutlineNode::Path(_) => 1,
            OutlineNode::Compound(compound) => compound.len(),
            OutlineNode::Group(group) => group.children.iter().map(OutlineNode::path_count).sum(),
        }
    }

    /// Deepest group nesting beneath (and including) this node.
    pub fn depth(&self) -> usize {
        match self {
            OutlineNode::Path(_) | OutlineNode::Compound(_) => 0,
            OutlineNode::Group(group) => {
                1 + group
                    .children
                    .iter()
                    .map(OutlineNode::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Path {
        Path::rectangle(0.0, 0.0, 1.0, 1.0)
    }

    #[test]
    fn path_count_recurses_through_groups() {
        let tree = OutlineNode::Group(OutlineGroup::new(
            Some("layer".to_string()),
            vec![
                OutlineNode::Path(square()),
                OutlineNode::Group(OutlineGroup::new(
                    None,
                    vec![OutlineNode::Compound(CompoundPath::new(vec![square(), square()]))],
                )),
            ],
        ));
        assert_eq!(tree.path_count(), 3);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn leaf_nodes_have_zero_depth() {
        assert_eq!(OutlineNode::Path(square()).depth(), 0);
        assert_eq!(OutlineNode::Group(OutlineGroup::default()).depth(), 1);
    }
}
