//! The tree interface selectors match against.

use std::fmt::Debug;

use horizon_bridge_core::{NodeId, ViewTree};

/// Read access to the style identity and structure of a node tree.
///
/// Selector matching only ever reads through this trait, so matching works
/// on any tree that can answer these questions. [`ViewTree`] implements it
/// directly.
pub trait MatchTree {
    /// Handle identifying a node of the tree.
    type Node: Copy + Eq + Ord + Debug;

    /// The node's CSS type name.
    fn css_type(&self, node: Self::Node) -> &str;

    /// The node's CSS id, if any.
    fn css_id(&self, node: Self::Node) -> Option<&str>;

    /// Returns true if the node carries `class`.
    fn has_class(&self, node: Self::Node, class: &str) -> bool;

    /// Every class of the node.
    fn classes(&self, node: Self::Node) -> impl Iterator<Item = &str>;

    /// Returns true if the pseudo-class `name` is active on the node.
    fn has_pseudo_class(&self, node: Self::Node, name: &str) -> bool;

    /// The value of the node's attribute `name`.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// The node's parent.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The sibling immediately before the node.
    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;
}

// Destroyed nodes read as an untyped, classless root and never match.
impl MatchTree for ViewTree {
    type Node = NodeId;

    fn css_type(&self, node: NodeId) -> &str {
        ViewTree::css_type(self, node).unwrap_or("")
    }

    fn css_id(&self, node: NodeId) -> Option<&str> {
        ViewTree::css_id(self, node).ok().flatten()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        ViewTree::has_class(self, node, class).unwrap_or(false)
    }

    fn classes(&self, node: NodeId) -> impl Iterator<Item = &str> {
        ViewTree::classes(self, node).into_iter().flatten()
    }

    fn has_pseudo_class(&self, node: NodeId, name: &str) -> bool {
        ViewTree::has_pseudo_class(self, node, name).unwrap_or(false)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        ViewTree::attribute(self, node, name).ok().flatten()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        ViewTree::parent(self, node).ok().flatten()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        ViewTree::previous_sibling(self, node).ok().flatten()
    }
}
