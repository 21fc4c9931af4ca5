//! The view tree.
//!
//! [`ViewTree`] is an arena of nodes mirroring the toolkit's component tree.
//! Each node carries the identity the selector engine matches against (type,
//! id, classes, pseudo-classes, attributes), its property slots, and the
//! native-sync state for the platform view bound to it.
//!
//! # Key Types
//!
//! - [`NodeId`] - Stable handle to a node
//! - [`ViewTree`] - Owns every node and its property values
//! - [`StyleInvalidation`] - Mutation events the styling layer consumes
//! - [`NodeValues`] - Read-only view of one node, passed to coercion callbacks
//!
//! Mutations that can change which selectors match a node are recorded as
//! [`StyleInvalidation`]s; the host drains them with
//! [`ViewTree::take_style_invalidations`]. Identical pending entries are
//! collapsed, but distinct ones accumulate until drained, so a host that
//! never styles the tree should drain and discard them periodically.

mod native;
mod properties;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TreeError};
use crate::logging::targets;
use crate::property::slot::PropertySlot;
use crate::property::{Property, PropertyId, PropertyRegistry, PropertyType};

pub use native::{BatchGuard, NativeView};
use native::NativeState;

new_key_type! {
    /// A unique identifier for a node in a [`ViewTree`].
    ///
    /// `NodeId`s stay valid while the tree is restructured and become invalid
    /// when the node is destroyed.
    pub struct NodeId;
}

impl NodeId {
    /// Convert the NodeId to a raw u64 value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

/// A tree mutation that may change which selectors match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleInvalidation {
    /// A node was created as a new root.
    Created(NodeId),
    /// The node's type, id or classes changed, or its previous sibling did.
    Structure(NodeId),
    /// A pseudo-class was added to or removed from the node.
    PseudoClass {
        /// The node.
        node: NodeId,
        /// The pseudo-class name.
        name: String,
    },
    /// An attribute of the node was set or removed.
    Attribute {
        /// The node.
        node: NodeId,
        /// The attribute name.
        name: String,
    },
    /// The node was attached under a new parent.
    Attached(NodeId),
    /// The node was detached from its parent and is now a root.
    Detached(NodeId),
    /// The node no longer exists.
    Destroyed(NodeId),
}

/// Internal data stored for each node.
struct NodeData {
    css_type: String,
    id: Option<String>,
    classes: BTreeSet<String>,
    pseudo_classes: BTreeSet<String>,
    attributes: HashMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: BTreeMap<PropertyId, PropertySlot>,
    native: NativeState,
    layout_requested: bool,
}

impl NodeData {
    fn new(css_type: String) -> Self {
        Self {
            css_type,
            id: None,
            classes: BTreeSet::new(),
            pseudo_classes: BTreeSet::new(),
            attributes: HashMap::new(),
            parent: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
            native: NativeState::default(),
            layout_requested: false,
        }
    }
}

/// Arena holding every node of a component tree and its property values.
///
/// # Related Types
///
/// - [`PropertyRegistry`] - Descriptor table consulted on every property write
/// - [`NodeTreeDebug`](crate::logging::NodeTreeDebug) - Debug dump of the tree
pub struct ViewTree {
    registry: Arc<PropertyRegistry>,
    nodes: SlotMap<NodeId, NodeData>,
    layout_requests: Vec<NodeId>,
    invalidations: Vec<StyleInvalidation>,
    pending: HashSet<StyleInvalidation>,
}

impl ViewTree {
    /// Create an empty tree whose nodes use `registry`'s descriptors.
    pub fn new(registry: PropertyRegistry) -> Self {
        Self::with_registry(Arc::new(registry))
    }

    /// Create an empty tree sharing an existing registry.
    pub fn with_registry(registry: Arc<PropertyRegistry>) -> Self {
        Self {
            registry,
            nodes: SlotMap::with_key(),
            layout_requests: Vec::new(),
            invalidations: Vec::new(),
            pending: HashSet::new(),
        }
    }

    /// The descriptor table.
    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.registry
    }

    fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(id).ok_or_else(|| TreeError::InvalidNode.into())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::InvalidNode.into())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a detached node of the given CSS type.
    pub fn create_node(&mut self, css_type: impl Into<String>) -> NodeId {
        let css_type = css_type.into();
        tracing::trace!(target: targets::TREE, css_type = %css_type, "creating node");
        let id = self.nodes.insert(NodeData::new(css_type));
        self.invalidate(StyleInvalidation::Created(id));
        id
    }

    /// Destroy a node and all of its descendants.
    #[tracing::instrument(skip(self), target = "horizon_bridge_core::tree", level = "trace")]
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        let doomed = self.preorder(id)?;
        tracing::trace!(target: targets::TREE, ?id, node_count = doomed.len(), "destroying subtree");

        if let Some(parent) = self.node(id)?.parent {
            let next = self.next_sibling(id)?;
            self.node_mut(parent)?.children.retain(|&child| child != id);
            if let Some(next) = next {
                self.invalidate(StyleInvalidation::Structure(next));
            }
        }

        for node in doomed {
            self.nodes.remove(node);
            self.invalidate(StyleInvalidation::Destroyed(node));
        }
        self.layout_requests.retain(|node| self.nodes.contains_key(*node));
        Ok(())
    }

    /// Check if a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get the number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Attach `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.node(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Attach `child` under `parent` at `index` (clamped to the child count).
    ///
    /// The child must currently be a root. Inheritable values flow from the
    /// parent into the child's subtree with native pushes batched.
    #[tracing::instrument(skip(self), target = "horizon_bridge_core::tree", level = "trace")]
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.node(child)?;
        self.node(parent)?;
        if self.node(child)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached.into());
        }
        if self.is_ancestor_of(child, parent) {
            return Err(TreeError::CircularParentage.into());
        }

        let parent_data = self.node_mut(parent)?;
        let index = index.min(parent_data.children.len());
        parent_data.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);

        let subtree = self.preorder(child)?;
        self.suspend_all(&subtree);
        let inherited = self.inherit_from_parent(child);
        let resumed = self.resume_all(&subtree);
        inherited?;
        resumed?;

        self.invalidate(StyleInvalidation::Attached(child));
        Ok(())
    }

    /// Detach `child` from its parent, making it a root.
    ///
    /// Every value the subtree inherited through the old parent is cleared.
    #[tracing::instrument(skip(self), target = "horizon_bridge_core::tree", level = "trace")]
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        let next = self.next_sibling(child)?;
        self.node_mut(parent)?.children.retain(|&c| c != child);
        self.node_mut(child)?.parent = None;

        let subtree = self.preorder(child)?;
        self.suspend_all(&subtree);
        let cleared = self.clear_inherited(child);
        let resumed = self.resume_all(&subtree);
        cleared?;
        resumed?;

        if let Some(next) = next {
            self.invalidate(StyleInvalidation::Structure(next));
        }
        self.invalidate(StyleInvalidation::Detached(child));
        Ok(())
    }

    /// Check if `ancestor` is `id` or one of its ancestors.
    fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == ancestor {
                return true;
            }
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Get the children of a node.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children.as_slice())
    }

    /// Get the sibling directly before a node.
    pub fn previous_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        let siblings = &self.node(parent)?.children;
        Ok(siblings
            .iter()
            .position(|&child| child == id)
            .and_then(|pos| pos.checked_sub(1))
            .map(|pos| siblings[pos]))
    }

    /// Get the sibling directly after a node.
    pub fn next_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        let siblings = &self.node(parent)?.children;
        Ok(siblings
            .iter()
            .position(|&child| child == id)
            .and_then(|pos| siblings.get(pos + 1).copied()))
    }

    /// Get all siblings after a node, nearest first.
    pub fn following_siblings(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(Vec::new());
        };
        let siblings = &self.node(parent)?.children;
        Ok(siblings
            .iter()
            .position(|&child| child == id)
            .map(|pos| siblings[pos + 1..].to_vec())
            .unwrap_or_default())
    }

    /// Get all ancestors of a node from immediate parent to root.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.node(id)?.parent;
        while let Some(current_id) = current {
            result.push(current_id);
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        Ok(result)
    }

    /// Depth-first pre-order traversal: the node, then each child's subtree.
    pub fn preorder(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        self.preorder_recursive(id, &mut result)?;
        Ok(result)
    }

    fn preorder_recursive(&self, id: NodeId, result: &mut Vec<NodeId>) -> Result<()> {
        let data = self.node(id)?;
        result.push(id);
        for &child in &data.children {
            self.preorder_recursive(child, result)?;
        }
        Ok(())
    }

    /// Iterate over all root nodes (nodes with no parent).
    pub fn root_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, data)| data.parent.is_none())
            .map(|(id, _)| id)
    }

    // =========================================================================
    // Style identity
    // =========================================================================

    /// The node's CSS type name.
    pub fn css_type(&self, id: NodeId) -> Result<&str> {
        Ok(&self.node(id)?.css_type)
    }

    /// Change the node's CSS type name.
    pub fn set_css_type(&mut self, id: NodeId, css_type: impl Into<String>) -> Result<()> {
        let css_type = css_type.into();
        let data = self.node_mut(id)?;
        if data.css_type != css_type {
            data.css_type = css_type;
            self.invalidate(StyleInvalidation::Structure(id));
        }
        Ok(())
    }

    /// The node's CSS id.
    pub fn css_id(&self, id: NodeId) -> Result<Option<&str>> {
        Ok(self.node(id)?.id.as_deref())
    }

    /// Set or clear the node's CSS id.
    pub fn set_css_id(&mut self, id: NodeId, css_id: Option<String>) -> Result<()> {
        let data = self.node_mut(id)?;
        if data.id != css_id {
            data.id = css_id;
            self.invalidate(StyleInvalidation::Structure(id));
        }
        Ok(())
    }

    /// The node's classes, sorted.
    pub fn classes(&self, id: NodeId) -> Result<impl Iterator<Item = &str> + '_> {
        Ok(self.node(id)?.classes.iter().map(String::as_str))
    }

    /// Check whether the node has a class.
    pub fn has_class(&self, id: NodeId, class: &str) -> Result<bool> {
        Ok(self.node(id)?.classes.contains(class))
    }

    /// Add a class. Returns `true` if it was not already present.
    pub fn add_class(&mut self, id: NodeId, class: impl Into<String>) -> Result<bool> {
        let added = self.node_mut(id)?.classes.insert(class.into());
        if added {
            self.invalidate(StyleInvalidation::Structure(id));
        }
        Ok(added)
    }

    /// Remove a class. Returns `true` if it was present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<bool> {
        let removed = self.node_mut(id)?.classes.remove(class);
        if removed {
            self.invalidate(StyleInvalidation::Structure(id));
        }
        Ok(removed)
    }

    /// Replace the node's classes with a whitespace-separated list.
    pub fn set_class_names(&mut self, id: NodeId, names: &str) -> Result<()> {
        let classes: BTreeSet<String> = names.split_whitespace().map(str::to_string).collect();
        let data = self.node_mut(id)?;
        if data.classes != classes {
            data.classes = classes;
            self.invalidate(StyleInvalidation::Structure(id));
        }
        Ok(())
    }

    /// Check whether a pseudo-class is active on the node.
    pub fn has_pseudo_class(&self, id: NodeId, name: &str) -> Result<bool> {
        Ok(self.node(id)?.pseudo_classes.contains(name))
    }

    /// The node's active pseudo-classes, sorted.
    pub fn pseudo_classes(&self, id: NodeId) -> Result<impl Iterator<Item = &str> + '_> {
        Ok(self.node(id)?.pseudo_classes.iter().map(String::as_str))
    }

    /// Activate a pseudo-class such as `hover` or `pressed`.
    pub fn add_pseudo_class(&mut self, id: NodeId, name: impl Into<String>) -> Result<bool> {
        let name = name.into();
        let added = self.node_mut(id)?.pseudo_classes.insert(name.clone());
        if added {
            self.invalidate(StyleInvalidation::PseudoClass { node: id, name });
        }
        Ok(added)
    }

    /// Deactivate a pseudo-class.
    pub fn remove_pseudo_class(&mut self, id: NodeId, name: &str) -> Result<bool> {
        let removed = self.node_mut(id)?.pseudo_classes.remove(name);
        if removed {
            self.invalidate(StyleInvalidation::PseudoClass {
                node: id,
                name: name.to_string(),
            });
        }
        Ok(removed)
    }

    /// Read a named attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> Result<Option<&str>> {
        Ok(self.node(id)?.attributes.get(name).map(String::as_str))
    }

    /// Set a named attribute.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        let value = value.into();
        let data = self.node_mut(id)?;
        if data.attributes.get(&name) != Some(&value) {
            data.attributes.insert(name.clone(), value);
            self.invalidate(StyleInvalidation::Attribute { node: id, name });
        }
        Ok(())
    }

    /// Remove a named attribute. Returns the old value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        let old = self.node_mut(id)?.attributes.remove(name);
        if old.is_some() {
            self.invalidate(StyleInvalidation::Attribute {
                node: id,
                name: name.to_string(),
            });
        }
        Ok(old)
    }

    // =========================================================================
    // Host queues
    // =========================================================================

    fn request_layout(&mut self, id: NodeId) {
        if let Some(data) = self.nodes.get_mut(id) {
            if !data.layout_requested {
                data.layout_requested = true;
                self.layout_requests.push(id);
            }
        }
    }

    /// Drain nodes whose layout-affecting properties changed, in request order.
    pub fn take_layout_requests(&mut self) -> Vec<NodeId> {
        let requests = std::mem::take(&mut self.layout_requests);
        for &id in &requests {
            if let Some(data) = self.nodes.get_mut(id) {
                data.layout_requested = false;
            }
        }
        requests
    }

    /// Drain recorded style invalidations, oldest first.
    ///
    /// An event identical to one still pending is recorded only once, at
    /// its first position.
    pub fn take_style_invalidations(&mut self) -> Vec<StyleInvalidation> {
        self.pending.clear();
        std::mem::take(&mut self.invalidations)
    }

    /// Put events back at the front of the queue, ahead of anything
    /// recorded since they were taken.
    pub fn restore_style_invalidations(&mut self, events: Vec<StyleInvalidation>) {
        let newer = std::mem::take(&mut self.invalidations);
        self.pending.clear();
        for event in events.into_iter().chain(newer) {
            self.invalidate(event);
        }
    }

    fn invalidate(&mut self, event: StyleInvalidation) {
        if self.pending.insert(event.clone()) {
            self.invalidations.push(event);
        }
    }

    /// Check whether invalidations are waiting to be drained.
    pub fn has_style_invalidations(&self) -> bool {
        !self.invalidations.is_empty()
    }
}

impl fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewTree")
            .field("nodes", &self.nodes.len())
            .field("registry", &self.registry)
            .field("pending_invalidations", &self.invalidations.len())
            .finish()
    }
}

/// Read-only access to one node's resolved property values.
///
/// Handed to coercion and shorthand-composition callbacks.
#[derive(Clone, Copy)]
pub struct NodeValues<'a> {
    tree: &'a ViewTree,
    node: NodeId,
}

impl<'a> NodeValues<'a> {
    pub(crate) fn new(tree: &'a ViewTree, node: NodeId) -> Self {
        Self { tree, node }
    }

    /// The node being read.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The resolved value of `property`.
    ///
    /// `None` if the node is gone or the handle belongs to another registry.
    pub fn get<T: PropertyType>(&self, property: Property<T>) -> Option<T> {
        self.tree.get(self.node, property).ok()
    }
}

impl fmt::Debug for NodeValues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeValues").field("node", &self.node).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ViewTree {
        ViewTree::new(PropertyRegistry::new())
    }

    #[test]
    fn append_and_siblings() {
        let mut tree = tree();
        let root = tree.create_node("StackLayout");
        let a = tree.create_node("Label");
        let b = tree.create_node("Button");
        let c = tree.create_node("Label");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, c).unwrap();
        tree.insert_child(root, 1, b).unwrap();

        assert_eq!(tree.children(root).unwrap(), &[a, b, c]);
        assert_eq!(tree.previous_sibling(b).unwrap(), Some(a));
        assert_eq!(tree.previous_sibling(a).unwrap(), None);
        assert_eq!(tree.next_sibling(b).unwrap(), Some(c));
        assert_eq!(tree.following_siblings(a).unwrap(), vec![b, c]);
        assert_eq!(tree.ancestors(a).unwrap(), vec![root]);
        assert_eq!(tree.preorder(root).unwrap(), vec![root, a, b, c]);
    }

    #[test]
    fn attach_rejects_cycles_and_double_parents() {
        let mut tree = tree();
        let root = tree.create_node("StackLayout");
        let child = tree.create_node("StackLayout");
        tree.append_child(root, child).unwrap();

        assert!(matches!(
            tree.append_child(child, root),
            Err(crate::BridgeError::Tree(TreeError::CircularParentage))
        ));
        let other = tree.create_node("StackLayout");
        assert!(matches!(
            tree.append_child(other, child),
            Err(crate::BridgeError::Tree(TreeError::AlreadyAttached))
        ));
    }

    #[test]
    fn destroy_removes_subtree() {
        let mut tree = tree();
        let root = tree.create_node("StackLayout");
        let child = tree.create_node("StackLayout");
        let grandchild = tree.create_node("Label");
        tree.append_child(root, child).unwrap();
        tree.append_child(child, grandchild).unwrap();

        tree.destroy(child).unwrap();
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn mutations_record_invalidations() {
        let mut tree = tree();
        let root = tree.create_node("StackLayout");
        let a = tree.create_node("Label");
        let b = tree.create_node("Label");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        tree.take_style_invalidations();

        tree.add_class(a, "title").unwrap();
        tree.add_class(a, "title").unwrap();
        tree.add_pseudo_class(a, "hover").unwrap();
        tree.set_attribute(a, "text", "hi").unwrap();
        tree.set_attribute(a, "text", "hi").unwrap();
        tree.detach(a).unwrap();

        assert_eq!(
            tree.take_style_invalidations(),
            vec![
                StyleInvalidation::Structure(a),
                StyleInvalidation::PseudoClass { node: a, name: "hover".into() },
                StyleInvalidation::Attribute { node: a, name: "text".into() },
                StyleInvalidation::Structure(b),
                StyleInvalidation::Detached(a),
            ]
        );
        assert!(!tree.has_style_invalidations());
    }

    #[test]
    fn repeated_invalidations_collapse_until_drained() {
        let mut tree = tree();
        let node = tree.create_node("Button");
        for _ in 0..100 {
            tree.add_pseudo_class(node, "hover").unwrap();
            tree.remove_pseudo_class(node, "hover").unwrap();
            tree.add_class(node, "busy").unwrap();
            tree.remove_class(node, "busy").unwrap();
        }
        assert_eq!(
            tree.take_style_invalidations(),
            vec![
                StyleInvalidation::Created(node),
                StyleInvalidation::PseudoClass { node, name: "hover".into() },
                StyleInvalidation::Structure(node),
            ]
        );

        tree.add_class(node, "busy").unwrap();
        assert_eq!(tree.take_style_invalidations(), vec![StyleInvalidation::Structure(node)]);
    }

    #[test]
    fn restored_invalidations_precede_newer_ones() {
        let mut tree = tree();
        let a = tree.create_node("Label");
        let taken = tree.take_style_invalidations();
        let b = tree.create_node("Label");
        tree.add_class(a, "title").unwrap();

        tree.restore_style_invalidations(taken);
        tree.create_node("Label");
        assert_eq!(
            tree.take_style_invalidations()[..3],
            [
                StyleInvalidation::Created(a),
                StyleInvalidation::Created(b),
                StyleInvalidation::Structure(a),
            ]
        );
    }

    #[test]
    fn class_names_replace_set() {
        let mut tree = tree();
        let node = tree.create_node("Label");
        tree.set_class_names(node, "  big  red ").unwrap();
        assert_eq!(tree.classes(node).unwrap().collect::<Vec<_>>(), vec!["big", "red"]);
        assert!(tree.has_class(node, "red").unwrap());
    }

    #[test]
    fn destroyed_node_is_invalid() {
        let mut tree = tree();
        let node = tree.create_node("Label");
        tree.destroy(node).unwrap();
        assert!(matches!(
            tree.css_type(node),
            Err(crate::BridgeError::Tree(TreeError::InvalidNode))
        ));
    }
}
