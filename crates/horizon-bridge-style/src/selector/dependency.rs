//! Dynamic-state dependencies recorded while matching.

use std::collections::{BTreeMap, BTreeSet};

/// Attribute and pseudo-class names a query examined on one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDependencies {
    /// Attribute names whose value can change the match result.
    pub attributes: BTreeSet<String>,
    /// Pseudo-class names whose state can change the match result.
    pub pseudo_classes: BTreeSet<String>,
}

/// Map from node to the dynamic features selectors looked at on it.
///
/// Entries are recorded whether or not the feature currently holds, so a
/// selector that does not match yet still registers interest in the state
/// that would make it match.
#[derive(Debug, Clone)]
pub struct DependencyMap<N> {
    entries: BTreeMap<N, NodeDependencies>,
}

impl<N> Default for DependencyMap<N> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<N: Copy + Ord> DependencyMap<N> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `node`'s attribute `name` was examined.
    pub fn add_attribute(&mut self, node: N, name: &str) {
        let entry = self.entries.entry(node).or_default();
        if !entry.attributes.contains(name) {
            entry.attributes.insert(name.to_string());
        }
    }

    /// Record that `node`'s pseudo-class `name` was examined.
    pub fn add_pseudo_class(&mut self, node: N, name: &str) {
        let entry = self.entries.entry(node).or_default();
        if !entry.pseudo_classes.contains(name) {
            entry.pseudo_classes.insert(name.to_string());
        }
    }

    /// The dependencies recorded for `node`.
    pub fn get(&self, node: N) -> Option<&NodeDependencies> {
        self.entries.get(&node)
    }

    /// Returns true if matching examined `node`'s attribute `name`.
    pub fn depends_on_attribute(&self, node: N, name: &str) -> bool {
        self.get(node)
            .is_some_and(|deps| deps.attributes.contains(name))
    }

    /// Returns true if matching examined `node`'s pseudo-class `name`.
    pub fn depends_on_pseudo_class(&self, node: N, name: &str) -> bool {
        self.get(node)
            .is_some_and(|deps| deps.pseudo_classes.contains(name))
    }

    /// Every node with recorded dependencies.
    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.entries.keys().copied()
    }

    /// Number of nodes with recorded dependencies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_per_node() {
        let mut deps = DependencyMap::new();
        deps.add_pseudo_class(1u32, "hover");
        deps.add_pseudo_class(1, "hover");
        deps.add_attribute(2, "enabled");

        assert!(deps.depends_on_pseudo_class(1, "hover"));
        assert!(!deps.depends_on_pseudo_class(2, "hover"));
        assert!(deps.depends_on_attribute(2, "enabled"));
        assert_eq!(deps.get(1).unwrap().pseudo_classes.len(), 1);
        assert_eq!(deps.nodes().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn empty_map() {
        let deps: DependencyMap<u32> = DependencyMap::new();
        assert!(deps.is_empty());
        assert!(!deps.depends_on_attribute(0, "x"));
    }
}
