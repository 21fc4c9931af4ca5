//! Result of querying a stylesheet for one node.

use std::sync::Arc;

use crate::rules::{IndexEntry, RuleSet};
use crate::selector::{DependencyMap, MatchTree, Selector};

/// A selector that survived a query.
#[derive(Debug, Clone)]
pub struct MatchedSelector {
    rule: Arc<RuleSet>,
    selector: usize,
    specificity: u32,
    position: usize,
}

impl MatchedSelector {
    pub(crate) fn from_entry(entry: &IndexEntry) -> Self {
        Self {
            rule: Arc::clone(entry.rule()),
            selector: entry.selector_index(),
            specificity: entry.selector().specificity(),
            position: entry.position(),
        }
    }

    /// The rule set whose declarations apply when the selector matches.
    pub fn rule(&self) -> &RuleSet {
        &self.rule
    }

    /// The selector.
    pub fn selector(&self) -> &Selector {
        &self.rule.selectors()[self.selector]
    }

    /// The selector's specificity.
    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    /// The selector's position in stylesheet order.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Selectors that may apply to a node, with the dynamic state they read.
///
/// Static selectors in the result match the node. Dynamic ones could match
/// under some attribute or pseudo-class state; [`matching`](Self::matching)
/// filters them by the current state. The dependency map records every
/// dynamic feature examined, so the host can tell which state changes need
/// a restyle without querying again.
#[derive(Debug, Clone)]
pub struct SelectorQuery<N> {
    selectors: Vec<MatchedSelector>,
    dependencies: DependencyMap<N>,
}

impl<N: Copy + Ord> SelectorQuery<N> {
    /// An empty result.
    pub fn empty() -> Self {
        Self {
            selectors: Vec::new(),
            dependencies: DependencyMap::new(),
        }
    }

    pub(crate) fn new(mut selectors: Vec<MatchedSelector>, dependencies: DependencyMap<N>) -> Self {
        selectors.sort_by_key(|s| (s.specificity, s.position));
        Self {
            selectors,
            dependencies,
        }
    }

    /// Surviving selectors in ascending `(specificity, position)` order.
    pub fn selectors(&self) -> &[MatchedSelector] {
        &self.selectors
    }

    /// Selectors that match `node` in the tree's current state, in
    /// application order.
    pub fn matching<'a, T>(&'a self, tree: &'a T, node: N) -> impl Iterator<Item = &'a MatchedSelector> + 'a
    where
        T: MatchTree<Node = N>,
        N: 'a,
    {
        self.selectors
            .iter()
            .filter(move |s| !s.selector().is_dynamic() || s.selector().matches(tree, node))
    }

    /// The dynamic state examined while matching.
    pub fn dependencies(&self) -> &DependencyMap<N> {
        &self.dependencies
    }

    /// Returns true if `node`'s pseudo-class `name` can change the result.
    pub fn depends_on_pseudo_class(&self, node: N, name: &str) -> bool {
        self.dependencies.depends_on_pseudo_class(node, name)
    }

    /// Returns true if `node`'s attribute `name` can change the result.
    pub fn depends_on_attribute(&self, node: N, name: &str) -> bool {
        self.dependencies.depends_on_attribute(node, name)
    }

    /// Number of surviving selectors.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Returns true if no selector survived.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}
