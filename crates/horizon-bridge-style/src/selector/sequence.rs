//! Compound selectors: simple selectors that must all hold on one node.

use std::fmt;

use super::dependency::DependencyMap;
use super::simple::SimpleSelector;
use super::tree::MatchTree;

/// An AND of simple selectors on a single node, e.g. `Button.primary:hover`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSelectorSequence {
    selectors: Vec<SimpleSelector>,
    head: usize,
    specificity: u32,
    dynamic: bool,
}

impl SimpleSelectorSequence {
    /// Create a sequence. `selectors` must not be empty.
    pub(crate) fn new(selectors: Vec<SimpleSelector>) -> Self {
        // Rarest member wins; ties keep the earliest.
        let mut head = 0;
        for (i, selector) in selectors.iter().enumerate() {
            if selector.rarity() > selectors[head].rarity() {
                head = i;
            }
        }
        let specificity = selectors.iter().map(SimpleSelector::specificity).sum();
        let dynamic = selectors.iter().any(SimpleSelector::is_dynamic);
        Self {
            selectors,
            head,
            specificity,
            dynamic,
        }
    }

    /// The member selectors in source order.
    pub fn selectors(&self) -> &[SimpleSelector] {
        &self.selectors
    }

    /// The most discriminating member, used for indexing.
    pub fn head(&self) -> &SimpleSelector {
        &self.selectors[self.head]
    }

    /// Sum of the members' specificity.
    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    /// Returns true if any member is dynamic.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Returns true if every member matches `node`.
    pub fn matches<T: MatchTree>(&self, tree: &T, node: T::Node) -> bool {
        self.selectors.iter().all(|s| s.matches(tree, node))
    }

    /// Returns true if every static member matches `node`.
    pub fn may_match<T: MatchTree>(&self, tree: &T, node: T::Node) -> bool {
        self.selectors.iter().all(|s| s.may_match(tree, node))
    }

    /// Record every member's dynamic dependencies on `node`.
    pub fn track_changes<N: Copy + Ord>(&self, node: N, deps: &mut DependencyMap<N>) {
        for selector in &self.selectors {
            selector.track_changes(node, deps);
        }
    }

    /// Match against `node`, recording dynamic dependencies.
    pub fn accumulate_changes<T: MatchTree>(
        &self,
        tree: &T,
        node: T::Node,
        deps: &mut DependencyMap<T::Node>,
    ) -> bool {
        if !self.dynamic {
            return self.matches(tree, node);
        }
        if !self.may_match(tree, node) {
            return false;
        }
        self.track_changes(node, deps);
        true
    }
}

impl fmt::Display for SimpleSelectorSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for selector in &self.selectors {
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_bridge_core::property::PropertyRegistry;
    use horizon_bridge_core::ViewTree;

    fn sequence() -> SimpleSelectorSequence {
        SimpleSelectorSequence::new(vec![
            SimpleSelector::Type("Button".into()),
            SimpleSelector::Class("primary".into()),
            SimpleSelector::PseudoClass("hover".into()),
        ])
    }

    #[test]
    fn head_is_rarest_member() {
        assert_eq!(sequence().head(), &SimpleSelector::Class("primary".into()));

        let with_id = SimpleSelectorSequence::new(vec![
            SimpleSelector::Class("a".into()),
            SimpleSelector::Id("x".into()),
            SimpleSelector::Class("b".into()),
        ]);
        assert_eq!(with_id.head(), &SimpleSelector::Id("x".into()));

        let dynamic_only = SimpleSelectorSequence::new(vec![
            SimpleSelector::PseudoClass("hover".into()),
            SimpleSelector::Universal,
        ]);
        assert_eq!(dynamic_only.head(), &SimpleSelector::PseudoClass("hover".into()));
    }

    #[test]
    fn specificity_sums_members() {
        assert_eq!(sequence().specificity(), 21);
        assert!(sequence().is_dynamic());
    }

    #[test]
    fn matching_requires_every_member() {
        let mut tree = ViewTree::new(PropertyRegistry::new());
        let node = tree.create_node("Button");
        tree.add_class(node, "primary").unwrap();
        let seq = sequence();

        assert!(!seq.matches(&tree, node));
        assert!(seq.may_match(&tree, node));

        tree.add_pseudo_class(node, "hover").unwrap();
        assert!(seq.matches(&tree, node));

        tree.remove_class(node, "primary").unwrap();
        let mut deps = DependencyMap::new();
        assert!(!seq.accumulate_changes(&tree, node, &mut deps));
        assert!(deps.is_empty());
    }

    #[test]
    fn display_concatenates() {
        assert_eq!(sequence().to_string(), "Button.primary:hover");
    }
}
