//! Complex selectors: compound selectors joined by combinators.
//!
//! Matching runs right to left. The sequences are grouped into *child
//! groups* separated by descendant combinators; each child group is a chain
//! of *sibling groups* separated by child combinators; each sibling group is
//! a chain of sequences joined by `+`. For `A B > C + D` that gives
//!
//! ```text
//! child group 0: [ [D, C], [B] ]   D, C is D's previous sibling, B their parent
//! child group 1: [ [A] ]           A is any ancestor of B
//! ```
//!
//! The first child group is matched at the target node. Each further group
//! is tried on every ancestor of the previous group's topmost node until one
//! satisfies it.

use std::fmt;

use super::dependency::DependencyMap;
use super::sequence::SimpleSelectorSequence;
use super::tree::MatchTree;

/// A combinator joining two compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Whitespace: the left side matches any ancestor.
    Descendant,
    /// `>`: the left side matches the parent.
    Child,
    /// `+`: the left side matches the immediately previous sibling.
    AdjacentSibling,
}

impl Combinator {
    /// Parse a combinator token. Whitespace-only tokens are descendant.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "" => Some(Self::Descendant),
            ">" => Some(Self::Child),
            "+" => Some(Self::AdjacentSibling),
            _ => None,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Descendant => " ",
            Self::Child => " > ",
            Self::AdjacentSibling => " + ",
        })
    }
}

/// Sequences joined by `+`, rightmost first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SiblingGroup {
    sequences: Vec<usize>,
    dynamic: bool,
}

/// Sibling groups joined by `>`, deepest first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChildGroup {
    siblings: Vec<SiblingGroup>,
    dynamic: bool,
}

/// Compound selectors joined by combinators, e.g. `StackLayout > Label.title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    sequences: Vec<SimpleSelectorSequence>,
    combinators: Vec<Combinator>,
    groups: Vec<ChildGroup>,
    specificity: u32,
    dynamic: bool,
}

impl ComplexSelector {
    /// Build a complex selector. `combinators[i]` joins `sequences[i]` and
    /// `sequences[i + 1]`, so there is exactly one fewer combinator than
    /// sequences and `sequences` is not empty.
    pub(crate) fn new(sequences: Vec<SimpleSelectorSequence>, combinators: Vec<Combinator>) -> Self {
        let mut groups: Vec<ChildGroup> = Vec::new();
        for index in (0..sequences.len()).rev() {
            // The combinator to the right of this sequence decides where it goes.
            match combinators.get(index) {
                None | Some(Combinator::Descendant) => groups.push(ChildGroup {
                    siblings: vec![SiblingGroup {
                        sequences: Vec::new(),
                        dynamic: false,
                    }],
                    dynamic: false,
                }),
                Some(Combinator::Child) => {
                    if let Some(group) = groups.last_mut() {
                        group.siblings.push(SiblingGroup {
                            sequences: Vec::new(),
                            dynamic: false,
                        });
                    }
                }
                Some(Combinator::AdjacentSibling) => {}
            }

            let dynamic = sequences[index].is_dynamic();
            if let Some(group) = groups.last_mut() {
                group.dynamic |= dynamic;
                if let Some(siblings) = group.siblings.last_mut() {
                    siblings.dynamic |= dynamic;
                    siblings.sequences.push(index);
                }
            }
        }

        let specificity = sequences.iter().map(SimpleSelectorSequence::specificity).sum();
        let dynamic = sequences.iter().any(SimpleSelectorSequence::is_dynamic);
        Self {
            sequences,
            combinators,
            groups,
            specificity,
            dynamic,
        }
    }

    /// The compound selectors, left to right.
    pub fn sequences(&self) -> &[SimpleSelectorSequence] {
        &self.sequences
    }

    /// The combinators, left to right.
    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    /// The rightmost sequence, which must match the target node itself.
    pub fn last(&self) -> &SimpleSelectorSequence {
        &self.sequences[self.sequences.len() - 1]
    }

    /// Sum of the sequences' specificity.
    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    /// Returns true if any sequence is dynamic.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Returns true if the selector matches `node` in its current state.
    pub fn matches<T: MatchTree>(&self, tree: &T, node: T::Node) -> bool {
        self.walk(tree, node, |seq, node| seq.matches(tree, node))
            .is_some()
    }

    /// Match ignoring dynamic state, then record the dynamic state of every
    /// node on the explored path that could affect the result.
    pub fn accumulate_changes<T: MatchTree>(
        &self,
        tree: &T,
        node: T::Node,
        deps: &mut DependencyMap<T::Node>,
    ) -> bool {
        if !self.dynamic {
            return self.matches(tree, node);
        }
        let may_match = |seq: &SimpleSelectorSequence, node| seq.may_match(tree, node);
        let Some(bounds) = self.walk(tree, node, may_match) else {
            return false;
        };

        for (index, (group, &start)) in self.groups.iter().zip(&bounds).enumerate() {
            if !group.dynamic {
                continue;
            }
            if index == 0 {
                self.track_child_group(tree, group, start, deps);
                continue;
            }
            // A different ancestor may satisfy the group once state changes.
            let mut current = Some(start);
            while let Some(candidate) = current {
                if self.match_child_group(tree, group, candidate, may_match).is_some() {
                    self.track_child_group(tree, group, candidate, deps);
                }
                current = tree.parent(candidate);
            }
        }
        true
    }

    /// Run the group traversal with `test` deciding sequence matches.
    ///
    /// Returns the node each child group was anchored at.
    fn walk<T, F>(&self, tree: &T, node: T::Node, test: F) -> Option<Vec<T::Node>>
    where
        T: MatchTree,
        F: Fn(&SimpleSelectorSequence, T::Node) -> bool + Copy,
    {
        let mut anchors = Vec::with_capacity(self.groups.len());
        let mut current = node;
        for (index, group) in self.groups.iter().enumerate() {
            if index == 0 {
                anchors.push(current);
                current = self.match_child_group(tree, group, current, test)?;
                continue;
            }
            let mut ancestor = tree.parent(current);
            loop {
                let candidate = ancestor?;
                if let Some(top) = self.match_child_group(tree, group, candidate, test) {
                    anchors.push(candidate);
                    current = top;
                    break;
                }
                ancestor = tree.parent(candidate);
            }
        }
        Some(anchors)
    }

    /// Match a child group anchored at `node`, returning the topmost node it
    /// covered.
    fn match_child_group<T, F>(
        &self,
        tree: &T,
        group: &ChildGroup,
        node: T::Node,
        test: F,
    ) -> Option<T::Node>
    where
        T: MatchTree,
        F: Fn(&SimpleSelectorSequence, T::Node) -> bool + Copy,
    {
        let mut current = node;
        for (index, siblings) in group.siblings.iter().enumerate() {
            if index > 0 {
                current = tree.parent(current)?;
            }
            if !self.match_sibling_group(tree, siblings, current, test) {
                return None;
            }
        }
        Some(current)
    }

    fn match_sibling_group<T, F>(&self, tree: &T, group: &SiblingGroup, node: T::Node, test: F) -> bool
    where
        T: MatchTree,
        F: Fn(&SimpleSelectorSequence, T::Node) -> bool + Copy,
    {
        let mut current = Some(node);
        for (index, &sequence) in group.sequences.iter().enumerate() {
            if index > 0 {
                current = current.and_then(|n| tree.previous_sibling(n));
            }
            match current {
                Some(n) if test(&self.sequences[sequence], n) => {}
                _ => return false,
            }
        }
        true
    }

    fn track_child_group<T: MatchTree>(
        &self,
        tree: &T,
        group: &ChildGroup,
        node: T::Node,
        deps: &mut DependencyMap<T::Node>,
    ) {
        let mut current = Some(node);
        for (index, siblings) in group.siblings.iter().enumerate() {
            if index > 0 {
                current = current.and_then(|n| tree.parent(n));
            }
            let Some(anchor) = current else {
                return;
            };
            if !siblings.dynamic {
                continue;
            }
            let mut sibling = Some(anchor);
            for (offset, &sequence) in siblings.sequences.iter().enumerate() {
                if offset > 0 {
                    sibling = sibling.and_then(|n| tree.previous_sibling(n));
                }
                let Some(target) = sibling else {
                    break;
                };
                self.sequences[sequence].track_changes(target, deps);
            }
        }
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, sequence) in self.sequences.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", self.combinators[index - 1])?;
            }
            write!(f, "{sequence}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::simple::SimpleSelector;
    use horizon_bridge_core::property::PropertyRegistry;
    use horizon_bridge_core::{NodeId, ViewTree};

    fn seq(selectors: &[SimpleSelector]) -> SimpleSelectorSequence {
        SimpleSelectorSequence::new(selectors.to_vec())
    }

    fn ty(name: &str) -> SimpleSelector {
        SimpleSelector::Type(name.into())
    }

    /// Page > Stack > (Button, Label)
    fn tree() -> (ViewTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = ViewTree::new(PropertyRegistry::new());
        let page = tree.create_node("Page");
        let stack = tree.create_node("Stack");
        let button = tree.create_node("Button");
        let label = tree.create_node("Label");
        tree.append_child(page, stack).unwrap();
        tree.append_child(stack, button).unwrap();
        tree.append_child(stack, label).unwrap();
        (tree, page, stack, button, label)
    }

    #[test]
    fn descendant_walks_all_ancestors() {
        let (tree, _, stack, _, label) = tree();
        let selector = ComplexSelector::new(
            vec![seq(&[ty("Page")]), seq(&[ty("Label")])],
            vec![Combinator::Descendant],
        );
        assert!(selector.matches(&tree, label));
        assert!(!selector.matches(&tree, stack));
    }

    #[test]
    fn child_requires_direct_parent() {
        let (tree, _, _, _, label) = tree();
        let direct = ComplexSelector::new(
            vec![seq(&[ty("Stack")]), seq(&[ty("Label")])],
            vec![Combinator::Child],
        );
        let skipped = ComplexSelector::new(
            vec![seq(&[ty("Page")]), seq(&[ty("Label")])],
            vec![Combinator::Child],
        );
        assert!(direct.matches(&tree, label));
        assert!(!skipped.matches(&tree, label));
    }

    #[test]
    fn adjacent_sibling_uses_previous_sibling() {
        let (tree, _, _, button, label) = tree();
        let selector = ComplexSelector::new(
            vec![seq(&[ty("Stack")]), seq(&[ty("Button")]), seq(&[ty("Label")])],
            vec![Combinator::Child, Combinator::AdjacentSibling],
        );
        assert!(selector.matches(&tree, label));
        assert!(!selector.matches(&tree, button));
        assert_eq!(selector.to_string(), "Stack > Button + Label");
    }

    #[test]
    fn specificity_sums_sequences() {
        let selector = ComplexSelector::new(
            vec![
                seq(&[ty("Stack"), SimpleSelector::Class("a".into())]),
                seq(&[SimpleSelector::Id("x".into())]),
            ],
            vec![Combinator::Descendant],
        );
        assert_eq!(selector.specificity(), 111);
        assert!(!selector.is_dynamic());
    }

    #[test]
    fn ancestor_pseudo_class_is_tracked_without_matching() {
        let (mut tree, page, stack, _, label) = tree();
        let selector = ComplexSelector::new(
            vec![
                seq(&[ty("Stack"), SimpleSelector::PseudoClass("hover".into())]),
                seq(&[ty("Label")]),
            ],
            vec![Combinator::Descendant],
        );

        let mut deps = DependencyMap::new();
        assert!(!selector.matches(&tree, label));
        assert!(selector.accumulate_changes(&tree, label, &mut deps));
        assert!(deps.depends_on_pseudo_class(stack, "hover"));
        assert!(!deps.depends_on_pseudo_class(page, "hover"));
        assert!(!deps.depends_on_pseudo_class(label, "hover"));

        tree.add_pseudo_class(stack, "hover").unwrap();
        assert!(selector.matches(&tree, label));
    }

    #[test]
    fn static_mismatch_records_nothing() {
        let (tree, _, _, button, _) = tree();
        let selector = ComplexSelector::new(
            vec![
                seq(&[ty("Stack"), SimpleSelector::PseudoClass("hover".into())]),
                seq(&[ty("Label")]),
            ],
            vec![Combinator::Descendant],
        );
        let mut deps = DependencyMap::new();
        assert!(!selector.accumulate_changes(&tree, button, &mut deps));
        assert!(deps.is_empty());
    }

    #[test]
    fn combinator_tokens() {
        assert_eq!(Combinator::from_token(" "), Some(Combinator::Descendant));
        assert_eq!(Combinator::from_token(">"), Some(Combinator::Child));
        assert_eq!(Combinator::from_token("+"), Some(Combinator::AdjacentSibling));
        assert_eq!(Combinator::from_token("~"), None);
    }
}
