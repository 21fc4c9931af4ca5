//! Stylesheet: ordered rule sets plus their selector index.

use std::sync::Arc;

use super::{RuleSet, SelectorIndex};
use crate::ast::RuleAst;
use crate::logging::{span_names, targets};
use crate::resolve::{MatchedSelector, SelectorQuery};
use crate::selector::{DependencyMap, MatchTree};
use crate::Result;

/// A stylesheet containing ordered rule sets.
///
/// The selector index is maintained as rules are added, so a sheet is
/// ready to query at any time. Later rules win specificity ties.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<Arc<RuleSet>>,
    index: SelectorIndex,
}

impl StyleSheet {
    /// Create an empty stylesheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stylesheet from parser output, in order.
    ///
    /// Fails if any selector uses an unsupported combinator.
    pub fn from_rules(rules: impl IntoIterator<Item = RuleAst>) -> Result<Self> {
        let mut sheet = Self::new();
        for rule in rules {
            sheet.add_rule(rule)?;
        }
        tracing::debug!(
            target: targets::SELECTOR,
            rules = sheet.len(),
            selectors = sheet.index.len(),
            "built stylesheet"
        );
        Ok(sheet)
    }

    /// Append a rule after every existing rule.
    pub fn add_rule(&mut self, rule: RuleAst) -> Result<()> {
        let rule = RuleSet::from_ast(rule, self.rules.len())?;
        self.push(rule);
        Ok(())
    }

    /// Append every rule of `other`, after this sheet's rules.
    pub fn append(&mut self, other: StyleSheet) {
        for rule in other.rules {
            let position = self.rules.len();
            self.push(Arc::unwrap_or_clone(rule).with_position(position));
        }
    }

    fn push(&mut self, rule: RuleSet) {
        let rule = Arc::new(rule);
        self.index.insert_rule(&rule);
        self.rules.push(rule);
    }

    /// Get the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the stylesheet is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over rules in order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// The selector index.
    pub fn index(&self) -> &SelectorIndex {
        &self.index
    }

    /// Find the selectors that may apply to `node`.
    ///
    /// Candidates come from the index buckets of the node's id, type and
    /// classes plus the universal bucket. Those whose static parts match
    /// survive, sorted by `(specificity, position)`, and the dynamic state
    /// they read is recorded in the result's dependency map.
    pub fn query<T: MatchTree>(&self, tree: &T, node: T::Node) -> SelectorQuery<T::Node> {
        let _span = horizon_bridge_core::PerfSpan::new(span_names::QUERY);
        let mut dependencies = DependencyMap::new();
        let selectors: Vec<MatchedSelector> = self
            .index
            .candidates(tree, node)
            .into_iter()
            .filter(|entry| entry.selector().accumulate_changes(tree, node, &mut dependencies))
            .map(MatchedSelector::from_entry)
            .collect();

        tracing::trace!(
            target: targets::SELECTOR,
            ?node,
            matched = selectors.len(),
            dependencies = dependencies.len(),
            "queried stylesheet"
        );
        SelectorQuery::new(selectors, dependencies)
    }
}

static_assertions::assert_impl_all!(StyleSheet: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_bridge_core::property::PropertyRegistry;
    use horizon_bridge_core::ViewTree;

    fn positions(query: &SelectorQuery<horizon_bridge_core::NodeId>) -> Vec<usize> {
        query.selectors().iter().map(|s| s.position()).collect()
    }

    #[test]
    fn stylesheet_creation() {
        let mut sheet = StyleSheet::new();
        assert!(sheet.is_empty());

        sheet.add_rule(RuleAst::with_selector_text("Button").declaration("color", "red")).unwrap();
        sheet.add_rule(RuleAst::with_selector_text("Label")).unwrap();

        assert_eq!(sheet.len(), 2);
        let order: Vec<usize> = sheet.iter().map(RuleSet::position).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn query_sorts_by_specificity_then_position() {
        let sheet = StyleSheet::from_rules([
            RuleAst::with_selector_text(".primary"),
            RuleAst::with_selector_text("Button"),
            RuleAst::with_selector_text("*"),
            RuleAst::with_selector_text("Button"),
        ])
        .unwrap();

        let mut tree = ViewTree::new(PropertyRegistry::new());
        let node = tree.create_node("Button");
        tree.add_class(node, "primary").unwrap();

        let query = sheet.query(&tree, node);
        assert_eq!(positions(&query), vec![2, 1, 3, 0]);
    }

    #[test]
    fn dynamic_selectors_survive_and_record_dependencies() {
        let sheet = StyleSheet::from_rules([
            RuleAst::with_selector_text("Button:hover"),
            RuleAst::with_selector_text("Label:hover"),
        ])
        .unwrap();

        let mut tree = ViewTree::new(PropertyRegistry::new());
        let node = tree.create_node("Button");

        let query = sheet.query(&tree, node);
        assert_eq!(query.len(), 1);
        assert!(query.depends_on_pseudo_class(node, "hover"));
        assert_eq!(query.matching(&tree, node).count(), 0);

        tree.add_pseudo_class(node, "hover").unwrap();
        assert_eq!(query.matching(&tree, node).count(), 1);
    }

    #[test]
    fn empty_stylesheet_gives_empty_result() {
        let sheet = StyleSheet::new();
        let mut tree = ViewTree::new(PropertyRegistry::new());
        let node = tree.create_node("Button");

        let query = sheet.query(&tree, node);
        assert!(query.is_empty());
        assert!(query.dependencies().is_empty());
    }

    #[test]
    fn append_continues_positions() {
        let mut base = StyleSheet::from_rules([RuleAst::with_selector_text("Button")]).unwrap();
        let extra = StyleSheet::from_rules([RuleAst::with_selector_text("Button")]).unwrap();
        base.append(extra);

        let mut tree = ViewTree::new(PropertyRegistry::new());
        let node = tree.create_node("Button");
        assert_eq!(positions(&base.query(&tree, node)), vec![0, 1]);
        assert_eq!(base.iter().last().map(RuleSet::position), Some(1));
    }
}
