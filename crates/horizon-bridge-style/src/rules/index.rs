//! Selector index: buckets selectors by their most discriminating member.

use std::collections::HashMap;
use std::sync::Arc;

use super::RuleSet;
use crate::selector::{IndexKey, MatchTree, Selector};

/// One indexed selector.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    rule: Arc<RuleSet>,
    selector: usize,
    position: usize,
}

impl IndexEntry {
    /// The rule set the selector belongs to.
    pub fn rule(&self) -> &Arc<RuleSet> {
        &self.rule
    }

    /// The selector.
    pub fn selector(&self) -> &Selector {
        &self.rule.selectors()[self.selector]
    }

    pub(crate) fn selector_index(&self) -> usize {
        self.selector
    }

    /// Position of the selector in stylesheet order.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Selectors bucketed by id, class, type, plus a universal bucket.
///
/// Each selector lives in exactly one bucket, so a node's candidate list
/// never contains duplicates.
#[derive(Debug, Clone, Default)]
pub struct SelectorIndex {
    universal: Vec<IndexEntry>,
    by_id: HashMap<String, Vec<IndexEntry>>,
    by_type: HashMap<String, Vec<IndexEntry>>,
    by_class: HashMap<String, Vec<IndexEntry>>,
    next_position: usize,
    len: usize,
}

impl SelectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every selector of `rule`, assigning positions in order.
    ///
    /// Invalid selectors consume a position but are not indexed.
    pub fn insert_rule(&mut self, rule: &Arc<RuleSet>) {
        for (selector, parsed) in rule.selectors().iter().enumerate() {
            let position = self.next_position;
            self.next_position += 1;

            let Some(key) = parsed.index_key() else {
                continue;
            };
            let entry = IndexEntry {
                rule: Arc::clone(rule),
                selector,
                position,
            };
            match key {
                IndexKey::Universal => self.universal.push(entry),
                IndexKey::Id(id) => self.by_id.entry(id).or_default().push(entry),
                IndexKey::Type(css_type) => self.by_type.entry(css_type).or_default().push(entry),
                IndexKey::Class(class) => self.by_class.entry(class).or_default().push(entry),
            }
            self.len += 1;
        }
    }

    /// Candidate selectors for `node`: the universal bucket plus the
    /// buckets of the node's id, type and classes.
    pub fn candidates<'a, T: MatchTree>(&'a self, tree: &T, node: T::Node) -> Vec<&'a IndexEntry> {
        let mut candidates: Vec<&IndexEntry> = self.universal.iter().collect();
        if let Some(id) = tree.css_id(node) {
            candidates.extend(self.by_id.get(id).into_iter().flatten());
        }
        candidates.extend(self.by_type.get(tree.css_type(node)).into_iter().flatten());
        for class in tree.classes(node) {
            candidates.extend(self.by_class.get(class).into_iter().flatten());
        }
        candidates
    }

    /// Number of indexed selectors.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RuleAst;
    use horizon_bridge_core::property::PropertyRegistry;
    use horizon_bridge_core::ViewTree;

    fn rule(text: &str, position: usize) -> Arc<RuleSet> {
        Arc::new(RuleSet::from_ast(RuleAst::with_selector_text(text), position).unwrap())
    }

    #[test]
    fn buckets_by_head() {
        let mut index = SelectorIndex::new();
        index.insert_rule(&rule("*, #ok, Button, .primary, Page Label, :hover", 0));
        index.insert_rule(&rule("Label >", 1));

        assert_eq!(index.len(), 6);
        assert_eq!(index.universal.len(), 2);
        assert_eq!(index.by_id["ok"].len(), 1);
        assert_eq!(index.by_type["Button"].len(), 1);
        assert_eq!(index.by_type["Label"].len(), 1);
        assert_eq!(index.by_class["primary"].len(), 1);
        // The invalid selector still consumed a position.
        assert_eq!(index.next_position, 7);
    }

    #[test]
    fn candidates_for_node() {
        let mut index = SelectorIndex::new();
        index.insert_rule(&rule("*, #ok, Button, .primary, .danger, Label", 0));

        let mut tree = ViewTree::new(PropertyRegistry::new());
        let node = tree.create_node("Button");
        tree.set_css_id(node, Some("ok".into())).unwrap();
        tree.add_class(node, "primary").unwrap();

        let mut positions: Vec<usize> = index
            .candidates(&tree, node)
            .iter()
            .map(|e| e.position())
            .collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }
}
