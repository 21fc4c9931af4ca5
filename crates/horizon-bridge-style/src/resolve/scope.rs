//! Style scope: applies a stylesheet to a view tree and keeps it applied.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use horizon_bridge_core::{NodeId, PerfSpan, PropertyId, StyleInvalidation, ViewTree};

use super::cascade::Cascade;
use super::query::SelectorQuery;
use crate::logging::{span_names, targets};
use crate::rules::StyleSheet;
use crate::{Error, Result};

/// What to do with a declaration naming an unregistered CSS property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPropertyPolicy {
    /// Skip the declaration and log it at debug level.
    #[default]
    Ignore,
    /// Fail the pass with [`Error::UnknownProperty`].
    Error,
}

/// Configuration for a [`StyleScope`].
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Handling of unknown CSS properties.
    pub unknown_properties: UnknownPropertyPolicy,
    /// Whether structural changes also restyle the following siblings'
    /// subtrees, which adjacent-sibling selectors may depend on.
    pub restyle_following_siblings: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            unknown_properties: UnknownPropertyPolicy::default(),
            restyle_following_siblings: true,
        }
    }
}

impl ScopeConfig {
    /// Create a configuration that rejects unknown properties.
    pub fn strict() -> Self {
        Self {
            unknown_properties: UnknownPropertyPolicy::Error,
            ..Default::default()
        }
    }

    /// Set the unknown property policy.
    pub fn with_unknown_properties(mut self, policy: UnknownPropertyPolicy) -> Self {
        self.unknown_properties = policy;
        self
    }

    /// Set whether structural changes restyle following siblings.
    pub fn with_following_siblings(mut self, restyle: bool) -> Self {
        self.restyle_following_siblings = restyle;
        self
    }
}

/// Styling state kept for one node.
#[derive(Debug)]
struct NodeStyle {
    query: SelectorQuery<NodeId>,
    /// Longhands the last pass wrote or reset at the Css tier.
    applied: BTreeSet<PropertyId>,
}

/// Applies a stylesheet to the nodes of a [`ViewTree`].
///
/// The scope remembers each styled node's query result. Structural tree
/// changes re-query the affected nodes; attribute and pseudo-class changes
/// only re-filter the stored results of nodes whose dependency maps name
/// the changed state.
///
/// # Example
///
/// ```
/// use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry};
/// use horizon_bridge_core::ViewTree;
/// use horizon_bridge_style::ast::RuleAst;
/// use horizon_bridge_style::{StyleScope, StyleSheet};
///
/// let mut registry = PropertyRegistry::new();
/// let color = registry
///     .register(
///         OwnerType("View"),
///         PropertyDescriptor::new("color", String::from("black"))
///             .css("color")
///             .parse_from_str(),
///     )
///     .unwrap();
/// let mut tree = ViewTree::new(registry);
/// let button = tree.create_node("Button");
///
/// let sheet = StyleSheet::from_rules([
///     RuleAst::with_selector_text("Button").declaration("color", "gray"),
///     RuleAst::with_selector_text("Button:hover").declaration("color", "blue"),
/// ])
/// .unwrap();
/// let mut scope = StyleScope::new(sheet);
///
/// scope.process_invalidations(&mut tree).unwrap();
/// assert_eq!(tree.get(button, color).unwrap(), "gray");
///
/// tree.add_pseudo_class(button, "hover").unwrap();
/// scope.process_invalidations(&mut tree).unwrap();
/// assert_eq!(tree.get(button, color).unwrap(), "blue");
/// ```
#[derive(Debug)]
pub struct StyleScope {
    config: ScopeConfig,
    sheet: StyleSheet,
    styles: BTreeMap<NodeId, NodeStyle>,
    /// Node whose dynamic state is read -> styled nodes reading it.
    watchers: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl StyleScope {
    /// Create a scope with the default configuration.
    pub fn new(sheet: StyleSheet) -> Self {
        Self::with_config(sheet, ScopeConfig::default())
    }

    /// Create a scope with a custom configuration.
    pub fn with_config(sheet: StyleSheet, config: ScopeConfig) -> Self {
        Self {
            config,
            sheet,
            styles: BTreeMap::new(),
            watchers: BTreeMap::new(),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// The stylesheet in effect.
    pub fn stylesheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Replace the stylesheet and restyle every styled node.
    pub fn set_stylesheet(&mut self, tree: &mut ViewTree, sheet: StyleSheet) -> Result<()> {
        tracing::debug!(target: targets::STYLE, rules = sheet.len(), "replacing stylesheet");
        self.sheet = sheet;
        self.restyle_all(tree)
    }

    /// Append a stylesheet after the current rules and restyle every styled
    /// node. The appended rules win specificity ties.
    pub fn add_stylesheet(&mut self, tree: &mut ViewTree, sheet: StyleSheet) -> Result<()> {
        tracing::debug!(target: targets::STYLE, rules = sheet.len(), "appending stylesheet");
        self.sheet.append(sheet);
        self.restyle_all(tree)
    }

    /// Returns true if the scope has styled `node`.
    pub fn is_styled(&self, node: NodeId) -> bool {
        self.styles.contains_key(&node)
    }

    /// The stored query result for `node`.
    pub fn query(&self, node: NodeId) -> Option<&SelectorQuery<NodeId>> {
        self.styles.get(&node).map(|style| &style.query)
    }

    /// Returns true if a change of `node`'s pseudo-class `name` requires
    /// restyling some node.
    pub fn depends_on_pseudo_class(&self, node: NodeId, name: &str) -> bool {
        self.dependents(node)
            .any(|styled| styled.query.depends_on_pseudo_class(node, name))
    }

    /// Returns true if a change of `node`'s attribute `name` requires
    /// restyling some node.
    pub fn depends_on_attribute(&self, node: NodeId, name: &str) -> bool {
        self.dependents(node)
            .any(|styled| styled.query.depends_on_attribute(node, name))
    }

    fn dependents(&self, node: NodeId) -> impl Iterator<Item = &NodeStyle> + '_ {
        self.watchers
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|styled| self.styles.get(styled))
    }

    /// Query `node` and apply the matching declarations.
    #[tracing::instrument(skip(self, tree), target = "horizon_bridge_style::cascade", level = "trace")]
    pub fn apply(&mut self, tree: &mut ViewTree, node: NodeId) -> Result<()> {
        if !tree.contains(node) {
            return Err(horizon_bridge_core::TreeError::InvalidNode.into());
        }
        let query = self.sheet.query(&*tree, node);
        self.apply_query(tree, node, query)
    }

    /// Query and apply `root` and every descendant, parents first.
    pub fn apply_subtree(&mut self, tree: &mut ViewTree, root: NodeId) -> Result<()> {
        for node in tree.preorder(root)? {
            self.apply(tree, node)?;
        }
        Ok(())
    }

    /// Re-apply `node`'s stored query against the current dynamic state.
    ///
    /// Nodes the scope has not styled yet are queried first.
    pub fn restyle(&mut self, tree: &mut ViewTree, node: NodeId) -> Result<()> {
        match self.styles.get(&node).map(|style| style.query.clone()) {
            Some(query) => self.apply_query(tree, node, query),
            None => self.apply(tree, node),
        }
    }

    /// Drain the tree's style invalidations and restyle what they affect.
    ///
    /// Returns the number of nodes restyled. A node whose pass fails keeps
    /// the values written before the failure; every other affected node is
    /// still restyled, and the first error is returned once all are done.
    pub fn process_invalidations(&mut self, tree: &mut ViewTree) -> Result<usize> {
        let invalidations = tree.take_style_invalidations();
        if invalidations.is_empty() {
            return Ok(0);
        }
        let _span = PerfSpan::new(span_names::CASCADE);

        let mut first_error: Option<Error> = None;
        let mut requery = BTreeSet::new();
        let mut refilter = BTreeSet::new();
        for invalidation in invalidations {
            let collected = match invalidation {
                StyleInvalidation::Created(node) => {
                    requery.insert(node);
                    Ok(())
                }
                StyleInvalidation::Structure(node) | StyleInvalidation::Attached(node) => {
                    self.collect_structural(tree, node, &mut requery)
                }
                StyleInvalidation::Detached(node) => self.collect_subtree(tree, node, &mut requery),
                StyleInvalidation::PseudoClass { node, name } => {
                    refilter.extend(self.watchers_of(node, |q| q.depends_on_pseudo_class(node, &name)));
                    Ok(())
                }
                StyleInvalidation::Attribute { node, name } => {
                    refilter.extend(self.watchers_of(node, |q| q.depends_on_attribute(node, &name)));
                    Ok(())
                }
                StyleInvalidation::Destroyed(node) => {
                    self.forget(node);
                    Ok(())
                }
            };
            if let Err(err) = collected {
                first_error.get_or_insert(err);
            }
        }

        let mut restyled = 0;
        let mut failed = 0;
        let refilter_only: Vec<NodeId> = refilter.difference(&requery).copied().collect();
        let passes = requery
            .into_iter()
            .map(|node| (node, true))
            .chain(refilter_only.into_iter().map(|node| (node, false)));
        for (node, full) in passes {
            if !tree.contains(node) {
                continue;
            }
            let result = if full {
                self.apply(tree, node)
            } else {
                self.restyle(tree, node)
            };
            match result {
                Ok(()) => restyled += 1,
                Err(err) => {
                    tracing::warn!(target: targets::CASCADE, ?node, %err, "styling pass failed");
                    failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        tracing::debug!(target: targets::CASCADE, restyled, failed, "processed style invalidations");
        first_error.map_or(Ok(restyled), Err)
    }

    fn collect_subtree(
        &self,
        tree: &ViewTree,
        node: NodeId,
        requery: &mut BTreeSet<NodeId>,
    ) -> Result<()> {
        // Destroyed later in the same batch.
        if !tree.contains(node) {
            return Ok(());
        }
        requery.extend(tree.preorder(node)?);
        Ok(())
    }

    fn collect_structural(
        &self,
        tree: &ViewTree,
        node: NodeId,
        requery: &mut BTreeSet<NodeId>,
    ) -> Result<()> {
        if !tree.contains(node) {
            return Ok(());
        }
        self.collect_subtree(tree, node, requery)?;
        if self.config.restyle_following_siblings {
            for sibling in tree.following_siblings(node)? {
                requery.extend(tree.preorder(sibling)?);
            }
        }
        Ok(())
    }

    fn watchers_of<F>(&self, node: NodeId, depends: F) -> Vec<NodeId>
    where
        F: Fn(&SelectorQuery<NodeId>) -> bool,
    {
        self.watchers
            .get(&node)
            .into_iter()
            .flatten()
            .copied()
            .filter(|styled| self.styles.get(styled).is_some_and(|s| depends(&s.query)))
            .collect()
    }

    fn apply_query(
        &mut self,
        tree: &mut ViewTree,
        node: NodeId,
        query: SelectorQuery<NodeId>,
    ) -> Result<()> {
        let registry = Arc::clone(tree.registry());
        let mut cascade = Cascade::new(&registry, self.config.unknown_properties);
        let mut failure: Option<Error> = None;
        let mut matched = 0usize;
        for selector in query.matching(&*tree, node) {
            matched += 1;
            if let Err(err) = cascade.declare_rule(selector.rule()) {
                failure = Some(err);
                break;
            }
        }

        let previous = self
            .styles
            .get(&node)
            .map(|style| style.applied.clone())
            .unwrap_or_default();
        let declared: BTreeSet<PropertyId> = cascade.properties().collect();
        let (stale, applied) = if failure.is_none() {
            (&previous - &declared, declared)
        } else {
            // Keep tracking what earlier passes wrote so a later pass clears it.
            (BTreeSet::new(), &previous | &declared)
        };

        tracing::trace!(
            target: targets::CASCADE,
            ?node,
            candidates = query.len(),
            matched,
            declared = cascade.len(),
            stale = stale.len(),
            "applying styles"
        );

        self.track(node, query, applied);
        cascade.write(tree, node, &stale)?;
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Store `node`'s query and re-register it with the nodes it watches.
    fn track(&mut self, node: NodeId, query: SelectorQuery<NodeId>, applied: BTreeSet<PropertyId>) {
        self.unwatch(node);
        for watched in query.dependencies().nodes() {
            self.watchers.entry(watched).or_default().insert(node);
        }
        self.styles.insert(node, NodeStyle { query, applied });
    }

    fn unwatch(&mut self, node: NodeId) {
        let Some(style) = self.styles.get(&node) else {
            return;
        };
        for watched in style.query.dependencies().nodes() {
            if let Some(set) = self.watchers.get_mut(&watched) {
                set.remove(&node);
                if set.is_empty() {
                    self.watchers.remove(&watched);
                }
            }
        }
    }

    fn forget(&mut self, node: NodeId) {
        self.unwatch(node);
        self.styles.remove(&node);
        self.watchers.remove(&node);
    }

    fn restyle_all(&mut self, tree: &mut ViewTree) -> Result<()> {
        let _span = PerfSpan::new(span_names::CASCADE);
        let styled: Vec<NodeId> = self.styles.keys().copied().collect();
        let mut first_error = None;
        for node in styled {
            if !tree.contains(node) {
                self.forget(node);
            } else if let Err(err) = self.apply(tree, node) {
                tracing::warn!(target: targets::CASCADE, ?node, %err, "styling pass failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RuleAst;
    use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry};
    use horizon_bridge_core::{Property, ValueSource};

    fn setup() -> (ViewTree, Property<String>) {
        let mut registry = PropertyRegistry::new();
        let color = registry
            .register(
                OwnerType("View"),
                PropertyDescriptor::new("color", String::from("black"))
                    .css("color")
                    .inheritable()
                    .parse_from_str(),
            )
            .unwrap();
        (ViewTree::new(registry), color)
    }

    fn sheet(rules: &[(&str, &str)]) -> StyleSheet {
        StyleSheet::from_rules(
            rules
                .iter()
                .map(|(selector, color)| RuleAst::with_selector_text(selector).declaration("color", *color)),
        )
        .unwrap()
    }

    #[test]
    fn stale_css_values_are_cleared() {
        let (mut tree, color) = setup();
        let node = tree.create_node("Button");
        tree.add_class(node, "primary").unwrap();
        let mut scope = StyleScope::new(sheet(&[(".primary", "blue")]));
        scope.process_invalidations(&mut tree).unwrap();
        assert_eq!(tree.get(node, color).unwrap(), "blue");

        tree.remove_class(node, "primary").unwrap();
        scope.process_invalidations(&mut tree).unwrap();
        assert_eq!(tree.get(node, color).unwrap(), "black");
        assert_eq!(tree.value_source(node, color).unwrap(), ValueSource::Default);
    }

    #[test]
    fn watchers_follow_the_latest_query() {
        let (mut tree, _) = setup();
        let node = tree.create_node("Button");
        let mut scope = StyleScope::new(sheet(&[("Button:hover", "blue")]));
        scope.apply(&mut tree, node).unwrap();
        assert!(scope.depends_on_pseudo_class(node, "hover"));

        tree.set_css_type(node, "Label").unwrap();
        scope.process_invalidations(&mut tree).unwrap();
        assert!(!scope.depends_on_pseudo_class(node, "hover"));
        assert!(scope.watchers.is_empty());
    }

    #[test]
    fn destroyed_nodes_are_forgotten() {
        let (mut tree, _) = setup();
        let node = tree.create_node("Button");
        let mut scope = StyleScope::new(sheet(&[("Button:hover", "blue")]));
        scope.process_invalidations(&mut tree).unwrap();
        assert!(scope.is_styled(node));

        tree.destroy(node).unwrap();
        assert_eq!(scope.process_invalidations(&mut tree).unwrap(), 0);
        assert!(!scope.is_styled(node));
        assert!(scope.watchers.is_empty());
    }

    #[test]
    fn replacing_the_stylesheet_restyles() {
        let (mut tree, color) = setup();
        let node = tree.create_node("Button");
        let mut scope = StyleScope::new(sheet(&[("Button", "blue")]));
        scope.process_invalidations(&mut tree).unwrap();

        scope
            .set_stylesheet(&mut tree, sheet(&[("Button", "green")]))
            .unwrap();
        assert_eq!(tree.get(node, color).unwrap(), "green");

        scope.add_stylesheet(&mut tree, sheet(&[("Button", "red")])).unwrap();
        assert_eq!(tree.get(node, color).unwrap(), "red");

        scope.set_stylesheet(&mut tree, StyleSheet::new()).unwrap();
        assert_eq!(tree.get(node, color).unwrap(), "black");
    }

    #[test]
    fn apply_rejects_unknown_nodes() {
        let (mut tree, _) = setup();
        let node = tree.create_node("Button");
        tree.destroy(node).unwrap();
        let mut scope = StyleScope::new(StyleSheet::new());
        assert!(scope.apply(&mut tree, node).is_err());
    }

    #[test]
    fn config_builders() {
        let config = ScopeConfig::default()
            .with_unknown_properties(UnknownPropertyPolicy::Error)
            .with_following_siblings(false);
        assert_eq!(config.unknown_properties, UnknownPropertyPolicy::Error);
        assert!(!config.restyle_following_siblings);
        assert_eq!(ScopeConfig::strict().unknown_properties, UnknownPropertyPolicy::Error);
    }
}
