//! Single rule set definition.

use crate::ast::{Declaration, RuleAst};
use crate::logging::targets;
use crate::selector::Selector;
use crate::Result;

/// A rule mapping a selector list to declarations.
///
/// Each rule set has:
/// - Selectors built from the parsed selector list
/// - Declarations in source order, the last one winning within the rule
/// - Its position in the stylesheet, for tie-breaking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    selectors: Vec<Selector>,
    declarations: Vec<Declaration>,
    position: usize,
}

impl RuleSet {
    /// Create a rule set.
    pub fn new(selectors: Vec<Selector>, declarations: Vec<Declaration>, position: usize) -> Self {
        Self {
            selectors,
            declarations,
            position,
        }
    }

    /// Build a rule set from parser output.
    ///
    /// Malformed selectors become [`Selector::Invalid`] and the rest of the
    /// rule is kept.
    pub fn from_ast(ast: RuleAst, position: usize) -> Result<Self> {
        let selectors = ast
            .selectors
            .into_iter()
            .map(Selector::from_ast)
            .collect::<Result<Vec<_>>>()?;

        for selector in selectors.iter().filter(|s| s.is_invalid()) {
            tracing::warn!(target: targets::SELECTOR, %selector, position, "rule has an invalid selector");
        }

        Ok(Self::new(selectors, ast.declarations, position))
    }

    /// The selectors.
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// The declarations in source order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Position of the rule in its stylesheet.
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SelectorAst;
    use crate::parser::parse_selector;

    #[test]
    fn invalid_selectors_do_not_drop_the_rule() {
        let ast = RuleAst::new(vec![parse_selector("Label"), parse_selector("Label >")])
            .declaration("color", "red");
        let rule = RuleSet::from_ast(ast, 3).unwrap();

        assert_eq!(rule.selectors().len(), 2);
        assert!(!rule.selectors()[0].is_invalid());
        assert!(rule.selectors()[1].is_invalid());
        assert_eq!(rule.declarations().len(), 1);
        assert_eq!(rule.position(), 3);
    }

    #[test]
    fn unsupported_combinator_fails_construction() {
        let ast = RuleAst::new(vec![parse_selector("A ~ B")]);
        assert!(RuleSet::from_ast(ast, 0).is_err());
    }

    #[test]
    fn empty_rule() {
        let rule = RuleSet::from_ast(RuleAst::new(Vec::<SelectorAst>::new()), 0).unwrap();
        assert!(rule.selectors().is_empty());
    }
}
