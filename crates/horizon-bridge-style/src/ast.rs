//! Parsed rule input consumed by the cascade.
//!
//! A stylesheet parser produces an ordered list of [`RuleAst`]s. Selector
//! text that could not be parsed arrives as [`SelectorAst::Malformed`] and
//! becomes an inert selector instead of failing the whole sheet.

use crate::parser::{parse_selector_list, ParseError};

/// One simple selector as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelectorAst {
    /// `*`
    Universal,
    /// `#name`
    Id(String),
    /// `Name`
    Type(String),
    /// `.name`
    Class(String),
    /// `[name]` or `[name<test>value]`, with the test operator kept as text.
    Attribute {
        name: String,
        test: Option<String>,
        value: Option<String>,
    },
    /// `:name`
    PseudoClass(String),
}

/// A selector from a rule's selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorAst {
    /// Compound selectors joined by combinator tokens, left to right.
    ///
    /// `combinators[i]` joins `sequences[i]` and `sequences[i + 1]`; a
    /// descendant combinator is written as `" "`.
    Parsed {
        sequences: Vec<Vec<SimpleSelectorAst>>,
        combinators: Vec<String>,
    },
    /// Selector text the parser rejected.
    Malformed { text: String, error: ParseError },
}

impl SelectorAst {
    /// A selector made of a single compound.
    pub fn compound(selectors: Vec<SimpleSelectorAst>) -> Self {
        Self::Parsed {
            sequences: vec![selectors],
            combinators: Vec::new(),
        }
    }

    /// Returns true if the parser rejected this selector.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// A `property: value` pair inside a rule block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// CSS property name.
    pub property: String,
    /// Unparsed value text, converted by the property's descriptor.
    pub value: String,
}

impl Declaration {
    /// Create a declaration.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// A rule as produced by the stylesheet parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleAst {
    /// The rule's selector list.
    pub selectors: Vec<SelectorAst>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl RuleAst {
    /// Create a rule with the given selectors and no declarations.
    pub fn new(selectors: Vec<SelectorAst>) -> Self {
        Self {
            selectors,
            declarations: Vec::new(),
        }
    }

    /// Create a rule from selector list text such as `"Button, .primary"`.
    pub fn with_selector_text(text: &str) -> Self {
        Self::new(parse_selector_list(text))
    }

    /// Append a declaration.
    pub fn declaration(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.declarations.push(Declaration::new(property, value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_declaration_order() {
        let rule = RuleAst::with_selector_text("Label, .title")
            .declaration("color", "red")
            .declaration("font-size", "14");

        assert_eq!(rule.selectors.len(), 2);
        assert_eq!(
            rule.declarations,
            vec![
                Declaration::new("color", "red"),
                Declaration::new("font-size", "14"),
            ]
        );
    }

    #[test]
    fn compound_has_no_combinators() {
        let ast = SelectorAst::compound(vec![SimpleSelectorAst::Type("Button".into())]);
        assert!(!ast.is_malformed());
        match ast {
            SelectorAst::Parsed { sequences, combinators } => {
                assert_eq!(sequences.len(), 1);
                assert!(combinators.is_empty());
            }
            SelectorAst::Malformed { .. } => unreachable!(),
        }
    }
}
