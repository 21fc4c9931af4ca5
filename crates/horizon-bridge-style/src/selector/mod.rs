//! CSS selector model and matching.
//!
//! Selectors are immutable once built from a [`SelectorAst`]. Each one knows
//! its specificity, whether it reads dynamic state (attributes and
//! pseudo-classes), and which index bucket it belongs in.
//!
//! Dynamic selectors are matched in two steps: [`Selector::accumulate_changes`]
//! ignores dynamic state and records what it would have read into a
//! [`DependencyMap`], and [`Selector::matches`] decides the current result.
//! The map tells the host which state changes can flip the result.

mod complex;
mod dependency;
mod sequence;
mod simple;
pub mod specificity;
mod tree;

use std::fmt;

pub use complex::{Combinator, ComplexSelector};
pub use dependency::{DependencyMap, NodeDependencies};
pub use sequence::SimpleSelectorSequence;
pub use simple::{AttributeTest, SimpleSelector};
pub use specificity::Rarity;
pub use tree::MatchTree;

use crate::ast::{SelectorAst, SimpleSelectorAst};
use crate::logging::targets;
use crate::parser::parse_selector;
use crate::{Error, Result};

/// Bucket of the selector index a selector is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Checked against every node.
    Universal,
    /// Checked against nodes with this id.
    Id(String),
    /// Checked against nodes of this type.
    Type(String),
    /// Checked against nodes with this class.
    Class(String),
}

/// A selector from a rule's selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A single simple selector.
    Simple(SimpleSelector),
    /// Several simple selectors on one node.
    Sequence(SimpleSelectorSequence),
    /// Sequences joined by combinators.
    Complex(ComplexSelector),
    /// Selector text that could not be parsed. Never matches and is never
    /// indexed.
    Invalid {
        /// The source text.
        text: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl Selector {
    /// Parse selector text.
    ///
    /// Malformed text yields [`Selector::Invalid`]; a combinator other than
    /// descendant, `>` or `+` is an [`Error::UnsupportedCombinator`].
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_ast(parse_selector(text))
    }

    /// Build a selector from parser output.
    pub fn from_ast(ast: SelectorAst) -> Result<Self> {
        let (sequences, combinators) = match ast {
            SelectorAst::Malformed { text, error } => {
                tracing::debug!(target: targets::SELECTOR, %text, %error, "malformed selector");
                return Ok(Self::invalid(text, error.to_string()));
            }
            SelectorAst::Parsed {
                sequences,
                combinators,
            } => (sequences, combinators),
        };

        if sequences.is_empty()
            || sequences.iter().any(Vec::is_empty)
            || combinators.len() + 1 != sequences.len()
        {
            return Ok(Self::invalid(
                describe(&sequences, &combinators),
                "selector has empty or unbalanced parts",
            ));
        }

        let mut compounds = Vec::with_capacity(sequences.len());
        for sequence in &sequences {
            let mut simples = Vec::with_capacity(sequence.len());
            for ast in sequence {
                match simple_from_ast(ast) {
                    Ok(simple) => simples.push(simple),
                    Err(reason) => {
                        return Ok(Self::invalid(describe(&sequences, &combinators), reason));
                    }
                }
            }
            compounds.push(simples);
        }

        if compounds.len() == 1 {
            let mut simples = compounds.remove(0);
            return Ok(if simples.len() == 1 {
                Self::Simple(simples.remove(0))
            } else {
                Self::Sequence(SimpleSelectorSequence::new(simples))
            });
        }

        let mut parsed = Vec::with_capacity(combinators.len());
        for token in &combinators {
            match Combinator::from_token(token) {
                Some(combinator) => parsed.push(combinator),
                None => {
                    return Err(Error::unsupported_combinator(
                        describe(&sequences, &combinators),
                        token.trim(),
                    ));
                }
            }
        }
        Ok(Self::Complex(ComplexSelector::new(
            compounds.into_iter().map(SimpleSelectorSequence::new).collect(),
            parsed,
        )))
    }

    fn invalid(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the selector matches `node` in its current state.
    pub fn matches<T: MatchTree>(&self, tree: &T, node: T::Node) -> bool {
        match self {
            Self::Simple(s) => s.matches(tree, node),
            Self::Sequence(s) => s.matches(tree, node),
            Self::Complex(s) => s.matches(tree, node),
            Self::Invalid { .. } => false,
        }
    }

    /// Match ignoring dynamic state and record the dynamic state examined.
    ///
    /// For a static selector this is [`matches`](Self::matches). For a
    /// dynamic one it answers whether some attribute or pseudo-class state
    /// could make the selector match, and records that state in `deps`.
    pub fn accumulate_changes<T: MatchTree>(
        &self,
        tree: &T,
        node: T::Node,
        deps: &mut DependencyMap<T::Node>,
    ) -> bool {
        match self {
            Self::Simple(s) => s.accumulate_changes(tree, node, deps),
            Self::Sequence(s) => s.accumulate_changes(tree, node, deps),
            Self::Complex(s) => s.accumulate_changes(tree, node, deps),
            Self::Invalid { .. } => false,
        }
    }

    /// The selector's specificity.
    pub fn specificity(&self) -> u32 {
        match self {
            Self::Simple(s) => s.specificity(),
            Self::Sequence(s) => s.specificity(),
            Self::Complex(s) => s.specificity(),
            Self::Invalid { .. } => 0,
        }
    }

    /// Returns true if matching depends on attributes or pseudo-classes.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Simple(s) => s.is_dynamic(),
            Self::Sequence(s) => s.is_dynamic(),
            Self::Complex(s) => s.is_dynamic(),
            Self::Invalid { .. } => false,
        }
    }

    /// Returns true for [`Selector::Invalid`].
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// The index bucket for this selector, or `None` if it is invalid.
    pub fn index_key(&self) -> Option<IndexKey> {
        let head = match self {
            Self::Simple(s) => s,
            Self::Sequence(s) => s.head(),
            Self::Complex(s) => s.last().head(),
            Self::Invalid { .. } => return None,
        };
        Some(match head {
            SimpleSelector::Id(id) => IndexKey::Id(id.clone()),
            SimpleSelector::Class(class) => IndexKey::Class(class.clone()),
            SimpleSelector::Type(css_type) => IndexKey::Type(css_type.clone()),
            SimpleSelector::Universal
            | SimpleSelector::Attribute { .. }
            | SimpleSelector::PseudoClass(_) => IndexKey::Universal,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "{s}"),
            Self::Sequence(s) => write!(f, "{s}"),
            Self::Complex(s) => write!(f, "{s}"),
            Self::Invalid { text, .. } => f.write_str(text),
        }
    }
}

fn simple_from_ast(ast: &SimpleSelectorAst) -> std::result::Result<SimpleSelector, String> {
    Ok(match ast {
        SimpleSelectorAst::Universal => SimpleSelector::Universal,
        SimpleSelectorAst::Id(id) => SimpleSelector::Id(id.clone()),
        SimpleSelectorAst::Type(css_type) => SimpleSelector::Type(css_type.clone()),
        SimpleSelectorAst::Class(class) => SimpleSelector::Class(class.clone()),
        SimpleSelectorAst::PseudoClass(name) => SimpleSelector::PseudoClass(name.clone()),
        SimpleSelectorAst::Attribute { name, test, value } => {
            let test = match (test, value) {
                (None, None) => None,
                (Some(op), Some(value)) => {
                    let op = AttributeTest::from_token(op)
                        .ok_or_else(|| format!("unknown attribute operator '{op}'"))?;
                    Some((op, value.clone()))
                }
                _ => return Err(format!("attribute '{name}' needs both an operator and a value")),
            };
            SimpleSelector::Attribute {
                name: name.clone(),
                test,
            }
        }
    })
}

/// Reconstruct source-like text for selectors rejected after parsing.
fn describe(sequences: &[Vec<SimpleSelectorAst>], combinators: &[String]) -> String {
    let mut text = String::new();
    for (index, sequence) in sequences.iter().enumerate() {
        if index > 0 {
            match combinators.get(index - 1).map(|c| c.trim()) {
                Some("") | None => text.push(' '),
                Some(token) => {
                    text.push(' ');
                    text.push_str(token);
                    text.push(' ');
                }
            }
        }
        for simple in sequence {
            match simple {
                SimpleSelectorAst::Universal => text.push('*'),
                SimpleSelectorAst::Id(id) => {
                    text.push('#');
                    text.push_str(id);
                }
                SimpleSelectorAst::Type(css_type) => text.push_str(css_type),
                SimpleSelectorAst::Class(class) => {
                    text.push('.');
                    text.push_str(class);
                }
                SimpleSelectorAst::Attribute { name, test, value } => {
                    text.push('[');
                    text.push_str(name);
                    if let Some(test) = test {
                        text.push_str(test);
                    }
                    if let Some(value) = value {
                        text.push_str(value);
                    }
                    text.push(']');
                }
                SimpleSelectorAst::PseudoClass(name) => {
                    text.push(':');
                    text.push_str(name);
                }
            }
        }
    }
    text
}

static_assertions::assert_impl_all!(Selector: Send, Sync);
