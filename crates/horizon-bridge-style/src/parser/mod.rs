//! Selector text parsing.
//!
//! Whole-stylesheet parsing belongs to the host; this module only turns
//! selector text into [`SelectorAst`](crate::ast::SelectorAst)s.

mod error;
mod selector_parser;

pub use error::ParseError;
pub use selector_parser::{parse_selector, parse_selector_list};
