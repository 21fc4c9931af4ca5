//! Rule sets, the selector index, and stylesheets.

mod index;
mod rule;
mod stylesheet;

pub use crate::ast::Declaration;
pub use index::{IndexEntry, SelectorIndex};
pub use rule::RuleSet;
pub use stylesheet::StyleSheet;
