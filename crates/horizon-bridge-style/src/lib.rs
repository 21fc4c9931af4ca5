//! CSS-like styling cascade for Horizon Bridge.
//!
//! This crate turns parsed stylesheet rules into property values on a
//! [`ViewTree`](horizon_bridge_core::ViewTree):
//!
//! - **Selectors**: type, class, id, attribute and pseudo-class selectors,
//!   combined with descendant, child and adjacent-sibling combinators
//! - **Indexing**: rules are bucketed by their most specific member so a
//!   node only examines selectors that can match it
//! - **Cascading**: matched declarations apply in specificity order at the
//!   Css tier, below local values and animations
//! - **Invalidation**: attribute and pseudo-class changes only restyle the
//!   nodes whose selectors read them
//!
//! # Example
//!
//! ```
//! use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry};
//! use horizon_bridge_core::ViewTree;
//! use horizon_bridge_style::prelude::*;
//!
//! let mut registry = PropertyRegistry::new();
//! let width = registry
//!     .register(
//!         OwnerType("View"),
//!         PropertyDescriptor::new("width", 0.0f32).css("width").parse_from_str(),
//!     )
//!     .unwrap();
//!
//! let mut tree = ViewTree::new(registry);
//! let page = tree.create_node("Page");
//! let button = tree.create_node("Button");
//! tree.append_child(page, button).unwrap();
//!
//! let sheet = StyleSheet::from_rules([
//!     RuleAst::with_selector_text("Page > Button").declaration("width", "120"),
//!     RuleAst::with_selector_text("Button").declaration("width", "80"),
//! ])
//! .unwrap();
//!
//! let mut scope = StyleScope::new(sheet);
//! scope.process_invalidations(&mut tree).unwrap();
//! assert_eq!(tree.get(button, width).unwrap(), 120.0);
//! ```

pub mod ast;
pub mod logging;
pub mod parser;
pub mod resolve;
pub mod rules;
pub mod selector;

mod error;

pub use error::{Error, Result};
pub use resolve::{ScopeConfig, SelectorQuery, StyleScope, UnknownPropertyPolicy};
pub use rules::StyleSheet;
pub use selector::Selector;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::ast::{Declaration, RuleAst, SelectorAst};
    pub use crate::parser::{parse_selector, parse_selector_list};
    pub use crate::resolve::{ScopeConfig, SelectorQuery, StyleScope, UnknownPropertyPolicy};
    pub use crate::rules::{RuleSet, StyleSheet};
    pub use crate::selector::{Combinator, MatchTree, Selector};
}
