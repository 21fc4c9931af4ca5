//! Style resolution: querying a stylesheet and cascading the result.

mod cascade;
mod query;
mod scope;

pub use cascade::Cascade;
pub use query::{MatchedSelector, SelectorQuery};
pub use scope::{ScopeConfig, StyleScope, UnknownPropertyPolicy};
