//! Core systems for Horizon Bridge.
//!
//! This crate provides the foundation the styling engine writes into:
//!
//! - **View Tree**: Arena of nodes with parent/child structure and the style
//!   identity selectors match against (type, id, classes, pseudo-classes,
//!   attributes)
//! - **Property System**: Descriptors registered once per owning type, typed
//!   handles, and per-node slots resolving Default / Inherited / Css / Local /
//!   Keyframe tiers
//! - **Inheritance**: Inheritable values flow down the tree on writes, attach
//!   and detach
//! - **Native Sync**: Resolved values are pushed to platform views, batched
//!   while updates are suspended
//!
//! # Example
//!
//! ```
//! use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry, ValueSource};
//! use horizon_bridge_core::ViewTree;
//!
//! let mut registry = PropertyRegistry::new();
//! let color = registry
//!     .register(
//!         OwnerType("Label"),
//!         PropertyDescriptor::new("color", String::from("black"))
//!             .css("color")
//!             .inheritable(),
//!     )
//!     .unwrap();
//!
//! let mut tree = ViewTree::new(registry);
//! let page = tree.create_node("Page");
//! let label = tree.create_node("Label");
//! tree.append_child(page, label).unwrap();
//!
//! tree.set_css(page, color, "navy".into()).unwrap();
//! assert_eq!(tree.get(label, color).unwrap(), "navy");
//!
//! tree.set(label, color, "red".into()).unwrap();
//! tree.set_css(page, color, "teal".into()).unwrap();
//! assert_eq!(tree.get(label, color).unwrap(), "red");
//!
//! tree.unset(label, color).unwrap();
//! assert_eq!(tree.get(label, color).unwrap(), "teal");
//! assert_eq!(tree.value_source(label, color).unwrap(), ValueSource::Inherited);
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod tree;

pub use error::{BridgeError, PropertyError, Result, TreeError};
pub use logging::{NodeTreeDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use property::{
    OwnerType, Property, PropertyDescriptor, PropertyId, PropertyRegistry, PropertyValue,
    Shorthand, ShorthandDescriptor, ValueSource,
};
pub use tree::{BatchGuard, NativeView, NodeId, NodeValues, StyleInvalidation, ViewTree};
