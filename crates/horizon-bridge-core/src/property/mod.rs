//! Property system for Horizon Bridge.
//!
//! Styleable attributes are described once by a [`PropertyDescriptor`] and
//! registered in a [`PropertyRegistry`], which hands back a typed
//! [`Property<T>`] handle. Values live per node in the
//! [`ViewTree`](crate::ViewTree), layered by [`ValueSource`]:
//!
//! | Tier | Written by |
//! |------|------------|
//! | `Default` | the descriptor (never stored) |
//! | `Inherited` | inheritance propagation from the parent |
//! | `Css` | the stylesheet cascade |
//! | `Local` | application code |
//! | `Keyframe` | animation drivers |
//!
//! The resolved value of a property is always the (coerced) value of the
//! highest populated tier; clearing a tier falls back to the next one down.
//!
//! # Example
//!
//! ```
//! use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry, ValueSource};
//! use horizon_bridge_core::ViewTree;
//!
//! let mut registry = PropertyRegistry::new();
//! let font_size = registry
//!     .register(
//!         OwnerType("View"),
//!         PropertyDescriptor::new("font-size", 12.0f32).css("font-size").inheritable(),
//!     )
//!     .unwrap();
//!
//! let mut tree = ViewTree::new(registry);
//! let parent = tree.create_node("StackLayout");
//! let child = tree.create_node("Label");
//! tree.append_child(parent, child).unwrap();
//!
//! tree.set(parent, font_size, 18.0).unwrap();
//! assert_eq!(tree.get(child, font_size).unwrap(), 18.0);
//! assert_eq!(tree.value_source(child, font_size).unwrap(), ValueSource::Inherited);
//! ```

mod descriptor;
mod registry;
mod shorthand;
pub(crate) mod slot;
mod value;

pub use descriptor::{Capabilities, NativeSync, PropertyChange, PropertyDescriptor, PropertyInfo};
pub(crate) use descriptor::ErasedChange;
pub use registry::{OwnerType, Property, PropertyId, PropertyKind, PropertyRegistry};
pub use shorthand::{PropertyAssignment, Shorthand, ShorthandDescriptor, ShorthandId, ShorthandInfo};
pub use value::{PropertyType, PropertyValue, ValueSource};

static_assertions::assert_impl_all!(PropertyValue: Send, Sync, Clone);
static_assertions::assert_impl_all!(Property<f32>: Send, Sync, Copy);
static_assertions::assert_impl_all!(Shorthand<f32>: Send, Sync, Copy);
static_assertions::assert_impl_all!(PropertyRegistry: Send, Sync);
