//! Type-erased property values and value sources.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Bound satisfied by every type that can be stored in a styleable property.
///
/// Blanket-implemented; there is nothing to implement by hand.
pub trait PropertyType: Any + Clone + PartialEq + fmt::Debug + Send + Sync {}

impl<T> PropertyType for T where T: Any + Clone + PartialEq + fmt::Debug + Send + Sync {}

/// Object-safe view of a [`PropertyType`].
trait ErasedValue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_erased(&self, other: &dyn ErasedValue) -> bool;
    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn type_name(&self) -> &'static str;
}

impl<T: PropertyType> ErasedValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn ErasedValue) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A cheaply clonable, type-erased property value.
///
/// Values keep their concrete type's `PartialEq` and `Debug` behaviour, so a
/// `PropertyValue` can be compared and logged without knowing `T`.
///
/// # Example
///
/// ```
/// use horizon_bridge_core::property::PropertyValue;
///
/// let value = PropertyValue::new(12.5f32);
/// assert_eq!(value.downcast_ref::<f32>(), Some(&12.5));
/// assert!(value.downcast_ref::<String>().is_none());
/// assert_eq!(value, PropertyValue::new(12.5f32));
/// ```
#[derive(Clone)]
pub struct PropertyValue {
    inner: Arc<dyn ErasedValue>,
}

impl PropertyValue {
    /// Wrap a concrete value.
    pub fn new<T: PropertyType>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Borrow the value as `T`, if that is its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }

    /// Check whether the concrete type is `T`.
    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).as_any().is::<T>()
    }

    /// The concrete type's name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        (*self.inner).type_name()
    }

    /// The [`TypeId`] of the concrete value.
    pub fn value_type_id(&self) -> TypeId {
        (*self.inner).as_any().type_id()
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || (*self.inner).eq_erased(&*other.inner)
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (*self.inner).fmt_erased(f)
    }
}

/// Where a node's resolved property value currently comes from.
///
/// Ordered by precedence: a populated tier always shadows every tier below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum ValueSource {
    /// The descriptor's default value (or the captured native default).
    #[default]
    Default = 0,
    /// Adopted from the nearest ancestor.
    Inherited = 1,
    /// Applied by the stylesheet cascade.
    Css = 2,
    /// Assigned directly by application code.
    Local = 3,
    /// Written by an animation driver.
    Keyframe = 4,
}

impl ValueSource {
    /// Every storable tier, lowest precedence first. `Default` is never stored.
    pub const STORED: [ValueSource; 4] = [
        ValueSource::Inherited,
        ValueSource::Css,
        ValueSource::Local,
        ValueSource::Keyframe,
    ];

    /// Index into per-slot layer storage, `None` for `Default`.
    pub(crate) fn layer_index(self) -> Option<usize> {
        match self {
            ValueSource::Default => None,
            ValueSource::Inherited => Some(0),
            ValueSource::Css => Some(1),
            ValueSource::Local => Some(2),
            ValueSource::Keyframe => Some(3),
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueSource::Default => "default",
            ValueSource::Inherited => "inherited",
            ValueSource::Css => "css",
            ValueSource::Local => "local",
            ValueSource::Keyframe => "keyframe",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_equality_respects_type() {
        let a = PropertyValue::new(1i32);
        let b = PropertyValue::new(1i32);
        let c = PropertyValue::new(1i64);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn value_debug_uses_inner_type() {
        let value = PropertyValue::new("red".to_string());
        assert_eq!(format!("{value:?}"), "\"red\"");
        assert!(value.type_name().contains("String"));
    }

    #[test]
    fn source_ordering() {
        assert!(ValueSource::Keyframe > ValueSource::Local);
        assert!(ValueSource::Local > ValueSource::Css);
        assert!(ValueSource::Css > ValueSource::Inherited);
        assert!(ValueSource::Inherited > ValueSource::Default);
    }
}
