//! Shorthand properties.
//!
//! A shorthand stores nothing of its own. Writing it expands the value into
//! `(longhand, value)` pairs written at the same tier; reading it composes the
//! current longhand values back into one value.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use super::registry::{OwnerType, Property, PropertyId};
use super::value::{PropertyType, PropertyValue};
use crate::error::PropertyError;
use crate::tree::NodeValues;

/// One longhand write produced by expanding a shorthand or declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAssignment {
    /// The longhand being written.
    pub property: PropertyId,
    /// The value to write.
    pub value: PropertyValue,
}

impl PropertyAssignment {
    /// Assign `value` to a typed property.
    pub fn new<T: PropertyType>(property: Property<T>, value: T) -> Self {
        Self {
            property: property.id(),
            value: PropertyValue::new(value),
        }
    }
}

/// Untyped identifier of a registered shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShorthandId(u32);

impl ShorthandId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the registry's shorthand table.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Typed handle returned by
/// [`PropertyRegistry::register_shorthand`](super::PropertyRegistry::register_shorthand).
pub struct Shorthand<T> {
    id: ShorthandId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Shorthand<T> {
    pub(crate) fn from_id(id: ShorthandId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The untyped id.
    #[inline]
    pub fn id(self) -> ShorthandId {
        self.id
    }
}

impl<T> Clone for Shorthand<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Shorthand<T> {}

impl<T> PartialEq for Shorthand<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Shorthand<T> {}

impl<T> fmt::Debug for Shorthand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shorthand").field(&self.id.0).finish()
    }
}

type ExpandFn<T> = Arc<dyn Fn(&T) -> Vec<PropertyAssignment> + Send + Sync>;
type ComposeFn<T> = Arc<dyn Fn(&NodeValues<'_>) -> T + Send + Sync>;
type ConverterFn<T> = Arc<dyn Fn(&str) -> Result<T, String> + Send + Sync>;

/// Builder describing a shorthand of type `T`.
///
/// # Example
///
/// ```
/// use horizon_bridge_core::property::{
///     OwnerType, PropertyAssignment, PropertyDescriptor, PropertyRegistry, ShorthandDescriptor,
/// };
///
/// let mut registry = PropertyRegistry::new();
/// let top = registry
///     .register(OwnerType("View"), PropertyDescriptor::new("margin-top", 0.0f32))
///     .unwrap();
/// let bottom = registry
///     .register(OwnerType("View"), PropertyDescriptor::new("margin-bottom", 0.0f32))
///     .unwrap();
///
/// let margin = ShorthandDescriptor::new(
///     "margin",
///     move |v: &f32| vec![PropertyAssignment::new(top, *v), PropertyAssignment::new(bottom, *v)],
///     move |values| values.get(top).unwrap_or_default(),
/// )
/// .longhand(top)
/// .longhand(bottom);
///
/// assert!(registry.register_shorthand(OwnerType("View"), margin).is_ok());
/// ```
pub struct ShorthandDescriptor<T: PropertyType> {
    name: String,
    css_name: Option<String>,
    longhands: Vec<PropertyId>,
    expand: ExpandFn<T>,
    compose: ComposeFn<T>,
    converter: Option<ConverterFn<T>>,
}

impl<T: PropertyType> ShorthandDescriptor<T> {
    /// Describe a shorthand by its expansion and composition functions.
    pub fn new<E, C>(name: impl Into<String>, expand: E, compose: C) -> Self
    where
        E: Fn(&T) -> Vec<PropertyAssignment> + Send + Sync + 'static,
        C: Fn(&NodeValues<'_>) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            css_name: None,
            longhands: Vec::new(),
            expand: Arc::new(expand),
            compose: Arc::new(compose),
            converter: None,
        }
    }

    /// Make the shorthand usable from stylesheets under `css_name`.
    pub fn css(mut self, css_name: impl Into<String>) -> Self {
        self.css_name = Some(css_name.into());
        self
    }

    /// Declare a longhand this shorthand may write.
    pub fn longhand<L>(mut self, property: Property<L>) -> Self {
        self.longhands.push(property.id());
        self
    }

    /// Convert stylesheet text into shorthand values.
    pub fn converter<F>(mut self, converter: F) -> Self
    where
        F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Use `T`'s [`FromStr`] implementation as the text converter.
    pub fn parse_from_str(self) -> Self
    where
        T: FromStr,
        <T as FromStr>::Err: fmt::Display,
    {
        self.converter(|text| text.trim().parse::<T>().map_err(|e| e.to_string()))
    }

    /// The shorthand name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The CSS name, if any.
    pub fn css_name(&self) -> Option<&str> {
        self.css_name.as_deref()
    }

    /// The declared longhands.
    pub fn longhands(&self) -> &[PropertyId] {
        &self.longhands
    }

    pub(crate) fn into_info(self, owner: OwnerType, id: ShorthandId) -> ShorthandInfo {
        let name = self.name.clone();
        let expand = self.expand;
        let compose = self.compose;
        ShorthandInfo {
            id,
            owner,
            name: self.name,
            css_name: self.css_name,
            longhands: self.longhands,
            type_name: std::any::type_name::<T>(),
            expand: Arc::new(move |value: &PropertyValue| {
                value
                    .downcast_ref::<T>()
                    .map(|value| expand(value))
                    .ok_or_else(|| PropertyError::TypeMismatch {
                        property: name.clone(),
                        expected: std::any::type_name::<T>(),
                        got: value.type_name(),
                    })
            }),
            compose: Arc::new(move |values: &NodeValues<'_>| PropertyValue::new(compose(values))),
            converter: self.converter.map(|convert| -> ErasedConverterFn {
                Arc::new(move |text: &str| convert(text).map(PropertyValue::new))
            }),
        }
    }
}

type ErasedExpandFn =
    Arc<dyn Fn(&PropertyValue) -> Result<Vec<PropertyAssignment>, PropertyError> + Send + Sync>;
type ErasedComposeFn = Arc<dyn Fn(&NodeValues<'_>) -> PropertyValue + Send + Sync>;
type ErasedConverterFn = Arc<dyn Fn(&str) -> Result<PropertyValue, String> + Send + Sync>;

/// A registered, type-erased shorthand descriptor.
pub struct ShorthandInfo {
    id: ShorthandId,
    owner: OwnerType,
    name: String,
    css_name: Option<String>,
    longhands: Vec<PropertyId>,
    type_name: &'static str,
    expand: ErasedExpandFn,
    compose: ErasedComposeFn,
    converter: Option<ErasedConverterFn>,
}

impl ShorthandInfo {
    /// The registry id.
    pub fn id(&self) -> ShorthandId {
        self.id
    }

    /// The owning type.
    pub fn owner(&self) -> OwnerType {
        self.owner
    }

    /// The shorthand name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The CSS name, if any.
    pub fn css_name(&self) -> Option<&str> {
        self.css_name.as_deref()
    }

    /// The declared longhands.
    pub fn longhands(&self) -> &[PropertyId] {
        &self.longhands
    }

    /// Expand a value into longhand assignments.
    pub fn expand(&self, value: &PropertyValue) -> Result<Vec<PropertyAssignment>, PropertyError> {
        let assignments = (self.expand)(value)?;
        if let Some(stray) = assignments
            .iter()
            .find(|assignment| !self.longhands.contains(&assignment.property))
        {
            return Err(PropertyError::InvalidLonghand {
                shorthand: self.name.clone(),
                longhand: format!("{:?}", stray.property),
                reason: "not a declared longhand",
            });
        }
        Ok(assignments)
    }

    /// Convert text into a shorthand value.
    pub fn convert(&self, text: &str) -> Result<PropertyValue, PropertyError> {
        let converter = self
            .converter
            .as_ref()
            .ok_or_else(|| PropertyError::NoConverter {
                property: self.name.clone(),
            })?;
        converter(text).map_err(|message| PropertyError::invalid_value(&self.name, message))
    }

    pub(crate) fn compose(&self, values: &NodeValues<'_>) -> PropertyValue {
        (self.compose)(values)
    }
}

impl fmt::Debug for ShorthandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShorthandInfo")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("css_name", &self.css_name)
            .field("longhands", &self.longhands)
            .field("type_name", &self.type_name)
            .finish()
    }
}
