//! The property descriptor table.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::descriptor::{PropertyDescriptor, PropertyInfo};
use super::shorthand::{PropertyAssignment, Shorthand, ShorthandDescriptor, ShorthandId, ShorthandInfo};
use super::value::PropertyType;
use crate::error::PropertyError;

/// Name of the component type that owns a set of properties.
///
/// Property names only need to be unique per owner; two owners may both
/// declare a `text` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerType(pub &'static str);

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Untyped identifier of a registered property.
///
/// Ids are assigned in registration order and are only meaningful for the
/// registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(u32);

impl PropertyId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the registry.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Typed handle returned by [`PropertyRegistry::register`].
pub struct Property<T> {
    id: PropertyId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
    pub(crate) fn from_id(id: PropertyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The untyped id.
    #[inline]
    pub fn id(self) -> PropertyId {
        self.id
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Property<T> {}

impl<T> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Property<T> {}

impl<T> Hash for Property<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&self.id.0).finish()
    }
}

impl<T> From<Property<T>> for PropertyId {
    fn from(property: Property<T>) -> Self {
        property.id
    }
}

/// What a CSS property name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A property that stores a value.
    Longhand(PropertyId),
    /// A property that expands into longhands.
    Shorthand(ShorthandId),
}

/// Table of every property descriptor known to a [`ViewTree`](crate::ViewTree).
///
/// Build it once at startup, then hand it to the tree. Registration errors are
/// configuration bugs and surface here, never while styling.
///
/// # Example
///
/// ```
/// use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry};
///
/// let mut registry = PropertyRegistry::new();
/// let color = registry
///     .register(OwnerType("Label"), PropertyDescriptor::new("color", String::from("black")).css("color"))
///     .unwrap();
///
/// assert_eq!(registry.info(color.id()).unwrap().name(), "color");
/// assert!(registry
///     .register(OwnerType("Label"), PropertyDescriptor::new("color", String::new()))
///     .is_err());
/// ```
#[derive(Default)]
pub struct PropertyRegistry {
    properties: Vec<PropertyInfo>,
    shorthands: Vec<ShorthandInfo>,
    by_owner: HashMap<(OwnerType, String), PropertyKind>,
    by_css_name: HashMap<String, PropertyKind>,
}

impl PropertyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a property on `owner`.
    pub fn register<T: PropertyType>(
        &mut self,
        owner: OwnerType,
        descriptor: PropertyDescriptor<T>,
    ) -> Result<Property<T>, PropertyError> {
        self.check_names(owner, descriptor.name(), descriptor.css_name())?;

        let id = PropertyId::from_index(self.properties.len());
        let info = descriptor.into_info(owner, id);
        self.claim_names(owner, info.name(), info.css_name(), PropertyKind::Longhand(id));
        tracing::debug!(
            target: "horizon_bridge_core::property",
            %owner,
            name = info.name(),
            css_name = ?info.css_name(),
            ?id,
            "registered property"
        );
        self.properties.push(info);

        Ok(Property::from_id(id))
    }

    /// Register a shorthand on `owner`.
    ///
    /// Every longhand it names must already be registered, and a shorthand
    /// with a CSS name may only name css-backed longhands.
    pub fn register_shorthand<T: PropertyType>(
        &mut self,
        owner: OwnerType,
        descriptor: ShorthandDescriptor<T>,
    ) -> Result<Shorthand<T>, PropertyError> {
        self.check_names(owner, descriptor.name(), descriptor.css_name())?;
        if let Some(unknown) = descriptor
            .longhands()
            .iter()
            .find(|id| id.index() >= self.properties.len())
        {
            return Err(PropertyError::UnknownProperty {
                name: format!("{unknown:?}"),
            });
        }
        if descriptor.css_name().is_some() {
            let plain = descriptor
                .longhands()
                .iter()
                .filter_map(|id| self.properties.get(id.index()))
                .find(|info| !info.capabilities().css);
            if let Some(info) = plain {
                return Err(PropertyError::InvalidLonghand {
                    shorthand: descriptor.name().to_string(),
                    longhand: info.name().to_string(),
                    reason: "longhand has no CSS name",
                });
            }
        }

        let id = ShorthandId::from_index(self.shorthands.len());
        let info = descriptor.into_info(owner, id);
        self.claim_names(owner, info.name(), info.css_name(), PropertyKind::Shorthand(id));
        tracing::debug!(
            target: "horizon_bridge_core::property",
            %owner,
            name = info.name(),
            longhands = info.longhands().len(),
            "registered shorthand"
        );
        self.shorthands.push(info);

        Ok(Shorthand::from_id(id))
    }

    fn check_names(
        &self,
        owner: OwnerType,
        name: &str,
        css_name: Option<&str>,
    ) -> Result<(), PropertyError> {
        if self.by_owner.contains_key(&(owner, name.to_string())) {
            return Err(PropertyError::DuplicateRegistration {
                owner: owner.0,
                name: name.to_string(),
            });
        }
        if let Some(css_name) = css_name {
            if self.by_css_name.contains_key(css_name) {
                return Err(PropertyError::DuplicateCssName {
                    name: css_name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn claim_names(&mut self, owner: OwnerType, name: &str, css_name: Option<&str>, kind: PropertyKind) {
        self.by_owner.insert((owner, name.to_string()), kind);
        if let Some(css_name) = css_name {
            self.by_css_name.insert(css_name.to_string(), kind);
        }
    }

    /// Look up a property or shorthand by owner and name.
    pub fn lookup(&self, owner: OwnerType, name: &str) -> Option<PropertyKind> {
        self.by_owner.get(&(owner, name.to_string())).copied()
    }

    /// Look up a property or shorthand by CSS name.
    pub fn lookup_css(&self, css_name: &str) -> Option<PropertyKind> {
        self.by_css_name.get(css_name).copied()
    }

    /// Descriptor of a registered property.
    pub fn info(&self, id: PropertyId) -> Result<&PropertyInfo, PropertyError> {
        self.properties
            .get(id.index())
            .ok_or_else(|| PropertyError::UnknownProperty {
                name: format!("{id:?}"),
            })
    }

    /// Descriptor of a registered shorthand.
    pub fn shorthand_info(&self, id: ShorthandId) -> Result<&ShorthandInfo, PropertyError> {
        self.shorthands
            .get(id.index())
            .ok_or_else(|| PropertyError::UnknownProperty {
                name: format!("{id:?}"),
            })
    }

    /// Iterate over every registered property in registration order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyInfo> {
        self.properties.iter()
    }

    /// Number of registered (longhand) properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.shorthands.is_empty()
    }

    /// Turn a stylesheet declaration into longhand assignments.
    ///
    /// Longhands convert `text` with their own converter. Shorthands convert
    /// it and expand into their longhands. Unknown names are
    /// [`PropertyError::UnknownProperty`].
    pub fn resolve_declaration(
        &self,
        css_name: &str,
        text: &str,
    ) -> Result<Vec<PropertyAssignment>, PropertyError> {
        match self.lookup_css(css_name) {
            Some(PropertyKind::Longhand(id)) => {
                let value = self.info(id)?.convert(text)?;
                Ok(vec![PropertyAssignment { property: id, value }])
            }
            Some(PropertyKind::Shorthand(id)) => {
                let info = self.shorthand_info(id)?;
                let value = info.convert(text)?;
                info.expand(&value)
            }
            None => Err(PropertyError::UnknownProperty {
                name: css_name.to_string(),
            }),
        }
    }

    /// Longhand ids a CSS name writes to, without converting any value.
    pub fn css_targets(&self, css_name: &str) -> Option<Vec<PropertyId>> {
        match self.lookup_css(css_name)? {
            PropertyKind::Longhand(id) => Some(vec![id]),
            PropertyKind::Shorthand(id) => self
                .shorthand_info(id)
                .ok()
                .map(|info| info.longhands().to_vec()),
        }
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("properties", &self.properties.len())
            .field("shorthands", &self.shorthands.len())
            .finish()
    }
}
