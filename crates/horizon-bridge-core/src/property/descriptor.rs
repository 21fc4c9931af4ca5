//! Property descriptors.
//!
//! A [`PropertyDescriptor`] is the typed, builder-style description of one
//! styleable attribute. Registering it with a
//! [`PropertyRegistry`](super::PropertyRegistry) erases the type into a
//! [`PropertyInfo`] that the tree consults on every write.

use std::any::TypeId;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::registry::{OwnerType, Property, PropertyId};
use super::value::{PropertyType, PropertyValue, ValueSource};
use crate::tree::{NodeId, NodeValues};

type CoerceFn<T> = Arc<dyn Fn(T, &NodeValues<'_>) -> T + Send + Sync>;
type EqualityFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;
type ConverterFn<T> = Arc<dyn Fn(&str) -> Result<T, String> + Send + Sync>;
type ChangedFn<T> = Arc<dyn Fn(&PropertyChange<T>) + Send + Sync>;

pub(crate) type ErasedCoerceFn =
    Arc<dyn Fn(PropertyValue, &NodeValues<'_>) -> PropertyValue + Send + Sync>;
pub(crate) type ErasedEqualityFn = Arc<dyn Fn(&PropertyValue, &PropertyValue) -> bool + Send + Sync>;
pub(crate) type ErasedConverterFn =
    Arc<dyn Fn(&str) -> Result<PropertyValue, String> + Send + Sync>;
pub(crate) type ErasedChangedFn = Arc<dyn Fn(&ErasedChange<'_>) + Send + Sync>;

/// How a property talks to the native view installed on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeSync {
    /// The property never reaches the native layer.
    #[default]
    None,
    /// Every resolved value change is pushed to the native view.
    Sync,
    /// Like [`NativeSync::Sync`], but the native view's own default is
    /// captured before the first push and restored when the property falls
    /// back to its default.
    SyncCaptureDefault,
}

/// Which value sources a descriptor accepts.
///
/// [`ValueSource::Local`] is always accepted. [`ValueSource::Inherited`] is
/// only ever written by propagation from the parent, never by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Assignments pass through a coercion callback.
    pub coercible: bool,
    /// Values flow from parent to child.
    pub inheritable: bool,
    /// Stylesheets may set the property.
    pub css: bool,
    /// Animation drivers may write the keyframe tier.
    pub animatable: bool,
}

impl Capabilities {
    /// Check whether callers may write values at `tier`.
    pub fn allows(&self, tier: ValueSource) -> bool {
        match tier {
            ValueSource::Default | ValueSource::Inherited => false,
            ValueSource::Local => true,
            ValueSource::Css => self.css,
            ValueSource::Keyframe => self.animatable,
        }
    }
}

/// A resolved value change, as delivered to `on_changed` callbacks.
#[derive(Debug, Clone)]
pub struct PropertyChange<T> {
    /// The node whose value changed.
    pub node: NodeId,
    /// The property that changed.
    pub property: Property<T>,
    /// The previously resolved value.
    pub old: T,
    /// The newly resolved value.
    pub new: T,
    /// The source of the new value.
    pub source: ValueSource,
}

/// Type-erased change record used internally to dispatch callbacks.
pub(crate) struct ErasedChange<'a> {
    pub node: NodeId,
    pub property: PropertyId,
    pub old: &'a PropertyValue,
    pub new: &'a PropertyValue,
    pub source: ValueSource,
}

/// Builder describing a styleable property of type `T`.
///
/// # Example
///
/// ```
/// use horizon_bridge_core::property::{NativeSync, PropertyDescriptor};
///
/// let opacity = PropertyDescriptor::new("opacity", 1.0f32)
///     .css("opacity")
///     .animatable()
///     .parse_from_str()
///     .coerce(|value, _| value.clamp(0.0, 1.0))
///     .native();
///
/// assert_eq!(opacity.name(), "opacity");
/// assert_eq!(opacity.native_sync(), NativeSync::Sync);
/// ```
pub struct PropertyDescriptor<T: PropertyType> {
    name: String,
    default: T,
    css_name: Option<String>,
    inheritable: bool,
    animatable: bool,
    affects_layout: bool,
    native: NativeSync,
    coerce: Option<CoerceFn<T>>,
    equality: Option<EqualityFn<T>>,
    converter: Option<ConverterFn<T>>,
    on_changed: Option<ChangedFn<T>>,
}

impl<T: PropertyType> PropertyDescriptor<T> {
    /// Describe a plain property with a name and default value.
    pub fn new(name: impl Into<String>, default: T) -> Self {
        Self {
            name: name.into(),
            default,
            css_name: None,
            inheritable: false,
            animatable: false,
            affects_layout: false,
            native: NativeSync::None,
            coerce: None,
            equality: None,
            converter: None,
            on_changed: None,
        }
    }

    /// Make the property settable from stylesheets under `css_name`.
    pub fn css(mut self, css_name: impl Into<String>) -> Self {
        self.css_name = Some(css_name.into());
        self
    }

    /// Let children adopt this node's value.
    pub fn inheritable(mut self) -> Self {
        self.inheritable = true;
        self
    }

    /// Accept keyframe writes from animation drivers.
    pub fn animatable(mut self) -> Self {
        self.animatable = true;
        self
    }

    /// Queue a layout request whenever the resolved value changes.
    pub fn affects_layout(mut self) -> Self {
        self.affects_layout = true;
        self
    }

    /// Push resolved values to the node's native view.
    pub fn native(mut self) -> Self {
        self.native = NativeSync::Sync;
        self
    }

    /// Push resolved values and restore the native view's own default when
    /// the property falls back to [`ValueSource::Default`].
    pub fn native_with_default(mut self) -> Self {
        self.native = NativeSync::SyncCaptureDefault;
        self
    }

    /// Coerce every assigned value before it becomes the resolved value.
    ///
    /// The callback can read the node's other properties through
    /// [`NodeValues`]. The raw value stays stored, so the coercion can be
    /// re-run later with [`ViewTree::coerce`](crate::ViewTree::coerce).
    pub fn coerce<F>(mut self, coerce: F) -> Self
    where
        F: Fn(T, &NodeValues<'_>) -> T + Send + Sync + 'static,
    {
        self.coerce = Some(Arc::new(coerce));
        self
    }

    /// Replace `PartialEq` as the no-op write detector.
    pub fn equality<F>(mut self, equality: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.equality = Some(Arc::new(equality));
        self
    }

    /// Convert stylesheet text into values.
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

    /// Observe resolved value changes.
    pub fn on_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PropertyChange<T>) + Send + Sync + 'static,
    {
        self.on_changed = Some(Arc::new(callback));
        self
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The CSS name, if the property is css-backed.
    pub fn css_name(&self) -> Option<&str> {
        self.css_name.as_deref()
    }

    /// The configured native sync mode.
    pub fn native_sync(&self) -> NativeSync {
        self.native
    }

    /// The capability flags this descriptor will register with.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            coercible: self.coerce.is_some(),
            inheritable: self.inheritable,
            css: self.css_name.is_some(),
            animatable: self.animatable,
        }
    }

    pub(crate) fn into_info(self, owner: OwnerType, id: PropertyId) -> PropertyInfo {
        let capabilities = self.capabilities();

        let equality: ErasedEqualityFn = match self.equality {
            Some(eq) => Arc::new(move |a: &PropertyValue, b: &PropertyValue| {
                match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                    (Some(a), Some(b)) => eq(a, b),
                    _ => false,
                }
            }),
            None => Arc::new(|a: &PropertyValue, b: &PropertyValue| a == b),
        };

        let coerce = self.coerce.map(|coerce| -> ErasedCoerceFn {
            Arc::new(move |value: PropertyValue, values: &NodeValues<'_>| {
                match value.downcast_ref::<T>() {
                    Some(raw) => PropertyValue::new(coerce(raw.clone(), values)),
                    None => value,
                }
            })
        });

        let converter = self.converter.map(|convert| -> ErasedConverterFn {
            Arc::new(move |text: &str| convert(text).map(PropertyValue::new))
        });

        let on_changed = self.on_changed.map(|callback| -> ErasedChangedFn {
            Arc::new(move |change: &ErasedChange<'_>| {
                if let (Some(old), Some(new)) =
                    (change.old.downcast_ref::<T>(), change.new.downcast_ref::<T>())
                {
                    callback(&PropertyChange {
                        node: change.node,
                        property: Property::from_id(change.property),
                        old: old.clone(),
                        new: new.clone(),
                        source: change.source,
                    });
                }
            })
        });

        PropertyInfo {
            id,
            owner,
            name: self.name,
            css_name: self.css_name,
            default: PropertyValue::new(self.default),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            capabilities,
            affects_layout: self.affects_layout,
            native: self.native,
            equality,
            coerce,
            converter,
            on_changed,
        }
    }
}

impl<T: PropertyType> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("css_name", &self.css_name)
            .field("capabilities", &self.capabilities())
            .field("affects_layout", &self.affects_layout)
            .field("native", &self.native)
            .finish()
    }
}

/// A registered, type-erased property descriptor.
pub struct PropertyInfo {
    id: PropertyId,
    owner: OwnerType,
    name: String,
    css_name: Option<String>,
    default: PropertyValue,
    type_id: TypeId,
    type_name: &'static str,
    capabilities: Capabilities,
    affects_layout: bool,
    native: NativeSync,
    equality: ErasedEqualityFn,
    coerce: Option<ErasedCoerceFn>,
    converter: Option<ErasedConverterFn>,
    on_changed: Option<ErasedChangedFn>,
}

impl PropertyInfo {
    /// The registry id.
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// The owning type.
    pub fn owner(&self) -> OwnerType {
        self.owner
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The CSS name, if the property is css-backed.
    pub fn css_name(&self) -> Option<&str> {
        self.css_name.as_deref()
    }

    /// The default value.
    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    /// Name of the value type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Capability flags.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether changes queue a layout request.
    pub fn affects_layout(&self) -> bool {
        self.affects_layout
    }

    /// The native sync mode.
    pub fn native_sync(&self) -> NativeSync {
        self.native
    }

    /// Whether the descriptor can convert stylesheet text.
    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Check whether `value` has this property's value type.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        value.value_type_id() == self.type_id
    }

    /// Convert text into a value of this property's type.
    pub fn convert(&self, text: &str) -> Result<PropertyValue, crate::PropertyError> {
        let converter = self
            .converter
            .as_ref()
            .ok_or_else(|| crate::PropertyError::NoConverter {
                property: self.name.clone(),
            })?;
        converter(text).map_err(|message| crate::PropertyError::invalid_value(&self.name, message))
    }

    pub(crate) fn values_equal(&self, a: &PropertyValue, b: &PropertyValue) -> bool {
        (self.equality)(a, b)
    }

    pub(crate) fn apply_coercion(&self, raw: PropertyValue, values: &NodeValues<'_>) -> PropertyValue {
        match &self.coerce {
            Some(coerce) => coerce(raw, values),
            None => raw,
        }
    }

    pub(crate) fn notify_changed(&self, change: &ErasedChange<'_>) {
        if let Some(callback) = &self.on_changed {
            callback(change);
        }
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("css_name", &self.css_name)
            .field("default", &self.default)
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities)
            .field("affects_layout", &self.affects_layout)
            .field("native", &self.native)
            .finish()
    }
}
