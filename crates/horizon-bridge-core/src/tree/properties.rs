//! Property access and value resolution on [`ViewTree`] nodes.
//!
//! Every write lands in one tier of a node's [`PropertySlot`]. The slot is
//! then re-resolved: the highest populated tier wins, its raw value is
//! coerced, and if the result differs from the previous resolved value the
//! change callback fires, layout is requested, the native view is synced and
//! inheritable values flow to the children.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{NodeId, NodeValues, ViewTree};
use crate::error::{PropertyError, Result};
use crate::logging::targets;
use crate::property::slot::PropertySlot;
use crate::property::{
    ErasedChange, Property, PropertyId, PropertyInfo, PropertyType, PropertyValue, Shorthand,
    ValueSource,
};

impl ViewTree {
    // =========================================================================
    // Reads
    // =========================================================================

    /// The resolved value of a property on a node.
    pub fn get<T: PropertyType>(&self, node: NodeId, property: Property<T>) -> Result<T> {
        let value = self.value(node, property.id())?;
        value.downcast_ref::<T>().cloned().ok_or_else(|| {
            let name = self
                .registry
                .info(property.id())
                .map(|info| info.name().to_string())
                .unwrap_or_default();
            PropertyError::TypeMismatch {
                property: name,
                expected: std::any::type_name::<T>(),
                got: value.type_name(),
            }
            .into()
        })
    }

    /// The resolved value of a property, type-erased.
    pub fn value(&self, node: NodeId, property: PropertyId) -> Result<PropertyValue> {
        let info = self.registry.info(property)?;
        Ok(self
            .node(node)?
            .properties
            .get(&property)
            .map(|slot| slot.value().clone())
            .unwrap_or_else(|| info.default_value().clone()))
    }

    /// Where the resolved value of a property currently comes from.
    pub fn value_source(
        &self,
        node: NodeId,
        property: impl Into<PropertyId>,
    ) -> Result<ValueSource> {
        let property = property.into();
        self.registry.info(property)?;
        Ok(self
            .node(node)?
            .properties
            .get(&property)
            .map(PropertySlot::source)
            .unwrap_or_default())
    }

    /// The raw value stored at one tier, before coercion.
    pub fn layer_value(
        &self,
        node: NodeId,
        property: impl Into<PropertyId>,
        tier: ValueSource,
    ) -> Result<Option<PropertyValue>> {
        let property = property.into();
        Ok(self
            .node(node)?
            .properties
            .get(&property)
            .and_then(|slot| slot.layer(tier).cloned()))
    }

    /// Ids of every property with stored state on the node, in id order.
    pub fn property_ids(&self, node: NodeId) -> Result<Vec<PropertyId>> {
        Ok(self.node(node)?.properties.keys().copied().collect())
    }

    // =========================================================================
    // Typed writes
    // =========================================================================

    /// Assign a local value.
    pub fn set<T: PropertyType>(&mut self, node: NodeId, property: Property<T>, value: T) -> Result<()> {
        self.set_at(node, property, ValueSource::Local, value)
    }

    /// Remove the local value, falling back to the next populated tier.
    pub fn unset<T: PropertyType>(&mut self, node: NodeId, property: Property<T>) -> Result<()> {
        self.clear_value(node, property.id(), ValueSource::Local)
    }

    /// Write the stylesheet tier.
    pub fn set_css<T: PropertyType>(&mut self, node: NodeId, property: Property<T>, value: T) -> Result<()> {
        self.set_at(node, property, ValueSource::Css, value)
    }

    /// Clear the stylesheet tier.
    pub fn clear_css<T: PropertyType>(&mut self, node: NodeId, property: Property<T>) -> Result<()> {
        self.clear_value(node, property.id(), ValueSource::Css)
    }

    /// Write the animation tier. The property must be animatable.
    pub fn set_keyframe<T: PropertyType>(
        &mut self,
        node: NodeId,
        property: Property<T>,
        value: T,
    ) -> Result<()> {
        self.set_at(node, property, ValueSource::Keyframe, value)
    }

    /// Clear the animation tier.
    pub fn clear_keyframe<T: PropertyType>(&mut self, node: NodeId, property: Property<T>) -> Result<()> {
        self.clear_value(node, property.id(), ValueSource::Keyframe)
    }

    /// Write `value` at an explicit tier.
    pub fn set_at<T: PropertyType>(
        &mut self,
        node: NodeId,
        property: Property<T>,
        tier: ValueSource,
        value: T,
    ) -> Result<()> {
        self.set_value(node, property.id(), tier, PropertyValue::new(value))
    }

    // =========================================================================
    // Erased writes
    // =========================================================================

    /// Write a type-erased value at `tier`.
    ///
    /// The value's type must match the descriptor's and the descriptor must
    /// accept `tier`.
    pub fn set_value(
        &mut self,
        node: NodeId,
        property: PropertyId,
        tier: ValueSource,
        value: PropertyValue,
    ) -> Result<()> {
        self.write_layer(node, property, tier, Some(value))
    }

    /// Clear the value stored at `tier`.
    pub fn clear_value(&mut self, node: NodeId, property: PropertyId, tier: ValueSource) -> Result<()> {
        self.write_layer(node, property, tier, None)
    }

    /// Convert `text` with the descriptor's converter and write it at `tier`.
    pub fn set_text(
        &mut self,
        node: NodeId,
        property: PropertyId,
        tier: ValueSource,
        text: &str,
    ) -> Result<()> {
        let value = self.registry.info(property)?.convert(text)?;
        self.set_value(node, property, tier, value)
    }

    /// Re-run the descriptor's coercion against the stored raw value.
    ///
    /// Call this when a value the coercion callback reads has changed.
    pub fn coerce(&mut self, node: NodeId, property: impl Into<PropertyId>) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let info = registry.info(property.into())?;
        self.resolve(node, info)
    }

    // =========================================================================
    // Shorthands
    // =========================================================================

    /// Expand a shorthand value and write every longhand at `tier`.
    ///
    /// Native pushes for the node are batched across the expansion.
    pub fn set_shorthand<T: PropertyType>(
        &mut self,
        node: NodeId,
        shorthand: Shorthand<T>,
        tier: ValueSource,
        value: T,
    ) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let assignments = registry
            .shorthand_info(shorthand.id())?
            .expand(&PropertyValue::new(value))?;

        let mut batch = self.batch(node)?;
        for assignment in assignments {
            batch.set_value(node, assignment.property, tier, assignment.value)?;
        }
        Ok(())
    }

    /// Clear every longhand of a shorthand at `tier`.
    pub fn clear_shorthand<T: PropertyType>(
        &mut self,
        node: NodeId,
        shorthand: Shorthand<T>,
        tier: ValueSource,
    ) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let info = registry.shorthand_info(shorthand.id())?;

        let mut batch = self.batch(node)?;
        for &longhand in info.longhands() {
            batch.clear_value(node, longhand, tier)?;
        }
        Ok(())
    }

    /// Compose a shorthand value from the node's current longhand values.
    pub fn get_shorthand<T: PropertyType>(&self, node: NodeId, shorthand: Shorthand<T>) -> Result<T> {
        self.node(node)?;
        let info = self.registry.shorthand_info(shorthand.id())?;
        let value = info.compose(&NodeValues::new(self, node));
        value.downcast_ref::<T>().cloned().ok_or_else(|| {
            PropertyError::TypeMismatch {
                property: info.name().to_string(),
                expected: std::any::type_name::<T>(),
                got: value.type_name(),
            }
            .into()
        })
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn write_layer(
        &mut self,
        node: NodeId,
        property: PropertyId,
        tier: ValueSource,
        value: Option<PropertyValue>,
    ) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let info = registry.info(property)?;

        if !info.capabilities().allows(tier) {
            return Err(PropertyError::UnsupportedSource {
                property: info.name().to_string(),
                tier,
            }
            .into());
        }
        if let Some(value) = &value {
            if !info.accepts(value) {
                return Err(PropertyError::TypeMismatch {
                    property: info.name().to_string(),
                    expected: info.type_name(),
                    got: value.type_name(),
                }
                .into());
            }
        }

        if !self.store_layer(node, info, tier, value)? {
            return Ok(());
        }
        self.resolve(node, info)
    }

    /// Store a raw value without resolving. Returns `false` when there was
    /// nothing to clear.
    fn store_layer(
        &mut self,
        node: NodeId,
        info: &PropertyInfo,
        tier: ValueSource,
        value: Option<PropertyValue>,
    ) -> Result<bool> {
        let data = self.node_mut(node)?;
        match data.properties.get_mut(&info.id()) {
            Some(slot) => {
                slot.set_layer(tier, value);
                Ok(true)
            }
            None if value.is_some() => {
                let mut slot = PropertySlot::new(info.default_value().clone());
                slot.set_layer(tier, value);
                data.properties.insert(info.id(), slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Recompute a slot's resolved value and run every side effect of a change.
    fn resolve(&mut self, node: NodeId, info: &PropertyInfo) -> Result<()> {
        let id = info.id();
        let (source, raw) = match self.node(node)?.properties.get(&id) {
            Some(slot) => {
                let (source, raw) = slot.highest();
                (source, raw.cloned())
            }
            None => return Ok(()),
        };

        let resolved = match raw {
            Some(raw) => info.apply_coercion(raw, &NodeValues::new(self, node)),
            None => info.default_value().clone(),
        };

        let data = self.node_mut(node)?;
        let Some(slot) = data.properties.get_mut(&id) else {
            return Ok(());
        };
        let old_value = slot.value().clone();
        let old_form = slot.inherited_form().cloned();
        let changed = !info.values_equal(&old_value, &resolved);
        slot.set_resolved(source, changed.then(|| resolved.clone()));
        let new_form = slot.inherited_form().cloned();

        if changed {
            tracing::trace!(
                target: targets::PROPERTY,
                ?node,
                property = info.name(),
                %source,
                old = ?old_value,
                new = ?resolved,
                "resolved value changed"
            );
            info.notify_changed(&ErasedChange {
                node,
                property: id,
                old: &old_value,
                new: &resolved,
                source,
            });
            if info.affects_layout() {
                self.request_layout(node);
            }
            self.sync_native(node, info, source, resolved)?;
        }

        let form_changed = match (&old_form, &new_form) {
            (None, None) => false,
            (Some(a), Some(b)) => !info.values_equal(a, b),
            _ => true,
        };
        if info.capabilities().inheritable && form_changed {
            self.propagate_inherited(node, info, new_form)?;
        }
        Ok(())
    }

    /// Hand a node's inheritable form to each child's inherited tier.
    fn propagate_inherited(
        &mut self,
        node: NodeId,
        info: &PropertyInfo,
        form: Option<PropertyValue>,
    ) -> Result<()> {
        let children = self.node(node)?.children.clone();
        tracing::trace!(
            target: targets::PROPERTY,
            ?node,
            property = info.name(),
            children = children.len(),
            "propagating inherited value"
        );
        for child in children {
            self.store_inherited(child, info, form.clone())?;
        }
        Ok(())
    }

    /// Store the inherited tier (whatever tier is active) and re-resolve.
    fn store_inherited(
        &mut self,
        node: NodeId,
        info: &PropertyInfo,
        form: Option<PropertyValue>,
    ) -> Result<()> {
        if self.store_layer(node, info, ValueSource::Inherited, form)? {
            self.resolve(node, info)?;
        }
        Ok(())
    }

    /// Copy every inheritable value from the node's parent.
    pub(super) fn inherit_from_parent(&mut self, child: NodeId) -> Result<()> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        let registry = Arc::clone(&self.registry);
        let ids: BTreeSet<PropertyId> = self
            .node(parent)?
            .properties
            .keys()
            .chain(self.node(child)?.properties.keys())
            .copied()
            .collect();

        for id in ids {
            let info = registry.info(id)?;
            if !info.capabilities().inheritable {
                continue;
            }
            let form = self
                .node(parent)?
                .properties
                .get(&id)
                .and_then(|slot| slot.inherited_form().cloned());
            self.store_inherited(child, info, form)?;
        }
        Ok(())
    }

    /// Drop every inherited value from a node that lost its parent.
    pub(super) fn clear_inherited(&mut self, node: NodeId) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        for id in self.property_ids(node)? {
            let info = registry.info(id)?;
            if info.capabilities().inheritable {
                self.store_inherited(node, info, None)?;
            }
        }
        Ok(())
    }
}
