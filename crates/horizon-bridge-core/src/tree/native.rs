//! Native view synchronisation.
//!
//! Each node may own a [`NativeView`], the platform adapter that renders it.
//! Resolved value changes of descriptors with a [`NativeSync`] mode are pushed
//! to the view immediately, unless native updates for the node are suspended:
//! then the push is parked in a pending map keyed by property (last write
//! wins) and flushed once when the suspend counter returns to zero.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use super::{NodeData, NodeId, ViewTree};
use crate::error::{Result, TreeError};
use crate::logging::targets;
use crate::property::slot::PropertySlot;
use crate::property::{NativeSync, PropertyId, PropertyInfo, PropertyValue, ValueSource};

/// Platform adapter receiving resolved property values.
///
/// # Example
///
/// ```
/// use horizon_bridge_core::property::PropertyValue;
/// use horizon_bridge_core::NativeView;
///
/// #[derive(Default)]
/// struct TextField {
///     text_color: Option<String>,
/// }
///
/// impl NativeView for TextField {
///     fn set_native(&mut self, property: &str, value: &PropertyValue) {
///         if property == "color" {
///             self.text_color = value.downcast_ref::<String>().cloned();
///         }
///     }
///
///     fn native_default(&mut self, property: &str) -> Option<PropertyValue> {
///         (property == "color").then(|| PropertyValue::new(String::from("system-text")))
///     }
/// }
/// ```
pub trait NativeView {
    /// Apply a resolved value to the platform widget.
    fn set_native(&mut self, property: &str, value: &PropertyValue);

    /// The widget's own value for `property`, captured before the first push
    /// by descriptors using [`NativeSync::SyncCaptureDefault`].
    fn native_default(&mut self, property: &str) -> Option<PropertyValue> {
        let _ = property;
        None
    }
}

/// Per-node native state.
#[derive(Default)]
pub(super) struct NativeState {
    view: Option<Box<dyn NativeView>>,
    suspended: u32,
    pending: BTreeMap<PropertyId, (ValueSource, PropertyValue)>,
}

impl fmt::Debug for NativeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeState")
            .field("has_view", &self.view.is_some())
            .field("suspended", &self.suspended)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Push one value to the view, capturing the native default on first use.
fn push_native(
    view: &mut dyn NativeView,
    slot: Option<&mut PropertySlot>,
    info: &PropertyInfo,
    source: ValueSource,
    value: &PropertyValue,
) {
    if let Some(slot) = slot {
        if info.native_sync() == NativeSync::SyncCaptureDefault && !slot.native_captured() {
            let captured = view.native_default(info.name());
            tracing::trace!(target: targets::NATIVE, property = info.name(), ?captured, "captured native default");
            slot.capture_native_default(captured);
        }
        if source == ValueSource::Default {
            if let Some(native_default) = slot.native_default() {
                view.set_native(info.name(), native_default);
                return;
            }
        }
    }
    view.set_native(info.name(), value);
}

impl ViewTree {
    /// Route a resolved value change to the node's native view.
    pub(super) fn sync_native(
        &mut self,
        node: NodeId,
        info: &PropertyInfo,
        source: ValueSource,
        value: PropertyValue,
    ) -> Result<()> {
        if info.native_sync() == NativeSync::None {
            return Ok(());
        }
        let NodeData {
            native, properties, ..
        } = self.node_mut(node)?;
        let Some(view) = native.view.as_deref_mut() else {
            return Ok(());
        };

        if native.suspended > 0 {
            native.pending.insert(info.id(), (source, value));
            return Ok(());
        }
        push_native(view, properties.get_mut(&info.id()), info, source, &value);
        Ok(())
    }

    /// Install the platform view for a node, returning the previous one.
    ///
    /// Every property not at its default is pushed to the new view in one
    /// batch. Native defaults are captured afresh from the new view.
    #[tracing::instrument(skip(self, view), target = "horizon_bridge_core::native", level = "trace")]
    pub fn set_native_view(
        &mut self,
        node: NodeId,
        view: Box<dyn NativeView>,
    ) -> Result<Option<Box<dyn NativeView>>> {
        let registry = std::sync::Arc::clone(&self.registry);
        let data = self.node_mut(node)?;
        let previous = data.native.view.replace(view);
        data.native.pending.clear();

        let mut queued = BTreeMap::new();
        for (&id, slot) in data.properties.iter_mut() {
            slot.reset_native_capture();
            let info = registry.info(id)?;
            if info.native_sync() != NativeSync::None && slot.source() > ValueSource::Default {
                queued.insert(id, (slot.source(), slot.value().clone()));
            }
        }
        tracing::debug!(target: targets::NATIVE, ?node, properties = queued.len(), "installed native view");

        let mut batch = self.batch(node)?;
        let data = batch.node_mut(node)?;
        data.native.pending.extend(queued);
        drop(batch);
        Ok(previous)
    }

    /// Remove the node's platform view. Pending pushes are discarded.
    pub fn take_native_view(&mut self, node: NodeId) -> Result<Option<Box<dyn NativeView>>> {
        let data = self.node_mut(node)?;
        data.native.pending.clear();
        for slot in data.properties.values_mut() {
            slot.reset_native_capture();
        }
        Ok(data.native.view.take())
    }

    /// Check whether a platform view is installed on the node.
    pub fn has_native_view(&self, node: NodeId) -> Result<bool> {
        Ok(self.node(node)?.native.view.is_some())
    }

    /// Defer native pushes for the node until a matching resume.
    ///
    /// Calls nest; values still resolve and callbacks still fire immediately.
    pub fn suspend_native_updates(&mut self, node: NodeId) -> Result<()> {
        let native = &mut self.node_mut(node)?.native;
        native.suspended += 1;
        tracing::trace!(target: targets::NATIVE, ?node, depth = native.suspended, "suspended native updates");
        Ok(())
    }

    /// Undo one suspend. The outermost resume flushes every pending push.
    pub fn resume_native_updates(&mut self, node: NodeId) -> Result<()> {
        let registry = std::sync::Arc::clone(&self.registry);
        let NodeData {
            native, properties, ..
        } = self.node_mut(node)?;

        if native.suspended == 0 {
            return Err(TreeError::UnbalancedResume.into());
        }
        native.suspended -= 1;
        if native.suspended > 0 {
            return Ok(());
        }

        let pending = std::mem::take(&mut native.pending);
        let Some(view) = native.view.as_deref_mut() else {
            return Ok(());
        };
        tracing::trace!(target: targets::NATIVE, ?node, count = pending.len(), "flushing native updates");
        for (id, (source, value)) in pending {
            let info = registry.info(id)?;
            push_native(view, properties.get_mut(&id), info, source, &value);
        }
        Ok(())
    }

    /// Check whether native pushes for the node are currently deferred.
    pub fn native_updates_suspended(&self, node: NodeId) -> Result<bool> {
        Ok(self.node(node)?.native.suspended > 0)
    }

    /// Suspend native updates for the node until the guard is dropped.
    ///
    /// The guard dereferences to the tree, so writes go through it:
    ///
    /// ```
    /// # use horizon_bridge_core::property::{OwnerType, PropertyDescriptor, PropertyRegistry};
    /// # use horizon_bridge_core::ViewTree;
    /// # let mut registry = PropertyRegistry::new();
    /// # let width = registry.register(OwnerType("View"), PropertyDescriptor::new("width", 0.0f32).native()).unwrap();
    /// # let mut tree = ViewTree::new(registry);
    /// # let node = tree.create_node("View");
    /// {
    ///     let mut batch = tree.batch(node).unwrap();
    ///     batch.set(node, width, 10.0).unwrap();
    ///     batch.set(node, width, 20.0).unwrap();
    /// } // one push of 20.0 happens here
    /// assert!(!tree.native_updates_suspended(node).unwrap());
    /// ```
    pub fn batch(&mut self, node: NodeId) -> Result<BatchGuard<'_>> {
        self.suspend_native_updates(node)?;
        Ok(BatchGuard { tree: self, node })
    }

    /// Suspend every listed node, skipping ones that no longer exist.
    pub(super) fn suspend_all(&mut self, nodes: &[NodeId]) {
        for &node in nodes {
            if let Some(data) = self.nodes.get_mut(node) {
                data.native.suspended += 1;
            }
        }
    }

    /// Resume every listed node. Reports the first failure after trying all.
    pub(super) fn resume_all(&mut self, nodes: &[NodeId]) -> Result<()> {
        let mut first_error = None;
        for &node in nodes {
            if let Err(err) = self.resume_native_updates(node) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// RAII guard returned by [`ViewTree::batch`].
///
/// Native updates for the node resume when the guard is dropped.
pub struct BatchGuard<'a> {
    tree: &'a mut ViewTree,
    node: NodeId,
}

impl BatchGuard<'_> {
    /// The node whose updates are batched.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Deref for BatchGuard<'_> {
    type Target = ViewTree;

    fn deref(&self) -> &ViewTree {
        self.tree
    }
}

impl DerefMut for BatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut ViewTree {
        self.tree
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.tree.resume_native_updates(self.node) {
            tracing::warn!(target: targets::NATIVE, node = ?self.node, %err, "failed to resume native updates");
        }
    }
}

impl fmt::Debug for BatchGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchGuard").field("node", &self.node).finish()
    }
}
