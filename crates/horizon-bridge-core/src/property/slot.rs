//! Per-node property storage.

use super::value::{PropertyValue, ValueSource};

/// One property's state on one node.
///
/// Raw values are kept per tier so coercion can be re-run and so clearing the
/// active tier can fall back to whatever lies below it. The resolved value is
/// always derived from the highest populated tier.
#[derive(Debug, Clone)]
pub(crate) struct PropertySlot {
    layers: [Option<PropertyValue>; 4],
    source: ValueSource,
    value: PropertyValue,
    native_default: Option<PropertyValue>,
    native_captured: bool,
}

impl PropertySlot {
    pub(crate) fn new(default: PropertyValue) -> Self {
        Self {
            layers: [None, None, None, None],
            source: ValueSource::Default,
            value: default,
            native_default: None,
            native_captured: false,
        }
    }

    /// The raw value stored at `tier`.
    pub(crate) fn layer(&self, tier: ValueSource) -> Option<&PropertyValue> {
        tier.layer_index().and_then(|i| self.layers[i].as_ref())
    }

    /// Store or clear the raw value at `tier`. Returns the previous value.
    pub(crate) fn set_layer(
        &mut self,
        tier: ValueSource,
        value: Option<PropertyValue>,
    ) -> Option<PropertyValue> {
        match tier.layer_index() {
            Some(i) => std::mem::replace(&mut self.layers[i], value),
            None => None,
        }
    }

    /// The highest populated tier and its raw value.
    pub(crate) fn highest(&self) -> (ValueSource, Option<&PropertyValue>) {
        ValueSource::STORED
            .iter()
            .rev()
            .find_map(|&tier| self.layer(tier).map(|value| (tier, Some(value))))
            .unwrap_or((ValueSource::Default, None))
    }

    pub(crate) fn source(&self) -> ValueSource {
        self.source
    }

    pub(crate) fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub(crate) fn set_resolved(&mut self, source: ValueSource, value: Option<PropertyValue>) {
        self.source = source;
        if let Some(value) = value {
            self.value = value;
        }
    }

    /// What children inherit from this slot: nothing while it is at default.
    pub(crate) fn inherited_form(&self) -> Option<&PropertyValue> {
        (self.source > ValueSource::Default).then_some(&self.value)
    }

    pub(crate) fn has_layers(&self) -> bool {
        self.layers.iter().any(Option::is_some)
    }

    pub(crate) fn native_default(&self) -> Option<&PropertyValue> {
        self.native_default.as_ref()
    }

    pub(crate) fn native_captured(&self) -> bool {
        self.native_captured
    }

    pub(crate) fn capture_native_default(&mut self, value: Option<PropertyValue>) {
        self.native_default = value;
        self.native_captured = true;
    }

    pub(crate) fn reset_native_capture(&mut self) {
        self.native_default = None;
        self.native_captured = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_is_default() {
        let slot = PropertySlot::new(PropertyValue::new(0i32));
        assert_eq!(slot.highest().0, ValueSource::Default);
        assert!(slot.inherited_form().is_none());
        assert!(!slot.has_layers());
    }

    #[test]
    fn highest_tier_wins_regardless_of_write_order() {
        let mut slot = PropertySlot::new(PropertyValue::new(0i32));
        slot.set_layer(ValueSource::Keyframe, Some(PropertyValue::new(4)));
        slot.set_layer(ValueSource::Css, Some(PropertyValue::new(2)));
        slot.set_layer(ValueSource::Local, Some(PropertyValue::new(3)));

        let (tier, value) = slot.highest();
        assert_eq!(tier, ValueSource::Keyframe);
        assert_eq!(value, Some(&PropertyValue::new(4)));

        slot.set_layer(ValueSource::Keyframe, None);
        assert_eq!(slot.highest().0, ValueSource::Local);
        slot.set_layer(ValueSource::Local, None);
        assert_eq!(slot.highest().0, ValueSource::Css);
    }

    #[test]
    fn default_tier_is_never_stored() {
        let mut slot = PropertySlot::new(PropertyValue::new(0i32));
        assert!(slot
            .set_layer(ValueSource::Default, Some(PropertyValue::new(1)))
            .is_none());
        assert!(slot.layer(ValueSource::Default).is_none());
        assert!(!slot.has_layers());
    }
}
