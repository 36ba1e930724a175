//! Named event slots.
//!
//! A slot is a single mutable named record (`value` + `error`) that
//! unrelated components can observe without shared wiring: the transport
//! raises the `"loading"` slot while a request is in flight, a spinner
//! component reads the same slot by name. The registry is owned by the
//! application context rather than being process-global.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the slot the transport raises while a request is in flight.
pub const LOADING_SLOT: &str = "loading";

#[derive(Debug, Default)]
struct SlotRecord {
    value: Option<Value>,
    error: Option<String>,
}

/// A single named mutable slot.
///
/// Setting `value` or `error` replaces the whole record (value and error
/// never coexist); the slot name is preserved.
#[derive(Debug)]
pub struct EventSlot {
    name: String,
    record: RwLock<SlotRecord>,
}

impl EventSlot {
    fn new(name: &str, initial: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            record: RwLock::new(SlotRecord {
                value: initial,
                error: None,
            }),
        }
    }

    /// Slot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn value(&self) -> Option<Value> {
        self.record.read().value.clone()
    }

    /// Replaces the record with the given value.
    pub fn set_value(&self, value: Value) {
        *self.record.write() = SlotRecord {
            value: Some(value),
            error: None,
        };
    }

    /// Current error.
    pub fn error(&self) -> Option<String> {
        self.record.read().error.clone()
    }

    /// Replaces the record with the given error.
    pub fn set_error(&self, error: impl Into<String>) {
        *self.record.write() = SlotRecord {
            value: None,
            error: Some(error.into()),
        };
    }

    /// True when the current value equals `value`.
    pub fn is(&self, value: &Value) -> bool {
        self.record.read().value.as_ref() == Some(value)
    }

    /// Resets value and error.
    pub fn clear(&self) {
        *self.record.write() = SlotRecord::default();
    }
}

/// Keyed registry handing out one [`EventSlot`] per name.
#[derive(Debug, Default)]
pub struct EventSlots {
    slots: RwLock<HashMap<String, Arc<EventSlot>>>,
}

impl EventSlots {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves (or creates) the slot named `name`.
    ///
    /// Idempotent: repeated calls with the same name return the identical
    /// handle.
    pub fn slot(&self, name: &str) -> Arc<EventSlot> {
        self.slot_inner(name, None)
    }

    /// Like [`EventSlots::slot`], seeding an initial value when the slot
    /// does not exist yet.
    pub fn slot_with(&self, name: &str, initial: Value) -> Arc<EventSlot> {
        self.slot_inner(name, Some(initial))
    }

    fn slot_inner(&self, name: &str, initial: Option<Value>) -> Arc<EventSlot> {
        if let Some(slot) = self.slots.read().get(name) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(EventSlot::new(name, initial))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_name_same_handle() {
        let slots = EventSlots::new();
        let a = slots.slot("loading");
        let b = slots.slot("loading");
        assert!(Arc::ptr_eq(&a, &b));
        a.set_value(json!(true));
        assert!(b.is(&json!(true)));
    }

    #[test]
    fn initial_value_only_seeds_creation() {
        let slots = EventSlots::new();
        let a = slots.slot_with("loading", json!(false));
        assert!(a.is(&json!(false)));
        let b = slots.slot_with("loading", json!(true));
        assert!(b.is(&json!(false)));
    }

    #[test]
    fn value_and_error_replace_the_record() {
        let slots = EventSlots::new();
        let slot = slots.slot("loading");
        slot.set_value(json!(true));
        slot.set_error("boom");
        assert_eq!(slot.value(), None);
        assert_eq!(slot.error().as_deref(), Some("boom"));
        assert_eq!(slot.name(), "loading");

        slot.set_value(json!(false));
        assert_eq!(slot.error(), None);
        assert!(slot.is(&json!(false)));

        slot.clear();
        assert_eq!(slot.value(), None);
        assert_eq!(slot.error(), None);
    }
}
