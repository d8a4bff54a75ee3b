//! Notification emitter — announces state-label changes on the bus.

use std::sync::Arc;

use tether_core::attribute::names;
use tether_core::StateLabel;

use crate::backend::ObjectBus;

/// Sends exactly one `State` change signal per call. Change detection is the
/// caller's job; there is no batching or coalescing here.
pub struct NotificationEmitter {
    bus: Arc<dyn ObjectBus>,
    interface: String,
}

impl NotificationEmitter {
    pub fn new(bus: Arc<dyn ObjectBus>, interface: impl Into<String>) -> Self {
        Self {
            bus,
            interface: interface.into(),
        }
    }

    pub fn announce(&self, key: &str, label: StateLabel) {
        tracing::debug!(key, state = %label, "state changed");
        self.bus
            .property_changed(key, &self.interface, names::STATE, label.into());
    }
}
