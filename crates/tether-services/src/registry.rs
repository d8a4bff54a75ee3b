//! Service registry — one control block per service handle.
//!
//! An explicit owned container, not a process-wide table: each bridge owns
//! its own registry so independent instances never share state.

use std::collections::HashMap;
use std::sync::Arc;

use tether_core::ServiceHandle;

use crate::backend::{IdentityLookup, ObjectBus};
use crate::scb::ServiceControlBlock;

pub struct ServiceRegistry<R> {
    blocks: HashMap<ServiceHandle, ServiceControlBlock<R>>,
    bus: Arc<dyn ObjectBus>,
    interface: String,
}

impl<R> ServiceRegistry<R> {
    pub fn new(bus: Arc<dyn ObjectBus>, interface: impl Into<String>) -> Self {
        Self {
            blocks: HashMap::new(),
            bus,
            interface: interface.into(),
        }
    }

    /// Return the block for `handle`, creating and registering it if needed.
    ///
    /// `None` means the service is undeliverable: no identity, an unusable
    /// naming key, or the bus refused the object. Nothing is inserted then.
    pub fn get_or_create<I: IdentityLookup + ?Sized>(
        &mut self,
        handle: ServiceHandle,
        identities: &I,
    ) -> Option<&mut ServiceControlBlock<R>> {
        if !self.blocks.contains_key(&handle) {
            let block = self.build(handle, identities)?;
            self.blocks.insert(handle, block);
        }
        self.blocks.get_mut(&handle)
    }

    pub fn get(&self, handle: ServiceHandle) -> Option<&ServiceControlBlock<R>> {
        self.blocks.get(&handle)
    }

    pub fn contains(&self, handle: ServiceHandle) -> bool {
        self.blocks.contains_key(&handle)
    }

    /// Deregister and discard the block. No-op if absent.
    pub fn remove(&mut self, handle: ServiceHandle) -> Option<ServiceControlBlock<R>> {
        let block = self.blocks.remove(&handle)?;
        self.bus.unregister(block.naming_key(), &self.interface);
        tracing::debug!(%handle, key = block.naming_key(), "service object removed");
        Some(block)
    }

    /// Deregister every block, handing each to `visitor`. Used at shutdown.
    pub fn for_each_removed(&mut self, mut visitor: impl FnMut(ServiceControlBlock<R>)) {
        let handles: Vec<ServiceHandle> = self.blocks.keys().copied().collect();
        for handle in handles {
            if let Some(block) = self.remove(handle) {
                visitor(block);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    fn build<I: IdentityLookup + ?Sized>(
        &self,
        handle: ServiceHandle,
        identities: &I,
    ) -> Option<ServiceControlBlock<R>> {
        let Some(identity) = identities.identity(handle) else {
            tracing::warn!(%handle, "no identity for service, dropping");
            return None;
        };
        let Some(key) = identity.naming_key() else {
            tracing::warn!(
                %handle,
                device = %identity.device_path,
                remote_uuid = %identity.remote_uuid,
                "incomplete identity for service, dropping"
            );
            return None;
        };
        if let Err(e) = self.bus.register(&key, &self.interface) {
            tracing::error!(%handle, key = %key, error = %e, "unable to register service interface");
            return None;
        }
        tracing::debug!(%handle, key = %key, "service object registered");
        Some(ServiceControlBlock::new(handle, key))
    }
}
