//! Request completion engine.
//!
//! Matches status-change notifications against pending `Connect` and
//! `Disconnect` requests, answers each request exactly once, and announces
//! label changes after any replies for the same transition have been sent.
//!
//! Single-threaded: every method runs to completion on the caller's thread
//! and there is no locking. A concurrent host must serialize access, see
//! [`crate::host`].

use std::sync::Arc;

use serde_json::Value;
use tether_core::{
    describe_error_code, AttributeValue, BridgeConfig, PropertyError, RequestError,
    ServiceHandle, ServiceProperties, ServiceStatus, StateLabel, StatusFlags, WritableAttribute,
};

use crate::backend::{ObjectBus, Reply, ServiceBackend, StatusCallback, SubscriptionId};
use crate::emitter::NotificationEmitter;
use crate::registry::ServiceRegistry;
use crate::scb::{RequestKind, ServiceControlBlock};

pub struct ServiceBridge<R> {
    backend: Arc<dyn ServiceBackend>,
    registry: ServiceRegistry<R>,
    emitter: NotificationEmitter,
    subscription: Option<SubscriptionId>,
}

impl<R: Reply> ServiceBridge<R> {
    pub fn new(
        backend: Arc<dyn ServiceBackend>,
        bus: Arc<dyn ObjectBus>,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            backend,
            registry: ServiceRegistry::new(bus.clone(), config.interface.clone()),
            emitter: NotificationEmitter::new(bus, config.interface.clone()),
            subscription: None,
        }
    }

    /// Subscribe to status changes. `callback` must route every event back
    /// into [`Self::on_notify`] on the bridge's thread of control.
    pub fn start(&mut self, callback: StatusCallback) {
        if self.subscription.is_some() {
            return;
        }
        let id = self.backend.subscribe(callback);
        tracing::debug!(subscription = id, "subscribed to service state changes");
        self.subscription = Some(id);
    }

    /// Unsubscribe and discard every control block.
    pub fn shutdown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.backend.unsubscribe(id);
        }
        self.registry.for_each_removed(abandon);
    }

    pub fn registry(&self) -> &ServiceRegistry<R> {
        &self.registry
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    /// Start a connect. `Ok` means the request is parked and `token` will be
    /// answered by a later notification. On `Err` the token has already been
    /// answered with the same error.
    pub fn connect(&mut self, handle: ServiceHandle, token: R) -> Result<(), RequestError> {
        self.begin(handle, RequestKind::Connect, token)
    }

    /// Start a disconnect. Same contract as [`Self::connect`].
    pub fn disconnect(&mut self, handle: ServiceHandle, token: R) -> Result<(), RequestError> {
        self.begin(handle, RequestKind::Disconnect, token)
    }

    fn begin(
        &mut self,
        handle: ServiceHandle,
        kind: RequestKind,
        token: R,
    ) -> Result<(), RequestError> {
        let backend = Arc::clone(&self.backend);
        let Some(scb) = self.registry.get_or_create(handle, &*backend) else {
            return reject(handle, kind, token, RequestError::UnknownService);
        };
        if scb.is_pending(kind) {
            return reject(handle, kind, token, RequestError::AlreadyInProgress);
        }

        let started = match kind {
            RequestKind::Connect => backend.begin_connect(handle),
            RequestKind::Disconnect => backend.begin_disconnect(handle),
        };
        if let Err(e) = started {
            return reject(handle, kind, token, e.into());
        }

        // Only parked once the action is known to be in flight.
        if let Err(token) = scb.park(kind, token) {
            return reject(handle, kind, token, RequestError::AlreadyInProgress);
        }
        tracing::debug!(%handle, request = kind.as_str(), "request accepted");
        Ok(())
    }

    // ── Notifications ─────────────────────────────────────────────────────────

    /// Entry point for every status change reported by the service subsystem.
    ///
    /// `flags` must be read when the transition is reported, not when it is
    /// processed: the subsystem may already have cleared the error code or
    /// started a retry by then.
    pub fn on_notify(
        &mut self,
        handle: ServiceHandle,
        new_status: ServiceStatus,
        flags: StatusFlags,
    ) {
        if new_status == ServiceStatus::Unavailable {
            if let Some(scb) = self.registry.remove(handle) {
                abandon(scb);
            }
            return;
        }

        let backend = Arc::clone(&self.backend);
        let Some(scb) = self.registry.get_or_create(handle, &*backend) else {
            tracing::debug!(%handle, status = ?new_status, "state change undeliverable");
            return;
        };

        match new_status {
            ServiceStatus::Connected => {
                if let Some(token) = scb.take(RequestKind::Connect) {
                    token.complete(Ok(()));
                }
            }
            ServiceStatus::Disconnected => {
                if let Some(token) = scb.take(RequestKind::Disconnect) {
                    token.complete(Ok(()));
                }
                // Still parked means the connect attempt itself failed.
                if let Some(token) = scb.take(RequestKind::Connect) {
                    tracing::debug!(%handle, code = flags.error_code, "connect attempt failed");
                    let message = describe_error_code(flags.error_code);
                    token.complete(Err(RequestError::Failed(message)));
                }
            }
            _ => {}
        }

        let label = StateLabel::derive(new_status, flags);
        if scb.record_label(label) {
            self.emitter.announce(scb.naming_key(), label);
        }
    }

    // ── Attributes ────────────────────────────────────────────────────────────

    /// Snapshot of every present attribute. Only exported services answer.
    pub fn properties(&self, handle: ServiceHandle) -> Result<ServiceProperties, PropertyError> {
        if !self.registry.contains(handle) {
            return Err(PropertyError::UnknownService);
        }
        let identity = self
            .backend
            .identity(handle)
            .ok_or(PropertyError::UnknownService)?;
        let status = self.backend.status(handle);

        Ok(ServiceProperties {
            state: StateLabel::derive(status, self.backend.flags(handle)),
            version: identity.reported_version(),
            remote_uuid: Some(identity.remote_uuid).filter(|u| !u.is_empty()),
            local_uuid: identity.local_uuid.filter(|u| !u.is_empty()),
            auto_connect: self.backend.auto_connect(handle),
            blocked: self.backend.blocked(handle),
        })
    }

    pub fn get_property(
        &self,
        handle: ServiceHandle,
        name: &str,
    ) -> Result<AttributeValue, PropertyError> {
        self.properties(handle)?
            .get(name)
            .ok_or(PropertyError::UnknownProperty)
    }

    /// Write a policy flag. The value is type-checked and handed straight to
    /// the service subsystem.
    pub fn set_property(
        &mut self,
        handle: ServiceHandle,
        name: &str,
        value: &Value,
    ) -> Result<(), PropertyError> {
        let attribute = WritableAttribute::parse(name)?;
        let enabled = attribute.coerce(value)?;
        if !self.registry.contains(handle) {
            return Err(PropertyError::UnknownService);
        }
        match attribute {
            WritableAttribute::AutoConnect => self.backend.set_auto_connect(handle, enabled),
            WritableAttribute::Blocked => self.backend.set_blocked(handle, enabled),
        }
        tracing::debug!(%handle, attribute = attribute.name(), enabled, "attribute written");
        Ok(())
    }
}

fn reject<R: Reply>(
    handle: ServiceHandle,
    kind: RequestKind,
    token: R,
    error: RequestError,
) -> Result<(), RequestError> {
    tracing::debug!(%handle, request = kind.as_str(), error = %error, "request rejected");
    token.complete(Err(error.clone()));
    Err(error)
}

/// Drop whatever is still parked on a discarded block. The service subsystem
/// does not reach "unavailable" while it owns a request, so this should not
/// happen; it is logged rather than answered with a made-up reply.
fn abandon<R>(scb: ServiceControlBlock<R>) {
    let handle = scb.handle();
    let key = scb.naming_key().to_string();
    let (connect, disconnect) = scb.into_pending();
    for (kind, token) in [
        (RequestKind::Connect, connect),
        (RequestKind::Disconnect, disconnect),
    ] {
        if token.is_some() {
            tracing::warn!(%handle, key = %key, request = kind.as_str(), "pending request abandoned");
        }
    }
}
