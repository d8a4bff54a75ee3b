//! Collaborator contracts.
//!
//! The bridge never establishes links, names objects or moves bytes on the
//! bus itself. It talks to the service subsystem through the traits below
//! and to the bus through [`ObjectBus`]. Intentionally narrow: everything is
//! read on demand, nothing is cached on this side.

use tether_core::{
    ActionError, AttributeValue, BusError, RequestError, ServiceHandle, ServiceIdentity,
    ServiceStatus, StatusFlags,
};

/// Opaque id returned by [`StatusSource::subscribe`].
pub type SubscriptionId = u64;

/// Status-change callback: `(handle, old_status, new_status)`.
pub type StatusCallback = Box<dyn Fn(ServiceHandle, ServiceStatus, ServiceStatus) + Send + Sync>;

/// Current status of a service plus change subscriptions.
pub trait StatusSource {
    fn status(&self, handle: ServiceHandle) -> ServiceStatus;

    /// The lifecycle collaborator is retrying on its own.
    fn is_reconnecting(&self, handle: ServiceHandle) -> bool;

    /// Error code stored by the last failed attempt. 0 = none.
    fn error_code(&self, handle: ServiceHandle) -> i32;

    fn subscribe(&self, callback: StatusCallback) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    fn flags(&self, handle: ServiceHandle) -> StatusFlags {
        StatusFlags {
            reconnecting: self.is_reconnecting(handle),
            error_code: self.error_code(handle),
        }
    }
}

/// Connect/disconnect actions.
///
/// `Ok` means the action is now in flight; completion arrives later through
/// the status callback. `Err` is a synchronous rejection.
pub trait LifecycleActions {
    fn begin_connect(&self, handle: ServiceHandle) -> Result<(), ActionError>;

    fn begin_disconnect(&self, handle: ServiceHandle) -> Result<(), ActionError>;
}

pub trait IdentityLookup {
    /// `None` when the handle no longer resolves to a peer/profile pair.
    fn identity(&self, handle: ServiceHandle) -> Option<ServiceIdentity>;
}

/// Read/write policy flags owned by the service subsystem.
pub trait ServicePolicy {
    fn auto_connect(&self, handle: ServiceHandle) -> bool;

    fn set_auto_connect(&self, handle: ServiceHandle, enabled: bool);

    fn blocked(&self, handle: ServiceHandle) -> bool;

    fn set_blocked(&self, handle: ServiceHandle, blocked: bool);
}

/// Everything the bridge needs from the service subsystem.
pub trait ServiceBackend:
    StatusSource + LifecycleActions + IdentityLookup + ServicePolicy + Send + Sync
{
}

impl<T> ServiceBackend for T where
    T: StatusSource + LifecycleActions + IdentityLookup + ServicePolicy + Send + Sync
{
}

/// Object registration and change signals on the message bus.
pub trait ObjectBus: Send + Sync {
    fn register(&self, key: &str, interface: &str) -> Result<(), BusError>;

    fn unregister(&self, key: &str, interface: &str);

    /// Fire-and-forget; delivery failures stay inside the bus.
    fn property_changed(&self, key: &str, interface: &str, name: &str, value: AttributeValue);
}

/// A request token that can be answered exactly once.
///
/// `complete` consumes the token, so a second reply cannot be expressed.
/// Dropping a token without completing it abandons the request.
pub trait Reply {
    fn complete(self, outcome: Result<(), RequestError>);
}

impl Reply for tokio::sync::oneshot::Sender<Result<(), RequestError>> {
    fn complete(self, outcome: Result<(), RequestError>) {
        // The requester may have gone away; nobody left to tell.
        let _ = self.send(outcome);
    }
}
