//! tether-services — the service bridge.
//!
//! Tracks one control block per bound service, answers `Connect` and
//! `Disconnect` requests exactly once, and announces state-label changes to
//! the bus. [`ServiceBridge`] is the single-threaded core; [`host`] wraps it
//! in a tokio task for concurrent callers.

pub mod backend;
pub mod bridge;
pub mod emitter;
pub mod host;
pub mod registry;
pub mod scb;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use backend::{
    IdentityLookup, LifecycleActions, ObjectBus, Reply, ServiceBackend, ServicePolicy,
    StatusCallback, StatusSource, SubscriptionId,
};
pub use bridge::ServiceBridge;
pub use emitter::NotificationEmitter;
pub use host::{BridgeClient, BridgeHost, PendingRequest};
pub use registry::ServiceRegistry;
pub use scb::{RequestKind, ServiceControlBlock};
