//! In-memory collaborators for unit and integration tests.
//!
//! [`FakeBackend`] plays the service subsystem, [`RecordingBus`] the message
//! bus, and [`RecordingToken`] a request token. Bus traffic and replies land
//! in one shared [`Journal`] so tests can assert their relative order.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tether_core::{
    ActionError, AttributeValue, BusError, RequestError, ServiceHandle, ServiceIdentity,
    ServiceStatus,
};

use crate::backend::{
    IdentityLookup, LifecycleActions, ObjectBus, Reply, ServicePolicy, StatusCallback,
    StatusSource, SubscriptionId,
};

// ── Journal ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Registered(String),
    Unregistered(String),
    Changed {
        key: String,
        name: String,
        value: AttributeValue,
    },
    Replied {
        token: String,
        outcome: Result<(), RequestError>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Entry>>>);

impl Journal {
    pub fn push(&self, entry: Entry) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.0.lock().unwrap().clone()
    }

    /// `(token, outcome)` for every reply, in order.
    pub fn replies(&self) -> Vec<(String, Result<(), RequestError>)> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Replied { token, outcome } => Some((token, outcome)),
                _ => None,
            })
            .collect()
    }

    /// `(key, label)` for every `State` change signal, in order.
    pub fn announcements(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Changed {
                    key,
                    name,
                    value: AttributeValue::Str(label),
                } if name == "State" => Some((key, label)),
                _ => None,
            })
            .collect()
    }
}

// ── Bus ───────────────────────────────────────────────────────────────────────

pub struct RecordingBus {
    journal: Journal,
    refuse: Mutex<HashSet<String>>,
}

impl RecordingBus {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            refuse: Mutex::new(HashSet::new()),
        }
    }

    /// Make registration of `key` fail from now on.
    pub fn fail_registration_for(&self, key: &str) {
        self.refuse.lock().unwrap().insert(key.to_string());
    }
}

impl ObjectBus for RecordingBus {
    fn register(&self, key: &str, _interface: &str) -> Result<(), BusError> {
        if self.refuse.lock().unwrap().contains(key) {
            return Err(BusError::RegistrationFailed {
                key: key.to_string(),
                reason: "object path already in use".to_string(),
            });
        }
        self.journal.push(Entry::Registered(key.to_string()));
        Ok(())
    }

    fn unregister(&self, key: &str, _interface: &str) {
        self.journal.push(Entry::Unregistered(key.to_string()));
    }

    fn property_changed(&self, key: &str, _interface: &str, name: &str, value: AttributeValue) {
        self.journal.push(Entry::Changed {
            key: key.to_string(),
            name: name.to_string(),
            value,
        });
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RecordingToken {
    name: String,
    journal: Journal,
}

impl RecordingToken {
    pub fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            journal,
        }
    }
}

impl Reply for RecordingToken {
    fn complete(self, outcome: Result<(), RequestError>) {
        self.journal.push(Entry::Replied {
            token: self.name,
            outcome,
        });
    }
}

// ── Service subsystem ─────────────────────────────────────────────────────────

/// Scripted state of one fake service.
#[derive(Debug, Clone)]
pub struct FakeService {
    pub status: ServiceStatus,
    pub reconnecting: bool,
    pub error_code: i32,
    pub identity: Option<ServiceIdentity>,
    pub auto_connect: bool,
    pub blocked: bool,
    pub connect_result: Result<(), ActionError>,
    pub disconnect_result: Result<(), ActionError>,
}

type SharedCallback = Arc<dyn Fn(ServiceHandle, ServiceStatus, ServiceStatus) + Send + Sync>;

#[derive(Default)]
pub struct FakeBackend {
    services: Mutex<HashMap<ServiceHandle, FakeService>>,
    subscribers: Mutex<HashMap<SubscriptionId, SharedCallback>>,
    next_subscription: AtomicU64,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a disconnected service with the given peer path and remote UUID.
    pub fn add_service(&self, handle: ServiceHandle, device_path: &str, remote_uuid: &str) {
        let service = FakeService {
            status: ServiceStatus::Disconnected,
            reconnecting: false,
            error_code: 0,
            identity: Some(ServiceIdentity {
                device_path: device_path.to_string(),
                remote_uuid: remote_uuid.to_string(),
                local_uuid: None,
                version: None,
            }),
            auto_connect: false,
            blocked: false,
            connect_result: Ok(()),
            disconnect_result: Ok(()),
        };
        self.services.lock().unwrap().insert(handle, service);
    }

    pub fn update(&self, handle: ServiceHandle, f: impl FnOnce(&mut FakeService)) {
        if let Some(service) = self.services.lock().unwrap().get_mut(&handle) {
            f(service);
        }
    }

    pub fn snapshot(&self, handle: ServiceHandle) -> FakeService {
        self.services.lock().unwrap()[&handle].clone()
    }

    /// Set the status without telling subscribers.
    pub fn set_status(&self, handle: ServiceHandle, status: ServiceStatus) {
        self.update(handle, |s| s.status = status);
    }

    /// Set the status and invoke every subscriber, like the real subsystem.
    pub fn transition(&self, handle: ServiceHandle, status: ServiceStatus) {
        let old = self.status(handle);
        self.set_status(handle, status);
        let callbacks: Vec<SharedCallback> =
            self.subscribers.lock().unwrap().values().cloned().collect();
        for callback in callbacks {
            callback(handle, old, status);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    fn read<T>(&self, handle: ServiceHandle, f: impl FnOnce(&FakeService) -> T) -> Option<T> {
        self.services.lock().unwrap().get(&handle).map(f)
    }
}

impl StatusSource for FakeBackend {
    fn status(&self, handle: ServiceHandle) -> ServiceStatus {
        self.read(handle, |s| s.status)
            .unwrap_or(ServiceStatus::Unavailable)
    }

    fn is_reconnecting(&self, handle: ServiceHandle) -> bool {
        self.read(handle, |s| s.reconnecting).unwrap_or(false)
    }

    fn error_code(&self, handle: ServiceHandle) -> i32 {
        self.read(handle, |s| s.error_code).unwrap_or(0)
    }

    fn subscribe(&self, callback: StatusCallback) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst) + 1;
        self.subscribers
            .lock()
            .unwrap()
            .insert(id, Arc::from(callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().unwrap().remove(&id);
    }
}

impl LifecycleActions for FakeBackend {
    fn begin_connect(&self, handle: ServiceHandle) -> Result<(), ActionError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.read(handle, |s| s.connect_result.clone())
            .unwrap_or(Err(ActionError::NotSupported))
    }

    fn begin_disconnect(&self, handle: ServiceHandle) -> Result<(), ActionError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.read(handle, |s| s.disconnect_result.clone())
            .unwrap_or(Err(ActionError::NotSupported))
    }
}

impl IdentityLookup for FakeBackend {
    fn identity(&self, handle: ServiceHandle) -> Option<ServiceIdentity> {
        self.read(handle, |s| s.identity.clone()).flatten()
    }
}

impl ServicePolicy for FakeBackend {
    fn auto_connect(&self, handle: ServiceHandle) -> bool {
        self.read(handle, |s| s.auto_connect).unwrap_or(false)
    }

    fn set_auto_connect(&self, handle: ServiceHandle, enabled: bool) {
        self.update(handle, |s| s.auto_connect = enabled);
    }

    fn blocked(&self, handle: ServiceHandle) -> bool {
        self.read(handle, |s| s.blocked).unwrap_or(false)
    }

    fn set_blocked(&self, handle: ServiceHandle, blocked: bool) {
        self.update(handle, |s| s.blocked = blocked);
    }
}
