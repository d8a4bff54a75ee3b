//! Service control block — per-service bridge state.

use tether_core::{ServiceHandle, StateLabel};

/// The two request kinds. Each has its own pending slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Connect,
    Disconnect,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }
}

/// State kept for one bound service.
///
/// Status, flags and identifiers are not stored here; they are read from the
/// service subsystem whenever needed. Both slots may be occupied at once,
/// but never by two requests of the same kind.
#[derive(Debug)]
pub struct ServiceControlBlock<R> {
    handle: ServiceHandle,
    naming_key: String,
    last_emitted: Option<StateLabel>,
    pending_connect: Option<R>,
    pending_disconnect: Option<R>,
}

impl<R> ServiceControlBlock<R> {
    pub fn new(handle: ServiceHandle, naming_key: String) -> Self {
        Self {
            handle,
            naming_key,
            last_emitted: None,
            pending_connect: None,
            pending_disconnect: None,
        }
    }

    pub fn handle(&self) -> ServiceHandle {
        self.handle
    }

    pub fn naming_key(&self) -> &str {
        &self.naming_key
    }

    /// Last label announced to observers. `None` before the first announcement.
    pub fn last_emitted(&self) -> Option<StateLabel> {
        self.last_emitted
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Occupy the slot for `kind`. Hands the token back if the slot is taken.
    pub fn park(&mut self, kind: RequestKind, token: R) -> Result<(), R> {
        let slot = self.slot_mut(kind);
        if slot.is_some() {
            return Err(token);
        }
        *slot = Some(token);
        Ok(())
    }

    /// Empty the slot for `kind`, returning the token if there was one.
    pub fn take(&mut self, kind: RequestKind) -> Option<R> {
        self.slot_mut(kind).take()
    }

    /// Store `label` as the last emitted one. Returns true if it changed.
    pub fn record_label(&mut self, label: StateLabel) -> bool {
        if self.last_emitted == Some(label) {
            return false;
        }
        self.last_emitted = Some(label);
        true
    }

    /// Consume the block, yielding whatever tokens were still parked.
    pub fn into_pending(self) -> (Option<R>, Option<R>) {
        (self.pending_connect, self.pending_disconnect)
    }

    fn slot(&self, kind: RequestKind) -> &Option<R> {
        match kind {
            RequestKind::Connect => &self.pending_connect,
            RequestKind::Disconnect => &self.pending_disconnect,
        }
    }

    fn slot_mut(&mut self, kind: RequestKind) -> &mut Option<R> {
        match kind {
            RequestKind::Connect => &mut self.pending_connect,
            RequestKind::Disconnect => &mut self.pending_disconnect,
        }
    }
}
