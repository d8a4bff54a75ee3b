//! Service status codes and the reportable state machine.
//!
//! The service subsystem reports a raw five-valued status. Observers never
//! see that value directly; they see a [`StateLabel`] derived from the status
//! plus two auxiliary conditions (reconnecting, stored error code). The
//! derivation is a pure function and is recomputed on every notification.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Raw status ────────────────────────────────────────────────────────────────

/// Lifecycle status as reported by the service subsystem.
///
/// Codes 0..=4 are the known states. Anything else is carried through as
/// `Unrecognized` so a newer subsystem can never make the bridge fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Unavailable,
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Unrecognized(u8),
}

impl From<u8> for ServiceStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Unavailable,
            1 => Self::Disconnected,
            2 => Self::Connecting,
            3 => Self::Connected,
            4 => Self::Disconnecting,
            other => Self::Unrecognized(other),
        }
    }
}

impl From<ServiceStatus> for u8 {
    fn from(status: ServiceStatus) -> Self {
        match status {
            ServiceStatus::Unavailable => 0,
            ServiceStatus::Disconnected => 1,
            ServiceStatus::Connecting => 2,
            ServiceStatus::Connected => 3,
            ServiceStatus::Disconnecting => 4,
            ServiceStatus::Unrecognized(code) => code,
        }
    }
}

/// Auxiliary conditions read from the status source next to the status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    /// The lifecycle collaborator is retrying on its own.
    pub reconnecting: bool,
    /// Error code stored by the last failed attempt. 0 = none.
    pub error_code: i32,
}

// ── Reportable label ──────────────────────────────────────────────────────────

/// The state string exposed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateLabel {
    Unavailable,
    Disconnected,
    Error,
    Connecting,
    Reconnecting,
    Disconnecting,
    Connected,
    Unknown,
}

impl StateLabel {
    /// Map a raw status plus flags onto the label observers see.
    pub fn derive(status: ServiceStatus, flags: StatusFlags) -> Self {
        match status {
            ServiceStatus::Unavailable => Self::Unavailable,
            ServiceStatus::Disconnected if flags.reconnecting => Self::Reconnecting,
            ServiceStatus::Disconnected if flags.error_code != 0 => Self::Error,
            ServiceStatus::Disconnected => Self::Disconnected,
            ServiceStatus::Connecting if flags.reconnecting => Self::Reconnecting,
            ServiceStatus::Connecting => Self::Connecting,
            ServiceStatus::Connected => Self::Connected,
            ServiceStatus::Disconnecting => Self::Disconnecting,
            ServiceStatus::Unrecognized(_) => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
            Self::Connecting => "connecting",
            Self::Reconnecting => "reconnecting",
            Self::Disconnecting => "disconnecting",
            Self::Connected => "connected",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
