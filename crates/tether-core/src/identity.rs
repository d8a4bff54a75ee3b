//! Service handles and identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a service association.
///
/// Owned by the service subsystem. The bridge keys its control blocks on it
/// and never outlives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceHandle(pub u64);

impl fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service#{}", self.0)
    }
}

/// Identity of a service association, as supplied by the identity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Object path of the owning peer, e.g. `/org/bluez/hci0/dev_00_11_22_33_44_55`.
    pub device_path: String,
    /// Profile UUID on the remote side.
    pub remote_uuid: String,
    pub local_uuid: Option<String>,
    pub version: Option<u16>,
}

impl ServiceIdentity {
    /// Stable key used to address this association at the bus boundary.
    ///
    /// `<device_path>/<remote_uuid>` with every `-` replaced by `_`, since
    /// object paths only allow `[A-Za-z0-9_/]`. Returns `None` when either
    /// half is missing.
    pub fn naming_key(&self) -> Option<String> {
        if self.device_path.is_empty() || self.remote_uuid.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.device_path, self.remote_uuid).replace('-', "_"))
    }

    /// Profile version, present only when non-zero.
    pub fn reported_version(&self) -> Option<u16> {
        self.version.filter(|v| *v != 0)
    }
}
