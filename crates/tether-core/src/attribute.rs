//! Attribute surface of a bridged service.
//!
//! `State`, `RemoteUUID`, `LocalUUID` and `Version` are read-only.
//! `AutoConnect` and `Blocked` are read/write; writes are delegated to the
//! service subsystem without local validation beyond the type check.

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;
use crate::status::StateLabel;

/// Well-known attribute names.
pub mod names {
    pub const STATE: &str = "State";
    pub const REMOTE_UUID: &str = "RemoteUUID";
    pub const LOCAL_UUID: &str = "LocalUUID";
    pub const VERSION: &str = "Version";
    pub const AUTO_CONNECT: &str = "AutoConnect";
    pub const BLOCKED: &str = "Blocked";

    pub const ALL: [&str; 6] = [STATE, REMOTE_UUID, LOCAL_UUID, VERSION, AUTO_CONNECT, BLOCKED];
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Uint16(u16),
    Str(String),
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u16> for AttributeValue {
    fn from(v: u16) -> Self {
        Self::Uint16(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<StateLabel> for AttributeValue {
    fn from(label: StateLabel) -> Self {
        Self::Str(label.as_str().to_string())
    }
}

/// Snapshot of every present attribute for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProperties {
    #[serde(rename = "State")]
    pub state: StateLabel,
    #[serde(rename = "RemoteUUID", skip_serializing_if = "Option::is_none")]
    pub remote_uuid: Option<String>,
    #[serde(rename = "LocalUUID", skip_serializing_if = "Option::is_none")]
    pub local_uuid: Option<String>,
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none")]
    pub version: Option<u16>,
    #[serde(rename = "AutoConnect")]
    pub auto_connect: bool,
    #[serde(rename = "Blocked")]
    pub blocked: bool,
}

impl ServiceProperties {
    /// Look up one attribute by name. `None` if unknown or absent.
    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        match name {
            names::STATE => Some(self.state.into()),
            names::REMOTE_UUID => self.remote_uuid.clone().map(Into::into),
            names::LOCAL_UUID => self.local_uuid.clone().map(Into::into),
            names::VERSION => self.version.map(Into::into),
            names::AUTO_CONNECT => Some(self.auto_connect.into()),
            names::BLOCKED => Some(self.blocked.into()),
            _ => None,
        }
    }
}

/// The attributes a client may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritableAttribute {
    AutoConnect,
    Blocked,
}

impl WritableAttribute {
    /// Resolve a write target by name.
    pub fn parse(name: &str) -> Result<Self, PropertyError> {
        match name {
            names::AUTO_CONNECT => Ok(Self::AutoConnect),
            names::BLOCKED => Ok(Self::Blocked),
            n if names::ALL.contains(&n) => Err(PropertyError::ReadOnly),
            _ => Err(PropertyError::UnknownProperty),
        }
    }

    /// Type-check a write payload. Both writable attributes are booleans.
    pub fn coerce(&self, value: &serde_json::Value) -> Result<bool, PropertyError> {
        value.as_bool().ok_or(PropertyError::InvalidArguments)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AutoConnect => names::AUTO_CONNECT,
            Self::Blocked => names::BLOCKED,
        }
    }
}
