//! tether-core — shared types for the service bridge.
//!
//! Status codes, reportable state labels, service identities, attribute
//! values, the error taxonomy and configuration. Nothing here talks to a
//! collaborator; `tether-services` builds the bridge on top of it.

pub mod attribute;
pub mod config;
pub mod error;
pub mod identity;
pub mod status;

pub use attribute::{AttributeValue, ServiceProperties, WritableAttribute};
pub use config::{BridgeConfig, ConfigError, LoggingConfig, TetherConfig};
pub use error::{describe_error_code, ActionError, BusError, PropertyError, RequestError};
pub use identity::{ServiceHandle, ServiceIdentity};
pub use status::{ServiceStatus, StateLabel, StatusFlags};
