//! Error taxonomy for requests, attribute access and collaborators.
//!
//! Every variant here is handled at the bridge boundary and turned into a
//! reply or a log line. None of them escape as faults.

use serde::{Deserialize, Serialize};

// ── Requests ──────────────────────────────────────────────────────────────────

/// Outcome of a failed `Connect` or `Disconnect` request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "message", rename_all = "snake_case")]
pub enum RequestError {
    /// A request of the same kind is already outstanding for this service.
    #[error("operation already in progress")]
    AlreadyInProgress,
    /// The lifecycle action failed, synchronously or asynchronously.
    #[error("operation failed: {0}")]
    Failed(String),
    /// The profile offers no such action right now.
    #[error("operation not available")]
    NotAvailable,
    /// No identity could be derived for the handle.
    #[error("service does not exist")]
    UnknownService,
    /// The service went away while the request was pending. Never produced
    /// by the bridge itself; hosts report it when a token is dropped unanswered.
    #[error("request abandoned without a reply")]
    Abandoned,
}

// ── Attributes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyError {
    #[error("invalid arguments")]
    InvalidArguments,
    #[error("unknown property")]
    UnknownProperty,
    #[error("property is read-only")]
    ReadOnly,
    #[error("service does not exist")]
    UnknownService,
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Synchronous rejection from a lifecycle action (`begin_connect`/`begin_disconnect`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("not supported by the profile")]
    NotSupported,
    #[error("{0}")]
    Failed(String),
}

impl From<ActionError> for RequestError {
    fn from(e: ActionError) -> Self {
        match e {
            ActionError::NotSupported => RequestError::NotAvailable,
            ActionError::Failed(message) => RequestError::Failed(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("failed to register {key}: {reason}")]
    RegistrationFailed { key: String, reason: String },
}

/// Human-readable cause for an error code stored by a failed attempt.
///
/// Codes are errno values, negative or positive.
pub fn describe_error_code(code: i32) -> String {
    if code == 0 {
        return "connection attempt ended without a link".to_string();
    }
    std::io::Error::from_raw_os_error(code.saturating_abs()).to_string()
}
