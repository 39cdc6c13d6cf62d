// ── Core error types ──
//
// What the engine and its callers see. Transport-layer detail from
// `domosync-api` is folded into a handful of variants; the `transient`
// flag survives so the bridge can tell a flaky link from a bad setup.

use thiserror::Error;

use crate::model::Capability;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach Domoticz: {message}")]
    Transport { message: String, transient: bool },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Returned by credential validation; never retried.
    #[error("Credentials are not correct or Domoticz is not reachable: {message}")]
    InvalidCredentials { message: String },

    #[error("Bridge is not running")]
    BridgeStopped,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Domoticz rejected the request: {message}")]
    Api { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Write to {capability} failed: {message}")]
    Write {
        capability: Capability,
        message: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the next poll tick has a fair chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { transient: true, .. })
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::InvalidCredentials { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<domosync_api::Error> for CoreError {
    fn from(err: domosync_api::Error) -> Self {
        let transient = err.is_transient();
        match err {
            domosync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            domosync_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
                transient,
            },
            domosync_api::Error::Tls(message) => CoreError::Transport {
                message: format!("TLS: {message}"),
                transient: false,
            },
            domosync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid server URL: {e}"),
            },
            domosync_api::Error::Api { message } => CoreError::Api { message },
            domosync_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
            },
            domosync_api::Error::UnsupportedCommand(command) => {
                CoreError::Internal(format!("no mapping for command {command:?}"))
            }
        }
    }
}
