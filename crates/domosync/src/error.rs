//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use domosync_config::ConfigError;
use domosync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach Domoticz: {message}")]
    #[diagnostic(
        code(domosync::connection_failed),
        help(
            "Check that Domoticz is running and reachable.\n\
             Try: domosync validate --host <host> --port <port>"
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(domosync::auth_failed),
        help(
            "Verify the username and password of profile '{profile}'.\n\
             Store new ones with: domosync validate --save --username <user> --password <password>"
        )
    )]
    AuthFailed { profile: String },

    #[error("{message}")]
    #[diagnostic(
        code(domosync::invalid_credentials),
        help("Check host, port, username and password, then run: domosync validate")
    )]
    InvalidCredentials { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(domosync::no_credentials),
        help(
            "Pass --password, set DOMOSYNC_PASSWORD, or store one with:\n\
             domosync validate --save --password <password>"
        )
    )]
    NoCredentials { profile: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(domosync::not_found),
        help("Run: domosync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Device '{idx}' does not accept {capability}")]
    #[diagnostic(
        code(domosync::unsupported),
        help("Run: domosync devices to see the capabilities of paired devices")
    )]
    Unsupported { idx: String, capability: String },

    #[error("Profile '{profile}' has no paired devices")]
    #[diagnostic(
        code(domosync::no_devices),
        help("Pair devices with: domosync discover --pair")
    )]
    NoPairedDevices { profile: String },

    #[error("Command to device '{idx}' failed: {message}")]
    #[diagnostic(code(domosync::command_failed))]
    CommandFailed { idx: String, message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Domoticz error ({code}): {message}")]
    #[diagnostic(code(domosync::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(domosync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(domosync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: domosync validate --save --host <host> --profile <name>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(domosync::no_config),
        help(
            "Create one with: domosync validate --save --host <host>\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(domosync::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(domosync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::InvalidCredentials { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. }
            | Self::NoPairedDevices { .. }
            | Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::CommandFailed { .. } | Self::ApiError { .. } | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { message, .. } => CliError::ConnectionFailed { message },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::InvalidCredentials { message } => CliError::InvalidCredentials { message },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices".into(),
            },

            CoreError::BridgeStopped => CliError::ApiError {
                code: "bridge_stopped".into(),
                message: "the bridge stopped before the command was handled".into(),
            },

            CoreError::Api { message } => CliError::ApiError {
                code: "rejected".into(),
                message,
            },

            CoreError::Write {
                capability,
                message,
            } => CliError::ApiError {
                code: "write_failed".into(),
                message: format!("{capability}: {message}"),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}
