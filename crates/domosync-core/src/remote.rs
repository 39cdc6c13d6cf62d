// ── Remote client contract ──
//
// The engine talks to the server through `RemoteClient` only, so tests
// can substitute an in-memory fake. `DomoticzClient` is the production
// implementation.

use std::fmt;
use std::future::Future;

use domosync_api::commands::{COMMAND_SET_SETPOINT, COMMAND_SWITCH};
use domosync_api::{DeviceDescriptor, DeviceFilter, DomoticzClient, VersionInfo};

use crate::error::CoreError;
use crate::model::DeviceIdx;

// ── RemoteCommand ───────────────────────────────────────────────────

/// Target state of a switch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SwitchState {
    On,
    Off,
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// An outbound command, produced by the encode half of the value table.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    Switch(SwitchState),
    SetSetpoint(f64),
}

impl RemoteCommand {
    /// Command name understood by [`DomoticzClient::update_device`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Switch(_) => COMMAND_SWITCH,
            Self::SetSetpoint(_) => COMMAND_SET_SETPOINT,
        }
    }

    pub fn primary_arg(&self) -> String {
        match self {
            Self::Switch(state) => state.to_string(),
            Self::SetSetpoint(value) => value.to_string(),
        }
    }

    /// Neither command carries a second argument today.
    pub fn secondary_arg(&self) -> Option<String> {
        None
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.primary_arg())
    }
}

// ── RemoteClient ────────────────────────────────────────────────────

/// Operations the engine needs from the server.
pub trait RemoteClient: Send + Sync + 'static {
    /// List device descriptors matching `filter`.
    fn find_devices(
        &self,
        filter: &DeviceFilter,
    ) -> impl Future<Output = Result<Vec<DeviceDescriptor>, CoreError>> + Send;

    /// Send one command for one device.
    fn update_device(
        &self,
        command: &RemoteCommand,
        idx: &DeviceIdx,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Probe the server with the configured credentials.
    fn check_credentials(&self) -> impl Future<Output = Result<VersionInfo, CoreError>> + Send;
}

impl RemoteClient for DomoticzClient {
    async fn find_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceDescriptor>, CoreError> {
        Ok(DomoticzClient::find_devices(self, filter).await?)
    }

    async fn update_device(&self, command: &RemoteCommand, idx: &DeviceIdx) -> Result<(), CoreError> {
        let primary = command.primary_arg();
        let secondary = command.secondary_arg();
        DomoticzClient::update_device(
            self,
            command.name(),
            idx.as_str(),
            &primary,
            secondary.as_deref(),
        )
        .await?;
        Ok(())
    }

    async fn check_credentials(&self) -> Result<VersionInfo, CoreError> {
        Ok(DomoticzClient::check_credentials(self).await?)
    }
}
