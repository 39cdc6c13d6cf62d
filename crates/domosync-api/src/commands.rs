// Command endpoints
//
// Device updates and the version probe. Commands arrive as
// `(name, idx, primary, secondary)` so callers stay independent of the
// `param=` vocabulary.

use tracing::debug;

use crate::client::DomoticzClient;
use crate::error::Error;
use crate::models::VersionInfo;

/// Command name for on/off switching.
pub const COMMAND_SWITCH: &str = "switch";
/// Command name for thermostat setpoints.
pub const COMMAND_SET_SETPOINT: &str = "set-setpoint";

impl DomoticzClient {
    /// Send a device command.
    ///
    /// - `switch`: `GET /json.htm?type=command&param=switchlight&idx={idx}&switchcmd={On|Off}`
    /// - `set-setpoint`: `GET /json.htm?type=command&param=setsetpoint&idx={idx}&setpoint={value}`
    ///
    /// `secondary`, when present, is forwarded as `level=`.
    pub async fn update_device(
        &self,
        command: &str,
        idx: &str,
        primary: &str,
        secondary: Option<&str>,
    ) -> Result<(), Error> {
        let (param, arg_name) = match command {
            COMMAND_SWITCH => ("switchlight", "switchcmd"),
            COMMAND_SET_SETPOINT => ("setsetpoint", "setpoint"),
            other => return Err(Error::UnsupportedCommand(other.to_owned())),
        };

        let mut query = vec![
            ("type", "command"),
            ("param", param),
            ("idx", idx),
            (arg_name, primary),
        ];
        if let Some(level) = secondary {
            query.push(("level", level));
        }

        debug!(command, idx, primary, "updating device");
        let _: Vec<serde_json::Value> = self.get_envelope(&query).await?;
        Ok(())
    }

    /// Probe the server with the configured credentials.
    ///
    /// `GET /json.htm?type=command&param=getversion`
    pub async fn check_credentials(&self) -> Result<VersionInfo, Error> {
        debug!("checking credentials");
        self.get_object(&[("type", "command"), ("param", "getversion")])
            .await
    }
}
