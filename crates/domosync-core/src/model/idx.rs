// ── Device identity ──
//
// Domoticz identifies a device by its `idx`. Older firmware sends it as
// an integer and newer as a string, so the bridge carries the decimal
// string form everywhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable remote identifier of a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceIdx(String);

impl DeviceIdx {
    pub fn new(idx: impl Into<String>) -> Self {
        Self(idx.into().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceIdx {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for DeviceIdx {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceIdx {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<u64> for DeviceIdx {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl AsRef<str> for DeviceIdx {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
