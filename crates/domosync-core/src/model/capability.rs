// ── Capabilities ──
//
// The hub's vocabulary: which capability a device exposes, what value it
// carries, and which device class the hub renders it as.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

// ── Capability ──────────────────────────────────────────────────────

/// A named capability on the hub side.
///
/// Names follow the hub's snake_case convention. Parsing is
/// case-insensitive and accepts `-` for `_` (see [`Capability::parse`]).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Capability {
    #[serde(rename = "onoff", alias = "on_off")]
    #[strum(to_string = "onoff", serialize = "on_off")]
    OnOff,
    Dim,
    MeterGas,
    GasMeterCumulative,
    MeasurePower,
    MeterPower,
    PowerMeterCumulativeHigh,
    PowerMeterCumulativeLow,
    TargetTemperature,
    MeasureTemperature,
    MeasureHumidity,
    FanSpeed,
    MeasureWindAngle,
    MeasureWindStrength,
    MeterRain,
    MeasureRain,
    MeasureVoltage,
}

impl Capability {
    /// Resolve a capability name, ignoring case and treating `-` as `_`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('-', "_");
        Self::from_str(&normalized).ok()
    }

    /// Only these two capabilities have an outbound command; every other
    /// capability mirrors the remote reading.
    pub fn is_writable(self) -> bool {
        matches!(self, Self::OnOff | Self::TargetTemperature)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

// ── CapabilityValue ─────────────────────────────────────────────────

/// A typed scalar carried by a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CapabilityValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for CapabilityValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for CapabilityValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for CapabilityValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

// ── DeviceClass ─────────────────────────────────────────────────────

/// How the hub presents a paired device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DeviceClass {
    Sensor,
    Light,
    Thermostat,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_accepts_dashes() {
        assert_eq!(Capability::parse("meter-gas"), Some(Capability::MeterGas));
        assert_eq!(Capability::parse("METER_GAS"), Some(Capability::MeterGas));
        assert_eq!(Capability::parse("onoff"), Some(Capability::OnOff));
        assert_eq!(Capability::parse("on-off"), Some(Capability::OnOff));
        assert_eq!(
            Capability::parse("Power-Meter-Cumulative-High"),
            Some(Capability::PowerMeterCumulativeHigh)
        );
        assert_eq!(Capability::parse("alarm_smoke"), None);
    }

    #[test]
    fn display_uses_hub_names() {
        assert_eq!(Capability::OnOff.to_string(), "onoff");
        assert_eq!(Capability::MeasureWindStrength.to_string(), "measure_wind_strength");
        assert_eq!(Capability::Dim.as_str(), "dim");
    }

    #[test]
    fn every_name_round_trips_through_parse() {
        for capability in Capability::all() {
            assert_eq!(Capability::parse(capability.as_str()), Some(capability));
        }
        assert_eq!(Capability::all().count(), 17);
    }

    #[test]
    fn serde_names_match_display() {
        for capability in Capability::all() {
            let json = serde_json::to_string(&capability).unwrap();
            assert_eq!(json, format!("\"{capability}\""));
        }
    }

    #[test]
    fn only_onoff_and_setpoint_are_writable() {
        let writable: Vec<_> = Capability::all().filter(|c| c.is_writable()).collect();
        assert_eq!(
            writable,
            vec![Capability::OnOff, Capability::TargetTemperature]
        );
    }

    #[test]
    fn untagged_values_deserialize_by_shape() {
        let v: CapabilityValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, CapabilityValue::Bool(true));
        let v: CapabilityValue = serde_json::from_str("21.5").unwrap();
        assert_eq!(v, CapabilityValue::Number(21.5));
        let v: CapabilityValue = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(v.as_text(), Some("high"));
    }

    #[test]
    fn device_class_names() {
        assert_eq!(DeviceClass::Thermostat.to_string(), "thermostat");
        assert_eq!("Light".parse::<DeviceClass>().ok(), Some(DeviceClass::Light));
    }
}
