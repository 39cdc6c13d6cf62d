// ── Capability mapping ──
//
// Decides, from a descriptor's `Type`, `SubType`, and dimmer flags, which
// capabilities a newly discovered device exposes and which device class
// the hub should render it as. Only used at discovery time.

use domosync_api::DeviceDescriptor;
use indexmap::IndexSet;

use crate::model::{Capability, DeviceClass};

const LIGHTING_TYPES: &[&str] = &[
    "Light/Switch",
    "Lighting 1",
    "Lighting 2",
    "Lighting2",
    "Color Switch",
];

/// Device class for a descriptor, or `None` when the hub has no sensible
/// rendering for it (security panels).
pub fn map_device_class(descriptor: &DeviceDescriptor) -> Option<DeviceClass> {
    match descriptor.device_type.as_deref() {
        Some("Security") => None,
        Some("Thermostat") => Some(DeviceClass::Thermostat),
        Some(kind) if LIGHTING_TYPES.contains(&kind) => Some(DeviceClass::Light),
        _ => Some(DeviceClass::Sensor),
    }
}

/// Ordered capability set for a descriptor. Type rules apply first, then
/// subtype rules; duplicates collapse.
pub fn map_capabilities(descriptor: &DeviceDescriptor) -> IndexSet<Capability> {
    let mut caps = IndexSet::new();
    let kind = descriptor.device_type.as_deref().unwrap_or_default();
    let sub_type = descriptor.sub_type.as_deref().unwrap_or_default();

    match kind {
        "Humidity" => {
            caps.insert(Capability::MeasureHumidity);
        }
        "Temp" => {
            caps.insert(Capability::MeasureTemperature);
        }
        "Temp + Humidity" => {
            caps.insert(Capability::MeasureTemperature);
            caps.insert(Capability::MeasureHumidity);
        }
        "Wind" => {
            caps.insert(Capability::MeasureWindAngle);
            caps.insert(Capability::MeasureWindStrength);
        }
        "Rain" => {
            if descriptor.rain.is_some() {
                caps.insert(Capability::MeterRain);
            }
            if descriptor.rain_rate.is_some() {
                caps.insert(Capability::MeasureRain);
            }
        }
        "Usage" if sub_type == "Electric" => {
            caps.insert(Capability::MeasurePower);
        }
        k if LIGHTING_TYPES.contains(&k) => {
            caps.insert(Capability::OnOff);
            if k != "Color Switch" && is_dimmable(descriptor) {
                caps.insert(Capability::Dim);
            }
        }
        _ => {}
    }

    match sub_type {
        "Gas" => {
            caps.insert(Capability::MeterGas);
            caps.insert(Capability::GasMeterCumulative);
        }
        "Energy" => {
            caps.insert(Capability::MeasurePower);
            caps.insert(Capability::MeterPower);
            caps.insert(Capability::PowerMeterCumulativeHigh);
            caps.insert(Capability::PowerMeterCumulativeLow);
        }
        // Some releases exposed this as target_temperature; it is a sensor.
        "WTGR800" => {
            if descriptor.humidity.is_some() {
                caps.insert(Capability::MeasureHumidity);
            }
            if descriptor.temp.is_some() {
                caps.insert(Capability::MeasureTemperature);
            }
        }
        "Fan" => {
            caps.insert(Capability::FanSpeed);
        }
        "SetPoint" => {
            caps.insert(Capability::TargetTemperature);
        }
        "Voltage" => {
            caps.insert(Capability::MeasureVoltage);
        }
        _ => {}
    }

    caps
}

fn is_dimmable(descriptor: &DeviceDescriptor) -> bool {
    descriptor.have_dimmer == Some(true) && descriptor.dimmer_type.as_deref() != Some("none")
}
