// ── Value table ──
//
// One entry per capability: how to read it out of a device descriptor
// and, for the two writable capabilities, how to turn a new value into a
// remote command. Discovery, the synchronizer, and the dispatcher all go
// through `rule()`, so there is exactly one place that knows how a
// capability maps onto Domoticz fields.
//
// Decoding is total. A missing or non-numeric field yields `None` for
// that capability and nothing else.

use domosync_api::{DeviceDescriptor, Reading};

use crate::model::{Capability, CapabilityValue};
use crate::remote::{RemoteCommand, SwitchState};

/// Wind gust arrives in 0.1 m/s; the hub wants km/h.
const WIND_SPEED_SCALE: f64 = 3.6 / 10.0;

type DecodeFn = fn(&DeviceDescriptor) -> Option<CapabilityValue>;
type EncodeFn = fn(&CapabilityValue) -> Option<RemoteCommand>;

/// Decode and encode functions for one capability.
#[derive(Clone, Copy)]
pub struct CapabilityRule {
    pub decode: DecodeFn,
    /// `None` for read-only capabilities.
    pub encode: Option<EncodeFn>,
}

impl CapabilityRule {
    const fn read_only(decode: DecodeFn) -> Self {
        Self {
            decode,
            encode: None,
        }
    }

    const fn writable(decode: DecodeFn, encode: EncodeFn) -> Self {
        Self {
            decode,
            encode: Some(encode),
        }
    }
}

/// The table itself. Exhaustive, so a new capability cannot be added
/// without a rule.
pub fn rule(capability: Capability) -> CapabilityRule {
    match capability {
        Capability::OnOff => CapabilityRule::writable(decode_onoff, encode_onoff),
        Capability::Dim => CapabilityRule::read_only(decode_dim),
        Capability::MeterGas | Capability::MeterPower => {
            CapabilityRule::read_only(decode_counter_today)
        }
        Capability::GasMeterCumulative => CapabilityRule::read_only(decode_data_number),
        Capability::MeasurePower => CapabilityRule::read_only(decode_net_usage),
        Capability::PowerMeterCumulativeHigh => CapabilityRule::read_only(decode_tariff_high),
        Capability::PowerMeterCumulativeLow => CapabilityRule::read_only(decode_tariff_low),
        Capability::TargetTemperature => {
            CapabilityRule::writable(decode_set_point, encode_set_point)
        }
        Capability::MeasureTemperature => CapabilityRule::read_only(decode_temp),
        Capability::MeasureHumidity => CapabilityRule::read_only(decode_humidity),
        Capability::FanSpeed => CapabilityRule::read_only(decode_fan_speed),
        Capability::MeasureWindAngle => CapabilityRule::read_only(decode_wind_angle),
        Capability::MeasureWindStrength => CapabilityRule::read_only(decode_wind_strength),
        Capability::MeterRain => CapabilityRule::read_only(decode_rain),
        Capability::MeasureRain => CapabilityRule::read_only(decode_rain_rate),
        Capability::MeasureVoltage => CapabilityRule::read_only(decode_voltage),
    }
}

/// Read one capability out of a descriptor.
pub fn decode(capability: Capability, descriptor: &DeviceDescriptor) -> Option<CapabilityValue> {
    (rule(capability).decode)(descriptor)
}

/// Build the remote command for a new local value, if the capability is
/// writable and the value has the right shape.
pub fn encode(capability: Capability, value: &CapabilityValue) -> Option<RemoteCommand> {
    rule(capability).encode.and_then(|encode| encode(value))
}

// ── Decoders ────────────────────────────────────────────────────────

fn decode_onoff(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    d.status
        .as_deref()
        .map(|status| CapabilityValue::Bool(status != "Off"))
}

fn decode_dim(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    let level = d.level.as_ref().and_then(reading_number)?;
    Some(CapabilityValue::Number((level / 100.0).clamp(0.0, 1.0)))
}

/// `CounterToday` looks like `"12.3 m3"` or `"4.120 kWh"`.
fn decode_counter_today(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    let value = match d.counter_today.as_ref()? {
        Reading::Text(text) => leading_number(text.split(' ').next()?)?,
        other => reading_number(other)?,
    };
    Some(CapabilityValue::Number(value))
}

fn decode_data_number(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    data_field(d, 0).map(CapabilityValue::Number)
}

fn decode_net_usage(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    let usage = d.usage.as_ref().and_then(reading_number)?;
    let delivered = d
        .usage_deliv
        .as_ref()
        .and_then(reading_number)
        .unwrap_or(0.0);
    Some(CapabilityValue::Number(usage - delivered))
}

fn decode_tariff_high(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    data_field(d, 0).map(CapabilityValue::Number)
}

fn decode_tariff_low(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    data_field(d, 1).map(CapabilityValue::Number)
}

fn decode_set_point(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    number_field(d.set_point.as_ref())
}

fn decode_temp(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    number_field(d.temp.as_ref())
}

fn decode_humidity(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    number_field(d.humidity.as_ref())
}

/// `Data` looks like `"1200 RPM"`.
fn decode_fan_speed(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    let data = d.data.as_deref()?.to_lowercase().replace("rpm", "");
    leading_number(data.trim()).map(CapabilityValue::Number)
}

/// Wind `Data` is `"angle;direction;speed;gust;temp;chill"`.
fn decode_wind_angle(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    data_field(d, 0).map(CapabilityValue::Number)
}

fn decode_wind_strength(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    data_field(d, 3).map(|gust| CapabilityValue::Number(gust * WIND_SPEED_SCALE))
}

fn decode_rain(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    number_field(d.rain.as_ref())
}

fn decode_rain_rate(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    number_field(d.rain_rate.as_ref())
}

fn decode_voltage(d: &DeviceDescriptor) -> Option<CapabilityValue> {
    number_field(d.voltage.as_ref())
}

// ── Encoders ────────────────────────────────────────────────────────

fn encode_onoff(value: &CapabilityValue) -> Option<RemoteCommand> {
    value
        .as_bool()
        .map(|on| RemoteCommand::Switch(SwitchState::from(on)))
}

fn encode_set_point(value: &CapabilityValue) -> Option<RemoteCommand> {
    value
        .as_number()
        .filter(|n| n.is_finite())
        .map(RemoteCommand::SetSetpoint)
}

// ── Numeric helpers ─────────────────────────────────────────────────

fn number_field(reading: Option<&Reading>) -> Option<CapabilityValue> {
    reading.and_then(reading_number).map(CapabilityValue::Number)
}

/// Numeric value of a reading, whether sent as a number or as text with
/// a unit suffix.
pub(crate) fn reading_number(reading: &Reading) -> Option<f64> {
    match reading {
        Reading::Number(n) if n.is_finite() => Some(*n),
        Reading::Text(text) => leading_number(text),
        _ => None,
    }
}

/// `index`-th `;`-separated field of `Data`. An empty `Data` yields
/// `None` for every index.
fn data_field(d: &DeviceDescriptor, index: usize) -> Option<f64> {
    let data = d.data.as_deref().filter(|data| !data.trim().is_empty())?;
    data.split(';').nth(index).and_then(leading_number)
}

/// Parse the longest numeric prefix of `text`, after leading whitespace.
///
/// `"123 Watt"` is 123, `"-4.5kWh"` is -4.5, `"Watt"` is `None`.
pub(crate) fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }
    text[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn descriptor(fields: serde_json::Value) -> DeviceDescriptor {
        let mut value = fields;
        value["idx"] = serde_json::json!("1");
        serde_json::from_value(value).unwrap()
    }

    fn number(capability: Capability, d: &DeviceDescriptor) -> Option<f64> {
        decode(capability, d).and_then(|v| v.as_number())
    }

    // ── onoff ──

    #[test]
    fn onoff_is_true_unless_status_is_off() {
        for status in ["On", "Set Level: 40 %", "Open", ""] {
            let d = descriptor(serde_json::json!({ "Status": status }));
            assert_eq!(decode(Capability::OnOff, &d), Some(CapabilityValue::Bool(true)));
        }
        let d = descriptor(serde_json::json!({ "Status": "Off" }));
        assert_eq!(decode(Capability::OnOff, &d), Some(CapabilityValue::Bool(false)));
    }

    #[test]
    fn onoff_without_status_is_absent() {
        assert_eq!(decode(Capability::OnOff, &DeviceDescriptor::new("1")), None);
    }

    // ── counters ──

    #[test]
    fn meter_gas_takes_token_before_unit() {
        let d = descriptor(serde_json::json!({ "CounterToday": "12.3 m3" }));
        assert_eq!(number(Capability::MeterGas, &d), Some(12.3));
    }

    #[test]
    fn meter_power_uses_the_same_counter_rule() {
        let d = descriptor(serde_json::json!({ "CounterToday": "4.120 kWh" }));
        assert_eq!(number(Capability::MeterPower, &d), Some(4.12));
        let d = descriptor(serde_json::json!({ "CounterToday": 7 }));
        assert_eq!(number(Capability::MeterPower, &d), Some(7.0));
    }

    #[test]
    fn cumulative_gas_requires_data() {
        let d = descriptor(serde_json::json!({ "Data": "4567.890" }));
        assert_eq!(number(Capability::GasMeterCumulative, &d), Some(4567.89));
        let d = descriptor(serde_json::json!({ "Data": "" }));
        assert_eq!(decode(Capability::GasMeterCumulative, &d), None);
    }

    #[test]
    fn measure_power_subtracts_delivery() {
        let d = descriptor(serde_json::json!({ "Usage": "150 Watt", "UsageDeliv": "20 Watt" }));
        assert_eq!(number(Capability::MeasurePower, &d), Some(130.0));
    }

    #[test]
    fn measure_power_without_delivery_counts_zero() {
        let d = descriptor(serde_json::json!({ "Usage": "150 Watt" }));
        assert_eq!(number(Capability::MeasurePower, &d), Some(150.0));
        let d = descriptor(serde_json::json!({ "Usage": "150 Watt", "UsageDeliv": "n/a" }));
        assert_eq!(number(Capability::MeasurePower, &d), Some(150.0));
    }

    #[test]
    fn tariffs_split_data() {
        let d = descriptor(serde_json::json!({ "Data": "1234.5;678.9;0;0;150;0" }));
        assert_eq!(number(Capability::PowerMeterCumulativeHigh, &d), Some(1234.5));
        assert_eq!(number(Capability::PowerMeterCumulativeLow, &d), Some(678.9));
    }

    #[test]
    fn tariffs_without_data_are_absent_not_zero() {
        let d = DeviceDescriptor::new("1");
        assert_eq!(decode(Capability::PowerMeterCumulativeHigh, &d), None);
        assert_eq!(decode(Capability::PowerMeterCumulativeLow, &d), None);
    }

    // ── climate ──

    #[test]
    fn set_point_parses_text() {
        let d = descriptor(serde_json::json!({ "SetPoint": "20.5" }));
        assert_eq!(number(Capability::TargetTemperature, &d), Some(20.5));
    }

    #[test]
    fn temperature_and_humidity_pass_through() {
        let d = descriptor(serde_json::json!({ "Temp": 21.4, "Humidity": 48 }));
        assert_eq!(number(Capability::MeasureTemperature, &d), Some(21.4));
        assert_eq!(number(Capability::MeasureHumidity, &d), Some(48.0));
    }

    #[test]
    fn fan_speed_strips_rpm() {
        let d = descriptor(serde_json::json!({ "Data": "1200 RPM" }));
        assert_eq!(number(Capability::FanSpeed, &d), Some(1200.0));
        let d = descriptor(serde_json::json!({ "Data": "rpm" }));
        assert_eq!(decode(Capability::FanSpeed, &d), None);
    }

    // ── weather ──

    #[test]
    fn wind_strength_converts_to_kmh() {
        let d = descriptor(serde_json::json!({ "Data": "10;20;30;40" }));
        let strength = number(Capability::MeasureWindStrength, &d).unwrap();
        assert!((strength - 14.4).abs() < 1e-9);
        assert_eq!(number(Capability::MeasureWindAngle, &d), Some(10.0));
    }

    #[test]
    fn wind_with_short_data_is_absent() {
        let d = descriptor(serde_json::json!({ "Data": "10;20" }));
        assert_eq!(decode(Capability::MeasureWindStrength, &d), None);
        assert_eq!(number(Capability::MeasureWindAngle, &d), Some(10.0));
    }

    #[test]
    fn rain_fields_map_to_their_own_capabilities() {
        let d = descriptor(serde_json::json!({ "Rain": "12.5", "RainRate": "0.4" }));
        assert_eq!(number(Capability::MeterRain, &d), Some(12.5));
        assert_eq!(number(Capability::MeasureRain, &d), Some(0.4));
    }

    #[test]
    fn voltage_and_dim() {
        let d = descriptor(serde_json::json!({ "Voltage": "230.1 V", "Level": 40 }));
        assert_eq!(number(Capability::MeasureVoltage, &d), Some(230.1));
        assert_eq!(number(Capability::Dim, &d), Some(0.4));
    }

    // ── totality ──

    #[test]
    fn decode_isolates_missing_fields() {
        let d = descriptor(serde_json::json!({ "Usage": "150 Watt" }));
        assert_eq!(number(Capability::MeasurePower, &d), Some(150.0));
        assert_eq!(decode(Capability::MeterPower, &d), None);
    }

    #[test]
    fn every_capability_is_total_over_garbage() {
        let d = descriptor(serde_json::json!({
            "Status": null,
            "Data": ";;;",
            "Usage": [1],
            "CounterToday": "n/a",
            "SetPoint": {},
            "Temp": "warm",
            "Level": "high"
        }));
        for capability in Capability::all() {
            assert_eq!(decode(capability, &d), None, "{capability}");
        }
    }

    // ── encode ──

    #[test]
    fn encode_onoff() {
        assert_eq!(
            encode(Capability::OnOff, &CapabilityValue::Bool(true)),
            Some(RemoteCommand::Switch(SwitchState::On))
        );
        assert_eq!(
            encode(Capability::OnOff, &CapabilityValue::Bool(false)),
            Some(RemoteCommand::Switch(SwitchState::Off))
        );
        assert_eq!(encode(Capability::OnOff, &CapabilityValue::Number(1.0)), None);
    }

    #[test]
    fn encode_set_point() {
        assert_eq!(
            encode(Capability::TargetTemperature, &CapabilityValue::Number(21.5)),
            Some(RemoteCommand::SetSetpoint(21.5))
        );
        assert_eq!(
            encode(Capability::TargetTemperature, &CapabilityValue::Number(f64::NAN)),
            None
        );
    }

    #[test]
    fn read_only_capabilities_do_not_encode() {
        for capability in Capability::all().filter(|c| !c.is_writable()) {
            assert!(rule(capability).encode.is_none(), "{capability}");
            assert_eq!(encode(capability, &CapabilityValue::Number(1.0)), None);
        }
    }

    // ── helpers ──

    #[test]
    fn leading_number_prefixes() {
        assert_eq!(leading_number("123 Watt"), Some(123.0));
        assert_eq!(leading_number("  -4.5kWh"), Some(-4.5));
        assert_eq!(leading_number(".5"), Some(0.5));
        assert_eq!(leading_number("7."), Some(7.0));
        assert_eq!(leading_number("Watt"), None);
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number("."), None);
        assert_eq!(leading_number(""), None);
    }
}
