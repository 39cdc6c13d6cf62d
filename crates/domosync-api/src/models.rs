// Domoticz API response types
//
// Models for the `/json.htm` API. Every device listing is wrapped in the
// `Envelope<T>` shape. Reading fields are deliberately loose: Domoticz
// reports the same quantity as a number on one device class and as a
// unit-suffixed string ("150 Watt") on another, so they deserialize into
// `Reading` and are interpreted later by the decoder. Text fields accept
// numbers and booleans too, since some firmware sends `"Data": 1200`.

use serde::{Deserialize, Deserializer, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Domoticz response envelope.
///
/// ```json
/// { "status": "OK", "title": "Devices", "result": [...] }
/// ```
///
/// `result` is omitted entirely when a query matches nothing.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("OK")
    }
}

// ── Readings ─────────────────────────────────────────────────────────

/// A loosely-typed device reading.
///
/// Numbers stay numbers, strings stay strings (units and all), and
/// anything else is kept as raw JSON so one odd field never fails the
/// whole device listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Reading {
    /// The numeric value if the server sent a JSON number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The raw text if the server sent a JSON string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Reading {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Reading {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

// ── Device ───────────────────────────────────────────────────────────

/// A device entry from `type=devices`.
///
/// Domoticz returns dozens of fields per device, varying by hardware
/// type. The ones the bridge decodes are modelled explicitly; everything
/// else lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceDescriptor {
    /// Stable identifier on the server. Older firmware sends it as an
    /// integer, newer as a string; both normalize to the decimal string.
    #[serde(rename = "idx", deserialize_with = "string_or_number")]
    pub idx: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "lenient_text")]
    pub device_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sub_type: Option<String>,
    /// Free-form summary whose meaning depends on `SubType`
    /// (e.g. `"angle;dir;speed;gust;temp;chill"` for wind sensors).
    #[serde(default, deserialize_with = "lenient_text")]
    pub data: Option<String>,
    /// Freshness marker, e.g. `"2024-06-15 10:30:00"`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_update: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default)]
    pub usage: Option<Reading>,
    #[serde(default)]
    pub usage_deliv: Option<Reading>,
    #[serde(default)]
    pub counter_today: Option<Reading>,
    #[serde(default)]
    pub set_point: Option<Reading>,
    #[serde(default)]
    pub temp: Option<Reading>,
    #[serde(default)]
    pub humidity: Option<Reading>,
    #[serde(default)]
    pub rain: Option<Reading>,
    #[serde(default)]
    pub rain_rate: Option<Reading>,
    #[serde(default)]
    pub voltage: Option<Reading>,
    /// Dimmer level, 0-100.
    #[serde(default)]
    pub level: Option<Reading>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub have_dimmer: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dimmer_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub hardware_name: Option<String>,
    #[serde(default)]
    pub hardware_type_val: Option<Reading>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeviceDescriptor {
    /// A bare descriptor carrying only an identifier.
    pub fn new(idx: impl Into<String>) -> Self {
        Self {
            idx: idx.into(),
            ..Self::default()
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::Number(n) => n.as_f64().map(|n| n.abs() > f64::EPSILON),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    })
}

// ── Filters ──────────────────────────────────────────────────────────

/// Server-side and client-side filters for a device listing.
///
/// `kind` maps to the `filter=` query parameter (`light`, `weather`,
/// `temp`, `utility`, ...); `idx` maps to `rid=`. Domoticz has no
/// subtype filter, so `sub_type` is applied after the response arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub kind: Option<String>,
    pub sub_type: Option<String>,
    pub idx: Option<String>,
}

impl DeviceFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_idx(idx: impl Into<String>) -> Self {
        Self {
            idx: Some(idx.into()),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    /// Whether a descriptor passes the client-side part of the filter.
    pub(crate) fn matches(&self, device: &DeviceDescriptor) -> bool {
        match &self.sub_type {
            Some(wanted) => device.sub_type.as_deref() == Some(wanted.as_str()),
            None => true,
        }
    }
}

// ── Version ──────────────────────────────────────────────────────────

/// Response of `param=getversion`, used as a credential probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "Revision", default)]
    pub revision: Option<i64>,
    #[serde(default)]
    pub build_time: Option<String>,
}
