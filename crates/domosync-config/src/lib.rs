//! Configuration for domosync.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), the
//! list of paired devices per profile, and translation into the runtime
//! `domosync_core` config types. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use domosync_core::{BridgeConfig, ConnectionConfig, PairedDevice, TlsVerification};

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "DOMOSYNC_CONFIG";

const KEYRING_SERVICE: &str = "domosync";
const DEFAULT_PORT: u16 = 8080;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    10
}

/// A named Domoticz server profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Hostname, IP, or full base URL.
    pub host: String,

    /// Port; ignored when `host` is a full URL that carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Use HTTPS when `host` has no scheme.
    #[serde(default)]
    pub tls: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override poll interval (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,

    /// Devices paired from this server.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<PairedDevice>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Server base URL built from `host`, `port`, and `tls`.
    pub fn url(&self) -> Result<url::Url, ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Validation {
                field: "host".into(),
                reason: "must not be empty".into(),
            });
        }

        let raw = if host.contains("://") {
            host.to_owned()
        } else {
            let scheme = if self.tls { "https" } else { "http" };
            format!("{scheme}://{host}:{}", self.port.unwrap_or(DEFAULT_PORT))
        };

        let mut url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
            field: "host".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
        if host.contains("://") && url.port().is_none() {
            if let Some(port) = self.port {
                url.set_port(Some(port)).map_err(|()| ConfigError::Validation {
                    field: "port".into(),
                    reason: format!("cannot set port on {raw}"),
                })?;
            }
        }
        Ok(url)
    }

    /// Append candidates whose idx is not paired yet. Returns how many
    /// were added.
    pub fn pair_devices(&mut self, candidates: impl IntoIterator<Item = PairedDevice>) -> usize {
        let mut added = 0;
        for candidate in candidates {
            if self.devices.iter().any(|d| d.idx == candidate.idx) {
                continue;
            }
            self.devices.push(candidate);
            added += 1;
        }
        added
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `DOMOSYNC_CONFIG`, then platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "domosync", "domosync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("domosync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + `DOMOSYNC_` environment overrides.
///
/// Nested keys use a double underscore: `DOMOSYNC_DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DOMOSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the profile's password: `password_env`, then the system
/// keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(password)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Username and password for a profile, or `None` for servers without
/// website protection (no username configured).
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<(String, SecretString)>, ConfigError> {
    let Some(username) = profile.username.clone().filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name)?;
    Ok(Some((username, password)))
}

// ── Translation to runtime config ───────────────────────────────────

/// Build a `ConnectionConfig` from a profile, with no CLI overrides.
pub fn profile_to_connection_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionConfig, ConfigError> {
    let mut config = ConnectionConfig::new(profile.url()?);

    if let Some((username, password)) = resolve_credentials(profile, profile_name)? {
        config.username = Some(username);
        config.password = Some(password);
    }

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(config)
}

/// Build a `BridgeConfig` from a profile.
pub fn profile_to_bridge_config(profile: &Profile, defaults: &Defaults) -> BridgeConfig {
    BridgeConfig {
        poll_interval: Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval)),
        ..BridgeConfig::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use domosync_core::{Capability, DeviceClass};
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn url_from_host_and_port() {
        let mut profile = Profile::new("192.168.1.10");
        assert_eq!(profile.url().unwrap().as_str(), "http://192.168.1.10:8080/");

        profile.port = Some(8443);
        profile.tls = true;
        assert_eq!(profile.url().unwrap().as_str(), "https://192.168.1.10:8443/");
    }

    #[test]
    fn url_from_full_url_keeps_its_port() {
        let mut profile = Profile::new("http://dz.local:9000");
        profile.port = Some(1234);
        assert_eq!(profile.url().unwrap().as_str(), "http://dz.local:9000/");

        let mut profile = Profile::new("https://dz.local");
        profile.port = Some(8443);
        assert_eq!(profile.url().unwrap().as_str(), "https://dz.local:8443/");
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            Profile::new("  ").url(),
            Err(ConfigError::Validation { ref field, .. }) if field == "host"
        ));
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        let mut profile = Profile::new("dz");
        profile.username = Some("admin".into());
        profile.password = Some("hunter2".into());

        let (user, pw) = resolve_credentials(&profile, "domosync-test-plaintext")
            .unwrap()
            .unwrap();
        assert_eq!(user, "admin");
        assert_eq!(pw.expose_secret(), "hunter2");
    }

    #[test]
    fn no_username_means_anonymous() {
        let profile = Profile::new("dz");
        assert!(resolve_credentials(&profile, "p").unwrap().is_none());
    }

    #[test]
    fn username_without_password_is_an_error() {
        let mut profile = Profile::new("dz");
        profile.username = Some("admin".into());
        assert!(matches!(
            resolve_credentials(&profile, "domosync-test-missing"),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn pairing_skips_known_idx() {
        let mut profile = Profile::new("dz");
        let lamp = PairedDevice::new("1", "Lamp", DeviceClass::Light, [Capability::OnOff]);
        assert_eq!(profile.pair_devices([lamp.clone()]), 1);
        assert_eq!(profile.pair_devices([lamp]), 0);
        assert_eq!(profile.devices.len(), 1);
    }

    #[test]
    fn save_then_load_round_trips_devices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut profile = Profile::new("10.0.0.2");
        profile.username = Some("admin".into());
        profile.poll_interval = Some(15);
        profile.pair_devices([PairedDevice::new(
            "12",
            "Gas meter",
            DeviceClass::Sensor,
            [Capability::MeterGas, Capability::GasMeterCumulative],
        )]);

        let mut config = Config::default();
        config.profiles.insert("home".into(), profile);
        config.default_profile = Some("home".into());
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.default_profile_name(), "home");
        let home = &loaded.profiles["home"];
        assert_eq!(home.host, "10.0.0.2");
        assert_eq!(home.poll_interval, Some(15));
        assert_eq!(home.devices.len(), 1);
        assert_eq!(
            home.devices[0].capabilities.iter().copied().collect::<Vec<_>>(),
            vec![Capability::MeterGas, Capability::GasMeterCumulative]
        );
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.defaults.timeout, 30);
        assert_eq!(config.defaults.poll_interval, 10);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn hand_written_toml_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "home"

[defaults]
poll_interval = 20

[profiles.home]
host = "dz.lan"
port = 8081
insecure = true

[[profiles.home.devices]]
id = "6f1c1b9e-2f7d-4c57-9d38-6a2f3f0f5d11"
idx = "7"
name = "Hall"
class = "light"
capabilities = ["onoff", "dim"]
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        let home = &config.profiles["home"];
        assert_eq!(home.devices[0].class, DeviceClass::Light);
        assert_eq!(home.devices[0].capabilities.len(), 2);

        let conn = profile_to_connection_config(home, "home", &config.defaults).unwrap();
        assert_eq!(conn.url.as_str(), "http://dz.lan:8081/");
        assert_eq!(conn.tls, TlsVerification::DangerAcceptInvalid);
        assert!(conn.username.is_none());

        let bridge = profile_to_bridge_config(home, &config.defaults);
        assert_eq!(bridge.poll_interval, Duration::from_secs(20));
    }
}
