// ── Runtime configuration ──
//
// How to reach the server and how often to poll it. Built by the CLI
// from a profile; the core never reads config files.

use std::time::Duration;

use domosync_api::transport::{TlsMode, TransportConfig};
use domosync_api::{Credentials, DomoticzClient};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Where the server lives and how to authenticate.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server root, e.g. `http://192.168.1.10:8080`.
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub tls: TlsVerification,
    /// Request timeout. The only timeout the bridge applies.
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            username: None,
            password: None,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build the HTTP client for this connection.
    pub fn connect(&self) -> Result<DomoticzClient, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&self.tls),
            ..TransportConfig::default()
        }
        .with_timeout(self.timeout);

        let credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Some(Credentials::new(username.clone(), password.clone()))
            }
            (Some(username), None) => Some(Credentials::new(
                username.clone(),
                SecretString::from(String::new()),
            )),
            _ => None,
        };

        Ok(DomoticzClient::new(self.url.clone(), credentials, &transport)?)
    }
}

/// Polling behavior of one bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Time between poll cycles. Zero disables the timer; `poll_now`
    /// still works.
    pub poll_interval: Duration,
    /// Capacity of the change-notification queue.
    pub command_queue: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            command_queue: 64,
        }
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
