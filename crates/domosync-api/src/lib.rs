// domosync-api: Async Rust client for the Domoticz JSON API

pub mod auth;
pub mod client;
pub mod commands;
pub mod devices;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::DomoticzClient;
pub use error::Error;
pub use models::{DeviceDescriptor, DeviceFilter, Reading, VersionInfo};
pub use transport::{TlsMode, TransportConfig};
