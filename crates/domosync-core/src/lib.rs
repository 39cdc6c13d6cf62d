//! Bidirectional device-state sync between a local hub and a Domoticz server.
//!
//! - **[`Bridge`]**: Lifecycle facade for one device collection.
//!   [`start()`](Bridge::start) spawns a poll timer and a command
//!   processor, [`stop()`](Bridge::stop) cancels and joins them. Devices
//!   enter and leave through [`add_device`](Bridge::add_device) /
//!   [`remove_device`](Bridge::remove_device).
//!
//! - **[`Synchronizer`]**: One single-flight poll cycle: fetch, match
//!   against the [`DeviceRegistry`], skip already-seen freshness markers,
//!   decode, and write changed values to the [`LocalPlatform`].
//!
//! - **[`Dispatcher`]**: Turns hub-side [`CapabilityChange`]s into
//!   [`RemoteCommand`]s, sent concurrently and never retried.
//!
//! - **[`decode`]**: The capability table: one decode rule per
//!   capability, one encode rule per writable capability.
//!
//! - **[`mapper`]** / **[`discovery`]**: Which capabilities and class a
//!   remote device gets when it is paired.

pub mod bridge;
pub mod config;
pub mod decode;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod mapper;
pub mod model;
pub mod platform;
pub mod registry;
pub mod remote;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, BridgeState};
pub use config::{BridgeConfig, ConnectionConfig, TlsVerification};
pub use dispatch::{CapabilityChange, DispatchFailure, DispatchReport, Dispatcher};
pub use error::CoreError;
pub use platform::{CapabilityWrite, LocalPlatform, MemoryPlatform, PlatformError};
pub use registry::DeviceRegistry;
pub use remote::{RemoteClient, RemoteCommand, SwitchState};
pub use sync::{SyncOutcome, SyncReport, Synchronizer, WriteFailure};

pub use model::{
    Capability, CapabilityValue, DeviceClass, DeviceIdx, LastKnownValues, ManagedDevice,
    PairedDevice, PairingCandidate,
};

// The descriptor type crosses the `RemoteClient` seam, so callers get it
// from here rather than depending on `domosync-api` directly.
pub use domosync_api::{DeviceDescriptor, DeviceFilter, DomoticzClient, Reading, VersionInfo};
