// ── Domain model ──

pub mod capability;
pub mod device;
pub mod idx;

pub use capability::{Capability, CapabilityValue, DeviceClass};
pub use device::{LastKnownValues, ManagedDevice, PairedDevice, PairingCandidate};
pub use idx::DeviceIdx;
