// ── Paired and managed devices ──
//
// `PairedDevice` is what discovery produces and what the config file
// persists. `ManagedDevice` is the live registry entry built from it,
// adding the last-known value cache.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::capability::{Capability, CapabilityValue, DeviceClass};
use super::idx::DeviceIdx;

/// Last-known capability values of one device.
pub type LastKnownValues = HashMap<Capability, CapabilityValue>;

// ── PairedDevice ────────────────────────────────────────────────────

/// A remote device bound to a local device.
///
/// The capability set is fixed at pairing time and never changes
/// afterwards; re-pair to pick up a different mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedDevice {
    /// Pairing identifier, generated once at discovery.
    pub id: Uuid,
    pub idx: DeviceIdx,
    pub name: String,
    pub class: DeviceClass,
    pub capabilities: IndexSet<Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_type: Option<i64>,
}

/// A discovery result not yet paired.
pub type PairingCandidate = PairedDevice;

impl PairedDevice {
    pub fn new(
        idx: impl Into<DeviceIdx>,
        name: impl Into<String>,
        class: DeviceClass,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            idx: idx.into(),
            name: name.into(),
            class,
            capabilities: capabilities.into_iter().collect(),
            hardware_name: None,
            hardware_type: None,
        }
    }
}

// ── ManagedDevice ───────────────────────────────────────────────────

/// A device tracked by the registry.
///
/// The last-known cache sits behind a per-device async mutex: the
/// synchronizer and the dispatcher both touch it, and writes for one
/// device must not interleave while different devices proceed in
/// parallel. A second lock orders outbound dispatches for the device.
#[derive(Debug)]
pub struct ManagedDevice {
    paired: PairedDevice,
    values: Mutex<LastKnownValues>,
    dispatch: Mutex<()>,
}

impl ManagedDevice {
    pub fn new(paired: PairedDevice) -> Self {
        Self {
            paired,
            values: Mutex::new(HashMap::new()),
            dispatch: Mutex::new(()),
        }
    }

    pub fn idx(&self) -> &DeviceIdx {
        &self.paired.idx
    }

    pub fn name(&self) -> &str {
        &self.paired.name
    }

    pub fn class(&self) -> DeviceClass {
        self.paired.class
    }

    pub fn capabilities(&self) -> &IndexSet<Capability> {
        &self.paired.capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.paired.capabilities.contains(&capability)
    }

    pub fn paired(&self) -> &PairedDevice {
        &self.paired
    }

    /// Lock the last-known cache for a read-compare-write sequence.
    pub async fn lock_values(&self) -> MutexGuard<'_, LastKnownValues> {
        self.values.lock().await
    }

    /// Serialize outbound dispatches for this device.
    ///
    /// Independent of the value cache, so polls keep running while a
    /// command is in flight.
    pub async fn lock_dispatch(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().await
    }

    /// Current last-known value of one capability.
    pub async fn last_known(&self, capability: Capability) -> Option<CapabilityValue> {
        self.values.lock().await.get(&capability).cloned()
    }

    /// Copy of the whole cache.
    pub async fn last_known_values(&self) -> LastKnownValues {
        self.values.lock().await.clone()
    }
}

impl From<PairedDevice> for ManagedDevice {
    fn from(paired: PairedDevice) -> Self {
        Self::new(paired)
    }
}
