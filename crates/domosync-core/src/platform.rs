// ── Local platform contract ──
//
// The hub side of the bridge. The synchronizer pushes decoded values
// through `write_capability`; capability changes made on the hub come
// back in through `Bridge::notify_capability_change`. Writes issued by
// the bridge must not be echoed back as change notifications.

use std::future::Future;

use dashmap::{DashMap, DashSet};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::model::{Capability, CapabilityValue, DeviceIdx};

/// A local capability write was rejected.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PlatformError {
    pub message: String,
}

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Capability-write primitive of the hub.
pub trait LocalPlatform: Send + Sync + 'static {
    fn write_capability(
        &self,
        idx: &DeviceIdx,
        capability: Capability,
        value: &CapabilityValue,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}

// ── MemoryPlatform ──────────────────────────────────────────────────

/// One accepted write, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityWrite {
    pub idx: DeviceIdx,
    pub capability: Capability,
    pub value: CapabilityValue,
}

/// In-process hub: keeps the current value of every capability, logs
/// each accepted write, and can be told to reject a capability.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    state: DashMap<(DeviceIdx, Capability), CapabilityValue>,
    history: Mutex<Vec<CapabilityWrite>>,
    rejected: DashSet<Capability>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future write to `capability` fail.
    pub fn reject(&self, capability: Capability) {
        self.rejected.insert(capability);
    }

    pub fn accept(&self, capability: Capability) {
        self.rejected.remove(&capability);
    }

    /// Current value of one capability on one device.
    pub fn value(&self, idx: &DeviceIdx, capability: Capability) -> Option<CapabilityValue> {
        self.state
            .get(&(idx.clone(), capability))
            .map(|r| r.value().clone())
    }

    /// All accepted writes so far.
    pub async fn writes(&self) -> Vec<CapabilityWrite> {
        self.history.lock().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.history.lock().await.len()
    }
}

impl LocalPlatform for MemoryPlatform {
    async fn write_capability(
        &self,
        idx: &DeviceIdx,
        capability: Capability,
        value: &CapabilityValue,
    ) -> Result<(), PlatformError> {
        if self.rejected.contains(&capability) {
            return Err(PlatformError::new(format!("{capability} is read-only here")));
        }

        self.state.insert((idx.clone(), capability), value.clone());
        self.history.lock().await.push(CapabilityWrite {
            idx: idx.clone(),
            capability,
            value: value.clone(),
        });
        info!(idx = %idx, capability = %capability, value = %value, "capability updated");
        Ok(())
    }
}
