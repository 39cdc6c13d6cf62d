// ── Device registry ──
//
// Concurrent map from remote identifier to managed device, plus the
// dedup markers the synchronizer keeps per device. Every mutation
// rebuilds a snapshot that subscribers receive over a `watch` channel,
// so a poll cycle can iterate a stable view while devices come and go.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{DeviceIdx, ManagedDevice};

/// The set of devices one bridge keeps in sync.
///
/// Only device lifecycle events (`add` / `remove`) change membership.
/// The freshness markers are written by the synchronizer through
/// `commit_freshness`, which refuses to resurrect a removed device.
pub struct DeviceRegistry {
    devices: DashMap<DeviceIdx, Arc<ManagedDevice>>,

    /// Last `LastUpdate` value processed per device.
    markers: DashMap<DeviceIdx, String>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<ManagedDevice>>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            devices: DashMap::new(),
            markers: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace a device. Returns `true` if the identifier was new.
    ///
    /// Replacing a device starts it over with an empty cache and no
    /// freshness marker, so the next poll writes every capability.
    pub fn add(&self, device: ManagedDevice) -> bool {
        let idx = device.idx().clone();
        let is_new = self.devices.insert(idx.clone(), Arc::new(device)).is_none();
        if !is_new {
            self.markers.remove(&idx);
        }
        self.rebuild_snapshot();
        is_new
    }

    /// Remove a device and its freshness marker. Returns the removed device.
    pub fn remove(&self, idx: &DeviceIdx) -> Option<Arc<ManagedDevice>> {
        let removed = self.devices.remove(idx).map(|(_, device)| device);
        self.markers.remove(idx);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub fn get(&self, idx: &DeviceIdx) -> Option<Arc<ManagedDevice>> {
        self.devices.get(idx).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, idx: &DeviceIdx) -> bool {
        self.devices.contains_key(idx)
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn all(&self) -> Arc<Vec<Arc<ManagedDevice>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<ManagedDevice>>>> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn keys(&self) -> Vec<DeviceIdx> {
        self.devices.iter().map(|r| r.key().clone()).collect()
    }

    // ── Freshness markers ────────────────────────────────────────────

    pub(crate) fn freshness(&self, idx: &DeviceIdx) -> Option<String> {
        self.markers.get(idx).map(|r| r.value().clone())
    }

    /// Record that the descriptor carrying `marker` has been processed.
    ///
    /// The device entry is held while the marker is written, so a
    /// concurrent `remove` either runs first (and nothing is stored) or
    /// runs after (and drops the marker with the device).
    pub(crate) fn commit_freshness(&self, idx: &DeviceIdx, marker: String) -> bool {
        let Some(_entry) = self.devices.get(idx) else {
            return false;
        };
        self.markers.insert(idx.clone(), marker);
        true
    }

    #[cfg(test)]
    pub(crate) fn marker_count(&self) -> usize {
        self.markers.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<ManagedDevice>> =
            self.devices.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| a.idx().cmp(b.idx()));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.devices.len())
            .field("markers", &self.markers.len())
            .finish()
    }
}
