// ── Device state synchronizer ──
//
// One poll cycle: fetch every descriptor, match them against the
// registry, skip descriptors whose freshness marker was already
// processed, decode each capability, and write values that changed.
// Cycles are single-flight per synchronizer; an overlapping call
// returns `SkippedBusy` instead of issuing a second fetch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domosync_api::{DeviceDescriptor, DeviceFilter};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::decode;
use crate::model::{Capability, DeviceIdx, ManagedDevice};
use crate::platform::LocalPlatform;
use crate::registry::DeviceRegistry;
use crate::remote::RemoteClient;

// ── Reports ─────────────────────────────────────────────────────────

/// How a poll cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "error", rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    /// Nothing registered, so nothing was fetched.
    SkippedEmpty,
    /// Another cycle was still running.
    SkippedBusy,
    /// The fetch failed; no state was touched.
    FetchFailed(String),
}

/// A local write that the platform rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub idx: DeviceIdx,
    pub capability: Capability,
    pub message: String,
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// Descriptors that matched a registered device.
    pub devices_matched: usize,
    /// Matched descriptors skipped because their marker was already seen.
    pub devices_stale: usize,
    pub writes: usize,
    pub write_errors: Vec<WriteFailure>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    fn new(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            devices_matched: 0,
            devices_stale: 0,
            writes: 0,
            write_errors: Vec::new(),
            completed_at: None,
        }
    }

    fn finish(mut self) -> Self {
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == SyncOutcome::Completed
    }
}

// ── Synchronizer ────────────────────────────────────────────────────

/// Pulls remote state into the local platform.
pub struct Synchronizer<R, P> {
    remote: Arc<R>,
    platform: Arc<P>,
    registry: Arc<DeviceRegistry>,
    in_flight: Mutex<()>,
}

impl<R: RemoteClient, P: LocalPlatform> Synchronizer<R, P> {
    pub fn new(remote: Arc<R>, platform: Arc<P>, registry: Arc<DeviceRegistry>) -> Self {
        Self {
            remote,
            platform,
            registry,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one cycle. Never fails; problems are carried in the report.
    pub async fn poll_once(&self) -> SyncReport {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("previous poll still running, skipping tick");
            return SyncReport::new(SyncOutcome::SkippedBusy);
        };

        // Stable view for the whole cycle.
        let snapshot = self.registry.all();
        if snapshot.is_empty() {
            trace!("no devices registered, skipping poll");
            return SyncReport::new(SyncOutcome::SkippedEmpty).finish();
        }
        let devices: HashMap<DeviceIdx, Arc<ManagedDevice>> = snapshot
            .iter()
            .map(|d| (d.idx().clone(), Arc::clone(d)))
            .collect();

        let descriptors = match self.remote.find_devices(&DeviceFilter::all()).await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "device poll failed");
                return SyncReport::new(SyncOutcome::FetchFailed(e.to_string())).finish();
            }
        };
        debug!(
            descriptors = descriptors.len(),
            registered = devices.len(),
            "poll fetched"
        );

        let mut report = SyncReport::new(SyncOutcome::Completed);
        for descriptor in &descriptors {
            let idx = DeviceIdx::new(descriptor.idx.as_str());
            let Some(device) = devices.get(&idx) else {
                continue;
            };
            // Removed since the snapshot was taken.
            if !self.registry.contains(&idx) {
                continue;
            }
            report.devices_matched += 1;
            self.apply(device, descriptor, &mut report).await;
        }

        debug!(
            matched = report.devices_matched,
            stale = report.devices_stale,
            writes = report.writes,
            errors = report.write_errors.len(),
            "poll complete"
        );
        report.finish()
    }

    /// Decode one descriptor into one device.
    async fn apply(
        &self,
        device: &ManagedDevice,
        descriptor: &DeviceDescriptor,
        report: &mut SyncReport,
    ) {
        let idx = device.idx();
        let marker = descriptor.last_update.as_deref();

        if marker.is_some() && self.registry.freshness(idx).as_deref() == marker {
            trace!(idx = %idx, marker = ?marker, "descriptor unchanged");
            report.devices_stale += 1;
            return;
        }

        {
            let mut values = device.lock_values().await;
            for &capability in device.capabilities() {
                let Some(value) = decode::decode(capability, descriptor) else {
                    trace!(idx = %idx, capability = %capability, "no value in descriptor");
                    continue;
                };
                if values.get(&capability) == Some(&value) {
                    continue;
                }

                match self
                    .platform
                    .write_capability(idx, capability, &value)
                    .await
                {
                    Ok(()) => {
                        values.insert(capability, value);
                        report.writes += 1;
                    }
                    Err(e) => {
                        warn!(idx = %idx, capability = %capability, error = %e, "capability write failed");
                        report.write_errors.push(WriteFailure {
                            idx: idx.clone(),
                            capability,
                            message: e.message,
                        });
                    }
                }
            }
        }

        if let Some(marker) = marker {
            self.registry.commit_freshness(idx, marker.to_owned());
        }
    }
}
