// ── Outbound command dispatcher ──
//
// Turns a local capability change into remote commands. Each writable
// capability becomes one command; commands are sent concurrently and
// succeed or fail independently. Nothing is retried.
//
// Every writable change is sent, even when the cache already holds the
// value. Changes to one device are dispatched one at a time so commands
// reach the server in the order they were made.

use std::sync::Arc;

use futures_util::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::decode;
use crate::error::CoreError;
use crate::model::{Capability, CapabilityValue, DeviceIdx};
use crate::registry::DeviceRegistry;
use crate::remote::{RemoteClient, RemoteCommand};

/// A batch of capability changes made on the hub for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityChange {
    pub idx: DeviceIdx,
    pub values: IndexMap<Capability, CapabilityValue>,
    /// Platform-specific options that came with the change (transition
    /// duration and the like). Logged, not forwarded.
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl CapabilityChange {
    pub fn new(idx: impl Into<DeviceIdx>) -> Self {
        Self {
            idx: idx.into(),
            values: IndexMap::new(),
            options: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, capability: Capability, value: impl Into<CapabilityValue>) -> Self {
        self.values.insert(capability, value.into());
        self
    }
}

/// A command the server rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchFailure {
    pub capability: Capability,
    pub message: String,
}

/// What happened to each capability of a change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub sent: Vec<RemoteCommand>,
    pub failed: Vec<DispatchFailure>,
    /// Read-only, not on the device, or the wrong value type.
    pub ignored: Vec<Capability>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

struct Pending {
    capability: Capability,
    command: RemoteCommand,
    value: CapabilityValue,
    previous: Option<CapabilityValue>,
}

/// Pushes local changes to the remote server.
pub struct Dispatcher<R> {
    remote: Arc<R>,
    registry: Arc<DeviceRegistry>,
}

impl<R: RemoteClient> Dispatcher<R> {
    pub fn new(remote: Arc<R>, registry: Arc<DeviceRegistry>) -> Self {
        Self { remote, registry }
    }

    /// Dispatch one change.
    ///
    /// Errors only when the device is not registered; per-command
    /// failures land in the report.
    pub async fn dispatch(&self, change: CapabilityChange) -> Result<DispatchReport, CoreError> {
        let device = self
            .registry
            .get(&change.idx)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: change.idx.to_string(),
            })?;
        let idx = device.idx().clone();
        if !change.options.is_empty() {
            debug!(idx = %idx, options = ?change.options, "change options ignored");
        }

        // Held until every command of this change has an answer.
        let _dispatch = device.lock_dispatch().await;

        let mut report = DispatchReport::default();
        let mut pending = Vec::new();

        // Record the new values first so the next poll does not bounce
        // them back before the server has applied the command.
        {
            let mut values = device.lock_values().await;
            for (capability, value) in change.values {
                if !device.has_capability(capability) {
                    report.ignored.push(capability);
                    continue;
                }
                let Some(command) = decode::encode(capability, &value) else {
                    report.ignored.push(capability);
                    continue;
                };
                let previous = values.insert(capability, value.clone());
                pending.push(Pending {
                    capability,
                    command,
                    value,
                    previous,
                });
            }
        }

        let mut sends = Vec::with_capacity(pending.len());
        for p in &pending {
            sends.push(self.remote.update_device(&p.command, &idx));
        }
        let results = join_all(sends).await;

        let mut rollback = Vec::new();
        for (p, result) in pending.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    info!(idx = %idx, command = %p.command, "command sent");
                    report.sent.push(p.command);
                }
                Err(e) => {
                    warn!(idx = %idx, command = %p.command, error = %e, "command failed");
                    report.failed.push(DispatchFailure {
                        capability: p.capability,
                        message: e.to_string(),
                    });
                    rollback.push(p);
                }
            }
        }

        // A failed command must not leave the cache claiming a value the
        // server never accepted.
        if !rollback.is_empty() {
            let mut values = device.lock_values().await;
            for p in rollback {
                if values.get(&p.capability) != Some(&p.value) {
                    continue;
                }
                match p.previous {
                    Some(previous) => values.insert(p.capability, previous),
                    None => values.remove(&p.capability),
                };
            }
        }

        Ok(report)
    }
}
