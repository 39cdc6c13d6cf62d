// In-memory `RemoteClient` shared by the engine tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::json;
use tokio::sync::Notify;

use domosync_core::{
    Capability, CoreError, DeviceClass, DeviceDescriptor, DeviceFilter, DeviceIdx, PairedDevice,
    RemoteClient, RemoteCommand, VersionInfo,
};

/// One command as the server would have received it.
#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    pub name: String,
    pub idx: String,
    pub primary: String,
    pub secondary: Option<String>,
}

impl SentCommand {
    pub fn new(name: &str, idx: &str, primary: &str) -> Self {
        Self {
            name: name.into(),
            idx: idx.into(),
            primary: primary.into(),
            secondary: None,
        }
    }
}

#[derive(Default)]
pub struct FakeRemote {
    descriptors: Mutex<Vec<DeviceDescriptor>>,
    fail_fetch: AtomicBool,
    fail_credentials: AtomicBool,
    failing_commands: Mutex<HashSet<&'static str>>,
    sent: Mutex<Vec<SentCommand>>,
    fetches: AtomicUsize,
    /// When set, `find_devices` parks until the gate is notified.
    gate: Mutex<Option<Arc<Notify>>>,
    /// When set, the next `update_device` call parks until notified.
    command_gate: Mutex<Option<Arc<Notify>>>,
    commands_started: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_descriptors(&self, descriptors: Vec<DeviceDescriptor>) {
        *self.descriptors.lock().unwrap() = descriptors;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_credentials(&self, fail: bool) {
        self.fail_credentials.store(fail, Ordering::SeqCst);
    }

    pub fn fail_command(&self, name: &'static str) {
        self.failing_commands.lock().unwrap().insert(name);
    }

    pub fn recover_command(&self, name: &'static str) {
        self.failing_commands.lock().unwrap().remove(name);
    }

    pub fn hold_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_fetches(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    /// Park the next command until the returned gate is notified.
    pub fn hold_next_command(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.command_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Commands that reached the server, held or not.
    pub fn commands_started(&self) -> usize {
        self.commands_started.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent.lock().unwrap().clone()
    }
}

impl RemoteClient for FakeRemote {
    async fn find_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceDescriptor>, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(CoreError::Transport {
                message: "connection refused".into(),
                transient: true,
            });
        }
        let descriptors = self.descriptors.lock().unwrap().clone();
        Ok(descriptors
            .into_iter()
            .filter(|d| filter.idx.as_deref().is_none_or(|idx| d.idx == idx))
            .collect())
    }

    async fn update_device(&self, command: &RemoteCommand, idx: &DeviceIdx) -> Result<(), CoreError> {
        self.commands_started.fetch_add(1, Ordering::SeqCst);
        let gate = self.command_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing_commands.lock().unwrap().contains(command.name()) {
            return Err(CoreError::Api {
                message: format!("{} refused", command.name()),
            });
        }
        self.sent.lock().unwrap().push(SentCommand {
            name: command.name().into(),
            idx: idx.to_string(),
            primary: command.primary_arg(),
            secondary: command.secondary_arg(),
        });
        Ok(())
    }

    async fn check_credentials(&self) -> Result<VersionInfo, CoreError> {
        if self.fail_credentials.load(Ordering::SeqCst) {
            return Err(CoreError::AuthenticationFailed {
                message: "credentials rejected (HTTP 401)".into(),
            });
        }
        Ok(VersionInfo {
            status: "OK".into(),
            version: Some("2024.7".into()),
            revision: Some(16201),
            build_time: None,
        })
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

/// Build a descriptor from Domoticz-shaped JSON fields.
pub fn descriptor(idx: &str, last_update: &str, fields: serde_json::Value) -> DeviceDescriptor {
    let mut value = fields;
    value["idx"] = json!(idx);
    value["LastUpdate"] = json!(last_update);
    serde_json::from_value(value).unwrap()
}

pub fn gas_meter(idx: &str) -> PairedDevice {
    PairedDevice::new(
        idx,
        "Gas meter",
        DeviceClass::Sensor,
        [Capability::MeterGas, Capability::GasMeterCumulative],
    )
}

pub fn energy_meter(idx: &str) -> PairedDevice {
    PairedDevice::new(
        idx,
        "Energy meter",
        DeviceClass::Sensor,
        [
            Capability::MeasurePower,
            Capability::MeterPower,
            Capability::PowerMeterCumulativeHigh,
            Capability::PowerMeterCumulativeLow,
        ],
    )
}

pub fn lamp(idx: &str) -> PairedDevice {
    PairedDevice::new(idx, "Lamp", DeviceClass::Light, [Capability::OnOff])
}

pub fn thermostat(idx: &str) -> PairedDevice {
    PairedDevice::new(
        idx,
        "Thermostat",
        DeviceClass::Thermostat,
        [
            Capability::OnOff,
            Capability::TargetTemperature,
            Capability::MeasureTemperature,
        ],
    )
}
