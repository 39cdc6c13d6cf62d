//! `switch` / `setpoint`: push one capability change through the dispatcher.
//!
//! A device that is not paired gets a throwaway pairing carrying only the
//! capability being set, so any server idx can be driven directly.

use serde::Serialize;

use domosync_core::{
    Capability, CapabilityChange, CapabilityValue, DeviceClass, DeviceIdx, PairedDevice,
};

use crate::cli::{GlobalOpts, SetpointArgs, SwitchArg, SwitchArgs};
use crate::config::ProfileContext;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ControlResult {
    idx: DeviceIdx,
    capability: Capability,
    value: CapabilityValue,
    command: String,
}

pub async fn switch(
    ctx: &ProfileContext,
    args: SwitchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let value = CapabilityValue::Bool(args.state == SwitchArg::On);
    send(ctx, global, DeviceIdx::new(args.idx), Capability::OnOff, value).await
}

pub async fn setpoint(
    ctx: &ProfileContext,
    args: SetpointArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !args.value.is_finite() {
        return Err(CliError::Validation {
            field: "value".into(),
            reason: "set point must be a finite number".into(),
        });
    }
    send(
        ctx,
        global,
        DeviceIdx::new(args.idx),
        Capability::TargetTemperature,
        CapabilityValue::Number(args.value),
    )
    .await
}

async fn send(
    ctx: &ProfileContext,
    global: &GlobalOpts,
    idx: DeviceIdx,
    capability: Capability,
    value: CapabilityValue,
) -> Result<(), CliError> {
    let device = ctx
        .profile
        .devices
        .iter()
        .find(|d| d.idx == idx)
        .cloned()
        .unwrap_or_else(|| {
            PairedDevice::new(
                idx.clone(),
                idx.to_string(),
                class_for(capability),
                [capability],
            )
        });

    let bridge = super::oneshot_bridge(ctx, global)?;
    bridge.add_device(device);
    bridge.start().await;
    let change = CapabilityChange::new(idx.clone()).with(capability, value.clone());
    let result = bridge.dispatch_now(change).await;
    bridge.stop().await;
    let report = result?;

    if let Some(failure) = report.failed.first() {
        return Err(CliError::CommandFailed {
            idx: idx.to_string(),
            message: failure.message.clone(),
        });
    }
    let Some(command) = report.sent.first() else {
        return Err(CliError::Unsupported {
            idx: idx.to_string(),
            capability: capability.to_string(),
        });
    };

    let result = ControlResult {
        idx,
        capability,
        value,
        command: command.to_string(),
    };
    let out = output::render_single(
        global.output,
        &result,
        |r| format!("Sent {} to device {}", r.command, r.idx),
        |r| r.command.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn class_for(capability: Capability) -> DeviceClass {
    match capability {
        Capability::OnOff | Capability::Dim => DeviceClass::Light,
        Capability::TargetTemperature => DeviceClass::Thermostat,
        _ => DeviceClass::Sensor,
    }
}
