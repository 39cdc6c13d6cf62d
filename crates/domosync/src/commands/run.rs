//! `run`: keep the paired devices in sync until Ctrl-C.
//!
//! The local side is a `MemoryPlatform`, so capability writes show up in
//! the log (`-v`) and in the per-cycle summary line.

use std::sync::Arc;

use tracing::{info, warn};

use domosync_core::{Bridge, MemoryPlatform, SyncOutcome, SyncReport};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::ProfileContext;
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &ProfileContext, global: &GlobalOpts) -> Result<(), CliError> {
    if ctx.profile.devices.is_empty() {
        return Err(CliError::NoPairedDevices {
            profile: ctx.name.clone(),
        });
    }

    let client = ctx.connection_config(global)?.connect()?;
    let config = ctx.bridge_config();
    let bridge = Bridge::new(config.clone(), client, MemoryPlatform::new());
    for paired in &ctx.profile.devices {
        bridge.add_device(paired.clone());
    }

    let mut reports = bridge.last_sync();
    bridge.start().await;
    info!(
        profile = %ctx.name,
        devices = ctx.profile.devices.len(),
        interval_secs = config.poll_interval.as_secs(),
        "bridge running, press Ctrl-C to stop"
    );

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal,
            changed = reports.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let report = reports.borrow_and_update().clone();
                if let Some(report) = report {
                    print_report(&report, global)?;
                }
            }
        }
    };

    bridge.stop().await;
    if let Err(e) = outcome {
        warn!(error = %e, "could not listen for Ctrl-C");
    }
    Ok(())
}

fn print_report(report: &Arc<SyncReport>, global: &GlobalOpts) -> Result<(), CliError> {
    let line = match global.output {
        OutputFormat::Json => serde_json::to_string(report.as_ref())?,
        OutputFormat::Table | OutputFormat::Plain => summary(report),
    };
    output::print_output(&line, global.quiet);
    Ok(())
}

fn summary(report: &SyncReport) -> String {
    let at = report
        .completed_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();
    match &report.outcome {
        SyncOutcome::Completed => format!(
            "{at} matched={} stale={} writes={} errors={}",
            report.devices_matched,
            report.devices_stale,
            report.writes,
            report.write_errors.len()
        ),
        SyncOutcome::SkippedEmpty => format!("{at} no devices registered"),
        SyncOutcome::SkippedBusy => format!("{at} skipped, previous cycle still running"),
        SyncOutcome::FetchFailed(error) => format!("{at} fetch failed: {error}"),
    }
}
