//! `readings`: fetch descriptors and show what the decoder makes of them.
//!
//! Paired devices show their paired capability set; everything else shows
//! what discovery would map it to.

use serde::Serialize;
use tabled::Tabled;

use domosync_core::{
    Capability, CapabilityValue, DeviceDescriptor, DeviceFilter, DeviceIdx, RemoteClient, decode,
    mapper,
};

use crate::cli::{GlobalOpts, ReadingsArgs};
use crate::config::ProfileContext;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CapabilityReading {
    idx: DeviceIdx,
    name: String,
    paired: bool,
    capability: Capability,
    /// `None` when the descriptor lacks the field the capability needs.
    value: Option<CapabilityValue>,
    last_update: Option<String>,
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "IDX")]
    idx: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Capability")]
    capability: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Last Update")]
    last_update: String,
}

impl From<&CapabilityReading> for ReadingRow {
    fn from(r: &CapabilityReading) -> Self {
        let name = if r.paired {
            r.name.clone()
        } else {
            format!("{} (unpaired)", r.name)
        };
        Self {
            idx: r.idx.to_string(),
            name,
            capability: r.capability.to_string(),
            value: r.value.as_ref().map_or_else(|| "-".into(), ToString::to_string),
            last_update: r.last_update.clone().unwrap_or_default(),
        }
    }
}

fn line(r: &CapabilityReading) -> String {
    let value = r.value.as_ref().map_or_else(|| "-".into(), ToString::to_string);
    format!("{}\t{}\t{value}", r.idx, r.capability)
}

pub async fn handle(
    ctx: &ProfileContext,
    args: ReadingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = ctx.connection_config(global)?.connect()?;
    let filter = args
        .idx
        .as_deref()
        .map_or_else(DeviceFilter::all, DeviceFilter::by_idx);
    let descriptors = RemoteClient::find_devices(&client, &filter).await?;

    if let Some(idx) = args.idx {
        if descriptors.is_empty() {
            return Err(CliError::NotFound {
                resource_type: "device".into(),
                identifier: idx,
                list_command: "readings".into(),
            });
        }
    }

    let readings: Vec<CapabilityReading> = descriptors
        .iter()
        .flat_map(|d| readings_for(ctx, d))
        .collect();

    let out = output::render_list(global.output, &readings, |r| ReadingRow::from(r), line)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn readings_for(ctx: &ProfileContext, descriptor: &DeviceDescriptor) -> Vec<CapabilityReading> {
    let idx = DeviceIdx::new(descriptor.idx.as_str());
    let paired = ctx.profile.devices.iter().find(|d| d.idx == idx);

    let (name, capabilities) = match paired {
        Some(device) => (device.name.clone(), device.capabilities.clone()),
        None => (
            descriptor.name.clone().unwrap_or_default(),
            mapper::map_capabilities(descriptor),
        ),
    };

    capabilities
        .into_iter()
        .map(|capability| CapabilityReading {
            idx: idx.clone(),
            name: name.clone(),
            paired: paired.is_some(),
            capability,
            value: decode::decode(capability, descriptor),
            last_update: descriptor.last_update.clone(),
        })
        .collect()
}
