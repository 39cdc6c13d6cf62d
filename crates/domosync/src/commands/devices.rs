//! `devices`: list the paired devices of the active profile.

use tabled::Tabled;

use domosync_core::PairedDevice;

use crate::cli::GlobalOpts;
use crate::config::ProfileContext;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct PairedRow {
    #[tabled(rename = "IDX")]
    idx: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Capabilities")]
    capabilities: String,
    #[tabled(rename = "Hardware")]
    hardware: String,
}

impl From<&PairedDevice> for PairedRow {
    fn from(d: &PairedDevice) -> Self {
        Self {
            idx: d.idx.to_string(),
            name: d.name.clone(),
            class: d.class.to_string(),
            capabilities: d
                .capabilities
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            hardware: d.hardware_name.clone().unwrap_or_default(),
        }
    }
}

pub(crate) fn line(d: &PairedDevice) -> String {
    format!("{}\t{}", d.idx, d.name)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &ProfileContext, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        global.output,
        &ctx.profile.devices,
        |d| PairedRow::from(d),
        line,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
