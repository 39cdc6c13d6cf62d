//! `discover`: list pairing candidates and optionally pair them.

use crate::cli::{DiscoverArgs, GlobalOpts};
use crate::config::ProfileContext;
use crate::error::CliError;
use crate::output;

use super::devices::{PairedRow, line};

pub async fn handle(
    ctx: &mut ProfileContext,
    args: &DiscoverArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bridge = super::oneshot_bridge(ctx, global)?;
    for paired in &ctx.profile.devices {
        bridge.add_device(paired.clone());
    }

    let candidates = bridge.discover().await?;
    let out = output::render_list(global.output, &candidates, |d| PairedRow::from(d), line)?;
    output::print_output(&out, global.quiet);

    if args.pair {
        let added = ctx.profile.pair_devices(candidates);
        let path = ctx.save()?;
        output::print_status(
            &format!(
                "Paired {added} device(s) into profile '{}' ({})",
                ctx.name,
                path.display()
            ),
            global.quiet,
        );
    } else if candidates.is_empty() {
        output::print_status("No new devices found", global.quiet);
    }
    Ok(())
}
