//! Command dispatch: CLI args -> bridge operations -> output formatting.

pub mod control;
pub mod devices;
pub mod discover;
pub mod readings;
pub mod run;
pub mod validate;

use domosync_core::{Bridge, DomoticzClient, MemoryPlatform};

use crate::cli::{Command, GlobalOpts};
use crate::config::ProfileContext;
use crate::error::CliError;

/// The bridge every server-bound command runs against.
pub type CliBridge = Bridge<DomoticzClient, MemoryPlatform>;

/// Dispatch a profile-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    mut ctx: ProfileContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Validate(args) => validate::handle(&mut ctx, &args, global).await,
        Command::Discover(args) => discover::handle(&mut ctx, &args, global).await,
        Command::Devices => devices::handle(&ctx, global),
        Command::Readings(args) => readings::handle(&ctx, args, global).await,
        Command::Switch(args) => control::switch(&ctx, args, global).await,
        Command::Setpoint(args) => control::setpoint(&ctx, args, global).await,
        Command::Run => run::handle(&ctx, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}

/// Connect to the profile's server with a bridge that has no poll timer.
pub fn oneshot_bridge(ctx: &ProfileContext, global: &GlobalOpts) -> Result<CliBridge, CliError> {
    let client = ctx.connection_config(global)?.connect()?;
    Ok(Bridge::new(
        ctx.oneshot_bridge_config(),
        client,
        MemoryPlatform::new(),
    ))
}
