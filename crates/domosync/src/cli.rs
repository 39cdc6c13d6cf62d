//! Clap derive structures for the `domosync` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// domosync -- keep hub devices in sync with a Domoticz server
#[derive(Debug, Parser)]
#[command(
    name = "domosync",
    version,
    about = "Keep hub devices in sync with a Domoticz server",
    long_about = "Pairs Domoticz devices with hub capabilities, polls their readings,\n\
        and forwards switch and set point changes back to the server.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "DOMOSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Domoticz host, IP, or base URL (overrides profile)
    #[arg(long, env = "DOMOSYNC_HOST", global = true)]
    pub host: Option<String>,

    /// Domoticz port (overrides profile)
    #[arg(long, env = "DOMOSYNC_PORT", global = true)]
    pub port: Option<u16>,

    /// Username for website protection
    #[arg(long, short = 'u', env = "DOMOSYNC_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for website protection
    #[arg(long, env = "DOMOSYNC_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DOMOSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DOMOSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DOMOSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one record per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the server address and credentials
    Validate(ValidateArgs),

    /// List server devices that can be paired
    Discover(DiscoverArgs),

    /// List paired devices and their capabilities
    #[command(alias = "dev")]
    Devices,

    /// Show decoded capability values from the server
    Readings(ReadingsArgs),

    /// Switch a device on or off
    Switch(SwitchArgs),

    /// Change a thermostat set point
    Setpoint(SetpointArgs),

    /// Run the bridge for all paired devices until interrupted
    Run,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Store the connection settings in the active profile
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Pair every candidate into the active profile
    #[arg(long)]
    pub pair: bool,
}

#[derive(Debug, Args)]
pub struct ReadingsArgs {
    /// Only this device
    pub idx: Option<String>,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Device idx
    pub idx: String,

    /// Target state
    pub state: SwitchArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchArg {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct SetpointArgs {
    /// Device idx
    pub idx: String,

    /// Target temperature
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
