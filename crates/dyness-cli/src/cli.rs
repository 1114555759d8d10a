// Command-line interface definition (clap derive).

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "dyness",
    version,
    about = "Monitor Dyness battery-storage systems from the cloud API",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand. Flags override profile values.
#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile name from the config file.
    #[arg(long, short = 'p', global = true)]
    pub profile: Option<String>,

    /// Dyness open API ID.
    #[arg(long, global = true, env = "DYNESS_API_ID")]
    pub api_id: Option<String>,

    /// Dyness open API secret.
    #[arg(long, global = true, env = "DYNESS_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// BMS serial number.
    #[arg(long, global = true, env = "DYNESS_SN_BMS")]
    pub sn_bms: Option<String>,

    /// Dongle serial number.
    #[arg(long, global = true, env = "DYNESS_SN_DONGLE")]
    pub sn_dongle: Option<String>,

    /// Module serial number (auto-discovered when omitted).
    #[arg(long, global = true)]
    pub sn_module: Option<String>,

    /// Cloud region: global or apac.
    #[arg(long, global = true, env = "DYNESS_REGION")]
    pub region: Option<String>,

    /// Output format.
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate credentials and connectivity with a single API call.
    Verify,

    /// Run one refresh cycle and print the merged snapshot.
    Snapshot,

    /// Poll on a fixed interval and print readings each cycle.
    Watch(WatchArgs),

    /// List the known readings (id, name, unit, kind).
    Readings,

    /// Configuration helpers.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (default: profile value or 300).
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path.
    Path,

    /// Print the loaded configuration (secrets redacted).
    Show,

    /// Store the API secret for a profile in the system keyring
    /// (reads one line from stdin).
    SetSecret,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
