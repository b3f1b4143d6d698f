//! Clap derive structures for the `padwatch` CLI.
//!
//! Also compiled by build.rs for man page generation, so this file may
//! only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// padwatch -- keep Launchpad kiosks healthy
#[derive(Debug, Parser)]
#[command(
    name = "padwatch",
    version,
    about = "Watch a Launchpad fleet and soft-reset devices that stay unhealthy",
    long_about = "Evaluates every Launchpad in a fleet against a set of health conditions,\n\
        tracks how many consecutive checks each condition has held, and issues one\n\
        batched soft reset through the device-management gateway once a condition\n\
        has persisted long enough. Intended to be run on a timer.",
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
    /// Fleet profile to use
    #[arg(long, short = 'p', env = "PADWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "PADWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PADWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates on every remote endpoint
    #[arg(long, short = 'k', env = "PADWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile and defaults)
    #[arg(long, env = "PADWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Also write daily-rotated log files here (overrides profile log_dir)
    #[arg(long, env = "PADWATCH_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Unhealthy condition selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConditionArg {
    /// Device is offline, so its hub is unreachable
    NoHub,
    /// Device is online but has nothing docked
    NoDevices,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one evaluation cycle against the fleet
    Check(CheckArgs),

    /// Inspect or reset persisted debounce state
    #[command(alias = "st")]
    State(StateArgs),

    /// Query the display-name to serial mapping
    #[command(alias = "sn")]
    Serials(SerialsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Check ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Evaluate against a scratch copy of the state; never contact the gateway
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

// ── State ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommand,
}

#[derive(Debug, Subcommand)]
pub enum StateCommand {
    /// List every persisted (device, condition) record
    #[command(alias = "ls")]
    List,

    /// Forget a device's streak so the next check starts from scratch
    #[command(alias = "rm")]
    Clear {
        /// Device display name
        device: String,

        /// Only clear this condition (default: all)
        #[arg(long, short = 'c')]
        condition: Option<ConditionArg>,
    },
}

// ── Serials ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SerialsArgs {
    #[command(subcommand)]
    pub command: SerialsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SerialsCommand {
    /// Print the serial number mapped to a display name
    Lookup {
        /// Device display name
        name: String,
    },

    /// List every mapping in the serial file
    #[command(alias = "ls")]
    List,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Show the resolved configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
