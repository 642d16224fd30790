//! Clap derive structures for the `tailwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tailwatch -- spot devices that keep turning up around you
#[derive(Debug, Parser)]
#[command(
    name = "tailwatch",
    version,
    about = "Detect Wi-Fi and Bluetooth devices that may be following you",
    long_about = "Reads Kismet capture databases, tracks how often and how long each\n\
        device is seen, and flags devices that are both persistent and still\n\
        nearby. Optional WiGLE lookups place probed network names on a map.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "TAILWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Kismet capture database to read (overrides config)
    #[arg(long, short = 'd', env = "TAILWATCH_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TAILWATCH_OUTPUT",
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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

impl OutputFormat {
    /// JSON or YAML, i.e. meant for another program.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact | Self::Yaml)
    }
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one classification pass over the latest capture
    #[command(alias = "a")]
    Analyze(AnalyzeArgs),

    /// Re-run classification on an interval, reporting following candidates
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Show recorded positions for a device
    Track(TrackArgs),

    /// Look up network locations via WiGLE
    Geo(GeoArgs),

    /// Manage the deny list (devices excluded from analysis)
    Deny(DenyArgs),

    /// Manage the allowlist
    Allow(AllowArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Analysis ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Only list following candidates
    #[arg(long, short = 'f')]
    pub following_only: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Time between passes (e.g. 30s, 2m)
    #[arg(long, short = 'i', default_value = "30s", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Stop after this many passes
    #[arg(long, short = 'n')]
    pub passes: Option<u32>,
}

#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Device MAC address
    pub mac: String,
}

// ── Geo ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GeoArgs {
    #[command(subcommand)]
    pub command: GeoCommand,
}

#[derive(Debug, Subcommand)]
pub enum GeoCommand {
    /// Locate a network by SSID
    Lookup {
        /// Network name (matched exactly)
        ssid: String,
    },

    /// List networks within about a kilometre of a point
    Nearby {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
}

// ── Lists ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DenyArgs {
    #[command(subcommand)]
    pub command: DenyCommand,
}

#[derive(Debug, Subcommand)]
pub enum DenyCommand {
    /// Show denied devices
    #[command(alias = "ls")]
    List,

    /// Deny one or more devices
    Add {
        /// MAC addresses
        #[arg(required = true)]
        macs: Vec<String>,
    },

    /// Remove a device from the deny list
    #[command(alias = "rm")]
    Remove { mac: String },

    /// Empty the deny list
    Clear,

    /// Deny every device in the current capture
    Auto,
}

#[derive(Debug, Args)]
pub struct AllowArgs {
    #[command(subcommand)]
    pub command: AllowCommand,
}

#[derive(Debug, Subcommand)]
pub enum AllowCommand {
    /// Show allowed devices
    #[command(alias = "ls")]
    List,

    /// Allow one or more devices
    Add {
        /// MAC addresses
        #[arg(required = true)]
        macs: Vec<String>,
    },

    /// Remove a device from the allowlist
    #[command(alias = "rm")]
    Remove { mac: String },

    /// Empty the allowlist
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked)
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
