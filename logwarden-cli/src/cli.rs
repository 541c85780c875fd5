//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O. Values that need domain
//! validation (dialect names, paths) are kept as strings/paths here and
//! checked by the command handlers.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logwarden -- web/application log analyzer and security monitor.
///
/// Use `logwarden <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logwarden", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logwarden.toml configuration file.
    #[arg(short, long, default_value = "logwarden.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a complete log file and print a report.
    Analyze(AnalyzeArgs),

    /// Follow a growing log file until interrupted (Ctrl-C).
    Monitor(MonitorArgs),

    /// Inspect or validate suspicious-pattern sets.
    Patterns(PatternsArgs),

    /// List the supported log dialects and the fields each one fills.
    Dialects,

    /// Manage configuration.
    Config(ConfigArgs),
}

/// Session options shared by `analyze` and `monitor`.
///
/// Each flag overrides the matching `[analyzer]` config value.
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Log dialect (apache, nginx, application, generic).
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// YAML file with suspicious patterns (replaces the built-in set).
    #[arg(long)]
    pub patterns: Option<PathBuf>,

    /// Write the structured JSON document to this path when finished.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Error responses from one address before it is blacklisted.
    #[arg(long)]
    pub error_threshold: Option<u64>,
}

// ---- analyze ----

/// Analyze a complete log file.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Log file to analyze.
    pub file: PathBuf,

    #[command(flatten)]
    pub session: SessionArgs,
}

// ---- monitor ----

/// Follow a growing log file.
#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Log file to follow (read from its current end).
    pub file: PathBuf,

    #[command(flatten)]
    pub session: SessionArgs,

    /// Poll interval in milliseconds when no new data is available.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

// ---- patterns ----

/// Inspect or validate suspicious-pattern sets.
#[derive(Args, Debug)]
pub struct PatternsArgs {
    #[command(subcommand)]
    pub action: PatternsAction,
}

#[derive(Subcommand, Debug)]
pub enum PatternsAction {
    /// List the active pattern set (file from config, or the built-in set).
    List {
        /// List this YAML file instead of the configured set.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Validate a pattern YAML file without running an analysis.
    Validate {
        /// YAML pattern file.
        path: PathBuf,
    },
}

// ---- config ----

/// Manage logwarden configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, analyzer).
        #[arg(long)]
        section: Option<String>,
    },
}
