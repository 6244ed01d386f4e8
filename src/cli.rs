//! CLI arguments and subcommands for herakles-process-explorer.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for process listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Sort order selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Memory,
    Name,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-process-explorer",
    about = "Process explorer with engine and protection classification",
    long_about = "Process explorer with engine and protection classification.\n\n\
                  Takes point-in-time snapshots of the Linux process table from procfs: \
                  memory, threads, architecture, elevation and loaded modules, with heuristic \
                  detection of kernel/pseudo processes, game engines and anti-tamper protections.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides config, default: warn)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// procfs mount point to read from
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Additional signatures file (TOML), appended after the built-in rules
    #[arg(long)]
    pub signatures_file: Option<PathBuf>,

    /// Inspect processes in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Parallel processing threads (0 = auto)
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Maximum number of processes to scan
    #[arg(long)]
    pub max_processes: Option<usize>,

    /// Maximum number of modules recorded per process
    #[arg(long)]
    pub max_modules: Option<usize>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Take one snapshot and print it
    List {
        /// Case-insensitive substring filter on the process name
        #[arg(short = 'f', long)]
        filter: Option<String>,

        /// Sort order
        #[arg(short = 's', long, value_enum)]
        sort: Option<SortArg>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Show only the first N rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Refresh periodically and print each new snapshot
    Watch {
        /// Case-insensitive substring filter on the process name
        #[arg(short = 'f', long)]
        filter: Option<String>,

        /// Sort order
        #[arg(short = 's', long, value_enum)]
        sort: Option<SortArg>,

        /// Refresh interval in milliseconds (overrides config)
        #[arg(short = 'i', long)]
        interval_ms: Option<u64>,

        /// Stop after this many snapshots
        #[arg(long)]
        frames: Option<u64>,

        /// Show only the first N rows per frame
        #[arg(short = 'n', long, default_value_t = 25)]
        limit: usize,

        /// Keep following this pid across refreshes
        #[arg(long)]
        select: Option<u32>,
    },

    /// Show the full record of one process
    Inspect {
        /// Process id
        pid: u32,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// List classification rules
    Signatures {
        /// Show matching patterns
        #[arg(long)]
        verbose: bool,
    },

    /// Validate configuration and system requirements
    Check {
        /// Check /proc filesystem
        #[arg(long)]
        proc: bool,

        /// Check privileges
        #[arg(long)]
        privileges: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate synthetic test data JSON file
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "testdata.json")]
        output: PathBuf,

        /// Number of ordinary processes to generate
        #[arg(long, default_value_t = 24)]
        count: usize,

        /// Include Windows-style kernel and pseudo processes
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        with_system: bool,
    },
}
