//! CLI command implementations for herakles-process-explorer.
//!
//! This module provides implementations for all CLI subcommands:
//! - `list`: One snapshot, printed
//! - `watch`: Poll loop driven by the refresh scheduler
//! - `inspect`: Full record of one process
//! - `signatures`: Classification rule listing
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `generate`: Test data generation

pub mod check;
pub mod config;
pub mod generate;
pub mod inspect;
pub mod list;
pub mod output;
pub mod signatures;
pub mod watch;

use anyhow::{anyhow, Context};
use herakles_process_explorer::{
    BuildOptions, FixtureSource, ProcessSource, ProcfsSource, SignatureSet, SortMode,
};
use tracing::info;

use crate::cli::SortArg;
use crate::config::Config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use inspect::command_inspect;
pub use list::command_list;
pub use signatures::command_signatures;
pub use watch::command_watch;

/// Opens the process source named by the config: the test data file when
/// one is set, the live procfs otherwise.
pub fn open_source(config: &Config) -> anyhow::Result<Box<dyn ProcessSource>> {
    if let Some(path) = &config.test_data_file {
        let source = FixtureSource::from_file(path)
            .with_context(|| format!("Failed to load test data from {}", path.display()))?;
        info!("Using synthetic process table from {}", path.display());
        return Ok(Box::new(source));
    }
    Ok(Box::new(ProcfsSource::new(config.procfs_options())))
}

/// Built-in rules plus the configured signatures file.
pub fn load_signatures(config: &Config) -> anyhow::Result<SignatureSet> {
    SignatureSet::load_with_overrides(config.signatures_file.as_deref()).map_err(|e| anyhow!("{}", e))
}

pub fn build_options(config: &Config) -> BuildOptions {
    BuildOptions {
        parallel: config.parallel_scan.unwrap_or(false),
    }
}

/// CLI sort flag if given, config otherwise.
pub fn sort_mode(arg: Option<SortArg>, config: &Config) -> SortMode {
    match arg {
        Some(SortArg::Memory) => SortMode::Memory,
        Some(SortArg::Name) => SortMode::Name,
        None => config.sort_mode(),
    }
}
