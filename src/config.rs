//! Configuration management for herakles-process-explorer.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use herakles_process_explorer::process::DEFAULT_MAX_MODULES;
use herakles_process_explorer::view::SortMode;
use herakles_process_explorer::ProcfsOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Default config file locations, searched in order when no path is given.
const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/herakles/process-explorer.yaml",
    "/etc/herakles/process-explorer.yml",
    "/etc/herakles/process-explorer.json",
    "./herakles-process-explorer.yaml",
    "./herakles-process-explorer.yml",
    "./herakles-process-explorer.json",
];

/// Explorer configuration. Every field is optional so a partial file only
/// overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Refresh
    #[serde(alias = "refresh-interval-ms")]
    pub refresh_interval_ms: Option<u64>,

    // Scanning
    #[serde(alias = "max-modules")]
    pub max_modules: Option<usize>,
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,
    #[serde(alias = "parallel-scan")]
    pub parallel_scan: Option<bool>,
    pub parallelism: Option<usize>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Classification
    /// Extra rules appended after the built-in signatures
    #[serde(alias = "signatures-file")]
    pub signatures_file: Option<PathBuf>,

    // View
    #[serde(alias = "sort-by-memory")]
    pub sort_by_memory: Option<bool>,
    pub filter: Option<String>,

    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: Some(DEFAULT_REFRESH_INTERVAL_MS),
            max_modules: Some(DEFAULT_MAX_MODULES),
            max_processes: None,
            parallel_scan: Some(false),
            parallelism: None,
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            signatures_file: None,
            sort_by_memory: Some(true),
            filter: None,
            test_data_file: None,
            log_level: Some("warn".into()),
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.unwrap_or(DEFAULT_REFRESH_INTERVAL_MS))
    }

    pub fn sort_mode(&self) -> SortMode {
        if self.sort_by_memory.unwrap_or(true) {
            SortMode::Memory
        } else {
            SortMode::Name
        }
    }

    pub fn procfs_options(&self) -> ProcfsOptions {
        ProcfsOptions {
            root: self
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            max_modules: self.max_modules.unwrap_or(DEFAULT_MAX_MODULES),
            max_processes: self.max_processes,
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.refresh_interval_ms == Some(0) {
        return Err("refresh_interval_ms must be greater than 0".into());
    }

    if cfg.max_modules == Some(0) {
        return Err("max_modules must be greater than 0".into());
    }

    if cfg.max_processes == Some(0) {
        return Err("max_processes must be greater than 0 when set".into());
    }

    if let Some(path) = &cfg.signatures_file {
        if !path.exists() {
            return Err(format!("Signatures file not found: {}", path.display()).into());
        }
    }

    if let Some(path) = &cfg.test_data_file {
        if !path.exists() {
            return Err(format!("Test data file not found: {}", path.display()).into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        let known = ["off", "error", "warn", "info", "debug", "trace"];
        if !known.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}', expected one of: {}",
                level,
                known.join(", ")
            )
            .into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(path) = &args.signatures_file {
        config.signatures_file = Some(path.clone());
    }
    if args.parallel {
        config.parallel_scan = Some(true);
    }
    if args.parallelism.is_some() {
        config.parallelism = args.parallelism;
    }
    if args.max_processes.is_some() {
        config.max_processes = args.max_processes;
    }
    if args.max_modules.is_some() {
        config.max_modules = args.max_modules;
    }

    // Test data file: CLI wins if provided
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
    }

    Ok(config)
}

/// Loads a config file. Without an explicit path the default locations are
/// searched; if none exists the defaults are used. Keys missing from the file
/// fall back to their defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)?;

    let loaded: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            config
        }
        Some("toml") => {
            let config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            config
        }
        _ => {
            // Default to YAML
            let config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            config
        }
    };

    Ok(merge_over_defaults(loaded))
}

fn merge_over_defaults(file: Config) -> Config {
    let defaults = Config::default();
    Config {
        refresh_interval_ms: file.refresh_interval_ms.or(defaults.refresh_interval_ms),
        max_modules: file.max_modules.or(defaults.max_modules),
        max_processes: file.max_processes.or(defaults.max_processes),
        parallel_scan: file.parallel_scan.or(defaults.parallel_scan),
        parallelism: file.parallelism.or(defaults.parallelism),
        proc_root: file.proc_root.or(defaults.proc_root),
        signatures_file: file.signatures_file.or(defaults.signatures_file),
        sort_by_memory: file.sort_by_memory.or(defaults.sort_by_memory),
        filter: file.filter.or(defaults.filter),
        test_data_file: file.test_data_file.or(defaults.test_data_file),
        log_level: file.log_level.or(defaults.log_level),
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}
