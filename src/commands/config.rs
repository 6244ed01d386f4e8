//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::Config;

/// Writes the default configuration to `output` (`-` for stdout).
pub fn command_config(output: Option<PathBuf>, format: ConfigFormat, commented: bool) -> anyhow::Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from(default_file_name(format)));

    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
        ConfigFormat::Toml => toml::to_string_pretty(&config)?,
        ConfigFormat::Yaml => {
            let content = serde_yaml::to_string(&config)?;
            if commented {
                add_config_comments(content)
            } else {
                content
            }
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "herakles-process-explorer.yaml",
        ConfigFormat::Json => "herakles-process-explorer.json",
        ConfigFormat::Toml => "herakles-process-explorer.toml",
    }
}

/// Prepends a commented key reference to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Process Explorer Configuration
# =======================================
#
# Refresh
# -------
# refresh_interval_ms: 1000    # Minimum time between snapshots
#
# Scanning
# --------
# proc_root: "/proc"           # procfs mount point
# max_processes: null          # Maximum processes to scan (null = all)
# max_modules: 1024            # Modules recorded per process
# parallel_scan: false         # Inspect processes on a thread pool
# parallelism: null            # Pool threads (null/0 = auto)
#
# Classification
# --------------
# signatures_file: null        # Extra engine/protection rules (TOML)
#
# View
# ----
# sort_by_memory: true         # false = sort by name
# filter: null                 # Case-insensitive name substring
#
# Testing
# -------
# test_data_file: null         # Synthetic process table (JSON)
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempdir().unwrap();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let path = dir.path().join(default_file_name(format));
            command_config(Some(path.clone()), format, true).unwrap();
            assert_eq!(load_config(Some(&path)).unwrap(), Config::default());
        }
    }
}
