//! Process sources: where a snapshot build gets its processes from.
//!
//! `ProcfsSource` reads the live system. `FixtureSource` serves synthetic
//! records, either built in code or loaded from a JSON test data file, so the
//! builder, view and scheduler can be exercised without a real process table.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::FixtureError;
use crate::process::inspector::{inspect_process, InspectOptions};
use crate::process::modules::DEFAULT_MAX_MODULES;
use crate::process::record::ProcessRecord;
use crate::process::scanner::{enumerate_processes, ProcEntry};
use crate::process::stat::read_boot_time;

/// Enumerate-then-inspect access to a process table.
pub trait ProcessSource: Send + Sync {
    /// One pass over the processes that exist right now.
    fn enumerate(&self) -> Box<dyn Iterator<Item = ProcEntry> + '_>;

    /// Builds the record of one enumerated process. Never fails: anything
    /// that cannot be read is left at its default.
    fn inspect(&self, entry: &ProcEntry) -> ProcessRecord;

    /// Called once before each build pass.
    fn begin_scan(&self) {}

    fn describe(&self) -> String;
}

/// Options for the live procfs source.
#[derive(Debug, Clone)]
pub struct ProcfsOptions {
    pub root: PathBuf,
    pub max_modules: usize,
    pub max_processes: Option<usize>,
}

impl Default for ProcfsOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/proc"),
            max_modules: DEFAULT_MAX_MODULES,
            max_processes: None,
        }
    }
}

/// Live process table read from procfs.
#[derive(Debug)]
pub struct ProcfsSource {
    options: ProcfsOptions,
    boot_time: Option<i64>,
}

impl ProcfsSource {
    pub fn new(options: ProcfsOptions) -> Self {
        let boot_time = match read_boot_time(&options.root) {
            Ok(t) => Some(t),
            Err(e) => {
                debug!("Boot time unavailable, start times disabled: {}", e);
                None
            }
        };
        Self { options, boot_time }
    }

    pub fn root(&self) -> &Path {
        &self.options.root
    }

    fn inspect_options(&self) -> InspectOptions {
        InspectOptions {
            max_modules: self.options.max_modules,
            boot_time: self.boot_time,
        }
    }
}

impl ProcessSource for ProcfsSource {
    fn enumerate(&self) -> Box<dyn Iterator<Item = ProcEntry> + '_> {
        Box::new(enumerate_processes(&self.options.root, self.options.max_processes))
    }

    fn inspect(&self, entry: &ProcEntry) -> ProcessRecord {
        inspect_process(entry, &self.inspect_options())
    }

    fn describe(&self) -> String {
        format!("procfs at {}", self.options.root.display())
    }
}

/// Root structure for test data JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestData {
    pub version: String,
    pub generated_at: String,
    pub processes: Vec<ProcessRecord>,
}

impl TestData {
    pub fn new(processes: Vec<ProcessRecord>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            processes,
        }
    }
}

/// Load test data from JSON file.
pub fn load_test_data_from_file(path: &Path) -> Result<TestData, FixtureError> {
    debug!("Loading test data from: {}", path.display());

    if !path.exists() {
        return Err(FixtureError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let test_data: TestData = serde_json::from_str(&content)?;

    info!(
        "Loaded test data version {} from {}",
        test_data.version, test_data.generated_at
    );

    Ok(test_data)
}

/// Synthetic process table.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    records: Vec<ProcessRecord>,
}

impl FixtureSource {
    pub fn new(records: Vec<ProcessRecord>) -> Self {
        Self { records }
    }

    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        Ok(Self::new(load_test_data_from_file(path)?.processes))
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }
}

impl ProcessSource for FixtureSource {
    fn enumerate(&self) -> Box<dyn Iterator<Item = ProcEntry> + '_> {
        Box::new(self.records.iter().map(|r| ProcEntry {
            pid: r.pid,
            name: r.name.clone(),
            thread_count: r.thread_count,
            kernel_thread: r.kernel_thread,
            proc_path: PathBuf::new(),
        }))
    }

    fn inspect(&self, entry: &ProcEntry) -> ProcessRecord {
        self.records
            .iter()
            .find(|r| r.pid == entry.pid)
            .cloned()
            .unwrap_or_else(|| ProcessRecord::partial(entry.pid, entry.name.clone(), entry.thread_count))
    }

    fn describe(&self) -> String {
        format!("fixture with {} processes", self.records.len())
    }
}
