//! Per-process record types produced by a snapshot build.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default engine label when no engine signature matched.
pub const UNKNOWN_ENGINE: &str = "Unknown";
/// Default protection label when no protection signature matched.
pub const NO_PROTECTION: &str = "None";

/// Image bitness, or a classification sentinel that replaces it.
///
/// `Kernel` and `Pseudo` are not real architectures: they mark processes the
/// classifier recognised as kernel or pseudo processes and always sort after
/// every real architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x64")]
    X64,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "arm")]
    Arm,
    #[default]
    Unknown,
    #[serde(rename = "K")]
    Kernel,
    #[serde(rename = "P")]
    Pseudo,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X64 => "x64",
            Architecture::X86 => "x86",
            Architecture::Arm64 => "arm64",
            Architecture::Arm => "arm",
            Architecture::Unknown => "Unknown",
            Architecture::Kernel => "K",
            Architecture::Pseudo => "P",
        }
    }

    /// True for the `K` / `P` classification sentinels.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Architecture::Kernel | Architecture::Pseudo)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the inspector could open the process for querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Full,
    #[default]
    Partial,
}

/// One entry per live process at scan time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub memory_usage_bytes: u64,
    #[serde(default)]
    pub thread_count: u32,
    #[serde(default)]
    pub architecture: Architecture,
    #[serde(default)]
    pub is_elevated: bool,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_protection")]
    pub protection: String,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub image_base: u64,
    #[serde(default)]
    pub entry_point: u64,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub kernel_thread: bool,
    #[serde(default)]
    pub access: Access,
}

fn default_engine() -> String {
    UNKNOWN_ENGINE.to_string()
}

fn default_protection() -> String {
    NO_PROTECTION.to_string()
}

impl ProcessRecord {
    /// Record with only the enumeration fields populated; everything else at
    /// its documented default.
    pub fn partial(pid: u32, name: impl Into<String>, thread_count: u32) -> Self {
        Self {
            pid,
            name: name.into(),
            full_path: String::new(),
            memory_usage_bytes: 0,
            thread_count,
            architecture: Architecture::Unknown,
            is_elevated: false,
            engine: default_engine(),
            protection: default_protection(),
            modules: Vec::new(),
            image_base: 0,
            entry_point: 0,
            start_time: None,
            kernel_thread: false,
            access: Access::Partial,
        }
    }

    pub fn memory_mb(&self) -> u64 {
        self.memory_usage_bytes / 1024 / 1024
    }
}
