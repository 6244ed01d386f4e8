//! Process discovery, inspection and classification.
//!
//! This module provides:
//! - `scanner`: enumeration of the /proc listing
//! - `stat` / `status`: parsers for per-process procfs files
//! - `handle`: scoped query handle on a process image
//! - `elf` / `modules`: image header and loaded-module readers
//! - `inspector`: per-process attribute gathering
//! - `classifier`: kernel/pseudo/engine/protection heuristics
//! - `source`: live and synthetic process tables

pub mod classifier;
pub mod elf;
pub mod handle;
pub mod inspector;
pub mod modules;
pub mod record;
pub mod scanner;
pub mod source;
pub mod stat;
pub mod status;

// Re-export commonly used types
pub use classifier::{classify_process, Classification, SignatureRule, SignatureSet};
pub use inspector::{inspect_process, InspectOptions};
pub use modules::DEFAULT_MAX_MODULES;
pub use record::{Access, Architecture, ProcessRecord, NO_PROTECTION, UNKNOWN_ENGINE};
pub use scanner::{enumerate_processes, read_process_name, ProcEntry, ProcessEnumerator};
pub use source::{
    load_test_data_from_file, FixtureSource, ProcessSource, ProcfsOptions, ProcfsSource, TestData,
};
