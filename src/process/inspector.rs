//! Per-process attribute gathering.
//!
//! `inspect_process` acquires a query handle and then fetches each attribute
//! on its own: a failed read leaves that field at its default and never
//! blocks the others. Without a handle only the enumeration fields are set.
//! Access denial is the normal outcome for many processes, so failures are
//! logged at debug level only.

use std::path::Path;
use tracing::debug;

use crate::error::ProcfsError;
use crate::process::handle::ProcessHandle;
use crate::process::modules::{read_modules, DEFAULT_MAX_MODULES};
use crate::process::record::{Access, ProcessRecord};
use crate::process::scanner::ProcEntry;
use crate::process::stat::{read_stat, start_time_from_ticks, CLK_TCK};
use crate::process::status::read_status;

/// Length of a full `comm` value; longer names are cut to this.
const TASK_COMM_VISIBLE_LEN: usize = 15;

#[derive(Debug, Clone, Copy)]
pub struct InspectOptions {
    pub max_modules: usize,
    /// System boot time (epoch seconds); start times stay unset without it.
    pub boot_time: Option<i64>,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            max_modules: DEFAULT_MAX_MODULES,
            boot_time: None,
        }
    }
}

fn log_miss(pid: u32, what: &str, err: &ProcfsError) {
    debug!("pid {}: {} unavailable: {}", pid, what, err);
}

/// Builds the record for one enumerated process.
pub fn inspect_process(entry: &ProcEntry, opts: &InspectOptions) -> ProcessRecord {
    let mut record = ProcessRecord::partial(entry.pid, entry.name.clone(), entry.thread_count);
    record.kernel_thread = entry.kernel_thread;

    let mut handle = match ProcessHandle::open(entry.pid, &entry.proc_path) {
        Ok(handle) => handle,
        Err(e) => {
            if e.is_permission_denied() {
                debug!("pid {} ({}): access denied, partial record", entry.pid, entry.name);
            } else {
                log_miss(entry.pid, "query handle", &e);
            }
            return record;
        }
    };
    record.access = Access::Full;

    match handle.executable_path() {
        Ok(path) => {
            if let Some(name) = untruncated_name(&entry.name, &path) {
                record.name = name;
            }
            record.full_path = path.to_string_lossy().into_owned();
        }
        Err(e) => log_miss(entry.pid, "executable path", &e),
    }

    match read_status(handle.proc_path()) {
        Ok(status) => {
            record.memory_usage_bytes = status.vm_rss_bytes.unwrap_or(0);
            record.is_elevated = status.is_elevated();
        }
        Err(e) => log_miss(entry.pid, "status", &e),
    }

    let header = handle.image_header();
    match &header {
        Ok(hdr) => record.architecture = hdr.architecture(),
        Err(e) => log_miss(entry.pid, "image header", e),
    }

    match read_modules(handle.proc_path(), opts.max_modules) {
        Ok(modules) => {
            if let Some(main) = modules.first() {
                record.image_base = main.base;
                // e_entry belongs to the executable, so only relocate it
                // against the executable's own mapping
                if let Ok(hdr) = &header {
                    if main.path == record.full_path {
                        record.entry_point = hdr.runtime_entry(main.base);
                    }
                }
            }
            record.modules = modules.into_iter().map(|m| m.name).collect();
        }
        Err(e) => log_miss(entry.pid, "modules", &e),
    }

    if let Some(boot_time) = opts.boot_time {
        match read_stat(handle.proc_path()) {
            Ok(stat) => {
                record.start_time = start_time_from_ticks(boot_time, stat.starttime_ticks, *CLK_TCK);
            }
            Err(e) => log_miss(entry.pid, "start time", &e),
        }
    }

    record
}

/// `comm` is cut at 15 bytes; recover the full name from the executable when
/// the short name is a prefix of it.
fn untruncated_name(comm: &str, exe: &Path) -> Option<String> {
    if comm.len() != TASK_COMM_VISIBLE_LEN {
        return None;
    }
    let base = exe.file_name()?.to_str()?;
    (base.len() > comm.len() && base.starts_with(comm)).then(|| base.to_string())
}
