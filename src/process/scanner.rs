//! Process enumeration over the /proc filesystem.
//!
//! `enumerate_processes` lists the numeric entries of the proc root once, at
//! call time, and hands back an iterator that reads each process's stat line
//! lazily. Processes started after the listing are not seen; processes that
//! exit before their stat is read are still yielded, with an empty thread hint.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::process::stat::read_stat;

/// Process entry yielded by the enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcEntry {
    pub pid: u32,
    pub name: String,
    pub thread_count: u32,
    pub kernel_thread: bool,
    pub proc_path: PathBuf,
}

/// Lazy, non-restartable sequence over one /proc listing.
#[derive(Debug)]
pub struct ProcessEnumerator {
    pending: std::vec::IntoIter<(u32, PathBuf)>,
}

impl ProcessEnumerator {
    fn empty() -> Self {
        Self {
            pending: Vec::new().into_iter(),
        }
    }

    /// Number of entries not yet yielded.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for ProcessEnumerator {
    type Item = ProcEntry;

    fn next(&mut self) -> Option<ProcEntry> {
        let (pid, proc_path) = self.pending.next()?;
        Some(read_entry(pid, proc_path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

impl ExactSizeIterator for ProcessEnumerator {}

/// Takes a listing of `root` and returns the entries in ascending pid order.
///
/// An unreadable root yields an empty sequence. Callers must read that as
/// "no data this cycle", not as "no processes exist".
pub fn enumerate_processes(root: &Path, max: Option<usize>) -> ProcessEnumerator {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {}: {}", root.display(), e);
            return ProcessEnumerator::empty();
        }
    };

    let mut pids: Vec<(u32, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let p = entry.path();
            let name = p.file_name().and_then(|s| s.to_str())?;
            if !name.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let pid: u32 = name.parse().ok()?;
            Some((pid, p))
        })
        .collect();

    pids.sort_unstable_by_key(|(pid, _)| *pid);
    if let Some(maxp) = max {
        pids.truncate(maxp);
    }

    debug!("Listed {} process entries under {}", pids.len(), root.display());
    ProcessEnumerator {
        pending: pids.into_iter(),
    }
}

fn read_entry(pid: u32, proc_path: PathBuf) -> ProcEntry {
    match read_stat(&proc_path) {
        Ok(stat) => {
            let name = if stat.comm.trim().is_empty() {
                read_process_name(&proc_path).unwrap_or_default()
            } else {
                stat.comm.clone()
            };
            ProcEntry {
                pid,
                name,
                thread_count: stat.num_threads,
                kernel_thread: stat.is_kernel_thread(),
                proc_path,
            }
        }
        Err(e) => {
            debug!("Process {} stat unreadable during enumeration: {}", pid, e);
            ProcEntry {
                pid,
                name: read_process_name(&proc_path).unwrap_or_default(),
                thread_count: 0,
                kernel_thread: false,
                proc_path,
            }
        }
    }
}

/// Reads process name from comm file or extracts from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    let comm = proc_path.join("comm");
    if let Ok(s) = fs::read_to_string(&comm) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let cmd = proc_path.join("cmdline");
    if let Ok(content) = fs::read(&cmd) {
        let first = content.split(|&b| b == 0u8).next()?;
        let argv0 = std::str::from_utf8(first).ok()?;
        if let Some(name) = Path::new(argv0).file_name() {
            return name.to_str().map(|s| s.to_string());
        }
    }
    None
}
