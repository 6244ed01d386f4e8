//! Scoped query handle on a process.
//!
//! Opening `/proc/<pid>/exe` needs the same ptrace-read permission as reading
//! the process's memory maps, so a successful open is the procfs equivalent
//! of a query handle. The descriptor is closed when the handle is dropped,
//! which happens on every return path of the inspector.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::{ProcfsError, ProcfsResult};
use crate::process::elf::{read_elf_header, ElfHeader};

/// Suffix procfs appends to the exe link of a replaced or deleted binary.
const DELETED_SUFFIX: &str = " (deleted)";

#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    proc_path: PathBuf,
    image: File,
}

impl ProcessHandle {
    /// Fails with permission denied for other users' processes when
    /// unprivileged, and with not found for kernel threads and exited pids.
    pub fn open(pid: u32, proc_path: &Path) -> ProcfsResult<Self> {
        let exe = proc_path.join("exe");
        let image = File::open(&exe).map_err(|e| ProcfsError::io(&exe, e))?;
        trace!("Acquired handle for pid {}", pid);
        Ok(Self {
            pid,
            proc_path: proc_path.to_path_buf(),
            image,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn proc_path(&self) -> &Path {
        &self.proc_path
    }

    /// Absolute path of the executable image.
    pub fn executable_path(&self) -> ProcfsResult<PathBuf> {
        let exe = self.proc_path.join("exe");
        let target = fs::read_link(&exe).map_err(|e| ProcfsError::io(&exe, e))?;
        Ok(strip_deleted_suffix(&target))
    }

    /// Reads the ELF header of the executable through the open descriptor.
    pub fn image_header(&mut self) -> ProcfsResult<ElfHeader> {
        read_elf_header(&mut self.image)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        trace!("Released handle for pid {}", self.pid);
    }
}

/// Removes the ` (deleted)` marker procfs adds to unlinked paths.
pub fn strip_deleted_suffix(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_suffix(DELETED_SUFFIX)) {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}
