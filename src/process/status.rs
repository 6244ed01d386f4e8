//! Parsing of `/proc/<pid>/status` for resident memory and effective uid.

use std::fs;
use std::path::Path;

use crate::error::{ProcfsError, ProcfsResult};

/// Values the inspector takes from the status file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFields {
    /// `VmRSS` in bytes. Absent for kernel threads.
    pub vm_rss_bytes: Option<u64>,
    /// Effective uid, the second column of the `Uid:` line.
    pub euid: Option<u32>,
}

impl StatusFields {
    /// Running with an effective uid of 0.
    pub fn is_elevated(&self) -> bool {
        self.euid == Some(0)
    }
}

/// Parses kilobyte values from status lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Parses the contents of a status file.
pub fn parse_status(content: &str) -> StatusFields {
    let mut fields = StatusFields::default();

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("VmRSS:") {
            fields.vm_rss_bytes = parse_kb_value(v).and_then(|kb| kb.checked_mul(1024));
        } else if let Some(v) = line.strip_prefix("Uid:") {
            fields.euid = v.split_whitespace().nth(1).and_then(|s| s.parse().ok());
        }

        // Early exit if we've found both values
        if fields.vm_rss_bytes.is_some() && fields.euid.is_some() {
            break;
        }
    }

    fields
}

/// Reads `<proc_path>/status`.
pub fn read_status(proc_path: &Path) -> ProcfsResult<StatusFields> {
    let status_path = proc_path.join("status");
    let content =
        fs::read_to_string(&status_path).map_err(|e| ProcfsError::io(&status_path, e))?;
    Ok(parse_status(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Tests for parse_kb_value
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_kb_value() {
        assert_eq!(parse_kb_value("       1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("0 kB"), Some(0));
        assert_eq!(parse_kb_value("  42  "), Some(42));
    }

    #[test]
    fn test_parse_kb_value_invalid() {
        assert_eq!(parse_kb_value(""), None);
        assert_eq!(parse_kb_value("kB"), None);
        assert_eq!(parse_kb_value("-1 kB"), None);
        assert_eq!(parse_kb_value("1.5 kB"), None);
    }

    // -------------------------------------------------------------------------
    // Tests for parse_status
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_status_user_process() {
        let content = "Name:\tbash\nUmask:\t0022\nState:\tS (sleeping)\nUid:\t1000\t1000\t1000\t1000\nGid:\t1000\t1000\t1000\t1000\nVmPeak:\t   12000 kB\nVmRSS:\t    5120 kB\nThreads:\t1\n";
        let fields = parse_status(content);
        assert_eq!(fields.vm_rss_bytes, Some(5120 * 1024));
        assert_eq!(fields.euid, Some(1000));
        assert!(!fields.is_elevated());
    }

    #[test]
    fn test_parse_status_setuid_root() {
        // real uid 1000, effective uid 0
        let content = "Name:\tsudo\nUid:\t1000\t0\t0\t0\nVmRSS:\t    2048 kB\n";
        let fields = parse_status(content);
        assert!(fields.is_elevated());
        assert_eq!(fields.vm_rss_bytes, Some(2048 * 1024));
    }

    #[test]
    fn test_parse_status_oversized_rss_ignored() {
        let fields = parse_status("Uid:\t0\t0\t0\t0\nVmRSS:\t18446744073709551615 kB\n");
        assert_eq!(fields.vm_rss_bytes, None);
        assert_eq!(fields.euid, Some(0));
    }

    #[test]
    fn test_parse_status_kernel_thread_has_no_rss() {
        let content = "Name:\tkworker/0:1\nUid:\t0\t0\t0\t0\nThreads:\t1\n";
        let fields = parse_status(content);
        assert_eq!(fields.vm_rss_bytes, None);
        assert!(fields.is_elevated());
    }
}
