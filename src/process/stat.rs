//! Parsing of `/proc/<pid>/stat` and the boot time from `/proc/stat`.
//!
//! The enumerator uses the stat line for the process name, thread count and
//! kernel-thread flag; the inspector uses it for the creation timestamp.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

use crate::error::{ProcfsError, ProcfsResult};

/// `PF_KTHREAD` bit of the `flags` field: the task is a kernel thread.
pub const PF_KTHREAD: u64 = 0x0020_0000;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as u64;
            }
        }
    }
    100
}

/// System clock ticks per second (unit of the stat `starttime` field).
pub static CLK_TCK: Lazy<u64> = Lazy::new(get_clk_tck);

/// The fields of a stat line this crate cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub comm: String,
    pub flags: u64,
    pub num_threads: u32,
    /// Field 22, in clock ticks since boot.
    pub starttime_ticks: u64,
}

impl StatFields {
    pub fn is_kernel_thread(&self) -> bool {
        self.flags & PF_KTHREAD != 0
    }
}

/// Parses one stat line.
///
/// `comm` sits in parentheses and may itself contain spaces or parentheses,
/// so the remaining fields are split after the *last* closing parenthesis.
pub fn parse_stat_line(content: &str) -> Option<StatFields> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    if close < open {
        return None;
    }
    let comm = content[open + 1..close].to_string();

    // rest[0] is field 3 (state), so field N lives at rest[N - 3]
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if rest.len() < 20 {
        return None;
    }

    Some(StatFields {
        comm,
        flags: rest[6].parse().ok()?,
        num_threads: rest[17].parse().ok()?,
        starttime_ticks: rest[19].parse().ok()?,
    })
}

/// Reads and parses `<proc_path>/stat`.
pub fn read_stat(proc_path: &Path) -> ProcfsResult<StatFields> {
    let stat_path = proc_path.join("stat");
    let content = fs::read_to_string(&stat_path).map_err(|e| ProcfsError::io(&stat_path, e))?;
    parse_stat_line(&content).ok_or_else(|| ProcfsError::parse(&stat_path, "malformed stat line"))
}

/// Reads the system boot time (`btime`, seconds since the epoch) from `<root>/stat`.
pub fn read_boot_time(proc_root: &Path) -> ProcfsResult<i64> {
    let stat_path = proc_root.join("stat");
    let content = fs::read_to_string(&stat_path).map_err(|e| ProcfsError::io(&stat_path, e))?;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("btime") {
            return v
                .trim()
                .parse()
                .map_err(|_| ProcfsError::parse(&stat_path, "btime is not an integer"));
        }
    }

    Err(ProcfsError::MissingField {
        path: stat_path,
        field: "btime",
    })
}

/// Converts a stat `starttime` to a wall-clock timestamp.
pub fn start_time_from_ticks(boot_time: i64, starttime_ticks: u64, clk_tck: u64) -> Option<DateTime<Utc>> {
    if clk_tck == 0 {
        return None;
    }
    let millis_since_boot = starttime_ticks.checked_mul(1000)? / clk_tck;
    let epoch_millis = boot_time
        .checked_mul(1000)?
        .checked_add(i64::try_from(millis_since_boot).ok()?)?;
    Utc.timestamp_millis_opt(epoch_millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE_STAT: &str = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 0 0 20 0 7 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

    #[test]
    fn test_parse_stat_line() {
        let stat = parse_stat_line(SAMPLE_STAT).expect("sample stat should parse");
        assert_eq!(stat.comm, "test_process");
        assert_eq!(stat.flags, 4194304);
        assert_eq!(stat.num_threads, 7);
        assert_eq!(stat.starttime_ticks, 12345);
        assert!(!stat.is_kernel_thread());
    }

    #[test]
    fn test_parse_stat_line_comm_with_spaces_and_parens() {
        let line = SAMPLE_STAT.replace("(test_process)", "(Web Content (x))");
        let stat = parse_stat_line(&line).expect("stat with odd comm should parse");
        assert_eq!(stat.comm, "Web Content (x)");
        assert_eq!(stat.num_threads, 7);
    }

    #[test]
    fn test_parse_stat_line_kernel_thread() {
        let line = "2 (kthreadd) S 0 0 0 0 -1 2129984 0 0 0 0 0 0 0 0 20 0 1 0 2 0 0 18446744073709551615 0 0 0 0 0 0 0 2147483647 0 0 0 0 17 0 0 0 0 0 0";
        let stat = parse_stat_line(line).expect("kthreadd stat should parse");
        assert!(stat.is_kernel_thread());
        assert_eq!(stat.num_threads, 1);
    }

    #[test]
    fn test_parse_stat_line_invalid() {
        assert!(parse_stat_line("1234 (test) S 1 2 3").is_none());
        assert!(parse_stat_line("").is_none());
        assert!(parse_stat_line("no parens at all 1 2 3").is_none());
    }

    #[test]
    fn test_read_boot_time() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(
            dir.path().join("stat"),
            "cpu  1 2 3 4\nintr 0\nbtime 1700000000\nprocesses 42\n",
        )
        .expect("Failed to write stat file");

        assert_eq!(read_boot_time(dir.path()).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_read_boot_time_missing_field() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("stat"), "cpu  1 2 3 4\n").expect("Failed to write");

        let err = read_boot_time(dir.path()).unwrap_err();
        assert!(matches!(err, ProcfsError::MissingField { field: "btime", .. }));
    }

    #[test]
    fn test_start_time_from_ticks() {
        // 250 ticks at 100 Hz = 2.5 s after boot
        let ts = start_time_from_ticks(1_700_000_000, 250, 100).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_002_500);
        assert!(start_time_from_ticks(1_700_000_000, 250, 0).is_none());
    }
}
