//! Snapshot building.
//!
//! A build pass enumerates the source once, inspects and classifies every
//! entry, and returns a new immutable `Snapshot`. Every enumerated process
//! gets a record, even when inspection was denied, so the record count always
//! equals the enumerator's yield. Snapshots replace each other wholesale.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::process::{
    Access, Architecture, Classification, ProcEntry, ProcessRecord, ProcessSource, SignatureSet,
};

/// Counters describing one build pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStats {
    pub enumerated: usize,
    pub full_access: usize,
    pub partial: usize,
    pub duration: Duration,
    pub taken_at: DateTime<Utc>,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self {
            enumerated: 0,
            full_access: 0,
            partial: 0,
            duration: Duration::ZERO,
            taken_at: Utc::now(),
        }
    }
}

/// Immutable result of one build pass.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Vec<ProcessRecord>,
    stats: ScanStats,
}

impl Snapshot {
    pub fn new(records: Vec<ProcessRecord>, stats: ScanStats) -> Self {
        Self { records, stats }
    }

    /// Snapshot over the given records, as-is, with counters derived from them.
    pub fn from_records(records: Vec<ProcessRecord>) -> Self {
        let full_access = records.iter().filter(|r| r.access == Access::Full).count();
        let stats = ScanStats {
            enumerated: records.len(),
            full_access,
            partial: records.len() - full_access,
            ..ScanStats::default()
        };
        Self { records, stats }
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.records.iter().find(|r| r.pid == pid)
    }

    /// The `(pid, name)` identities in this snapshot.
    pub fn identities(&self) -> BTreeSet<(u32, String)> {
        self.records.iter().map(|r| (r.pid, r.name.clone())).collect()
    }
}

/// Knobs for a build pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Inspect processes on the rayon pool. Records still come out in
    /// enumeration order.
    pub parallel: bool,
}

/// Merges classifier output into a record.
pub fn apply_classification(record: &mut ProcessRecord, classification: Classification) {
    if classification.is_kernel || record.kernel_thread {
        record.architecture = Architecture::Kernel;
    } else if classification.is_pseudo {
        record.architecture = Architecture::Pseudo;
    }
    record.engine = classification.engine;
    record.protection = classification.protection;
}

fn build_record(source: &dyn ProcessSource, signatures: &SignatureSet, entry: &ProcEntry) -> ProcessRecord {
    let mut record = source.inspect(entry);
    let classification = signatures.classify(&record.name, &record.modules);
    apply_classification(&mut record, classification);
    record
}

/// 0 for real architectures, 1 for the `K` / `P` sentinels.
fn sentinel_rank(record: &ProcessRecord) -> u8 {
    u8::from(record.architecture.is_sentinel())
}

/// Sentinels after everything else; among themselves they compare equal so a
/// stable sort keeps their incoming order.
fn compare_sentinels_last(
    a: &ProcessRecord,
    b: &ProcessRecord,
    key: impl FnOnce(&ProcessRecord, &ProcessRecord) -> Ordering,
) -> Ordering {
    match (a.architecture.is_sentinel(), b.architecture.is_sentinel()) {
        (true, true) => Ordering::Equal,
        _ => sentinel_rank(a)
            .cmp(&sentinel_rank(b))
            .then_with(|| key(a, b)),
    }
}

/// Descending memory, sentinels last.
pub fn compare_by_memory(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    compare_sentinels_last(a, b, |a, b| b.memory_usage_bytes.cmp(&a.memory_usage_bytes))
}

/// Case-insensitive name, then exact name, then pid; sentinels last.
pub fn compare_by_name(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    compare_sentinels_last(a, b, |a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.pid.cmp(&b.pid))
    })
}

/// Default snapshot order: stable, sentinels last, then by descending memory.
pub fn sort_default(records: &mut [ProcessRecord]) {
    records.sort_by(compare_by_memory);
}

/// Runs one full build pass against `source`.
#[instrument(skip_all, fields(source = %source.describe()))]
pub fn build_snapshot(
    source: &dyn ProcessSource,
    signatures: &SignatureSet,
    options: &BuildOptions,
) -> Snapshot {
    let start = Instant::now();
    let taken_at = Utc::now();
    source.begin_scan();

    let mut records: Vec<ProcessRecord> = if options.parallel {
        let entries: Vec<ProcEntry> = source.enumerate().collect();
        debug!("Inspecting {} processes in parallel", entries.len());
        entries
            .par_iter()
            .map(|entry| build_record(source, signatures, entry))
            .collect()
    } else {
        source
            .enumerate()
            .map(|entry| build_record(source, signatures, &entry))
            .collect()
    };

    sort_default(&mut records);

    let full_access = records.iter().filter(|r| r.access == Access::Full).count();
    let stats = ScanStats {
        enumerated: records.len(),
        full_access,
        partial: records.len() - full_access,
        duration: start.elapsed(),
        taken_at,
    };

    if records.is_empty() {
        warn!("No processes enumerated this cycle");
    }

    info!(
        "Snapshot built: {} processes ({} full, {} partial), {:.2}ms",
        stats.enumerated,
        stats.full_access,
        stats.partial,
        stats.duration.as_secs_f64() * 1000.0
    );

    Snapshot::new(records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FixtureSource;

    fn proc(pid: u32, name: &str, mb: u64) -> ProcessRecord {
        let mut r = ProcessRecord::partial(pid, name, 1);
        r.memory_usage_bytes = mb * 1024 * 1024;
        r.architecture = Architecture::X64;
        r.access = Access::Full;
        r
    }

    #[test]
    fn test_build_keeps_every_entry() {
        let mut denied = ProcessRecord::partial(9, "locked", 2);
        denied.access = Access::Partial;
        let source = FixtureSource::new(vec![proc(1, "a", 10), denied, proc(3, "b", 5)]);

        let snap = build_snapshot(&source, SignatureSet::builtin(), &BuildOptions::default());
        assert_eq!(snap.len(), source.enumerate().count());
        assert_eq!(snap.stats().full_access, 2);
        assert_eq!(snap.stats().partial, 1);
        assert!(snap.get(9).is_some());
    }

    #[test]
    fn test_default_order_memory_desc_sentinels_last() {
        let source = FixtureSource::new(vec![
            proc(600, "lsass.exe", 900),
            proc(700, "svchost.exe", 500),
            proc(800, "notepad.exe", 50),
            proc(900, "chrome.exe", 200),
        ]);

        let snap = build_snapshot(&source, SignatureSet::builtin(), &BuildOptions::default());
        let names: Vec<&str> = snap.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["chrome.exe", "notepad.exe", "lsass.exe", "svchost.exe"]);
        assert_eq!(snap.get(600).unwrap().architecture, Architecture::Kernel);
        assert_eq!(snap.get(700).unwrap().architecture, Architecture::Pseudo);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let records: Vec<ProcessRecord> = (1..=50).map(|i| proc(i, "worker", u64::from(i % 7))).collect();
        let source = FixtureSource::new(records);

        let seq = build_snapshot(&source, SignatureSet::builtin(), &BuildOptions { parallel: false });
        let par = build_snapshot(&source, SignatureSet::builtin(), &BuildOptions { parallel: true });
        let seq_pids: Vec<u32> = seq.records().iter().map(|r| r.pid).collect();
        let par_pids: Vec<u32> = par.records().iter().map(|r| r.pid).collect();
        assert_eq!(seq_pids, par_pids);
    }

    #[test]
    fn test_kernel_thread_becomes_kernel_sentinel() {
        let mut kworker = ProcessRecord::partial(3, "kworker/0:0", 1);
        kworker.kernel_thread = true;
        let source = FixtureSource::new(vec![kworker, proc(4, "bash", 1)]);

        let snap = build_snapshot(&source, SignatureSet::builtin(), &BuildOptions::default());
        assert_eq!(snap.records()[1].pid, 3);
        assert_eq!(snap.records()[1].architecture, Architecture::Kernel);
    }

    #[test]
    fn test_empty_source_gives_empty_snapshot() {
        let snap = build_snapshot(&FixtureSource::default(), SignatureSet::builtin(), &BuildOptions::default());
        assert!(snap.is_empty());
        assert_eq!(snap.stats().enumerated, 0);
    }

    #[test]
    fn test_compare_by_name_sentinels_last() {
        let mut k = proc(1, "aaa", 0);
        k.architecture = Architecture::Kernel;
        let b = proc(2, "Bbb", 0);
        let c = proc(3, "ccc", 0);
        let mut rows = vec![c.clone(), k.clone(), b.clone()];
        rows.sort_by(compare_by_name);
        let pids: Vec<u32> = rows.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![2, 3, 1]);
    }
}
