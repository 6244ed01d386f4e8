//! Presentation view over a snapshot: filter, sort and selection.
//!
//! The view never mutates the snapshot. Rows are derived on demand, so a new
//! snapshot is picked up by the next `rows` call. The selection remembers the
//! selected process by pid and name rather than by row position; after a
//! refresh it resolves only if the same pid still carries the same name.

use serde::Serialize;
use std::fmt;

use crate::process::ProcessRecord;
use crate::snapshot::{compare_by_memory, compare_by_name, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Memory,
    Name,
}

impl SortMode {
    pub fn toggled(self) -> Self {
        match self {
            SortMode::Memory => SortMode::Name,
            SortMode::Name => SortMode::Memory,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMode::Memory => write!(f, "memory"),
            SortMode::Name => write!(f, "name"),
        }
    }
}

/// The process the user picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub pid: u32,
    pub name: String,
}

impl Selection {
    fn of(record: &ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            name: record.name.clone(),
        }
    }

    /// Same pid and same name. A recycled pid under another name is stale.
    pub fn matches(&self, record: &ProcessRecord) -> bool {
        record.pid == self.pid && record.name == self.name
    }
}

/// Case-insensitive substring filter on the process name. An empty needle
/// keeps everything.
pub fn filter_records<'a>(records: &'a [ProcessRecord], needle: &str) -> Vec<&'a ProcessRecord> {
    let needle = needle.to_lowercase();
    records
        .iter()
        .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
        .collect()
}

/// Stable sort of view rows; sentinels stay last in both modes.
pub fn sort_records(rows: &mut [&ProcessRecord], mode: SortMode) {
    match mode {
        SortMode::Memory => rows.sort_by(|a, b| compare_by_memory(a, b)),
        SortMode::Name => rows.sort_by(|a, b| compare_by_name(a, b)),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessView {
    filter: String,
    sort: SortMode,
    selection: Option<Selection>,
}

impl ProcessView {
    pub fn new(filter: impl Into<String>, sort: SortMode) -> Self {
        Self {
            filter: filter.into(),
            sort,
            selection: None,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort
    }

    pub fn set_sort(&mut self, mode: SortMode) {
        self.sort = mode;
    }

    pub fn toggle_sort(&mut self) -> SortMode {
        self.sort = self.sort.toggled();
        self.sort
    }

    /// Visible rows: filtered, then sorted.
    pub fn rows<'a>(&self, snapshot: &'a Snapshot) -> Vec<&'a ProcessRecord> {
        let mut rows = filter_records(snapshot.records(), &self.filter);
        sort_records(&mut rows, self.sort);
        rows
    }

    /// Selects the process shown at `row`. Out-of-range rows clear the
    /// selection.
    pub fn select_row(&mut self, snapshot: &Snapshot, row: usize) -> Option<&Selection> {
        self.selection = self.rows(snapshot).get(row).map(|r| Selection::of(r));
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// The selected record in `snapshot`, if it is still there.
    pub fn resolve_selection<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a ProcessRecord> {
        let sel = self.selection.as_ref()?;
        snapshot.get(sel.pid).filter(|r| sel.matches(r))
    }

    /// Row index of the selected record among the visible rows.
    pub fn selected_row(&self, snapshot: &Snapshot) -> Option<usize> {
        let sel = self.selection.as_ref()?;
        self.rows(snapshot).iter().position(|r| sel.matches(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Access, Architecture};

    fn rec(pid: u32, name: &str, mb: u64, arch: Architecture) -> ProcessRecord {
        let mut r = ProcessRecord::partial(pid, name, 1);
        r.memory_usage_bytes = mb << 20;
        r.architecture = arch;
        r.access = Access::Full;
        r
    }

    fn sample() -> Snapshot {
        Snapshot::from_records(vec![
            rec(900, "chrome.exe", 200, Architecture::X64),
            rec(800, "notepad.exe", 50, Architecture::X64),
            rec(10, "Chromium", 80, Architecture::X86),
            rec(600, "lsass.exe", 900, Architecture::Kernel),
            rec(700, "svchost.exe", 500, Architecture::Pseudo),
        ])
    }

    #[test]
    fn test_filter_case_insensitive_and_idempotent() {
        let snap = sample();
        let once = filter_records(snap.records(), "CHROM");
        let names: Vec<&str> = once.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["chrome.exe", "Chromium"]);

        let owned: Vec<ProcessRecord> = once.into_iter().cloned().collect();
        let twice = filter_records(&owned, "chrom");
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_empty_filter_keeps_all() {
        let snap = sample();
        assert_eq!(filter_records(snap.records(), "").len(), snap.len());
    }

    #[test]
    fn test_sort_modes_keep_sentinels_last() {
        let snap = sample();
        let mut view = ProcessView::default();

        let pids: Vec<u32> = view.rows(&snap).iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![900, 10, 800, 600, 700]);

        assert_eq!(view.toggle_sort(), SortMode::Name);
        let pids: Vec<u32> = view.rows(&snap).iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![900, 10, 800, 600, 700]);

        let tail: Vec<bool> = view
            .rows(&snap)
            .iter()
            .map(|r| r.architecture.is_sentinel())
            .collect();
        assert_eq!(tail, vec![false, false, false, true, true]);
    }

    #[test]
    fn test_name_sort_orders_case_insensitively() {
        let snap = Snapshot::from_records(vec![
            rec(1, "zsh", 1, Architecture::X64),
            rec(2, "Bash", 1, Architecture::X64),
            rec(3, "awk", 1, Architecture::X64),
        ]);
        let view = ProcessView::new("", SortMode::Name);
        let names: Vec<&str> = view.rows(&snap).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["awk", "Bash", "zsh"]);
    }

    #[test]
    fn test_select_row_out_of_range_clears() {
        let snap = sample();
        let mut view = ProcessView::default();
        assert_eq!(view.select_row(&snap, 1).map(|s| s.pid), Some(10));
        assert!(view.select_row(&snap, 99).is_none());
        assert!(view.selection().is_none());
    }

    #[test]
    fn test_selection_follows_pid_across_snapshots() {
        let snap = sample();
        let mut view = ProcessView::default();
        view.select_row(&snap, 2);
        assert_eq!(view.selection().unwrap().name, "notepad.exe");

        // notepad grows and moves to the top
        let next = Snapshot::from_records(vec![
            rec(800, "notepad.exe", 4000, Architecture::X64),
            rec(900, "chrome.exe", 200, Architecture::X64),
        ]);
        assert_eq!(view.resolve_selection(&next).map(|r| r.pid), Some(800));
        assert_eq!(view.selected_row(&next), Some(0));
    }

    #[test]
    fn test_selection_stale_after_exit_or_pid_reuse() {
        let snap = sample();
        let mut view = ProcessView::default();
        view.select_row(&snap, 0);
        assert_eq!(view.selection().unwrap().pid, 900);

        let gone = Snapshot::from_records(vec![rec(800, "notepad.exe", 50, Architecture::X64)]);
        assert!(view.resolve_selection(&gone).is_none());
        assert!(view.selected_row(&gone).is_none());

        let reused = Snapshot::from_records(vec![rec(900, "bash", 5, Architecture::X64)]);
        assert!(view.resolve_selection(&reused).is_none());
        // the stored selection itself is kept
        assert_eq!(view.selection().unwrap().name, "chrome.exe");
    }
}
