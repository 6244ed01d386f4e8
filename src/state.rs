//! Application state for the explorer.
//!
//! `AppState` owns everything a front end needs between polls: the process
//! source, the rule set, the refresh scheduler, the current snapshot and the
//! view settings. It is an explicit value handed to whoever drives the poll
//! loop; nothing here is global.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::process::{ProcessRecord, ProcessSource, SignatureSet};
use crate::scheduler::{RefreshScheduler, DEFAULT_REFRESH_INTERVAL};
use crate::snapshot::{build_snapshot, BuildOptions, Snapshot};
use crate::view::{ProcessView, Selection, SortMode};

/// Startup settings for `AppState`.
#[derive(Debug, Clone)]
pub struct StateOptions {
    pub refresh_interval: Duration,
    pub build: BuildOptions,
    pub filter: String,
    pub sort: SortMode,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            build: BuildOptions::default(),
            filter: String::new(),
            sort: SortMode::Memory,
        }
    }
}

pub struct AppState {
    source: Box<dyn ProcessSource>,
    signatures: SignatureSet,
    build: BuildOptions,
    scheduler: RefreshScheduler,
    snapshot: Arc<Snapshot>,
    view: ProcessView,
    generation: u64,
}

impl AppState {
    /// Starts with an empty snapshot; the first `refresh_if_due` fills it.
    pub fn new(source: Box<dyn ProcessSource>, signatures: SignatureSet, options: StateOptions) -> Self {
        Self {
            source,
            signatures,
            build: options.build,
            scheduler: RefreshScheduler::new(options.refresh_interval),
            snapshot: Arc::new(Snapshot::default()),
            view: ProcessView::new(options.filter, options.sort),
            generation: 0,
        }
    }

    /// Rebuilds the snapshot if the refresh interval has elapsed. Returns
    /// whether a rebuild happened.
    pub fn refresh_if_due(&mut self) -> bool {
        self.refresh_if_due_at(Instant::now())
    }

    /// `refresh_if_due` against an explicit clock reading.
    pub fn refresh_if_due_at(&mut self, now: Instant) -> bool {
        if !self.scheduler.is_due(now) {
            return false;
        }
        self.rebuild();
        self.scheduler.mark_refreshed(now);
        true
    }

    /// Rebuilds now and restarts the interval.
    pub fn force_refresh(&mut self) {
        self.rebuild();
        self.scheduler.mark_refreshed(Instant::now());
    }

    #[instrument(skip_all)]
    fn rebuild(&mut self) {
        let snapshot = build_snapshot(self.source.as_ref(), &self.signatures, &self.build);
        self.snapshot = Arc::new(snapshot);
        self.generation += 1;
        if let Some(sel) = self.view.selection() {
            if self.view.resolve_selection(&self.snapshot).is_none() {
                debug!("Selected pid {} ({}) is no longer present", sel.pid, sel.name);
            }
        }
    }

    /// The current snapshot. Cheap to clone and unaffected by later rebuilds.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Number of completed rebuilds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    pub fn view(&self) -> &ProcessView {
        &self.view
    }

    /// Visible rows of the current snapshot.
    pub fn rows(&self) -> Vec<&ProcessRecord> {
        self.view.rows(&self.snapshot)
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.view.set_filter(text);
    }

    pub fn toggle_sort(&mut self) -> SortMode {
        self.view.toggle_sort()
    }

    pub fn select_row(&mut self, row: usize) -> Option<&Selection> {
        self.view.select_row(&self.snapshot, row)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.view.selection()
    }

    /// The selected record, if that process is still in the snapshot.
    pub fn selected_record(&self) -> Option<&ProcessRecord> {
        self.view.resolve_selection(&self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Access, Architecture, FixtureSource};

    fn rec(pid: u32, name: &str, mb: u64) -> ProcessRecord {
        let mut r = ProcessRecord::partial(pid, name, 1);
        r.memory_usage_bytes = mb << 20;
        r.architecture = Architecture::X64;
        r.access = Access::Full;
        r
    }

    fn state(records: Vec<ProcessRecord>, interval_ms: u64) -> AppState {
        AppState::new(
            Box::new(FixtureSource::new(records)),
            SignatureSet::builtin().clone(),
            StateOptions {
                refresh_interval: Duration::from_millis(interval_ms),
                ..StateOptions::default()
            },
        )
    }

    #[test]
    fn test_first_poll_builds() {
        let mut app = state(vec![rec(1, "a", 1), rec(2, "b", 2)], 1000);
        assert!(app.snapshot().is_empty());
        assert!(app.refresh_if_due());
        assert_eq!(app.snapshot().len(), 2);
        assert_eq!(app.generation(), 1);
    }

    #[test]
    fn test_refresh_respects_interval() {
        let mut app = state(vec![rec(1, "a", 1)], 1000);
        let t0 = Instant::now();
        assert!(app.refresh_if_due_at(t0));
        assert!(!app.refresh_if_due_at(t0 + Duration::from_millis(500)));
        assert!(app.refresh_if_due_at(t0 + Duration::from_millis(1000)));
        assert_eq!(app.generation(), 2);
    }

    #[test]
    fn test_old_snapshot_survives_rebuild() {
        let mut app = state(vec![rec(1, "a", 1)], 0);
        app.refresh_if_due();
        let before = app.snapshot();
        app.force_refresh();
        assert!(!Arc::ptr_eq(&before, &app.snapshot()));
        assert_eq!(before.len(), 1);
    }

    #[test]
    fn test_filter_sort_select() {
        let mut app = state(vec![rec(1, "alpha", 10), rec(2, "beta", 30), rec(3, "Alpine", 20)], 1000);
        app.refresh_if_due();

        app.set_filter("AL");
        let pids: Vec<u32> = app.rows().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![3, 1]);

        assert_eq!(app.toggle_sort(), SortMode::Name);
        let pids: Vec<u32> = app.rows().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![1, 3]);

        assert_eq!(app.select_row(1).map(|s| s.pid), Some(3));
        assert_eq!(app.selected_record().map(|r| r.name.as_str()), Some("Alpine"));
    }
}
