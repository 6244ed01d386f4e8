//! Poll-driven refresh timing.
//!
//! The scheduler never runs anything itself. The caller polls it; when a
//! refresh is due the caller rebuilds synchronously and then reports back with
//! `mark_refreshed`. Because the rebuild happens inside the poll, two builds
//! can never overlap and missed intervals are not queued.

use std::time::{Duration, Instant};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Due,
    Idle { remaining: Duration },
}

#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    last_refresh: Option<Instant>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_refresh: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_refresh
    }

    /// Due on the first poll, then whenever `interval` has elapsed since the
    /// last completed refresh.
    pub fn phase(&self, now: Instant) -> RefreshPhase {
        let Some(last) = self.last_refresh else {
            return RefreshPhase::Due;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.interval {
            RefreshPhase::Due
        } else {
            RefreshPhase::Idle {
                remaining: self.interval - elapsed,
            }
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.phase(now) == RefreshPhase::Due
    }

    pub fn mark_refreshed(&mut self, at: Instant) {
        self.last_refresh = Some(at);
    }

    /// Makes the next poll due regardless of elapsed time.
    pub fn reset(&mut self) {
        self.last_refresh = None;
    }
}
