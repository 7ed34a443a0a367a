//! Attempted-pulse bookkeeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::ports::Clock;

/// Tracks which indices are showing a transient "attempted" pulse.
///
/// Each index holds one deadline. Pulsing again before the deadline moves it
/// (the window restarts); pulses never queue. Expired entries are removed by
/// [`PulseBoard::clear_expired_then`], which the reaper loop drives.
///
/// The `*_then` methods call their callback while the board is locked, so
/// callers observe pulse and clear notifications in the same order as the
/// board changes. The callback must not touch this board again.
pub struct PulseBoard {
    window: Duration,
    clock: Arc<dyn Clock>,
    deadlines: Mutex<HashMap<usize, DateTime<Utc>>>,
}

impl PulseBoard {
    /// Default pulse window.
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100);

    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            deadlines: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, DateTime<Utc>>> {
        self.deadlines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deadline_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.window)
            .ok()
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Start or restart the window at `index`.
    ///
    /// Returns `true` when the index was not already pulsing.
    pub fn pulse(&self, index: usize) -> bool {
        self.pulse_then(index, |_| {})
    }

    /// Like [`PulseBoard::pulse`], calling `notify(index)` before the lock is
    /// released.
    pub fn pulse_then(&self, index: usize, notify: impl FnOnce(usize)) -> bool {
        let now = self.clock.now();
        let deadline = self.deadline_from(now);
        let mut deadlines = self.lock();
        let previous = deadlines.insert(index, deadline);
        notify(index);
        previous.is_none_or(|old| old <= now)
    }

    pub fn is_active(&self, index: usize) -> bool {
        let now = self.clock.now();
        self.lock().get(&index).is_some_and(|deadline| now < *deadline)
    }

    /// Remove and return every index whose window has elapsed, in index order.
    pub fn take_expired(&self) -> Vec<usize> {
        let mut expired = Vec::new();
        self.clear_expired_then(|index| expired.push(index));
        expired
    }

    /// Remove every elapsed window, calling `notify` for each index in index
    /// order before the lock is released. Returns how many were removed.
    pub fn clear_expired_then(&self, notify: impl FnMut(usize)) -> usize {
        let now = self.clock.now();
        self.drain_then(|deadline| *deadline <= now, notify)
    }

    /// Remove every window, live or not. Used on shutdown.
    pub fn clear_all_then(&self, notify: impl FnMut(usize)) -> usize {
        self.drain_then(|_| true, notify)
    }

    fn drain_then(
        &self,
        mut remove: impl FnMut(&DateTime<Utc>) -> bool,
        mut notify: impl FnMut(usize),
    ) -> usize {
        let mut deadlines = self.lock();
        let mut removed: Vec<usize> = deadlines
            .iter()
            .filter(|&(_, deadline)| remove(deadline))
            .map(|(index, _)| *index)
            .collect();
        removed.sort_unstable();
        for index in &removed {
            deadlines.remove(index);
            notify(*index);
        }
        removed.len()
    }

    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        self.lock().values().filter(|deadline| now < **deadline).count()
    }
}
