//! Presenter implementations.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::ClaimEvent;
use crate::ports::Presenter;

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn on_claim_succeeded(&self, _index: usize) {}
    fn on_claim_attempt_failed(&self, _index: usize) {}
    fn on_attempt_cleared(&self, _index: usize) {}
}

/// Writes notifications to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn on_claim_succeeded(&self, index: usize) {
        info!(index, "ticket claimed");
    }

    fn on_claim_attempt_failed(&self, index: usize) {
        debug!(index, "claim attempt on taken ticket");
    }

    fn on_attempt_cleared(&self, index: usize) {
        debug!(index, "attempt pulse cleared");
    }
}

/// Delivers every notification to each inner presenter, in order.
#[derive(Default)]
pub struct FanoutPresenter {
    presenters: Vec<Arc<dyn Presenter>>,
}

impl FanoutPresenter {
    pub fn new(presenters: Vec<Arc<dyn Presenter>>) -> Self {
        Self { presenters }
    }

    pub fn push(&mut self, presenter: Arc<dyn Presenter>) {
        self.presenters.push(presenter);
    }
}

impl Presenter for FanoutPresenter {
    fn on_claim_succeeded(&self, index: usize) {
        for p in &self.presenters {
            p.on_claim_succeeded(index);
        }
    }

    fn on_claim_attempt_failed(&self, index: usize) {
        for p in &self.presenters {
            p.on_claim_attempt_failed(index);
        }
    }

    fn on_attempt_cleared(&self, index: usize) {
        for p in &self.presenters {
            p.on_attempt_cleared(index);
        }
    }
}

/// What a presenter would show for one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardCell {
    Available,
    Attempted,
    Claimed,
}

impl BoardCell {
    pub fn glyph(self) -> char {
        match self {
            BoardCell::Available => '.',
            BoardCell::Attempted => '!',
            BoardCell::Claimed => '#',
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<ClaimEvent>,
    claimed: BTreeSet<usize>,
    attempted: BTreeSet<usize>,
}

/// Keeps every notification as a [`ClaimEvent`] plus the current board.
///
/// 状態はイベントから導出するのではなく、通知ごとに更新します。
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    inner: Mutex<Recorded>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: ClaimEvent) {
        let mut inner = self.lock();
        match event {
            ClaimEvent::Claimed { index } => {
                inner.claimed.insert(index);
            }
            ClaimEvent::AttemptFailed { index } => {
                inner.attempted.insert(index);
            }
            ClaimEvent::AttemptCleared { index } => {
                inner.attempted.remove(&index);
            }
        }
        inner.events.push(event);
    }

    pub fn events(&self) -> Vec<ClaimEvent> {
        self.lock().events.clone()
    }

    pub fn claimed_indices(&self) -> Vec<usize> {
        self.lock().claimed.iter().copied().collect()
    }

    pub fn attempted_indices(&self) -> Vec<usize> {
        self.lock().attempted.iter().copied().collect()
    }

    /// Board for indices `0..len`. A claimed ticket that is also pulsing
    /// shows as attempted.
    pub fn board(&self, len: usize) -> Vec<BoardCell> {
        let inner = self.lock();
        (0..len)
            .map(|index| {
                if inner.attempted.contains(&index) {
                    BoardCell::Attempted
                } else if inner.claimed.contains(&index) {
                    BoardCell::Claimed
                } else {
                    BoardCell::Available
                }
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn on_claim_succeeded(&self, index: usize) {
        self.record(ClaimEvent::Claimed { index });
    }

    fn on_claim_attempt_failed(&self, index: usize) {
        self.record(ClaimEvent::AttemptFailed { index });
    }

    fn on_attempt_cleared(&self, index: usize) {
        self.record(ClaimEvent::AttemptCleared { index });
    }
}
