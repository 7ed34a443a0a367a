//! ReaperLoop - 期限切れパルスの回収
//!
//! # フロー
//! 1. interval ごとに Registry::clear_expired_pulses() を呼ぶ
//! 2. 期限切れの index について Presenter に on_attempt_cleared が届く
//! 3. shutdown が true になったら、期限前のものも含めて全パルスを消して終了

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::registry::Registry;

/// PulseReaper は attempted パルスを自動で消す
pub struct PulseReaper {
    registry: Arc<Registry>,
    interval: Duration,
}

impl PulseReaper {
    /// Default sweep interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

    /// A zero interval is raised to one millisecond.
    pub fn new(registry: Arc<Registry>, interval: Duration) -> Self {
        Self {
            registry,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(interval = ?self.interval, "pulse reaper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let cleared = self.registry.clear_expired_pulses();
                    if cleared > 0 {
                        trace!(cleared, "cleared attempted pulses");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let drained = self.registry.clear_all_pulses();
        debug!(drained, "pulse reaper stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
