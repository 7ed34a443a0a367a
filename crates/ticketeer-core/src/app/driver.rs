//! Driver - tick ループ（AppServer）
//!
//! # フロー
//! 1. ClaimProcess::step() を 1 回実行
//! 2. finished なら終了
//! 3. TickCadence の遅延だけ待って 1 に戻る
//!
//! tick は重ならない（step が完了してから次の待機に入る）。
//! キャンセルは tick の境界でのみ効く。

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span};

use super::cadence::TickCadence;
use super::process::ClaimProcess;
use crate::domain::{ClaimError, ClaimState, RunId, TickOutcome};
use crate::registry::Registry;

/// DriverError は実行を中断したエラー
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("run {run_id} aborted at tick {tick}: {source}")]
    Aborted {
        run_id: RunId,
        tick: u64,
        #[source]
        source: ClaimError,
    },

    #[error("driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// 1 回の実行結果
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub ticks: u64,
    pub state: ClaimState,
    pub cancelled: bool,
}

/// Driver は ClaimProcess を Registry に対して繰り返し実行する
///
/// 状態（ClaimState）は Driver が所有し、Registry は共有のみ（変更しない）。
pub struct Driver<P> {
    registry: Arc<Registry>,
    process: P,
    cadence: TickCadence,
    run_id: RunId,
}

impl<P: ClaimProcess> Driver<P> {
    pub fn new(registry: Arc<Registry>, process: P, cadence: TickCadence, run_id: RunId) -> Self {
        Self {
            registry,
            process,
            cadence,
            run_id,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Run until the process reports `finished`.
    pub async fn run(&self) -> Result<RunReport, DriverError> {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.run_until(shutdown_rx).await
    }

    /// Run until finished or until `shutdown` turns `true`.
    ///
    /// A tick already in progress always completes; cancellation is observed
    /// before the next tick starts.
    pub async fn run_until(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport, DriverError> {
        let span = info_span!("driver", run_id = %self.run_id);
        async move {
            info!("run started");
            let mut state = ClaimState::new();
            let mut ticks: u64 = 0;
            let mut streak: u32 = 0;

            loop {
                if *shutdown.borrow() {
                    info!(ticks, "run cancelled");
                    return Ok(self.report(ticks, state, true));
                }

                ticks += 1;
                state = self.process.step(&self.registry, state).map_err(|source| {
                    error!(tick = ticks, error = %source, "fatal claim error");
                    DriverError::Aborted {
                        run_id: self.run_id,
                        tick: ticks,
                        source,
                    }
                })?;
                debug!(tick = ticks, cursor = state.cursor, outcome = ?state.last_outcome, "tick");

                if state.finished {
                    info!(
                        ticks,
                        claimed = state.claimed,
                        contended = state.contended,
                        "run finished"
                    );
                    return Ok(self.report(ticks, state, false));
                }

                streak = match state.last_outcome {
                    Some(TickOutcome::Contended { .. }) => streak.saturating_add(1),
                    _ => 0,
                };
                if wait_or_shutdown(self.cadence.next_delay(streak), &mut shutdown).await {
                    info!(ticks, "run cancelled");
                    return Ok(self.report(ticks, state, true));
                }
            }
        }
        .instrument(span)
        .await
    }

    fn report(&self, ticks: u64, state: ClaimState, cancelled: bool) -> RunReport {
        RunReport {
            run_id: self.run_id,
            ticks,
            state,
            cancelled,
        }
    }
}

/// Sleep for `delay`. Returns `true` if shutdown was requested meanwhile.
///
/// A dropped sender means nobody can cancel any more; the sleep then runs out.
async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => return true,
                Ok(()) => continue,
                Err(_) => {
                    (&mut sleep).await;
                    return false;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::process::{AdvancePolicy, BasicClaimProcess};
    use crate::domain::ClaimEvent;
    use crate::impls::{ModulusRouter, RecordingPresenter};
    use crate::ports::{IdGenerator, SystemClock, UlidGenerator};
    use crate::registry::PulseBoard;

    fn registry(tickets: usize, shards: usize, presenter: Arc<RecordingPresenter>) -> Arc<Registry> {
        let mut registry = Registry::new(
            shards,
            Arc::new(ModulusRouter),
            presenter,
            PulseBoard::new(PulseBoard::DEFAULT_WINDOW, Arc::new(SystemClock)),
        );
        registry
            .populate(tickets, &UlidGenerator::new(SystemClock))
            .unwrap();
        Arc::new(registry)
    }

    fn fast() -> TickCadence {
        TickCadence::fixed(Duration::from_millis(1))
    }

    fn run_id() -> RunId {
        UlidGenerator::new(SystemClock).generate_run_id()
    }

    #[tokio::test]
    async fn scenario_always_advance() {
        let presenter = Arc::new(RecordingPresenter::new());
        let registry = registry(100, 10, presenter.clone());
        let driver = Driver::new(
            registry.clone(),
            BasicClaimProcess::new(10, AdvancePolicy::Always),
            fast(),
            run_id(),
        );

        let report = driver.run().await.unwrap();

        assert!(!report.cancelled);
        assert!(report.state.finished);
        assert_eq!(report.ticks, 11);
        assert_eq!(presenter.claimed_indices(), (0..10).collect::<Vec<_>>());
        let counts = registry.counts();
        assert_eq!(counts.claimed, 10);
        assert_eq!(counts.available, 90);
    }

    #[tokio::test]
    async fn scenario_retry_after_claim() {
        let presenter = Arc::new(RecordingPresenter::new());
        let registry = registry(100, 10, presenter.clone());
        let driver = Driver::new(
            registry.clone(),
            BasicClaimProcess::new(10, AdvancePolicy::OnFailure),
            fast(),
            run_id(),
        );

        let report = driver.run().await.unwrap();

        assert_eq!(report.ticks, 21);
        assert_eq!(report.state.contended, 10);
        assert_eq!(presenter.claimed_indices(), (0..10).collect::<Vec<_>>());
        let failed = presenter
            .events()
            .iter()
            .filter(|e| matches!(e, ClaimEvent::AttemptFailed { .. }))
            .count();
        assert_eq!(failed, 10);
        for i in 10..100 {
            assert!(registry.ticket_by_index(i).unwrap().is_available());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_on_contention_and_resets_after_a_claim() {
        let registry = registry(10, 2, Arc::new(RecordingPresenter::new()));
        for index in 0..3 {
            registry.claim_ticket_by_index(index).unwrap();
        }
        let driver = Driver::new(
            registry,
            BasicClaimProcess::new(5, AdvancePolicy::Always),
            TickCadence::backoff(
                Duration::from_millis(100),
                2.0,
                Duration::from_secs(1),
            ),
            run_id(),
        );

        let start = tokio::time::Instant::now();
        let report = driver.run().await.unwrap();
        let elapsed = start.elapsed();

        // contended 0,1,2: 200 + 400 + 800; claimed 3,4: 100 + 100
        assert_eq!(report.ticks, 6);
        assert_eq!(report.state.contended, 3);
        assert_eq!(report.state.claimed, 2);
        assert!(elapsed >= Duration::from_millis(1600), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1650), "{elapsed:?}");
    }

    #[tokio::test]
    async fn unknown_index_aborts_the_run() {
        let registry = registry(3, 2, Arc::new(RecordingPresenter::new()));
        let id = run_id();
        let driver = Driver::new(
            registry,
            BasicClaimProcess::new(5, AdvancePolicy::Always),
            fast(),
            id,
        );

        let err = driver.run().await.unwrap_err();
        match err {
            DriverError::Aborted {
                run_id,
                tick,
                source,
            } => {
                assert_eq!(run_id, id);
                assert_eq!(tick, 4);
                assert_eq!(source, ClaimError::UnknownIndex { index: 3 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn shutdown_stops_between_ticks() {
        let registry = registry(100, 10, Arc::new(RecordingPresenter::new()));
        let driver = Driver::new(
            registry.clone(),
            BasicClaimProcess::new(10, AdvancePolicy::Always),
            TickCadence::fixed(Duration::from_secs(60)),
            run_id(),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run_until(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let report = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.ticks, 1);
        assert!(!report.state.finished);
        assert_eq!(registry.counts().claimed, 1);
    }

    #[tokio::test]
    async fn already_cancelled_run_does_no_ticks() {
        let registry = registry(10, 2, Arc::new(RecordingPresenter::new()));
        let driver = Driver::new(registry.clone(), BasicClaimProcess::default(), fast(), run_id());
        let (_tx, rx) = watch::channel(true);

        let report = driver.run_until(rx).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.ticks, 0);
        assert_eq!(registry.counts().claimed, 0);
    }

    #[tokio::test]
    async fn dropped_sender_does_not_cancel() {
        let registry = registry(10, 2, Arc::new(RecordingPresenter::new()));
        let driver = Driver::new(
            registry,
            BasicClaimProcess::new(2, AdvancePolicy::Always),
            fast(),
            run_id(),
        );
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let report = driver.run_until(rx).await.unwrap();
        assert!(!report.cancelled);
        assert!(report.state.finished);
    }
}
