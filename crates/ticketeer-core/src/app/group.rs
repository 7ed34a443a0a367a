use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use super::cadence::TickCadence;
use super::driver::{Driver, DriverError, RunReport};
use super::process::ClaimProcess;
use crate::ports::IdGenerator;
use crate::registry::Registry;

/// Several drivers racing against one registry.
/// - Every driver gets its own process and state; only the registry is shared.
/// - Cancellation comes from the caller's `watch` channel (send `true`).
/// - `join()` waits for all drivers and returns their results in spawn order.
pub struct DriverGroup {
    joins: Vec<JoinHandle<Result<RunReport, DriverError>>>,
}

impl DriverGroup {
    /// Spawn `n` drivers. `make_process` is called once per driver with its
    /// position in the group.
    pub fn spawn<P, F>(
        n: usize,
        registry: Arc<Registry>,
        id_gen: &dyn IdGenerator,
        cadence: TickCadence,
        mut make_process: F,
        shutdown: watch::Receiver<bool>,
    ) -> Self
    where
        P: ClaimProcess + 'static,
        F: FnMut(usize) -> P,
    {
        let mut joins = Vec::with_capacity(n);
        for slot in 0..n {
            let driver = Driver::new(
                Arc::clone(&registry),
                make_process(slot),
                cadence.clone(),
                id_gen.generate_run_id(),
            );
            info!(slot, run_id = %driver.run_id(), "spawning driver");
            let rx = shutdown.clone();
            joins.push(tokio::spawn(async move { driver.run_until(rx).await }));
        }
        Self { joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Wait for every driver. A driver task that panicked shows up as
    /// `DriverError::Join`.
    pub async fn join(self) -> Vec<Result<RunReport, DriverError>> {
        let mut results = Vec::with_capacity(self.joins.len());
        for join in self.joins {
            results.push(match join.await {
                Ok(result) => result,
                Err(e) => Err(DriverError::from(e)),
            });
        }
        results
    }
}
