//! RegistryBuilder - Registry の構築と投入
//!
//! # Fail-fast 設計
//! - シャード数 0 は build() でエラー
//! - 投入後、すべての index が自分のチケットに解決できるかを検証
//!   （決定的でない Router はここで見つかる）

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::ClaimError;
use crate::impls::{ModulusRouter, NoopPresenter};
use crate::ports::{Clock, IdGenerator, Presenter, Router, SystemClock};
use crate::registry::{PulseBoard, Registry};

/// Default ticket population.
pub const DEFAULT_TICKETS: usize = 100;
/// Default shard count.
pub const DEFAULT_SHARDS: usize = 10;

/// BuildError は Registry 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("a registry needs at least one shard")]
    NoShards,

    #[error("ticket {index} cannot be found after population; the router is not deterministic")]
    Unroutable { index: usize },

    #[error("population failed: {0}")]
    Population(#[from] ClaimError),
}

/// RegistryBuilder は Registry を構築
///
/// # 使用例
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .shards(10)
///     .tickets(100)
///     .presenter(presenter)
///     .build(&UlidGenerator::new(SystemClock))?;
/// ```
pub struct RegistryBuilder {
    shards: usize,
    tickets: usize,
    router: Arc<dyn Router>,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn Clock>,
    pulse_window: Duration,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            tickets: DEFAULT_TICKETS,
            router: Arc::new(ModulusRouter),
            presenter: Arc::new(NoopPresenter),
            clock: Arc::new(SystemClock),
            pulse_window: PulseBoard::DEFAULT_WINDOW,
        }
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    pub fn tickets(mut self, tickets: usize) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = router;
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn pulse_window(mut self, window: Duration) -> Self {
        self.pulse_window = window;
        self
    }

    /// Registry を構築してチケット 0..tickets を投入
    pub fn build(self, id_gen: &dyn IdGenerator) -> Result<Registry, BuildError> {
        if self.shards == 0 {
            return Err(BuildError::NoShards);
        }

        let pulses = PulseBoard::new(self.pulse_window, self.clock);
        let mut registry = Registry::new(self.shards, self.router, self.presenter, pulses);
        registry.populate(self.tickets, id_gen)?;

        if let Some(index) = (0..self.tickets).find(|&i| registry.ticket_by_index(i).is_none()) {
            return Err(BuildError::Unroutable { index });
        }

        let empty = registry.shards().iter().filter(|s| s.is_empty()).count();
        if empty > 0 && self.tickets >= self.shards {
            warn!(empty, shards = self.shards, "some shards received no tickets");
        }

        info!(
            tickets = registry.len(),
            shards = registry.shard_count(),
            "registry ready"
        );
        Ok(registry)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
