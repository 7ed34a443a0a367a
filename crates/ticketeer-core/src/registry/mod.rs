//! Registry module: shards, routing, claims and attempted pulses.

mod pulse;
mod shard;

pub use pulse::PulseBoard;
pub use shard::Shard;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::domain::{ClaimError, Ticket, TicketSnapshot};
use crate::observability::ClaimCounts;
use crate::ports::{IdGenerator, Presenter, Router};

/// In-process ticket database.
///
/// Design:
/// - Built and populated during initialization (`&mut self`).
/// - Shared as `Arc<Registry>` afterwards; every claim path takes `&self`.
/// - The router is fixed at construction. Every index routes to exactly one
///   shard, and that shard holds the ticket with that index.
pub struct Registry {
    shards: Vec<Shard>,
    router: Arc<dyn Router>,
    presenter: Arc<dyn Presenter>,
    pulses: PulseBoard,
    len: usize,
}

impl Registry {
    /// Create an empty registry with `shard_count` shards.
    ///
    /// Use [`crate::app::RegistryBuilder`] for a validated, populated registry.
    pub fn new(
        shard_count: usize,
        router: Arc<dyn Router>,
        presenter: Arc<dyn Presenter>,
        pulses: PulseBoard,
    ) -> Self {
        let shards = (0..shard_count)
            .map(|number| Shard::new(number, Arc::clone(&presenter)))
            .collect();
        Self {
            shards,
            router,
            presenter,
            pulses,
            len: 0,
        }
    }

    fn shard_number(&self, index: usize) -> Result<usize, ClaimError> {
        let shard_count = self.shards.len();
        let shard = self.router.route(shard_count, index);
        if shard < shard_count {
            Ok(shard)
        } else {
            Err(ClaimError::ShardOutOfRange {
                index,
                shard,
                shard_count,
            })
        }
    }

    fn shard_for(&self, index: usize) -> Result<&Shard, ClaimError> {
        let number = self.shard_number(index)?;
        Ok(&self.shards[number])
    }

    /// Route `ticket` by its index and store it in that shard.
    pub fn add_ticket(&mut self, ticket: Ticket) -> Result<(), ClaimError> {
        let number = self.shard_number(ticket.index())?;
        trace!(index = ticket.index(), shard = number, "add ticket");
        self.shards[number].add_ticket(ticket);
        self.len += 1;
        Ok(())
    }

    /// Add `count` tickets, continuing the contiguous index range.
    ///
    /// On an empty registry this creates indices `0..count`.
    pub fn populate(&mut self, count: usize, id_gen: &dyn IdGenerator) -> Result<(), ClaimError> {
        let start = self.len;
        for index in start..start + count {
            self.add_ticket(Ticket::new(index, id_gen.generate_ticket_id()))?;
        }
        debug!(start, count, shards = self.shards.len(), "populated registry");
        Ok(())
    }

    /// `None` for an index that has no ticket (including a misrouted one).
    pub fn ticket_by_index(&self, index: usize) -> Option<&Ticket> {
        self.shard_for(index).ok()?.ticket_by_index(index)
    }

    /// Claim the ticket at `index`.
    ///
    /// - `UnknownIndex`: no ticket there. The registry was not populated for
    ///   this index; callers should abort.
    /// - `AlreadyClaimed`: somebody got there first. The presenter sees an
    ///   attempted pulse and the error is handed back.
    pub fn claim_ticket_by_index(&self, index: usize) -> Result<(), ClaimError> {
        let shard = self.shard_for(index)?;
        let ticket = shard
            .ticket_by_index(index)
            .ok_or(ClaimError::UnknownIndex { index })?;

        match shard.claim_ticket(ticket) {
            Err(err @ ClaimError::AlreadyClaimed { .. }) => {
                debug!(index, shard = shard.number(), "ticket already claimed");
                self.pulses
                    .pulse_then(index, |i| self.presenter.on_claim_attempt_failed(i));
                Err(err)
            }
            other => other,
        }
    }

    /// Whether `index` is currently inside an attempted window.
    pub fn is_attempted(&self, index: usize) -> bool {
        self.pulses.is_active(index)
    }

    /// Close every elapsed attempted window and tell the presenter.
    ///
    /// Returns how many pulses were cleared. A window restarted by a
    /// concurrent failed claim is either cleared before that claim's
    /// notification or not at all.
    pub fn clear_expired_pulses(&self) -> usize {
        self.pulses
            .clear_expired_then(|index| self.presenter.on_attempt_cleared(index))
    }

    /// Close every attempted window, expired or not. Called on shutdown so
    /// no pulse outlives the run.
    pub fn clear_all_pulses(&self) -> usize {
        self.pulses
            .clear_all_then(|index| self.presenter.on_attempt_cleared(index))
    }

    pub fn pulse_window(&self) -> std::time::Duration {
        self.pulses.window()
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn counts(&self) -> ClaimCounts {
        let mut counts = self
            .shards
            .iter()
            .map(Shard::counts)
            .fold(ClaimCounts::default(), |acc, c| ClaimCounts {
                available: acc.available + c.available,
                claimed: acc.claimed + c.claimed,
                attempted: 0,
            });
        counts.attempted = self.pulses.active_count();
        counts
    }

    /// Every ticket, ordered by index.
    pub fn snapshot(&self) -> Vec<TicketSnapshot> {
        let mut tickets: Vec<TicketSnapshot> = self
            .shards
            .iter()
            .flat_map(|shard| shard.tickets().iter().map(Ticket::snapshot))
            .collect();
        tickets.sort_by_key(|t| t.index);
        tickets
    }
}
