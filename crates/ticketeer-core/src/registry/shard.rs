//! Shard: an ordered collection of tickets.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{ClaimError, Ticket};
use crate::observability::ClaimCounts;
use crate::ports::Presenter;

/// One partition of the registry.
///
/// Design:
/// - Membership is fixed once the owning Registry is shared; adding needs `&mut self`.
/// - Lookup is a linear scan. Fine at the sizes this registry is built for.
/// - Claims go through the ticket's atomic flag, so `claim_ticket` only needs `&self`.
pub struct Shard {
    number: usize,
    tickets: Vec<Ticket>,
    presenter: Arc<dyn Presenter>,
}

impl Shard {
    pub fn new(number: usize, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            number,
            tickets: Vec::new(),
            presenter,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Append a ticket.
    ///
    /// Precondition: no ticket with the same index is already stored here.
    /// This is not checked.
    pub fn add_ticket(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
    }

    pub fn ticket_by_index(&self, index: usize) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.index() == index)
    }

    /// Claim `ticket`, located in this shard by id.
    ///
    /// - `NotInShard` if no ticket here carries that id.
    /// - `AlreadyClaimed` if the stored ticket is no longer available.
    ///
    /// Membership is checked before availability: a ticket from another
    /// shard is `NotInShard` even when it is already claimed.
    ///
    /// On success the presenter sees `on_claim_succeeded`.
    pub fn claim_ticket(&self, ticket: &Ticket) -> Result<(), ClaimError> {
        let stored = self
            .tickets
            .iter()
            .find(|t| t.id() == ticket.id())
            .ok_or(ClaimError::NotInShard {
                index: ticket.index(),
                id: ticket.id(),
                shard: self.number,
            })?;

        if !stored.try_claim() {
            return Err(ClaimError::AlreadyClaimed {
                index: stored.index(),
            });
        }

        debug!(shard = self.number, index = stored.index(), id = %stored.id(), "claimed ticket");
        self.presenter.on_claim_succeeded(stored.index());
        Ok(())
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn counts(&self) -> ClaimCounts {
        let claimed = self.tickets.iter().filter(|t| !t.is_available()).count();
        ClaimCounts {
            available: self.tickets.len() - claimed,
            claimed,
            attempted: 0,
        }
    }
}
