//! Ticket: the claimable unit.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use super::ids::TicketId;

/// A single claimable ticket.
///
/// `available` is the only mutable field. It goes from `true` to `false`
/// exactly once; claims are never released. The flag is atomic so that
/// several drivers can race on the same ticket through a shared registry.
#[derive(Debug)]
pub struct Ticket {
    index: usize,
    id: TicketId,
    available: AtomicBool,
}

impl Ticket {
    pub fn new(index: usize, id: TicketId) -> Self {
        Self {
            index,
            id,
            available: AtomicBool::new(true),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Flip `available` from true to false.
    ///
    /// Returns `false` when another caller already won the ticket.
    pub(crate) fn try_claim(&self) -> bool {
        self.available
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn snapshot(&self) -> TicketSnapshot {
        TicketSnapshot {
            index: self.index,
            id: self.id,
            available: self.is_available(),
        }
    }
}

/// Plain-value copy of a ticket for status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    pub index: usize,
    pub id: TicketId,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn new_ticket_is_available() {
        let ticket = Ticket::new(3, TicketId::from_ulid(Ulid::new()));
        assert!(ticket.is_available());
        assert_eq!(ticket.index(), 3);
    }

    #[test]
    fn claim_flips_exactly_once() {
        let ticket = Ticket::new(0, TicketId::from_ulid(Ulid::new()));
        assert!(ticket.try_claim());
        assert!(!ticket.try_claim());
        assert!(!ticket.is_available());
    }

    #[test]
    fn snapshot_reflects_claim() {
        let id = TicketId::from_ulid(Ulid::new());
        let ticket = Ticket::new(7, id);
        ticket.try_claim();

        let snap = ticket.snapshot();
        assert_eq!(
            snap,
            TicketSnapshot {
                index: 7,
                id,
                available: false
            }
        );
    }
}
