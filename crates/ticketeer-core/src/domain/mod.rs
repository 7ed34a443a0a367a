//! Domain model (ids, tickets, claim state, errors, events).

pub mod errors;
pub mod events;
pub mod ids;
pub mod state;
pub mod ticket;

pub use self::errors::{ClaimError, ErrorKind};
pub use self::events::ClaimEvent;
pub use self::ids::{Id, IdMarker, RunId, TicketId};
pub use self::state::{ClaimPhase, ClaimState, TickOutcome};
pub use self::ticket::{Ticket, TicketSnapshot};
