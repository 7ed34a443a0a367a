use serde::{Deserialize, Serialize};

/// Ticket totals for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCounts {
    pub available: usize,
    pub claimed: usize,
    /// Indices whose attempted pulse is still visible.
    pub attempted: usize,
}

impl ClaimCounts {
    pub fn total(&self) -> usize {
        self.available + self.claimed
    }
}
