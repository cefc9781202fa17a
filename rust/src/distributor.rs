use std::num::NonZeroUsize;

/// Per-rank share of a budget. Truncating; the remainder is never sampled.
pub fn share_for(budget: u64, processes: NonZeroUsize) -> u64 {
    budget / processes.get() as u64
}

/// How a budget is split across the ranks of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    pub budget: u64,
    pub processes: NonZeroUsize,
    pub share: u64,
}

impl Distribution {
    pub fn plan(budget: u64, processes: NonZeroUsize) -> Self {
        Distribution {
            budget,
            processes,
            share: share_for(budget, processes),
        }
    }

    /// Samples actually drawn across all ranks.
    pub fn drawn(&self) -> u64 {
        self.share * self.processes.get() as u64
    }

    /// Samples requested but never drawn, at most `processes - 1`.
    pub fn dropped(&self) -> u64 {
        self.budget - self.drawn()
    }
}
