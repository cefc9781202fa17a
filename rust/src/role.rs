use std::time::Instant;

use tracing::{debug, instrument};

use crate::distributor::Distribution;
use crate::error::{CommError, InputError, RunError};
use crate::estimator::RunReport;
use crate::monte_carlo::count_hits;
use crate::random::UniformSource;
use crate::world::Communicator;
use crate::Rank;

/// What one rank hands back to the launcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Coordinator(RunReport),
    Worker { rank: Rank, hits: u64 },
}

impl Outcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Outcome::Coordinator(report) => Some(report),
            Outcome::Worker { .. } => None,
        }
    }

    pub fn hits(&self) -> u64 {
        match self {
            Outcome::Coordinator(report) => report.local_hits,
            Outcome::Worker { hits, .. } => *hits,
        }
    }
}

#[instrument(skip_all, fields(rank = comm.rank(), budget = budget))]
pub fn run_coordinator<S: UniformSource + ?Sized>(
    comm: &Communicator,
    budget: u64,
    source: &mut S,
) -> Result<RunReport, CommError> {
    let start = Instant::now();
    let plan = Distribution::plan(budget, comm.size());
    comm.distribute_share(plan.share)?;

    let local_hits = count_hits(plan.share, source);
    debug!(share = plan.share, hits = local_hits, "sampling finished");

    comm.barrier();
    let total_hits = comm
        .reduce_sum(local_hits)?
        .ok_or(CommError::NotCoordinator { rank: comm.rank() })?;

    Ok(RunReport::new(plan, local_hits, total_hits, start.elapsed()))
}

#[instrument(skip_all, fields(rank = comm.rank()))]
pub fn run_worker<S: UniformSource + ?Sized>(
    comm: &Communicator,
    source: &mut S,
) -> Result<u64, CommError> {
    let share = comm.receive_share()?;

    let hits = count_hits(share, source);
    debug!(share, hits, "sampling finished");

    comm.barrier();
    comm.reduce_sum(hits)?;
    Ok(hits)
}

/// Dispatch on the rank the launcher assigned. `read_budget` is only called on
/// the coordinator.
pub fn run_rank<S, B>(comm: &Communicator, read_budget: B, source: &mut S) -> Result<Outcome, RunError>
where
    S: UniformSource + ?Sized,
    B: FnOnce() -> Result<u64, InputError>,
{
    if comm.is_coordinator() {
        let budget = read_budget()?;
        Ok(Outcome::Coordinator(run_coordinator(comm, budget, source)?))
    } else {
        let hits = run_worker(comm, source)?;
        Ok(Outcome::Worker {
            rank: comm.rank(),
            hits,
        })
    }
}
