use std::time::Instant;

use tokio::task;
use tracing::{debug, instrument};

use mc_pi::{count_hits, CommError, Distribution, InputError, Outcome, Rank, RunError, RunReport, UniformSource};

use crate::world::Communicator;

/// Sampling is CPU-bound, so it runs on the blocking pool.
async fn sample<S>(rank: Rank, share: u64, mut source: S) -> Result<u64, CommError>
where
    S: UniformSource + Send + 'static,
{
    let hits = task::spawn_blocking(move || count_hits(share, &mut source))
        .await
        .map_err(|_| CommError::RankPanicked { rank })?;
    debug!(rank, share, hits, "sampling finished");
    Ok(hits)
}

#[instrument(skip_all, fields(rank = comm.rank(), budget = budget))]
pub async fn run_coordinator<S>(comm: &mut Communicator, budget: u64, source: S) -> Result<RunReport, CommError>
where
    S: UniformSource + Send + 'static,
{
    let start = Instant::now();
    let plan = Distribution::plan(budget, comm.size());
    comm.distribute_share(plan.share)?;

    let local_hits = sample(comm.rank(), plan.share, source).await?;

    comm.barrier().await;
    let total_hits = comm
        .reduce_sum(local_hits)
        .await?
        .ok_or(CommError::NotCoordinator { rank: comm.rank() })?;

    Ok(RunReport::new(plan, local_hits, total_hits, start.elapsed()))
}

#[instrument(skip_all, fields(rank = comm.rank()))]
pub async fn run_worker<S>(comm: &mut Communicator, source: S) -> Result<u64, CommError>
where
    S: UniformSource + Send + 'static,
{
    let share = comm.receive_share().await?;
    let hits = sample(comm.rank(), share, source).await?;

    comm.barrier().await;
    comm.reduce_sum(hits).await?;
    Ok(hits)
}

/// Dispatch on rank. `read_budget` blocks on input, so the coordinator runs it
/// on the blocking pool.
pub async fn run_rank<S, B>(mut comm: Communicator, read_budget: B, source: S) -> Result<Outcome, RunError>
where
    S: UniformSource + Send + 'static,
    B: FnOnce() -> Result<u64, InputError> + Send + 'static,
{
    if comm.is_coordinator() {
        let budget = task::spawn_blocking(read_budget)
            .await
            .map_err(|_| CommError::RankPanicked { rank: comm.rank() })??;
        let report = run_coordinator(&mut comm, budget, source).await?;
        Ok(Outcome::Coordinator(report))
    } else {
        let hits = run_worker(&mut comm, source).await?;
        Ok(Outcome::Worker {
            rank: comm.rank(),
            hits,
        })
    }
}
