//! Monte Carlo estimation of pi across cooperating ranks.
//!
//! A unit circle fills pi / 4 of its bounding square `[-1, 1] x [-1, 1]`, so
//! four times the fraction of uniform points landing inside the circle
//! approximates pi.
//!
//! Rank 0 is the coordinator. It splits the sample budget evenly (truncating)
//! across all ranks, sends each worker its share, samples its own share, and
//! after a barrier sums every rank's hit count to derive the estimate. Ranks
//! share no memory; they only exchange messages and meet at collectives.

pub mod distributor;
pub mod error;
pub mod estimator;
pub mod input;
pub mod monte_carlo;
pub mod random;
pub mod role;
pub mod world;

/// A rank's identity within a run, in `[0, size)`.
pub type Rank = usize;

pub const COORDINATOR: Rank = 0;

pub use distributor::{share_for, Distribution};
pub use error::{CommError, InputError, RunError};
pub use estimator::{estimate, format_estimate, RunReport};
pub use monte_carlo::count_hits;
pub use random::{FixedSequence, Lcg, SeedMode, SeedPolicy, SourceKind, UniformSource};
pub use role::{run_coordinator, run_rank, run_worker, Outcome};
pub use world::{Communicator, Message, World};
