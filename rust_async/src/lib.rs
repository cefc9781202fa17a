//! Tokio runtime for the Monte Carlo pi protocol: one task per rank, channels
//! for distribution and a shared barrier for the collectives. Sampling,
//! distribution and estimation come from `mc_pi`.

pub mod monte_carlo;
pub mod world;

pub use monte_carlo::{run_coordinator, run_rank, run_worker};
pub use world::{communicators, launch, Communicator};
