use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Rank;

/// A source of uniform doubles in `[0, 1)`.
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

impl UniformSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl<S: UniformSource + ?Sized> UniformSource for Box<S> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Linear Congruential Generator, Numerical Recipes constants.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg {
            state: (seed ^ (seed >> 32)) as u32,
        }
    }
}

impl UniformSource for Lcg {
    fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        (self.state & 0x7FFF_FFFF) as f64 / 2_147_483_648.0
    }
}

/// Replays a fixed list of unit values, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<f64>,
    draws: usize,
}

impl FixedSequence {
    pub fn new(values: Vec<f64>) -> Self {
        FixedSequence { values, draws: 0 }
    }

    /// One `(x, y)` draw per outcome: `(0.5, 0.5)` lands on the origin (a hit),
    /// `(0.0, 0.0)` lands on the corner `(-1, -1)` (a miss).
    pub fn scripted(outcomes: &[bool]) -> Self {
        let values = outcomes
            .iter()
            .flat_map(|&hit| if hit { [0.5, 0.5] } else { [0.0, 0.0] })
            .collect();
        FixedSequence::new(values)
    }

    /// Number of values handed out so far.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl UniformSource for FixedSequence {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.draws % self.values.len()];
        self.draws += 1;
        value
    }
}

/// Generator used by every rank of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// `rand`'s standard generator.
    Std,
    /// The 32-bit LCG, reproducible across platforms.
    Lcg,
}

impl SourceKind {
    pub fn build(self, seed: u64) -> Box<dyn UniformSource + Send> {
        match self {
            SourceKind::Std => Box::new(StdRng::seed_from_u64(seed)),
            SourceKind::Lcg => Box::new(Lcg::new(seed)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SeedMode {
    /// Mix one run-level seed with each rank.
    PerRank,
    /// Seed every rank from the wall clock in seconds. Ranks started within
    /// the same second draw identical streams.
    WallClock,
}

/// How each rank seeds its generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    WallClock,
    PerRank { run_seed: u64 },
}

impl SeedPolicy {
    /// Resolve the configured mode. Without an explicit seed, `PerRank` reads
    /// the clock once at nanosecond resolution and shares it across ranks.
    pub fn resolve(mode: SeedMode, seed: Option<u64>) -> Self {
        match mode {
            SeedMode::WallClock => SeedPolicy::WallClock,
            SeedMode::PerRank => SeedPolicy::PerRank {
                run_seed: seed.unwrap_or_else(clock_nanos),
            },
        }
    }

    pub fn seed_for(&self, rank: Rank) -> u64 {
        match *self {
            SeedPolicy::WallClock => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            SeedPolicy::PerRank { run_seed } => splitmix64(
                run_seed.wrapping_add((rank as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            ),
        }
    }
}

fn clock_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// Bijective, so distinct ranks never collide on a seed.
fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lcg_stays_in_half_open_unit_interval() {
        let mut lcg = Lcg::new(12345);
        for _ in 0..100_000 {
            let u = lcg.next_unit();
            assert!((0.0..1.0).contains(&u), "{u} out of range");
        }
    }

    #[test]
    fn lcg_is_reproducible() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn fixed_sequence_wraps_and_counts_draws() {
        let mut seq = FixedSequence::new(vec![0.1, 0.2]);
        assert_eq!(seq.next_unit(), 0.1);
        assert_eq!(seq.next_unit(), 0.2);
        assert_eq!(seq.next_unit(), 0.1);
        assert_eq!(seq.draws(), 3);
    }

    #[test]
    fn empty_fixed_sequence_yields_zero() {
        let mut seq = FixedSequence::new(Vec::new());
        assert_eq!(seq.next_unit(), 0.0);
    }

    #[test]
    fn per_rank_seeds_are_distinct() {
        let policy = SeedPolicy::PerRank { run_seed: 7 };
        let seeds: HashSet<u64> = (0..1024).map(|rank| policy.seed_for(rank)).collect();
        assert_eq!(seeds.len(), 1024);
    }

    #[test]
    fn per_rank_seeds_are_stable_for_a_run_seed() {
        let a = SeedPolicy::resolve(SeedMode::PerRank, Some(99));
        let b = SeedPolicy::resolve(SeedMode::PerRank, Some(99));
        assert_eq!(a.seed_for(3), b.seed_for(3));
    }

    #[test]
    fn wall_clock_mode_ignores_the_seed() {
        assert_eq!(
            SeedPolicy::resolve(SeedMode::WallClock, Some(1)),
            SeedPolicy::WallClock
        );
    }

    #[test]
    fn std_source_stays_in_unit_interval() {
        let mut source = SourceKind::Std.build(5);
        for _ in 0..10_000 {
            let u = source.next_unit();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
