use std::io;
use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mc_pi::input::{read_budget, PROMPT};
use mc_pi::{run_rank, Outcome, SeedMode, SeedPolicy, SourceKind, World};

#[derive(Parser)]
#[command(name = "mc_pi")]
#[command(version)]
#[command(about = "Monte Carlo pi estimation across cooperating ranks (one thread per rank)")]
struct Cli {
    /// Number of ranks, coordinator included
    #[arg(short = 'n', long, env = "PI_PROCESSES", default_value = "4")]
    processes: NonZeroUsize,

    /// Run-level seed mixed with each rank
    #[arg(long, env = "PI_SEED")]
    seed: Option<u64>,

    /// How ranks seed their generators
    #[arg(long, value_enum, default_value_t = SeedMode::PerRank)]
    seed_mode: SeedMode,

    /// Random source used by every rank
    #[arg(long, value_enum, default_value_t = SourceKind::Std)]
    source: SourceKind,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let policy = SeedPolicy::resolve(cli.seed_mode, cli.seed);
    let source_kind = cli.source;

    let outcomes = World::launch(cli.processes, |comm| {
        let mut source = source_kind.build(policy.seed_for(comm.rank()));
        run_rank(
            &comm,
            || {
                eprintln!("{PROMPT}");
                read_budget(&mut io::stdin().lock())
            },
            source.as_mut(),
        )
    })
    .context("failed to run ranks")?;

    for (rank, outcome) in outcomes.into_iter().enumerate() {
        if let Outcome::Coordinator(report) =
            outcome.with_context(|| format!("rank {rank} failed"))?
        {
            report.log();
            println!("{}", report.summary_line());
        }
    }

    Ok(())
}
