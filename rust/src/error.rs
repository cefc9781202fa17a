use std::num::ParseIntError;

use thiserror::Error;

use crate::Rank;

/// Failures while reading the sample budget at the coordinator.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read the sample budget: {0}")]
    Io(#[from] std::io::Error),

    #[error("no sample budget was provided")]
    Missing,

    #[error("invalid sample budget {input:?}: {source}")]
    Malformed {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("sample budget must be positive")]
    Zero,
}

/// Transport and collective failures. All of them are fatal to the run.
#[derive(Debug, Error)]
pub enum CommError {
    #[error("rank {from} has no route to rank {to}")]
    NoRoute { from: Rank, to: Rank },

    #[error("rank {to} is unreachable")]
    Disconnected { to: Rank },

    #[error("inbox of rank {rank} closed before the expected message arrived")]
    InboxClosed { rank: Rank },

    #[error("rank {rank} expected {expected} but received {received}")]
    Unexpected {
        rank: Rank,
        expected: &'static str,
        received: &'static str,
    },

    #[error("rank {rank} is not the coordinator")]
    NotCoordinator { rank: Rank },

    #[error("failed to spawn rank {rank}: {source}")]
    Spawn {
        rank: Rank,
        #[source]
        source: std::io::Error,
    },

    #[error("rank {rank} panicked")]
    RankPanicked { rank: Rank },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Comm(#[from] CommError),
}
