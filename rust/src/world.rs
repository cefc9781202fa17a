use std::num::NonZeroUsize;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Barrier};
use std::thread;

use tracing::debug;

use crate::error::CommError;
use crate::{Rank, COORDINATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Share(u64),
    Partial { from: Rank, hits: u64 },
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Share(_) => "share",
            Message::Partial { .. } => "partial hit count",
        }
    }
}

/// One rank's endpoint: its inbox, the outboxes it is allowed to use and the
/// barrier shared by every rank of the run.
///
/// Routes form a star around the coordinator. The coordinator can reach
/// every worker and every worker can reach only the coordinator, so a rank
/// that exits early closes the inboxes waiting on it.
pub struct Communicator {
    rank: Rank,
    size: NonZeroUsize,
    inbox: Receiver<Message>,
    outboxes: Vec<Option<Sender<Message>>>,
    barrier: Arc<Barrier>,
}

impl Communicator {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn size(&self) -> NonZeroUsize {
        self.size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }

    /// Fire-and-forget, ordered per destination.
    pub fn send(&self, to: Rank, message: Message) -> Result<(), CommError> {
        let outbox = self
            .outboxes
            .get(to)
            .and_then(Option::as_ref)
            .ok_or(CommError::NoRoute { from: self.rank, to })?;
        outbox
            .send(message)
            .map_err(|_| CommError::Disconnected { to })
    }

    pub fn recv(&self) -> Result<Message, CommError> {
        self.inbox
            .recv()
            .map_err(|_| CommError::InboxClosed { rank: self.rank })
    }

    /// Non-blocking receive; `None` while the inbox is empty.
    pub fn try_recv(&self) -> Result<Option<Message>, CommError> {
        match self.inbox.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(CommError::InboxClosed { rank: self.rank }),
        }
    }

    /// Coordinator side of the distribution: one `Share` to every worker.
    pub fn distribute_share(&self, share: u64) -> Result<(), CommError> {
        if !self.is_coordinator() {
            return Err(CommError::NotCoordinator { rank: self.rank });
        }
        for worker in 1..self.size.get() {
            self.send(worker, Message::Share(share))?;
        }
        debug!(rank = self.rank, share, workers = self.size.get() - 1, "distributed share");
        Ok(())
    }

    /// Worker side of the distribution. Blocks until the share arrives.
    pub fn receive_share(&self) -> Result<u64, CommError> {
        match self.recv()? {
            Message::Share(share) => {
                debug!(rank = self.rank, share, "received share");
                Ok(share)
            }
            other => Err(CommError::Unexpected {
                rank: self.rank,
                expected: "share",
                received: other.kind(),
            }),
        }
    }

    pub fn barrier(&self) {
        let result = self.barrier.wait();
        debug!(rank = self.rank, leader = result.is_leader(), "passed barrier");
    }

    /// Sum every rank's `local` value at the coordinator. Returns `Some(total)`
    /// on the coordinator and `None` elsewhere, in both cases only after every
    /// rank has contributed.
    pub fn reduce_sum(&self, local: u64) -> Result<Option<u64>, CommError> {
        let total = if self.is_coordinator() {
            let mut total = local;
            let mut seen = vec![false; self.size.get()];
            seen[COORDINATOR] = true;
            for _ in 1..self.size.get() {
                match self.recv()? {
                    Message::Partial { from, hits } if from < seen.len() && !seen[from] => {
                        seen[from] = true;
                        total += hits;
                    }
                    other => {
                        return Err(CommError::Unexpected {
                            rank: self.rank,
                            expected: "partial hit count from a new rank",
                            received: other.kind(),
                        })
                    }
                }
            }
            Some(total)
        } else {
            self.send(
                COORDINATOR,
                Message::Partial {
                    from: self.rank,
                    hits: local,
                },
            )?;
            None
        };

        self.barrier.wait();
        debug!(rank = self.rank, ?total, "reduction complete");
        Ok(total)
    }
}

pub struct World;

impl World {
    /// Wire up `size` communicators in rank order.
    pub fn communicators(size: NonZeroUsize) -> Vec<Communicator> {
        let n = size.get();
        let barrier = Arc::new(Barrier::new(n));
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::channel()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| {
                let outboxes = (0..n)
                    .map(|to| {
                        let routed = if rank == COORDINATOR {
                            to != COORDINATOR
                        } else {
                            to == COORDINATOR
                        };
                        routed.then(|| senders[to].clone())
                    })
                    .collect();
                Communicator {
                    rank,
                    size,
                    inbox,
                    outboxes,
                    barrier: Arc::clone(&barrier),
                }
            })
            .collect()
    }

    /// Run `body` once per rank, each on its own thread, and collect the
    /// results in rank order.
    pub fn launch<T, F>(size: NonZeroUsize, body: F) -> Result<Vec<T>, CommError>
    where
        T: Send,
        F: Fn(Communicator) -> T + Sync,
    {
        let body = &body;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(size.get());
            for comm in World::communicators(size) {
                let rank = comm.rank();
                let handle = thread::Builder::new()
                    .name(format!("rank-{rank}"))
                    .spawn_scoped(scope, move || body(comm))
                    .map_err(|source| CommError::Spawn { rank, source })?;
                handles.push(handle);
            }

            // Join every rank before reporting so no panic is left unobserved.
            let joined: Vec<_> = handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| handle.join().map_err(|_| CommError::RankPanicked { rank }))
                .collect();
            joined.into_iter().collect()
        })
    }
}
