use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Barrier;
use tokio::task;
use tracing::debug;

use mc_pi::{CommError, Message, Rank, COORDINATOR};

/// Task-based counterpart of `mc_pi::Communicator`, with the same star routing.
pub struct Communicator {
    rank: Rank,
    size: NonZeroUsize,
    inbox: UnboundedReceiver<Message>,
    outboxes: Vec<Option<UnboundedSender<Message>>>,
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

    pub async fn recv(&mut self) -> Result<Message, CommError> {
        self.inbox
            .recv()
            .await
            .ok_or(CommError::InboxClosed { rank: self.rank })
    }

    pub fn try_recv(&mut self) -> Result<Option<Message>, CommError> {
        match self.inbox.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(CommError::InboxClosed { rank: self.rank }),
        }
    }

    pub fn distribute_share(&self, share: u64) -> Result<(), CommError> {
        if !self.is_coordinator() {
            return Err(CommError::NotCoordinator { rank: self.rank });
        }
        for worker in 1..self.size.get() {
            self.send(worker, Message::Share(share))?;
        }
        debug!(rank = self.rank, share, "distributed share");
        Ok(())
    }

    pub async fn receive_share(&mut self) -> Result<u64, CommError> {
        match self.recv().await? {
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

    pub async fn barrier(&self) {
        let result = self.barrier.wait().await;
        debug!(rank = self.rank, leader = result.is_leader(), "passed barrier");
    }

    /// `Some(total)` on the coordinator, `None` elsewhere; returns on every rank
    /// only once all contributions are in.
    pub async fn reduce_sum(&mut self, local: u64) -> Result<Option<u64>, CommError> {
        let total = if self.is_coordinator() {
            let mut total = local;
            let mut seen = vec![false; self.size.get()];
            seen[COORDINATOR] = true;
            for _ in 1..self.size.get() {
                match self.recv().await? {
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

        self.barrier.wait().await;
        debug!(rank = self.rank, ?total, "reduction complete");
        Ok(total)
    }
}

pub fn communicators(size: NonZeroUsize) -> Vec<Communicator> {
    let n = size.get();
    let barrier = Arc::new(Barrier::new(n));
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::unbounded_channel()).unzip();

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

/// Spawn one task per rank and await them in rank order.
pub async fn launch<T, F, Fut>(size: NonZeroUsize, body: F) -> Result<Vec<T>, CommError>
where
    F: Fn(Communicator) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = communicators(size)
        .into_iter()
        .map(|comm| task::spawn(body(comm)))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    let mut failure = None;
    for (rank, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(result) => results.push(result),
            Err(_) => {
                failure.get_or_insert(CommError::RankPanicked { rank });
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn workers_cannot_reach_each_other() {
        let comms = communicators(nz(3));
        assert!(comms[0].send(2, Message::Share(1)).is_ok());
        assert!(matches!(
            comms[2].send(1, Message::Share(1)),
            Err(CommError::NoRoute { from: 2, to: 1 })
        ));
    }

    #[tokio::test]
    async fn share_reaches_worker() {
        let mut comms = communicators(nz(2));
        comms[0].distribute_share(9).unwrap();
        assert_eq!(comms[1].receive_share().await.unwrap(), 9);
    }

    #[tokio::test]
    async fn worker_inbox_closes_with_coordinator() {
        let mut comms = communicators(nz(2));
        let mut worker = comms.pop().unwrap();
        drop(comms);
        assert!(matches!(
            worker.receive_share().await,
            Err(CommError::InboxClosed { rank: 1 })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn barrier_holds_every_task_until_the_last_arrives() {
        let arrived = Arc::new(AtomicUsize::new(0));
        let observed = launch(nz(4), |comm| {
            let arrived = Arc::clone(&arrived);
            async move {
                if comm.rank() == 3 {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                arrived.fetch_add(1, Ordering::SeqCst);
                comm.barrier().await;
                arrived.load(Ordering::SeqCst)
            }
        })
        .await
        .unwrap();
        assert_eq!(observed, vec![4; 4]);
    }

    #[tokio::test]
    async fn try_recv_is_empty_until_a_message_is_sent() {
        let mut comms = communicators(nz(2));
        assert_eq!(comms[1].try_recv().unwrap(), None);
        comms[0].send(1, Message::Share(2)).unwrap();
        assert_eq!(comms[1].try_recv().unwrap(), Some(Message::Share(2)));
    }

    #[tokio::test]
    async fn reduce_sums_at_coordinator_only() {
        let results = launch(nz(4), |mut comm| async move {
            let local = comm.rank() as u64 + 1;
            comm.reduce_sum(local).await.unwrap()
        })
        .await
        .unwrap();
        assert_eq!(results, vec![Some(10), None, None, None]);
    }

    #[tokio::test]
    async fn panicked_task_is_reported() {
        let result = launch(nz(1), |_comm| async move {
            panic!("boom");
        })
        .await;
        assert!(matches!(result, Err(CommError::RankPanicked { rank: 0 })));
    }
}
