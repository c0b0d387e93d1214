use crate::core::vertex::NodeId;
use crate::solver::event::{Request, Response};
use crate::solver::worker::Worker;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::debug;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// The bond set holds no further clearable cycle.
///
/// This is the normal termination signal of a drain loop, not a fault:
/// every worker has exhausted its feed and the response channel stayed
/// silent for a full timeout.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no clearable cycle remains")]
pub struct PathNotFound;

/// Per-worker capacity of the inbound request channels.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Response-channel capacity per worker.
const RESPONSE_SLOTS_PER_WORKER: usize = 10;

/// How long `wait_for_cycle` listens before concluding that the workers
/// can make no more progress.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// An asynchronous pool of cycle-finding workers.
///
/// Every worker replays the same arc stream into a private graph replica —
/// there is no shared graph and no lock. Closure checks are partitioned
/// over the workers by arc generation, so each arc is checked exactly once
/// across the pool; discovered cycles arrive on one shared, bounded
/// response channel.
///
/// Outbound requests go through per-worker retry buffers and non-blocking
/// sends: the pool never parks on a full request channel while a worker is
/// parked on the full response channel, which is what rules out deadlock
/// between the two bounded directions.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
/// use barter_engine::solver::pool::SolverPool;
///
/// let a = NodeId::account(1);
/// let b = NodeId::account(2);
/// let c = NodeId::account(3);
///
/// let mut pool = SolverPool::spawn(vec![(a, b), (b, c), (c, a)], 2);
/// let path = pool.wait_for_cycle().unwrap();
/// assert_eq!(path.len(), 3);
/// pool.stop();
/// ```
#[derive(Debug)]
pub struct SolverPool {
    request_txs: Vec<Sender<Request>>,
    response_rx: Receiver<Response>,
    workers: Vec<JoinHandle<()>>,
    unfinished_workers: usize,
    retry_buffers: Vec<VecDeque<Request>>,
    pending_check: Option<Request>,
    response_timeout: Duration,
}

impl SolverPool {
    /// Spawn `pool_size` workers over the given arc stream.
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` is zero.
    pub fn spawn(arcs: Vec<(NodeId, NodeId)>, pool_size: usize) -> Self {
        Self::spawn_with_timeout(arcs, pool_size, DEFAULT_RESPONSE_TIMEOUT)
    }

    /// Spawn with an explicit no-progress timeout instead of
    /// [`DEFAULT_RESPONSE_TIMEOUT`].
    pub fn spawn_with_timeout(
        arcs: Vec<(NodeId, NodeId)>,
        pool_size: usize,
        response_timeout: Duration,
    ) -> Self {
        assert!(pool_size > 0, "solver pool needs at least one worker");
        let arcs = Arc::new(arcs);
        let (response_tx, response_rx) = bounded(RESPONSE_SLOTS_PER_WORKER * pool_size);

        let mut request_txs = Vec::with_capacity(pool_size);
        let mut workers = Vec::with_capacity(pool_size);
        for index in 0..pool_size {
            let (request_tx, request_rx) = bounded(REQUEST_CHANNEL_CAPACITY);
            let worker = Worker::new(
                index as u64,
                pool_size as u64,
                Arc::clone(&arcs),
                request_rx,
                response_tx.clone(),
            );
            request_txs.push(request_tx);
            workers.push(
                thread::Builder::new()
                    .name(format!("solver-{}", index))
                    .spawn(move || worker.run())
                    .expect("failed to spawn solver worker"),
            );
        }
        debug!("solver pool started with {} workers", pool_size);

        Self {
            request_txs,
            response_rx,
            workers,
            unfinished_workers: pool_size,
            retry_buffers: vec![VecDeque::new(); pool_size],
            pending_check: None,
            response_timeout,
        }
    }

    /// Block until some worker reports a cycle.
    ///
    /// The returned path runs from the head of the closing arc back to its
    /// tail. The closure check that produced it is remembered and
    /// re-submitted to a randomly chosen worker on the next call, since a
    /// partially cleared arc can close further cycles.
    ///
    /// Returns [`PathNotFound`] once every worker has reported finished and
    /// a full timeout passes without a response.
    pub fn wait_for_cycle(&mut self) -> Result<Vec<NodeId>, PathNotFound> {
        if let Some(request) = self.pending_check.take() {
            let target = rand::thread_rng().gen_range(0..self.retry_buffers.len());
            self.retry_buffers[target].push_back(request);
        }
        loop {
            self.flush_retry_buffers();
            match self.response_rx.recv_timeout(self.response_timeout) {
                Ok(Response::Cycle { origin, path }) => {
                    self.pending_check = Some(origin);
                    return Ok(path);
                }
                Ok(Response::Finished) => {
                    self.unfinished_workers -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.unfinished_workers == 0 {
                        return Err(PathNotFound);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return Err(PathNotFound),
            }
        }
    }

    /// Broadcast the removal of `u -> v` to every worker.
    ///
    /// Removals apply as soon as each worker sees them: a bond that fell
    /// below the minimum meaningful amount must vanish from every replica
    /// without waiting for any generation.
    pub fn remove_arc(&mut self, u: NodeId, v: NodeId) {
        for buffer in &mut self.retry_buffers {
            buffer.push_back(Request::RemoveArc { u, v });
        }
    }

    /// Shut the pool down and join every worker.
    ///
    /// A dedicated consumer drains the response channel while the workers
    /// wind down, so none of them can block forever publishing a final
    /// message into a full channel.
    pub fn stop(self) {
        let SolverPool {
            request_txs,
            response_rx,
            workers,
            ..
        } = self;

        let consumer = thread::spawn(move || while response_rx.recv().is_ok() {});
        for request_tx in &request_txs {
            // A worker gone early has already shut down; ignore it.
            let _ = request_tx.send(Request::Shutdown);
        }
        for worker in workers {
            let _ = worker.join();
        }
        // All worker-held senders are dropped now; the consumer sees the
        // channel disconnect and exits.
        drop(request_txs);
        let _ = consumer.join();
        debug!("solver pool stopped");
    }

    /// Push buffered requests out with non-blocking sends; whatever does
    /// not fit stays buffered for the next flush.
    fn flush_retry_buffers(&mut self) {
        for (buffer, request_tx) in self.retry_buffers.iter_mut().zip(&self.request_txs) {
            while let Some(request) = buffer.pop_front() {
                match request_tx.try_send(request) {
                    Ok(()) => {}
                    Err(TrySendError::Full(request)) => {
                        buffer.push_front(request);
                        break;
                    }
                    // The worker already exited; its requests are moot.
                    Err(TrySendError::Disconnected(_)) => {
                        buffer.clear();
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn n(party: u32) -> NodeId {
        NodeId::account(party)
    }

    fn test_pool(arcs: Vec<(NodeId, NodeId)>, pool_size: usize) -> SolverPool {
        SolverPool::spawn_with_timeout(arcs, pool_size, Duration::from_millis(50))
    }

    #[test]
    fn test_finds_cycle() {
        let arcs = vec![(n(1), n(2)), (n(2), n(3)), (n(3), n(1))];
        let mut pool = test_pool(arcs, 2);

        let path = pool.wait_for_cycle().expect("cycle exists");
        let vertices: HashSet<NodeId> = path.iter().copied().collect();
        assert_eq!(vertices, HashSet::from([n(1), n(2), n(3)]));
        pool.stop();
    }

    #[test]
    fn test_drain_terminates_after_removal() {
        let arcs = vec![(n(1), n(2)), (n(2), n(3)), (n(3), n(1))];
        let mut pool = test_pool(arcs, 2);

        assert!(pool.wait_for_cycle().is_ok());
        pool.remove_arc(n(2), n(3));

        // Stale re-checks of the unbroken arcs may surface for a while,
        // but the drain must terminate.
        while pool.wait_for_cycle().is_ok() {}
        assert_eq!(pool.wait_for_cycle(), Err(PathNotFound));
        pool.stop();
    }

    #[test]
    fn test_no_cycle_raises_path_not_found() {
        let arcs = vec![(n(1), n(2)), (n(2), n(3))];
        let mut pool = test_pool(arcs, 3);
        assert_eq!(pool.wait_for_cycle(), Err(PathNotFound));
        pool.stop();
    }

    #[test]
    fn test_empty_stream() {
        let mut pool = test_pool(Vec::new(), 2);
        assert_eq!(pool.wait_for_cycle(), Err(PathNotFound));
        pool.stop();
    }

    #[test]
    fn test_single_worker_pool() {
        let arcs = vec![(n(7), n(7))];
        let mut pool = test_pool(arcs, 1);
        assert_eq!(pool.wait_for_cycle(), Ok(vec![n(7), n(7)]));
        pool.stop();
    }

    #[test]
    #[should_panic(expected = "at least one worker")]
    fn test_zero_workers_panics() {
        SolverPool::spawn(Vec::new(), 0);
    }
}
