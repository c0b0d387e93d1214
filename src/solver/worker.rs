use crate::core::vertex::NodeId;
use crate::graph::tombstone::TombstoneGraph;
use crate::solver::event::{Request, Response};
use crossbeam::channel::{Receiver, Sender};
use log::debug;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

/// One solver worker: a private graph replica plus a generation-ordered
/// event heap.
///
/// Every worker consumes the *same* arc stream and mirrors it into its own
/// graph, but only checks cycle closure for the arcs whose generation number
/// equals its index modulo the pool size. Inbound events (removals, checks
/// re-submitted by the pool, shutdown) are heaped and only serviced once the
/// worker's feed generation has reached theirs, which keeps every check
/// consistent with the exact graph state it was issued against.
///
/// While the feed lasts, the request channel is drained without blocking
/// between arcs; once the feed is exhausted the worker publishes a
/// [`Response::Finished`] sentinel and falls back to blocking receives.
pub(crate) struct Worker {
    index: u64,
    pool_size: u64,
    arcs: Arc<Vec<(NodeId, NodeId)>>,
    cursor: usize,
    request_rx: Receiver<Request>,
    response_tx: Sender<Response>,
    graph: TombstoneGraph,
    events: BinaryHeap<Reverse<Request>>,
    removed_arcs: HashSet<(NodeId, NodeId)>,
    generation: u64,
    feed_exhausted: bool,
    shutdown: bool,
}

impl Worker {
    pub(crate) fn new(
        index: u64,
        pool_size: u64,
        arcs: Arc<Vec<(NodeId, NodeId)>>,
        request_rx: Receiver<Request>,
        response_tx: Sender<Response>,
    ) -> Self {
        debug_assert!(index < pool_size);
        Self {
            index,
            pool_size,
            arcs,
            cursor: 0,
            request_rx,
            response_tx,
            graph: TombstoneGraph::new(),
            events: BinaryHeap::new(),
            removed_arcs: HashSet::new(),
            generation: 0,
            feed_exhausted: false,
            shutdown: false,
        }
    }

    pub(crate) fn run(mut self) {
        debug!("solver worker {} started", self.index);
        while !self.shutdown {
            if self.feed_exhausted {
                self.wait_for_request();
            } else {
                self.feed_next_arc();
                self.fetch_requests();
            }
            self.process_ready_events();
        }
        debug!("solver worker {} exiting", self.index);
    }

    /// Blocking receive, used only after the arc feed is exhausted.
    fn wait_for_request(&mut self) {
        match self.request_rx.recv() {
            Ok(request) => self.events.push(Reverse(request)),
            // The pool is gone; nothing more can arrive.
            Err(_) => self.shutdown = true,
        }
    }

    /// Drain whatever is queued right now, without blocking the feed.
    fn fetch_requests(&mut self) {
        while let Ok(request) = self.request_rx.try_recv() {
            self.events.push(Reverse(request));
        }
    }

    /// Mirror the next arc of the shared stream into the private replica,
    /// and self-enqueue a closure check if this worker owns its generation.
    fn feed_next_arc(&mut self) {
        let Some(&(u, v)) = self.arcs.get(self.cursor) else {
            self.feed_exhausted = true;
            debug!(
                "solver worker {} exhausted its feed at generation {}",
                self.index, self.generation
            );
            if self.response_tx.send(Response::Finished).is_err() {
                self.shutdown = true;
            }
            return;
        };
        self.cursor += 1;
        self.generation += 1;
        // An arc the pool already broadcast a removal for must not
        // resurface when the feed catches up with it.
        if !self.removed_arcs.contains(&(u, v)) {
            self.graph.add_arc(u, v);
        }
        if self.generation % self.pool_size == self.index {
            self.events.push(Reverse(Request::CloseCheck {
                gen: self.generation,
                u,
                v,
            }));
        }
    }

    /// Service every heaped event whose generation the feed has reached.
    fn process_ready_events(&mut self) {
        loop {
            let Some(&Reverse(next)) = self.events.peek() else {
                break;
            };
            match next {
                Request::Shutdown => {
                    self.shutdown = true;
                    break;
                }
                // Do not judge a check against graph state from its future.
                Request::CloseCheck { gen, .. } if gen > self.generation => break,
                _ => {}
            }
            let Some(Reverse(request)) = self.events.pop() else {
                break;
            };
            match request {
                Request::RemoveArc { u, v } => {
                    self.graph.remove_arc(u, v);
                    self.removed_arcs.insert((u, v));
                }
                Request::CloseCheck { u, v, .. } => {
                    if self.graph.has_arc(u, v) {
                        if let Some(path) = self.graph.find_path(v, u) {
                            let response = Response::Cycle {
                                origin: request,
                                path,
                            };
                            if self.response_tx.send(response).is_err() {
                                self.shutdown = true;
                                break;
                            }
                        }
                    }
                }
                Request::Shutdown => unreachable!("handled at peek"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::{bounded, unbounded};

    fn n(party: u32) -> NodeId {
        NodeId::account(party)
    }

    fn run_worker(arcs: Vec<(NodeId, NodeId)>) -> (Sender<Request>, Receiver<Response>) {
        let (request_tx, request_rx) = unbounded();
        let (response_tx, response_rx) = bounded(64);
        let worker = Worker::new(0, 1, Arc::new(arcs), request_rx, response_tx);
        std::thread::spawn(move || worker.run());
        (request_tx, response_rx)
    }

    #[test]
    fn test_worker_reports_cycle_then_finishes() {
        let arcs = vec![(n(1), n(2)), (n(2), n(3)), (n(3), n(1))];
        let (request_tx, response_rx) = run_worker(arcs);

        let mut cycle_path = None;
        let mut finished = false;
        for _ in 0..2 {
            match response_rx.recv().expect("worker is alive") {
                Response::Cycle { origin, path } => {
                    assert!(matches!(origin, Request::CloseCheck { gen: 3, .. }));
                    cycle_path = Some(path);
                }
                Response::Finished => finished = true,
            }
        }
        assert!(finished);
        assert_eq!(cycle_path, Some(vec![n(1), n(2), n(3)]));

        request_tx.send(Request::Shutdown).unwrap();
    }

    #[test]
    fn test_removal_suppresses_cycle() {
        let arcs = vec![(n(1), n(2)), (n(2), n(1))];
        let (request_tx, request_rx) = unbounded();
        let (response_tx, response_rx) = bounded(64);

        // The removal is queued before the worker starts feeding, so it is
        // applied at generation 0 and the arc never resurfaces.
        request_tx.send(Request::RemoveArc { u: n(2), v: n(1) }).unwrap();

        let worker = Worker::new(0, 1, Arc::new(arcs), request_rx, response_tx);
        std::thread::spawn(move || worker.run());

        assert_eq!(response_rx.recv().unwrap(), Response::Finished);
        request_tx.send(Request::Shutdown).unwrap();
    }

    #[test]
    fn test_partitioned_worker_skips_foreign_generations() {
        // Worker 1 of 2 owns odd generations only; the cycle closes at
        // generation 2, owned by worker 0, so this worker stays silent.
        let arcs = vec![(n(1), n(2)), (n(2), n(1))];
        let (request_tx, request_rx) = unbounded();
        let (response_tx, response_rx) = bounded(64);

        let worker = Worker::new(1, 2, Arc::new(arcs), request_rx, response_tx);
        std::thread::spawn(move || worker.run());

        assert_eq!(response_rx.recv().unwrap(), Response::Finished);
        assert!(response_rx.try_recv().is_err());
        request_tx.send(Request::Shutdown).unwrap();
    }
}
