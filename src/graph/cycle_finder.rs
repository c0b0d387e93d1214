use crate::core::vertex::NodeId;
use crate::graph::tombstone::TombstoneGraph;
use std::collections::HashSet;

/// One suspended position of the depth-first search: a vertex and the
/// cursor into its successor list where scanning resumes.
#[derive(Debug, Clone, Copy)]
struct Frame {
    vertex: NodeId,
    cursor: usize,
}

impl Frame {
    fn new(vertex: NodeId) -> Self {
        Self { vertex, cursor: 0 }
    }
}

/// A resumable cycle search over a [`TombstoneGraph`].
///
/// The search walks depth-first from the root sentinel, which points at
/// every vertex that ever had outgoing arcs. Unlike a one-shot DFS there is
/// no global visited set: a cycle is detected when the next successor is an
/// *ancestor* of the current position, i.e. still on the stack. That makes
/// the search restartable — the stack and the ancestor set persist between
/// calls, vertices exhausted once are sunk from the graph and never walked
/// again, and arcs added to the graph after a call will still be discovered
/// by later calls.
///
/// The finder holds no reference to the graph; every call borrows the graph
/// it was started over. Removing arcs between calls is fine, adding arcs is
/// fine too.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
/// use barter_engine::graph::cycle_finder::CycleFinder;
/// use barter_engine::graph::tombstone::TombstoneGraph;
///
/// let a = NodeId::account(1);
/// let b = NodeId::account(2);
/// let c = NodeId::account(3);
///
/// let mut graph = TombstoneGraph::new();
/// graph.add_arc(a, b);
/// graph.add_arc(b, c);
/// graph.add_arc(c, a);
///
/// let mut finder = CycleFinder::new();
/// let cycle = finder.find_cycle(&mut graph).unwrap();
/// assert_eq!(cycle.len(), 3);
///
/// // Nothing was removed, so the same cycle comes back.
/// assert_eq!(finder.find_cycle(&mut graph), Some(cycle));
/// ```
#[derive(Debug)]
pub struct CycleFinder {
    frames: Vec<Frame>,
    on_stack: HashSet<NodeId>,
}

impl CycleFinder {
    pub fn new() -> Self {
        let mut on_stack = HashSet::new();
        on_stack.insert(NodeId::ROOT);
        Self {
            frames: vec![Frame::new(NodeId::ROOT)],
            on_stack,
        }
    }

    /// Advance the search until a cycle closes or the graph is exhausted.
    ///
    /// A found cycle is returned as an open rotation `[v0, .., vn]` whose
    /// closing arc is `vn -> v0`; a self-loop comes back as `[u]`. Before
    /// returning, the cursor of the frame the search resumes at is stepped
    /// back by one, so the arc that closed the cycle is examined again on
    /// the next call — it may still be alive after partial clearing.
    ///
    /// `None` means the current graph state holds no further cycle. The
    /// caller may add arcs and call again; work is never repeated because
    /// exhausted vertices have been sunk.
    pub fn find_cycle(&mut self, graph: &mut TombstoneGraph) -> Option<Vec<NodeId>> {
        loop {
            let (current, next) = {
                let top = self.frames.last_mut()?;
                let mut next = None;
                if let Some(list) = graph.successors(top.vertex) {
                    while top.cursor < list.len() {
                        let slot = list[top.cursor];
                        top.cursor += 1;
                        if slot.is_some() {
                            next = slot;
                            break;
                        }
                    }
                }
                (top.vertex, next)
            };

            let Some(next) = next else {
                if current.is_root() {
                    // The seed list is spent. The root frame stays put at
                    // its cursor so arcs registered later resume the scan
                    // instead of restarting it.
                    return None;
                }
                // The vertex is exhausted: nothing live remains behind the
                // cursor, so it can never take part in a cycle again.
                graph.sink_vertex(current);
                self.on_stack.remove(&current);
                self.frames.pop();
                continue;
            };

            if self.on_stack.contains(&next) {
                // The successor is an ancestor: unwind down to it.
                let mut path = vec![next];
                while let Some(frame) = self.frames.last() {
                    let vertex = frame.vertex;
                    if vertex == next {
                        break;
                    }
                    path.push(vertex);
                    self.on_stack.remove(&vertex);
                    self.frames.pop();
                }
                if let Some(resumed) = self.frames.last_mut() {
                    resumed.cursor -= 1;
                }
                path.reverse();
                return Some(path);
            }

            if graph.contains_vertex(next) {
                self.on_stack.insert(next);
                self.frames.push(Frame::new(next));
            }
        }
    }
}

impl Default for CycleFinder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(party: u32) -> NodeId {
        NodeId::account(party)
    }

    fn s(party: u32, slot: u32) -> NodeId {
        NodeId::new(party, slot)
    }

    /// Six-vertex cycle plus a detached self-loop, the shape the bond
    /// encoding produces (account and slot vertices alternating).
    fn six_cycle_graph() -> TombstoneGraph {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), s(2, 1));
        graph.add_arc(s(2, 1), n(2));
        graph.add_arc(n(2), s(3, 1));
        graph.add_arc(s(3, 1), n(3));
        graph.add_arc(n(3), s(1, 1));
        graph.add_arc(s(1, 1), n(1));
        graph.add_arc(n(99), n(99));
        graph
    }

    #[test]
    fn test_finds_cycle_and_repeats_until_removed() {
        let mut graph = six_cycle_graph();
        let mut finder = CycleFinder::new();

        let cycle = finder.find_cycle(&mut graph).expect("cycle exists");
        assert_eq!(cycle.len(), 6);

        // No arc was removed, so the same cycle is found again.
        let again = finder.find_cycle(&mut graph).expect("still there");
        assert_eq!(again, cycle);

        // Break the cycle; the search falls through to the self-loop.
        graph.remove_arc(s(1, 1), n(1));
        assert_eq!(finder.find_cycle(&mut graph), Some(vec![n(99)]));
    }

    #[test]
    fn test_cycle_is_closed_chain_of_live_arcs() {
        let mut graph = six_cycle_graph();
        let mut finder = CycleFinder::new();
        let cycle = finder.find_cycle(&mut graph).unwrap();

        for window in cycle.windows(2) {
            assert!(graph.has_arc(window[0], window[1]));
        }
        assert!(graph.has_arc(*cycle.last().unwrap(), cycle[0]));
    }

    #[test]
    fn test_self_loop_is_single_vertex_rotation() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(5), n(5));
        let mut finder = CycleFinder::new();
        assert_eq!(finder.find_cycle(&mut graph), Some(vec![n(5)]));
    }

    #[test]
    fn test_exhaustion_is_idempotent() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(2), n(3));

        let mut finder = CycleFinder::new();
        assert_eq!(finder.find_cycle(&mut graph), None);
        assert_eq!(finder.find_cycle(&mut graph), None);
    }

    #[test]
    fn test_exhausted_vertices_are_sunk() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(2), n(3));

        let mut finder = CycleFinder::new();
        finder.find_cycle(&mut graph);
        assert!(!graph.contains_vertex(n(1)));
        assert!(!graph.contains_vertex(n(2)));
    }

    #[test]
    fn test_arcs_added_after_exhaustion_are_searched() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(2));

        let mut finder = CycleFinder::new();
        assert_eq!(finder.find_cycle(&mut graph), None);

        graph.add_arc(n(3), n(4));
        graph.add_arc(n(4), n(3));
        let cycle = finder.find_cycle(&mut graph).expect("new cycle found");
        let set: HashSet<NodeId> = cycle.into_iter().collect();
        assert_eq!(set, HashSet::from([n(3), n(4)]));
    }

    #[test]
    fn test_long_chain_cycle_is_stack_safe() {
        let mut graph = TombstoneGraph::new();
        let len = 100_000u32;
        for i in 1..len {
            graph.add_arc(n(i), n(i + 1));
        }
        graph.add_arc(n(len), n(1));

        let mut finder = CycleFinder::new();
        let cycle = finder.find_cycle(&mut graph).expect("one long cycle");
        assert_eq!(cycle.len(), len as usize);
    }
}
