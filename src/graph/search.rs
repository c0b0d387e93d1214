use crate::core::vertex::NodeId;
use std::collections::{HashMap, HashSet};

/// A directed graph with set-valued adjacency, optimized for point arc
/// updates and one-shot path queries.
///
/// This is the variant the incremental matcher mutates on every bond
/// registration: arc insertion and removal are O(1), and a vertex whose last
/// outgoing arc disappears is dropped entirely so the map only ever holds
/// vertices that can still lead somewhere.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
/// use barter_engine::graph::search::SearchGraph;
///
/// let a = NodeId::account(1);
/// let b = NodeId::account(2);
/// let c = NodeId::account(3);
///
/// let mut graph = SearchGraph::new();
/// graph.add_arc(a, b);
/// graph.add_arc(b, c);
/// assert!(graph.has_arc(a, b));
/// assert!(!graph.has_arc(b, a));
///
/// // No way back from c, so no cycle through (a, b) yet.
/// assert_eq!(graph.find_path(b, a), None);
///
/// graph.add_arc(c, a);
/// assert_eq!(graph.find_path(b, a), Some(vec![b, c, a]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchGraph {
    vmap: HashMap<NodeId, HashSet<NodeId>>,
}

impl SearchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the arc `u -> v` exists.
    pub fn has_arc(&self, u: NodeId, v: NodeId) -> bool {
        self.vmap.get(&u).is_some_and(|succ| succ.contains(&v))
    }

    /// Add the arc `u -> v`. Adding an existing arc is a no-op.
    pub fn add_arc(&mut self, u: NodeId, v: NodeId) {
        self.vmap.entry(u).or_default().insert(v);
    }

    /// Remove the arc `u -> v` if it exists.
    ///
    /// A vertex left without outgoing arcs is evicted from the graph.
    pub fn remove_arc(&mut self, u: NodeId, v: NodeId) {
        if let Some(succ) = self.vmap.get_mut(&u) {
            succ.remove(&v);
            if succ.is_empty() {
                self.vmap.remove(&u);
            }
        }
    }

    /// Number of vertices that currently have outgoing arcs.
    pub fn vertex_count(&self) -> usize {
        self.vmap.len()
    }

    /// Find some path from `u` to `v`, as the vertex sequence `[u, .., v]`.
    ///
    /// Depth-first search with an explicit stack of successor iterators, so
    /// arbitrarily long chains cannot overflow the call stack. The first
    /// path discovered is returned; it is not necessarily the shortest one.
    /// A self-arc `u -> u` yields the trivial path `[u, u]`.
    pub fn find_path(&self, u: NodeId, v: NodeId) -> Option<Vec<NodeId>> {
        let empty = HashSet::new();
        let successors = |x: NodeId| self.vmap.get(&x).unwrap_or(&empty).iter();

        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(u);

        // The two stacks grow in lock-step: path[i] is the vertex whose
        // successor iterator sits at frames[i].
        let mut path: Vec<NodeId> = vec![u];
        let mut frames = vec![successors(u)];

        while let Some(top) = frames.last_mut() {
            match top.next() {
                Some(&next) => {
                    if next == v {
                        path.push(next);
                        return Some(path);
                    }
                    if visited.insert(next) {
                        path.push(next);
                        frames.push(successors(next));
                    }
                }
                None => {
                    frames.pop();
                    path.pop();
                }
            }
        }
        None
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

    #[test]
    fn test_add_remove_has() {
        let mut graph = SearchGraph::new();
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(1), n(3));
        assert!(graph.has_arc(n(1), n(2)));
        assert!(graph.has_arc(n(1), n(3)));

        graph.remove_arc(n(1), n(2));
        assert!(!graph.has_arc(n(1), n(2)));
        assert!(graph.has_arc(n(1), n(3)));
    }

    #[test]
    fn test_dead_end_vertex_evicted() {
        let mut graph = SearchGraph::new();
        graph.add_arc(n(1), n(2));
        assert_eq!(graph.vertex_count(), 1);
        graph.remove_arc(n(1), n(2));
        assert_eq!(graph.vertex_count(), 0);
    }

    #[test]
    fn test_remove_missing_arc_is_noop() {
        let mut graph = SearchGraph::new();
        graph.remove_arc(n(1), n(2));
        graph.add_arc(n(1), n(2));
        graph.remove_arc(n(1), n(3));
        assert!(graph.has_arc(n(1), n(2)));
    }

    #[test]
    fn test_find_path_through_chain() {
        // Alternating account/slot vertices, the shape the bond encoding
        // produces.
        let mut graph = SearchGraph::new();
        graph.add_arc(n(1), s(2, 1));
        graph.add_arc(s(2, 1), n(3));
        graph.add_arc(n(3), s(4, 2));
        graph.add_arc(s(4, 2), n(5));
        graph.add_arc(n(5), n(1));
        graph.add_arc(n(99), n(99));

        let path = graph.find_path(n(1), n(1));
        assert_eq!(
            path,
            Some(vec![n(1), s(2, 1), n(3), s(4, 2), n(5), n(1)])
        );
    }

    #[test]
    fn test_find_path_none_when_unreachable() {
        let mut graph = SearchGraph::new();
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(2), n(3));
        assert_eq!(graph.find_path(n(3), n(1)), None);
        assert_eq!(graph.find_path(n(1), n(1)), None);
    }

    #[test]
    fn test_trivial_self_cycle() {
        let mut graph = SearchGraph::new();
        graph.add_arc(n(99), n(99));
        assert_eq!(graph.find_path(n(99), n(99)), Some(vec![n(99), n(99)]));
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut graph = SearchGraph::new();
        let len = 100_000u32;
        for i in 1..len {
            graph.add_arc(n(i), n(i + 1));
        }
        graph.add_arc(n(len), n(1));

        let path = graph.find_path(n(1), n(1)).expect("chain closes a cycle");
        assert_eq!(path.len(), len as usize + 1);
        assert_eq!(path[0], n(1));
        assert_eq!(*path.last().unwrap(), n(1));
    }
}
