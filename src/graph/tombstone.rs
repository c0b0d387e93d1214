use crate::core::vertex::NodeId;
use std::collections::{HashMap, HashSet};

/// A directed graph with tombstoned adjacency lists.
///
/// Built for heavy arc churn: removing an arc only nulls its slot in the
/// owner's successor list, so removal is O(1) in the list scan and the
/// resumable cycle finder's cursors into those lists stay valid. A vertex
/// whose list holds no live successor any more is evicted ("sunk") — either
/// lazily by the finder when it exhausts the vertex, or eagerly by
/// `remove_arc` when the last live slot dies.
///
/// The reserved [`NodeId::ROOT`] vertex is always present; its list records
/// every vertex that has ever had an outgoing arc and seeds cycle search.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
/// use barter_engine::graph::tombstone::TombstoneGraph;
///
/// let a = NodeId::account(1);
/// let b = NodeId::account(2);
/// let c = NodeId::account(3);
///
/// let mut graph = TombstoneGraph::new();
/// graph.add_arc(a, b);
/// graph.add_arc(a, c);
/// assert_eq!(graph.successors(a), Some(&[Some(b), Some(c)][..]));
///
/// graph.remove_arc(a, b);
/// assert_eq!(graph.successors(a), Some(&[None, Some(c)][..]));
///
/// // Removing the last live arc sinks the vertex.
/// graph.remove_arc(a, c);
/// assert!(!graph.contains_vertex(a));
/// ```
#[derive(Debug, Clone)]
pub struct TombstoneGraph {
    vmap: HashMap<NodeId, Vec<Option<NodeId>>>,
}

impl TombstoneGraph {
    pub fn new() -> Self {
        let mut vmap = HashMap::new();
        vmap.insert(NodeId::ROOT, Vec::new());
        Self { vmap }
    }

    /// Whether the arc `u -> v` is alive.
    pub fn has_arc(&self, u: NodeId, v: NodeId) -> bool {
        debug_assert!(!u.is_root());
        self.vmap
            .get(&u)
            .is_some_and(|list| list.contains(&Some(v)))
    }

    /// Add the arc `u -> v`.
    ///
    /// The first arc out of a fresh vertex also registers the vertex in the
    /// root's seed list.
    pub fn add_arc(&mut self, u: NodeId, v: NodeId) {
        debug_assert!(!v.is_root());
        if let Some(list) = self.vmap.get_mut(&u) {
            list.push(Some(v));
        } else {
            self.vmap.insert(u, vec![Some(v)]);
            if let Some(seeds) = self.vmap.get_mut(&NodeId::ROOT) {
                seeds.push(Some(u));
            }
        }
    }

    /// Tombstone the arc `u -> v` if it is alive; sink `u` if nothing
    /// remains alive in its list. Unknown arcs are ignored.
    pub fn remove_arc(&mut self, u: NodeId, v: NodeId) {
        debug_assert!(!u.is_root());
        if let Some(list) = self.vmap.get_mut(&u) {
            if let Some(slot) = list.iter_mut().find(|slot| **slot == Some(v)) {
                *slot = None;
            }
            if list.iter().all(Option::is_none) {
                self.sink_vertex(u);
            }
        }
    }

    /// Evict a dead-end vertex. The root sentinel is never evicted.
    pub fn sink_vertex(&mut self, v: NodeId) {
        if !v.is_root() {
            self.vmap.remove(&v);
        }
    }

    /// Whether the vertex still has a successor list.
    pub fn contains_vertex(&self, v: NodeId) -> bool {
        self.vmap.contains_key(&v)
    }

    /// The raw successor list of a vertex, tombstones included.
    pub fn successors(&self, u: NodeId) -> Option<&[Option<NodeId>]> {
        self.vmap.get(&u).map(Vec::as_slice)
    }

    /// Find some path from `u` to `v` over live arcs, as `[u, .., v]`.
    ///
    /// Same explicit-stack DFS as the set-adjacency variant, skipping
    /// tombstones. The parallel solver workers use this to answer
    /// cycle-closure checks against their private replicas.
    pub fn find_path(&self, u: NodeId, v: NodeId) -> Option<Vec<NodeId>> {
        const EMPTY: &[Option<NodeId>] = &[];
        let successors = |x: NodeId| {
            self.vmap
                .get(&x)
                .map_or(EMPTY, Vec::as_slice)
                .iter()
                .flatten()
        };

        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(u);

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

impl Default for TombstoneGraph {
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

    #[test]
    fn test_removal_leaves_tombstone() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(1), n(3));

        graph.remove_arc(n(1), n(2));
        assert_eq!(graph.successors(n(1)), Some(&[None, Some(n(3))][..]));
        assert!(!graph.has_arc(n(1), n(2)));
        assert!(graph.has_arc(n(1), n(3)));
    }

    #[test]
    fn test_last_live_slot_sinks_vertex() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(1), n(3));
        graph.remove_arc(n(1), n(2));
        graph.remove_arc(n(1), n(3));
        assert!(!graph.contains_vertex(n(1)));
    }

    #[test]
    fn test_root_seeds_every_source_vertex() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(1), n(3));
        graph.add_arc(n(2), n(1));

        let seeds = graph.successors(NodeId::ROOT).unwrap();
        assert_eq!(seeds, &[Some(n(1)), Some(n(2))]);
    }

    #[test]
    fn test_sink_vertex_spares_root() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(2));
        graph.sink_vertex(n(1));
        assert!(!graph.contains_vertex(n(1)));
        graph.sink_vertex(NodeId::ROOT);
        assert!(graph.contains_vertex(NodeId::ROOT));
    }

    #[test]
    fn test_remove_unknown_arc_is_noop() {
        let mut graph = TombstoneGraph::new();
        graph.remove_arc(n(1), n(2));
        graph.add_arc(n(1), n(2));
        graph.remove_arc(n(1), n(9));
        assert!(graph.has_arc(n(1), n(2)));
    }

    #[test]
    fn test_find_path_skips_tombstones() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(1), n(9));
        graph.add_arc(n(1), n(2));
        graph.add_arc(n(2), n(3));
        graph.remove_arc(n(1), n(9));

        assert_eq!(graph.find_path(n(1), n(3)), Some(vec![n(1), n(2), n(3)]));
        assert_eq!(graph.find_path(n(3), n(1)), None);
    }

    #[test]
    fn test_find_path_trivial_self_cycle() {
        let mut graph = TombstoneGraph::new();
        graph.add_arc(n(99), n(99));
        assert_eq!(graph.find_path(n(99), n(99)), Some(vec![n(99), n(99)]));
    }
}
