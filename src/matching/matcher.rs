use crate::core::deal::Deal;
use crate::core::vertex::NodeId;
use crate::graph::cycle_finder::CycleFinder;
use crate::graph::tombstone::TombstoneGraph;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Sequential deal generator with a fixed build-then-match protocol.
///
/// Bonds are registered first; `start()` freezes the bond set, builds the
/// tombstoned graph over it and arms the resumable cycle finder; after that
/// `find_deal()` is called in a loop until it returns `None`. Each deal
/// decrements every bond on its cycle by the bottleneck amount, dropping
/// bonds that fall below the minimum meaningful amount, so later calls see
/// the partially cleared graph.
///
/// Registering after `start()`, or starting twice, is a programmer error
/// and panics.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
/// use barter_engine::matching::matcher::BondMatcher;
/// use rust_decimal_macros::dec;
///
/// let a = NodeId::account(1);
/// let b = NodeId::account(2);
/// let c = NodeId::account(3);
///
/// let mut matcher = BondMatcher::new(dec!(100));
/// matcher.register_bond(a, b, dec!(120));
/// matcher.register_bond(b, c, dec!(150));
/// matcher.register_bond(c, a, dec!(250));
/// matcher.start();
///
/// let deal = matcher.find_deal().unwrap();
/// assert_eq!(deal.amount(), dec!(120));
/// assert_eq!(deal.len(), 3);
///
/// // 120 cleared everywhere: two bonds dropped below 100 and vanished,
/// // so no second deal exists.
/// assert_eq!(matcher.find_deal(), None);
/// assert_eq!(matcher.bond(c, a), Some(dec!(130)));
/// ```
#[derive(Debug)]
pub struct BondMatcher {
    min_amount: Decimal,
    bonds: HashMap<(NodeId, NodeId), Decimal>,
    graph: TombstoneGraph,
    finder: Option<CycleFinder>,
}

impl BondMatcher {
    /// Create a matcher with the given minimum meaningful amount.
    ///
    /// # Panics
    ///
    /// Panics if `min_amount` is not positive.
    pub fn new(min_amount: Decimal) -> Self {
        assert!(
            min_amount > Decimal::ZERO,
            "minimum meaningful amount must be positive, got {}",
            min_amount
        );
        Self {
            min_amount,
            bonds: HashMap::new(),
            graph: TombstoneGraph::new(),
            finder: None,
        }
    }

    /// Register (or value-replace) the bond `u -> v`.
    ///
    /// An amount below the minimum meaningful amount unregisters the bond
    /// instead.
    ///
    /// # Panics
    ///
    /// Panics if matching has already started.
    pub fn register_bond(&mut self, u: NodeId, v: NodeId, amount: Decimal) {
        assert!(
            self.finder.is_none(),
            "can not register bonds after matching has started"
        );
        if amount >= self.min_amount {
            self.bonds.insert((u, v), amount);
        } else {
            self.bonds.remove(&(u, v));
        }
    }

    /// Remove the bond `u -> v` if it exists.
    ///
    /// # Panics
    ///
    /// Panics if matching has already started.
    pub fn unregister_bond(&mut self, u: NodeId, v: NodeId) {
        assert!(
            self.finder.is_none(),
            "can not unregister bonds after matching has started"
        );
        self.bonds.remove(&(u, v));
    }

    /// Freeze the bond set and arm the cycle finder.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    pub fn start(&mut self) {
        assert!(self.finder.is_none(), "the bond matcher is already started");
        // Sorted so two matchers loaded with the same bond set walk their
        // graphs identically.
        let mut arcs: Vec<(NodeId, NodeId)> = self.bonds.keys().copied().collect();
        arcs.sort();
        for (u, v) in arcs {
            self.graph.add_arc(u, v);
        }
        debug!(
            "bond matcher started with {} bonds, min amount {}",
            self.bonds.len(),
            self.min_amount
        );
        self.finder = Some(CycleFinder::new());
    }

    /// Find the next deal, clear it against the bond set, and return it.
    ///
    /// Returns `None` once the remaining bonds contain no cycle; calling
    /// again keeps returning `None`.
    ///
    /// # Panics
    ///
    /// Panics if `start()` has not been called.
    pub fn find_deal(&mut self) -> Option<Deal> {
        let finder = self
            .finder
            .as_mut()
            .expect("the bond matcher is not started");
        let rotation = finder.find_cycle(&mut self.graph)?;

        let (amount, updated) = settle_cycle(&self.bonds, &rotation);
        for (u, v, remaining) in updated {
            self.update_bond(u, v, remaining);
        }
        Some(Deal::from_rotation(rotation, amount))
    }

    /// The current amount of the bond `u -> v`, if it is still alive.
    pub fn bond(&self, u: NodeId, v: NodeId) -> Option<Decimal> {
        self.bonds.get(&(u, v)).copied()
    }

    /// Number of live bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// All live bonds as `((u, v), amount)`.
    pub fn bonds(&self) -> impl Iterator<Item = ((NodeId, NodeId), Decimal)> + '_ {
        self.bonds.iter().map(|(&arc, &amount)| (arc, amount))
    }

    /// Sum of all live bond amounts.
    pub fn gross_total(&self) -> Decimal {
        self.bonds.values().sum()
    }

    fn update_bond(&mut self, u: NodeId, v: NodeId, amount: Decimal) {
        if amount >= self.min_amount {
            self.bonds.insert((u, v), amount);
        } else {
            self.bonds.remove(&(u, v));
            self.graph.remove_arc(u, v);
        }
    }
}

/// Compute the bottleneck of a cycle rotation and the decremented amount of
/// every bond on it.
pub(crate) fn settle_cycle(
    bonds: &HashMap<(NodeId, NodeId), Decimal>,
    rotation: &[NodeId],
) -> (Decimal, Vec<(NodeId, NodeId, Decimal)>) {
    let amount = cycle_legs(rotation)
        .map(|leg| bonds.get(&leg).copied().unwrap_or(Decimal::ZERO))
        .min()
        .unwrap_or(Decimal::ZERO);
    if amount == Decimal::ZERO {
        return (amount, Vec::new());
    }
    let updated = cycle_legs(rotation)
        .map(|(u, v)| {
            let remaining = bonds.get(&(u, v)).copied().unwrap_or(Decimal::ZERO) - amount;
            (u, v, remaining)
        })
        .collect();
    (amount, updated)
}

/// Normalize a `find_path(v, u)` result — the closure of an arc `u -> v` —
/// into an open cycle rotation starting at `u`.
///
/// A trivial self-cycle comes back from the path query as `[u, u]`; the
/// duplicate endpoint is dropped so its single leg is settled once.
pub(crate) fn path_rotation(mut path: Vec<NodeId>) -> Vec<NodeId> {
    if path.len() >= 2 && path.first() == path.last() {
        path.pop();
    }
    path.rotate_right(1);
    path
}

/// The directed arcs of an open cycle rotation, wrap-around included.
pub(crate) fn cycle_legs(rotation: &[NodeId]) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
    (0..rotation.len()).map(move |i| {
        let u = if i == 0 {
            rotation[rotation.len() - 1]
        } else {
            rotation[i - 1]
        };
        (u, rotation[i])
    })
}
