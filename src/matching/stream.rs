use crate::core::deal::Deal;
use crate::core::vertex::NodeId;
use crate::graph::search::SearchGraph;
use crate::matching::matcher::{path_rotation, settle_cycle};
use log::trace;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Eager deal generator fed one bond at a time.
///
/// Where [`BondMatcher`](crate::matching::matcher::BondMatcher) freezes its
/// bond set before searching, this matcher clears as it goes: every newly
/// registered bond is immediately checked for cycles it closes, and every
/// cycle found is settled on the spot — including follow-up cycles exposed
/// by the settlement itself. Deals accumulate until the caller collects
/// them with [`take_deals`](Self::take_deals).
///
/// Bonds may be registered and unregistered at any time, and the minimum
/// meaningful amount may be raised between registrations, which is what the
/// turn executor's escalating threshold schedule does.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
/// use barter_engine::matching::stream::StreamMatcher;
/// use rust_decimal_macros::dec;
///
/// let a = NodeId::account(1);
/// let b = NodeId::account(2);
/// let c = NodeId::account(3);
///
/// let mut matcher = StreamMatcher::new(dec!(100));
/// matcher.register_bond(a, b, dec!(120));
/// matcher.register_bond(b, c, dec!(150));
/// assert!(matcher.take_deals().is_empty());
///
/// // This bond closes the cycle; the deal pops immediately.
/// matcher.register_bond(c, a, dec!(250));
/// let deals = matcher.take_deals();
/// assert_eq!(deals.len(), 1);
/// assert_eq!(deals[0].amount(), dec!(120));
///
/// // Only the partially cleared closing bond survives.
/// assert_eq!(matcher.bond(c, a), Some(dec!(130)));
/// assert_eq!(matcher.bond_count(), 1);
/// ```
#[derive(Debug)]
pub struct StreamMatcher {
    min_amount: Decimal,
    bonds: HashMap<(NodeId, NodeId), Decimal>,
    graph: SearchGraph,
    deals: Vec<Deal>,
}

impl StreamMatcher {
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
            graph: SearchGraph::new(),
            deals: Vec::new(),
        }
    }

    /// The current minimum meaningful amount.
    pub fn min_amount(&self) -> Decimal {
        self.min_amount
    }

    /// Raise (or otherwise change) the minimum meaningful amount.
    ///
    /// Only future registrations and settlements are affected; bonds that
    /// already made it into the graph stay until they are next touched.
    ///
    /// # Panics
    ///
    /// Panics if `min_amount` is not positive.
    pub fn set_min_amount(&mut self, min_amount: Decimal) {
        assert!(
            min_amount > Decimal::ZERO,
            "minimum meaningful amount must be positive, got {}",
            min_amount
        );
        self.min_amount = min_amount;
    }

    /// Register (or value-replace) the bond `u -> v` and settle every cycle
    /// this closes.
    ///
    /// An amount below the minimum meaningful amount unregisters the bond
    /// instead.
    pub fn register_bond(&mut self, u: NodeId, v: NodeId, amount: Decimal) {
        if amount < self.min_amount {
            self.unregister_bond(u, v);
            return;
        }
        let is_new_bond = !self.bonds.contains_key(&(u, v));
        self.bonds.insert((u, v), amount);
        self.graph.add_arc(u, v);
        if !is_new_bond {
            return;
        }

        // A fresh arc can close any number of cycles: clear them until the
        // arc dies or no path leads back around.
        while self.graph.has_arc(u, v) {
            let Some(path) = self.graph.find_path(v, u) else {
                break;
            };
            let path = path_rotation(path);
            let (amount, updated) = settle_cycle(&self.bonds, &path);
            trace!("stream matcher cleared {} over {:?}", amount, path);
            self.deals.push(Deal::from_rotation(path, amount));
            for (a, b, remaining) in updated {
                self.register_bond(a, b, remaining);
            }
        }
    }

    /// Remove the bond `u -> v` if it exists.
    pub fn unregister_bond(&mut self, u: NodeId, v: NodeId) {
        self.graph.remove_arc(u, v);
        self.bonds.remove(&(u, v));
    }

    /// Hand out the deals settled since the last call.
    pub fn take_deals(&mut self) -> Vec<Deal> {
        std::mem::take(&mut self.deals)
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
}
