use crate::core::vertex::NodeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cleared trading cycle.
///
/// The cycle is stored closed: the first and last vertex are equal, and every
/// consecutive pair of vertices is a bond that took part in the deal. The
/// shortest possible deal is a self-loop, stored as `[u, u]`.
///
/// `amount` is the bottleneck of the cycle — the smallest bond value along
/// it, which is how much every participating bond was decremented by.
///
/// # Examples
///
/// ```
/// use barter_engine::core::deal::Deal;
/// use barter_engine::core::vertex::NodeId;
/// use rust_decimal_macros::dec;
///
/// let a = NodeId::account(1);
/// let b = NodeId::new(2, 1);
/// let c = NodeId::account(3);
/// let deal = Deal::from_rotation(vec![a, b, c], dec!(120));
///
/// assert_eq!(deal.cycle().first(), deal.cycle().last());
/// assert_eq!(deal.len(), 3);
/// assert_eq!(deal.cleared_total(), dec!(360));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    cycle: Vec<NodeId>,
    amount: Decimal,
}

impl Deal {
    /// Build a deal from an open cycle rotation `[v0, v1, .., vn]` whose
    /// implicit closing arc is `vn -> v0`.
    ///
    /// # Panics
    ///
    /// Panics if the rotation is empty.
    pub fn from_rotation(mut rotation: Vec<NodeId>, amount: Decimal) -> Self {
        assert!(!rotation.is_empty(), "a deal needs at least one vertex");
        let first = rotation[0];
        rotation.push(first);
        Self {
            cycle: rotation,
            amount,
        }
    }

    /// The closed vertex sequence; `cycle()[0] == cycle()[len()]`.
    pub fn cycle(&self) -> &[NodeId] {
        &self.cycle
    }

    /// The cleared (bottleneck) amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Number of bonds participating in the deal.
    pub fn len(&self) -> usize {
        self.cycle.len() - 1
    }

    /// The directed bonds of the cycle, in order.
    pub fn legs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.cycle.windows(2).map(|w| (w[0], w[1]))
    }

    /// Total value that changed hands: `amount * len`.
    pub fn cleared_total(&self) -> Decimal {
        self.amount * Decimal::from(self.len())
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vertices: Vec<String> = self.cycle.iter().map(|v| v.to_string()).collect();
        write!(f, "{} @ {}", vertices.join(" -> "), self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_closed_representation() {
        let deal = Deal::from_rotation(
            vec![NodeId::account(1), NodeId::new(2, 1), NodeId::account(3)],
            dec!(10),
        );
        assert_eq!(deal.cycle().len(), 4);
        assert_eq!(deal.cycle()[0], *deal.cycle().last().unwrap());
        assert_eq!(deal.len(), 3);
    }

    #[test]
    fn test_legs_cover_every_bond_once() {
        let a = NodeId::account(1);
        let b = NodeId::new(2, 1);
        let c = NodeId::account(3);
        let deal = Deal::from_rotation(vec![a, b, c], dec!(10));
        let legs: Vec<_> = deal.legs().collect();
        assert_eq!(legs, vec![(a, b), (b, c), (c, a)]);
    }

    #[test]
    fn test_self_loop() {
        let u = NodeId::new(5, 0);
        let deal = Deal::from_rotation(vec![u], dec!(50));
        assert_eq!(deal.cycle(), &[u, u]);
        assert_eq!(deal.len(), 1);
        let legs: Vec<_> = deal.legs().collect();
        assert_eq!(legs, vec![(u, u)]);
        assert_eq!(deal.cleared_total(), dec!(50));
    }

    #[test]
    fn test_cleared_total() {
        let deal = Deal::from_rotation(
            vec![NodeId::account(1), NodeId::new(2, 1), NodeId::account(3)],
            dec!(120),
        );
        assert_eq!(deal.cleared_total(), dec!(360));
    }

    #[test]
    #[should_panic(expected = "at least one vertex")]
    fn test_empty_rotation_rejected() {
        Deal::from_rotation(Vec::new(), dec!(1));
    }
}
