use crate::core::vertex::NodeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted obligation record — the external form of a bond.
///
/// `value` is signed: a positive value means the recipient owes the issuer
/// through the given obligation slot; a negative value means the obligation
/// runs the other way. The matching engine never stores commitments — it
/// converts them to directed bonds on the way in and back on the way out.
///
/// # Examples
///
/// ```
/// use barter_engine::core::commitment::Commitment;
/// use barter_engine::core::vertex::NodeId;
/// use rust_decimal_macros::dec;
///
/// let c = Commitment::new(1, 2, 3, dec!(120));
/// let (u, v, amount) = c.to_bond();
/// assert_eq!(u, NodeId::account(1));
/// assert_eq!(v, NodeId::new(2, 3));
/// assert_eq!(amount, dec!(120));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// The party on the receiving side of the obligation.
    pub recipient: u32,
    /// The party that issued the underlying promise.
    pub issuer: u32,
    /// The issuer's obligation slot the promise lives in. Never zero.
    pub slot: u32,
    /// Signed obligation value.
    pub value: Decimal,
}

impl Commitment {
    pub fn new(recipient: u32, issuer: u32, slot: u32, value: Decimal) -> Self {
        Self {
            recipient,
            issuer,
            slot,
            value,
        }
    }

    /// Convert this record to a directed bond `(buyer, seller, amount)`.
    ///
    /// A non-negative value puts the recipient's account on the buying side
    /// of the issuer's slot vertex; a negative value reverses the direction
    /// and flips the sign.
    pub fn to_bond(&self) -> (NodeId, NodeId, Decimal) {
        if self.value >= Decimal::ZERO {
            (
                NodeId::account(self.recipient),
                NodeId::new(self.issuer, self.slot),
                self.value,
            )
        } else {
            (
                NodeId::new(self.issuer, self.slot),
                NodeId::account(self.recipient),
                -self.value,
            )
        }
    }

    /// Convert one cleared deal leg back to a signed matched commitment.
    ///
    /// Exactly one endpoint of every bond is an account vertex (slot 0);
    /// which one decides the sign of the recorded value.
    pub fn from_leg(buyer: NodeId, seller: NodeId, amount: Decimal) -> Self {
        debug_assert!(!buyer.is_root() && !seller.is_root());
        if seller.slot() == 0 {
            debug_assert!(buyer.slot() != 0);
            Self::new(seller.party(), buyer.party(), buyer.slot(), -amount)
        } else {
            debug_assert!(buyer.slot() == 0);
            Self::new(buyer.party(), seller.party(), seller.slot(), amount)
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}:{} = {}",
            self.recipient, self.issuer, self.slot, self.value
        )
    }
}
