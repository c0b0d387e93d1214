use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a vertex in the obligation graph.
///
/// A vertex stands for one side of a tradable obligation: a party together
/// with one of its obligation slots. Slot `0` is the party's own account;
/// non-zero slots identify the individual promises the party has issued.
/// Both halves are packed into a single 64-bit key so the id can be used
/// directly as a cheap, structurally-comparable map key.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
///
/// let account = NodeId::account(42);
/// let promise = NodeId::new(42, 7);
/// assert_eq!(account.party(), 42);
/// assert_eq!(account.slot(), 0);
/// assert_ne!(account, promise);
/// assert_eq!(NodeId::new(42, 7), promise);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The reserved sentinel that seeds cycle search.
    ///
    /// Distinct from every real vertex (real party ids are positive) and
    /// never a valid argument to bond operations.
    pub const ROOT: NodeId = NodeId(0);

    /// Create a vertex id from a party id and an obligation-slot id.
    ///
    /// # Panics
    ///
    /// Panics if `party` is zero, which is reserved for the root sentinel.
    pub fn new(party: u32, slot: u32) -> Self {
        assert!(party > 0, "party id must be positive, got {}", party);
        Self(((party as u64) << 32) | slot as u64)
    }

    /// The party's own account vertex (slot 0).
    pub fn account(party: u32) -> Self {
        Self::new(party, 0)
    }

    /// The party id encoded in this vertex.
    pub fn party(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The obligation-slot id encoded in this vertex.
    pub fn slot(self) -> u32 {
        self.0 as u32
    }

    /// Whether this vertex is a party's own account (slot 0).
    pub fn is_account(self) -> bool {
        self.slot() == 0 && !self.is_root()
    }

    /// Whether this is the reserved root sentinel.
    pub fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.party(), self.slot())
    }
}
