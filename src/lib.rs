//! # barter-engine
//!
//! Circular multilateral barter matching and clearing engine.
//!
//! Given a set of directed value obligations ("bonds") between parties,
//! the engine repeatedly finds closed cycles of obligations and clears
//! them by the bottleneck amount, so mutually offsetting debts cancel out
//! without bilateral settlement.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: vertex ids, commitments, deals
//! - **graph** — Obligation digraphs and resumable cycle search
//! - **matching** — Sequential matchers (build-then-match and streaming)
//! - **solver** — Parallel worker pool with generation-ordered coordination
//! - **turn** — Turn execution, threshold schedules, batched persistence
//! - **simulation** — Random network generation

pub mod core;
pub mod graph;
pub mod matching;
pub mod simulation;
pub mod solver;
pub mod turn;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::commitment::Commitment;
    pub use crate::core::deal::Deal;
    pub use crate::core::vertex::NodeId;
    pub use crate::matching::matcher::BondMatcher;
    pub use crate::matching::stream::StreamMatcher;
    pub use crate::solver::bond_solver::BondSolver;
    pub use crate::solver::pool::{PathNotFound, SolverPool};
    pub use crate::turn::executor::{match_commitments, TurnReport};
    pub use crate::turn::schedule::ThresholdSchedule;
    pub use crate::turn::writer::{BatchWriter, CommitmentSink, VecSink};
}
