use crate::core::deal::Deal;
use crate::core::vertex::NodeId;
use crate::matching::matcher::{path_rotation, settle_cycle};
use crate::solver::pool::{PathNotFound, SolverPool, DEFAULT_RESPONSE_TIMEOUT};
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

/// Parallel deal generator — the pool-backed counterpart of
/// [`BondMatcher`](crate::matching::matcher::BondMatcher).
///
/// Same build-then-match protocol: bonds are registered up front, `start()`
/// hands the arc set to a [`SolverPool`], and `wait_for_deal()` is looped
/// until it returns [`PathNotFound`]. The solver keeps the authoritative
/// bond amounts on the caller's side; workers only see arcs, so a cycle a
/// worker discovers may already be stale by the time it arrives — those are
/// skipped, and every bond cleared below the minimum meaningful amount is
/// broadcast to the pool as an arc removal.
///
/// # Examples
///
/// ```
/// use barter_engine::core::vertex::NodeId;
/// use barter_engine::solver::bond_solver::BondSolver;
/// use rust_decimal_macros::dec;
/// use std::time::Duration;
///
/// let a = NodeId::account(1);
/// let b = NodeId::account(2);
/// let c = NodeId::account(3);
///
/// // A short no-progress timeout keeps the final drain check quick.
/// let mut solver = BondSolver::with_timeout(dec!(100), Duration::from_millis(50));
/// solver.register_bond(a, b, dec!(120));
/// solver.register_bond(b, c, dec!(150));
/// solver.register_bond(c, a, dec!(250));
/// solver.start(2);
///
/// let deal = solver.wait_for_deal().unwrap();
/// assert_eq!(deal.amount(), dec!(120));
/// assert_eq!(solver.bond(c, a), Some(dec!(130)));
///
/// while solver.wait_for_deal().is_ok() {}
/// solver.stop();
/// ```
#[derive(Debug)]
pub struct BondSolver {
    min_amount: Decimal,
    bonds: HashMap<(NodeId, NodeId), Decimal>,
    pool: Option<SolverPool>,
    response_timeout: Duration,
}

impl BondSolver {
    /// Create a solver with the given minimum meaningful amount.
    ///
    /// # Panics
    ///
    /// Panics if `min_amount` is not positive.
    pub fn new(min_amount: Decimal) -> Self {
        Self::with_timeout(min_amount, DEFAULT_RESPONSE_TIMEOUT)
    }

    /// Create a solver with an explicit pool no-progress timeout.
    ///
    /// # Panics
    ///
    /// Panics if `min_amount` is not positive.
    pub fn with_timeout(min_amount: Decimal, response_timeout: Duration) -> Self {
        assert!(
            min_amount > Decimal::ZERO,
            "minimum meaningful amount must be positive, got {}",
            min_amount
        );
        Self {
            min_amount,
            bonds: HashMap::new(),
            pool: None,
            response_timeout,
        }
    }

    /// Register (or value-replace) the bond `u -> v`.
    ///
    /// An amount below the minimum meaningful amount unregisters the bond
    /// instead.
    ///
    /// # Panics
    ///
    /// Panics if the solver has already started.
    pub fn register_bond(&mut self, u: NodeId, v: NodeId, amount: Decimal) {
        assert!(
            self.pool.is_none(),
            "can not register bonds after the solver has started"
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
    /// Panics if the solver has already started.
    pub fn unregister_bond(&mut self, u: NodeId, v: NodeId) {
        assert!(
            self.pool.is_none(),
            "can not unregister bonds after the solver has started"
        );
        self.bonds.remove(&(u, v));
    }

    /// Freeze the bond set and spawn the worker pool.
    ///
    /// # Panics
    ///
    /// Panics if called twice or if `pool_size` is zero.
    pub fn start(&mut self, pool_size: usize) {
        assert!(self.pool.is_none(), "the bond solver is already started");
        let mut arcs: Vec<(NodeId, NodeId)> = self.bonds.keys().copied().collect();
        arcs.sort();
        debug!(
            "bond solver starting {} workers over {} bonds",
            pool_size,
            arcs.len()
        );
        self.pool = Some(SolverPool::spawn_with_timeout(
            arcs,
            pool_size,
            self.response_timeout,
        ));
    }

    /// Block until the pool delivers a cycle that is still worth clearing,
    /// settle it, and return the deal.
    ///
    /// Cycles whose bottleneck already dropped to zero are discarded and
    /// the wait continues. Returns [`PathNotFound`] when the pool is fully
    /// drained; calling again keeps returning it.
    ///
    /// # Panics
    ///
    /// Panics if `start()` has not been called.
    pub fn wait_for_deal(&mut self) -> Result<Deal, PathNotFound> {
        loop {
            let pool = self.pool.as_mut().expect("the bond solver is not started");
            let path = pool.wait_for_cycle()?;
            let rotation = path_rotation(path);
            let (amount, updated) = settle_cycle(&self.bonds, &rotation);
            if amount == Decimal::ZERO {
                // A worker judged this cycle against bonds that other deals
                // have since consumed.
                continue;
            }
            for (u, v, remaining) in updated {
                self.update_bond(u, v, remaining);
            }
            return Ok(Deal::from_rotation(rotation, amount));
        }
    }

    /// Shut the pool down and join its workers.
    ///
    /// # Panics
    ///
    /// Panics if the solver was never started.
    pub fn stop(&mut self) {
        let pool = self.pool.take().expect("the bond solver is not started");
        pool.stop();
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
            if let Some(pool) = self.pool.as_mut() {
                pool.remove_arc(u, v);
            }
        }
    }
}
