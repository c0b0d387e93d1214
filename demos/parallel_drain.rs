//! Parallel drain example.
//!
//! Generates a random bond network and drains it with the solver pool,
//! then reports how much value the workers cleared.

use barter_engine::simulation::network::{generate_bond_network, NetworkConfig};
use barter_engine::solver::bond_solver::BondSolver;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    let workers = std::thread::available_parallelism().map_or(2, |n| n.get());
    let config = NetworkConfig {
        trader_count: 2_000,
        bond_count: 10_000,
        product_count: 200,
        ..Default::default()
    };

    println!("╔══════════════════════════════════════════════╗");
    println!("║  barter-engine: Parallel Cycle Clearing      ║");
    println!("╚══════════════════════════════════════════════╝\n");
    println!("Traders: {}", config.trader_count);
    println!("Bonds:   {}", config.bond_count);
    println!("Workers: {}\n", workers);

    let bonds = generate_bond_network(&config, 1);
    let mut solver = BondSolver::with_timeout(dec!(1), Duration::from_millis(500));
    for (u, v, amount) in bonds {
        solver.register_bond(u, v, amount);
    }
    let gross = solver.gross_total();
    solver.start(workers);

    let started = Instant::now();
    let mut performed_deals = 0u64;
    let mut cleared = Decimal::ZERO;
    while let Ok(deal) = solver.wait_for_deal() {
        performed_deals += 1;
        cleared += deal.cleared_total();
    }
    let elapsed = started.elapsed();
    solver.stop();

    println!("━━━ Results ━━━\n");
    println!("  Gross value:     {}", gross);
    println!("  Performed deals: {}", performed_deals);
    println!("  Cleared value:   {}", cleared);
    println!("  Elapsed:         {:.2?}", elapsed);
}
