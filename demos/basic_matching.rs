//! Basic sequential matching example.
//!
//! Demonstrates the build-then-match protocol: register bonds, start the
//! matcher, drain deals until none remain.

use barter_engine::core::vertex::NodeId;
use barter_engine::matching::matcher::BondMatcher;
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  barter-engine: Sequential Cycle Clearing    ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let alice = NodeId::account(1);
    let bob = NodeId::account(2);
    let carol = NodeId::account(3);

    println!("Bonds:");
    println!("  Alice → Bob:   120");
    println!("  Bob   → Carol: 150");
    println!("  Carol → Alice: 250");
    println!("  Minimum meaningful amount: 100\n");

    let mut matcher = BondMatcher::new(dec!(100));
    matcher.register_bond(alice, bob, dec!(120));
    matcher.register_bond(bob, carol, dec!(150));
    matcher.register_bond(carol, alice, dec!(250));
    matcher.start();

    println!("━━━ Deals ━━━\n");
    let mut number = 0;
    while let Some(deal) = matcher.find_deal() {
        number += 1;
        println!("  Deal {}: {}", number, deal);
        println!("    Bonds cleared:  {}", deal.len());
        println!("    Total value:    {}\n", deal.cleared_total());
    }
    println!("No further deals.\n");

    println!("━━━ Remaining bonds ━━━\n");
    if matcher.bond_count() == 0 {
        println!("  (none)");
    }
    for ((u, v), amount) in matcher.bonds() {
        println!("  {} → {}: {}", u, v, amount);
    }
}
