//! Random bond-network generation for tests, benches and the CLI.
//!
//! Models a barter community: a minority of producer slots sell into a
//! larger population of trader accounts, with trade mostly happening
//! between nearby party ids and exponentially distributed amounts. That
//! shape produces realistically dense cycle structure without being a
//! complete graph.

use crate::core::commitment::Commitment;
use crate::core::vertex::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

/// Configuration for generating a random bond network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Number of trader parties.
    pub trader_count: u32,
    /// Number of bonds to generate.
    pub bond_count: usize,
    /// Number of producer slots, spread randomly over the traders.
    pub product_count: u32,
    /// Fraction of bonds that run producer-to-trader.
    pub sellers_ratio: f64,
    /// Maximum party-id distance between a producer and its counterparty.
    pub locality: u32,
    /// Mean amount of a producer-to-trader bond.
    pub mean_sell_amount: f64,
    /// Mean amount of a trader-to-producer bond.
    pub mean_buy_amount: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            trader_count: 1_000,
            bond_count: 5_000,
            product_count: 100,
            sellers_ratio: 0.1,
            locality: 1_000,
            mean_sell_amount: 1_000.0,
            mean_buy_amount: 100.0,
        }
    }
}

/// Generate a random bond network, deterministically for a given seed.
///
/// Bonds run between trader account vertices and producer slot vertices;
/// amounts are integer and exponentially distributed, so a fraction of
/// them come out zero and act as no-ops when registered.
pub fn generate_bond_network(config: &NetworkConfig, seed: u64) -> Vec<(NodeId, NodeId, Decimal)> {
    let mut rng = StdRng::seed_from_u64(seed);

    let producers: Vec<NodeId> = (1..=config.product_count)
        .map(|slot| NodeId::new(rng.gen_range(1..=config.trader_count), slot))
        .collect();

    let locality = config.locality.min(config.trader_count);
    let mut bonds = Vec::with_capacity(config.bond_count);
    while bonds.len() < config.bond_count {
        let producer = producers[rng.gen_range(0..producers.len())];
        let trader_party =
            (producer.party() - 1 + rng.gen_range(0..=locality)) % config.trader_count + 1;
        let trader = NodeId::account(trader_party);

        let (buyer, seller, mean) = if rng.gen::<f64>() < config.sellers_ratio {
            (producer, trader, config.mean_sell_amount)
        } else {
            (trader, producer, config.mean_buy_amount)
        };
        bonds.push((buyer, seller, exponential_amount(&mut rng, mean)));
    }
    bonds
}

/// Generate the same network in commitment form, for the CLI.
pub fn generate_commitments(config: &NetworkConfig, seed: u64) -> Vec<Commitment> {
    generate_bond_network(config, seed)
        .into_iter()
        .map(|(buyer, seller, amount)| Commitment::from_leg(buyer, seller, amount))
        .collect()
}

/// An integer-valued draw from an exponential distribution with the given
/// mean.
fn exponential_amount(rng: &mut StdRng, mean: f64) -> Decimal {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    Decimal::from((-mean * u.ln()) as i64)
}
