use barter_engine::core::vertex::NodeId;
use barter_engine::matching::matcher::BondMatcher;
use barter_engine::matching::stream::StreamMatcher;
use barter_engine::simulation::network::{generate_bond_network, NetworkConfig};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn network(traders: u32, bonds: usize) -> NetworkConfig {
    NetworkConfig {
        trader_count: traders,
        bond_count: bonds,
        product_count: (traders / 10).max(1),
        ..Default::default()
    }
}

fn drain_bonds(bonds: &[(NodeId, NodeId, Decimal)]) -> usize {
    let mut matcher = BondMatcher::new(dec!(1));
    for &(u, v, amount) in bonds {
        matcher.register_bond(u, v, amount);
    }
    matcher.start();
    let mut deals = 0;
    while matcher.find_deal().is_some() {
        deals += 1;
    }
    deals
}

fn bench_drain_1k_bonds(c: &mut Criterion) {
    let bonds = generate_bond_network(&network(200, 1_000), 1);
    c.bench_function("drain_1k_bonds", |b| {
        b.iter(|| drain_bonds(black_box(&bonds)))
    });
}

fn bench_drain_10k_bonds(c: &mut Criterion) {
    let bonds = generate_bond_network(&network(2_000, 10_000), 1);
    c.bench_function("drain_10k_bonds", |b| {
        b.iter(|| drain_bonds(black_box(&bonds)))
    });
}

fn bench_stream_matching_10k_bonds(c: &mut Criterion) {
    let bonds = generate_bond_network(&network(2_000, 10_000), 1);
    c.bench_function("stream_matching_10k_bonds", |b| {
        b.iter_batched(
            || bonds.clone(),
            |bonds| {
                let mut matcher = StreamMatcher::new(dec!(1));
                for (u, v, amount) in bonds {
                    matcher.register_bond(u, v, amount);
                }
                matcher.take_deals().len()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_drain_1k_bonds,
    bench_drain_10k_bonds,
    bench_stream_matching_10k_bonds
);
criterion_main!(benches);
