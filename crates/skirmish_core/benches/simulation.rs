//! Simulation benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use skirmish_core::config::SimConfig;
use skirmish_core::simulation::Simulation;
use skirmish_core::targeting::{acquire_target, TargetQuery};
use skirmish_core::factions::Faction;
use skirmish_core::math::{Fixed, Vec2Fixed};

/// Full standard match, stepped tick by tick.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("standard_match_1000_ticks", |b| {
        b.iter_batched(
            || Simulation::standard(SimConfig::with_seed(42)),
            |mut sim| {
                sim.run(1000);
                black_box(sim.state_hash())
            },
            BatchSize::SmallInput,
        );
    });

    let mut warmed = Simulation::standard(SimConfig::with_seed(42));
    warmed.run(6000);
    c.bench_function("single_tick_mid_game", |b| {
        b.iter_batched(
            || warmed.clone(),
            |mut sim| black_box(sim.tick()),
            BatchSize::SmallInput,
        );
    });
}

/// Target acquisition around the opponent base after the opening.
pub fn targeting_benchmark(c: &mut Criterion) {
    let mut sim = Simulation::standard(SimConfig::with_seed(3));
    sim.run(4000);
    let query = TargetQuery {
        origin: Vec2Fixed::from_ints(1700, 1700),
        faction: Faction::Player,
        range: Fixed::from_num(400),
        hits_air: true,
    };
    c.bench_function("acquire_target", |b| {
        b.iter(|| black_box(acquire_target(sim.world(), &query, &sim.config().priorities)));
    });
}

criterion_group!(benches, simulation_benchmark, targeting_benchmark);
criterion_main!(benches);
