//! Benchmark for hostile AI ticks and whole-simulation ticks.
//!
//! Run with: cargo bench --package delve --bench ai_tick_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use delve::ai::{ArchetypeTable, ArenaBounds, EntityId, HostileEntity, HostileKind};
use delve::{GameConfig, Simulation, SurfaceNavigator, Vec3};
use delve_procedural::{
    BiomeDescriptor, MaterialPalette, NoiseField, WorldBuilder, WorldConfig, WorldSeed,
};

fn benchmark_hostile_tick(c: &mut Criterion) {
    let config = WorldConfig::default();
    let field = NoiseField::new(WorldSeed::new(42), config.terrain_scale, config.ore_scale);
    let builder = WorldBuilder::new(config, BiomeDescriptor::meadow(), MaterialPalette::standard(), field);
    let mut navigator = SurfaceNavigator::new();
    let stage = builder.build(&mut navigator).expect("meadow generates");
    let arena = ArenaBounds::from_config(&stage.config);
    let table = ArchetypeTable::default();

    let spawns: Vec<Vec3> = stage.spawn_points.iter().take(64).map(Vec3::from_cell).collect();
    let target = spawns.first().copied().unwrap_or_default();

    let mut group = c.benchmark_group("hostile_tick");
    for count in [8_usize, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut hostiles: Vec<HostileEntity> = spawns
                .iter()
                .cycle()
                .take(count)
                .enumerate()
                .map(|(i, p)| HostileEntity::spawn(EntityId(i as u32), HostileKind::Melee, *p, &table))
                .collect();
            let mut out = Vec::new();
            b.iter(|| {
                for hostile in &mut hostiles {
                    out.clear();
                    hostile.tick(1.0 / 60.0, Some(target), &navigator, &arena, &mut out);
                }
                black_box(out.len())
            });
        });
    }
    group.finish();
}

fn benchmark_simulation_tick(c: &mut Criterion) {
    let config = GameConfig {
        background_generation: false,
        ..GameConfig::default()
    };
    let mut sim = Simulation::new(config).expect("default config is valid");
    sim.wait_until_ready().expect("stage 0 generates");

    c.bench_function("simulation_tick_meadow", |b| {
        b.iter(|| black_box(sim.tick(black_box(1.0 / 60.0))));
    });
}

criterion_group!(benches, benchmark_hostile_tick, benchmark_simulation_tick);
criterion_main!(benches);
