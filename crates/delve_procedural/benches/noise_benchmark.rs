//! Benchmark for noise field sampling.
//!
//! Run with: cargo bench --package delve_procedural --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use delve_procedural::{NoiseField, SimplexNoise, WorldSeed};

fn benchmark_simplex_sample(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("simplex_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_field_2d(c: &mut Criterion) {
    let field = NoiseField::new(WorldSeed::new(42), 20.0, 10.0);

    let mut group = c.benchmark_group("field_2d");
    group.throughput(Throughput::Elements(400));
    group.bench_function("20x20_heightmap", |b| {
        b.iter(|| {
            for x in 0..20 {
                for z in 0..20 {
                    black_box(field.sample_2d(f64::from(x), f64::from(z)));
                }
            }
        });
    });
    group.finish();
}

fn benchmark_field_3d(c: &mut Criterion) {
    let field = NoiseField::new(WorldSeed::new(42), 20.0, 10.0);

    c.bench_function("field_3d_sample", |b| {
        let mut y = 0.0f64;
        b.iter(|| {
            y -= 0.5;
            black_box(field.sample_3d(black_box(3.0), black_box(y), black_box(7.0)))
        });
    });
}

criterion_group!(
    benches,
    benchmark_simplex_sample,
    benchmark_field_2d,
    benchmark_field_3d
);
criterion_main!(benches);
