//! Benchmarks for topology generation, connection building and the per-frame
//! CPU update.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use topobg::{build_connections, BackgroundOptions, ParticleCloud, Scene, SpawnContext};

fn options(count: u32) -> BackgroundOptions {
    BackgroundOptions {
        particle_count: count,
        ..Default::default()
    }
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for count in [120u32, 200, 1000] {
        let opts = options(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &opts, |b, opts| {
            b.iter(|| {
                let mut ctx = SpawnContext::seeded(42);
                black_box(ParticleCloud::generate(opts, &mut ctx))
            })
        });
    }

    group.finish();
}

fn bench_build_connections(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_connections");

    for count in [200u32, 1000, 2000] {
        let opts = options(count);
        let mut cloud = ParticleCloud::generate(&opts, &mut SpawnContext::seeded(42));
        group.bench_with_input(BenchmarkId::from_parameter(count), &opts, |b, opts| {
            b.iter(|| black_box(build_connections(&mut cloud, opts)))
        });
    }

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    for count in [120u32, 200, 1000] {
        let mut scene = Scene::new(&options(count), &mut SpawnContext::seeded(42));
        scene.pointer.move_to(400.0, 300.0);
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| {
                scene.frame();
                black_box(scene.model_matrix())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_build_connections, bench_frame);
criterion_main!(benches);
