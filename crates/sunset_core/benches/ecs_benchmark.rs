//! # ECS Lifecycle Benchmark
//!
//! Entity creation, removal with slot reuse, and random component access.
//!
//! Run with: `cargo bench --package sunset_core --bench ecs_benchmark`

// Benchmarks don't need docs and may have intentionally unused fields
#![allow(missing_docs)]
#![allow(dead_code)]

use bytemuck::{Pod, Zeroable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sunset_core::{ComponentKind, EntityId, World};

const ENTITY_COUNT: usize = 100_000;

#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
#[repr(C)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
#[repr(C)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

struct Fixture {
    world: World,
    position: ComponentKind,
    velocity: ComponentKind,
    ids: Vec<EntityId>,
}

fn populated(count: usize) -> Fixture {
    let mut world = World::new();
    let position = world.register::<Position>().expect("register position");
    let velocity = world.register::<Velocity>().expect("register velocity");

    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let f = i as f32;
        let mut builder = world.builder();
        builder
            .with(position, &Position { x: f, y: f, z: f })
            .and_then(|b| b.with(velocity, &Velocity { x: 0.1, y: 0.2, z: 0.3 }))
            .expect("stage components");
        ids.push(builder.finish());
    }

    Fixture {
        world,
        position,
        velocity,
        ids,
    }
}

/// Random indices into `0..max`, fixed seed.
fn random_indices(count: usize, max: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0..max)).collect()
}

fn bench_create_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_entities");

    for count in [1_000, 10_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut world = World::new();
                let position = world.register::<Position>().expect("register");
                let mask = world.mask_of(&[position]);
                for _ in 0..count {
                    black_box(world.create_entity(&mask).expect("create"));
                }
                world.entity_count()
            });
        });
    }

    group.finish();
}

fn bench_builder(c: &mut Criterion) {
    c.bench_function("builder_two_components_10K", |b| {
        b.iter(|| black_box(populated(10_000).world.entity_count()));
    });
}

fn bench_remove_recreate_cycle(c: &mut Criterion) {
    let Fixture {
        mut world,
        position,
        velocity,
        mut ids,
    } = populated(ENTITY_COUNT);
    let mask = world.mask_of(&[position, velocity]);

    c.bench_function("remove_recreate_cycle_10K", |b| {
        b.iter(|| {
            for id in ids.iter_mut().take(10_000) {
                world.remove_entity(*id).expect("remove");
                *id = world.create_entity(&mask).expect("create");
            }
            black_box(world.entity_count())
        });
    });
}

fn bench_random_access(c: &mut Criterion) {
    let Fixture {
        world,
        position,
        ids,
        ..
    } = populated(ENTITY_COUNT);
    let indices = random_indices(10_000, ids.len(), 0xDEAD_BEEF);

    let mut group = c.benchmark_group("random_access");

    group.bench_function("raw_bytes_10K", |b| {
        b.iter(|| {
            let mut sum = 0usize;
            for &i in &indices {
                sum += world.get_component(ids[i], position).expect("get").len();
            }
            black_box(sum)
        });
    });

    group.bench_function("typed_10K", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for &i in &indices {
                sum += world.get::<Position>(ids[i], position).expect("get").x;
            }
            black_box(sum)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_create_entities,
    bench_builder,
    bench_remove_recreate_cycle,
    bench_random_access,
);

criterion_main!(benches);
