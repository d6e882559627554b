//! Physics Benchmarks
//!
//! Step and broadphase throughput for growing body counts

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use planar_core::{Aabb, DVec2, Transform2D, World};
use planar_physics::{
    BodyType, Collider, PhysicsConfig, PhysicsStep, Proxy, RigidBody, RigidBodyDesc, Shape,
    SpatialHash,
};

/// A static floor with a grid of boxes and balls stacked above it
fn build_pile(count: usize) -> World {
    let mut world = World::new();

    let floor = world.spawn();
    world.add_component(floor, Transform2D::from_position(DVec2::new(0.0, 400.0)));
    world.add_component(
        floor,
        RigidBody::from_desc(&RigidBodyDesc {
            body_type: BodyType::Static,
            ..Default::default()
        }),
    );
    world.add_component(floor, Collider::new(Shape::rectangle(4000.0, 40.0).unwrap()));

    let columns = (count as f64).sqrt().ceil() as usize;
    for i in 0..count {
        let (col, row) = (i % columns, i / columns);
        let entity = world.spawn();
        let position = DVec2::new(col as f64 * 24.0 - columns as f64 * 12.0, 360.0 - row as f64 * 24.0);
        world.add_component(entity, Transform2D::from_position(position));
        world.add_component(entity, RigidBody::default());
        let shape = if i % 2 == 0 {
            Shape::rectangle(20.0, 20.0).unwrap()
        } else {
            Shape::circle(10.0).unwrap()
        };
        world.add_component(entity, Collider::new(shape));
    }

    world
}

fn bench_physics_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("physics_step");

    for count in [100, 500, 2000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || {
                    let world = build_pile(count);
                    let step = PhysicsStep::new(PhysicsConfig::default()).unwrap();
                    (world, step)
                },
                |(mut world, mut step)| {
                    for _ in 0..10 {
                        step.update(1.0 / 60.0, &mut world).unwrap();
                    }
                    black_box(step.last_step_stats())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_broadphase(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadphase_query_pairs");

    for count in [1000, 10000].iter() {
        let proxies: Vec<Proxy> = (0..*count)
            .map(|i| {
                let x = (i % 100) as f64 * 15.0;
                let y = (i / 100) as f64 * 15.0;
                Proxy {
                    key: i as u64,
                    aabb: Aabb::new(x, y, 20.0, 20.0),
                    layer: 1,
                    mask: u32::MAX,
                }
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &proxies, |b, proxies| {
            let mut hash = SpatialHash::new(64.0).unwrap();
            b.iter(|| black_box(hash.query_pairs(proxies).len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_physics_step, bench_broadphase);
criterion_main!(benches);
