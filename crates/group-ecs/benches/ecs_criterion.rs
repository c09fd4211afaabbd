//! ECS benchmarks using criterion for historical comparison.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use group_ecs::{EntityHandle, World};

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy)]
struct Frozen;

fn pos(i: u64) -> Position {
    Position {
        x: i as f32,
        y: 0.0,
        z: 0.0,
    }
}

const VEL: Velocity = Velocity {
    x: 1.0,
    y: 0.5,
    z: 0.0,
};

fn world() -> World {
    let mut world = World::new();
    world.register_component::<Position>().unwrap();
    world.register_component::<Velocity>().unwrap();
    world.register_component::<Frozen>().unwrap();
    world
}

fn create_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");

    for count in [1, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(
            BenchmarkId::new("position", count),
            &count,
            |b, &count| {
                b.iter(|| {
                    let mut world = world();
                    for i in 0..count {
                        black_box(world.create_entity((pos(i),)).unwrap());
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("position_velocity", count),
            &count,
            |b, &count| {
                b.iter(|| {
                    let mut world = world();
                    for i in 0..count {
                        black_box(world.create_entity((pos(i), VEL)).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

fn query_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for count in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(count));

        let mut world = world();
        for i in 0..count {
            match i % 3 {
                0 => world.create_entity((pos(i),)).unwrap(),
                1 => world.create_entity((pos(i), VEL)).unwrap(),
                _ => world.create_entity((pos(i), VEL, Frozen)).unwrap(),
            };
        }

        let movement = world
            .query()
            .write::<Position>()
            .read::<Velocity>()
            .without::<Frozen>()
            .build()
            .unwrap();
        let read = world.query().read::<Position>().build().unwrap();

        group.bench_function(BenchmarkId::new("write_position", count), |b| {
            b.iter(|| {
                movement.for_each(&mut world, |mut row| {
                    let v = *row.get::<Velocity>();
                    let p = row.get_mut::<Position>();
                    p.x += v.x;
                    p.y += v.y;
                    p.z += v.z;
                });
            });
        });

        group.bench_function(BenchmarkId::new("read_position", count), |b| {
            b.iter(|| {
                let mut sum = 0.0_f32;
                read.for_each_read(&world, |row| sum += row.get::<Position>().x);
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn erase_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("erase");

    for count in [100, 1000] {
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("front", count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let mut world = world();
                    let handles: Vec<EntityHandle> = (0..count)
                        .map(|i| world.create_entity((pos(i), VEL)).unwrap())
                        .collect();
                    (world, handles[0])
                },
                |(mut world, first)| {
                    for _ in 0..count {
                        world.erase(first);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn archetype_change_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("archetype_change");

    for count in [100, 1000] {
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(
            BenchmarkId::new("insert_component", count),
            &count,
            |b, &count| {
                b.iter_batched(
                    || {
                        let mut world = world();
                        let handles: Vec<EntityHandle> = (0..count)
                            .map(|i| world.create_entity((pos(i),)).unwrap())
                            .collect();
                        (world, handles[0])
                    },
                    |(mut world, first)| {
                        // The target group sorts after the source, so the
                        // source handle stays valid.
                        for _ in 0..count {
                            black_box(world.insert_component(first, VEL).unwrap());
                        }
                    },
                    BatchSize::SmallInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("remove_component", count),
            &count,
            |b, &count| {
                b.iter_batched(
                    || {
                        let mut world = world();
                        for i in 0..count {
                            world.create_entity((pos(i), VEL)).unwrap();
                        }
                        world
                    },
                    |mut world| {
                        let ids = [
                            world.component_id::<Position>().unwrap(),
                            world.component_id::<Velocity>().unwrap(),
                        ];
                        for _ in 0..count {
                            let source = world.groups().find(&ids).unwrap();
                            let handle = EntityHandle::new(source, 0);
                            black_box(world.remove_component::<Velocity>(handle).unwrap());
                        }
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    create_benchmarks,
    query_benchmarks,
    erase_benchmarks,
    archetype_change_benchmarks,
);

criterion_main!(benches);
