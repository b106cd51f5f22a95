//! ECS benchmarks: per-system entity scans, dirty tracking and scheduling.
//!
//! Run with: `cargo bench --bench ecs_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use arundos_ecs::prelude::*;

#[derive(Debug, Default, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Default, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

struct Movement {
    position: ComponentHandle<Component<Position>>,
    velocity: ComponentHandle<Component<Velocity>>,
}

impl System for Movement {
    fn execute_system(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        for entity in ctx.enabled_entities()? {
            let components = ctx.components_mut();
            let velocity = components
                .component_data(self.velocity, entity)
                .copied()
                .unwrap_or_default();
            if let Some(position) = components.component_data_mut(self.position, entity) {
                position.x += velocity.dx;
                position.y += velocity.dy;
            }
        }
        ctx.clear_updated()
    }
}

struct Idle;

impl System for Idle {}

/// A world with `count` moving entities and one movement system.
fn movement_world(count: usize) -> World {
    let mut world = World::new();
    let position = world.register_component::<Position>().unwrap();
    let velocity = world.register_component::<Velocity>().unwrap();
    let movement = world.register_system(Movement { position, velocity }).unwrap();
    world.system_requires_component(movement, position).unwrap();
    world.system_requires_component(movement, velocity).unwrap();
    world.enable_system(movement).unwrap();

    for i in 0..count {
        let e = world.register_entity().unwrap();
        world
            .require_component(position, e, Position { x: i as f32, y: 0.0 })
            .unwrap();
        world
            .require_component(velocity, e, Velocity { dx: 1.0, dy: 0.5 })
            .unwrap();
        world.enable_entity(e).unwrap();
    }
    world
}

// ---------------------------------------------------------------------------
// Run systems
// ---------------------------------------------------------------------------

fn bench_run_systems(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_systems");

    for count in [100usize, 1_000, 10_000] {
        let mut world = movement_world(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| world.run_systems().unwrap());
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Dirty tracking
// ---------------------------------------------------------------------------

fn bench_update_component(c: &mut Criterion) {
    let mut world = World::new();
    let position = world.register_component::<Position>().unwrap();
    for _ in 0..16 {
        let system = world.register_system(Idle).unwrap();
        world.system_requires_component(system, position).unwrap();
        world.enable_system(system).unwrap();
    }
    let entities: Vec<EntityId> = (0..1_000)
        .map(|_| {
            let e = world.register_entity().unwrap();
            world.require_component(position, e, Position::default()).unwrap();
            world.enable_entity(e).unwrap();
            e
        })
        .collect();

    c.bench_function("update_component_1k_x_16_systems", |b| {
        b.iter(|| {
            for &e in &entities {
                world
                    .update_component(position, e, Position { x: 1.0, y: 1.0 })
                    .unwrap();
            }
            for system in world.execution_order().to_vec() {
                world.clear_system_entity_update_signatures(system).unwrap();
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

fn bench_enable_chain(c: &mut Criterion) {
    c.bench_function("enable_chain_of_32_systems", |b| {
        b.iter(|| {
            let mut world = World::new();
            let systems: Vec<SystemId> = (0..MAX_NUM_SYSTEMS)
                .map(|_| world.register_system(Idle).unwrap())
                .collect();
            for pair in systems.windows(2) {
                world.set_system_dependency(pair[0], pair[1]).unwrap();
            }
            for &system in &systems {
                world.enable_system(system).unwrap();
            }
            black_box(world.execution_order().len())
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_run_systems,
    bench_update_component,
    bench_enable_chain,
);
criterion_main!(benches);
