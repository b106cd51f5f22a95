//! Headless particle fountain.
//!
//! A spawner emits a burst of particles every few ticks, movement integrates
//! them under gravity, and a reaper destroys them when their lifetime runs
//! out. Each frame the live positions are copied into a scratch buffer taken
//! from a stack allocator and released again with a marker.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example particles -p arundos-engine

use std::ptr::NonNull;

use arundos_engine::prelude::*;

const GRAVITY: f32 = -9.81;
const BURST: u32 = 8;
const TICKS: u64 = 240;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

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

#[derive(Debug, Default, Clone, Copy)]
struct Lifetime {
    ticks_left: u32,
}

#[derive(Clone, Copy)]
struct Handles {
    position: ComponentHandle<Component<Position>>,
    velocity: ComponentHandle<Component<Velocity>>,
    lifetime: ComponentHandle<Component<Lifetime>>,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

struct Spawner {
    handles: Handles,
    emitted: u32,
}

impl System for Spawner {
    fn name(&self) -> &str {
        "spawner"
    }

    fn execute_system(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        for i in 0..BURST {
            let angle = (self.emitted + i) as f32 * 0.7;
            let entity = ctx.register_entity()?;
            let components = ctx.components_mut();
            components.require_component(self.handles.position, entity, Position::default())?;
            components.require_component(
                self.handles.velocity,
                entity,
                Velocity {
                    dx: angle.cos() * 2.0,
                    dy: 6.0 + angle.sin(),
                },
            )?;
            components.require_component(
                self.handles.lifetime,
                entity,
                Lifetime {
                    ticks_left: 60 + (i * 5),
                },
            )?;
            ctx.enable_entity(entity)?;
        }
        self.emitted += BURST;
        Ok(())
    }
}

struct Movement {
    handles: Handles,
    dt: f32,
}

impl System for Movement {
    fn name(&self) -> &str {
        "movement"
    }

    fn execute_system(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        for entity in ctx.enabled_entities()? {
            let components = ctx.components_mut();
            let Some(velocity) = components.component_data_mut(self.handles.velocity, entity) else {
                continue;
            };
            velocity.dy += GRAVITY * self.dt;
            let velocity = *velocity;
            if let Some(position) = components.component_data_mut(self.handles.position, entity) {
                position.x += velocity.dx * self.dt;
                position.y += velocity.dy * self.dt;
            }
        }
        ctx.clear_updated()
    }
}

struct Reaper {
    handles: Handles,
    reaped: u64,
}

impl System for Reaper {
    fn name(&self) -> &str {
        "reaper"
    }

    fn execute_system(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        for entity in ctx.enabled_entities()? {
            let expired = match ctx
                .components_mut()
                .component_data_mut(self.handles.lifetime, entity)
            {
                Some(lifetime) => {
                    lifetime.ticks_left = lifetime.ticks_left.saturating_sub(1);
                    lifetime.ticks_left == 0
                }
                None => false,
            };
            if expired {
                ctx.destroy_entity(entity)?;
                self.reaped += 1;
            }
        }
        ctx.clear_destroyed()
    }
}

// ---------------------------------------------------------------------------
// Frame scratch
// ---------------------------------------------------------------------------

/// Average particle position, computed through a scratch buffer taken from
/// `arena` and released before returning.
fn centroid(
    world: &World,
    handles: Handles,
    arena: &mut StackAllocator<'_>,
) -> Result<Option<(f32, f32)>, MemoryError> {
    let entities = world.components().component_entities(handles.position.id());
    if entities.is_empty() {
        return Ok(None);
    }

    let marker = arena.marker();
    let bytes = entities.len() * std::mem::size_of::<Position>();
    let scratch: NonNull<Position> = arena
        .allocate(bytes, std::mem::align_of::<Position>())?
        .cast();

    let mut sum = (0.0, 0.0);
    for (i, &entity) in entities.iter().enumerate() {
        let position = world
            .component_data(handles.position, entity)
            .copied()
            .unwrap_or_default();
        // The buffer holds `entities.len()` positions and lives until the
        // marker below is redeemed.
        unsafe { scratch.as_ptr().add(i).write(position) };
    }
    for i in 0..entities.len() {
        let position = unsafe { scratch.as_ptr().add(i).read() };
        sum.0 += position.x;
        sum.1 += position.y;
    }
    arena.deallocate_to_marker(marker);

    let count = entities.len() as f32;
    Ok(Some((sum.0 / count, sum.1 / count)))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    init_tracing();

    let config = TickConfig::from_json(r#"{ "fixed_dt": 0.02 }"#)?;
    let dt = config.fixed_dt as f32;

    let mut world = World::new();
    let handles = Handles {
        position: world.register_component::<Position>()?,
        velocity: world.register_component::<Velocity>()?,
        lifetime: world.register_component::<Lifetime>()?,
    };

    let spawner = world.register_system(Spawner {
        handles,
        emitted: 0,
    })?;
    world.set_system_interval(spawner, 4)?;

    let movement = world.register_system(Movement { handles, dt })?;
    world.system_requires_component(movement, handles.position)?;
    world.system_requires_component(movement, handles.velocity)?;
    world.set_system_dependency(movement, spawner)?;

    let reaper = world.register_system(Reaper { handles, reaped: 0 })?;
    world.system_requires_component(reaper, handles.lifetime)?;
    world.set_system_dependency(reaper, movement)?;

    for system in [spawner, movement, reaper] {
        world.enable_system(system)?;
    }

    let memory = MemoryManager::new(256 * 1024)?;
    let mut frame_arena = StackAllocator::new(memory.carve(128 * 1024)?);

    let mut tick_loop = TickLoop::new(world, config);
    for _ in 0..TICKS {
        tick_loop.tick()?;
        if tick_loop.tick_count() % 40 == 0 {
            let world = tick_loop.world();
            let alive = world.entities().living_count();
            let centre = centroid(world, handles, &mut frame_arena)?;
            tracing::info!(
                tick = tick_loop.tick_count(),
                alive,
                centre = ?centre,
                "particles"
            );
            println!(
                "t={:>5.2}s alive={:>3} centre={:?}",
                tick_loop.sim_time(),
                alive,
                centre
            );
        }
    }

    let world = tick_loop.world();
    let reaped = world
        .systems()
        .system::<Reaper>(reaper)
        .map_or(0, |reaper| reaper.reaped);
    println!(
        "done: {} ticks, {} particles reaped, last tick took {:?}",
        tick_loop.tick_count(),
        reaped,
        tick_loop.last_diagnostics().total_time
    );
    Ok(())
}
