//! End-to-end tests: a small simulation driven through the tick loop.

use std::cell::RefCell;
use std::rc::Rc;

use arundos_engine::prelude::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Position {
    x: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Lifetime(u32);

/// Storage that remembers which entities it was told to release.
#[derive(Default)]
struct Tagged {
    tagged: Vec<bool>,
    released: Rc<RefCell<Vec<EntityId>>>,
}

impl Tagged {
    fn tag(&mut self, entity: EntityId) {
        if self.tagged.len() <= entity.index() {
            self.tagged.resize(entity.index() + 1, false);
        }
        self.tagged[entity.index()] = true;
    }
}

impl ComponentStorage for Tagged {
    fn remove_entity_data(&mut self, entity: EntityId) {
        if let Some(slot) = self.tagged.get_mut(entity.index()) {
            *slot = false;
        }
        self.released.borrow_mut().push(entity);
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

struct Drift {
    position: ComponentHandle<Component<Position>>,
}

impl System for Drift {
    fn name(&self) -> &str {
        "drift"
    }

    fn execute_system(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        for entity in ctx.enabled_entities()? {
            if let Some(position) = ctx.components_mut().component_data_mut(self.position, entity) {
                position.x += 1.0;
            }
        }
        Ok(())
    }
}

/// Counts lifetimes down and destroys expired entities.
struct Reaper {
    lifetime: ComponentHandle<Component<Lifetime>>,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl System for Reaper {
    fn name(&self) -> &str {
        "reaper"
    }

    fn execute_system(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        self.log.borrow_mut().push("reaper");
        for entity in ctx.enabled_entities()? {
            let remaining = match ctx.components_mut().component_data_mut(self.lifetime, entity) {
                Some(lifetime) => {
                    lifetime.0 = lifetime.0.saturating_sub(1);
                    lifetime.0
                }
                None => continue,
            };
            if remaining == 0 {
                ctx.destroy_entity(entity)?;
            }
        }
        Ok(())
    }
}

/// Logs its own execution so ordering can be checked.
struct Marker {
    name: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl System for Marker {
    fn name(&self) -> &str {
        self.name
    }

    fn execute_system(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        self.log.borrow_mut().push(self.name);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn expired_entities_are_destroyed_and_their_storages_notified() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let released = Rc::new(RefCell::new(Vec::new()));

    let mut world = World::new();
    let position = world.register_component::<Position>().unwrap();
    let lifetime = world.register_component::<Lifetime>().unwrap();
    let tagged = world
        .register_storage(Tagged {
            released: Rc::clone(&released),
            ..Tagged::default()
        })
        .unwrap();

    let drift = world.register_system(Drift { position }).unwrap();
    world.system_requires_component(drift, position).unwrap();
    let reaper = world
        .register_system(Reaper {
            lifetime,
            log: Rc::clone(&log),
        })
        .unwrap();
    world.system_requires_component(reaper, lifetime).unwrap();
    world.set_system_dependency(reaper, drift).unwrap();
    world.enable_system(reaper).unwrap();
    world.enable_system(drift).unwrap();
    assert_eq!(world.execution_order(), &[drift, reaper]);

    let short = world.register_entity().unwrap();
    let long = world.register_entity().unwrap();
    for (entity, ticks) in [(short, 2), (long, 5)] {
        world.require_component(position, entity, Position::default()).unwrap();
        world.require_component(lifetime, entity, Lifetime(ticks)).unwrap();
        world.components_mut().storage_mut(tagged).unwrap().tag(entity);
        world.components_mut().set_entity_component_signature(entity, tagged.id());
        world.enable_entity(entity).unwrap();
    }

    let mut tick_loop = TickLoop::new(world, TickConfig::default());
    tick_loop.run_ticks(3).unwrap();

    let world = tick_loop.world();
    assert!(!world.entities().is_living(short));
    assert!(world.entities().is_living(long));
    assert_eq!(world.component_data(position, long), Some(&Position { x: 3.0 }));
    assert_eq!(*released.borrow(), vec![short]);
    assert_eq!(world.destroyed_system_entities(drift).unwrap(), &[short]);
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn intervals_and_dependencies_shape_each_tick() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = World::new();
    let marker = |name| Marker {
        name,
        log: Rc::clone(&log),
    };
    let render = world.register_system(marker("render")).unwrap();
    let physics = world.register_system(marker("physics")).unwrap();
    let input = world.register_system(marker("input")).unwrap();
    world.set_system_dependency(render, physics).unwrap();
    world.set_system_dependency(physics, input).unwrap();
    world.set_system_interval(physics, 1).unwrap();
    for system in [render, physics, input] {
        world.enable_system(system).unwrap();
    }

    let mut tick_loop = TickLoop::new(world, TickConfig::default());
    tick_loop.run_ticks(4).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "input", "render", //
            "input", "physics", "render", //
            "input", "render", //
            "input", "physics", "render",
        ]
    );
}

#[test]
fn cycle_leaves_the_running_schedule_untouched() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = World::new();
    let a = world
        .register_system(Marker {
            name: "a",
            log: Rc::clone(&log),
        })
        .unwrap();
    let b = world
        .register_system(Marker {
            name: "b",
            log: Rc::clone(&log),
        })
        .unwrap();
    world.set_system_dependency(b, a).unwrap();
    world.enable_system(a).unwrap();
    world.enable_system(b).unwrap();

    let mut tick_loop = TickLoop::new(world, TickConfig::default());
    let err = tick_loop.world_mut().set_system_dependency(a, b).unwrap_err();
    assert!(matches!(err, EcsError::CyclicDependency { .. }));

    tick_loop.tick().unwrap();
    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sim_time_tracks_ticks(fixed_dt in 1e-4..1.0f64, ticks in 0..200u64) {
        let mut tick_loop = TickLoop::new(World::new(), TickConfig { fixed_dt });
        prop_assert_eq!(tick_loop.run_ticks(ticks).unwrap(), ticks);
        prop_assert_eq!(tick_loop.tick_count(), ticks);
        prop_assert_eq!(tick_loop.sim_time(), ticks as f64 * fixed_dt);
    }
}
