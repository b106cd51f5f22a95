//! System registration, dependency ordering and per-tick execution.
//!
//! Each registered system owns a [`DependencySignature`]: bit `j` means "run
//! after system `j`" and the final bit is the system's enabled flag. Enabling
//! a system rebuilds the execution order from scratch:
//!
//! 1. A depth-first walk over the enabled, non-child systems in id order
//!    emits every system after its dependencies and reports a dependency
//!    cycle as soon as it closes.
//! 2. Systems are then inserted one by one into the result list, each placed
//!    right after the last system it depends on, and checked against the
//!    first already-placed system that depends on it.
//!
//! Dependencies on systems that are disabled or marked as child systems are
//! ignored for ordering. Disabling or destroying a system that an enabled
//! system still depends on is refused.
//!
//! [`SystemManager::run_systems`] walks the order once per tick and calls
//! each due system's `setup_system`, `execute_system` and `cleanup_system`
//! hooks, in that order.

use std::collections::BTreeMap;

use crate::component::AsAny;
use crate::component_manager::ComponentManager;
use crate::constants::MAX_NUM_SYSTEMS;
use crate::entity_manager::EntityManager;
use crate::id::{ComponentId, EntityId, SystemId};
use crate::id_stack::IdStack;
use crate::signature::DependencySignature;
use crate::EcsError;

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// A unit of per-tick logic.
///
/// All hooks default to doing nothing. An error returned from a hook aborts
/// the current [`run_systems`](SystemManager::run_systems) call.
pub trait System: AsAny {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs first on every tick the system is due.
    fn setup_system(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        Ok(())
    }

    /// Runs after [`setup_system`](Self::setup_system).
    fn execute_system(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        Ok(())
    }

    /// Runs after [`execute_system`](Self::execute_system).
    fn cleanup_system(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SystemContext
// ---------------------------------------------------------------------------

/// What a running system can reach: the component and entity managers, plus
/// its own id so the per-system queries need no argument.
pub struct SystemContext<'a> {
    components: &'a mut ComponentManager,
    entities: &'a mut EntityManager,
    system: SystemId,
}

impl<'a> SystemContext<'a> {
    pub fn new(
        components: &'a mut ComponentManager,
        entities: &'a mut EntityManager,
        system: SystemId,
    ) -> Self {
        Self {
            components,
            entities,
            system,
        }
    }

    /// Id of the running system.
    pub fn system_id(&self) -> SystemId {
        self.system
    }

    pub fn components(&self) -> &ComponentManager {
        &*self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentManager {
        &mut *self.components
    }

    pub fn entities(&self) -> &EntityManager {
        &*self.entities
    }

    /// Enabled entities that satisfy this system's component requirements.
    pub fn enabled_entities(&self) -> Result<Vec<EntityId>, EcsError> {
        self.components.enabled_system_entities(self.system)
    }

    /// Entities marked updated for this system since it last cleared them.
    pub fn updated_entities(&self) -> Result<Vec<EntityId>, EcsError> {
        self.components.updated_system_entities(self.system)
    }

    /// Entities destroyed since this system last cleared them.
    pub fn destroyed_entities(&self) -> Result<Vec<EntityId>, EcsError> {
        Ok(self.components.destroyed_system_entities(self.system)?.to_vec())
    }

    pub fn clear_updated(&mut self) -> Result<(), EcsError> {
        self.components
            .clear_system_entity_update_signatures(self.system)
    }

    pub fn clear_destroyed(&mut self) -> Result<(), EcsError> {
        self.components
            .clear_system_entity_destroyed_signatures(self.system)
    }

    /// Filter `entities` to those using at least one of `optional`.
    pub fn entities_with_specified_components(
        &self,
        entities: &[EntityId],
        optional: &[ComponentId],
    ) -> Vec<EntityId> {
        self.components
            .entities_with_specified_components(entities, optional)
    }

    /// Register a new (disabled) entity.
    pub fn register_entity(&mut self) -> Result<EntityId, EcsError> {
        self.entities.register_entity()
    }

    pub fn enable_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.entities.enable_entity(self.components, entity)
    }

    pub fn disable_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.entities.disable_entity(self.components, entity)
    }

    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.entities.destroy_entity(self.components, entity)
    }
}

// ---------------------------------------------------------------------------
// SystemManager
// ---------------------------------------------------------------------------

struct SystemSlot {
    system: Box<dyn System>,
    name: String,
    /// Ticks to skip between executions. Zero runs every tick.
    interval: u32,
    cycles_since_execution: u32,
    is_child: bool,
    dependencies: DependencySignature,
}

impl SystemSlot {
    fn is_enabled(&self) -> bool {
        self.dependencies.is_enabled()
    }

    /// Takes part in top-level ordering and execution.
    fn is_scheduled(&self) -> bool {
        self.is_enabled() && !self.is_child
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Registry and scheduler of systems.
pub struct SystemManager {
    ids: IdStack,
    slots: BTreeMap<SystemId, SystemSlot>,
    execution_order: Vec<SystemId>,
}

impl SystemManager {
    pub fn new() -> Self {
        Self {
            ids: IdStack::new("system", MAX_NUM_SYSTEMS),
            slots: BTreeMap::new(),
            execution_order: Vec::new(),
        }
    }

    /// Allocate an id for `system` and give it a blank component signature.
    ///
    /// The system starts disabled with no dependencies and an interval of 0.
    pub fn register_system(
        &mut self,
        components: &mut ComponentManager,
        system: Box<dyn System>,
    ) -> Result<SystemId, EcsError> {
        let id = SystemId::from_index(self.ids.allocate()?);
        components.register_system(id);
        let name = system.name().to_owned();
        tracing::debug!(system = %name, id = %id, "system registered");
        self.slots.insert(
            id,
            SystemSlot {
                system,
                name,
                interval: 0,
                cycles_since_execution: 0,
                is_child: false,
                dependencies: DependencySignature::new(),
            },
        );
        Ok(id)
    }

    fn slot(&self, system: SystemId) -> Result<&SystemSlot, EcsError> {
        self.slots
            .get(&system)
            .ok_or(EcsError::UnregisteredSystem { system })
    }

    fn slot_mut(&mut self, system: SystemId) -> Result<&mut SystemSlot, EcsError> {
        self.slots
            .get_mut(&system)
            .ok_or(EcsError::UnregisteredSystem { system })
    }

    fn name_of(&self, system: SystemId) -> String {
        self.slots
            .get(&system)
            .map_or_else(|| system.to_string(), |slot| slot.name.clone())
    }

    fn cycle(&self, first: SystemId, second: SystemId) -> EcsError {
        EcsError::CyclicDependency {
            first: self.name_of(first),
            second: self.name_of(second),
        }
    }

    // -- dependencies ---------------------------------------------------------

    /// Declare that `system` must run after `predecessor`.
    ///
    /// If `system` is enabled the order is rebuilt immediately; a cycle is
    /// reported and the declaration is undone.
    pub fn set_system_dependency_signature(
        &mut self,
        system: SystemId,
        predecessor: SystemId,
    ) -> Result<(), EcsError> {
        self.slot(predecessor)?;
        if self.slot(system)?.dependencies.test(predecessor.index()) {
            return Ok(());
        }
        if system == predecessor {
            return Err(self.cycle(system, system));
        }

        self.slot_mut(system)?.dependencies.set(predecessor.index());
        if self.slot(system)?.is_scheduled() {
            if let Err(err) = self.reorder() {
                self.slot_mut(system)?.dependencies.clear(predecessor.index());
                return Err(err);
            }
        }
        Ok(())
    }

    /// Drop the requirement that `system` runs after `predecessor`.
    ///
    /// Removing a constraint keeps the current order valid, so nothing is
    /// reordered.
    pub fn unset_system_dependency_signature(
        &mut self,
        system: SystemId,
        predecessor: SystemId,
    ) -> Result<(), EcsError> {
        self.slot(predecessor)?;
        self.slot_mut(system)?
            .dependencies
            .clear(predecessor.index());
        Ok(())
    }

    /// `system`'s dependency signature, enabled flag included.
    pub fn dependency_signature(&self, system: SystemId) -> Result<&DependencySignature, EcsError> {
        Ok(&self.slot(system)?.dependencies)
    }

    // -- enable / disable / destroy -------------------------------------------

    /// Enable `system` and rebuild the execution order.
    ///
    /// On a cycle the system stays disabled and the previous order is kept.
    pub fn enable_system(&mut self, system: SystemId) -> Result<(), EcsError> {
        let slot = self.slot_mut(system)?;
        if slot.is_enabled() {
            return Ok(());
        }
        slot.dependencies.set_enabled(true);

        if let Err(err) = self.reorder() {
            self.slot_mut(system)?.dependencies.set_enabled(false);
            return Err(err);
        }

        let slot = self.slot(system)?;
        for dependency in slot.dependencies.members() {
            let dependency = SystemId::from_index(dependency);
            if !self.is_enabled(dependency) {
                tracing::warn!(
                    system = %slot.name,
                    dependency = %self.name_of(dependency),
                    "system enabled before one of its dependencies"
                );
            }
        }
        tracing::debug!(
            system = %slot.name,
            order = ?self.execution_order,
            "system enabled"
        );
        Ok(())
    }

    /// Disable `system`, refusing while another enabled system depends on it.
    ///
    /// The remaining systems keep their relative order.
    pub fn disable_system(&mut self, system: SystemId) -> Result<(), EcsError> {
        if !self.slot(system)?.is_enabled() {
            return Ok(());
        }
        self.check_no_enabled_dependents(system)?;

        self.execution_order.retain(|&id| id != system);
        let slot = self.slot_mut(system)?;
        slot.dependencies.set_enabled(false);
        tracing::debug!(system = %slot.name, "system disabled");
        Ok(())
    }

    /// Disable and unregister `system`, returning it.
    ///
    /// Fails like [`disable_system`](Self::disable_system) when an enabled
    /// system depends on it, even if `system` itself is disabled. The id's
    /// bit is cleared from every remaining dependency signature before the
    /// id is recycled.
    pub fn destroy_system(
        &mut self,
        components: &mut ComponentManager,
        system: SystemId,
    ) -> Result<Box<dyn System>, EcsError> {
        self.slot(system)?;
        self.check_no_enabled_dependents(system)?;
        self.disable_system(system)?;

        for slot in self.slots.values_mut() {
            slot.dependencies.clear(system.index());
        }
        let slot = self
            .slots
            .remove(&system)
            .ok_or(EcsError::UnregisteredSystem { system })?;
        components.remove_system(system);
        self.ids.release(system.index())?;
        tracing::debug!(system = %slot.name, id = %system, "system destroyed");
        Ok(slot.system)
    }

    fn check_no_enabled_dependents(&self, system: SystemId) -> Result<(), EcsError> {
        let dependent = self.slots.iter().find(|(id, slot)| {
            **id != system && slot.is_enabled() && slot.dependencies.test(system.index())
        });
        match dependent {
            Some((_, dependent)) => Err(EcsError::DependentSystemStillEnabled {
                system: self.name_of(system),
                dependent: dependent.name.clone(),
            }),
            None => Ok(()),
        }
    }

    // -- scheduling parameters ------------------------------------------------

    /// Ticks to skip between executions: a system with interval `n` runs on
    /// every `(n + 1)`th tick. Resets the skip counter.
    pub fn set_system_interval(&mut self, system: SystemId, interval: u32) -> Result<(), EcsError> {
        let slot = self.slot_mut(system)?;
        slot.interval = interval;
        slot.cycles_since_execution = 0;
        Ok(())
    }

    pub fn system_interval(&self, system: SystemId) -> Result<u32, EcsError> {
        Ok(self.slot(system)?.interval)
    }

    /// Mark `system` as driven by another system rather than the scheduler.
    ///
    /// Child systems are left out of the execution order and never run by
    /// [`run_systems`](Self::run_systems).
    pub fn set_child_system(&mut self, system: SystemId, is_child: bool) -> Result<(), EcsError> {
        let slot = self.slot_mut(system)?;
        if slot.is_child == is_child {
            return Ok(());
        }
        slot.is_child = is_child;
        if slot.is_enabled() {
            if let Err(err) = self.reorder() {
                self.slot_mut(system)?.is_child = !is_child;
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn is_child_system(&self, system: SystemId) -> Result<bool, EcsError> {
        Ok(self.slot(system)?.is_child)
    }

    // -- queries --------------------------------------------------------------

    /// Enabled, non-child systems in execution order.
    pub fn execution_order(&self) -> &[SystemId] {
        &self.execution_order
    }

    /// Whether `system` is registered and enabled.
    pub fn is_enabled(&self, system: SystemId) -> bool {
        self.slots.get(&system).is_some_and(SystemSlot::is_enabled)
    }

    pub fn is_registered(&self, system: SystemId) -> bool {
        self.slots.contains_key(&system)
    }

    pub fn system_name(&self, system: SystemId) -> Option<&str> {
        self.slots.get(&system).map(|slot| slot.name.as_str())
    }

    pub fn system_count(&self) -> usize {
        self.slots.len()
    }

    /// The registered system behind `id`, if it is an `S`.
    pub fn system<S: System>(&self, id: SystemId) -> Option<&S> {
        self.slots
            .get(&id)
            .and_then(|slot| slot.system.as_ref().as_any().downcast_ref::<S>())
    }

    /// Mutable counterpart of [`system`](Self::system).
    pub fn system_mut<S: System>(&mut self, id: SystemId) -> Option<&mut S> {
        self.slots
            .get_mut(&id)
            .and_then(|slot| slot.system.as_mut().as_any_mut().downcast_mut::<S>())
    }

    // -- ordering -------------------------------------------------------------

    fn reorder(&mut self) -> Result<(), EcsError> {
        self.execution_order = self.compute_order()?;
        Ok(())
    }

    fn is_scheduled(&self, system: SystemId) -> bool {
        self.slots.get(&system).is_some_and(SystemSlot::is_scheduled)
    }

    fn compute_order(&self) -> Result<Vec<SystemId>, EcsError> {
        let mut marks = [Mark::Unvisited; MAX_NUM_SYSTEMS];
        let mut seeded = Vec::new();
        for (&id, slot) in &self.slots {
            if slot.is_scheduled() {
                self.visit(id, &mut marks, &mut seeded)?;
            }
        }

        // Postorder: nothing already in `order` depends on `system`, so it
        // only has to land after its last dependency.
        let mut order: Vec<SystemId> = Vec::with_capacity(seeded.len());
        for system in seeded {
            let dependencies = self.slot(system)?.dependencies;
            let last_predecessor = order
                .iter()
                .rposition(|other| dependencies.test(other.index()));
            let at = last_predecessor.map_or(0, |predecessor| predecessor + 1);
            order.insert(at, system);
        }
        Ok(order)
    }

    /// Depth-first walk emitting `system` after its scheduled dependencies.
    fn visit(
        &self,
        system: SystemId,
        marks: &mut [Mark; MAX_NUM_SYSTEMS],
        out: &mut Vec<SystemId>,
    ) -> Result<(), EcsError> {
        if marks[system.index()] == Mark::Done {
            return Ok(());
        }
        marks[system.index()] = Mark::Visiting;

        for dependency in self.slot(system)?.dependencies.members() {
            let dependency = SystemId::from_index(dependency);
            if !self.is_scheduled(dependency) {
                continue;
            }
            match marks[dependency.index()] {
                Mark::Visiting => return Err(self.cycle(dependency, system)),
                Mark::Done => {}
                Mark::Unvisited => self.visit(dependency, marks, out)?,
            }
        }

        marks[system.index()] = Mark::Done;
        out.push(system);
        Ok(())
    }

    // -- execution ------------------------------------------------------------

    /// Run one tick of every due system, in execution order.
    pub fn run_systems(
        &mut self,
        components: &mut ComponentManager,
        entities: &mut EntityManager,
    ) -> Result<(), EcsError> {
        for id in &self.execution_order {
            let Some(slot) = self.slots.get_mut(id) else {
                continue;
            };
            if slot.is_child {
                continue;
            }
            if slot.cycles_since_execution >= slot.interval {
                tracing::trace!(system = %slot.name, "running system");
                let mut ctx = SystemContext::new(&mut *components, &mut *entities, *id);
                slot.system.setup_system(&mut ctx)?;
                slot.system.execute_system(&mut ctx)?;
                slot.system.cleanup_system(&mut ctx)?;
                slot.cycles_since_execution = 0;
            } else {
                slot.cycles_since_execution += 1;
            }
        }
        Ok(())
    }
}

impl Default for SystemManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemManager")
            .field(
                "systems",
                &self
                    .slots
                    .iter()
                    .map(|(id, slot)| (*id, slot.name.as_str()))
                    .collect::<Vec<_>>(),
            )
            .field("execution_order", &self.execution_order)
            .finish()
    }
}
