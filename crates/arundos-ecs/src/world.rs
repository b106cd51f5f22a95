//! The [`World`]: one component, entity and system manager wired together.
//!
//! Everything an application does with the ECS goes through a `World` value.
//! It owns the three managers and forwards to them, checking entity liveness
//! on the way so component calls on a destroyed id fail with
//! [`EcsError::DeadEntity`] instead of writing into a recycled slot.

use crate::component::{Component, ComponentHandle, ComponentStorage};
use crate::component_manager::ComponentManager;
use crate::entity_manager::EntityManager;
use crate::id::{ComponentId, EntityId, SystemId};
use crate::system_manager::{System, SystemManager};
use crate::EcsError;

/// Container of all ECS state.
#[derive(Debug, Default)]
pub struct World {
    components: ComponentManager,
    entities: EntityManager,
    systems: SystemManager,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentManager {
        &mut self.components
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    pub fn systems_mut(&mut self) -> &mut SystemManager {
        &mut self.systems
    }

    // -- components -----------------------------------------------------------

    /// Register a dense [`Component<T>`] storage.
    pub fn register_component<T: Default + 'static>(
        &mut self,
    ) -> Result<ComponentHandle<Component<T>>, EcsError> {
        self.components.register_component(Component::<T>::new())
    }

    /// Register a custom storage.
    pub fn register_storage<S: ComponentStorage>(
        &mut self,
        storage: S,
    ) -> Result<ComponentHandle<S>, EcsError> {
        self.components.register_component(storage)
    }

    /// Remove a component from every entity and system and return its storage.
    pub fn unregister_component<S: ComponentStorage>(
        &mut self,
        handle: ComponentHandle<S>,
    ) -> Result<S, EcsError> {
        self.components.unregister_component(handle)
    }

    /// Attach a component with its initial data to a living entity.
    pub fn require_component<T: Default + 'static>(
        &mut self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
        data: T,
    ) -> Result<(), EcsError> {
        self.entities.check_living(entity)?;
        self.components.require_component(handle, entity, data)
    }

    /// Replace a living entity's component data and notify matching systems.
    pub fn update_component<T: Default + 'static>(
        &mut self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
        data: T,
    ) -> Result<(), EcsError> {
        self.entities.check_living(entity)?;
        self.components.update_component(handle, entity, data)
    }

    /// Detach a component from a living entity. Returns whether it was
    /// attached.
    pub fn remove_component<S: ComponentStorage>(
        &mut self,
        handle: ComponentHandle<S>,
        entity: EntityId,
    ) -> Result<bool, EcsError> {
        self.entities.check_living(entity)?;
        self.components.remove_component(handle, entity)
    }

    pub fn component_data<T: Default + 'static>(
        &self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
    ) -> Option<&T> {
        self.components.component_data(handle, entity)
    }

    pub fn component_data_mut<T: Default + 'static>(
        &mut self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
    ) -> Option<&mut T> {
        self.components.component_data_mut(handle, entity)
    }

    // -- entities -------------------------------------------------------------

    /// Register a new, disabled entity.
    pub fn register_entity(&mut self) -> Result<EntityId, EcsError> {
        self.entities.register_entity()
    }

    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.entities.destroy_entity(&mut self.components, entity)
    }

    pub fn destroy_all_entities(&mut self) -> Result<(), EcsError> {
        self.entities.destroy_all_entities(&mut self.components)
    }

    pub fn enable_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.entities.enable_entity(&mut self.components, entity)
    }

    pub fn disable_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.entities.disable_entity(&mut self.components, entity)
    }

    pub fn is_entity_enabled(&self, entity: EntityId) -> bool {
        self.components.is_entity_enabled(entity)
    }

    // -- systems --------------------------------------------------------------

    /// Register a disabled system with no requirements or dependencies.
    pub fn register_system<S: System>(&mut self, system: S) -> Result<SystemId, EcsError> {
        self.systems
            .register_system(&mut self.components, Box::new(system))
    }

    /// Require `component` for `system`'s entities.
    pub fn system_requires_component<S>(
        &mut self,
        system: SystemId,
        component: ComponentHandle<S>,
    ) -> Result<(), EcsError> {
        self.components.require_by_system(component, system)
    }

    /// Stop requiring `component` for `system`'s entities.
    pub fn system_unrequires_component<S>(
        &mut self,
        system: SystemId,
        component: ComponentHandle<S>,
    ) -> Result<(), EcsError> {
        self.components.unrequire_by_system(component, system)
    }

    /// `system` must run after `predecessor`.
    pub fn set_system_dependency(
        &mut self,
        system: SystemId,
        predecessor: SystemId,
    ) -> Result<(), EcsError> {
        self.systems
            .set_system_dependency_signature(system, predecessor)
    }

    pub fn unset_system_dependency(
        &mut self,
        system: SystemId,
        predecessor: SystemId,
    ) -> Result<(), EcsError> {
        self.systems
            .unset_system_dependency_signature(system, predecessor)
    }

    pub fn enable_system(&mut self, system: SystemId) -> Result<(), EcsError> {
        self.systems.enable_system(system)
    }

    pub fn disable_system(&mut self, system: SystemId) -> Result<(), EcsError> {
        self.systems.disable_system(system)
    }

    /// Unregister `system` and hand it back.
    pub fn destroy_system(&mut self, system: SystemId) -> Result<Box<dyn System>, EcsError> {
        self.systems.destroy_system(&mut self.components, system)
    }

    pub fn set_system_interval(&mut self, system: SystemId, interval: u32) -> Result<(), EcsError> {
        self.systems.set_system_interval(system, interval)
    }

    pub fn set_child_system(&mut self, system: SystemId, is_child: bool) -> Result<(), EcsError> {
        self.systems.set_child_system(system, is_child)
    }

    pub fn is_system_enabled(&self, system: SystemId) -> bool {
        self.systems.is_enabled(system)
    }

    pub fn execution_order(&self) -> &[SystemId] {
        self.systems.execution_order()
    }

    /// Run one tick of every due system.
    pub fn run_systems(&mut self) -> Result<(), EcsError> {
        self.systems
            .run_systems(&mut self.components, &mut self.entities)
    }

    // -- per-system entity queries --------------------------------------------

    pub fn enabled_system_entities(&self, system: SystemId) -> Result<Vec<EntityId>, EcsError> {
        self.components.enabled_system_entities(system)
    }

    pub fn updated_system_entities(&self, system: SystemId) -> Result<Vec<EntityId>, EcsError> {
        self.components.updated_system_entities(system)
    }

    pub fn destroyed_system_entities(&self, system: SystemId) -> Result<&[EntityId], EcsError> {
        self.components.destroyed_system_entities(system)
    }

    pub fn clear_system_entity_update_signatures(
        &mut self,
        system: SystemId,
    ) -> Result<(), EcsError> {
        self.components.clear_system_entity_update_signatures(system)
    }

    pub fn clear_system_entity_destroyed_signatures(
        &mut self,
        system: SystemId,
    ) -> Result<(), EcsError> {
        self.components
            .clear_system_entity_destroyed_signatures(system)
    }

    pub fn entities_with_specified_components(
        &self,
        entities: &[EntityId],
        optional: &[ComponentId],
    ) -> Vec<EntityId> {
        self.components
            .entities_with_specified_components(entities, optional)
    }
}
