//! Signature bookkeeping for entities, components and systems.
//!
//! The [`ComponentManager`] owns:
//!
//! - one [`ComponentSignature`] per entity id (components used + enabled flag),
//! - one [`ComponentSignature`] per registered system (components required,
//!   enabled flag always set),
//! - per-system *update* and *destroyed* lists of entity ids, filled as
//!   entities change and emptied only when the system clears them,
//! - the component storages, the component id stack and the component type
//!   id registry.
//!
//! Every entity selection uses the same masked-equality test,
//! [`Signature::matches`], so a disabled entity never qualifies for a system.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use crate::component::{Component, ComponentHandle, ComponentStorage};
use crate::constants::{MAX_NUM_COMPONENTS, MAX_NUM_ENTITIES};
use crate::id::{ComponentId, ComponentTypeId, EntityId, SystemId};
use crate::id_stack::IdStack;
use crate::signature::ComponentSignature;
use crate::EcsError;

/// Per-system signature and notification lists.
#[derive(Debug, Default)]
struct SystemRecord {
    signature: ComponentSignature,
    updated: Vec<EntityId>,
    destroyed: Vec<EntityId>,
}

/// Owner of every signature table and component storage.
pub struct ComponentManager {
    component_ids: IdStack,
    storages: Vec<Option<Box<dyn ComponentStorage>>>,
    type_ids: HashMap<TypeId, ComponentTypeId>,
    next_type_id: u32,
    entity_signatures: Vec<ComponentSignature>,
    systems: BTreeMap<SystemId, SystemRecord>,
}

impl ComponentManager {
    /// Create a manager with every entity signature zeroed and no systems.
    pub fn new() -> Self {
        Self {
            component_ids: IdStack::new("component", MAX_NUM_COMPONENTS),
            storages: std::iter::repeat_with(|| None)
                .take(MAX_NUM_COMPONENTS)
                .collect(),
            type_ids: HashMap::new(),
            next_type_id: 0,
            entity_signatures: vec![ComponentSignature::new(); MAX_NUM_ENTITIES],
            systems: BTreeMap::new(),
        }
    }

    // -- component ids --------------------------------------------------------

    /// Take a component id without attaching a storage, e.g. for tag
    /// components that carry no data.
    pub fn allocate_component_id(&mut self) -> Result<ComponentId, EcsError> {
        let index = self.component_ids.allocate()?;
        Ok(ComponentId::from_index(index))
    }

    /// Give back an id from [`allocate_component_id`](Self::allocate_component_id).
    pub fn release_component_id(&mut self, component: ComponentId) -> Result<(), EcsError> {
        self.component_ids.release(component.index())?;
        Ok(())
    }

    /// Stable id for the component type `T`, assigned on first request.
    ///
    /// Registering a `Component<T>` uses the same id as `T`.
    pub fn component_type_id<T: 'static>(&mut self) -> ComponentTypeId {
        self.type_id_of(TypeId::of::<T>())
    }

    fn type_id_of(&mut self, type_id: TypeId) -> ComponentTypeId {
        let next = &mut self.next_type_id;
        *self.type_ids.entry(type_id).or_insert_with(|| {
            let id = ComponentTypeId(*next);
            *next += 1;
            id
        })
    }

    // -- component storages ---------------------------------------------------

    /// Register `storage` under a freshly allocated component id.
    pub fn register_component<S: ComponentStorage>(
        &mut self,
        storage: S,
    ) -> Result<ComponentHandle<S>, EcsError> {
        let id = self.allocate_component_id()?;
        let type_id = self.type_id_of(storage.component_type());
        tracing::debug!(
            component = %id,
            type_id = type_id.value(),
            name = storage.name(),
            "component registered"
        );
        self.storages[id.index()] = Some(Box::new(storage));
        Ok(ComponentHandle::new(id))
    }

    /// Remove a component entirely and hand its storage back.
    ///
    /// The component's bit is cleared from every entity and system signature
    /// and its id is released.
    pub fn unregister_component<S: ComponentStorage>(
        &mut self,
        handle: ComponentHandle<S>,
    ) -> Result<S, EcsError> {
        let component = handle.id();
        self.storage::<S>(handle)?;
        let boxed = self.storages[component.index()]
            .take()
            .ok_or(EcsError::UnknownComponent { component })?;
        let storage = boxed
            .into_any()
            .downcast::<S>()
            .map_err(|_| EcsError::UnknownComponent { component })?;

        for signature in &mut self.entity_signatures {
            signature.clear(component.index());
        }
        for record in self.systems.values_mut() {
            record.signature.clear(component.index());
        }
        self.release_component_id(component)?;
        tracing::debug!(component = %component, "component unregistered");
        Ok(*storage)
    }

    /// The storage behind `handle`.
    pub fn storage<S: ComponentStorage>(&self, handle: ComponentHandle<S>) -> Result<&S, EcsError> {
        let component = handle.id();
        self.storages[component.index()]
            .as_deref()
            .and_then(|storage| storage.as_any().downcast_ref::<S>())
            .ok_or(EcsError::UnknownComponent { component })
    }

    /// The storage behind `handle`, mutably.
    pub fn storage_mut<S: ComponentStorage>(
        &mut self,
        handle: ComponentHandle<S>,
    ) -> Result<&mut S, EcsError> {
        let component = handle.id();
        self.storages[component.index()]
            .as_deref_mut()
            .and_then(|storage| storage.as_any_mut().downcast_mut::<S>())
            .ok_or(EcsError::UnknownComponent { component })
    }

    // -- entity-side component use --------------------------------------------

    /// Start using a component for `entity`: store `data`, set the bit and
    /// notify matching systems.
    pub fn require_component<T: Default + 'static>(
        &mut self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
        data: T,
    ) -> Result<(), EcsError> {
        self.storage_mut(handle)?.update_data(entity, data);
        self.set_entity_component_signature(entity, handle.id());
        self.entity_component_updated(entity, handle.id());
        Ok(())
    }

    /// Overwrite `entity`'s data and notify matching systems.
    pub fn update_component<T: Default + 'static>(
        &mut self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
        data: T,
    ) -> Result<(), EcsError> {
        self.storage_mut(handle)?.update_data(entity, data);
        self.entity_component_updated(entity, handle.id());
        Ok(())
    }

    /// `entity`'s data, or `None` when the entity does not use the component
    /// or the handle is stale.
    pub fn component_data<T: Default + 'static>(
        &self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
    ) -> Option<&T> {
        if !self.is_component_used(entity, handle.id()) {
            return None;
        }
        self.storage(handle).ok().map(|storage| storage.data(entity))
    }

    /// Mutable access to `entity`'s data.
    ///
    /// Writing through this reference does not notify systems; call
    /// [`entity_component_updated`](Self::entity_component_updated) afterwards
    /// or use [`update_component`](Self::update_component).
    pub fn component_data_mut<T: Default + 'static>(
        &mut self,
        handle: ComponentHandle<Component<T>>,
        entity: EntityId,
    ) -> Option<&mut T> {
        if !self.is_component_used(entity, handle.id()) {
            return None;
        }
        self.storage_mut(handle)
            .ok()
            .map(|storage| storage.data_mut(entity))
    }

    /// Stop using a component for `entity`.
    ///
    /// The storage resets the entity's data first. Every system that
    /// currently sees the entity and requires this component then loses it:
    /// the entity leaves that system's update list and joins its destroyed
    /// list. Finally the bit is cleared. Returns `false` if the entity did
    /// not use the component.
    pub fn remove_component<S: ComponentStorage>(
        &mut self,
        handle: ComponentHandle<S>,
        entity: EntityId,
    ) -> Result<bool, EcsError> {
        let component = handle.id();
        self.storage(handle)?;
        if !self.is_component_used(entity, component) {
            return Ok(false);
        }
        self.storage_mut(handle)?.remove_entity_data(entity);

        let signature = self.entity_signatures[entity.index()];
        for record in self.systems.values_mut() {
            if record.signature.test(component.index()) && signature.matches(&record.signature) {
                record.updated.retain(|&updated| updated != entity);
                push_unique(&mut record.destroyed, entity);
            }
        }
        self.unset_entity_component_signature(entity, component);
        Ok(true)
    }

    // -- entity signatures ----------------------------------------------------

    /// Mark `entity` as using `component`.
    #[inline]
    pub fn set_entity_component_signature(&mut self, entity: EntityId, component: ComponentId) {
        self.entity_signatures[entity.index()].set(component.index());
    }

    /// Mark `entity` as no longer using `component`.
    #[inline]
    pub fn unset_entity_component_signature(&mut self, entity: EntityId, component: ComponentId) {
        self.entity_signatures[entity.index()].clear(component.index());
    }

    /// Make `entity` eligible for systems.
    ///
    /// Also drops `entity` from every destroyed list, so an id reused right
    /// after a destroy is not reported as destroyed to systems that have not
    /// consumed the old notification.
    pub fn enable_entity(&mut self, entity: EntityId) {
        self.entity_signatures[entity.index()].set_enabled(true);
        for record in self.systems.values_mut() {
            record.destroyed.retain(|&destroyed| destroyed != entity);
        }
    }

    /// Make `entity` ineligible for systems. Update and destroyed lists are
    /// left alone.
    pub fn disable_entity(&mut self, entity: EntityId) {
        self.entity_signatures[entity.index()].set_enabled(false);
    }

    /// Whether `entity`'s enabled flag is set.
    #[inline]
    pub fn is_entity_enabled(&self, entity: EntityId) -> bool {
        self.entity_signatures[entity.index()].is_enabled()
    }

    /// Record that `entity`'s data for `component` changed.
    ///
    /// The entity is appended, at most once, to the update list of every
    /// system that requires `component` and matches the entity.
    ///
    /// Matching treats the entity as enabled, so data written before
    /// [`enable_entity`](Self::enable_entity) is seen once the entity is
    /// enabled. [`updated_system_entities`](Self::updated_system_entities)
    /// hides disabled entities.
    pub fn entity_component_updated(&mut self, entity: EntityId, component: ComponentId) {
        let mut signature = self.entity_signatures[entity.index()];
        signature.set_enabled(true);
        for (system, record) in self.systems.iter_mut() {
            if record.signature.test(component.index())
                && signature.matches(&record.signature)
                && push_unique(&mut record.updated, entity)
            {
                tracing::trace!(entity = %entity, system = %system, "entity marked updated");
            }
        }
    }

    /// Whether `entity` uses `component`.
    #[inline]
    pub fn is_component_used(&self, entity: EntityId, component: ComponentId) -> bool {
        self.entity_signatures[entity.index()].test(component.index())
    }

    /// `entity`'s full signature.
    #[inline]
    pub fn component_signature(&self, entity: EntityId) -> &ComponentSignature {
        &self.entity_signatures[entity.index()]
    }

    /// Every entity using `component`, enabled or not.
    pub fn component_entities(&self, component: ComponentId) -> Vec<EntityId> {
        self.entity_signatures
            .iter()
            .enumerate()
            .filter(|(_, signature)| signature.test(component.index()))
            .map(|(index, _)| EntityId::from_index(index))
            .collect()
    }

    /// The entities in `entities` that use at least one of `optional`.
    pub fn entities_with_specified_components(
        &self,
        entities: &[EntityId],
        optional: &[ComponentId],
    ) -> Vec<EntityId> {
        entities
            .iter()
            .copied()
            .filter(|&entity| {
                optional
                    .iter()
                    .any(|&component| self.is_component_used(entity, component))
            })
            .collect()
    }

    /// Run every storage hook for `entity`, zero its signature and report it
    /// destroyed to every system.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        let signature = self.entity_signatures[entity.index()];
        for component in signature.members() {
            if let Some(storage) = self.storages[component].as_deref_mut() {
                storage.remove_entity_data(entity);
            }
        }
        self.entity_signatures[entity.index()].reset();

        for record in self.systems.values_mut() {
            record.updated.retain(|&updated| updated != entity);
            push_unique(&mut record.destroyed, entity);
        }
        tracing::trace!(entity = %entity, "entity signature reset");
    }

    // -- system signatures ----------------------------------------------------

    /// Give `system` an empty requirement signature with the enabled flag set,
    /// and empty notification lists.
    pub fn register_system(&mut self, system: SystemId) {
        let mut signature = ComponentSignature::new();
        signature.set_enabled(true);
        self.systems.insert(
            system,
            SystemRecord {
                signature,
                ..SystemRecord::default()
            },
        );
    }

    /// Forget `system`'s signature and lists.
    pub fn remove_system(&mut self, system: SystemId) {
        self.systems.remove(&system);
    }

    /// Whether `system` has a signature entry.
    pub fn is_system_registered(&self, system: SystemId) -> bool {
        self.systems.contains_key(&system)
    }

    fn record(&self, system: SystemId) -> Result<&SystemRecord, EcsError> {
        self.systems
            .get(&system)
            .ok_or(EcsError::UnregisteredSystem { system })
    }

    fn record_mut(&mut self, system: SystemId) -> Result<&mut SystemRecord, EcsError> {
        self.systems
            .get_mut(&system)
            .ok_or(EcsError::UnregisteredSystem { system })
    }

    /// Require `component` for `system`.
    pub fn set_system_component_signature(
        &mut self,
        system: SystemId,
        component: ComponentId,
    ) -> Result<(), EcsError> {
        self.record_mut(system)?.signature.set(component.index());
        Ok(())
    }

    /// Stop requiring `component` for `system`.
    pub fn unset_system_component_signature(
        &mut self,
        system: SystemId,
        component: ComponentId,
    ) -> Result<(), EcsError> {
        self.record_mut(system)?.signature.clear(component.index());
        Ok(())
    }

    /// Component-side spelling of
    /// [`set_system_component_signature`](Self::set_system_component_signature).
    pub fn require_by_system<S>(
        &mut self,
        handle: ComponentHandle<S>,
        system: SystemId,
    ) -> Result<(), EcsError> {
        self.set_system_component_signature(system, handle.id())
    }

    /// Component-side spelling of
    /// [`unset_system_component_signature`](Self::unset_system_component_signature).
    pub fn unrequire_by_system<S>(
        &mut self,
        handle: ComponentHandle<S>,
        system: SystemId,
    ) -> Result<(), EcsError> {
        self.unset_system_component_signature(system, handle.id())
    }

    /// `system`'s requirement signature.
    pub fn system_component_signature(
        &self,
        system: SystemId,
    ) -> Result<&ComponentSignature, EcsError> {
        Ok(&self.record(system)?.signature)
    }

    /// Every entity whose signature satisfies `system`'s requirements,
    /// enabled flag included.
    pub fn enabled_system_entities(&self, system: SystemId) -> Result<Vec<EntityId>, EcsError> {
        let wanted = self.record(system)?.signature;
        Ok(self
            .entity_signatures
            .iter()
            .enumerate()
            .filter(|(_, signature)| signature.matches(&wanted))
            .map(|(index, _)| EntityId::from_index(index))
            .collect())
    }

    /// Entities marked updated for `system` that are still enabled.
    pub fn updated_system_entities(&self, system: SystemId) -> Result<Vec<EntityId>, EcsError> {
        Ok(self
            .record(system)?
            .updated
            .iter()
            .copied()
            .filter(|&entity| self.is_entity_enabled(entity))
            .collect())
    }

    /// Entities reported destroyed to `system` since it last cleared the list.
    pub fn destroyed_system_entities(&self, system: SystemId) -> Result<&[EntityId], EcsError> {
        Ok(&self.record(system)?.destroyed)
    }

    /// Acknowledge `system`'s update list.
    pub fn clear_system_entity_update_signatures(
        &mut self,
        system: SystemId,
    ) -> Result<(), EcsError> {
        self.record_mut(system)?.updated.clear();
        Ok(())
    }

    /// Acknowledge `system`'s destroyed list.
    pub fn clear_system_entity_destroyed_signatures(
        &mut self,
        system: SystemId,
    ) -> Result<(), EcsError> {
        self.record_mut(system)?.destroyed.clear();
        Ok(())
    }
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentManager")
            .field("components", &self.component_ids.in_use())
            .field("systems", &self.systems.len())
            .finish()
    }
}

/// Append `entity` unless already present. Returns whether it was added.
fn push_unique(list: &mut Vec<EntityId>, entity: EntityId) -> bool {
    if list.contains(&entity) {
        false
    } else {
        list.push(entity);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    fn entity(index: u32) -> EntityId {
        EntityId::try_from(index).unwrap()
    }

    fn system(index: u32) -> SystemId {
        SystemId::try_from(index).unwrap()
    }

    struct Fixture {
        manager: ComponentManager,
        position: ComponentHandle<Component<Position>>,
        velocity: ComponentHandle<Component<Velocity>>,
    }

    fn fixture() -> Fixture {
        let mut manager = ComponentManager::new();
        let position = manager.register_component(Component::<Position>::new()).unwrap();
        let velocity = manager.register_component(Component::<Velocity>::new()).unwrap();
        Fixture {
            manager,
            position,
            velocity,
        }
    }

    // -- component ids --

    #[test]
    fn component_ids_come_from_the_stack() {
        let mut manager = ComponentManager::new();
        let first = manager.allocate_component_id().unwrap();
        let second = manager.allocate_component_id().unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        manager.release_component_id(first).unwrap();
        assert_eq!(manager.allocate_component_id().unwrap(), first);
    }

    #[test]
    fn component_ids_run_out_after_the_limit() {
        let mut manager = ComponentManager::new();
        for _ in 0..MAX_NUM_COMPONENTS {
            manager.allocate_component_id().unwrap();
        }
        assert!(matches!(
            manager.allocate_component_id(),
            Err(EcsError::IdStack(_))
        ));
    }

    #[test]
    fn type_ids_are_stable_and_monotonic() {
        let mut manager = ComponentManager::new();
        let a = manager.component_type_id::<Position>();
        let b = manager.component_type_id::<Velocity>();
        assert_eq!(manager.component_type_id::<Position>(), a);
        assert!(b > a);
    }

    #[test]
    fn registered_storage_shares_the_type_id_of_its_component() {
        let mut f = fixture();
        let position = f.manager.component_type_id::<Position>();
        let velocity = f.manager.component_type_id::<Velocity>();
        assert_eq!(position.value(), 0);
        assert_eq!(velocity.value(), 1);

        let again = f.manager.register_component(Component::<Position>::new()).unwrap();
        assert_ne!(again.id(), f.position.id());
        assert_eq!(f.manager.component_type_id::<Position>(), position);
    }

    // -- component data --

    #[test]
    fn require_stores_data_and_sets_the_bit() {
        let mut f = fixture();
        let e = entity(3);
        f.manager
            .require_component(f.position, e, Position { x: 1.0, y: 2.0 })
            .unwrap();
        assert!(f.manager.is_component_used(e, f.position.id()));
        assert_eq!(
            f.manager.component_data(f.position, e),
            Some(&Position { x: 1.0, y: 2.0 })
        );
        assert_eq!(f.manager.component_data(f.velocity, e), None);
    }

    #[test]
    fn remove_resets_data_and_moves_entity_to_destroyed() {
        let mut f = fixture();
        let s = system(0);
        f.manager.register_system(s);
        f.manager.require_by_system(f.position, s).unwrap();

        let e = entity(0);
        f.manager.enable_entity(e);
        f.manager
            .require_component(f.position, e, Position { x: 5.0, y: 5.0 })
            .unwrap();
        assert_eq!(f.manager.updated_system_entities(s).unwrap(), vec![e]);

        assert!(f.manager.remove_component(f.position, e).unwrap());
        assert!(!f.manager.is_component_used(e, f.position.id()));
        assert!(f.manager.updated_system_entities(s).unwrap().is_empty());
        assert_eq!(f.manager.destroyed_system_entities(s).unwrap(), &[e]);
        assert_eq!(
            f.manager.storage(f.position).unwrap().data(e),
            &Position::default()
        );
        assert!(!f.manager.remove_component(f.position, e).unwrap());
    }

    #[test]
    fn unregister_clears_bits_and_stales_the_handle() {
        let mut f = fixture();
        let s = system(1);
        f.manager.register_system(s);
        f.manager.require_by_system(f.velocity, s).unwrap();
        f.manager
            .require_component(f.velocity, entity(2), Velocity::default())
            .unwrap();

        let storage = f.manager.unregister_component(f.velocity).unwrap();
        assert_eq!(storage.data(entity(2)), &Velocity::default());
        assert!(!f.manager.is_component_used(entity(2), f.velocity.id()));
        assert!(!f
            .manager
            .system_component_signature(s)
            .unwrap()
            .test(f.velocity.id().index()));
        assert!(matches!(
            f.manager.storage(f.velocity),
            Err(EcsError::UnknownComponent { .. })
        ));
    }

    // -- enabled entities --

    #[test]
    fn enabled_entities_use_masked_equality() {
        let mut f = fixture();
        let s = system(0);
        f.manager.register_system(s);
        f.manager.require_by_system(f.position, s).unwrap();
        f.manager.require_by_system(f.velocity, s).unwrap();

        let both = entity(1);
        let position_only = entity(2);
        let disabled = entity(3);
        for e in [both, position_only, disabled] {
            f.manager
                .require_component(f.position, e, Position::default())
                .unwrap();
        }
        for e in [both, disabled] {
            f.manager
                .require_component(f.velocity, e, Velocity::default())
                .unwrap();
        }
        f.manager.enable_entity(both);
        f.manager.enable_entity(position_only);

        assert_eq!(f.manager.enabled_system_entities(s).unwrap(), vec![both]);
    }

    #[test]
    fn system_with_no_requirements_sees_all_enabled_entities() {
        let mut manager = ComponentManager::new();
        let s = system(0);
        manager.register_system(s);
        manager.enable_entity(entity(7));
        manager.enable_entity(entity(9));
        assert_eq!(
            manager.enabled_system_entities(s).unwrap(),
            vec![entity(7), entity(9)]
        );
    }

    #[test]
    fn unregistered_system_is_an_error() {
        let mut manager = ComponentManager::new();
        let component = manager.allocate_component_id().unwrap();
        assert!(matches!(
            manager.set_system_component_signature(system(4), component),
            Err(EcsError::UnregisteredSystem { .. })
        ));
        assert!(manager.enabled_system_entities(system(4)).is_err());
    }

    // -- update tracking --

    #[test]
    fn updates_are_recorded_once_and_only_for_matching_systems() {
        let mut f = fixture();
        let movers = system(0);
        let renderers = system(1);
        f.manager.register_system(movers);
        f.manager.register_system(renderers);
        f.manager.require_by_system(f.velocity, movers).unwrap();
        f.manager.require_by_system(f.position, renderers).unwrap();

        let e = entity(5);
        f.manager.enable_entity(e);
        f.manager
            .require_component(f.position, e, Position::default())
            .unwrap();
        f.manager
            .update_component(f.position, e, Position { x: 1.0, y: 0.0 })
            .unwrap();

        assert_eq!(f.manager.updated_system_entities(renderers).unwrap(), vec![e]);
        assert!(f.manager.updated_system_entities(movers).unwrap().is_empty());
    }

    #[test]
    fn data_written_before_enable_is_reported_once_enabled() {
        let mut f = fixture();
        let s = system(0);
        f.manager.register_system(s);
        f.manager.require_by_system(f.position, s).unwrap();

        let e = entity(4);
        f.manager
            .require_component(f.position, e, Position { x: 5.0, y: 0.0 })
            .unwrap();
        assert!(f.manager.updated_system_entities(s).unwrap().is_empty());

        f.manager.enable_entity(e);
        assert_eq!(f.manager.updated_system_entities(s).unwrap(), vec![e]);
    }

    #[test]
    fn updated_list_hides_disabled_entities() {
        let mut f = fixture();
        let s = system(0);
        f.manager.register_system(s);
        f.manager.require_by_system(f.position, s).unwrap();
        let e = entity(1);
        f.manager.enable_entity(e);
        f.manager
            .require_component(f.position, e, Position::default())
            .unwrap();
        f.manager.disable_entity(e);
        assert!(f.manager.updated_system_entities(s).unwrap().is_empty());
        f.manager.enable_entity(e);
        assert_eq!(f.manager.updated_system_entities(s).unwrap(), vec![e]);
    }

    #[test]
    fn clearing_lists_acknowledges_notifications() {
        let mut f = fixture();
        let s = system(0);
        f.manager.register_system(s);
        let e = entity(1);
        f.manager.enable_entity(e);
        f.manager.entity_component_updated(e, f.position.id());
        f.manager.destroy_entity(e);
        assert_eq!(f.manager.destroyed_system_entities(s).unwrap().len(), 1);
        f.manager.clear_system_entity_update_signatures(s).unwrap();
        f.manager.clear_system_entity_destroyed_signatures(s).unwrap();
        assert!(f.manager.destroyed_system_entities(s).unwrap().is_empty());
    }

    // -- destroy --

    #[test]
    fn destroy_resets_signature_and_storage() {
        let mut f = fixture();
        let s = system(0);
        f.manager.register_system(s);
        f.manager.require_by_system(f.position, s).unwrap();

        let e = entity(0);
        f.manager.enable_entity(e);
        f.manager
            .require_component(f.position, e, Position { x: 3.0, y: 4.0 })
            .unwrap();
        f.manager.destroy_entity(e);

        assert!(!f.manager.component_signature(e).any());
        assert_eq!(
            f.manager.storage(f.position).unwrap().data(e),
            &Position::default()
        );
        assert_eq!(f.manager.destroyed_system_entities(s).unwrap(), &[e]);
        assert!(f.manager.updated_system_entities(s).unwrap().is_empty());
    }

    #[test]
    fn enabling_a_reused_id_clears_stale_destroy_notices() {
        let mut f = fixture();
        let s = system(0);
        f.manager.register_system(s);
        let e = entity(0);
        f.manager.enable_entity(e);
        f.manager.destroy_entity(e);
        assert_eq!(f.manager.destroyed_system_entities(s).unwrap(), &[e]);

        f.manager.enable_entity(e);
        assert!(f.manager.destroyed_system_entities(s).unwrap().is_empty());
    }

    // -- queries --

    #[test]
    fn component_queries() {
        let mut f = fixture();
        let a = entity(1);
        let b = entity(2);
        let c = entity(3);
        f.manager
            .require_component(f.position, a, Position::default())
            .unwrap();
        f.manager
            .require_component(f.velocity, b, Velocity::default())
            .unwrap();

        assert_eq!(f.manager.component_entities(f.position.id()), vec![a]);
        assert_eq!(
            f.manager
                .entities_with_specified_components(&[a, b, c], &[f.position.id(), f.velocity.id()]),
            vec![a, b]
        );
        assert!(f
            .manager
            .entities_with_specified_components(&[a, b, c], &[])
            .is_empty());
    }

    #[test]
    fn remove_system_drops_its_record() {
        let mut manager = ComponentManager::new();
        let s = system(2);
        manager.register_system(s);
        assert!(manager.is_system_registered(s));
        manager.remove_system(s);
        assert!(!manager.is_system_registered(s));
    }
}
