//! Entity id lifecycle.
//!
//! An entity is nothing but an [`EntityId`]. The [`EntityManager`] hands ids
//! out from an [`IdStack`] and tracks which ones are living; all other entity
//! state lives in the [`ComponentManager`], which every mutating call takes
//! explicitly.

use crate::component_manager::ComponentManager;
use crate::constants::MAX_NUM_ENTITIES;
use crate::id::EntityId;
use crate::id_stack::IdStack;
use crate::EcsError;

/// Allocates and recycles entity ids.
#[derive(Debug, Clone)]
pub struct EntityManager {
    ids: IdStack,
    living: Vec<bool>,
}

impl EntityManager {
    /// Create a manager with every id free.
    pub fn new() -> Self {
        Self {
            ids: IdStack::new("entity", MAX_NUM_ENTITIES),
            living: vec![false; MAX_NUM_ENTITIES],
        }
    }

    /// Allocate an id and mark it living.
    ///
    /// New entities start disabled: no system sees them until
    /// [`enable_entity`](Self::enable_entity) is called.
    pub fn register_entity(&mut self) -> Result<EntityId, EcsError> {
        let entity = EntityId::from_index(self.ids.allocate()?);
        self.living[entity.index()] = true;
        tracing::trace!(entity = %entity, "entity registered");
        Ok(entity)
    }

    /// Destroy a living entity: clear its component data and signature, then
    /// recycle the id.
    pub fn destroy_entity(
        &mut self,
        components: &mut ComponentManager,
        entity: EntityId,
    ) -> Result<(), EcsError> {
        self.check_living(entity)?;
        components.destroy_entity(entity);
        self.living[entity.index()] = false;
        self.ids.release(entity.index())?;
        tracing::debug!(entity = %entity, "entity destroyed");
        Ok(())
    }

    /// Destroy every living entity.
    pub fn destroy_all_entities(
        &mut self,
        components: &mut ComponentManager,
    ) -> Result<(), EcsError> {
        for entity in self.living_entities() {
            self.destroy_entity(components, entity)?;
        }
        Ok(())
    }

    /// Make a living entity eligible for systems.
    pub fn enable_entity(
        &self,
        components: &mut ComponentManager,
        entity: EntityId,
    ) -> Result<(), EcsError> {
        self.check_living(entity)?;
        components.enable_entity(entity);
        Ok(())
    }

    /// Make a living entity ineligible for systems.
    pub fn disable_entity(
        &self,
        components: &mut ComponentManager,
        entity: EntityId,
    ) -> Result<(), EcsError> {
        self.check_living(entity)?;
        components.disable_entity(entity);
        Ok(())
    }

    /// Whether `entity` is currently allocated.
    #[inline]
    pub fn is_living(&self, entity: EntityId) -> bool {
        self.living[entity.index()]
    }

    /// Number of living entities.
    pub fn living_count(&self) -> usize {
        self.ids.in_use()
    }

    /// Living entity ids in ascending order.
    pub fn living_entities(&self) -> Vec<EntityId> {
        self.living
            .iter()
            .enumerate()
            .filter(|(_, &living)| living)
            .map(|(index, _)| EntityId::from_index(index))
            .collect()
    }

    pub(crate) fn check_living(&self, entity: EntityId) -> Result<(), EcsError> {
        if self.is_living(entity) {
            Ok(())
        } else {
            Err(EcsError::DeadEntity { entity })
        }
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
