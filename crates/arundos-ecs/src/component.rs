//! Component storages and typed handles.
//!
//! The [`ComponentManager`](crate::component_manager::ComponentManager) owns
//! one boxed [`ComponentStorage`] per registered component and calls
//! [`ComponentStorage::remove_entity_data`] whenever an entity stops using the
//! component, so the storage can reset or release that entity's slot.
//! [`Component<T>`] is the standard dense storage; anything else that needs
//! custom per-entity cleanup implements the trait directly.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

use crate::constants::MAX_NUM_ENTITIES;
use crate::id::{ComponentId, EntityId};

// ---------------------------------------------------------------------------
// ComponentStorage
// ---------------------------------------------------------------------------

/// Upcast to `Any` so boxed storages can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Per-entity data of one component.
pub trait ComponentStorage: AsAny {
    /// Reset or release whatever the storage holds for `entity`.
    ///
    /// Called before the entity's bit for this component is cleared, both
    /// when the component is removed and when the entity is destroyed.
    fn remove_entity_data(&mut self, entity: EntityId);

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// The Rust type this storage holds data for, used to key
    /// [`ComponentTypeId`](crate::id::ComponentTypeId)s. Defaults to the
    /// storage's own type.
    fn component_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

// ---------------------------------------------------------------------------
// Component<T>
// ---------------------------------------------------------------------------

/// Dense storage with one `T` per entity id.
///
/// A slot only holds meaningful data while the entity's signature bit for
/// this component is set; otherwise it holds `T::default()`.
pub struct Component<T> {
    data: Vec<T>,
}

impl<T: Default> Component<T> {
    /// Create a storage with every slot defaulted.
    pub fn new() -> Self {
        Self {
            data: std::iter::repeat_with(T::default)
                .take(MAX_NUM_ENTITIES)
                .collect(),
        }
    }

    /// The slot for `entity`.
    #[inline]
    pub fn data(&self, entity: EntityId) -> &T {
        &self.data[entity.index()]
    }

    /// The slot for `entity`, mutably.
    #[inline]
    pub fn data_mut(&mut self, entity: EntityId) -> &mut T {
        &mut self.data[entity.index()]
    }

    /// Overwrite the slot for `entity`.
    #[inline]
    pub fn update_data(&mut self, entity: EntityId, value: T) {
        self.data[entity.index()] = value;
    }
}

impl<T: Default> Default for Component<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + 'static> ComponentStorage for Component<T> {
    fn remove_entity_data(&mut self, entity: EntityId) {
        self.data[entity.index()] = T::default();
    }

    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn component_type(&self) -> TypeId {
        TypeId::of::<T>()
    }
}

impl<T> fmt::Debug for Component<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type", &std::any::type_name::<T>())
            .field("slots", &self.data.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentHandle
// ---------------------------------------------------------------------------

/// Typed reference to a registered component, returned by
/// [`ComponentManager::register_component`](crate::component_manager::ComponentManager::register_component).
///
/// The handle remembers the storage type so data access needs no runtime
/// type argument. It becomes stale once the component is unregistered; stale
/// handles are rejected with [`EcsError::UnknownComponent`](crate::EcsError::UnknownComponent).
pub struct ComponentHandle<S> {
    id: ComponentId,
    storage: PhantomData<fn() -> S>,
}

impl<S> ComponentHandle<S> {
    pub(crate) fn new(id: ComponentId) -> Self {
        Self {
            id,
            storage: PhantomData,
        }
    }

    /// The component id, i.e. the component's bit in signatures.
    #[inline]
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

impl<S> Clone for ComponentHandle<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ComponentHandle<S> {}

impl<S> PartialEq for ComponentHandle<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for ComponentHandle<S> {}

impl<S> fmt::Debug for ComponentHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentHandle({})", self.id)
    }
}

impl<S> From<ComponentHandle<S>> for ComponentId {
    fn from(handle: ComponentHandle<S>) -> Self {
        handle.id
    }
}
