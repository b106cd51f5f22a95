//! Arundos ECS -- signature-based Entity Component System with a dependency
//! scheduler.
//!
//! Entities are bare ids. Each entity carries a fixed-width component
//! signature whose last bit is an enabled flag; each system carries a
//! signature of the components it requires, with the enabled flag always set.
//! An entity belongs to a system exactly when the masked equality
//! `system == entity & system` holds, so disabled entities never match.
//!
//! Systems declare which other systems must run before them. Enabling a
//! system rebuilds a topological execution order and rejects dependency
//! cycles; [`World::run_systems`] then walks that order once per tick.
//!
//! # Quick Start
//!
//! ```
//! use arundos_ecs::prelude::*;
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! struct Gravity;
//!
//! impl System for Gravity {
//!     fn execute_system(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
//!         let _falling = ctx.enabled_entities()?;
//!         Ok(())
//!     }
//! }
//!
//! let mut world = World::new();
//! let position = world.register_component::<Position>().unwrap();
//! let gravity = world.register_system(Gravity).unwrap();
//! world.system_requires_component(gravity, position).unwrap();
//! world.enable_system(gravity).unwrap();
//!
//! let entity = world.register_entity().unwrap();
//! world.require_component(position, entity, Position { x: 0.0, y: 10.0 }).unwrap();
//! world.enable_entity(entity).unwrap();
//!
//! assert_eq!(world.enabled_system_entities(gravity).unwrap(), vec![entity]);
//! world.run_systems().unwrap();
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod component_manager;
pub mod constants;
pub mod entity_manager;
pub mod id;
pub mod id_stack;
pub mod signature;
pub mod system_manager;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
///
/// All of them point at a configuration or ordering bug in the caller: a
/// capacity constant that is too small, a system used before registration or
/// a dependency graph that cannot be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// An id stack ran out of ids or was over-released.
    #[error(transparent)]
    IdStack(#[from] id_stack::IdStackError),

    /// The system id has no registered signature.
    #[error("system {system} is not registered")]
    UnregisteredSystem { system: id::SystemId },

    /// The entity id is not currently allocated.
    #[error("entity {entity} is not living")]
    DeadEntity { entity: id::EntityId },

    /// The component id has no storage, or holds a different storage type.
    #[error("component {component} is not registered with this storage type")]
    UnknownComponent { component: id::ComponentId },

    /// No execution order satisfies the declared dependencies.
    #[error("cyclic system dependency between '{first}' and '{second}'")]
    CyclicDependency { first: String, second: String },

    /// The system cannot be disabled or destroyed while `dependent` is
    /// enabled and depends on it.
    #[error("system '{system}' is still required by enabled system '{dependent}'")]
    DependentSystemStillEnabled { system: String, dependent: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentHandle, ComponentStorage};
    pub use crate::component_manager::ComponentManager;
    pub use crate::constants::{MAX_NUM_COMPONENTS, MAX_NUM_ENTITIES, MAX_NUM_SYSTEMS};
    pub use crate::entity_manager::EntityManager;
    pub use crate::id::{ComponentId, ComponentTypeId, EntityId, SystemId};
    pub use crate::signature::{ComponentSignature, DependencySignature, Signature};
    pub use crate::system_manager::{System, SystemContext, SystemManager};
    pub use crate::world::World;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
