//! Identifier newtypes for entities, components and systems.
//!
//! Entity, component and system ids are bounded by the capacities in
//! [`constants`](crate::constants). They are only created by the managers'
//! id stacks or by a checked [`TryFrom<u32>`] conversion, so an id in hand is
//! always a valid table index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_NUM_COMPONENTS, MAX_NUM_ENTITIES, MAX_NUM_SYSTEMS};

/// A raw value outside the range of an id type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} id {value} is out of range, the limit is {limit}")]
pub struct IdOutOfRange {
    pub kind: &'static str,
    pub value: u32,
    pub limit: usize,
}

macro_rules! bounded_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $limit:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u32", into = "u32")]
        pub struct $name(u32);

        impl $name {
            /// Exclusive upper bound of the id range.
            pub const LIMIT: usize = $limit;

            /// Table index of this id.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Wrap an index that the caller already knows is in range.
            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                debug_assert!(index < Self::LIMIT);
                Self(index as u32)
            }
        }

        impl TryFrom<u32> for $name {
            type Error = IdOutOfRange;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                if (value as usize) < Self::LIMIT {
                    Ok(Self(value))
                } else {
                    Err(IdOutOfRange {
                        kind: $kind,
                        value,
                        limit: Self::LIMIT,
                    })
                }
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

bounded_id!(
    /// Identifies an entity. All entity state lives in tables indexed by it.
    EntityId,
    "entity",
    MAX_NUM_ENTITIES
);

bounded_id!(
    /// Identifies a registered component, and its bit in signatures.
    ComponentId,
    "component",
    MAX_NUM_COMPONENTS
);

bounded_id!(
    /// Identifies a registered system, and its bit in dependency signatures.
    SystemId,
    "system",
    MAX_NUM_SYSTEMS
);

/// Process-lifetime identifier of a component's Rust type.
///
/// Assigned in first-use order by
/// [`ComponentManager::component_type_id`](crate::component_manager::ComponentManager::component_type_id)
/// and never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// The raw counter value.
    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}
