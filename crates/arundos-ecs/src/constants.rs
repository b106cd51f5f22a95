//! Build-time capacities of the ECS.
//!
//! Every table in the managers is sized from these values, and the signature
//! bitsets reserve one extra bit past them for the enabled flag.

/// Number of distinct component ids.
pub const MAX_NUM_COMPONENTS: usize = 32;

/// Number of entity ids.
pub const MAX_NUM_ENTITIES: usize = 16_000;

/// Number of system ids.
pub const MAX_NUM_SYSTEMS: usize = 32;
