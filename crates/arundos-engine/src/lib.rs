//! Arundos Engine -- fixed-step driver for the Arundos ECS.
//!
//! This crate builds on [`arundos_ecs`] and [`arundos_memory`] to provide the
//! simulation loop: a [`TickLoop`](tick::TickLoop) that owns a
//! [`World`](arundos_ecs::world::World), runs its systems once per tick in
//! dependency order and advances simulation time by a fixed step.
//!
//! # Quick Start
//!
//! ```
//! use arundos_engine::prelude::*;
//!
//! struct Heartbeat;
//!
//! impl System for Heartbeat {}
//!
//! let mut world = World::new();
//! let heartbeat = world.register_system(Heartbeat).unwrap();
//! world.enable_system(heartbeat).unwrap();
//!
//! let mut tick_loop = TickLoop::new(world, TickConfig::default());
//! tick_loop.run_ticks(100).unwrap();
//! assert_eq!(tick_loop.tick_count(), 100);
//! ```

#![deny(unsafe_code)]

pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use arundos_ecs;

/// Re-export the allocator crate for convenience.
pub use arundos_memory;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while configuring or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A system or manager call failed during a tick.
    #[error(transparent)]
    Ecs(#[from] arundos_ecs::EcsError),

    /// The tick configuration could not be parsed.
    #[error("invalid tick configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The configured time step is zero, negative or not finite.
    #[error("fixed_dt must be positive and finite, got {fixed_dt}")]
    InvalidTimestep { fixed_dt: f64 },
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Install a `tracing` formatter filtered by `RUST_LOG`, defaulting to `warn`.
///
/// Only the first call installs a subscriber; later calls, or calls after
/// another global subscriber was set, do nothing.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS and allocator preludes.
    pub use arundos_ecs::prelude::*;
    pub use arundos_memory::prelude::*;

    // Engine-specific exports.
    pub use crate::tick::{TickConfig, TickDiagnostics, TickLoop};
    pub use crate::{init_tracing, EngineError};
}
