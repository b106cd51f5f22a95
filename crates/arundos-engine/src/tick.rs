//! Fixed-timestep tick loop.
//!
//! The [`TickLoop`] drives an Arundos [`World`] forward. Each tick:
//!
//! 1. [`World::run_systems`] walks the execution order once; every due system
//!    runs its setup, execute and cleanup hooks.
//! 2. The tick counter advances, and with it the simulation time.
//!
//! A tick whose systems fail does not advance the counter.
//!
//! # Example
//!
//! ```
//! use arundos_engine::tick::{TickConfig, TickLoop};
//! use arundos_ecs::prelude::*;
//!
//! let world = World::new();
//! let config = TickConfig { fixed_dt: 1.0 / 30.0 };
//! let mut tick_loop = TickLoop::new(world, config);
//!
//! for _ in 0..10 {
//!     tick_loop.tick().unwrap();
//! }
//!
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert!((tick_loop.sim_time() - 10.0 / 30.0).abs() < 1e-12);
//! ```

use std::time::{Duration, Instant};

use arundos_ecs::world::World;
use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
///
/// The `fixed_dt` is the duration in seconds of each simulation tick. A value
/// of `1.0 / 60.0` gives 60 ticks per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick).
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl TickConfig {
    /// Parse a configuration from JSON, e.g. `{"fixed_dt": 0.02}`. Missing
    /// fields take their default.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that `fixed_dt` is positive and finite.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fixed_dt > 0.0 && self.fixed_dt.is_finite() {
            Ok(())
        } else {
            Err(EngineError::InvalidTimestep {
                fixed_dt: self.fixed_dt,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time spent in `run_systems`.
    pub total_time: Duration,
    /// Number of systems in the execution order when the tick ran.
    pub scheduled_systems: usize,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The fixed-timestep tick loop.
pub struct TickLoop {
    world: World,
    tick_counter: u64,
    fixed_dt: f64,
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a new tick loop with the given world and configuration.
    ///
    /// The tick counter starts at 0 and simulation time at 0.0.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite. Use
    /// [`TickConfig::validate`] first when the value comes from outside.
    pub fn new(world: World, config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        tracing::debug!(fixed_dt = config.fixed_dt, "tick loop created");
        Self {
            world,
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            last_diagnostics: TickDiagnostics::default(),
        }
    }

    /// Execute one simulation tick.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let tick_start = Instant::now();
        let scheduled_systems = self.world.execution_order().len();

        self.world.run_systems()?;
        self.tick_counter += 1;

        self.last_diagnostics = TickDiagnostics {
            total_time: tick_start.elapsed(),
            scheduled_systems,
        };
        tracing::trace!(
            tick = self.tick_counter,
            elapsed_us = self.last_diagnostics.total_time.as_micros() as u64,
            "tick complete"
        );
        Ok(())
    }

    /// Run `count` ticks in sequence, stopping at the first failure.
    ///
    /// Returns the number of ticks executed, which is `count` on success.
    pub fn run_ticks(&mut self, count: u64) -> Result<u64, EngineError> {
        for done in 0..count {
            if let Err(err) = self.tick() {
                tracing::warn!(completed = done, requested = count, error = %err, "tick failed");
                return Err(err);
            }
        }
        Ok(count)
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid floating-point drift from
    /// repeated addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Read-only access to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the ECS world, for setup between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Give the world back, ending the loop.
    pub fn into_world(self) -> World {
        self.world
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
