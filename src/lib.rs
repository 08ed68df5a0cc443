//! Void Cadet - a procedurally-varying pinball core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics world, table, controllers, game state)
//! - `level`: Level records, offline catalog, generator boundary, warp sequencing
//! - `settings`: Data-driven game balance
//! - `error`: Boundary error types

pub mod error;
pub mod level;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, GenerationError, PhysicsError};
pub use level::{Level, PhysicsModifiers};
pub use settings::{ArtifactStacking, Tuning};

/// Game configuration constants
pub mod consts {
    /// Simulation rate
    pub const SIM_HZ: f32 = 120.0;
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / SIM_HZ;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Collision passes per world step
    pub const WORLD_SUBSTEPS: u32 = 2;

    /// Table surface height; the ball rests on it
    pub const FLOOR_Y: f32 = -0.5;
    /// Half extents of the playfield (X across, Z down toward the player)
    pub const TABLE_HALF_WIDTH: f32 = 6.0;
    pub const TABLE_TOP_Z: f32 = -11.0;
    /// Past this Z the ball has drained off the table
    pub const OUT_OF_BOUNDS_Z: f32 = 12.0;
    /// Below this height the ball tunneled through the floor
    pub const MIN_BALL_Y: f32 = -5.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.3;

    /// Plunger lane runs along the right wall
    pub const LANE_X: f32 = 5.5;
    /// Plunger face at rest sits here
    pub const PLUNGER_REST_Z: f32 = 10.0;
    /// Ball waits in the lane just above the plunger
    pub const LAUNCH_Z: f32 = 9.2;

    /// Flipper geometry
    pub const FLIPPER_LENGTH: f32 = 1.8;
    pub const FLIPPER_WIDTH: f32 = 0.3;
    pub const FLIPPER_PIVOT_X: f32 = 2.9;
    pub const FLIPPER_PIVOT_Z: f32 = 9.0;
}

/// Ball spawn point in the plunger lane
#[inline]
pub fn launch_position() -> glam::Vec3 {
    glam::Vec3::new(
        consts::LANE_X,
        consts::FLOOR_Y + consts::BALL_RADIUS,
        consts::LAUNCH_Z,
    )
}

/// Move `current` toward `target` by at most `max_step` (never overshoots)
#[inline]
pub fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_step {
        // Land exactly; `current + delta` can round past the target
        target
    } else {
        current + max_step.copysign(delta)
    }
}
