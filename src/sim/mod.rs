//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body ID)
//! - No rendering or platform dependencies

pub mod ball;
pub mod body;
pub mod collision;
pub mod flipper;
pub mod input;
pub mod plunger;
pub mod state;
pub mod table;
pub mod tick;
pub mod world;

pub use ball::{Ball, BallEvent};
pub use body::{Body, BodyId, BodyKind, BodyTag, Material, Shape};
pub use collision::{CollisionResult, resolve_velocity, sphere_body_collision};
pub use flipper::{FlipperController, FlipperSide, FlipperState};
pub use input::{Action, Control, ControlEvent, ControlState, InputMapper};
pub use plunger::{LAUNCH_AXIS, PlungerController, PlungerState};
pub use state::{FULL_CHARGE, GameEvent, GameState, GameStatus};
pub use table::{Table, TargetKind, WarpGate};
pub use tick::{FrameStepper, Game, TickInput, autopilot, ball_position, tick};
pub use world::{ContactEvent, PhysicsWorld, WorldConfig};
