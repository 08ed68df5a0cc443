//! The ball
//!
//! Single dynamic sphere. Draining past the bottom edge reports a loss once
//! and waits for the game to respawn it; falling through the floor is a
//! physics glitch and is repaired on the spot without costing a life.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::{BodyId, BodyKind, BodyTag, Shape};
use super::world::PhysicsWorld;
use crate::consts::{BALL_RADIUS, MIN_BALL_Y, OUT_OF_BOUNDS_Z};

/// What the bounds check found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallEvent {
    /// Drained off the table (counts against lives)
    Lost,
    /// Tunneled below the table and was put back (does not count)
    Recovered,
}

#[derive(Debug, Clone)]
pub struct Ball {
    body: BodyId,
    spawn: Vec3,
    /// Set on drain; cleared by respawn
    drained: bool,
}

impl Ball {
    /// Create the ball body at `spawn`
    pub fn spawn(world: &mut PhysicsWorld, spawn: Vec3) -> Self {
        let body = world.add_body(
            BodyKind::Dynamic,
            BodyTag::Ball,
            Shape::Sphere {
                radius: BALL_RADIUS,
            },
            spawn,
        );
        Self {
            body,
            spawn,
            drained: false,
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vec3 {
        world.body(self.body).map(|b| b.position).unwrap_or(self.spawn)
    }

    /// Put the ball back at its launch position, motionless
    ///
    /// Calling it repeatedly is harmless.
    pub fn respawn(&mut self, world: &mut PhysicsWorld) {
        world.reset_dynamic(self.body, self.spawn);
        self.drained = false;
    }

    /// Check the ball against the drain and floor limits after a step
    pub fn check_bounds(&mut self, world: &mut PhysicsWorld) -> Option<BallEvent> {
        let pos = self.position(world);

        if pos.y < MIN_BALL_Y && pos.z <= OUT_OF_BOUNDS_Z {
            log::warn!("Ball fell through the table at {:?}, recovering", pos);
            self.respawn(world);
            return Some(BallEvent::Recovered);
        }

        if pos.z > OUT_OF_BOUNDS_Z && !self.drained {
            self.drained = true;
            return Some(BallEvent::Lost);
        }

        None
    }
}
