//! Plunger controller
//!
//! One linear degree of freedom along the launch axis. Holding the button
//! draws the plunger back slowly; releasing snaps it home fast. The body's
//! velocity is set to the per-tick displacement over `dt` so the contact
//! solver sees a moving surface: a kinematic body that only teleports would
//! barely nudge the ball.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::body::BodyId;
use super::world::PhysicsWorld;
use crate::approach;

/// Unit vector the ball is fired along (up the table)
pub const LAUNCH_AXIS: Vec3 = Vec3::NEG_Z;

/// Transient plunger state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlungerState {
    pub is_pressed: bool,
    /// Pull-back distance from rest (0 = rest, grows away from the launch direction)
    pub current_offset: f32,
}

#[derive(Debug, Clone)]
pub struct PlungerController {
    pub state: PlungerState,
    body: BodyId,
    rest_position: Vec3,
    pull_speed: f32,
    return_speed: f32,
    max_pull: f32,
    /// Signed speed along `LAUNCH_AXIS` from the last update
    launch_speed: f32,
}

impl PlungerController {
    pub fn new(
        body: BodyId,
        rest_position: Vec3,
        pull_speed: f32,
        return_speed: f32,
        max_pull: f32,
    ) -> Self {
        Self {
            state: PlungerState::default(),
            body,
            rest_position,
            pull_speed,
            return_speed,
            max_pull,
            launch_speed: 0.0,
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn max_pull(&self) -> f32 {
        self.max_pull
    }

    /// Speed along the launch axis; positive while firing
    pub fn launch_speed(&self) -> f32 {
        self.launch_speed
    }

    /// World velocity assigned to the body
    pub fn velocity(&self) -> Vec3 {
        LAUNCH_AXIS * self.launch_speed
    }

    /// Advance the offset one tick; returns the new offset
    pub fn update(&mut self, is_pressed: bool, dt: f32) -> f32 {
        self.state.is_pressed = is_pressed;
        let previous = self.state.current_offset;
        let next = if is_pressed {
            approach(previous, self.max_pull, self.pull_speed * dt)
        } else {
            approach(previous, 0.0, self.return_speed * dt)
        };
        self.state.current_offset = next;
        // Offset grows against the launch axis, so shrinking it fires the ball
        self.launch_speed = if dt > 0.0 { (previous - next) / dt } else { 0.0 };
        next
    }

    pub fn position(&self) -> Vec3 {
        self.rest_position - LAUNCH_AXIS * self.state.current_offset
    }

    pub fn apply(&self, world: &mut PhysicsWorld) {
        world.set_kinematic(
            self.body,
            self.position(),
            Quat::IDENTITY,
            self.velocity(),
            Vec3::ZERO,
        );
    }

    pub fn tick(&mut self, is_pressed: bool, dt: f32, world: &mut PhysicsWorld) {
        self.update(is_pressed, dt);
        self.apply(world);
    }

    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.state = PlungerState::default();
        self.launch_speed = 0.0;
        self.apply(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn plunger(return_speed: f32) -> PlungerController {
        PlungerController::new(BodyId(0), Vec3::new(5.5, -0.25, 10.25), 1.5, return_speed, 1.0)
    }

    fn hold_to_max(p: &mut PlungerController) {
        let mut ticks = 0;
        while p.state.current_offset < p.max_pull() {
            p.update(true, SIM_DT);
            ticks += 1;
            assert!(ticks < 10_000);
        }
    }

    #[test]
    fn test_pull_is_slow_and_bounded() {
        let mut p = plunger(16.0);
        p.update(true, SIM_DT);
        assert!((p.state.current_offset - 1.5 * SIM_DT).abs() < 1e-6);
        // Drawing back moves against the launch direction
        assert!(p.launch_speed() < 0.0);

        hold_to_max(&mut p);
        p.update(true, SIM_DT);
        assert_eq!(p.state.current_offset, 1.0);
        assert_eq!(p.launch_speed(), 0.0);
    }

    #[test]
    fn test_release_sets_launch_velocity() {
        let mut p = plunger(16.0);
        hold_to_max(&mut p);

        p.update(false, SIM_DT);
        assert!(p.launch_speed() > 0.0, "release must not be zero velocity");
        assert!((p.launch_speed() - 16.0).abs() < 1e-3);
        assert!((p.velocity() - Vec3::new(0.0, 0.0, -16.0)).length() < 1e-3);
    }

    #[test]
    fn test_release_velocity_scales_with_return_speed() {
        let mut slow = plunger(8.0);
        let mut fast = plunger(24.0);
        hold_to_max(&mut slow);
        hold_to_max(&mut fast);
        slow.update(false, SIM_DT);
        fast.update(false, SIM_DT);
        assert!((fast.launch_speed() / slow.launch_speed() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_returns_to_rest_and_stops() {
        let mut p = plunger(16.0);
        hold_to_max(&mut p);
        for _ in 0..30 {
            p.update(false, SIM_DT);
        }
        assert_eq!(p.state.current_offset, 0.0);
        assert_eq!(p.launch_speed(), 0.0);
        assert_eq!(p.position(), Vec3::new(5.5, -0.25, 10.25));
    }
}
