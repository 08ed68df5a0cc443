//! Flipper controller
//!
//! Flippers are kinematic paddles, not hinged dynamic bodies. Each tick the
//! angle steps toward the target selected by the button (active when held,
//! rest when released) at a bounded rate, and the resulting pose and spin
//! are written straight onto the body. The ball picks up momentum from the
//! swept motion through normal kinematic contact resolution.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::body::BodyId;
use super::world::PhysicsWorld;
use crate::approach;
use crate::consts::FLIPPER_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperSide {
    Left,
    Right,
}

impl FlipperSide {
    /// Angle (yaw, radians) when released; tip down toward the drain
    pub fn rest_angle(&self) -> f32 {
        match self {
            FlipperSide::Left => -0.4,
            FlipperSide::Right => 0.4,
        }
    }

    /// Angle when held; tip swung up the table
    pub fn active_angle(&self) -> f32 {
        match self {
            FlipperSide::Left => 0.5,
            FlipperSide::Right => -0.5,
        }
    }

    /// Direction the paddle extends from its pivot along local X
    pub fn reach(&self) -> f32 {
        match self {
            FlipperSide::Left => 1.0,
            FlipperSide::Right => -1.0,
        }
    }
}

/// Transient per-flipper state, recomputed every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipperState {
    pub side: FlipperSide,
    pub is_pressed: bool,
    pub current_angle: f32,
}

impl FlipperState {
    pub fn at_rest(side: FlipperSide) -> Self {
        Self {
            side,
            is_pressed: false,
            current_angle: side.rest_angle(),
        }
    }

    pub fn target_angle(&self) -> f32 {
        if self.is_pressed {
            self.side.active_angle()
        } else {
            self.side.rest_angle()
        }
    }
}

/// Drives one flipper body
#[derive(Debug, Clone)]
pub struct FlipperController {
    pub state: FlipperState,
    body: BodyId,
    pivot: Vec3,
    /// rad/s toward the active angle
    active_speed: f32,
    /// rad/s back to rest
    rest_speed: f32,
    /// rad/s of the last update (for the contact solver)
    angular_velocity: f32,
}

impl FlipperController {
    pub fn new(
        side: FlipperSide,
        body: BodyId,
        pivot: Vec3,
        active_speed: f32,
        rest_speed: f32,
    ) -> Self {
        Self {
            state: FlipperState::at_rest(side),
            body,
            pivot,
            active_speed,
            rest_speed,
            angular_velocity: 0.0,
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Speed limit for the current target
    pub fn max_speed(&self) -> f32 {
        if self.state.is_pressed {
            self.active_speed
        } else {
            self.rest_speed
        }
    }

    /// Advance the angle one tick; returns the new angle
    pub fn update(&mut self, is_pressed: bool, dt: f32) -> f32 {
        self.state.is_pressed = is_pressed;
        let previous = self.state.current_angle;
        let next = approach(previous, self.state.target_angle(), self.max_speed() * dt);
        self.state.current_angle = next;
        self.angular_velocity = if dt > 0.0 { (next - previous) / dt } else { 0.0 };
        next
    }

    /// Write the current pose and spin onto the kinematic body
    pub fn apply(&self, world: &mut PhysicsWorld) {
        let rotation = Quat::from_rotation_y(self.state.current_angle);
        let arm = rotation * Vec3::new(self.state.side.reach() * FLIPPER_LENGTH / 2.0, 0.0, 0.0);
        let spin = Vec3::new(0.0, self.angular_velocity, 0.0);
        world.set_kinematic(self.body, self.pivot + arm, rotation, spin.cross(arm), spin);
    }

    /// Update from input and push the result into the world
    pub fn tick(&mut self, is_pressed: bool, dt: f32, world: &mut PhysicsWorld) {
        self.update(is_pressed, dt);
        self.apply(world);
    }

    /// Snap back to rest (new level / restart)
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.state = FlipperState::at_rest(self.state.side);
        self.angular_velocity = 0.0;
        self.apply(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use proptest::prelude::*;

    fn controller(side: FlipperSide) -> FlipperController {
        FlipperController::new(side, BodyId(0), Vec3::ZERO, 24.0, 10.0)
    }

    #[test]
    fn test_mirrored_targets() {
        assert_eq!(FlipperSide::Left.rest_angle(), -FlipperSide::Right.rest_angle());
        assert_eq!(FlipperSide::Left.active_angle(), -FlipperSide::Right.active_angle());
    }

    #[test]
    fn test_snaps_up_faster_than_falls_back() {
        let mut flipper = controller(FlipperSide::Left);
        let range = (FlipperSide::Left.active_angle() - FlipperSide::Left.rest_angle()).abs();

        let mut up_ticks = 0;
        while flipper.state.current_angle != FlipperSide::Left.active_angle() {
            flipper.update(true, SIM_DT);
            up_ticks += 1;
            assert!(up_ticks < 1000);
        }
        let mut down_ticks = 0;
        while flipper.state.current_angle != FlipperSide::Left.rest_angle() {
            flipper.update(false, SIM_DT);
            down_ticks += 1;
            assert!(down_ticks < 1000);
        }

        assert!(up_ticks < down_ticks);
        assert_eq!(up_ticks, (range / (24.0 * SIM_DT)).ceil() as i32);
    }

    #[test]
    fn test_angular_velocity_reports_sweep() {
        let mut flipper = controller(FlipperSide::Right);
        flipper.update(true, SIM_DT);
        // Right flipper swings toward negative yaw at full speed
        assert!((flipper.angular_velocity() + 24.0).abs() < 1e-3);

        // Holding at the target: no motion
        for _ in 0..60 {
            flipper.update(true, SIM_DT);
        }
        assert_eq!(flipper.angular_velocity(), 0.0);
    }

    #[test]
    fn test_apply_rotates_about_pivot() {
        let mut world = PhysicsWorld::new(Default::default(), 1, 50.0);
        let body = world.add_body(
            crate::sim::body::BodyKind::Kinematic,
            crate::sim::body::BodyTag::Flipper,
            crate::sim::body::Shape::Cuboid {
                half_extents: Vec3::new(0.9, 0.25, 0.15),
            },
            Vec3::ZERO,
        );
        let pivot = Vec3::new(-2.9, -0.25, 9.0);
        let mut flipper = FlipperController::new(FlipperSide::Left, body, pivot, 24.0, 10.0);
        flipper.tick(false, SIM_DT, &mut world);

        let pose = world.body(body).unwrap();
        // Center sits half a paddle from the pivot, tip angled toward the drain
        assert!(((pose.position - pivot).length() - FLIPPER_LENGTH / 2.0).abs() < 1e-5);
        assert!(pose.position.x > pivot.x);
        assert!(pose.position.z > pivot.z);
    }

    proptest! {
        #[test]
        fn prop_angle_approaches_monotonically(presses in proptest::collection::vec(any::<bool>(), 1..200)) {
            let mut flipper = controller(FlipperSide::Left);
            let lo = FlipperSide::Left.rest_angle();
            let hi = FlipperSide::Left.active_angle();

            for pressed in presses {
                let before = flipper.state.current_angle;
                let target = if pressed { hi } else { lo };
                let after = flipper.update(pressed, SIM_DT);

                // Never moves away from the target and never overshoots it
                prop_assert!((target - after).abs() <= (target - before).abs());
                prop_assert!(after >= lo && after <= hi);
                prop_assert!((after - before).abs() <= flipper.max_speed() * SIM_DT + 1e-6);
            }
        }
    }
}
