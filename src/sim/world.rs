//! Physics world
//!
//! Owns every body, the shared gravity vector and the global contact
//! material. Stepping is synchronous and fixed-size; contact notifications
//! are edge-triggered (a pair reports once when it starts touching, not on
//! every tick it stays in contact).

use std::collections::BTreeSet;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, BodyKind, BodyTag, Shape};
use super::collision::{resolve_velocity, sphere_body_collision};
use crate::error::{PhysicsError, require_finite, require_range};
use crate::level::{MAX_RESTITUTION, PhysicsModifiers};

/// Contacts within this gap still count as touching
pub const CONTACT_SLOP: f32 = 0.01;

/// Simulation-wide parameters, replaced as a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub gravity: Vec3,
    pub friction: f32,
    pub restitution: f32,
}

impl WorldConfig {
    pub fn from_modifiers(physics: &PhysicsModifiers) -> Self {
        Self {
            gravity: physics.gravity(),
            friction: physics.friction,
            restitution: physics.restitution,
        }
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        require_finite("gravity.x", self.gravity.x)?;
        require_finite("gravity.y", self.gravity.y)?;
        require_finite("gravity.z", self.gravity.z)?;
        require_range("friction", self.friction, 0.0, 1.0)?;
        require_range("restitution", self.restitution, 0.0, MAX_RESTITUTION)?;
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::from_modifiers(&PhysicsModifiers::default())
    }
}

/// A pair started touching this tick; `dynamic` is the moving body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub dynamic: BodyId,
    pub other: BodyId,
}

/// The rigid-body simulation
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    /// Sorted by id (ids are allocated in push order)
    bodies: Vec<Body>,
    config: WorldConfig,
    /// Applied at the start of the next step, never mid-step
    pending: Option<WorldConfig>,
    active_contacts: BTreeSet<(BodyId, BodyId)>,
    events: Vec<ContactEvent>,
    substeps: u32,
    max_speed: f32,
}

impl PhysicsWorld {
    pub fn new(config: WorldConfig, substeps: u32, max_speed: f32) -> Self {
        Self {
            bodies: Vec::new(),
            config,
            pending: None,
            active_contacts: BTreeSet::new(),
            events: Vec::new(),
            substeps: substeps.max(1),
            max_speed,
        }
    }

    /// Queue a full replacement of gravity and the contact material
    ///
    /// Invalid parameters are rejected and the previous configuration stays
    /// in force. A valid one is observed by the next [`PhysicsWorld::step`].
    pub fn configure(&mut self, config: WorldConfig) -> Result<(), PhysicsError> {
        if let Err(err) = config.validate() {
            log::warn!("Rejected physics configuration: {}", err);
            return Err(err);
        }
        self.pending = Some(config);
        Ok(())
    }

    /// Configuration in force for the current/next step
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Configuration waiting for the next step, if any
    pub fn pending_config(&self) -> Option<&WorldConfig> {
        self.pending.as_ref()
    }

    pub fn add_body(&mut self, kind: BodyKind, tag: BodyTag, shape: Shape, position: Vec3) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(Body::new(id, kind, tag, shape, position));
        id
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0 as usize)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0 as usize)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Pose a kinematic body and record the velocity it moves with
    pub fn set_kinematic(
        &mut self,
        id: BodyId,
        position: Vec3,
        rotation: Quat,
        velocity: Vec3,
        angular_velocity: Vec3,
    ) {
        if let Some(body) = self.body_mut(id) {
            body.position = position;
            body.rotation = rotation;
            body.velocity = velocity;
            body.angular_velocity = angular_velocity;
        }
    }

    /// Teleport a dynamic body and zero its motion
    pub fn reset_dynamic(&mut self, id: BodyId, position: Vec3) {
        if let Some(body) = self.body_mut(id) {
            body.position = position;
            body.velocity = Vec3::ZERO;
            body.angular_velocity = Vec3::ZERO;
        }
    }

    /// Advance all dynamic bodies by `dt`
    pub fn step(&mut self, dt: f32) {
        if let Some(config) = self.pending.take() {
            self.config = config;
        }

        let h = dt / self.substeps as f32;
        let config = self.config;
        let mut touching = BTreeSet::new();

        for i in 0..self.bodies.len() {
            if self.bodies[i].kind != BodyKind::Dynamic {
                continue;
            }
            let Shape::Sphere { radius } = self.bodies[i].shape else {
                continue;
            };
            let id = self.bodies[i].id;
            let mut pos = self.bodies[i].position;
            let mut vel = self.bodies[i].velocity;
            let mut rolling_normal = None;

            for _ in 0..self.substeps {
                vel += config.gravity * h;
                vel = vel.clamp_length_max(self.max_speed);
                pos += vel * h;

                for other in &self.bodies {
                    if other.id == id || other.kind == BodyKind::Dynamic {
                        continue;
                    }
                    let contact = sphere_body_collision(pos, radius, other, CONTACT_SLOP);
                    if !contact.hit {
                        continue;
                    }
                    touching.insert((id, other.id));
                    if !other.is_solid() {
                        continue;
                    }

                    if contact.penetration > 0.0 {
                        pos += contact.normal * contact.penetration;
                    }
                    let restitution = other.material.restitution.unwrap_or(config.restitution);
                    let friction = other.material.friction.unwrap_or(config.friction);
                    vel = resolve_velocity(
                        vel,
                        other.point_velocity(contact.point),
                        contact.normal,
                        restitution,
                        friction,
                    );
                    if other.tag == BodyTag::Floor {
                        rolling_normal = Some(contact.normal);
                    }
                }
                vel = vel.clamp_length_max(self.max_speed);
            }

            let body = &mut self.bodies[i];
            body.position = pos;
            body.velocity = vel;
            body.angular_velocity = match rolling_normal {
                Some(n) => n.cross(vel) / radius,
                None => body.angular_velocity,
            };
        }

        for pair in &touching {
            if !self.active_contacts.contains(pair) {
                self.events.push(ContactEvent {
                    dynamic: pair.0,
                    other: pair.1,
                });
            }
        }
        self.active_contacts = touching;
    }

    /// Take the contact events produced since the last drain (stable order)
    pub fn drain_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether the pair is currently in contact
    pub fn in_contact(&self, a: BodyId, b: BodyId) -> bool {
        self.active_contacts.contains(&(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn world_with_floor() -> (PhysicsWorld, BodyId) {
        let mut world = PhysicsWorld::new(WorldConfig::default(), 2, 50.0);
        let floor = world.add_body(BodyKind::Static, BodyTag::Floor, Shape::Floor, Vec3::ZERO);
        (world, floor)
    }

    fn add_ball(world: &mut PhysicsWorld, position: Vec3) -> BodyId {
        world.add_body(
            BodyKind::Dynamic,
            BodyTag::Ball,
            Shape::Sphere { radius: 0.3 },
            position,
        )
    }

    #[test]
    fn test_ball_comes_to_rest_on_floor() {
        let (mut world, floor) = world_with_floor();
        world
            .configure(WorldConfig {
                gravity: Vec3::new(0.0, -10.0, 0.0),
                friction: 0.1,
                restitution: 0.5,
            })
            .unwrap();
        let ball = add_ball(&mut world, Vec3::new(0.0, 2.0, 0.0));

        for _ in 0..600 {
            world.step(SIM_DT);
        }

        let body = world.body(ball).unwrap();
        assert!((body.position.y - 0.3).abs() < 0.02, "y = {}", body.position.y);
        assert!(body.velocity.length() < 0.2);
        assert!(world.in_contact(ball, floor));
    }

    #[test]
    fn test_contact_events_are_edge_triggered() {
        let (mut world, floor) = world_with_floor();
        let ball = add_ball(&mut world, Vec3::new(0.0, 0.3, 0.0));

        world.step(SIM_DT);
        let first = world.drain_events();
        assert_eq!(
            first,
            vec![ContactEvent {
                dynamic: ball,
                other: floor
            }]
        );

        // Sustained contact produces nothing new
        for _ in 0..5 {
            world.step(SIM_DT);
            assert!(world.drain_events().is_empty());
        }
    }

    #[test]
    fn test_sensor_reports_but_does_not_obstruct() {
        let mut world = PhysicsWorld::new(
            WorldConfig {
                gravity: Vec3::ZERO,
                friction: 0.0,
                restitution: 0.5,
            },
            2,
            50.0,
        );
        let gate = world.add_body(
            BodyKind::Sensor,
            BodyTag::WarpGate,
            Shape::Cuboid {
                half_extents: Vec3::new(1.0, 0.5, 0.25),
            },
            Vec3::ZERO,
        );
        let ball = add_ball(&mut world, Vec3::new(0.0, 0.0, 1.0));
        world.body_mut(ball).unwrap().velocity = Vec3::new(0.0, 0.0, -6.0);

        let mut entered = 0;
        for _ in 0..120 {
            world.step(SIM_DT);
            entered += world
                .drain_events()
                .iter()
                .filter(|e| e.other == gate)
                .count();
        }

        assert_eq!(entered, 1);
        // Passed straight through at full speed
        let body = world.body(ball).unwrap();
        assert!(body.position.z < -1.0);
        assert!((body.velocity.z + 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_config_keeps_previous() {
        let (mut world, _) = world_with_floor();
        let before = *world.config();

        let bad = WorldConfig {
            gravity: Vec3::new(0.0, f32::NAN, 0.0),
            ..before
        };
        assert!(world.configure(bad).is_err());
        let bad = WorldConfig {
            friction: -0.5,
            ..before
        };
        assert!(world.configure(bad).is_err());

        world.step(SIM_DT);
        assert_eq!(*world.config(), before);
    }

    #[test]
    fn test_configure_applies_at_next_step() {
        let (mut world, _) = world_with_floor();
        let next = WorldConfig {
            gravity: Vec3::new(0.0, -20.0, 3.0),
            friction: 0.3,
            restitution: 1.1,
        };
        world.configure(next).unwrap();

        // Not torn into the running config until the step boundary
        assert_ne!(*world.config(), next);
        assert_eq!(world.pending_config(), Some(&next));

        world.step(SIM_DT);
        assert_eq!(*world.config(), next);
        assert!(world.pending_config().is_none());
    }

    #[test]
    fn test_kinematic_push_transfers_velocity() {
        let mut world = PhysicsWorld::new(
            WorldConfig {
                gravity: Vec3::ZERO,
                friction: 0.0,
                restitution: 0.0,
            },
            2,
            50.0,
        );
        let paddle = world.add_body(
            BodyKind::Kinematic,
            BodyTag::Plunger,
            Shape::Cuboid {
                half_extents: Vec3::new(0.5, 0.25, 0.25),
            },
            Vec3::new(0.0, 0.0, 0.56),
        );
        let ball = add_ball(&mut world, Vec3::ZERO);

        world.set_kinematic(
            paddle,
            Vec3::new(0.0, 0.0, 0.5),
            Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -12.0),
            Vec3::ZERO,
        );
        world.step(SIM_DT);

        let body = world.body(ball).unwrap();
        assert!(body.velocity.z <= -11.9, "vz = {}", body.velocity.z);
    }
}
