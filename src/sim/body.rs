//! Rigid body types for the physics world
//!
//! The table is a handful of static and kinematic shapes plus one dynamic
//! sphere (the ball). Kinematic bodies are posed by controllers every tick
//! and carry the velocity the controller assigns, which the contact solver
//! uses for momentum transfer.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable body handle (index order = iteration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// How a body moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves
    Static,
    /// Posed explicitly by game logic; infinite mass in contacts
    Kinematic,
    /// Integrated under gravity; the only kind that gets pushed
    Dynamic,
    /// Overlap-only volume; reports contacts, never obstructs
    Sensor,
}

/// Identity tag checked by hit handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyTag {
    Ball,
    Floor,
    Wall,
    Bumper,
    Slingshot,
    Boss,
    WarpGate,
    Flipper,
    Plunger,
}

/// Collision geometry (all in body-local space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Oriented box given by half extents
    Cuboid { half_extents: Vec3 },
    /// Upright (Y axis) cylinder
    Cylinder { radius: f32, half_height: f32 },
    /// Infinite plane through the body origin with an upward (+Y) normal
    Floor,
}

/// Per-body surface override; `None` falls back to the world contact material
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub friction: Option<f32>,
    pub restitution: Option<f32>,
}

impl Material {
    pub fn bouncy(restitution: f32) -> Self {
        Self {
            friction: None,
            restitution: Some(restitution),
        }
    }
}

/// A simulated body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub tag: BodyTag,
    pub shape: Shape,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub material: Material,
}

impl Body {
    pub fn new(id: BodyId, kind: BodyKind, tag: BodyTag, shape: Shape, position: Vec3) -> Self {
        Self {
            id,
            kind,
            tag,
            shape,
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            material: Material::default(),
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.rotation = Quat::from_rotation_y(yaw);
        self
    }

    /// Velocity of the body's surface at world point `p`
    #[inline]
    pub fn point_velocity(&self, p: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(p - self.position)
    }

    #[inline]
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        self.rotation.inverse() * (p - self.position)
    }

    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Bodies that can push the ball
    pub fn is_solid(&self) -> bool {
        !matches!(self.kind, BodyKind::Sensor | BodyKind::Dynamic)
    }
}
