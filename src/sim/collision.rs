//! Collision detection and response for the ball
//!
//! The ball is the only dynamic body, so the narrow phase is always
//! sphere-versus-something: oriented boxes (walls, flippers, plunger, boss),
//! upright cylinders (bumpers) and the floor plane.

use glam::Vec3;

use super::body::{Body, Shape};

/// Normal speeds below this never bounce (keeps resting contact quiet)
pub const BOUNCE_THRESHOLD: f32 = 0.5;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the sphere touches the shape (within slop)
    pub hit: bool,
    /// Closest point on the shape surface
    pub point: Vec3,
    /// Surface normal at contact, pointing from the shape toward the sphere
    pub normal: Vec3,
    /// Overlap depth; slightly negative when merely within slop
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            penetration: 0.0,
        }
    }

    fn contact(point: Vec3, normal: Vec3, penetration: f32, slop: f32) -> Self {
        Self {
            hit: penetration > -slop,
            point,
            normal,
            penetration,
        }
    }
}

/// Check a sphere against a body's shape
///
/// `slop` widens the hit test so that a ball resting on a surface keeps
/// reporting the same contact instead of flickering in and out.
pub fn sphere_body_collision(center: Vec3, radius: f32, body: &Body, slop: f32) -> CollisionResult {
    match body.shape {
        Shape::Floor => {
            let height = center.y - body.position.y;
            let point = Vec3::new(center.x, body.position.y, center.z);
            CollisionResult::contact(point, Vec3::Y, radius - height, slop)
        }
        Shape::Sphere { radius: other } => {
            let delta = center - body.position;
            let dist = delta.length();
            let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
            let point = body.position + normal * other;
            CollisionResult::contact(point, normal, radius + other - dist, slop)
        }
        Shape::Cuboid { half_extents } => sphere_cuboid(center, radius, body, half_extents, slop),
        Shape::Cylinder {
            radius: cyl_radius,
            half_height,
        } => sphere_cylinder(center, radius, body, cyl_radius, half_height, slop),
    }
}

fn sphere_cuboid(center: Vec3, radius: f32, body: &Body, he: Vec3, slop: f32) -> CollisionResult {
    let local = body.to_local(center);
    let closest = local.clamp(-he, he);
    let delta = local - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 1e-12 {
        let dist = dist_sq.sqrt();
        if dist > radius + slop {
            return CollisionResult::miss();
        }
        let normal = body.rotation * (delta / dist);
        return CollisionResult::contact(body.to_world(closest), normal, radius - dist, slop);
    }

    // Center is inside the box (tunneling); push out through the nearest face
    let gaps = he - local.abs();
    let (axis, gap) = if gaps.x <= gaps.y && gaps.x <= gaps.z {
        (Vec3::X * local.x.signum(), gaps.x)
    } else if gaps.y <= gaps.z {
        (Vec3::Y * local.y.signum(), gaps.y)
    } else {
        (Vec3::Z * local.z.signum(), gaps.z)
    };
    let face_point = local + axis * gap;
    CollisionResult::contact(
        body.to_world(face_point),
        body.rotation * axis,
        radius + gap,
        slop,
    )
}

fn sphere_cylinder(
    center: Vec3,
    radius: f32,
    body: &Body,
    cyl_radius: f32,
    half_height: f32,
    slop: f32,
) -> CollisionResult {
    let local = body.to_local(center);
    if local.y.abs() > half_height + radius + slop {
        return CollisionResult::miss();
    }

    let radial = Vec3::new(local.x, 0.0, local.z);
    let dist = radial.length();

    if local.y > half_height && dist < cyl_radius {
        // Resting on the cap
        let point = Vec3::new(local.x, half_height, local.z);
        return CollisionResult::contact(
            body.to_world(point),
            body.rotation * Vec3::Y,
            radius - (local.y - half_height),
            slop,
        );
    }

    let dir = if dist > 1e-6 { radial / dist } else { Vec3::X };
    let point = dir * cyl_radius + Vec3::new(0.0, local.y.clamp(-half_height, half_height), 0.0);
    CollisionResult::contact(
        body.to_world(point),
        body.rotation * dir,
        radius + cyl_radius - dist,
        slop,
    )
}

/// Impulse response of the ball against an infinitely massive surface
///
/// Works in the surface's frame: `surface_vel` is the velocity of the
/// contact point on the other body, so a moving flipper or plunger hands its
/// own speed to the ball. Friction removes at most `friction` times the
/// normal impulse from the tangential slip.
pub fn resolve_velocity(
    ball_vel: Vec3,
    surface_vel: Vec3,
    normal: Vec3,
    restitution: f32,
    friction: f32,
) -> Vec3 {
    let rel = ball_vel - surface_vel;
    let vn = rel.dot(normal);
    if vn >= 0.0 {
        // Already separating
        return ball_vel;
    }

    let e = if -vn < BOUNCE_THRESHOLD { 0.0 } else { restitution };
    let normal_impulse = -(1.0 + e) * vn;
    let mut rel = rel + normal * normal_impulse;

    let tangent = rel - normal * rel.dot(normal);
    let slip = tangent.length();
    if slip > 1e-6 {
        let max_friction = friction * normal_impulse;
        let removed = slip.min(max_friction);
        rel -= tangent / slip * removed;
    }

    rel + surface_vel
}
