//! Table objects and layout
//!
//! Builds the playfield into a [`PhysicsWorld`] and turns raw contact
//! events into game events. Hit handlers only emit events; they never touch
//! the game state directly.
//!
//! Layout coordinates: X across the table, Y up out of the floor, Z down the
//! table toward the player. The drain is past the flippers at +Z.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallEvent};
use super::body::{BodyId, BodyKind, BodyTag, Material, Shape};
use super::flipper::{FlipperController, FlipperSide};
use super::input::ControlState;
use super::plunger::PlungerController;
use super::state::GameEvent;
use super::world::{ContactEvent, PhysicsWorld, WorldConfig};
use crate::consts::*;
use crate::level::PhysicsModifiers;
use crate::settings::Tuning;

/// Wall height above the floor
const WALL_HEIGHT: f32 = 2.0;
const WALL_THICKNESS: f32 = 0.3;
const BUMPER_RADIUS: f32 = 0.5;
const BUMPER_RESTITUTION: f32 = 1.5;
const SLINGSHOT_RESTITUTION: f32 = 1.3;
const FLOOR_RESTITUTION: f32 = 0.2;

/// Boss sweeps side to side and slowly turns
const BOSS_ANCHOR: Vec3 = Vec3::new(0.0, FLOOR_Y + 0.5, -7.0);
const BOSS_AMPLITUDE: f32 = 2.0;
const BOSS_FREQUENCY: f32 = 0.8;
const BOSS_SPIN: f32 = 0.5;

/// Kinds of scoring/trigger objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Bumper,
    Slingshot,
    Boss,
}

/// A scoring body with its debounce bookkeeping
#[derive(Debug, Clone)]
pub struct Target {
    pub body: BodyId,
    pub kind: TargetKind,
    pub points: u32,
    last_hit_tick: Option<u64>,
}

impl Target {
    fn new(body: BodyId, kind: TargetKind, points: u32) -> Self {
        Self {
            body,
            kind,
            points,
            last_hit_tick: None,
        }
    }

    /// Register a hit unless one landed within the cool-down window
    pub fn on_hit(&mut self, now_tick: u64, cooldown_ticks: u64) -> Option<u32> {
        if let Some(last) = self.last_hit_tick {
            if now_tick.saturating_sub(last) < cooldown_ticks {
                return None;
            }
        }
        self.last_hit_tick = Some(now_tick);
        Some(self.points)
    }
}

/// The warp gate sensor
#[derive(Debug, Clone)]
pub struct WarpGate {
    pub body: BodyId,
    /// Mirrors `warp_ready`
    pub is_open: bool,
}

impl WarpGate {
    /// Fires only when open
    pub fn on_enter(&self) -> Option<GameEvent> {
        self.is_open.then_some(GameEvent::WarpRequest)
    }
}

/// Periodic boss motion (driven by elapsed time, not simulated)
#[derive(Debug, Clone, Copy)]
pub struct BossMotion {
    pub anchor: Vec3,
    pub amplitude: f32,
    pub frequency: f32,
    pub spin: f32,
}

impl BossMotion {
    pub fn position(&self, t: f32) -> Vec3 {
        self.anchor + Vec3::X * self.amplitude * (self.frequency * t).sin()
    }

    pub fn velocity(&self, t: f32) -> Vec3 {
        Vec3::X * self.amplitude * self.frequency * (self.frequency * t).cos()
    }

    pub fn rotation(&self, t: f32) -> Quat {
        Quat::from_rotation_y(self.spin * t)
    }
}

/// Center, yaw and half-length of a wall running from `a` to `b` (XZ plane)
pub fn segment_pose(a: Vec3, b: Vec3) -> (Vec3, f32, f32) {
    let d = b - a;
    let yaw = (-d.z).atan2(d.x);
    let half_len = Vec3::new(d.x, 0.0, d.z).length() / 2.0;
    ((a + b) / 2.0, yaw, half_len)
}

/// The whole playfield: world, ball, controllers and handlers
#[derive(Debug, Clone)]
pub struct Table {
    pub world: PhysicsWorld,
    pub ball: Ball,
    pub left_flipper: FlipperController,
    pub right_flipper: FlipperController,
    pub plunger: PlungerController,
    pub targets: Vec<Target>,
    pub gate: WarpGate,
    pub boss: BodyId,
    pub boss_motion: BossMotion,
    cooldown_ticks: u64,
}

impl Table {
    /// Build the standard layout under the given level physics
    pub fn new(tuning: &Tuning, physics: &PhysicsModifiers) -> Self {
        let config = match physics.validate() {
            Ok(()) => WorldConfig::from_modifiers(physics),
            Err(e) => {
                log::warn!("Level physics rejected ({}), using defaults", e);
                WorldConfig::default()
            }
        };
        let mut world = PhysicsWorld::new(config, WORLD_SUBSTEPS, tuning.max_ball_speed);

        let floor = world.add_body(
            BodyKind::Static,
            BodyTag::Floor,
            Shape::Floor,
            Vec3::new(0.0, FLOOR_Y, 0.0),
        );
        if let Some(body) = world.body_mut(floor) {
            body.material = Material::bouncy(FLOOR_RESTITUTION);
        }

        build_walls(&mut world);

        let mut targets = Vec::new();
        for (x, z) in [(0.0, -4.0), (-2.5, -2.0), (2.5, -2.0)] {
            let body = world.add_body(
                BodyKind::Static,
                BodyTag::Bumper,
                Shape::Cylinder {
                    radius: BUMPER_RADIUS,
                    half_height: 0.5,
                },
                Vec3::new(x, FLOOR_Y + 0.5, z),
            );
            if let Some(b) = world.body_mut(body) {
                b.material = Material::bouncy(BUMPER_RESTITUTION);
            }
            targets.push(Target::new(body, TargetKind::Bumper, tuning.bumper_points));
        }

        for side in [-1.0f32, 1.0] {
            let a = Vec3::new(4.2 * side, FLOOR_Y + WALL_HEIGHT / 2.0, 5.2);
            let b = Vec3::new(3.0 * side, FLOOR_Y + WALL_HEIGHT / 2.0, 7.4);
            let body = add_segment(&mut world, BodyTag::Slingshot, a, b);
            if let Some(s) = world.body_mut(body) {
                s.material = Material::bouncy(SLINGSHOT_RESTITUTION);
            }
            targets.push(Target::new(body, TargetKind::Slingshot, tuning.slingshot_points));
        }

        let boss_motion = BossMotion {
            anchor: BOSS_ANCHOR,
            amplitude: BOSS_AMPLITUDE,
            frequency: BOSS_FREQUENCY,
            spin: BOSS_SPIN,
        };
        let boss = world.add_body(
            BodyKind::Kinematic,
            BodyTag::Boss,
            Shape::Cuboid {
                half_extents: Vec3::new(0.6, 0.5, 0.2),
            },
            BOSS_ANCHOR,
        );
        targets.push(Target::new(boss, TargetKind::Boss, tuning.boss_points));

        let gate_body = world.add_body(
            BodyKind::Sensor,
            BodyTag::WarpGate,
            Shape::Cuboid {
                half_extents: Vec3::new(1.0, 0.5, 0.25),
            },
            Vec3::new(0.0, FLOOR_Y + 0.5, -9.8),
        );

        let flipper_shape = Shape::Cuboid {
            half_extents: Vec3::new(FLIPPER_LENGTH / 2.0, 0.25, FLIPPER_WIDTH / 2.0),
        };
        let flipper_y = FLOOR_Y + 0.25;
        let left_body = world.add_body(BodyKind::Kinematic, BodyTag::Flipper, flipper_shape, Vec3::ZERO);
        let right_body = world.add_body(BodyKind::Kinematic, BodyTag::Flipper, flipper_shape, Vec3::ZERO);
        let left_flipper = FlipperController::new(
            FlipperSide::Left,
            left_body,
            Vec3::new(-FLIPPER_PIVOT_X, flipper_y, FLIPPER_PIVOT_Z),
            tuning.flipper_active_speed,
            tuning.flipper_rest_speed,
        );
        let right_flipper = FlipperController::new(
            FlipperSide::Right,
            right_body,
            Vec3::new(FLIPPER_PIVOT_X, flipper_y, FLIPPER_PIVOT_Z),
            tuning.flipper_active_speed,
            tuning.flipper_rest_speed,
        );

        let plunger_body = world.add_body(
            BodyKind::Kinematic,
            BodyTag::Plunger,
            Shape::Cuboid {
                half_extents: Vec3::new(0.5, 0.25, 0.25),
            },
            Vec3::ZERO,
        );
        let plunger = PlungerController::new(
            plunger_body,
            Vec3::new(LANE_X, FLOOR_Y + 0.25, PLUNGER_REST_Z + 0.25),
            tuning.plunger_pull_speed,
            tuning.plunger_return_speed,
            tuning.plunger_max_pull,
        );

        let ball = Ball::spawn(&mut world, crate::launch_position());

        let mut table = Self {
            world,
            ball,
            left_flipper,
            right_flipper,
            plunger,
            targets,
            gate: WarpGate {
                body: gate_body,
                is_open: false,
            },
            boss,
            boss_motion,
            cooldown_ticks: Tuning::secs_to_ticks(tuning.hit_debounce_secs),
        };
        table.reset_controllers();
        table.pose_boss(0.0);
        table
    }

    /// Ticks a target ignores repeat hits for
    pub fn cooldown_ticks(&self) -> u64 {
        self.cooldown_ticks
    }

    /// Queue new level physics; takes effect at the next step
    pub fn configure(&mut self, physics: &PhysicsModifiers) -> Result<(), crate::error::PhysicsError> {
        physics.validate()?;
        self.world.configure(WorldConfig::from_modifiers(physics))
    }

    /// Flippers and plunger back to rest
    pub fn reset_controllers(&mut self) {
        self.left_flipper.reset(&mut self.world);
        self.right_flipper.reset(&mut self.world);
        self.plunger.reset(&mut self.world);
    }

    /// Pose the boss for elapsed play time `t`
    pub fn pose_boss(&mut self, t: f32) {
        let motion = self.boss_motion;
        self.world.set_kinematic(
            self.boss,
            motion.position(t),
            motion.rotation(t),
            motion.velocity(t),
            Vec3::new(0.0, motion.spin, 0.0),
        );
    }

    /// Translate one contact into a game event (ball contacts only)
    pub fn handle_contact(&mut self, contact: ContactEvent, now_tick: u64) -> Option<GameEvent> {
        let is_ball = self
            .world
            .body(contact.dynamic)
            .is_some_and(|b| b.tag == BodyTag::Ball);
        if !is_ball {
            return None;
        }

        if contact.other == self.gate.body {
            return self.gate.on_enter();
        }

        let cooldown = self.cooldown_ticks;
        let target = self.targets.iter_mut().find(|t| t.body == contact.other)?;
        let points = target.on_hit(now_tick, cooldown)?;
        log::debug!("{:?} hit for {}", target.kind, points);
        Some(GameEvent::Score {
            points,
            source: target.kind,
        })
    }

    /// One simulation tick of the table
    ///
    /// Order: controllers pose their bodies, the boss moves, the world steps,
    /// contacts become events in engine order, then the drain check runs.
    pub fn step(
        &mut self,
        controls: ControlState,
        time_secs: f32,
        now_tick: u64,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) {
        self.left_flipper.tick(controls.left, dt, &mut self.world);
        self.right_flipper.tick(controls.right, dt, &mut self.world);
        self.plunger.tick(controls.plunger, dt, &mut self.world);
        self.pose_boss(time_secs);

        self.world.step(dt);

        for contact in self.world.drain_events() {
            if let Some(event) = self.handle_contact(contact, now_tick) {
                events.push(event);
            }
        }

        if let Some(BallEvent::Lost) = self.ball.check_bounds(&mut self.world) {
            events.push(GameEvent::BallLost);
        }
    }
}

fn add_segment(world: &mut PhysicsWorld, tag: BodyTag, a: Vec3, b: Vec3) -> BodyId {
    let (center, yaw, half_len) = segment_pose(a, b);
    let id = world.add_body(
        BodyKind::Static,
        tag,
        Shape::Cuboid {
            half_extents: Vec3::new(half_len, WALL_HEIGHT / 2.0, WALL_THICKNESS / 2.0),
        },
        center,
    );
    if let Some(body) = world.body_mut(id) {
        body.rotation = Quat::from_rotation_y(yaw);
    }
    id
}

fn build_walls(world: &mut PhysicsWorld) {
    let y = FLOOR_Y + WALL_HEIGHT / 2.0;
    let w = TABLE_HALF_WIDTH;
    let top = TABLE_TOP_Z;
    let p = |x: f32, z: f32| Vec3::new(x, y, z);

    // Outer boundary (the bottom stays open: that's the drain)
    add_segment(world, BodyTag::Wall, p(-w, top), p(-w, OUT_OF_BOUNDS_Z - 1.0));
    add_segment(world, BodyTag::Wall, p(w, top), p(w, OUT_OF_BOUNDS_Z - 1.0));
    add_segment(world, BodyTag::Wall, p(-w, top), p(w, top));

    // Plunger lane and the deflector that kicks launches into play
    let lane_wall_x = LANE_X - 0.65;
    add_segment(world, BodyTag::Wall, p(lane_wall_x, -5.0), p(lane_wall_x, PLUNGER_REST_Z + 0.5));
    add_segment(world, BodyTag::Wall, p(w - 2.0, top), p(w, top + 2.0));

    // Funnels down to the flipper pivots
    add_segment(world, BodyTag::Wall, p(-w, 6.0), p(-FLIPPER_PIVOT_X, FLIPPER_PIVOT_Z));
    add_segment(world, BodyTag::Wall, p(lane_wall_x, 6.0), p(FLIPPER_PIVOT_X, FLIPPER_PIVOT_Z));
}
