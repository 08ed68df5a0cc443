//! Fixed timestep simulation tick
//!
//! Core game loop that advances the whole game deterministically. One call
//! to [`tick`] samples input once, drives the controllers, steps the world
//! (only while playing), drains the event queue into the state machine in
//! emission order, and then advances any in-flight level transition.

use glam::Vec3;

use super::input::ControlState;
use super::state::{GameEvent, GameState, GameStatus};
use super::table::Table;
use crate::consts::*;
use crate::level::{
    FallbackCatalog, Level, LevelGenerator, LevelRequest, LevelTransition, PendingReview,
    SummaryRequest,
};
use crate::settings::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Held state of the flippers and plunger
    pub controls: ControlState,
    /// Start from the menu / restart after game over (one-shot)
    pub start: bool,
    /// Demo mode - the game plays itself
    pub autopilot: bool,
}

/// The running game: state machine, table and the warp plumbing
pub struct Game {
    pub state: GameState,
    pub table: Table,
    catalog: FallbackCatalog,
    generator: Box<dyn LevelGenerator>,
    transition: Option<LevelTransition>,
    review: Option<PendingReview>,
    /// Events drained during the last tick (sound/FX cues)
    events: Vec<GameEvent>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Ticks spent in PLAYING (drives the boss)
    play_ticks: u64,
    min_transition_ticks: u64,
    pilot: Pilot,
}

/// Ball speed below which a ball in the flipper zone counts as cradled
const CRADLE_SPEED: f32 = 0.5;
/// Cradle time before the autopilot lets go (0.5 s)
const CRADLE_TICKS: u32 = 60;
/// Hands-off window that drops the ball onto the flipper for a shot
const SHOT_RELEASE_TICKS: u64 = 30;
/// Hands-off window long enough for the ball to drain
const DRAIN_RELEASE_TICKS: u64 = 180;
/// Short releases tried before the autopilot gives the ball up
const SHOT_ATTEMPTS: u32 = 2;

/// Demo-mode memory for breaking out of a cradled ball
#[derive(Debug, Clone, Copy, Default)]
struct Pilot {
    cradle_ticks: u32,
    release_until: u64,
    attempts: u32,
}

impl Pilot {
    fn releasing(&self, now: u64) -> bool {
        now < self.release_until
    }

    /// Count ticks the ball sits still by the flippers; let go once too long
    fn observe(&mut self, table: &Table, now: u64) {
        if self.releasing(now) {
            return;
        }
        let Some(ball) = table.world.body(table.ball.body()) else {
            return;
        };
        if !in_flipper_zone(ball.position) || ball.velocity.length() >= CRADLE_SPEED {
            self.cradle_ticks = 0;
            return;
        }

        self.cradle_ticks += 1;
        if self.cradle_ticks >= CRADLE_TICKS {
            let window = if self.attempts < SHOT_ATTEMPTS {
                SHOT_RELEASE_TICKS
            } else {
                DRAIN_RELEASE_TICKS
            };
            log::debug!("Autopilot releasing cradled ball for {} ticks", window);
            self.release_until = now + window;
            self.attempts += 1;
            self.cradle_ticks = 0;
        }
    }

    /// Something happened on the table; the next cradle starts fresh
    fn progressed(&mut self) {
        self.attempts = 0;
    }
}

fn in_lane(pos: Vec3) -> bool {
    pos.x > LANE_X - 0.6 && pos.z > 0.0
}

fn in_flipper_zone(pos: Vec3) -> bool {
    !in_lane(pos) && pos.z > FLIPPER_PIVOT_Z - 2.0 && pos.z < FLIPPER_PIVOT_Z + 0.5
}

impl Game {
    pub fn new(tuning: Tuning, generator: Box<dyn LevelGenerator>) -> Self {
        let state = GameState::new(tuning.clone());
        let table = Table::new(&tuning, &state.current_level.physics);
        Self {
            catalog: FallbackCatalog::new(tuning.catalog_seed),
            min_transition_ticks: Tuning::secs_to_ticks(tuning.min_transition_secs),
            state,
            table,
            generator,
            transition: None,
            review: None,
            events: Vec::new(),
            time_ticks: 0,
            play_ticks: 0,
            pilot: Pilot::default(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn transition(&self) -> Option<&LevelTransition> {
        self.transition.as_ref()
    }

    pub fn last_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Handle the start/restart action for the current status
    fn start(&mut self) {
        match self.state.status {
            GameStatus::Menu => {
                self.state.start();
            }
            GameStatus::GameOver => {
                if self.state.restart() {
                    let tuning = self.state.tuning().clone();
                    self.table = Table::new(&tuning, &self.state.current_level.physics);
                    self.transition = None;
                    self.review = None;
                    self.play_ticks = 0;
                    self.pilot = Pilot::default();
                }
            }
            GameStatus::Playing | GameStatus::Warping => {}
        }
    }

    fn begin_warp(&mut self) {
        let request = LevelRequest {
            previous_level_name: self.state.current_level.name.clone(),
            score: self.state.score,
            lives: self.state.lives,
            levels_visited: self.state.levels_visited,
        };
        self.transition = Some(LevelTransition::begin(
            self.generator.as_mut(),
            request,
            self.time_ticks,
            self.min_transition_ticks,
        ));
    }

    fn begin_review(&mut self) {
        let request = SummaryRequest {
            score: self.state.score,
            levels_visited: self.state.levels_visited,
        };
        self.review = Some(PendingReview::begin(self.generator.as_mut(), request));
    }

    /// New physics first, then the state, then a fresh ball
    fn arrive(&mut self, level: Level) {
        if let Err(e) = self.table.configure(&level.physics) {
            log::warn!("Keeping previous physics for {}: {}", level.name, e);
        }
        if self.state.apply_level(level) {
            self.table.ball.respawn(&mut self.table.world);
            self.table.reset_controllers();
        }
    }

    /// Feed the tick's events to the state machine in emission order
    fn dispatch(&mut self) {
        for event in self.events.clone() {
            if !self.state.handle(event) {
                continue;
            }
            match event {
                GameEvent::BallLost => match self.state.status {
                    GameStatus::Playing => self.table.ball.respawn(&mut self.table.world),
                    GameStatus::GameOver => self.begin_review(),
                    _ => {}
                },
                GameEvent::WarpRequest => self.begin_warp(),
                GameEvent::Score { .. } => {}
            }
        }
        self.table.gate.is_open = self.state.warp_ready;
    }
}

/// Demo-mode controls: launch from the lane, flip when the ball is close
pub fn autopilot(game: &Game) -> ControlState {
    let table = &game.table;
    let Some(ball) = table.world.body(table.ball.body()) else {
        return ControlState::default();
    };
    let pos = ball.position;

    let lane = in_lane(pos);
    let plunger = &table.plunger.state;
    let at_full_pull = plunger.is_pressed && plunger.current_offset >= table.plunger.max_pull();
    let resting = ball.velocity.length() < 1.0;

    // Hands off while a cradled ball rolls down the flipper
    let near_flippers = in_flipper_zone(pos)
        && ball.velocity.z > -1.0
        && !game.pilot.releasing(game.time_ticks);
    // Alternate which side leads so demo play doesn't settle into a loop
    let bias = ((game.time_ticks as f32 * 0.01).sin() * 0.3).clamp(-0.3, 0.3);

    ControlState {
        left: near_flippers && pos.x <= 0.3 + bias,
        right: near_flippers && pos.x >= -0.3 + bias,
        // Keep drawing back once started; release at full pull
        plunger: lane && (plunger.is_pressed || resting) && !at_full_pull,
    }
}

/// Advance the game by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput, dt: f32) {
    game.time_ticks += 1;
    game.events.clear();

    let start = input.start || (input.autopilot && game.state.status == GameStatus::Menu);
    if start {
        game.start();
    }

    let controls = if input.autopilot {
        if game.state.status == GameStatus::Playing {
            game.pilot.observe(&game.table, game.time_ticks);
        }
        autopilot(game)
    } else {
        input.controls
    };

    match game.state.status {
        GameStatus::Playing => {
            game.play_ticks += 1;
            let time_secs = game.play_ticks as f32 * dt;
            let now = game.time_ticks;
            let mut events = std::mem::take(&mut game.events);
            game.table.step(controls, time_secs, now, dt, &mut events);
            game.events = events;
            game.dispatch();
            if !game.events.is_empty() {
                game.pilot.progressed();
            }
        }
        GameStatus::Warping => {
            let now = game.time_ticks;
            let arrived = match game.transition.as_mut() {
                Some(transition) => transition.poll(now, &mut game.catalog),
                None => {
                    // Nothing in flight; never leave the machine stuck
                    log::warn!("Warping without a transition, using offline catalog");
                    Some(game.catalog.pick(&game.state.current_level.name))
                }
            };
            if let Some(level) = arrived {
                game.transition = None;
                game.arrive(level);
                game.table.gate.is_open = game.state.warp_ready;
            }
        }
        GameStatus::GameOver => {
            if let Some(review) = game.review.as_ref() {
                if let Some(text) = review.poll() {
                    log::info!("Performance review: {}", text);
                    game.state.performance_review = Some(text);
                    game.review = None;
                }
            }
        }
        GameStatus::Menu => {}
    }
}

/// Fixed-step driver for a real-time host
///
/// Accumulates frame time and runs whole ticks. A start press is held until
/// a tick has consumed it, so frames that run no tick don't lose it.
#[derive(Debug, Clone, Default)]
pub struct FrameStepper {
    accumulator: f32,
    pending_start: bool,
}

impl FrameStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_start(&mut self) {
        self.pending_start = true;
    }

    pub fn has_pending_start(&self) -> bool {
        self.pending_start
    }

    /// Run the ticks owed for `frame_dt` seconds; returns how many ran
    pub fn advance(
        &mut self,
        game: &mut Game,
        controls: ControlState,
        autopilot: bool,
        frame_dt: f32,
    ) -> u32 {
        self.accumulator += frame_dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = TickInput {
                controls,
                start: self.pending_start,
                autopilot,
            };
            tick(game, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.pending_start = false;
        }
        if substeps == MAX_SUBSTEPS {
            // Too far behind; drop the backlog instead of spiralling
            self.accumulator = 0.0;
        }
        substeps
    }
}

/// Ball position helper for presentation/tests
pub fn ball_position(game: &Game) -> Vec3 {
    game.table.ball.position(&game.table.world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::OfflineGenerator;
    use crate::sim::table::TargetKind;

    fn new_game() -> Game {
        Game::new(Tuning::default(), Box::new(OfflineGenerator))
    }

    fn run(game: &mut Game, input: TickInput, ticks: u32) {
        for _ in 0..ticks {
            tick(game, &input, SIM_DT);
        }
    }

    fn start(game: &mut Game) {
        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(game, &input, SIM_DT);
        assert_eq!(game.state.status, GameStatus::Playing);
    }

    fn drain_ball(game: &mut Game) {
        let body = game.table.ball.body();
        if let Some(ball) = game.table.world.body_mut(body) {
            ball.position = Vec3::new(0.0, FLOOR_Y + BALL_RADIUS, OUT_OF_BOUNDS_Z + 0.5);
            ball.velocity = Vec3::new(0.0, 0.0, 5.0);
        }
    }

    #[test]
    fn test_menu_does_not_simulate() {
        let mut game = new_game();
        let before = ball_position(&game);
        run(&mut game, TickInput::default(), 60);
        assert_eq!(game.state.status, GameStatus::Menu);
        assert_eq!(ball_position(&game), before);
    }

    #[test]
    fn test_drain_costs_a_life_and_respawns() {
        let mut game = new_game();
        start(&mut game);
        drain_ball(&mut game);
        tick(&mut game, &TickInput::default(), SIM_DT);

        assert_eq!(game.last_events(), &[GameEvent::BallLost]);
        assert_eq!(game.state.lives, 2);
        assert_eq!(ball_position(&game), crate::launch_position());
    }

    #[test]
    fn test_game_over_requests_review() {
        let mut game = new_game();
        start(&mut game);
        game.state.lives = 0;
        drain_ball(&mut game);
        tick(&mut game, &TickInput::default(), SIM_DT);
        assert_eq!(game.state.status, GameStatus::GameOver);

        tick(&mut game, &TickInput::default(), SIM_DT);
        assert_eq!(
            game.state.performance_review.as_deref(),
            Some(crate::level::MISSION_LOG_PLACEHOLDER)
        );

        // Restart goes straight back to play with a fresh run
        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);
        assert_eq!(game.state.status, GameStatus::Playing);
        assert_eq!(game.state.lives, 3);
        assert!(game.state.performance_review.is_none());
    }

    #[test]
    fn test_gate_entry_precedes_same_tick_drain() {
        let mut game = new_game();
        start(&mut game);
        game.state.on_score(5000);
        assert!(game.state.warp_ready);

        // Both land in one tick; table emits contacts before the drain check
        game.events = vec![GameEvent::WarpRequest, GameEvent::BallLost];
        game.dispatch();
        assert_eq!(game.state.status, GameStatus::Warping);
        assert_eq!(game.state.lives, 3);
        assert!(game.transition().is_some());
    }

    #[test]
    fn test_warp_completes_with_fallback_after_minimum() {
        let mut game = new_game();
        start(&mut game);
        game.state.on_score(5000);
        game.events = vec![GameEvent::WarpRequest];
        game.dispatch();
        let warp_tick = game.time_ticks;

        let min_ticks = Tuning::secs_to_ticks(Tuning::default().min_transition_secs);
        while game.state.status == GameStatus::Warping {
            tick(&mut game, &TickInput::default(), SIM_DT);
            assert!(game.time_ticks - warp_tick <= min_ticks + 1);
        }

        assert!(game.time_ticks - warp_tick >= min_ticks);
        assert_eq!(game.state.status, GameStatus::Playing);
        // Catalog levels may carry an artifact; the head-start covers a boost
        assert_eq!(game.state.warp_charge, game.state.warp_head_start());
        assert!(game.state.lives >= 4);
        assert_eq!(game.state.levels_visited, 1);
        assert_ne!(game.state.current_level.name, "Home Base");
        assert!(!game.table.gate.is_open);
    }

    #[test]
    fn test_score_events_reach_state() {
        let mut game = new_game();
        start(&mut game);
        game.events = vec![
            GameEvent::Score {
                points: 100,
                source: TargetKind::Bumper,
            };
            3
        ];
        game.dispatch();
        assert_eq!(game.state.score, 300);
    }

    #[test]
    fn test_autopilot_launches_ball() {
        let mut game = new_game();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let mut highest = f32::MAX;
        for _ in 0..600 {
            tick(&mut game, &input, SIM_DT);
            highest = highest.min(ball_position(&game).z);
        }
        assert_ne!(game.state.status, GameStatus::Menu);
        // The ball made it up past the middle of the table
        assert!(highest < 0.0, "highest z = {}", highest);
    }

    #[test]
    fn test_start_survives_frame_without_tick() {
        let mut game = new_game();
        let mut stepper = FrameStepper::new();
        stepper.press_start();

        // A 144 Hz frame is shorter than one tick
        let frame = 1.0 / 144.0;
        assert_eq!(stepper.advance(&mut game, ControlState::default(), false, frame), 0);
        assert_eq!(game.state.status, GameStatus::Menu);
        assert!(stepper.has_pending_start());

        assert_eq!(stepper.advance(&mut game, ControlState::default(), false, frame), 1);
        assert_eq!(game.state.status, GameStatus::Playing);
        assert!(!stepper.has_pending_start());
    }

    #[test]
    fn test_stepper_drops_backlog() {
        let mut game = new_game();
        let mut stepper = FrameStepper::new();
        let ran = stepper.advance(&mut game, ControlState::default(), false, 0.1);
        assert_eq!(ran, MAX_SUBSTEPS);
        // Leftover time was discarded, so a tiny frame runs nothing
        assert_eq!(stepper.advance(&mut game, ControlState::default(), false, 0.001), 0);
    }

    #[test]
    fn test_autopilot_keeps_play_moving() {
        let mut game = new_game();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let mut hits = 0;
        let mut lost = 0;
        for _ in 0..(90.0 * SIM_HZ) as u32 {
            tick(&mut game, &input, SIM_DT);
            for event in game.last_events() {
                match event {
                    GameEvent::Score { .. } => hits += 1,
                    GameEvent::BallLost => lost += 1,
                    GameEvent::WarpRequest => {}
                }
            }
        }
        // A cradled ball is let go instead of being held for the whole run
        assert!(lost >= 1, "hits = {}, lost = {}", hits, lost);
        assert!(hits + lost >= 3, "hits = {}, lost = {}", hits, lost);
    }

    #[test]
    fn test_autopilot_lets_go_of_cradled_ball() {
        let mut game = new_game();
        start(&mut game);
        let body = game.table.ball.body();
        let parked = Vec3::new(-2.8, FLOOR_Y + BALL_RADIUS, 8.4);

        let mut released = false;
        for _ in 0..(CRADLE_TICKS + 5) {
            // Pin the ball so it reads as cradled every tick
            if let Some(ball) = game.table.world.body_mut(body) {
                ball.position = parked;
                ball.velocity = Vec3::ZERO;
            }
            game.time_ticks += 1;
            game.pilot.observe(&game.table, game.time_ticks);
            let controls = autopilot(&game);
            released |= !controls.left && game.pilot.releasing(game.time_ticks);
        }
        assert!(released);
        assert_eq!(game.pilot.attempts, 1);

        // Repeated cradles end in a long hands-off window
        game.pilot.attempts = SHOT_ATTEMPTS;
        game.pilot.release_until = 0;
        for _ in 0..CRADLE_TICKS {
            game.time_ticks += 1;
            game.pilot.observe(&game.table, game.time_ticks);
        }
        assert_eq!(game.pilot.release_until, game.time_ticks + DRAIN_RELEASE_TICKS);
    }
}
