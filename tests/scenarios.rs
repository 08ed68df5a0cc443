//! End-to-end gameplay scenarios against the public API

use glam::Vec3;
use void_cadet::consts::*;
use void_cadet::launch_position;
use void_cadet::level::OfflineGenerator;
use void_cadet::sim::{
    ContactEvent, FlipperController, FlipperSide, Game, GameEvent, GameState, GameStatus, Table,
    TargetKind, TickInput, tick,
};
use void_cadet::{PhysicsModifiers, Tuning};

fn start_input() -> TickInput {
    TickInput {
        start: true,
        ..Default::default()
    }
}

fn teleport_ball(game: &mut Game, position: Vec3) {
    let body = game.table.ball.body();
    let ball = game.table.world.body_mut(body).expect("ball body");
    ball.position = position;
    ball.velocity = Vec3::ZERO;
}

#[test]
fn scenario_a_three_bumper_hits() {
    let tuning = Tuning::default();
    let mut table = Table::new(&tuning, &PhysicsModifiers::default());
    let mut state = GameState::new(tuning);
    assert!(state.start());

    let bumper = table
        .targets
        .iter()
        .find(|t| t.kind == TargetKind::Bumper)
        .map(|t| t.body)
        .expect("table has bumpers");

    let spacing = table.cooldown_ticks() + 1;
    for hit in 0..3 {
        let contact = ContactEvent {
            dynamic: table.ball.body(),
            other: bumper,
        };
        let event = table
            .handle_contact(contact, hit * spacing)
            .expect("spaced hits all score");
        assert!(state.handle(event));
    }

    assert_eq!(state.score, 300);
    assert!((state.warp_charge - 15.0).abs() < 1e-4);
    assert!(!state.warp_ready);
}

#[test]
fn scenario_b_warp_with_failing_generator() {
    let tuning = Tuning {
        // Keep the arithmetic exact whatever artifact the fallback carries
        warp_boost_per_artifact: 0.0,
        max_lives: 4,
        ..Tuning::default()
    };
    let min_ticks = Tuning::secs_to_ticks(tuning.min_transition_secs);
    let mut game = Game::new(tuning, Box::new(OfflineGenerator));
    tick(&mut game, &start_input(), SIM_DT);

    // Fill the charge; the gate opens at the end of the next tick
    game.state.on_score(2000);
    assert!(game.state.warp_ready);
    tick(&mut game, &TickInput::default(), SIM_DT);
    assert!(game.table.gate.is_open);

    // Park the ball inside the gate sensor
    teleport_ball(&mut game, Vec3::new(0.0, FLOOR_Y + BALL_RADIUS, -9.8));
    tick(&mut game, &TickInput::default(), SIM_DT);

    let requests = game
        .last_events()
        .iter()
        .filter(|e| **e == GameEvent::WarpRequest)
        .count();
    assert_eq!(requests, 1);
    assert_eq!(game.state.status, GameStatus::Warping);

    let mut waited = 0;
    while game.state.status == GameStatus::Warping {
        tick(&mut game, &TickInput::default(), SIM_DT);
        assert!(
            !game.last_events().contains(&GameEvent::WarpRequest),
            "gate must not fire again while warping"
        );
        waited += 1;
        assert!(waited <= min_ticks + 1, "transition never finished");
    }

    assert!(waited >= min_ticks - 1);
    assert_eq!(game.state.status, GameStatus::Playing);
    assert_eq!(game.state.warp_charge, 0.0);
    assert!(!game.state.warp_ready);
    assert_eq!(game.state.lives, 4);
    assert_ne!(game.state.current_level.name, "Home Base");
    assert_eq!(game.table.ball.position(&game.table.world), launch_position());

    // New physics is picked up by the first step after arrival
    tick(&mut game, &TickInput::default(), SIM_DT);
    assert_eq!(
        game.table.world.config().gravity,
        game.state.current_level.physics.gravity()
    );
}

#[test]
fn scenario_c_last_ball_ends_run() {
    let mut game = Game::new(Tuning::default(), Box::new(OfflineGenerator));
    tick(&mut game, &start_input(), SIM_DT);
    game.state.lives = 0;

    teleport_ball(
        &mut game,
        Vec3::new(0.0, FLOOR_Y + BALL_RADIUS, OUT_OF_BOUNDS_Z + 0.5),
    );
    tick(&mut game, &TickInput::default(), SIM_DT);

    assert_eq!(game.state.status, GameStatus::GameOver);
    assert_eq!(game.state.lives, 0);

    let score = game.state.score;
    assert!(!game.state.on_score(100));
    assert!(!game.state.on_ball_lost());
    assert_eq!(game.state.score, score);
    assert_eq!(game.state.lives, 0);
    assert_eq!(game.state.status, GameStatus::GameOver);
}

#[test]
fn scenario_d_flipper_tap() {
    let side = FlipperSide::Left;
    let range = side.active_angle() - side.rest_angle();
    // Full sweep in 50 ms either way
    let speed = range / 0.05;
    let mut flipper = FlipperController::new(side, void_cadet::sim::BodyId(0), Vec3::ZERO, speed, speed);

    let lo = side.rest_angle();
    let hi = side.active_angle();
    let held_ticks = (0.2 * SIM_HZ) as u32;

    let mut reached_active = false;
    for _ in 0..held_ticks {
        let angle = flipper.update(true, SIM_DT);
        assert!(angle >= lo && angle <= hi);
        reached_active |= angle == hi;
    }
    assert!(reached_active);
    assert_eq!(flipper.state.current_angle, hi);

    let mut reached_rest = false;
    for _ in 0..held_ticks {
        let angle = flipper.update(false, SIM_DT);
        assert!(angle >= lo && angle <= hi);
        reached_rest |= angle == lo;
    }
    assert!(reached_rest);
    assert_eq!(flipper.state.current_angle, lo);
}
