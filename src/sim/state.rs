//! Game state and the state machine that owns it
//!
//! Everything here is plain data plus the four transitions the rest of the
//! core drives it with. Out-of-phase calls are expected (events race with
//! phase changes) and are silently ignored; each operation returns whether
//! it took effect.

use serde::{Deserialize, Serialize};

use super::table::TargetKind;
use crate::level::{Artifact, ArtifactEffect, Level};
use crate::settings::Tuning;

/// Warp charge at which the gate opens
pub const FULL_CHARGE: f32 = 100.0;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for the player to start
    Menu,
    Playing,
    /// Table frozen while the next level is fetched
    Warping,
    /// Run ended; waits for a restart
    GameOver,
}

/// Events emitted by table objects and the ball, drained once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Score { points: u32, source: TargetKind },
    BallLost,
    WarpRequest,
}

/// Complete gameplay state (serializable snapshot for the presentation layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub score: u64,
    pub lives: u8,
    /// 0..=100
    pub warp_charge: f32,
    pub warp_ready: bool,
    pub score_multiplier: u32,
    pub current_level: Level,
    /// Collected in arrival order
    pub artifacts: Vec<Artifact>,
    /// Successful warps this run
    pub levels_visited: u32,
    /// End-of-run summary, filled in after GAME_OVER
    pub performance_review: Option<String>,
    #[serde(skip)]
    tuning: Tuning,
}

impl GameState {
    /// Fresh state at the menu on the home level
    pub fn new(tuning: Tuning) -> Self {
        Self {
            status: GameStatus::Menu,
            score: 0,
            lives: tuning.starting_lives,
            warp_charge: 0.0,
            warp_ready: false,
            score_multiplier: 1,
            current_level: Level::home(),
            artifacts: Vec::new(),
            levels_visited: 0,
            performance_review: None,
            tuning,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// MENU -> PLAYING
    pub fn start(&mut self) -> bool {
        if self.status != GameStatus::Menu {
            log::debug!("Start ignored in {:?}", self.status);
            return false;
        }
        log::info!("Run started on {}", self.current_level.name);
        self.status = GameStatus::Playing;
        true
    }

    /// Reset everything and go straight back to PLAYING (from GAME_OVER only)
    pub fn restart(&mut self) -> bool {
        if self.status != GameStatus::GameOver {
            log::debug!("Restart ignored in {:?}", self.status);
            return false;
        }
        *self = Self::new(self.tuning.clone());
        self.status = GameStatus::Playing;
        log::info!("Run restarted");
        true
    }

    /// Credit `points` (before the multiplier) and charge the warp gate
    pub fn on_score(&mut self, points: u32) -> bool {
        if self.status != GameStatus::Playing {
            log::debug!("Score of {} ignored in {:?}", points, self.status);
            return false;
        }
        let applied = u64::from(points) * u64::from(self.score_multiplier);
        self.score = self.score.saturating_add(applied);

        let gain = applied as f32 / self.tuning.warp_threshold * FULL_CHARGE;
        self.warp_charge = (self.warp_charge + gain).min(FULL_CHARGE);
        if !self.warp_ready && self.warp_charge >= FULL_CHARGE {
            log::info!("Warp gate open");
        }
        self.warp_ready = self.warp_charge >= FULL_CHARGE;
        true
    }

    /// A ball drained; returns true when a life was consumed or the run ended
    ///
    /// With no lives left the run ends and lives stay at zero. Otherwise the
    /// caller respawns the ball.
    pub fn on_ball_lost(&mut self) -> bool {
        if self.status != GameStatus::Playing {
            log::debug!("Ball loss ignored in {:?}", self.status);
            return false;
        }
        if self.lives == 0 {
            self.status = GameStatus::GameOver;
            log::info!("Game over with {} points", self.score);
        } else {
            self.lives -= 1;
            log::info!("Ball lost, {} lives left", self.lives);
        }
        true
    }

    /// Gate entered; starts a warp if the charge is full
    pub fn on_warp_enter(&mut self) -> bool {
        if self.status != GameStatus::Playing || !self.warp_ready {
            log::debug!(
                "Gate entry ignored ({:?}, charge {:.1})",
                self.status,
                self.warp_charge
            );
            return false;
        }
        log::info!("Warping from {}", self.current_level.name);
        self.status = GameStatus::Warping;
        true
    }

    /// Arrive at `level` (WARPING -> PLAYING)
    ///
    /// Grants the bonus life, applies the level's artifact and sets the warp
    /// charge to the collected head-start.
    pub fn apply_level(&mut self, level: Level) -> bool {
        if self.status != GameStatus::Warping {
            log::debug!("Level {} ignored in {:?}", level.name, self.status);
            return false;
        }
        let max_lives = self.tuning.max_lives;
        self.lives = self.lives.saturating_add(1).min(max_lives);

        if let Some(artifact) = level.artifact.clone() {
            match artifact.effect {
                ArtifactEffect::ScoreMultiplier => {
                    self.score_multiplier =
                        self.score_multiplier.saturating_add(self.tuning.multiplier_step);
                }
                ArtifactEffect::ExtraLife => {
                    self.lives = self.lives.saturating_add(1).min(max_lives);
                }
                ArtifactEffect::WarpChargeBoost => {}
            }
            log::info!("Collected artifact {}", artifact.name);
            self.artifacts.push(artifact);
        }

        self.warp_charge = self.warp_head_start();
        self.warp_ready = false;
        self.levels_visited += 1;
        log::info!(
            "Arrived at {} with {:.0} warp charge ({} stacking)",
            level.name,
            self.warp_charge,
            self.tuning.artifact_stacking.as_str()
        );
        self.current_level = level;
        self.status = GameStatus::Playing;
        true
    }

    /// Charge granted on arrival by collected warp-boost artifacts
    pub fn warp_head_start(&self) -> f32 {
        let boosts = self
            .artifacts
            .iter()
            .filter(|a| a.effect == ArtifactEffect::WarpChargeBoost)
            .count();
        let cap = self.tuning.max_warp_head_start.min(FULL_CHARGE - 1.0);
        self.tuning
            .artifact_stacking
            .head_start(boosts, self.tuning.warp_boost_per_artifact, cap)
    }

    /// Apply one drained event; WarpRequest only flips the state
    pub fn handle(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::Score { points, .. } => self.on_score(points),
            GameEvent::BallLost => self.on_ball_lost(),
            GameEvent::WarpRequest => self.on_warp_enter(),
        }
    }
}
