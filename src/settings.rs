//! Gameplay tuning
//!
//! Every balance constant the core reads at runtime. Loaded from JSON
//! (LocalStorage on web, a file on native); missing keys keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How repeated warp-charge-boost artifacts combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStacking {
    /// Every collected boost adds its head-start
    #[default]
    Additive,
    /// Only one boost counts, however many were collected
    Latest,
}

impl ArtifactStacking {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStacking::Additive => "additive",
            ArtifactStacking::Latest => "latest",
        }
    }

    /// Warp charge granted on arrival given `boosts` collected boost artifacts
    pub fn head_start(&self, boosts: usize, per_boost: f32, cap: f32) -> f32 {
        let raw = match self {
            ArtifactStacking::Additive => boosts as f32 * per_boost,
            ArtifactStacking::Latest if boosts > 0 => per_boost,
            ArtifactStacking::Latest => 0.0,
        };
        raw.clamp(0.0, cap)
    }
}

/// Runtime gameplay tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Scoring ===
    /// Multiplied points needed to fill the warp charge once
    pub warp_threshold: f32,
    pub bumper_points: u32,
    pub slingshot_points: u32,
    pub boss_points: u32,
    /// Seconds during which a table object ignores repeat hits
    pub hit_debounce_secs: f32,

    // === Lives ===
    pub starting_lives: u8,
    pub max_lives: u8,

    // === Flippers (rad/s) ===
    pub flipper_active_speed: f32,
    pub flipper_rest_speed: f32,

    // === Plunger (units/s, units) ===
    pub plunger_pull_speed: f32,
    pub plunger_return_speed: f32,
    pub plunger_max_pull: f32,

    // === Ball ===
    pub max_ball_speed: f32,

    // === Warp ===
    /// Minimum time the warp sequence is shown, even if generation is instant
    pub min_transition_secs: f32,

    // === Artifacts ===
    pub artifact_stacking: ArtifactStacking,
    pub multiplier_step: u32,
    pub warp_boost_per_artifact: f32,
    /// Never reaches 100 so arrival cannot open the gate by itself
    pub max_warp_head_start: f32,

    /// Seed for the offline level catalog
    pub catalog_seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            warp_threshold: 2000.0,
            bumper_points: 100,
            slingshot_points: 50,
            boss_points: 500,
            hit_debounce_secs: 0.12,

            starting_lives: 3,
            max_lives: 5,

            flipper_active_speed: 24.0,
            flipper_rest_speed: 10.0,

            plunger_pull_speed: 1.5,
            plunger_return_speed: 16.0,
            plunger_max_pull: 1.0,

            max_ball_speed: 28.0,

            min_transition_secs: 6.0,

            artifact_stacking: ArtifactStacking::Additive,
            multiplier_step: 1,
            warp_boost_per_artifact: 25.0,
            max_warp_head_start: 50.0,

            catalog_seed: 0x5eed_cade7,
        }
    }
}

impl Tuning {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "void_cadet_tuning";
    /// Env var naming a tuning file (used only on native)
    #[allow(dead_code)]
    const ENV_VAR: &'static str = "VOID_CADET_TUNING";

    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would stall or destabilize the simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("warp_threshold", self.warp_threshold),
            ("hit_debounce_secs", self.hit_debounce_secs),
            ("flipper_active_speed", self.flipper_active_speed),
            ("flipper_rest_speed", self.flipper_rest_speed),
            ("plunger_pull_speed", self.plunger_pull_speed),
            ("plunger_return_speed", self.plunger_return_speed),
            ("plunger_max_pull", self.plunger_max_pull),
            ("max_ball_speed", self.max_ball_speed),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { name, value });
            }
        }
        if !self.min_transition_secs.is_finite() || self.min_transition_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "min_transition_secs",
                value: self.min_transition_secs,
            });
        }
        if !(0.0..100.0).contains(&self.max_warp_head_start) {
            return Err(ConfigError::InvalidValue {
                name: "max_warp_head_start",
                value: self.max_warp_head_start,
            });
        }
        if self.starting_lives == 0 || self.starting_lives > self.max_lives {
            return Err(ConfigError::InvalidValue {
                name: "starting_lives",
                value: self.starting_lives as f32,
            });
        }
        if self.multiplier_step == 0 {
            return Err(ConfigError::InvalidValue {
                name: "multiplier_step",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Seconds converted to whole simulation ticks (at least one)
    pub fn secs_to_ticks(secs: f32) -> u64 {
        (secs * crate::consts::SIM_HZ).round().max(1.0) as u64
    }

    /// Load tuning overrides from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Load tuning overrides from the file named by `VOID_CADET_TUNING`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_VAR) else {
            log::info!("Using default tuning");
            return Self::default();
        };

        match std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .and_then(|json| Self::from_json(&json))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {}: {}", path, e);
                Self::default()
            }
        }
    }
}
