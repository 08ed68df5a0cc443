//! Level ("planet") records
//!
//! A level is one playable table configuration: physics modifiers, a visual
//! theme, narrative text and an optional artifact. Records arrive from the
//! external generator as camelCase JSON, or from the offline catalog.

pub mod catalog;
pub mod generator;
pub mod transition;

pub use catalog::FallbackCatalog;
pub use generator::{
    LevelGenerator, LevelReply, LevelRequest, OfflineGenerator, SummaryReply, SummaryRequest,
};
pub use transition::{LevelTransition, MISSION_LOG_PLACEHOLDER, PendingReview};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, require_finite, require_range};

/// Upper bound accepted for restitution (bumpers run above 1.0)
pub const MAX_RESTITUTION: f32 = 2.0;

/// Per-level physics tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsModifiers {
    /// Vertical acceleration (negative = into the table)
    #[serde(rename = "gravity", alias = "gravityY")]
    pub gravity_y: f32,
    /// Downhill acceleration along +Z (table tilt)
    #[serde(rename = "slope", alias = "slopeZ")]
    pub slope_z: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for PhysicsModifiers {
    fn default() -> Self {
        Self {
            gravity_y: -12.0,
            slope_z: 8.0,
            friction: 0.1,
            restitution: 0.6,
        }
    }
}

impl PhysicsModifiers {
    /// Reject NaN/infinite values and out-of-range material coefficients
    pub fn validate(&self) -> Result<(), PhysicsError> {
        require_finite("gravity", self.gravity_y)?;
        require_finite("slope", self.slope_z)?;
        require_range("friction", self.friction, 0.0, 1.0)?;
        require_range("restitution", self.restitution, 0.0, MAX_RESTITUTION)?;
        Ok(())
    }

    /// World gravity vector: Y into the table, Z down the table
    pub fn gravity(&self) -> Vec3 {
        Vec3::new(0.0, self.gravity_y, self.slope_z)
    }
}

/// Cosmetic colors; passed through to the presentation layer untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualTheme {
    pub primary_color: String,
    pub secondary_color: String,
    pub floor_color: String,
    pub ambient_intensity: f32,
    pub neon_color: String,
}

impl Default for VisualTheme {
    fn default() -> Self {
        Self {
            primary_color: "#3b82f6".to_string(),
            secondary_color: "#1d4ed8".to_string(),
            floor_color: "#111827".to_string(),
            ambient_intensity: 0.5,
            neon_color: "#60a5fa".to_string(),
        }
    }
}

/// What an artifact does on arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactEffect {
    ScoreMultiplier,
    ExtraLife,
    WarpChargeBoost,
}

/// Pickup granted when arriving at a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "effectType")]
    pub effect: ArtifactEffect,
}

/// One playable table configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub crew_message: String,
    #[serde(default)]
    pub boss_name: Option<String>,
    pub physics: PhysicsModifiers,
    #[serde(default)]
    pub theme: VisualTheme,
    #[serde(default)]
    pub artifact: Option<Artifact>,

    // Opaque media pass-throughs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl Level {
    /// The training table every run starts on
    pub fn home() -> Self {
        Self {
            id: "home-base".to_string(),
            name: "Home Base".to_string(),
            description: "The standard training facility for Void Cadets.".to_string(),
            crew_message: "Welcome aboard, Cadet. Launch the ball to begin systems check."
                .to_string(),
            boss_name: Some("Training Drone Alpha".to_string()),
            physics: PhysicsModifiers {
                gravity_y: -9.8,
                slope_z: 5.0,
                friction: 0.1,
                restitution: 0.5,
            },
            theme: VisualTheme::default(),
            artifact: None,
            image_url: None,
            video_url: None,
            audio_base64: None,
            sources: Vec::new(),
        }
    }

    /// Parse a generator response and validate its physics block
    pub fn from_json(json: &str) -> Result<Self, crate::error::GenerationError> {
        let level: Level = serde_json::from_str(json)
            .map_err(|e| crate::error::GenerationError::Malformed(e.to_string()))?;
        level.validate()?;
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        self.physics.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;

    #[test]
    fn test_parse_generator_record() {
        let json = r##"{
            "name": "Kepler Drift",
            "description": "A tidally locked world.",
            "crewMessage": "Hold on.",
            "bossName": "The Warden",
            "physics": { "gravity": -14.5, "friction": 0.2, "restitution": 0.9, "slope": 6 },
            "theme": {
                "primaryColor": "#ff0000", "secondaryColor": "#00ff00",
                "floorColor": "#000000", "ambientIntensity": 0.4, "neonColor": "#ffffff"
            },
            "artifact": { "name": "Chrono Lens", "description": "", "icon": "*", "effectType": "score_multiplier" },
            "imageUrl": "data:image/png;base64,AAAA"
        }"##;

        let level = Level::from_json(json).unwrap();
        assert_eq!(level.name, "Kepler Drift");
        assert_eq!(level.physics.gravity_y, -14.5);
        assert_eq!(level.physics.slope_z, 6.0);
        assert_eq!(level.boss_name.as_deref(), Some("The Warden"));
        assert_eq!(
            level.artifact.as_ref().map(|a| a.effect),
            Some(ArtifactEffect::ScoreMultiplier)
        );
        assert!(level.image_url.is_some());
        assert!(level.sources.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_physics() {
        let json = r#"{ "name": "Broken", "physics": { "gravity": -9, "friction": -1, "restitution": 0.5, "slope": 5 } }"#;
        assert!(matches!(
            Level::from_json(json),
            Err(GenerationError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Level::from_json("not json"),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn test_gravity_vector() {
        let physics = Level::home().physics;
        assert_eq!(physics.gravity(), Vec3::new(0.0, -9.8, 5.0));
        assert!(physics.validate().is_ok());
    }
}
