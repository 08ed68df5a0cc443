//! Offline fallback levels
//!
//! Used whenever the generator fails or is absent so a warp always lands
//! somewhere playable. Selection is seeded so runs are reproducible.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Artifact, ArtifactEffect, Level, PhysicsModifiers, VisualTheme};

fn theme(primary: &str, secondary: &str, floor: &str, ambient: f32, neon: &str) -> VisualTheme {
    VisualTheme {
        primary_color: primary.to_string(),
        secondary_color: secondary.to_string(),
        floor_color: floor.to_string(),
        ambient_intensity: ambient,
        neon_color: neon.to_string(),
    }
}

fn artifact(name: &str, description: &str, icon: &str, effect: ArtifactEffect) -> Option<Artifact> {
    Some(Artifact {
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        effect,
    })
}

#[allow(clippy::too_many_arguments)]
fn level(
    id: &str,
    name: &str,
    description: &str,
    crew_message: &str,
    boss_name: &str,
    physics: PhysicsModifiers,
    theme: VisualTheme,
    artifact: Option<Artifact>,
) -> Level {
    Level {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        crew_message: crew_message.to_string(),
        boss_name: Some(boss_name.to_string()),
        physics,
        theme,
        artifact,
        image_url: None,
        video_url: None,
        audio_base64: None,
        sources: Vec::new(),
    }
}

/// The built-in fallback levels
pub fn builtin_levels() -> Vec<Level> {
    vec![
        level(
            "sector-zero",
            "Sector Zero",
            "Long-range comms are down. Navigating by dead reckoning.",
            "Generator offline, Cadet. Flying blind through Sector Zero.",
            "Rogue Sentinel",
            PhysicsModifiers {
                gravity_y: -12.0,
                slope_z: 8.0,
                friction: 0.1,
                restitution: 0.6,
            },
            theme("#ef4444", "#7f1d1d", "#0a0a0a", 0.3, "#f87171"),
            None,
        ),
        level(
            "cinder-reach",
            "Cinder Reach",
            "A furnace moon where the table runs hot and heavy.",
            "Hull temperature rising. Keep that ball moving.",
            "Magma Warden",
            PhysicsModifiers {
                gravity_y: -16.0,
                slope_z: 10.0,
                friction: 0.2,
                restitution: 0.5,
            },
            theme("#f97316", "#9a3412", "#1c0a00", 0.6, "#fdba74"),
            artifact(
                "Ember Core",
                "Burns hotter with every hit.",
                "*",
                ArtifactEffect::ScoreMultiplier,
            ),
        ),
        level(
            "glass-drift",
            "Glass Drift",
            "Low gravity and slick surfaces across a frozen ring.",
            "Traction is minimal out here. Flippers up, Cadet.",
            "Crystal Leviathan",
            PhysicsModifiers {
                gravity_y: -7.0,
                slope_z: 5.5,
                friction: 0.02,
                restitution: 0.8,
            },
            theme("#22d3ee", "#0e7490", "#020617", 0.7, "#a5f3fc"),
            artifact(
                "Frost Capacitor",
                "Stores charge between jumps.",
                "+",
                ArtifactEffect::WarpChargeBoost,
            ),
        ),
        level(
            "verdant-spire",
            "Verdant Spire",
            "An overgrown station. Everything bounces a little too much.",
            "Life signs everywhere. Some of them are bumpers.",
            "Thornmother",
            PhysicsModifiers {
                gravity_y: -10.0,
                slope_z: 7.0,
                friction: 0.15,
                restitution: 1.1,
            },
            theme("#22c55e", "#166534", "#052e16", 0.5, "#86efac"),
            artifact(
                "Seed Pod",
                "A spare cadet, grown in the hydroponics bay.",
                "o",
                ArtifactEffect::ExtraLife,
            ),
        ),
    ]
}

/// Seeded picker over the fallback levels
#[derive(Debug, Clone)]
pub struct FallbackCatalog {
    levels: Vec<Level>,
    rng: Pcg32,
}

impl FallbackCatalog {
    pub fn new(seed: u64) -> Self {
        Self::with_levels(builtin_levels(), seed)
    }

    /// Catalog over custom levels; falls back to the built-ins when empty
    pub fn with_levels(levels: Vec<Level>, seed: u64) -> Self {
        let levels = if levels.is_empty() {
            builtin_levels()
        } else {
            levels
        };
        Self {
            levels,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Pick a level, avoiding the one named `current` when there is a choice
    pub fn pick(&mut self, current: &str) -> Level {
        let candidates: Vec<&Level> = self.levels.iter().filter(|l| l.name != current).collect();
        if candidates.is_empty() {
            return self.levels[0].clone();
        }
        let index = self.rng.random_range(0..candidates.len());
        candidates[index].clone()
    }
}
