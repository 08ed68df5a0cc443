//! Error types for the simulation boundary.
//!
//! Only boundary failures are errors: a bad physics record from a generator,
//! a generator that fails or goes away, a malformed tuning file. Gameplay
//! logic violations (scoring outside PLAYING, double warp entry) are no-ops,
//! not errors.

use std::fmt;

/// Rejected physics parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A parameter was NaN, infinite, or outside its allowed range.
    InvalidParameter {
        /// Parameter name (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
    },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::InvalidParameter { name, value } => {
                write!(f, "physics parameter '{}' = {} is not allowed", name, value)
            }
        }
    }
}

impl std::error::Error for PhysicsError {}

/// Failure reported by (or about) the external level generator.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// No generator capability is configured (no host hook, no key).
    Unavailable,
    /// The generator ran and reported an error.
    Failed(String),
    /// The generator answered with something that is not a level record.
    Malformed(String),
    /// The record parsed, but its physics block is unusable.
    InvalidLevel(PhysicsError),
    /// The reply channel was dropped without an answer.
    Disconnected,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Unavailable => write!(f, "level generator unavailable"),
            GenerationError::Failed(msg) => write!(f, "level generation failed: {}", msg),
            GenerationError::Malformed(msg) => write!(f, "malformed level record: {}", msg),
            GenerationError::InvalidLevel(err) => write!(f, "invalid level: {}", err),
            GenerationError::Disconnected => write!(f, "level generator dropped the request"),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::InvalidLevel(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PhysicsError> for GenerationError {
    fn from(err: PhysicsError) -> Self {
        GenerationError::InvalidLevel(err)
    }
}

/// Tuning could not be loaded or validated.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The JSON document did not parse.
    Parse(String),
    /// A value parsed but is outside its safe range.
    InvalidValue {
        /// Field name.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "tuning parse error: {}", msg),
            ConfigError::InvalidValue { name, value } => {
                write!(f, "tuning value '{}' = {} is out of range", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Returns an error unless `value` is finite.
pub fn require_finite(name: &'static str, value: f32) -> Result<f32, PhysicsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidParameter { name, value })
    }
}

/// Returns an error unless `value` is finite and within `[min, max]`.
pub fn require_range(
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<f32, PhysicsError> {
    let value = require_finite(name, value)?;
    if value < min || value > max {
        return Err(PhysicsError::InvalidParameter { name, value });
    }
    Ok(value)
}
