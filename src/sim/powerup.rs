//! Power-up catalog
//!
//! Static table of every power-up kind: how long it lasts, how often it
//! spawns, what it says when collected and how it bends the rules. The table
//! is validated once at construction; afterwards lookups cannot fail.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PowerUpOverride;
use crate::error::ConfigError;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    GhostTime,
    MagnetHead,
    DoubleScore,
    SpeedBoost,
    SnailTime,
    BlackoutMode,
    GoldenApple,
    MysteryBox,
}

impl PowerUpKind {
    /// Every kind, in registry order
    pub const ALL: [PowerUpKind; 8] = [
        PowerUpKind::GhostTime,
        PowerUpKind::MagnetHead,
        PowerUpKind::DoubleScore,
        PowerUpKind::SpeedBoost,
        PowerUpKind::SnailTime,
        PowerUpKind::BlackoutMode,
        PowerUpKind::GoldenApple,
        PowerUpKind::MysteryBox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::GhostTime => "ghostTime",
            PowerUpKind::MagnetHead => "magnetHead",
            PowerUpKind::DoubleScore => "doubleScore",
            PowerUpKind::SpeedBoost => "speedBoost",
            PowerUpKind::SnailTime => "snailTime",
            PowerUpKind::BlackoutMode => "blackoutMode",
            PowerUpKind::GoldenApple => "goldenApple",
            PowerUpKind::MysteryBox => "mysteryBox",
        }
    }

    /// Kinds whose effect is applied once at pickup
    pub fn must_be_instant(&self) -> bool {
        matches!(self, PowerUpKind::GoldenApple | PowerUpKind::MysteryBox)
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerUpKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PowerUpKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPowerUp(s.to_string()))
    }
}

/// One registry row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpSpec {
    pub kind: PowerUpKind,
    /// Effect duration in ms (0 = instant)
    pub duration_ms: u64,
    /// Spawn chance in percent once this kind is picked as the candidate
    pub spawn_weight: u8,
    /// Message shown when the effect starts
    pub message: String,
    /// Tick interval multiplier while active
    pub speed_multiplier: f32,
    /// Food score multiplier while active
    pub score_multiplier: u32,
}

impl PowerUpSpec {
    fn new(
        kind: PowerUpKind,
        duration_ms: u64,
        spawn_weight: u8,
        message: &str,
        speed_multiplier: f32,
        score_multiplier: u32,
    ) -> Self {
        Self {
            kind,
            duration_ms,
            spawn_weight,
            message: message.to_string(),
            speed_multiplier,
            score_multiplier,
        }
    }

    #[inline]
    pub fn is_instant(&self) -> bool {
        self.duration_ms == 0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Message shown when a timed effect runs out
    pub fn expiry_message(&self) -> String {
        format!("{} wore off", self.kind)
    }
}

/// Validated power-up table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpRegistry {
    specs: Vec<PowerUpSpec>,
}

impl PowerUpRegistry {
    /// Built-in table
    pub fn builtin() -> Self {
        use PowerUpKind::*;
        Self {
            specs: vec![
                PowerUpSpec::new(GhostTime, 8_000, 15, "Ghost mode! Walls and tail can't hurt you", 1.0, 1),
                PowerUpSpec::new(MagnetHead, 10_000, 15, "Magnet head! Food is drawn to you", 1.0, 1),
                PowerUpSpec::new(DoubleScore, 8_000, 20, "Double score! Food is worth twice as much", 1.0, 2),
                PowerUpSpec::new(SpeedBoost, 6_000, 20, "Speed boost!", 0.5, 1),
                PowerUpSpec::new(SnailTime, 12_000, 15, "Snail time! Slow down, double points", 2.5, 2),
                PowerUpSpec::new(BlackoutMode, 8_000, 10, "Blackout! You can only see nearby", 1.0, 1),
                PowerUpSpec::new(GoldenApple, 0, 20, "Golden apple! +5 points", 1.0, 1),
                PowerUpSpec::new(MysteryBox, 0, 10, "Mystery box!", 1.0, 1),
            ],
        }
    }

    /// Build from an explicit table, validating every row
    pub fn from_specs(specs: Vec<PowerUpSpec>) -> Result<Self, ConfigError> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.kind == spec.kind) {
                return Err(ConfigError::DuplicatePowerUp {
                    kind: spec.kind.to_string(),
                });
            }
            validate_spec(spec)?;
        }
        // Registry must be indexable by kind order
        let mut ordered = Vec::with_capacity(PowerUpKind::ALL.len());
        for kind in PowerUpKind::ALL {
            let spec = specs
                .iter()
                .find(|s| s.kind == kind)
                .ok_or_else(|| ConfigError::MissingPowerUp {
                    kind: kind.to_string(),
                })?;
            ordered.push(spec.clone());
        }
        Ok(Self { specs: ordered })
    }

    /// Built-in table with config overrides applied
    pub fn with_overrides(overrides: &[PowerUpOverride]) -> Result<Self, ConfigError> {
        let mut specs = Self::builtin().specs;
        for over in overrides {
            let kind: PowerUpKind = over.kind.parse()?;
            let spec = &mut specs[kind as usize];
            if let Some(duration_ms) = over.duration_ms {
                spec.duration_ms = duration_ms;
            }
            if let Some(weight) = over.spawn_weight {
                spec.spawn_weight = weight;
            }
            if let Some(message) = &over.message {
                spec.message = message.clone();
            }
        }
        Self::from_specs(specs)
    }

    #[inline]
    pub fn get(&self, kind: PowerUpKind) -> &PowerUpSpec {
        &self.specs[kind as usize]
    }

    pub fn specs(&self) -> &[PowerUpSpec] {
        &self.specs
    }

    /// Uniformly pick any kind
    pub fn random_kind<R: Rng + ?Sized>(&self, rng: &mut R) -> PowerUpKind {
        PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())]
    }

    /// Resolve a mystery box into a uniformly chosen concrete kind
    pub fn resolve_mystery<R: Rng + ?Sized>(&self, rng: &mut R) -> PowerUpKind {
        let choices = &PowerUpKind::ALL[..PowerUpKind::ALL.len() - 1];
        debug_assert!(!choices.contains(&PowerUpKind::MysteryBox));
        choices[rng.random_range(0..choices.len())]
    }
}

impl Default for PowerUpRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_spec(spec: &PowerUpSpec) -> Result<(), ConfigError> {
    let kind = spec.kind.to_string();
    if spec.spawn_weight > 100 {
        return Err(ConfigError::SpawnWeightOutOfRange {
            kind,
            weight: spec.spawn_weight,
        });
    }
    if spec.kind.must_be_instant() && !spec.is_instant() {
        return Err(ConfigError::ExpectedInstant {
            kind,
            duration_ms: spec.duration_ms,
        });
    }
    if !spec.kind.must_be_instant() && spec.is_instant() {
        return Err(ConfigError::ExpectedDuration { kind });
    }
    if !(spec.speed_multiplier.is_finite() && spec.speed_multiplier > 0.0) {
        return Err(ConfigError::InvalidSpeedMultiplier {
            kind,
            multiplier: spec.speed_multiplier,
        });
    }
    if spec.score_multiplier == 0 {
        return Err(ConfigError::InvalidScoreMultiplier { kind });
    }
    Ok(())
}
