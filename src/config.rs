//! Game settings
//!
//! Loaded from a JSON file (every field optional) and validated once before
//! the engine starts. A bad config is fatal at startup, never mid-game.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::grid::Grid;
use crate::sim::powerup::PowerUpRegistry;

/// Per-kind tweak applied on top of the built-in power-up table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpOverride {
    /// Kind name, e.g. `"ghostTime"`. Unknown names are rejected.
    pub kind: String,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub spawn_weight: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    // === Playfield ===
    /// Canvas width in pixels
    pub width: i32,
    /// Canvas height in pixels
    pub height: i32,
    /// Cell edge length in pixels
    pub cell_size: i32,

    // === Timing ===
    /// Main tick interval before speed multipliers (ms)
    pub base_tick_ms: u64,
    /// Magnet pull interval (ms)
    pub magnet_interval_ms: u64,
    /// Lifetime of an uncollected power-up on the board (ms)
    pub spawned_power_up_lifetime_ms: u64,

    // === Scoring ===
    pub food_points: u32,
    pub golden_apple_bonus: u32,

    // === Rules ===
    /// Blackout visibility radius (cells)
    pub blackout_radius: i32,
    /// Random placement attempts before the exhaustive scan
    pub placement_retries: u32,

    /// RNG seed; random when absent
    pub seed: Option<u64>,

    /// Power-up table tweaks
    pub power_ups: Vec<PowerUpOverride>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            cell_size: CELL_SIZE,

            base_tick_ms: BASE_TICK_MS,
            magnet_interval_ms: MAGNET_INTERVAL_MS,
            spawned_power_up_lifetime_ms: SPAWNED_POWER_UP_LIFETIME_MS,

            food_points: FOOD_POINTS,
            golden_apple_bonus: GOLDEN_APPLE_BONUS,

            blackout_radius: BLACKOUT_RADIUS,
            placement_retries: PLACEMENT_RETRIES,

            seed: None,

            power_ups: Vec::new(),
        }
    }
}

impl GameConfig {
    /// Default config with a fixed seed (tests, replays)
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse config from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check every field; also builds the grid and registry to surface their errors
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid()?;
        self.registry()?;
        if self.base_tick_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "baseTickMs",
            });
        }
        if self.magnet_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "magnetIntervalMs",
            });
        }
        if self.spawned_power_up_lifetime_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "spawnedPowerUpLifetimeMs",
            });
        }
        if self.blackout_radius < 0 {
            return Err(ConfigError::NegativeBlackoutRadius(self.blackout_radius));
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<Grid, ConfigError> {
        Grid::new(self.width, self.height, self.cell_size)
    }

    pub fn registry(&self) -> Result<PowerUpRegistry, ConfigError> {
        PowerUpRegistry::with_overrides(&self.power_ups)
    }

    pub fn base_tick(&self) -> Duration {
        Duration::from_millis(self.base_tick_ms)
    }

    pub fn magnet_interval(&self) -> Duration {
        Duration::from_millis(self.magnet_interval_ms)
    }
}
