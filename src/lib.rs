//! Snake Arcade - rules engine for a grid-based snake game with power-ups
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, movement, collisions, power-ups, tick scheduling)
//! - `config`: Data-driven game settings loaded from JSON
//! - `autopilot`: Demo-mode steering bot
//!
//! Rendering, input capture and UI are external: they drive the engine through
//! [`sim::Game`] commands and read [`sim::GameState`] snapshots.

pub mod autopilot;
pub mod config;
pub mod error;
pub mod sim;

pub use config::{GameConfig, PowerUpOverride};
pub use error::{ConfigError, ParseError};

use glam::IVec2;

/// Game configuration defaults
pub mod consts {
    /// Canvas dimensions in pixels
    pub const CANVAS_WIDTH: i32 = 400;
    pub const CANVAS_HEIGHT: i32 = 400;
    /// Size of one grid cell in pixels
    pub const CELL_SIZE: i32 = 20;

    /// Main tick interval before power-up speed multipliers (ms)
    pub const BASE_TICK_MS: u64 = 150;
    /// Magnet pull sub-tick interval (ms), independent of the main tick
    pub const MAGNET_INTERVAL_MS: u64 = 300;

    /// Points for one food item
    pub const FOOD_POINTS: u32 = 1;
    /// One-shot bonus for the golden apple
    pub const GOLDEN_APPLE_BONUS: u32 = 5;
    /// Blackout visibility radius around the head, in cells
    pub const BLACKOUT_RADIUS: i32 = 3;

    /// Random placement attempts before scanning the whole board
    pub const PLACEMENT_RETRIES: u32 = 100;
    /// How long an uncollected power-up stays on the board (ms)
    pub const SPAWNED_POWER_UP_LIFETIME_MS: u64 = 10_000;

    /// Starting snake length
    pub const INITIAL_SNAKE_LEN: usize = 3;
    /// Smallest grid that fits the starting snake
    pub const MIN_COLUMNS: i32 = 6;
    pub const MIN_ROWS: i32 = 1;
}

/// Componentwise sign of a vector (-1, 0 or 1 per axis)
#[inline]
pub fn signum(v: IVec2) -> IVec2 {
    IVec2::new(v.x.signum(), v.y.signum())
}

/// Manhattan distance between two pixel positions
#[inline]
pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}
