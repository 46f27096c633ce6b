//! Configuration and input errors
//!
//! The engine has no recoverable runtime errors; everything that can go wrong
//! is caught while building a [`crate::sim::Game`] from its config, or while
//! turning player input into commands.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("canvas and cell size must be positive (got {width}x{height}, cell {cell_size})")]
    NonPositiveDimension {
        width: i32,
        height: i32,
        cell_size: i32,
    },
    #[error("canvas {width}x{height} is not a multiple of cell size {cell_size}")]
    NotCellAligned {
        width: i32,
        height: i32,
        cell_size: i32,
    },
    #[error("grid of {columns}x{rows} cells is too small (need at least {min_columns}x{min_rows})")]
    GridTooSmall {
        columns: i32,
        rows: i32,
        min_columns: i32,
        min_rows: i32,
    },
    #[error("{name} must be non-zero")]
    ZeroInterval { name: &'static str },
    #[error("unknown power-up kind `{0}`")]
    UnknownPowerUp(String),
    #[error("power-up {kind} listed more than once")]
    DuplicatePowerUp { kind: String },
    #[error("power-up {kind} missing from registry")]
    MissingPowerUp { kind: String },
    #[error("power-up {kind} spawn weight {weight} exceeds 100")]
    SpawnWeightOutOfRange { kind: String, weight: u8 },
    #[error("power-up {kind} must be instant (duration 0), got {duration_ms}ms")]
    ExpectedInstant { kind: String, duration_ms: u64 },
    #[error("power-up {kind} needs a non-zero duration")]
    ExpectedDuration { kind: String },
    #[error("power-up {kind} speed multiplier {multiplier} must be positive")]
    InvalidSpeedMultiplier { kind: String, multiplier: f32 },
    #[error("power-up {kind} score multiplier must be at least 1")]
    InvalidScoreMultiplier { kind: String },
    #[error("blackout radius must not be negative (got {0})")]
    NegativeBlackoutRadius(i32),
}

/// Player input that does not map to a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown direction `{0}`")]
    UnknownDirection(String),
}
