//! Game state and core simulation types
//!
//! [`GameState`] is the read-only snapshot handed to renderers. It is only
//! mutated by the tick and the command handlers in [`super::game::Game`].

use std::fmt;
use std::str::FromStr;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid};
use super::powerup::PowerUpKind;
use super::scheduler::Millis;
use crate::consts::INITIAL_SNAKE_LEN;
use crate::error::ParseError;

/// Arrow key codes consumed from the input layer
pub mod key_codes {
    pub const LEFT: u32 = 37;
    pub const UP: u32 = 38;
    pub const RIGHT: u32 = 39;
    pub const DOWN: u32 = 40;
}

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Map an arrow key code to a direction
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            key_codes::LEFT => Some(Direction::Left),
            key_codes::UP => Some(Direction::Up),
            key_codes::RIGHT => Some(Direction::Right),
            key_codes::DOWN => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_opposite(&self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Unit step in grid units (y grows downward)
    pub fn delta(&self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownDirection(s.to_string()))
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    WallCollision,
    SelfCollision,
    /// No free cell left for the next collectible
    BoardFull,
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Fresh board, waiting for start or first direction input
    Idle,
    /// Ticking
    Running,
    /// Timers suspended since the given instant
    Paused { since: Millis },
    /// Terminal until the next init
    Over { reason: GameOverReason },
}

/// A power-up sitting on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedPowerUp {
    pub cell: Cell,
    pub kind: PowerUpKind,
    /// Instant after which it is replaced by food
    pub expires_at: Millis,
    pub instant: bool,
}

/// The power-up currently modifying the rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub started_at: Millis,
    pub expires_at: Millis,
    pub instant: bool,
}

impl ActivePowerUp {
    pub fn is(&self, kind: PowerUpKind) -> bool {
        self.kind == kind
    }

    /// Remaining effect time at `now`
    pub fn remaining_ms(&self, now: Millis) -> Millis {
        self.expires_at.saturating_sub(now)
    }
}

/// True when `active` is of the given kind
#[inline]
pub fn active_is(active: Option<&ActivePowerUp>, kind: PowerUpKind) -> bool {
    active.is_some_and(|a| a.is(kind))
}

/// Something the renderer or audio layer may want to react to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    Paused,
    Resumed,
    FoodEaten { cell: Cell, points: u32 },
    FoodSpawned { cell: Cell },
    PowerUpSpawned { cell: Cell, kind: PowerUpKind },
    /// An uncollected power-up timed out and was swapped for food
    PowerUpDespawned { kind: PowerUpKind },
    PowerUpCollected { cell: Cell, kind: PowerUpKind },
    /// `source` is `MysteryBox` when the effect came out of one
    PowerUpActivated { kind: PowerUpKind, source: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    FoodPulled { from: Cell, to: Cell },
    GameOver { reason: GameOverReason, score: u32 },
}

/// Complete game snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Body, head first
    pub snake: Vec<Cell>,
    pub food: Option<Cell>,
    pub power_up: Option<SpawnedPowerUp>,
    pub active_power_up: Option<ActivePowerUp>,
    pub direction: Direction,
    pub score: u32,
    pub phase: GamePhase,
    /// Last user-facing message
    pub message: Option<String>,
    /// Ticks processed since init
    pub tick_count: u64,
    /// Pending events (not part of the serialized snapshot)
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Fresh idle state: 3-segment snake centered on the grid, heading right
    pub fn new(grid: &Grid) -> Self {
        Self {
            snake: initial_snake(grid),
            food: None,
            power_up: None,
            active_power_up: None,
            direction: Direction::Right,
            score: 0,
            phase: GamePhase::Idle,
            message: None,
            tick_count: 0,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn head(&self) -> Cell {
        self.snake[0]
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::Over { .. })
    }

    pub fn is_game_started(&self) -> bool {
        matches!(self.phase, GamePhase::Running | GamePhase::Paused { .. })
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.snake.contains(&cell)
    }

    pub fn active_kind(&self) -> Option<PowerUpKind> {
        self.active_power_up.map(|a| a.kind)
    }

    /// End the run with the given reason
    pub fn finish(&mut self, reason: GameOverReason) {
        self.phase = GamePhase::Over { reason };
        self.message = Some(match reason {
            GameOverReason::BoardFull => format!("Board full! Final score: {}", self.score),
            _ => format!("Game over! Final score: {}", self.score),
        });
        self.events.push(GameEvent::GameOver {
            reason,
            score: self.score,
        });
        log::info!("Game over ({:?}), score {}", reason, self.score);
    }
}

/// Starting body: horizontal line ending at the center, head on the right
pub fn initial_snake(grid: &Grid) -> Vec<Cell> {
    let center = grid.center();
    (1..=INITIAL_SNAKE_LEN as i32)
        .map(|i| center - IVec2::new(i * grid.cell_size, 0))
        .collect()
}
