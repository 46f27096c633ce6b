//! Deterministic simulation module
//!
//! All gameplay rules live here. This module must stay pure and deterministic:
//! - Time comes from the injected scheduler only
//! - Seeded RNG only
//! - No rendering, input or platform dependencies

pub mod collision;
pub mod game;
pub mod grid;
pub mod powerup;
pub mod scheduler;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{CollisionKind, check_collision, compute_next_head, detect_collision};
pub use game::Game;
pub use grid::{Cell, Grid};
pub use powerup::{PowerUpKind, PowerUpRegistry, PowerUpSpec};
pub use scheduler::{Fired, Millis, Scheduler, TimerEvent, TimerHandle, TimerQueue};
pub use spawn::{SpawnDecision, decide_spawn, place_collectible};
pub use state::{
    ActivePowerUp, Direction, GameEvent, GameOverReason, GamePhase, GameState, SpawnedPowerUp,
};
pub use tick::{TickContext, TickOutcome, tick};
