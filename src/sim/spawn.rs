//! Collectible placement
//!
//! Picks free cells for food and power-ups, and decides which of the two
//! spawns next.

use rand::Rng;

use super::grid::{Cell, Grid};
use super::powerup::{PowerUpKind, PowerUpRegistry};

/// What to put on the board next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDecision {
    Food,
    PowerUp(PowerUpKind),
}

/// Choose food or a power-up
///
/// A candidate kind is drawn uniformly, then it spawns with probability
/// `spawn_weight / 100`; otherwise food spawns. This is not the same as
/// weighted sampling over kinds.
pub fn decide_spawn<R: Rng + ?Sized>(rng: &mut R, registry: &PowerUpRegistry) -> SpawnDecision {
    let candidate = registry.random_kind(rng);
    let chance = f64::from(registry.get(candidate).spawn_weight) / 100.0;
    if rng.random_bool(chance) {
        SpawnDecision::PowerUp(candidate)
    } else {
        SpawnDecision::Food
    }
}

/// Find a free cell for a new collectible
///
/// Rejection-samples up to `retries` random cells, then falls back to a scan
/// of every free cell. Returns `None` only when the board has no free cell.
pub fn place_collectible<R: Rng + ?Sized>(
    grid: &Grid,
    rng: &mut R,
    snake: &[Cell],
    food: Option<Cell>,
    power_up: Option<Cell>,
    retries: u32,
) -> Option<Cell> {
    let blocked = |cell: Cell| snake.contains(&cell) || food == Some(cell) || power_up == Some(cell);

    for _ in 0..retries {
        let cell = grid.random_cell(rng);
        if !blocked(cell) {
            return Some(cell);
        }
    }

    log::warn!(
        "Placement gave up after {} random tries, scanning {} cells",
        retries,
        grid.capacity()
    );
    let free: Vec<Cell> = grid.cells().filter(|&cell| !blocked(cell)).collect();
    if free.is_empty() {
        return None;
    }
    Some(free[rng.random_range(0..free.len())])
}
