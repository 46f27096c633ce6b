//! Movement and collision rules
//!
//! Ghost mode changes both halves: the head wraps at the edges instead of
//! leaving the board, and no collision is ever reported.

use super::grid::{Cell, Grid};
use super::powerup::PowerUpKind;
use super::state::{ActivePowerUp, Direction, GameOverReason, active_is};

/// Kind of collision a candidate snake ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Wall,
    SelfBite,
}

impl From<CollisionKind> for GameOverReason {
    fn from(kind: CollisionKind) -> Self {
        match kind {
            CollisionKind::Wall => GameOverReason::WallCollision,
            CollisionKind::SelfBite => GameOverReason::SelfCollision,
        }
    }
}

/// Head position after one step in `direction`
///
/// Only wrapped under ghost mode; otherwise the result may be off the board
/// and is caught by [`detect_collision`].
pub fn compute_next_head(
    grid: &Grid,
    head: Cell,
    direction: Direction,
    active: Option<&ActivePowerUp>,
) -> Cell {
    let next = head + direction.delta() * grid.cell_size;
    if active_is(active, PowerUpKind::GhostTime) {
        grid.wrap(next)
    } else {
        next
    }
}

/// Collision check on a candidate body (head first)
///
/// Wall is checked before self; the first hit wins.
pub fn detect_collision(
    grid: &Grid,
    snake: &[Cell],
    active: Option<&ActivePowerUp>,
) -> Option<CollisionKind> {
    if active_is(active, PowerUpKind::GhostTime) {
        return None;
    }
    let (&head, body) = snake.split_first()?;
    if !grid.in_bounds(head) {
        return Some(CollisionKind::Wall);
    }
    if body.contains(&head) {
        return Some(CollisionKind::SelfBite);
    }
    None
}

/// `true` if the candidate snake collides
#[inline]
pub fn check_collision(grid: &Grid, snake: &[Cell], active: Option<&ActivePowerUp>) -> bool {
    detect_collision(grid, snake, active).is_some()
}
