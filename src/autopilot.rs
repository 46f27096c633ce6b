//! Demo-mode steering
//!
//! A greedy bot for attract screens and the headless demo: head for the live
//! collectible, never pick a move that collides on the next step, and prefer
//! moves that keep more of the board reachable.

use std::collections::{HashSet, VecDeque};

use crate::manhattan;
use crate::sim::collision::{check_collision, compute_next_head};
use crate::sim::grid::{Cell, Grid};
use crate::sim::state::{Direction, GameState};

/// Pick the next direction, or `None` to keep going straight
pub fn choose_direction(state: &GameState, grid: &Grid) -> Option<Direction> {
    let target = state.food.or(state.power_up.map(|p| p.cell))?;
    let active = state.active_power_up.as_ref();
    let keep = state.snake.len() - 1;

    let best = Direction::ALL
        .into_iter()
        .filter(|d| !d.is_opposite(state.direction))
        .filter_map(|d| {
            let head = compute_next_head(grid, state.head(), d, active);
            let mut candidate = Vec::with_capacity(state.snake.len());
            candidate.push(head);
            candidate.extend_from_slice(&state.snake[..keep]);
            if check_collision(grid, &candidate, active) {
                return None;
            }
            let room = reachable_cells(grid, &candidate);
            Some((d, room, manhattan(head, target)))
        })
        // Enough room first, then distance to the target
        .min_by_key(|&(_, room, dist)| (room < state.snake.len(), dist))
        .map(|(d, _, _)| d)?;

    (best != state.direction).then_some(best)
}

/// Free cells reachable from the head of `snake`, capped at the body length
fn reachable_cells(grid: &Grid, snake: &[Cell]) -> usize {
    let limit = snake.len();
    let blocked: HashSet<Cell> = snake.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([snake[0]]);

    while let Some(cell) = queue.pop_front() {
        for d in Direction::ALL {
            let next = cell + d.delta() * grid.cell_size;
            if grid.in_bounds(next) && !blocked.contains(&next) && seen.insert(next) {
                if seen.len() >= limit {
                    return seen.len();
                }
                queue.push_back(next);
            }
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GamePhase;
    use glam::IVec2;

    fn setup() -> (Grid, GameState) {
        let grid = Grid::new(400, 400, 20).unwrap();
        let mut state = GameState::new(&grid);
        state.phase = GamePhase::Running;
        (grid, state)
    }

    #[test]
    fn test_heads_for_food() {
        let (grid, mut state) = setup();
        state.food = Some(IVec2::new(180, 40));
        assert_eq!(choose_direction(&state, &grid), Some(Direction::Up));
    }

    #[test]
    fn test_keeps_straight_when_aligned() {
        let (grid, mut state) = setup();
        state.food = Some(IVec2::new(300, 200));
        assert_eq!(choose_direction(&state, &grid), None);
    }

    #[test]
    fn test_avoids_wall() {
        let (grid, mut state) = setup();
        state.snake = vec![IVec2::new(380, 200), IVec2::new(360, 200), IVec2::new(340, 200)];
        // Food is behind; going straight would hit the wall
        state.food = Some(IVec2::new(0, 200));
        let turn = choose_direction(&state, &grid).unwrap();
        assert!(matches!(turn, Direction::Up | Direction::Down));
    }

    #[test]
    fn test_no_target_no_turn() {
        let (grid, state) = setup();
        assert_eq!(choose_direction(&state, &grid), None);
    }
}
