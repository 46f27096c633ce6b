//! Discrete simulation tick
//!
//! Advances the game state by one step: move, consume, collide, refill.
//! Pure with respect to time and randomness: the caller supplies the clock
//! reading and the RNG, so identical inputs give identical runs.

use glam::IVec2;
use rand::Rng;

use super::collision::{compute_next_head, detect_collision};
use super::grid::{Cell, Grid};
use super::powerup::{PowerUpKind, PowerUpRegistry};
use super::scheduler::Millis;
use super::spawn::{SpawnDecision, decide_spawn, place_collectible};
use super::state::{
    ActivePowerUp, GameEvent, GameOverReason, GamePhase, GameState, SpawnedPowerUp, active_is,
};
use crate::config::GameConfig;
use crate::signum;

/// Everything a tick reads besides the state itself
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub grid: &'a Grid,
    pub registry: &'a PowerUpRegistry,
    pub config: &'a GameConfig,
    /// Current scheduler time
    pub now: Millis,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing changed
    Skipped,
    Moved,
    AteFood { points: u32 },
    CollectedPowerUp { kind: PowerUpKind },
    /// Run ended this tick
    Ended(GameOverReason),
}

/// Advance the game state by one step
pub fn tick<R: Rng + ?Sized>(state: &mut GameState, ctx: &TickContext, rng: &mut R) -> TickOutcome {
    if state.phase != GamePhase::Running {
        return TickOutcome::Skipped;
    }
    state.tick_count += 1;

    if let Err(reason) = despawn_stale_power_up(state, ctx, rng) {
        state.finish(reason);
        return TickOutcome::Ended(reason);
    }

    let old_len = state.snake.len();
    let head = compute_next_head(
        ctx.grid,
        state.head(),
        state.direction,
        state.active_power_up.as_ref(),
    );

    // Collectible hit is resolved on the candidate before the collision check
    let ate_food = state.food == Some(head);
    let hit_power_up = state.power_up.filter(|p| p.cell == head);

    // Food grows the snake; everything else pops the tail
    let keep = if ate_food { old_len } else { old_len - 1 };
    let mut candidate = Vec::with_capacity(keep + 1);
    candidate.push(head);
    candidate.extend_from_slice(&state.snake[..keep]);

    let mut outcome = TickOutcome::Moved;
    if ate_food {
        let points = food_points(state.active_power_up.as_ref(), ctx);
        state.food = None;
        state.score += points;
        state.events.push(GameEvent::FoodEaten { cell: head, points });
        log::debug!("Food eaten at ({}, {}), score {}", head.x, head.y, state.score);
        outcome = TickOutcome::AteFood { points };
    } else if let Some(picked) = hit_power_up {
        state.power_up = None;
        state.events.push(GameEvent::PowerUpCollected {
            cell: head,
            kind: picked.kind,
        });
        apply_power_up_effect(state, picked.kind, ctx, rng);
        outcome = TickOutcome::CollectedPowerUp { kind: picked.kind };
    }

    if let Some(collision) = detect_collision(ctx.grid, &candidate, state.active_power_up.as_ref()) {
        // Snake stays at its pre-collision body
        let reason = collision.into();
        state.finish(reason);
        return TickOutcome::Ended(reason);
    }
    state.snake = candidate;

    if outcome != TickOutcome::Moved {
        if let Err(reason) = refill(state, ctx, rng) {
            state.finish(reason);
            return TickOutcome::Ended(reason);
        }
    }

    outcome
}

/// Points for one food item under the active power-up
pub fn food_points(active: Option<&ActivePowerUp>, ctx: &TickContext) -> u32 {
    let multiplier = active.map_or(1, |a| ctx.registry.get(a.kind).score_multiplier);
    ctx.config.food_points * multiplier
}

/// Apply a collected (or programmatically triggered) power-up
///
/// Timed effects replace the active power-up outright; instant effects are
/// applied once and leave the active one alone. Returns the kind whose effect
/// was applied, which differs from `kind` only for mystery boxes.
pub fn apply_power_up_effect<R: Rng + ?Sized>(
    state: &mut GameState,
    kind: PowerUpKind,
    ctx: &TickContext,
    rng: &mut R,
) -> PowerUpKind {
    let resolved = if kind == PowerUpKind::MysteryBox {
        ctx.registry.resolve_mystery(rng)
    } else {
        kind
    };
    let spec = ctx.registry.get(resolved);

    if resolved == PowerUpKind::GoldenApple {
        state.score += ctx.config.golden_apple_bonus;
    } else if !spec.is_instant() {
        if let Some(previous) = state.active_power_up {
            log::debug!("{} replaces {}", resolved, previous.kind);
        }
        state.active_power_up = Some(ActivePowerUp {
            kind: resolved,
            started_at: ctx.now,
            expires_at: ctx.now + spec.duration_ms,
            instant: false,
        });
    }

    state.message = Some(spec.message.clone());
    state.events.push(GameEvent::PowerUpActivated {
        kind: resolved,
        source: kind,
    });
    log::info!("Power-up {} activated (from {})", resolved, kind);
    resolved
}

/// Clear the active power-up if it has run out by `now`
///
/// Returns the expired kind. Safe to call from a stale timer: an effect that
/// was replaced in the meantime has a later deadline and is left alone.
pub fn expire_power_up(state: &mut GameState, registry: &PowerUpRegistry, now: Millis) -> Option<PowerUpKind> {
    let active = state.active_power_up?;
    if active.expires_at > now {
        return None;
    }
    state.active_power_up = None;
    state.message = Some(registry.get(active.kind).expiry_message());
    state.events.push(GameEvent::PowerUpExpired { kind: active.kind });
    log::info!("Power-up {} expired", active.kind);
    Some(active.kind)
}

/// Drift food one cell toward the head (magnet power-up)
///
/// Moves along the axis with the larger offset first, falling back to the
/// other axis if that cell is taken. Returns the new cell if the food moved.
pub fn pull_food(state: &mut GameState, grid: &Grid) -> Option<Cell> {
    if !state.is_running() || !active_is(state.active_power_up.as_ref(), PowerUpKind::MagnetHead) {
        return None;
    }
    let food = state.food?;
    let offset = state.head() - food;
    let step = signum(offset) * grid.cell_size;
    let along_x = food + IVec2::new(step.x, 0);
    let along_y = food + IVec2::new(0, step.y);
    let candidates = if offset.x.abs() >= offset.y.abs() {
        [along_x, along_y]
    } else {
        [along_y, along_x]
    };

    let power_up = state.power_up.map(|p| p.cell);
    let target = candidates
        .into_iter()
        .find(|&cell| cell != food && !state.occupies(cell) && Some(cell) != power_up)?;

    state.food = Some(target);
    state.events.push(GameEvent::FoodPulled { from: food, to: target });
    Some(target)
}

/// Put exactly one new collectible on the board
pub fn refill<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &TickContext,
    rng: &mut R,
) -> Result<(), GameOverReason> {
    match decide_spawn(rng, ctx.registry) {
        SpawnDecision::Food => spawn_food(state, ctx, rng),
        SpawnDecision::PowerUp(kind) => {
            let cell = free_cell(state, ctx, rng)?;
            state.power_up = Some(SpawnedPowerUp {
                cell,
                kind,
                expires_at: ctx.now + ctx.config.spawned_power_up_lifetime_ms,
                instant: ctx.registry.get(kind).is_instant(),
            });
            state.events.push(GameEvent::PowerUpSpawned { cell, kind });
            log::debug!("Power-up {} spawned at ({}, {})", kind, cell.x, cell.y);
            Ok(())
        }
    }
}

/// Place food on a free cell
pub fn spawn_food<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &TickContext,
    rng: &mut R,
) -> Result<(), GameOverReason> {
    let cell = free_cell(state, ctx, rng)?;
    state.food = Some(cell);
    state.events.push(GameEvent::FoodSpawned { cell });
    Ok(())
}

fn free_cell<R: Rng + ?Sized>(
    state: &GameState,
    ctx: &TickContext,
    rng: &mut R,
) -> Result<Cell, GameOverReason> {
    place_collectible(
        ctx.grid,
        rng,
        &state.snake,
        state.food,
        state.power_up.map(|p| p.cell),
        ctx.config.placement_retries,
    )
    .ok_or(GameOverReason::BoardFull)
}

/// Swap an uncollected power-up that outlived its board time for food
fn despawn_stale_power_up<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &TickContext,
    rng: &mut R,
) -> Result<(), GameOverReason> {
    let Some(spawned) = state.power_up else {
        return Ok(());
    };
    if spawned.expires_at > ctx.now {
        return Ok(());
    }
    state.power_up = None;
    state.events.push(GameEvent::PowerUpDespawned { kind: spawned.kind });
    log::debug!("Power-up {} despawned", spawned.kind);
    spawn_food(state, ctx, rng)
}

/// Push every absolute deadline back by `paused_for` ms
pub fn shift_deadlines(state: &mut GameState, paused_for: Millis) {
    if let Some(active) = state.active_power_up.as_mut() {
        active.started_at += paused_for;
        active.expires_at += paused_for;
    }
    if let Some(spawned) = state.power_up.as_mut() {
        spawned.expires_at += paused_for;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Fixture {
        grid: Grid,
        registry: PowerUpRegistry,
        config: GameConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let config = GameConfig::seeded(1);
            Self {
                grid: config.grid().unwrap(),
                registry: config.registry().unwrap(),
                config,
            }
        }

        fn ctx(&self, now: Millis) -> TickContext<'_> {
            TickContext {
                grid: &self.grid,
                registry: &self.registry,
                config: &self.config,
                now,
            }
        }

        fn running(&self) -> GameState {
            let mut state = GameState::new(&self.grid);
            state.phase = GamePhase::Running;
            state
        }
    }

    fn timed(kind: PowerUpKind) -> ActivePowerUp {
        ActivePowerUp {
            kind,
            started_at: 0,
            expires_at: 10_000,
            instant: false,
        }
    }

    #[test]
    fn test_plain_move_keeps_length() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.food = Some(IVec2::new(0, 0));
        let mut rng = Pcg32::seed_from_u64(1);

        let outcome = tick(&mut state, &fx.ctx(150), &mut rng);
        assert_eq!(outcome, TickOutcome::Moved);
        assert_eq!(
            state.snake,
            vec![IVec2::new(200, 200), IVec2::new(180, 200), IVec2::new(160, 200)]
        );
        assert_eq!(state.score, 0);
        assert_eq!(state.food, Some(IVec2::new(0, 0)));
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let fx = Fixture::new();
        let mut state = GameState::new(&fx.grid);
        let before = state.clone();
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(tick(&mut state, &fx.ctx(0), &mut rng), TickOutcome::Skipped);
        assert_eq!(state, before);
    }

    #[test]
    fn test_food_grows_and_scores() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.food = Some(IVec2::new(200, 200));
        let mut rng = Pcg32::seed_from_u64(2);

        let outcome = tick(&mut state, &fx.ctx(150), &mut rng);
        assert_eq!(outcome, TickOutcome::AteFood { points: 1 });
        assert_eq!(state.snake.len(), 4);
        assert_eq!(state.head(), IVec2::new(200, 200));
        assert_eq!(state.score, 1);
        // Exactly one collectible refilled, off the snake
        assert!(state.food.is_some() ^ state.power_up.is_some());
        let refill_cell = state.food.or(state.power_up.map(|p| p.cell)).unwrap();
        assert!(!state.occupies(refill_cell));
    }

    #[test]
    fn test_double_score_and_snail_double_food() {
        let fx = Fixture::new();
        for kind in [PowerUpKind::DoubleScore, PowerUpKind::SnailTime] {
            let mut state = fx.running();
            state.active_power_up = Some(timed(kind));
            state.food = Some(IVec2::new(200, 200));
            let mut rng = Pcg32::seed_from_u64(3);
            assert_eq!(
                tick(&mut state, &fx.ctx(150), &mut rng),
                TickOutcome::AteFood { points: 2 }
            );
            assert_eq!(state.score, 2);
        }
    }

    #[test]
    fn test_power_up_pickup_does_not_grow() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.power_up = Some(SpawnedPowerUp {
            cell: IVec2::new(200, 200),
            kind: PowerUpKind::SpeedBoost,
            expires_at: 10_000,
            instant: false,
        });
        let mut rng = Pcg32::seed_from_u64(4);

        let outcome = tick(&mut state, &fx.ctx(150), &mut rng);
        assert_eq!(outcome, TickOutcome::CollectedPowerUp { kind: PowerUpKind::SpeedBoost });
        assert_eq!(state.snake.len(), 3);
        let active = state.active_power_up.unwrap();
        assert_eq!(active.kind, PowerUpKind::SpeedBoost);
        assert_eq!(active.started_at, 150);
        assert_eq!(active.expires_at, 6_150);
        assert_eq!(state.message.as_deref(), Some("Speed boost!"));
        assert!(state.food.is_some() ^ state.power_up.is_some());
    }

    #[test]
    fn test_golden_apple_is_instant() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.active_power_up = Some(timed(PowerUpKind::MagnetHead));
        state.power_up = Some(SpawnedPowerUp {
            cell: IVec2::new(200, 200),
            kind: PowerUpKind::GoldenApple,
            expires_at: 10_000,
            instant: true,
        });
        let mut rng = Pcg32::seed_from_u64(5);
        tick(&mut state, &fx.ctx(150), &mut rng);
        assert_eq!(state.score, 5);
        assert_eq!(state.snake.len(), 3);
        // The running magnet effect survives
        assert_eq!(state.active_kind(), Some(PowerUpKind::MagnetHead));
    }

    #[test]
    fn test_wall_collision_freezes_snake() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.snake = vec![IVec2::new(380, 200), IVec2::new(360, 200), IVec2::new(340, 200)];
        state.score = 7;
        let before = state.snake.clone();
        let mut rng = Pcg32::seed_from_u64(6);

        let outcome = tick(&mut state, &fx.ctx(150), &mut rng);
        assert_eq!(outcome, TickOutcome::Ended(GameOverReason::WallCollision));
        assert_eq!(state.snake, before);
        assert!(state.is_game_over());
        assert_eq!(state.score, 7);
        assert_eq!(state.message.as_deref(), Some("Game over! Final score: 7"));

        // Over is terminal for ticks
        assert_eq!(tick(&mut state, &fx.ctx(300), &mut rng), TickOutcome::Skipped);
    }

    #[test]
    fn test_ghost_wraps_through_wall() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.active_power_up = Some(timed(PowerUpKind::GhostTime));
        state.snake = vec![IVec2::new(380, 200), IVec2::new(360, 200), IVec2::new(340, 200)];
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(tick(&mut state, &fx.ctx(150), &mut rng), TickOutcome::Moved);
        assert_eq!(state.head(), IVec2::new(0, 200));
    }

    #[test]
    fn test_self_collision() {
        let fx = Fixture::new();
        let mut state = fx.running();
        // Head at (100,100) turning down into its own body
        state.snake = vec![
            IVec2::new(100, 100),
            IVec2::new(120, 100),
            IVec2::new(120, 120),
            IVec2::new(100, 120),
            IVec2::new(80, 120),
        ];
        state.direction = crate::sim::Direction::Down;
        let mut rng = Pcg32::seed_from_u64(8);
        assert_eq!(
            tick(&mut state, &fx.ctx(150), &mut rng),
            TickOutcome::Ended(GameOverReason::SelfCollision)
        );
    }

    #[test]
    fn test_chasing_own_tail_is_safe() {
        let fx = Fixture::new();
        let mut state = fx.running();
        // 2x2 loop: the head moves into the cell the tail leaves
        state.snake = vec![
            IVec2::new(100, 100),
            IVec2::new(120, 100),
            IVec2::new(120, 120),
            IVec2::new(100, 120),
        ];
        state.direction = crate::sim::Direction::Down;
        let mut rng = Pcg32::seed_from_u64(9);
        assert_eq!(tick(&mut state, &fx.ctx(150), &mut rng), TickOutcome::Moved);
    }

    #[test]
    fn test_board_full_ends_game() {
        let config = GameConfig {
            width: 120,
            height: 20,
            ..GameConfig::seeded(1)
        };
        let grid = config.grid().unwrap();
        let registry = config.registry().unwrap();
        let ctx = TickContext {
            grid: &grid,
            registry: &registry,
            config: &config,
            now: 0,
        };
        let mut state = GameState::new(&grid);
        state.phase = GamePhase::Running;
        state.direction = crate::sim::Direction::Left;
        // Snake fills five of six cells heading left, food on the last one
        state.snake = (1..6).map(|c| grid.cell_at(c, 0)).collect();
        state.food = Some(grid.cell_at(0, 0));
        let mut rng = Pcg32::seed_from_u64(10);

        assert_eq!(tick(&mut state, &ctx, &mut rng), TickOutcome::Ended(GameOverReason::BoardFull));
        assert_eq!(state.snake.len(), 6);
        assert_eq!(state.score, 1);
        assert_eq!(state.message.as_deref(), Some("Board full! Final score: 1"));
    }

    #[test]
    fn test_stale_spawned_power_up_becomes_food() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.power_up = Some(SpawnedPowerUp {
            cell: IVec2::new(0, 0),
            kind: PowerUpKind::GhostTime,
            expires_at: 1_000,
            instant: false,
        });
        let mut rng = Pcg32::seed_from_u64(11);
        tick(&mut state, &fx.ctx(999), &mut rng);
        assert!(state.power_up.is_some());
        tick(&mut state, &fx.ctx(1_000), &mut rng);
        assert!(state.power_up.is_none());
        assert!(state.food.is_some());
        assert!(state.events.contains(&GameEvent::PowerUpDespawned {
            kind: PowerUpKind::GhostTime
        }));
    }

    #[test]
    fn test_mystery_box_resolves_to_concrete_kind() {
        let fx = Fixture::new();
        let mut rng = Pcg32::seed_from_u64(12);
        for _ in 0..100 {
            let mut state = fx.running();
            let resolved = apply_power_up_effect(&mut state, PowerUpKind::MysteryBox, &fx.ctx(0), &mut rng);
            assert_ne!(resolved, PowerUpKind::MysteryBox);
            assert_ne!(state.active_kind(), Some(PowerUpKind::MysteryBox));
            assert_eq!(state.message.as_ref(), Some(&fx.registry.get(resolved).message));
        }
    }

    #[test]
    fn test_last_collected_wins() {
        let fx = Fixture::new();
        let mut state = fx.running();
        let mut rng = Pcg32::seed_from_u64(13);
        apply_power_up_effect(&mut state, PowerUpKind::SnailTime, &fx.ctx(0), &mut rng);
        apply_power_up_effect(&mut state, PowerUpKind::GhostTime, &fx.ctx(1_000), &mut rng);
        let active = state.active_power_up.unwrap();
        assert_eq!(active.kind, PowerUpKind::GhostTime);
        assert_eq!(active.expires_at, 9_000);
    }

    #[test]
    fn test_expire_ignores_replaced_effect() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.active_power_up = Some(timed(PowerUpKind::DoubleScore));
        assert_eq!(expire_power_up(&mut state, &fx.registry, 9_999), None);
        assert_eq!(expire_power_up(&mut state, &fx.registry, 10_000), Some(PowerUpKind::DoubleScore));
        assert!(state.active_power_up.is_none());
        assert_eq!(state.message.as_deref(), Some("doubleScore wore off"));
        assert_eq!(expire_power_up(&mut state, &fx.registry, 20_000), None);
    }

    #[test]
    fn test_magnet_pulls_along_larger_axis() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.active_power_up = Some(timed(PowerUpKind::MagnetHead));
        // Head at (180,200); food 4 cells right, 1 cell down
        state.food = Some(IVec2::new(260, 220));
        assert_eq!(pull_food(&mut state, &fx.grid), Some(IVec2::new(240, 220)));
        state.food = Some(IVec2::new(200, 300));
        assert_eq!(pull_food(&mut state, &fx.grid), Some(IVec2::new(200, 280)));
    }

    #[test]
    fn test_magnet_stops_beside_snake() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.active_power_up = Some(timed(PowerUpKind::MagnetHead));
        state.food = Some(IVec2::new(200, 200));
        // Only move left would land on the head
        assert_eq!(pull_food(&mut state, &fx.grid), None);
        assert_eq!(state.food, Some(IVec2::new(200, 200)));
    }

    #[test]
    fn test_magnet_requires_effect() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.food = Some(IVec2::new(300, 200));
        assert_eq!(pull_food(&mut state, &fx.grid), None);
    }

    #[test]
    fn test_shift_deadlines() {
        let fx = Fixture::new();
        let mut state = fx.running();
        state.active_power_up = Some(timed(PowerUpKind::BlackoutMode));
        state.power_up = Some(SpawnedPowerUp {
            cell: IVec2::ZERO,
            kind: PowerUpKind::GoldenApple,
            expires_at: 5_000,
            instant: true,
        });
        shift_deadlines(&mut state, 2_000);
        assert_eq!(state.active_power_up.unwrap().expires_at, 12_000);
        assert_eq!(state.active_power_up.unwrap().started_at, 2_000);
        assert_eq!(state.power_up.unwrap().expires_at, 7_000);
    }

    proptest! {
        #[test]
        fn random_runs_keep_length_invariants(seed in any::<u64>(), turns in prop::collection::vec(0usize..4, 1..60)) {
            let fx = Fixture::new();
            let mut state = fx.running();
            let mut rng = Pcg32::seed_from_u64(seed);
            spawn_food(&mut state, &fx.ctx(0), &mut rng).unwrap();

            for (i, t) in turns.into_iter().enumerate() {
                let dir = crate::sim::Direction::ALL[t];
                if !dir.is_opposite(state.direction) {
                    state.direction = dir;
                }
                let old_len = state.snake.len();
                let old_head = state.head();
                let was_ghost = state.active_kind() == Some(PowerUpKind::GhostTime);
                let step = state.direction.delta() * fx.grid.cell_size;
                let now = (i as u64 + 1) * 150;
                match tick(&mut state, &fx.ctx(now), &mut rng) {
                    TickOutcome::Moved | TickOutcome::CollectedPowerUp { .. } => {
                        prop_assert_eq!(state.snake.len(), old_len);
                        if !was_ghost {
                            prop_assert_eq!(state.head(), old_head + step);
                        }
                    }
                    TickOutcome::AteFood { .. } => prop_assert_eq!(state.snake.len(), old_len + 1),
                    TickOutcome::Ended(_) => {
                        prop_assert_eq!(state.snake.len(), old_len);
                        break;
                    }
                    TickOutcome::Skipped => prop_assert!(false, "running game skipped a tick"),
                }
                // One collectible at a time
                prop_assert!(!(state.food.is_some() && state.power_up.is_some()));
            }
        }
    }
}
