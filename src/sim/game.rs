//! Game lifecycle and timer ownership
//!
//! [`Game`] wraps the pure tick with the lifecycle (idle, running, paused,
//! over), input validation and the three timers that drive it: the main tick,
//! the magnet pull and the power-up expiry. After every command or callback
//! the armed timers are reconciled against what the current state needs.

use std::collections::HashSet;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::check_collision;
use super::grid::{Cell, Grid};
use super::powerup::{PowerUpKind, PowerUpRegistry};
use super::scheduler::{Fired, Millis, Scheduler, TimerEvent, TimerHandle};
use super::state::{Direction, GameEvent, GamePhase, GameState, active_is};
use super::tick::{self, TickContext, TickOutcome};
use crate::config::GameConfig;
use crate::error::ConfigError;

/// Timers currently armed on the scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ActiveTimers {
    /// Main tick and its period
    tick: Option<(TimerHandle, Duration)>,
    magnet: Option<TimerHandle>,
    /// Expiry one-shot and its deadline
    expiry: Option<(TimerHandle, Millis)>,
}

impl ActiveTimers {
    fn cancel_all<S: Scheduler + ?Sized>(&mut self, sched: &mut S) {
        if let Some((handle, _)) = self.tick.take() {
            sched.cancel(handle);
        }
        if let Some(handle) = self.magnet.take() {
            sched.cancel(handle);
        }
        if let Some((handle, _)) = self.expiry.take() {
            sched.cancel(handle);
        }
    }

    fn owns(&self, fired: &Fired) -> bool {
        match fired.event {
            TimerEvent::Tick => self.tick.is_some_and(|(h, _)| h == fired.handle),
            TimerEvent::MagnetPull => self.magnet == Some(fired.handle),
            TimerEvent::PowerUpExpiry => self.expiry.is_some_and(|(h, _)| h == fired.handle),
        }
    }
}

/// The authoritative game: state, rules, RNG and timers
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    grid: Grid,
    registry: PowerUpRegistry,
    rng: Pcg32,
    state: GameState,
    timers: ActiveTimers,
    /// Set by the first accepted turn of a tick
    turn_latched: bool,
}

impl Game {
    /// Build a game in the idle state. Fails on an invalid config.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = config.grid()?;
        let registry = config.registry()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        log::info!(
            "New game: {}x{} cells, seed {}",
            grid.columns(),
            grid.rows(),
            seed
        );

        let mut game = Self {
            state: GameState::new(&grid),
            config,
            grid,
            registry,
            rng: Pcg32::seed_from_u64(seed),
            timers: ActiveTimers::default(),
            turn_latched: false,
        };
        game.reset(0);
        Ok(game)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &PowerUpRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Take pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Any state -> idle, with a fresh board
    pub fn init_game<S: Scheduler + ?Sized>(&mut self, sched: &mut S) {
        self.timers.cancel_all(sched);
        self.reset(sched.now());
        log::info!("Game reset");
    }

    /// Idle -> running (paused -> running as a resume)
    pub fn start_game<S: Scheduler + ?Sized>(&mut self, sched: &mut S) -> bool {
        match self.state.phase {
            GamePhase::Idle => {
                self.state.phase = GamePhase::Running;
                self.state.message = None;
                self.state.events.push(GameEvent::Started);
                log::info!("Game started");
                self.sync_timers(sched);
                true
            }
            GamePhase::Paused { .. } => self.resume(sched),
            GamePhase::Running | GamePhase::Over { .. } => false,
        }
    }

    /// Request a turn. Returns whether it was accepted.
    ///
    /// Rejected silently: reversing into the body, a second turn in the same
    /// tick, and any input while paused or over. A valid input while idle
    /// starts the game.
    pub fn change_direction<S: Scheduler + ?Sized>(&mut self, direction: Direction, sched: &mut S) -> bool {
        match self.state.phase {
            GamePhase::Idle => {
                if self.is_reversal(direction) {
                    return false;
                }
                self.state.direction = direction;
                self.turn_latched = true;
                self.start_game(sched)
            }
            GamePhase::Running => {
                if self.turn_latched || self.is_reversal(direction) || direction == self.state.direction {
                    return false;
                }
                self.state.direction = direction;
                self.turn_latched = true;
                true
            }
            GamePhase::Paused { .. } | GamePhase::Over { .. } => false,
        }
    }

    /// [`Game::change_direction`] from an arrow key code; other keys are ignored
    pub fn handle_key<S: Scheduler + ?Sized>(&mut self, key_code: u32, sched: &mut S) -> bool {
        Direction::from_key_code(key_code).is_some_and(|d| self.change_direction(d, sched))
    }

    /// Running -> paused
    pub fn pause<S: Scheduler + ?Sized>(&mut self, sched: &mut S) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.state.phase = GamePhase::Paused { since: sched.now() };
        self.state.events.push(GameEvent::Paused);
        self.sync_timers(sched);
        log::info!("Game paused");
        true
    }

    /// Paused -> running; power-up clocks do not advance while paused
    pub fn resume<S: Scheduler + ?Sized>(&mut self, sched: &mut S) -> bool {
        let GamePhase::Paused { since } = self.state.phase else {
            return false;
        };
        tick::shift_deadlines(&mut self.state, sched.now().saturating_sub(since));
        self.state.phase = GamePhase::Running;
        self.state.events.push(GameEvent::Resumed);
        self.sync_timers(sched);
        log::info!("Game resumed");
        true
    }

    pub fn toggle_pause<S: Scheduler + ?Sized>(&mut self, sched: &mut S) -> bool {
        match self.state.phase {
            GamePhase::Running => self.pause(sched),
            GamePhase::Paused { .. } => self.resume(sched),
            _ => false,
        }
    }

    /// Apply a power-up directly, as if collected. Ignored once the game is over.
    pub fn activate_power_up<S: Scheduler + ?Sized>(
        &mut self,
        kind: PowerUpKind,
        sched: &mut S,
    ) -> Option<PowerUpKind> {
        if self.state.is_game_over() {
            return None;
        }
        // While paused the effect starts at the pause instant; resume shifts it to now
        let now = match self.state.phase {
            GamePhase::Paused { since } => since,
            _ => sched.now(),
        };
        let ctx = TickContext {
            grid: &self.grid,
            registry: &self.registry,
            config: &self.config,
            now,
        };
        let resolved = tick::apply_power_up_effect(&mut self.state, kind, &ctx, &mut self.rng);
        self.sync_timers(sched);
        Some(resolved)
    }

    /// Run one tick now (normally driven by the tick timer)
    pub fn tick<S: Scheduler + ?Sized>(&mut self, sched: &mut S) -> TickOutcome {
        self.turn_latched = false;
        let ctx = TickContext {
            grid: &self.grid,
            registry: &self.registry,
            config: &self.config,
            now: sched.now(),
        };
        let outcome = tick::tick(&mut self.state, &ctx, &mut self.rng);
        self.sync_timers(sched);
        outcome
    }

    /// Dispatch a fired timer. Callbacks for timers this game no longer owns are dropped.
    pub fn handle_timer<S: Scheduler + ?Sized>(&mut self, fired: Fired, sched: &mut S) {
        if !self.timers.owns(&fired) {
            log::trace!("Ignoring stale {:?} timer", fired.event);
            return;
        }
        match fired.event {
            TimerEvent::Tick => {
                self.tick(sched);
            }
            TimerEvent::MagnetPull => {
                tick::pull_food(&mut self.state, &self.grid);
                self.sync_timers(sched);
            }
            TimerEvent::PowerUpExpiry => {
                self.timers.expiry = None;
                tick::expire_power_up(&mut self.state, &self.registry, sched.now());
                self.sync_timers(sched);
            }
        }
    }

    /// Would `head` followed by `body` collide under the current power-up?
    pub fn check_collisions(&self, head: Cell, body: &[Cell]) -> bool {
        let mut snake = Vec::with_capacity(body.len() + 1);
        snake.push(head);
        snake.extend_from_slice(body);
        check_collision(&self.grid, &snake, self.state.active_power_up.as_ref())
    }

    /// Cells the renderer may draw: a radius around `head` during blackout, else everything
    pub fn visible_cells(&self, head: Cell) -> HashSet<Cell> {
        if active_is(self.state.active_power_up.as_ref(), PowerUpKind::BlackoutMode) {
            self.grid.cells_within(head, self.config.blackout_radius)
        } else {
            self.grid.cells().collect()
        }
    }

    /// Current main tick period
    pub fn tick_interval(&self) -> Duration {
        let multiplier = self
            .state
            .active_power_up
            .map_or(1.0, |a| f64::from(self.registry.get(a.kind).speed_multiplier));
        let ms = (self.config.base_tick_ms as f64 * multiplier).round() as u64;
        Duration::from_millis(ms.max(1))
    }

    fn is_reversal(&self, direction: Direction) -> bool {
        self.state.snake.len() > 1 && direction.is_opposite(self.state.direction)
    }

    fn reset(&mut self, now: Millis) {
        self.state = GameState::new(&self.grid);
        self.turn_latched = false;
        let ctx = TickContext {
            grid: &self.grid,
            registry: &self.registry,
            config: &self.config,
            now,
        };
        // A validated grid always has room beside the starting snake
        if let Err(reason) = tick::spawn_food(&mut self.state, &ctx, &mut self.rng) {
            self.state.finish(reason);
        }
        self.state.events.clear();
    }

    /// Arm exactly the timers the current state needs
    fn sync_timers<S: Scheduler + ?Sized>(&mut self, sched: &mut S) {
        if !self.state.is_running() {
            self.timers.cancel_all(sched);
            return;
        }

        let period = self.tick_interval();
        if self.timers.tick.is_none_or(|(_, armed)| armed != period) {
            if let Some((handle, _)) = self.timers.tick.take() {
                sched.cancel(handle);
            }
            log::debug!("Tick interval {}ms", period.as_millis());
            self.timers.tick = Some((sched.every(period, TimerEvent::Tick), period));
        }

        let active = self.state.active_power_up.as_ref();
        let wants_magnet = active_is(active, PowerUpKind::MagnetHead) && self.state.food.is_some();
        match (wants_magnet, self.timers.magnet) {
            (true, None) => {
                self.timers.magnet = Some(sched.every(self.config.magnet_interval(), TimerEvent::MagnetPull));
            }
            (false, Some(handle)) => {
                sched.cancel(handle);
                self.timers.magnet = None;
            }
            _ => {}
        }

        let deadline = active.filter(|a| !a.instant).map(|a| a.expires_at);
        if self.timers.expiry.map(|(_, at)| at) != deadline {
            if let Some((handle, _)) = self.timers.expiry.take() {
                sched.cancel(handle);
            }
            if let Some(at) = deadline {
                let delay = Duration::from_millis(at.saturating_sub(sched.now()));
                self.timers.expiry = Some((sched.after(delay, TimerEvent::PowerUpExpiry), at));
            }
        }
    }
}
