//! Snake Arcade headless demo
//!
//! Runs one autopiloted game on a simulated clock and prints the result.
//! Usage: `snake-arcade [config.json]`

#[cfg(not(target_arch = "wasm32"))]
use snake_arcade::{
    GameConfig, autopilot,
    sim::{Game, GameEvent, Scheduler, TimerEvent, TimerQueue},
};

/// Simulated time budget for one demo run (ms)
#[cfg(not(target_arch = "wasm32"))]
const DEMO_LIMIT_MS: u64 = 10 * 60 * 1000;
/// Simulated time advanced per driver step (ms), roughly one 60 Hz frame
#[cfg(not(target_arch = "wasm32"))]
const FRAME_MS: u64 = 16;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Snake Arcade (headless demo) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match GameConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };

    let mut game = match Game::new(config) {
        Ok(game) => game,
        Err(err) => {
            log::error!("Invalid config: {err}");
            std::process::exit(1);
        }
    };
    let mut clock = TimerQueue::new();
    game.start_game(&mut clock);

    let mut food_eaten = 0u32;
    let mut power_ups = 0u32;
    while !game.state().is_game_over() && clock.now() < DEMO_LIMIT_MS {
        let until = clock.now() + FRAME_MS;
        clock.run_until(until, |q, fired| {
            // Steer right before each move, like a player reacting to the last frame
            if fired.event == TimerEvent::Tick {
                if let Some(dir) = autopilot::choose_direction(game.state(), game.grid()) {
                    game.change_direction(dir, q);
                }
            }
            game.handle_timer(fired, q);
        });

        for event in game.drain_events() {
            match event {
                GameEvent::FoodEaten { .. } => food_eaten += 1,
                GameEvent::PowerUpActivated { kind, source } => {
                    power_ups += 1;
                    log::info!("[{} ms] {} (from {})", clock.now(), kind, source);
                }
                GameEvent::PowerUpExpired { kind } => log::info!("[{} ms] {} ended", clock.now(), kind),
                _ => {}
            }
        }
    }

    let state = game.snapshot();
    println!(
        "Score {} | length {} | food {} | power-ups {} | {} ticks over {:.1}s",
        state.score,
        state.snake.len(),
        food_eaten,
        power_ups,
        state.tick_count,
        clock.now() as f64 / 1000.0
    );
    if let Some(message) = &state.message {
        println!("{message}");
    }
    match serde_json::to_string_pretty(&state) {
        Ok(json) => log::debug!("Final snapshot:\n{json}"),
        Err(err) => log::warn!("Could not serialize snapshot: {err}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; a web frontend embeds `snake_arcade::sim::Game` directly
}
