//! Sky Glider headless runner
//!
//! Plays one run with a simple autopilot at the fixed timestep and prints
//! the final scores.
//!
//! Usage: `sky-glider [CONFIG.json] [SCORES.json]`

use std::process::ExitCode;

use sky_glider::consts::SIM_DT;
use sky_glider::persistence::{JsonFileStore, MemoryStore, ScoreStore};
use sky_glider::sim::{EntityKind, GameEvent, GamePhase, GameState, TickInput, tick};
use sky_glider::{ConfigError, GameConfig};

/// Longest run the autopilot plays, in seconds
const MAX_RUN_SECONDS: f32 = 120.0;

fn load_config(path: Option<&str>) -> Result<GameConfig, ConfigError> {
    match path {
        Some(path) => {
            log::info!("Loading config from {}", path);
            GameConfig::from_file(path)
        }
        None => Ok(GameConfig::default()),
    }
}

/// Height of the gap center of the next wall pair ahead of the player
fn next_gap_center(state: &GameState) -> Option<f32> {
    let player = state.world.world_position(state.player)?;
    let half_wall = state.config.wall_size.x / 2.0;
    state
        .world
        .iter()
        .filter(|e| e.kind == EntityKind::Wall)
        .filter_map(|e| state.world.world_position(e.id))
        .filter(|pos| pos.x + half_wall + state.config.player_radius > player.x)
        .min_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)))
        .map(|lower| lower.y + (state.config.wall_size.y + state.config.slit_height()) / 2.0)
}

/// Flap whenever the player sinks below the next gap while falling
fn autopilot(state: &GameState) -> bool {
    let Some(entity) = state.player_entity() else {
        return false;
    };
    let falling = entity.body.is_some_and(|b| b.velocity.y < 0.0);
    let target = next_gap_center(state).unwrap_or(state.config.screen.y / 2.0);
    falling && entity.pos.y < target - state.config.slit_height() / 4.0
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Sky Glider (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match load_config(args.first().map(String::as_str)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store: Box<dyn ScoreStore> = match args.get(1) {
        Some(path) => Box::new(JsonFileStore::open(path)),
        None => Box::new(MemoryStore::new()),
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let mut state = match GameState::new(config, seed, store) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Cannot start scene: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let max_ticks = (MAX_RUN_SECONDS / SIM_DT) as u32;
    let mut flaps = 0u32;
    for _ in 0..max_ticks {
        if state.phase() == GamePhase::GameOver {
            break;
        }
        let input = TickInput {
            tap: state.phase() == GamePhase::Running && autopilot(&state),
        };
        tick(&mut state, &input, SIM_DT);

        for event in state.drain_events() {
            match event {
                GameEvent::Flap { .. } => flaps += 1,
                GameEvent::Scored { score } => log::debug!("Passed obstacle, score {}", score),
                GameEvent::ItemCollected { item_score } => {
                    log::debug!("Collected item, item score {}", item_score)
                }
                _ => {}
            }
        }
    }

    println!("Run ended after {:.1}s ({:?})", state.time, state.phase());
    println!("Flaps: {}", flaps);
    println!("{}", state.ledger.score_label());
    if state.config.items_enabled() {
        println!("{}", state.ledger.item_label());
    }
    println!("{}", state.ledger.best_label());
    ExitCode::SUCCESS
}
