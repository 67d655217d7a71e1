//! Headless симуляция ACTORKIT
//!
//! Загружает сценарий (путь аргументом или встроенная арена) и гоняет
//! фиксированное число тиков без рендера.

use actorkit_simulation::{
    create_headless_app, init_logger, log_error, log_info, world_snapshot, ActorRegistry,
    ScenarioConfig, StatsTracker,
};

const BUNDLED_SCENARIO: &str = include_str!("../assets/arena.toml");

fn main() {
    init_logger();

    let scenario = match std::env::args().nth(1) {
        Some(path) => ScenarioConfig::load(&path),
        None => ScenarioConfig::from_toml_str(BUNDLED_SCENARIO),
    };

    let scenario = match scenario {
        Ok(scenario) => scenario,
        Err(err) => {
            log_error(&format!("❌ Failed to load scenario: {}", err));
            std::process::exit(1);
        }
    };

    let settings = scenario.settings.clone();
    log_info(&format!(
        "Starting ACTORKIT headless simulation (seed: {}, {} ticks)",
        settings.seed, settings.run_ticks
    ));

    let mut app = create_headless_app(settings.clone());
    app.finish();
    app.cleanup();

    if let Err(err) = scenario.spawn_into(app.world_mut()) {
        log_error(&format!("❌ Failed to spawn scenario: {}", err));
        std::process::exit(1);
    }

    for tick in 0..settings.run_ticks {
        app.update();

        if tick % 120 == 0 {
            let actors = app.world().resource::<ActorRegistry>().actors().len();
            log_info(&format!("Tick {}: {} actors alive", tick, actors));
        }
    }

    let snapshot = world_snapshot::<StatsTracker>(app.world_mut());
    log_info(&format!(
        "Simulation complete! Stats snapshot: {} bytes",
        snapshot.len()
    ));
}
