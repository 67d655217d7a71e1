//! ACTORKIT Simulation Core
//!
//! Headless ECS-симуляция персонажей на Bevy 0.16:
//! senses → выбор цели → многофазное melee взаимодействие → stat influences.
//!
//! Архитектура:
//! - Всё в FixedUpdate, SingleThreaded executor (детерминизм)
//! - Фазы тика — цепочка SimulationSet (скан всегда раньше решений)
//! - Physics / pathfinding — black box (SpatialQuery, MovementOrder)

use bevy::ecs::schedule::ExecutorKind;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod behaviour;
pub mod components;
pub mod config;
pub mod cues;
pub mod error;
pub mod logger;
pub mod movement;
pub mod senses;
pub mod spatial;
pub mod spawner;
pub mod stats;

// Re-export базовых типов для удобства
pub use behaviour::{
    BeginInteraction, BehaviourCancelled, BehaviourCompleted, BehaviourFailed, BehaviourPlugin,
    BehaviourState, CancelInteraction, EngageSensed, InteractionBehaviour, InteractionOutcome,
    MeleeConfig,
};
pub use components::*;
pub use config::{ActorProfile, ScenarioConfig, SimulationSettings};
pub use cues::{ActorCue, CuesPlugin, Marks, PromptCue};
pub use error::{ConfigError, StatsError, TargetSelectionError};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel,
    LogPrinter,
};
pub use movement::{MoveOutcome, MoveRequestId, MovementFinished, MovementOrder, MovementPlugin};
pub use senses::{Sense, SenseAuthoring, SenseDisabled, SenseKind, SensePlugin, SensedEntity};
pub use spatial::{SenseCollider, SenseLayers, SpatialGrid, SpatialPlugin, SpatialQuery};
pub use spawner::{ActorRegistry, PlacementRules, Spawner, SpawnerConfig, SpawnerPlugin};
pub use stats::{ApplyInfluence, Stat, StatId, StatInfluence, StatsPlugin, StatsTracker};

/// Фазы simulation тика (выполняются строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Пересборка spatial index
    Spatial,
    /// Init + скан senses
    Sense,
    /// Behaviour решения и FSM
    Decide,
    /// Приказы движения, интеграция, completion события
    Movement,
    /// Stat influences
    Influence,
    /// Спавнеры
    Spawn,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Параметры берёт из SimulationSettings resource, если он вставлен до plugin'а.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let settings = app
            .world()
            .get_resource::<SimulationSettings>()
            .cloned()
            .unwrap_or_default();

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Spatial,
                SimulationSet::Sense,
                SimulationSet::Decide,
                SimulationSet::Movement,
                SimulationSet::Influence,
                SimulationSet::Spawn,
            )
                .chain(),
        )
        .edit_schedule(FixedUpdate, |schedule| {
            schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        })
        // Fixed timestep для simulation tick
        .insert_resource(Time::<Fixed>::from_hz(settings.tick_rate_hz))
        // Детерминистичный RNG
        .insert_resource(DeterministicRng::new(settings.seed))
        .insert_resource(SpatialGrid::new(settings.grid_cell_size))
        .insert_resource(settings)
        // Подсистемы
        .add_plugins((
            SpatialPlugin,
            SensePlugin,
            BehaviourPlugin,
            CuesPlugin,
            MovementPlugin,
            StatsPlugin,
            SpawnerPlugin,
        ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время продвигается вручную (1 / tick_rate за update), FixedUpdate
/// гоняется штатным RunFixedMainLoop.
pub fn create_headless_app(settings: SimulationSettings) -> App {
    let mut app = App::new();
    init_logger();

    let step = Duration::from_secs_f64(1.0 / settings.tick_rate_hz.max(1.0));
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(step))
        .insert_resource(settings)
        .add_plugins(SimulationPlugin);

    app
}

/// App для тестов: без MinimalPlugins, тики через `advance_fixed`
pub fn create_test_app(seed: u64) -> App {
    let mut app = App::new();
    app.insert_resource(SimulationSettings::with_seed(seed))
        .add_plugins(SimulationPlugin);
    app
}

/// Продвинуть Time<Fixed> на `seconds` и выполнить один FixedUpdate тик
pub fn advance_fixed(app: &mut App, seconds: f32) {
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .advance_by(Duration::from_secs_f32(seconds));
    app.world_mut().run_schedule(FixedUpdate);
}

/// Прогнать `ticks` фиксированных тиков по `1 / 60` секунды
pub fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        advance_fixed(app, 1.0 / 60.0);
    }
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component + std::fmt::Debug>(world: &mut World) -> Vec<u8> {
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    let mut snapshot = Vec::new();
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
