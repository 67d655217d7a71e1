//! Spawner — поддерживает популяцию акторов в радиусе вокруг себя
//!
//! - на первом тике: spawns_on_start акторов
//! - дальше: пока живых < max_population и наступило время → ещё один
//! - placement: случайная точка в диске radius; on_nav_area → точка должна
//!   попасть в PlacementRules (не больше 10 попыток)

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ActorProfile;
use crate::error::ConfigError;
use crate::{DeterministicRng, SimulationSet};

/// Попыток найти точку спавна до отказа
pub const MAX_PLACEMENT_ATTEMPTS: usize = 10;

fn default_spawner_name() -> String {
    "Spawned".to_owned()
}

fn default_max_population() -> usize {
    5
}

fn default_radius() -> f32 {
    10.0
}

fn default_spawn_frequency() -> f32 {
    5.0
}

/// Правила спавнера (TOML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Префикс имени ("{name} {n}")
    #[serde(default = "default_spawner_name")]
    pub name: String,
    #[serde(default)]
    pub spawns_on_start: usize,
    #[serde(default = "default_max_population")]
    pub max_population: usize,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_spawn_frequency")]
    pub spawn_frequency: f32,
    /// Точка должна попасть в разрешённую зону (PlacementRules)
    #[serde(default)]
    pub on_nav_area: bool,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            name: default_spawner_name(),
            spawns_on_start: 0,
            max_population: default_max_population(),
            radius: default_radius(),
            spawn_frequency: default_spawn_frequency(),
            on_nav_area: false,
        }
    }
}

impl SpawnerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(ConfigError::InvalidSpawner(format!(
                "{}: radius must be non-negative, got {}",
                self.name, self.radius
            )));
        }
        if !(self.spawn_frequency.is_finite() && self.spawn_frequency > 0.0) {
            return Err(ConfigError::InvalidSpawner(format!(
                "{}: spawn_frequency must be positive, got {}",
                self.name, self.spawn_frequency
            )));
        }
        Ok(())
    }
}

/// Спавнер (на entity с Transform)
#[derive(Component, Debug, Clone)]
#[require(Transform)]
pub struct Spawner {
    pub config: SpawnerConfig,
    /// Кого спавним
    pub profile: ActorProfile,
    spawned: Vec<Entity>,
    total_spawned: usize,
    next_spawn_at: f32,
    started: bool,
}

impl Spawner {
    pub fn new(config: SpawnerConfig, profile: ActorProfile) -> Self {
        Self {
            config,
            profile,
            spawned: Vec::new(),
            total_spawned: 0,
            next_spawn_at: 0.0,
            started: false,
        }
    }

    /// Живые акторы этого спавнера
    pub fn spawned(&self) -> &[Entity] {
        &self.spawned
    }

    pub fn total_spawned(&self) -> usize {
        self.total_spawned
    }
}

/// Прямоугольная зона на XZ, куда можно ставить акторов
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementArea {
    pub center: [f32; 3],
    /// Половины размеров по X и Z
    pub half_extents: [f32; 2],
}

impl PlacementArea {
    pub fn contains(&self, point: Vec3) -> bool {
        (point.x - self.center[0]).abs() <= self.half_extents[0]
            && (point.z - self.center[2]).abs() <= self.half_extents[1]
    }
}

/// Разрешённые зоны спавна (аналог nav area)
#[derive(Resource, Debug, Clone, Default)]
pub struct PlacementRules {
    pub areas: Vec<PlacementArea>,
}

impl PlacementRules {
    /// Точка на поверхности зоны (высота берётся из зоны) или None
    pub fn sample(&self, point: Vec3) -> Option<Vec3> {
        self.areas
            .iter()
            .find(|area| area.contains(point))
            .map(|area| Vec3::new(point.x, area.center[1], point.z))
    }
}

/// Зарегистрированные акторы и спавнеры
#[derive(Resource, Debug, Clone, Default)]
pub struct ActorRegistry {
    actors: Vec<Entity>,
    spawners: Vec<Entity>,
}

impl ActorRegistry {
    pub fn register_actor(&mut self, entity: Entity) {
        if !self.actors.contains(&entity) {
            self.actors.push(entity);
        }
    }

    pub fn register_spawner(&mut self, entity: Entity) {
        if !self.spawners.contains(&entity) {
            self.spawners.push(entity);
        }
    }

    pub fn actors(&self) -> &[Entity] {
        &self.actors
    }

    pub fn spawners(&self) -> &[Entity] {
        &self.spawners
    }

    pub fn prune(&mut self, mut alive: impl FnMut(Entity) -> bool) {
        self.actors.retain(|entity| alive(*entity));
        self.spawners.retain(|entity| alive(*entity));
    }
}

/// Spawner Plugin (SimulationSet::Spawn — последним в тике)
pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementRules>()
            .init_resource::<ActorRegistry>()
            .add_systems(FixedUpdate, run_spawners.in_set(SimulationSet::Spawn));
    }
}

/// Случайная точка спавна (не больше MAX_PLACEMENT_ATTEMPTS попыток)
pub fn find_spawn_position(
    origin: Vec3,
    config: &SpawnerConfig,
    rules: &PlacementRules,
    rng: &mut impl Rng,
) -> Option<Vec3> {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        // Равномерно по диску
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = config.radius * rng.gen::<f32>().sqrt();
        let candidate = origin + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);

        if !config.on_nav_area {
            return Some(candidate);
        }

        if let Some(position) = rules.sample(candidate) {
            return Some(position);
        }
    }

    None
}

/// Система: спавн акторов
pub fn run_spawners(
    mut commands: Commands,
    mut spawners: Query<(Entity, &mut Spawner, &Transform)>,
    alive: Query<Entity>,
    rules: Res<PlacementRules>,
    mut registry: ResMut<ActorRegistry>,
    mut rng: ResMut<DeterministicRng>,
    names: Query<&Name>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();
    registry.prune(|entity| alive.contains(entity));

    for (spawner_entity, mut spawner, transform) in spawners.iter_mut() {
        spawner.spawned.retain(|entity| alive.contains(*entity));

        let count = if !spawner.started {
            spawner.started = true;
            spawner.next_spawn_at = now + spawner.config.spawn_frequency;
            registry.register_spawner(spawner_entity);
            spawner.config.spawns_on_start
        } else if spawner.spawned.len() < spawner.config.max_population
            && now >= spawner.next_spawn_at
        {
            spawner.next_spawn_at = now + spawner.config.spawn_frequency;
            1
        } else {
            0
        };

        for _ in 0..count {
            let Some(position) =
                find_spawn_position(transform.translation, &spawner.config, &rules, &mut rng.rng)
            else {
                crate::log_warning(&format!(
                    "Unable to find a suitable spawn location for {} after {} attempts; check placement areas within radius {}",
                    names
                        .get(spawner_entity)
                        .map(|name| name.as_str().to_owned())
                        .unwrap_or_else(|_| spawner.config.name.clone()),
                    MAX_PLACEMENT_ATTEMPTS,
                    spawner.config.radius
                ));
                continue;
            };

            spawner.total_spawned += 1;
            let name = format!("{} {}", spawner.config.name, spawner.total_spawned);
            let actor = match spawner.profile.spawn(&mut commands, &name, position) {
                Ok(actor) => actor,
                Err(err) => {
                    crate::log_error(&format!("❌ Spawner {} can't spawn: {}", spawner.config.name, err));
                    continue;
                }
            };

            spawner.spawned.push(actor);
            registry.register_actor(actor);
            crate::log(&format!("🐣 Spawned {} at {:?}", name, position));
        }
    }
}
