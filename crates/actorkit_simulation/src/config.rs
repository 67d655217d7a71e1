//! Authoring конфигурация: профили акторов и сценарии (TOML)
//!
//! Runtime компоненты держат свои дефолты через Default; здесь только
//! data-описание того, что и где спавнить.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::behaviour::{EngageSensed, InteractionBehaviour, MeleeAuthoring, MeleeConfig};
use crate::components::{Actor, Deactivated, MovementSpeed};
use crate::cues::Marks;
use crate::error::ConfigError;
use crate::senses::SenseAuthoring;
use crate::spatial::{SenseCollider, SenseLayers};
use crate::spawner::{ActorRegistry, PlacementArea, PlacementRules, Spawner, SpawnerConfig};
use crate::stats::{Stat, StatsTracker};

/// Глобальные параметры симуляции
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Частота FixedUpdate (Hz)
    pub tick_rate_hz: f64,
    pub seed: u64,
    /// Размер клетки SpatialGrid (метры)
    pub grid_cell_size: f32,
    /// Сколько тиков гоняет headless runner
    pub run_ticks: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            seed: 42,
            grid_cell_size: 4.0,
            run_ticks: 600,
        }
    }
}

impl SimulationSettings {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

/// Профиль актора: stats, senses, melee behaviour, движение
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorProfile {
    pub stats: BTreeMap<String, Stat>,
    pub speed: f32,
    pub stopping_distance: f32,
    pub collider_radius: f32,
    pub layers: SenseLayers,
    pub senses: Vec<SenseAuthoring>,
    pub melee: Option<MeleeAuthoring>,
    /// Атаковать ближайшего, кого видит Sight sense
    pub engage_sensed: bool,
}

impl Default for ActorProfile {
    fn default() -> Self {
        let movement = MovementSpeed::default();
        Self {
            stats: BTreeMap::new(),
            speed: movement.speed,
            stopping_distance: movement.stopping_distance,
            collider_radius: 0.0,
            layers: SenseLayers::ALL,
            senses: Vec::new(),
            melee: None,
            engage_sensed: false,
        }
    }
}

impl ActorProfile {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let profile: Self = toml::from_str(source)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn with_stat(mut self, name: impl Into<String>, stat: Stat) -> Self {
        self.stats.insert(name.into(), stat);
        self
    }

    pub fn with_sense(mut self, sense: SenseAuthoring) -> Self {
        self.senses.push(sense);
        self
    }

    pub fn with_melee(mut self, melee: MeleeAuthoring) -> Self {
        self.melee = Some(melee);
        self
    }

    /// Проверка всего, что ломает спавн (senses валидируются при init — fail closed)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ConfigError::InvalidBehaviour(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if let Some(melee) = &self.melee {
            MeleeConfig::from_authoring(melee)?;
        }
        Ok(())
    }

    /// Заспавнить актора (senses — дочерние entity)
    pub fn spawn(
        &self,
        commands: &mut Commands,
        name: &str,
        position: Vec3,
    ) -> Result<Entity, ConfigError> {
        let melee = self
            .melee
            .as_ref()
            .map(MeleeConfig::from_authoring)
            .transpose()?;

        let mut stats = StatsTracker::new();
        for (id, stat) in &self.stats {
            stats.insert_stat(id.as_str(), Stat::new(stat.value, stat.min, stat.max));
        }

        let mut actor = commands.spawn((
            Actor,
            Name::new(name.to_owned()),
            Transform::from_translation(position),
            MovementSpeed {
                speed: self.speed,
                stopping_distance: self.stopping_distance,
            },
            SenseCollider {
                radius: self.collider_radius,
                layers: self.layers,
            },
            stats,
        ));

        if let Some(melee) = melee {
            actor.insert(InteractionBehaviour::new(melee));
        }
        if self.engage_sensed {
            actor.insert(EngageSensed);
        }

        let actor = actor.id();
        for (index, sense) in self.senses.iter().enumerate() {
            commands.spawn((
                Name::new(format!("{name} sense {index}")),
                sense.clone(),
                Transform::default(),
                ChildOf(actor),
            ));
        }

        Ok(actor)
    }
}

/// Актор сцены
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorPlacement {
    pub name: String,
    pub profile: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub deactivated: bool,
}

/// Спавнер сцены
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerPlacement {
    pub profile: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(flatten)]
    pub config: SpawnerConfig,
}

/// Именованная точка сцены
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkConfig {
    pub name: String,
    pub position: [f32; 3],
}

/// Сценарий: настройки + профили + кто где стоит
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub settings: SimulationSettings,
    pub profiles: BTreeMap<String, ActorProfile>,
    pub actors: Vec<ActorPlacement>,
    pub spawners: Vec<SpawnerPlacement>,
    pub marks: Vec<MarkConfig>,
    pub placement_areas: Vec<PlacementArea>,
}

/// Что заспавнил сценарий
#[derive(Debug, Clone, Default)]
pub struct ScenarioEntities {
    pub actors: Vec<Entity>,
    pub spawners: Vec<Entity>,
}

impl ScenarioConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let scenario: Self = toml::from_str(source)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn profile(&self, name: &str) -> Result<&ActorProfile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_owned()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for profile in self.profiles.values() {
            profile.validate()?;
        }
        for actor in &self.actors {
            self.profile(&actor.profile)?;
        }
        for spawner in &self.spawners {
            self.profile(&spawner.profile)?;
            spawner.config.validate()?;
        }
        Ok(())
    }

    /// Заполнить мир: marks, placement rules, акторы, спавнеры
    pub fn spawn_into(&self, world: &mut World) -> Result<ScenarioEntities, ConfigError> {
        self.validate()?;

        let mut marks = Marks::default();
        for mark in &self.marks {
            marks.insert(mark.name.clone(), Vec3::from_array(mark.position));
        }
        world.insert_resource(marks);
        world.insert_resource(PlacementRules {
            areas: self.placement_areas.clone(),
        });

        let mut entities = ScenarioEntities::default();
        {
            let mut commands = world.commands();
            for placement in &self.actors {
                let profile = self.profile(&placement.profile)?;
                let actor = profile.spawn(
                    &mut commands,
                    &placement.name,
                    Vec3::from_array(placement.position),
                )?;
                if placement.deactivated {
                    commands.entity(actor).insert(Deactivated);
                }
                entities.actors.push(actor);
            }

            for placement in &self.spawners {
                let profile = self.profile(&placement.profile)?.clone();
                let spawner = commands
                    .spawn((
                        Name::new(format!("{} spawner", placement.config.name)),
                        Transform::from_translation(Vec3::from_array(placement.position)),
                        Spawner::new(placement.config.clone(), profile),
                    ))
                    .id();
                entities.spawners.push(spawner);
            }
        }
        world.flush();

        let mut registry = world.get_resource_or_insert_with(ActorRegistry::default);
        for actor in &entities.actors {
            registry.register_actor(*actor);
        }

        crate::log_info(&format!(
            "🎬 Scenario loaded: {} actors, {} spawners, {} marks",
            entities.actors.len(),
            entities.spawners.len(),
            self.marks.len()
        ));

        Ok(entities)
    }
}
