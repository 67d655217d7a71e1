//! Spatial Sense — периодический скан окружения актора
//!
//! Scan pipeline (на каждый hit overlap запроса):
//! 1. root entity (ChildOf → верх иерархии)
//! 2. root == observer root → отбрасываем (себя не видим)
//! 3. root уже в списке → отбрасываем
//! 4. distance² между корнями ≤ min_range² → отбрасываем (только если min_range > 0)
//! 5. нет нужной capability → отбрасываем
//!
//! Выжившие полностью заменяют прошлый список.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::senses::selector::{CandidateSelector, NearestSelector};
use crate::spatial::SenseLayers;
use crate::stats::StatInfluence;

/// Найденная entity + кешированный distance² на момент скана
///
/// `entity` — слабая ссылка: может быть despawned к моменту чтения.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensedEntity {
    pub entity: Entity,
    pub distance_squared: f32,
}

/// Что должен уметь root, чтобы попасть в список
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum Capability {
    /// Есть StatsTracker
    InfluenceReceiver,
    /// Есть Actor
    Actor,
    /// Transform + Name + StatsTracker (участник взаимодействия)
    Participant,
}

impl FromStr for Capability {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "influencereceiver" | "statstracker" => Ok(Capability::InfluenceReceiver),
            "actor" => Ok(Capability::Actor),
            "participant" | "interactionparticipant" => Ok(Capability::Participant),
            _ => Err(ConfigError::UnknownCapability(name.to_owned())),
        }
    }
}

/// Тип sense (определяет refinement после скана)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenseKind {
    /// Только сырой список
    #[default]
    Presence,
    /// Список + ближайший кандидат
    Sight,
}

impl SenseKind {
    pub fn selector(self) -> Option<&'static dyn CandidateSelector> {
        match self {
            SenseKind::Presence => None,
            SenseKind::Sight => Some(&NearestSelector),
        }
    }
}

fn default_scan_frequency() -> f32 {
    0.5
}

fn default_max_range() -> f32 {
    10.0
}

fn default_max_candidates() -> usize {
    16
}

/// Authoring-данные sense (TOML / spawn код)
///
/// Превращается в `Sense` системой init_senses; ошибка → `SenseDisabled`.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenseAuthoring {
    #[serde(default)]
    pub kind: SenseKind,
    /// Имя capability ("influence_receiver", "actor", "participant")
    pub capability: String,
    #[serde(default = "default_scan_frequency")]
    pub scan_frequency: f32,
    #[serde(default)]
    pub min_range: f32,
    #[serde(default = "default_max_range")]
    pub max_range: f32,
    #[serde(default)]
    pub layers: SenseLayers,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default)]
    pub passive_influence: Option<StatInfluence>,
}

impl Default for SenseAuthoring {
    fn default() -> Self {
        Self {
            kind: SenseKind::Presence,
            capability: "actor".to_owned(),
            scan_frequency: default_scan_frequency(),
            min_range: 0.0,
            max_range: default_max_range(),
            layers: SenseLayers::ALL,
            max_candidates: default_max_candidates(),
            passive_influence: None,
        }
    }
}

impl SenseAuthoring {
    pub fn sight(capability: impl Into<String>, max_range: f32) -> Self {
        Self {
            kind: SenseKind::Sight,
            capability: capability.into(),
            max_range,
            ..Default::default()
        }
    }

    pub fn presence(capability: impl Into<String>, max_range: f32) -> Self {
        Self {
            kind: SenseKind::Presence,
            capability: capability.into(),
            max_range,
            ..Default::default()
        }
    }

    pub fn with_min_range(mut self, min_range: f32) -> Self {
        self.min_range = min_range;
        self
    }

    pub fn with_scan_frequency(mut self, scan_frequency: f32) -> Self {
        self.scan_frequency = scan_frequency;
        self
    }

    pub fn with_passive_influence(mut self, influence: StatInfluence) -> Self {
        self.passive_influence = Some(influence);
        self
    }
}

/// Валидированная конфигурация sense (immutable после резолва)
#[derive(Debug, Clone, PartialEq)]
pub struct SenseConfig {
    pub scan_frequency: f32,
    pub min_range: f32,
    pub min_range_squared: f32,
    pub max_range: f32,
    pub layers: SenseLayers,
    pub capability: Capability,
    pub max_candidates: usize,
    pub passive_influence: Option<StatInfluence>,
}

impl SenseConfig {
    pub fn from_authoring(authoring: &SenseAuthoring) -> Result<Self, ConfigError> {
        let capability: Capability = authoring.capability.parse()?;

        if !(authoring.scan_frequency.is_finite() && authoring.scan_frequency > 0.0) {
            return Err(ConfigError::InvalidScanFrequency(authoring.scan_frequency));
        }

        let (min, max) = (authoring.min_range, authoring.max_range);
        if !(min >= 0.0 && max > 0.0 && min <= max && max.is_finite()) {
            return Err(ConfigError::InvalidRange { min, max });
        }

        if authoring.max_candidates == 0 {
            return Err(ConfigError::ZeroCandidates);
        }

        if let Some(influence) = &authoring.passive_influence {
            influence.validate()?;
        }

        Ok(Self {
            scan_frequency: authoring.scan_frequency,
            min_range: min,
            min_range_squared: min * min,
            max_range: max,
            layers: authoring.layers,
            capability,
            max_candidates: authoring.max_candidates,
            passive_influence: authoring.passive_influence.clone(),
        })
    }
}

/// Активный sense (на актора или его дочерней entity)
#[derive(Component, Debug, Clone)]
pub struct Sense {
    pub config: SenseConfig,
    pub kind: SenseKind,
    /// Время следующего скана (секунды Time<Fixed>)
    pub next_scan_at: f32,
    sensed: Vec<SensedEntity>,
    nearest: Option<SensedEntity>,
}

impl Sense {
    pub fn new(config: SenseConfig, kind: SenseKind) -> Self {
        Self {
            config,
            kind,
            next_scan_at: 0.0,
            sensed: Vec::new(),
            nearest: None,
        }
    }

    pub fn sensed(&self) -> &[SensedEntity] {
        &self.sensed
    }

    /// Результат refinement (только для Sight)
    pub fn nearest(&self) -> Option<SensedEntity> {
        self.nearest
    }

    pub fn is_due(&self, now: f32) -> bool {
        now >= self.next_scan_at
    }

    /// Заменить список результатами скана и пересчитать refinement
    pub fn replace_sensed(&mut self, now: f32, sensed: Vec<SensedEntity>) {
        self.sensed = sensed;
        self.nearest = self
            .kind
            .selector()
            .and_then(|selector| selector.select(&self.sensed));
        self.next_scan_at = now + self.config.scan_frequency;
    }

    pub fn clear(&mut self) {
        self.sensed.clear();
        self.nearest = None;
    }
}

/// Маркер: sense выключен из-за ошибки конфигурации (никогда не сканирует)
#[derive(Component, Debug, Clone)]
pub struct SenseDisabled {
    pub reason: String,
}

/// Мир глазами sense: иерархия, позиции, capabilities, overlap query
pub trait SenseWorld {
    fn root_of(&self, entity: Entity) -> Entity;
    fn position_of(&self, entity: Entity) -> Option<Vec3>;
    fn has_capability(&self, entity: Entity, capability: Capability) -> bool;
    fn overlap(&self, center: Vec3, radius: f32, layers: SenseLayers, max_hits: usize)
        -> Vec<Entity>;
}

/// Один скан: hits → отфильтрованный список кандидатов
pub fn scan(sense_entity: Entity, config: &SenseConfig, world: &impl SenseWorld) -> Vec<SensedEntity> {
    let observer = world.root_of(sense_entity);
    let Some(origin) = world.position_of(observer) else {
        return Vec::new();
    };

    let hits = world.overlap(origin, config.max_range, config.layers, config.max_candidates);
    let mut sensed: Vec<SensedEntity> = Vec::with_capacity(hits.len());

    for hit in hits {
        let root = world.root_of(hit);
        if root == observer || sensed.iter().any(|known| known.entity == root) {
            continue;
        }

        let Some(position) = world.position_of(root) else {
            continue;
        };

        let distance_squared = origin.distance_squared(position);
        if config.min_range > 0.0 && distance_squared <= config.min_range_squared {
            continue;
        }

        if !world.has_capability(root, config.capability) {
            continue;
        }

        sensed.push(SensedEntity {
            entity: root,
            distance_squared,
        });
    }

    sensed
}
