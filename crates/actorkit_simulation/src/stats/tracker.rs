//! StatsTracker — influence receiver актора
//!
//! Хранит значения stat'ов и активные durational influences.
//! Инвариант: min ≤ value ≤ max для каждого stat'а.

use ahash::AHashMap;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::stats::{StatId, StatInfluence};

/// Значение stat'а с границами
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub value: f32,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "default_stat_max")]
    pub max: f32,
}

fn default_stat_max() -> f32 {
    100.0
}

impl Stat {
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    /// Доля в [0, 1] (0 если диапазон вырожден)
    pub fn normalized(&self) -> f32 {
        let span = self.max - self.min;
        if span <= f32::EPSILON {
            0.0
        } else {
            (self.value - self.min) / span
        }
    }

    /// Применить delta с clamp; возвращает фактическое изменение
    pub fn apply_change(&mut self, delta: f32) -> f32 {
        let before = self.value;
        self.value = (self.value + delta).clamp(self.min, self.max);
        self.value - before
    }
}

/// Активное влияние с остатком времени
#[derive(Debug, Clone)]
struct ActiveInfluence {
    influence: StatInfluence,
    source: Option<Entity>,
    remaining: f32,
}

/// Influence receiver: stats + активные influences
#[derive(Component, Debug, Clone, Default)]
pub struct StatsTracker {
    stats: AHashMap<StatId, Stat>,
    active: Vec<ActiveInfluence>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: добавить stat
    pub fn with_stat(mut self, id: impl Into<StatId>, stat: Stat) -> Self {
        self.insert_stat(id, stat);
        self
    }

    pub fn insert_stat(&mut self, id: impl Into<StatId>, stat: Stat) {
        self.stats.insert(id.into(), stat);
    }

    pub fn stat(&self, id: &StatId) -> Option<&Stat> {
        self.stats.get(id)
    }

    pub fn value(&self, id: &StatId) -> Option<f32> {
        self.stats.get(id).map(|stat| stat.value)
    }

    pub fn normalized_value(&self, id: &StatId) -> Option<f32> {
        self.stats.get(id).map(Stat::normalized)
    }

    pub fn set_value(&mut self, id: &StatId, value: f32) -> Result<(), StatsError> {
        let stat = self
            .stats
            .get_mut(id)
            .ok_or_else(|| StatsError::UnknownStat(id.clone()))?;
        stat.value = value.clamp(stat.min, stat.max);
        Ok(())
    }

    pub fn set_max(&mut self, id: &StatId, max: f32) -> Result<(), StatsError> {
        let stat = self
            .stats
            .get_mut(id)
            .ok_or_else(|| StatsError::UnknownStat(id.clone()))?;
        stat.max = max.max(stat.min);
        stat.value = stat.value.min(stat.max);
        Ok(())
    }

    /// Количество активных durational influences
    pub fn active_influence_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_influence_active(&self, name: &str, source: Option<Entity>) -> bool {
        self.active
            .iter()
            .any(|active| active.influence.name == name && active.source == source)
    }

    /// Принять influence.
    ///
    /// - неизвестный stat → `UnknownStat`
    /// - то же влияние от того же source ещё активно → `AlreadyActive`
    /// - NaN / inf в max_change или duration → `InvalidInfluence`
    /// - instant → сразу меняет значение (clamp), durational → ставится в очередь
    pub fn try_add_influence(
        &mut self,
        influence: &StatInfluence,
        source: Option<Entity>,
    ) -> Result<(), StatsError> {
        if influence.validate().is_err() {
            return Err(StatsError::InvalidInfluence(influence.name.clone()));
        }

        let Some(stat) = self.stats.get_mut(&influence.stat) else {
            return Err(StatsError::UnknownStat(influence.stat.clone()));
        };

        if influence.is_instant() {
            stat.apply_change(influence.max_change);
            return Ok(());
        }

        if self.is_influence_active(&influence.name, source) {
            return Err(StatsError::AlreadyActive(influence.name.clone()));
        }

        self.active.push(ActiveInfluence {
            influence: influence.clone(),
            source,
            remaining: influence.duration,
        });
        Ok(())
    }

    /// Продвинуть durational influences на `delta` секунд
    pub fn tick(&mut self, delta: f32) {
        if delta <= 0.0 {
            return;
        }

        let stats = &mut self.stats;
        self.active.retain_mut(|active| {
            let step = delta.min(active.remaining);
            if let Some(stat) = stats.get_mut(&active.influence.stat) {
                stat.apply_change(active.influence.max_change * step / active.influence.duration);
            }
            active.remaining -= step;
            active.remaining > 1e-6
        });
    }
}
