//! Health adapter — узкий health/damage интерфейс поверх StatsTracker
//!
//! Внешние damage-фреймворки ожидают health API; адаптер маппит его на
//! health stat. Неподдержанные операции возвращают `StatsError::Unsupported`,
//! а не паникуют — core их не вызывает.

use crate::error::StatsError;
use crate::stats::{StatId, StatInfluence, StatsTracker};

/// Health API, который ожидают внешние интеграции
pub trait HealthAdapter {
    fn is_alive(&self) -> bool;
    fn health(&self) -> f32;
    fn set_health(&mut self, value: f32) -> Result<(), StatsError>;
    fn health_max(&self) -> f32;
    fn set_health_max(&mut self, value: f32) -> Result<(), StatsError>;
    fn normalized_health(&self) -> f32;
    fn add_damage(&mut self, damage: f32) -> Result<(), StatsError>;
    fn add_health(&mut self, amount: f32) -> Result<(), StatsError>;
}

/// Health controller: health stat конкретного трекера
pub struct HealthController<'a> {
    stats: &'a mut StatsTracker,
    health: StatId,
}

impl<'a> HealthController<'a> {
    pub fn new(stats: &'a mut StatsTracker, health: impl Into<StatId>) -> Self {
        Self {
            stats,
            health: health.into(),
        }
    }
}

impl HealthAdapter for HealthController<'_> {
    fn is_alive(&self) -> bool {
        self.stats
            .stat(&self.health)
            .map(|stat| stat.value > stat.min)
            .unwrap_or(false)
    }

    fn health(&self) -> f32 {
        self.stats.value(&self.health).unwrap_or(0.0)
    }

    fn set_health(&mut self, value: f32) -> Result<(), StatsError> {
        self.stats.set_value(&self.health, value)
    }

    fn health_max(&self) -> f32 {
        self.stats.stat(&self.health).map(|stat| stat.max).unwrap_or(0.0)
    }

    fn set_health_max(&mut self, value: f32) -> Result<(), StatsError> {
        self.stats.set_max(&self.health, value)
    }

    fn normalized_health(&self) -> f32 {
        self.stats.normalized_value(&self.health).unwrap_or(0.0)
    }

    fn add_damage(&mut self, damage: f32) -> Result<(), StatsError> {
        let influence = StatInfluence::instant("damage", self.health.clone(), -damage.abs());
        self.stats.try_add_influence(&influence, None)
    }

    fn add_health(&mut self, _amount: f32) -> Result<(), StatsError> {
        Err(StatsError::Unsupported("add_health"))
    }
}
