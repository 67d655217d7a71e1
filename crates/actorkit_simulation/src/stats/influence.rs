//! StatInfluence — data-described изменение stat'а цели

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Идентификатор stat'а ("health", "stamina", "fear", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatId(pub String);

impl StatId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Влияние на stat: (stat, magnitude, duration)
///
/// Применяется, но никогда не мутируется. `duration <= 0` — мгновенно,
/// иначе `max_change` распределяется линейно на `duration` секунд.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatInfluence {
    /// Имя влияния (ключ дедупликации вместе с source)
    pub name: String,
    pub stat: StatId,
    /// Суммарное изменение (отрицательное = урон)
    pub max_change: f32,
    /// Секунды, 0 = instant
    #[serde(default)]
    pub duration: f32,
}

impl StatInfluence {
    pub fn instant(name: impl Into<String>, stat: impl Into<StatId>, max_change: f32) -> Self {
        Self {
            name: name.into(),
            stat: stat.into(),
            max_change,
            duration: 0.0,
        }
    }

    pub fn over_time(
        name: impl Into<String>,
        stat: impl Into<StatId>,
        max_change: f32,
        duration: f32,
    ) -> Self {
        Self {
            name: name.into(),
            stat: stat.into(),
            max_change,
            duration,
        }
    }

    pub fn is_instant(&self) -> bool {
        self.duration <= 0.0
    }

    /// max_change и duration должны быть конечными (NaN навсегда портит stat)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_change.is_finite() || !self.duration.is_finite() {
            return Err(ConfigError::InvalidInfluence(format!(
                "`{}`: max_change {} and duration {} must be finite",
                self.name, self.max_change, self.duration
            )));
        }
        Ok(())
    }
}
