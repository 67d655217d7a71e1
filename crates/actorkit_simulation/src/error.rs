//! Ошибки симуляции (typed, через thiserror)
//!
//! Таксономия:
//! - ConfigError — фатально для конкретного компонента (sense выключается)
//! - TargetSelectionError — recoverable, behaviour возвращается в Idle
//! - StatsError — influence не применён / операция адаптера не поддержана

use thiserror::Error;

use crate::stats::StatId;

/// Ошибка authoring-конфигурации (ловится на этапе загрузки/инициализации)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown capability `{0}`")]
    UnknownCapability(String),

    #[error("invalid range: min {min} must be >= 0 and <= max {max}")]
    InvalidRange { min: f32, max: f32 },

    #[error("scan frequency must be positive, got {0}")]
    InvalidScanFrequency(f32),

    #[error("max_candidates must be at least 1")]
    ZeroCandidates,

    #[error("invalid behaviour config: {0}")]
    InvalidBehaviour(String),

    #[error("invalid stat influence: {0}")]
    InvalidInfluence(String),

    #[error("invalid spawner config: {0}")]
    InvalidSpawner(String),

    #[error("unknown actor profile `{0}`")]
    UnknownProfile(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Ошибка выбора цели взаимодействия
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelectionError {
    /// Среди участников только сам инициатор (или никого)
    #[error("no eligible target among participants")]
    NoEligibleTarget,
}

/// Ошибка stat-системы
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("unknown stat `{0}`")]
    UnknownStat(StatId),

    #[error("influence `{0}` is already active")]
    AlreadyActive(String),

    #[error("influence `{0}` has non-finite magnitude or duration")]
    InvalidInfluence(String),

    #[error("operation `{0}` is not supported")]
    Unsupported(&'static str),
}
