//! Interaction behaviour: состояние FSM, конфигурация melee, компонент

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::behaviour::EffectSequence;
use crate::components::Actor;
use crate::cues::ActorCue;
use crate::error::ConfigError;
use crate::movement::MoveRequestId;
use crate::stats::StatInfluence;

/// Фазы взаимодействия
///
/// Idle → Starting → Preparing → Performing → Completing → Idle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BehaviourState {
    #[default]
    Idle,
    /// Выбор цели + подход на optimal range
    Starting,
    /// Замах (ждём до `until`)
    Preparing { until: f32 },
    /// Последовательное применение hit influences
    Performing { sequence: EffectSequence },
    /// Итог фиксируется на следующем тике
    Completing { outcome: InteractionOutcome },
}

impl BehaviourState {
    pub fn name(&self) -> &'static str {
        match self {
            BehaviourState::Idle => "Idle",
            BehaviourState::Starting => "Starting",
            BehaviourState::Preparing { .. } => "Preparing",
            BehaviourState::Performing { .. } => "Performing",
            BehaviourState::Completing { .. } => "Completing",
        }
    }
}

/// Чем закончилось взаимодействие
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Все influences отработали
    Finished,
    /// Цель пропала / потеряла StatsTracker
    TargetLost,
    /// Подход к цели перебит чужим приказом движения
    Interrupted,
}

/// Параметры melee взаимодействия (валидированные)
#[derive(Debug, Clone, PartialEq)]
pub struct MeleeConfig {
    /// Дистанция до цели, на которой бьём
    pub optimal_range: f32,
    /// Допуск "уже на месте" (хранится в квадрате)
    pub arriving_distance_squared: f32,
    pub preparation_time: f32,
    /// Задержка от входа в Performing до первого influence
    pub time_until_effect: f32,
    /// Дополнительная пауза между influences (0 = по одному за тик)
    pub influence_interval: f32,
    pub completion_delay: f32,
    pub hit_influences: Vec<StatInfluence>,
    /// После завершения снова выбирать цель из тех же участников
    pub repeat: bool,
    pub perform_cue: Option<ActorCue>,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            optimal_range: 1.5,
            arriving_distance_squared: 0.5 * 0.5,
            preparation_time: 0.5,
            time_until_effect: 0.3,
            influence_interval: 0.0,
            completion_delay: 0.5,
            hit_influences: Vec::new(),
            repeat: false,
            perform_cue: None,
        }
    }
}

impl MeleeConfig {
    pub fn with_arriving_distance(mut self, distance: f32) -> Self {
        self.arriving_distance_squared = distance * distance;
        self
    }

    pub fn with_hit(mut self, influence: StatInfluence) -> Self {
        self.hit_influences.push(influence);
        self
    }

    pub fn from_authoring(authoring: &MeleeAuthoring) -> Result<Self, ConfigError> {
        let timings = [
            ("optimal_range", authoring.optimal_range),
            ("arriving_distance", authoring.arriving_distance),
            ("preparation_time", authoring.preparation_time),
            ("time_until_effect", authoring.time_until_effect),
            ("influence_interval", authoring.influence_interval),
            ("completion_delay", authoring.completion_delay),
        ];

        if let Some((field, value)) = timings
            .iter()
            .find(|(_, value)| !(value.is_finite() && *value >= 0.0))
        {
            return Err(ConfigError::InvalidBehaviour(format!(
                "{field} must be a non-negative number, got {value}"
            )));
        }

        for influence in &authoring.hit_influences {
            influence.validate()?;
        }

        Ok(Self {
            optimal_range: authoring.optimal_range,
            arriving_distance_squared: authoring.arriving_distance * authoring.arriving_distance,
            preparation_time: authoring.preparation_time,
            time_until_effect: authoring.time_until_effect,
            influence_interval: authoring.influence_interval,
            completion_delay: authoring.completion_delay,
            hit_influences: authoring.hit_influences.clone(),
            repeat: authoring.repeat,
            perform_cue: authoring.perform_cue.clone(),
        })
    }
}

/// Authoring-данные melee behaviour (TOML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeAuthoring {
    pub optimal_range: f32,
    pub arriving_distance: f32,
    pub preparation_time: f32,
    pub time_until_effect: f32,
    pub influence_interval: f32,
    pub completion_delay: f32,
    pub hit_influences: Vec<StatInfluence>,
    pub repeat: bool,
    pub perform_cue: Option<ActorCue>,
}

impl Default for MeleeAuthoring {
    fn default() -> Self {
        let config = MeleeConfig::default();
        Self {
            optimal_range: config.optimal_range,
            arriving_distance: config.arriving_distance_squared.sqrt(),
            preparation_time: config.preparation_time,
            time_until_effect: config.time_until_effect,
            influence_interval: config.influence_interval,
            completion_delay: config.completion_delay,
            hit_influences: Vec::new(),
            repeat: false,
            perform_cue: None,
        }
    }
}

/// Запрошенное behaviour перемещение (ждём MovementFinished с этим id)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMove {
    pub request: MoveRequestId,
    pub destination: Vec3,
}

/// Результат BeginInteraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginResult {
    Started,
    /// Starting без цели: заменили участников
    ParticipantsReplaced,
    /// Уже идёт взаимодействие с привязанной целью
    Ignored,
}

/// Interaction behaviour актора (единственный владелец своего состояния)
///
/// Инвариант: не больше одной привязанной цели; цель перевыбирается
/// только в Starting без цели.
///
/// Требует Actor (Transform + MovementCommand нужны FSM для подхода к цели).
#[derive(Component, Debug, Clone, Default)]
#[require(Actor)]
pub struct InteractionBehaviour {
    pub config: MeleeConfig,
    state: BehaviourState,
    target: Option<Entity>,
    participants: Vec<Entity>,
    pending_move: Option<PendingMove>,
    influences_applied: usize,
}

impl InteractionBehaviour {
    pub fn new(config: MeleeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &BehaviourState {
        &self.state
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn participants(&self) -> &[Entity] {
        &self.participants
    }

    pub fn pending_move(&self) -> Option<PendingMove> {
        self.pending_move
    }

    pub fn influences_applied(&self) -> usize {
        self.influences_applied
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, BehaviourState::Idle)
    }

    /// Триггер старта (повторный вызов во время взаимодействия цель не меняет)
    pub fn begin(&mut self, participants: Vec<Entity>) -> BeginResult {
        match self.state {
            BehaviourState::Idle => {
                self.participants = participants;
                self.target = None;
                self.pending_move = None;
                self.influences_applied = 0;
                self.state = BehaviourState::Starting;
                BeginResult::Started
            }
            BehaviourState::Starting if self.target.is_none() => {
                self.participants = participants;
                BeginResult::ParticipantsReplaced
            }
            _ => BeginResult::Ignored,
        }
    }

    /// Прервать (Idle, цель отвязана); false если уже Idle
    pub fn cancel(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.release();
        true
    }

    /// Вернуть instance в исходное состояние
    pub fn release(&mut self) {
        self.state = BehaviourState::Idle;
        self.target = None;
        self.participants.clear();
        self.pending_move = None;
        self.influences_applied = 0;
    }

    /// Повтор: снова Starting без цели, участники сохраняются
    pub fn restart(&mut self) {
        self.state = BehaviourState::Starting;
        self.target = None;
        self.pending_move = None;
        self.influences_applied = 0;
    }

    pub(crate) fn bind_target(&mut self, target: Entity) {
        self.target = Some(target);
    }

    pub(crate) fn retain_participants(&mut self, keep: impl FnMut(&Entity) -> bool) {
        self.participants.retain(keep);
    }

    pub(crate) fn set_state(&mut self, state: BehaviourState) {
        self.state = state;
    }

    pub(crate) fn set_pending_move(&mut self, pending: Option<PendingMove>) {
        self.pending_move = pending;
    }

    pub(crate) fn record_influence(&mut self) {
        self.influences_applied += 1;
    }
}
