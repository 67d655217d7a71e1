//! Behaviour events

use bevy::prelude::*;

use crate::behaviour::InteractionOutcome;
use crate::error::TargetSelectionError;

/// Event: начать взаимодействие
///
/// Генерируется: engage_sensed (Sight sense + EngageSensed), внешний код
/// Обрабатывается: handle_begin_requests
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BeginInteraction {
    pub actor: Entity,
    /// Может содержать самого актора — он будет отфильтрован при выборе цели
    pub participants: Vec<Entity>,
}

/// Event: прервать взаимодействие
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CancelInteraction {
    pub actor: Entity,
}

/// Event: не удалось выбрать цель, behaviour вернулся в Idle
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BehaviourFailed {
    pub actor: Entity,
    pub error: TargetSelectionError,
}

/// Event: взаимодействие завершено (Completing → Idle / повтор)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BehaviourCompleted {
    pub actor: Entity,
    pub target: Option<Entity>,
    pub outcome: InteractionOutcome,
    pub influences_applied: usize,
}

/// Event: взаимодействие отменено (cancel / Deactivated)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BehaviourCancelled {
    pub actor: Entity,
}
