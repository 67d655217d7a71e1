//! Movement events

use bevy::prelude::*;

use crate::movement::MoveRequestId;

/// Event: приказ на перемещение
///
/// Генерируется:
/// - behaviour системами (подход к цели на optimal range)
/// - cue системой (mark / stop movement)
///
/// Обрабатывается: apply_movement_orders
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum MovementOrder {
    MoveTo {
        entity: Entity,
        destination: Vec3,
        request: MoveRequestId,
    },
    Stop {
        entity: Entity,
    },
}

impl MovementOrder {
    pub fn entity(&self) -> Entity {
        match self {
            MovementOrder::MoveTo { entity, .. } | MovementOrder::Stop { entity } => *entity,
        }
    }
}

/// Чем закончился request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Дошли до destination
    Arrived,
    /// Вытеснен другим приказом (или Stop)
    Abandoned,
}

/// Event: request завершён (ровно один раз на request)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct MovementFinished {
    pub entity: Entity,
    pub request: MoveRequestId,
    pub outcome: MoveOutcome,
}
