//! Movement компоненты: активная команда перемещения, скорость

use bevy::prelude::*;

use crate::movement::MoveRequestId;

/// Текущая команда движения актора
///
/// Архитектура:
/// - behaviour/cue системы шлют MovementOrder (high-level intent)
/// - movement системы переписывают MovementCommand и двигают Transform
/// - по прибытию / отмене — MovementFinished с тем же request id (ровно один раз)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub enum MovementCommand {
    /// Стоим на месте
    #[default]
    Idle,
    /// Двигаемся к позиции (world coordinates)
    MoveToPosition { target: Vec3, request: MoveRequestId },
}

impl MovementCommand {
    /// Текущая точка назначения (для Idle — текущая позиция)
    pub fn destination(&self, current: Vec3) -> Vec3 {
        match self {
            MovementCommand::Idle => current,
            MovementCommand::MoveToPosition { target, .. } => *target,
        }
    }

    pub fn active_request(&self) -> Option<MoveRequestId> {
        match self {
            MovementCommand::Idle => None,
            MovementCommand::MoveToPosition { request, .. } => Some(*request),
        }
    }
}

/// Скорость движения актора (метры/сек) и дистанция остановки
#[derive(Component, Clone, Copy, Debug, Reflect)]
#[reflect(Component)]
pub struct MovementSpeed {
    pub speed: f32,
    /// Ближе этой дистанции считаем что прибыли
    pub stopping_distance: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self {
            speed: 2.0, // 2 m/s — базовая скорость ходьбы
            stopping_distance: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_destination_is_current_position() {
        let command = MovementCommand::Idle;
        let here = Vec3::new(1.0, 0.0, 2.0);
        assert_eq!(command.destination(here), here);
        assert_eq!(command.active_request(), None);
    }

    #[test]
    fn test_move_destination() {
        let command = MovementCommand::MoveToPosition {
            target: Vec3::X * 5.0,
            request: MoveRequestId(3),
        };
        assert_eq!(command.destination(Vec3::ZERO), Vec3::X * 5.0);
        assert_eq!(command.active_request(), Some(MoveRequestId(3)));
    }
}
