//! Movement service — приказы на перемещение и completion события
//!
//! Контракт:
//! - MovementOrder::MoveTo принимает destination + request id (вместо callback)
//! - MovementFinished с этим id приходит ровно ОДИН раз: Arrived или Abandoned
//! - Новый приказ вытесняет активный → Abandoned для старого request
//!
//! Headless реализация: прямая интеграция Transform со скоростью MovementSpeed
//! (pathfinding/physics здесь нет — это black box хоста).

use bevy::prelude::*;

use crate::components::{Deactivated, MovementCommand, MovementSpeed};
use crate::SimulationSet;

pub mod events;

pub use events::*;

/// Movement Plugin
///
/// Порядок выполнения (внутри SimulationSet::Movement):
/// 1. apply_movement_orders — MovementOrder → MovementCommand
/// 2. integrate_movement — движение к цели, Arrived события
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MoveRequestIds>()
            .add_event::<MovementOrder>()
            .add_event::<MovementFinished>()
            .add_systems(
                FixedUpdate,
                (apply_movement_orders, integrate_movement)
                    .chain()
                    .in_set(SimulationSet::Movement),
            );
    }
}

/// Уникальный id запроса на перемещение (заменяет completion callback)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct MoveRequestId(pub u64);

/// Аллокатор request id (монотонный)
#[derive(Resource, Debug, Default)]
pub struct MoveRequestIds {
    next: u64,
}

impl MoveRequestIds {
    pub fn allocate(&mut self) -> MoveRequestId {
        self.next += 1;
        MoveRequestId(self.next)
    }
}

/// Система: применить MovementOrder события
///
/// Активный request при вытеснении получает MovementFinished::Abandoned.
pub fn apply_movement_orders(
    mut orders: EventReader<MovementOrder>,
    mut movers: Query<&mut MovementCommand>,
    mut finished: EventWriter<MovementFinished>,
) {
    for order in orders.read() {
        let Ok(mut command) = movers.get_mut(order.entity()) else {
            continue;
        };

        if let Some(previous) = command.active_request() {
            finished.write(MovementFinished {
                entity: order.entity(),
                request: previous,
                outcome: MoveOutcome::Abandoned,
            });
        }

        *command = match *order {
            MovementOrder::MoveTo {
                destination,
                request,
                ..
            } => MovementCommand::MoveToPosition {
                target: destination,
                request,
            },
            MovementOrder::Stop { .. } => MovementCommand::Idle,
        };
    }
}

/// Система: движение к цели
///
/// Шаг = speed × delta; если до цели ближе шага или stopping_distance —
/// snap в цель, команда → Idle, MovementFinished::Arrived.
/// Актор без скорости (0 / NaN) до цели не дойдёт → Abandoned.
pub fn integrate_movement(
    mut movers: Query<
        (Entity, &mut Transform, &mut MovementCommand, &MovementSpeed),
        Without<Deactivated>,
    >,
    mut finished: EventWriter<MovementFinished>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut command, speed) in movers.iter_mut() {
        let MovementCommand::MoveToPosition { target, request } = *command else {
            continue;
        };

        let to_target = target - transform.translation;
        let distance = to_target.length();
        let step = speed.speed * delta;

        if distance <= speed.stopping_distance.max(step) {
            transform.translation = target;
            *command = MovementCommand::Idle;
            finished.write(MovementFinished {
                entity,
                request,
                outcome: MoveOutcome::Arrived,
            });
        } else if !(step.is_finite() && speed.speed > 0.0) {
            *command = MovementCommand::Idle;
            finished.write(MovementFinished {
                entity,
                request,
                outcome: MoveOutcome::Abandoned,
            });
        } else {
            transform.translation += to_target / distance * step;
        }
    }
}
