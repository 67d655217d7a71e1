//! Stat system: influence receiver (StatsTracker), StatInfluence, health adapter
//!
//! ECS ответственность:
//! - StatsTracker компонент (значения + активные influences)
//! - ApplyInfluence события (sense passive influences, внешние источники)
//! - Продвижение durational influences каждый тик

use bevy::prelude::*;

use crate::SimulationSet;

pub mod health;
pub mod influence;
pub mod tracker;

pub use health::{HealthAdapter, HealthController};
pub use influence::{StatId, StatInfluence};
pub use tracker::{Stat, StatsTracker};

/// Запрос применить influence к цели (обрабатывается в SimulationSet::Influence)
#[derive(Event, Debug, Clone)]
pub struct ApplyInfluence {
    pub target: Entity,
    pub influence: StatInfluence,
    pub source: Option<Entity>,
}

/// Stats Plugin
///
/// Порядок выполнения (внутри SimulationSet::Influence):
/// 1. apply_influence_requests — ApplyInfluence → StatsTracker
/// 2. tick_stat_influences — durational influences
pub struct StatsPlugin;

impl Plugin for StatsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ApplyInfluence>().add_systems(
            FixedUpdate,
            (apply_influence_requests, tick_stat_influences)
                .chain()
                .in_set(SimulationSet::Influence),
        );
    }
}

/// Система: применить ApplyInfluence запросы
///
/// Цель без StatsTracker (или despawned) — запрос молча отбрасывается.
pub fn apply_influence_requests(
    mut requests: EventReader<ApplyInfluence>,
    mut trackers: Query<&mut StatsTracker>,
) {
    for request in requests.read() {
        let Ok(mut stats) = trackers.get_mut(request.target) else {
            continue;
        };

        match stats.try_add_influence(&request.influence, request.source) {
            Ok(()) => crate::log(&format!(
                "📈 Influence `{}` applied to {:?} ({} {:+})",
                request.influence.name,
                request.target,
                request.influence.stat,
                request.influence.max_change
            )),
            // Уже активно — нормальная ситуация для passive influences
            Err(crate::error::StatsError::AlreadyActive(_)) => {}
            Err(err) => crate::log_warning(&format!(
                "Influence `{}` rejected by {:?}: {}",
                request.influence.name, request.target, err
            )),
        }
    }
}

/// Система: продвинуть durational influences
pub fn tick_stat_influences(mut trackers: Query<&mut StatsTracker>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for mut stats in trackers.iter_mut() {
        if stats.active_influence_count() > 0 {
            stats.tick(delta);
        }
    }
}
