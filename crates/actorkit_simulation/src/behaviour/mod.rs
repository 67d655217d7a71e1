//! Interaction behaviour — многофазное melee взаимодействие
//!
//! Idle → Starting → Preparing → Performing → Completing → Idle
//!
//! Архитектура:
//! - InteractionBehaviour компонент на акторе (состояние + конфиг)
//! - Триггеры через события (BeginInteraction / CancelInteraction)
//! - Подход к цели через movement service (request id вместо callback)
//! - Эффекты через EffectSequence (resumable task, опрашивается каждый тик)

use bevy::prelude::*;

use crate::SimulationSet;

pub mod effects;
pub mod events;
pub mod state;
pub mod systems;
pub mod targeting;


pub use effects::{EffectSequence, SequenceStep};
pub use events::*;
pub use state::{
    BeginResult, BehaviourState, InteractionBehaviour, InteractionOutcome, MeleeAuthoring,
    MeleeConfig, PendingMove,
};
pub use systems::{
    approach_point, engage_sensed, handle_begin_requests, handle_cancel_requests,
    tick_behaviours, EngageSensed,
};
pub use targeting::select_target;

/// Behaviour Plugin
///
/// Порядок выполнения (внутри SimulationSet::Decide):
/// 1. engage_sensed
/// 2. handle_cancel_requests
/// 3. handle_begin_requests
/// 4. tick_behaviours
pub struct BehaviourPlugin;

impl Plugin for BehaviourPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BeginInteraction>()
            .add_event::<CancelInteraction>()
            .add_event::<BehaviourFailed>()
            .add_event::<BehaviourCompleted>()
            .add_event::<BehaviourCancelled>()
            .add_systems(
                FixedUpdate,
                (
                    engage_sensed,
                    handle_cancel_requests,
                    handle_begin_requests,
                    tick_behaviours,
                )
                    .chain()
                    .in_set(SimulationSet::Decide),
            );
    }
}
