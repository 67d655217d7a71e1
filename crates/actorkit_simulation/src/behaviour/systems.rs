//! Behaviour ECS systems
//!
//! Порядок внутри SimulationSet::Decide:
//! 1. engage_sensed — Sight sense увидел цель → BeginInteraction
//! 2. handle_cancel_requests — CancelInteraction / Deactivated → Idle
//! 3. handle_begin_requests — BeginInteraction → Starting
//! 4. tick_behaviours — FSM (одна фаза за тик)

use ahash::{AHashMap, AHashSet};
use bevy::prelude::*;

use crate::behaviour::{
    select_target, BeginInteraction, BeginResult, BehaviourCancelled, BehaviourCompleted,
    BehaviourFailed, BehaviourState, CancelInteraction, EffectSequence, InteractionBehaviour,
    InteractionOutcome, PendingMove, SequenceStep,
};
use crate::components::{Deactivated, MovementCommand};
use crate::cues::PromptCue;
use crate::movement::{MoveOutcome, MoveRequestIds, MovementFinished, MovementOrder};
use crate::senses::systems::display_name;
use crate::senses::{Sense, SenseKind};
use crate::spatial::root_entity;
use crate::stats::StatsTracker;
use crate::DeterministicRng;

/// Маркер: актор сам атакует ближайшего, кого видит Sight sense
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct EngageSensed;

/// Система: Sight sense → BeginInteraction
///
/// Только для Idle акторов с EngageSensed. Участники = [актор, ближайший].
pub fn engage_sensed(
    senses: Query<(Entity, &Sense)>,
    parents: Query<&ChildOf>,
    actors: Query<&InteractionBehaviour, (With<EngageSensed>, Without<Deactivated>)>,
    mut begin: EventWriter<BeginInteraction>,
) {
    for (entity, sense) in senses.iter() {
        if sense.kind != SenseKind::Sight {
            continue;
        }

        let Some(nearest) = sense.nearest() else {
            continue;
        };

        let actor = root_entity(entity, &parents);
        let Ok(behaviour) = actors.get(actor) else {
            continue;
        };

        if behaviour.is_idle() {
            begin.write(BeginInteraction {
                actor,
                participants: vec![actor, nearest.entity],
            });
        }
    }
}

/// Система: отмена (событие или деактивация)
///
/// Активный pending move останавливается, эффекты больше не применяются.
pub fn handle_cancel_requests(
    mut cancels: EventReader<CancelInteraction>,
    mut behaviours: Query<(Entity, &mut InteractionBehaviour, Has<Deactivated>)>,
    mut cancelled: EventWriter<BehaviourCancelled>,
    mut orders: EventWriter<MovementOrder>,
    names: Query<&Name>,
) {
    let requested: AHashSet<Entity> = cancels.read().map(|cancel| cancel.actor).collect();

    for (entity, mut behaviour, deactivated) in behaviours.iter_mut() {
        if !deactivated && !requested.contains(&entity) {
            continue;
        }

        let pending = behaviour.pending_move();
        let phase = behaviour.state().name();
        if behaviour.cancel() {
            if pending.is_some() {
                orders.write(MovementOrder::Stop { entity });
            }
            cancelled.write(BehaviourCancelled { actor: entity });
            crate::log(&format!(
                "🛑 {} interaction cancelled in {}{}",
                display_name(entity, &names),
                phase,
                if deactivated { " (deactivated)" } else { "" }
            ));
        }
    }
}

/// Система: BeginInteraction → Starting
pub fn handle_begin_requests(
    mut requests: EventReader<BeginInteraction>,
    mut behaviours: Query<&mut InteractionBehaviour, Without<Deactivated>>,
    names: Query<&Name>,
) {
    for request in requests.read() {
        let Ok(mut behaviour) = behaviours.get_mut(request.actor) else {
            continue;
        };

        if behaviour.begin(request.participants.clone()) == BeginResult::Started {
            crate::log(&format!(
                "⚔️ {} starts interaction ({} participants)",
                display_name(request.actor, &names),
                request.participants.len()
            ));
        }
    }
}

/// Система: Interaction FSM
///
/// Одна фаза за тик:
/// - Starting: выбор цели, подход на optimal range (MovementOrder + request id)
/// - Preparing: ждём preparation_time
/// - Performing: EffectSequence, цель валидируется перед каждым influence
/// - Completing: BehaviourCompleted, release / repeat
pub fn tick_behaviours(
    mut behaviours: Query<
        (Entity, &mut InteractionBehaviour, &Transform, &MovementCommand),
        Without<Deactivated>,
    >,
    positions: Query<&Transform>,
    mut trackers: Query<&mut StatsTracker>,
    names: Query<&Name>,
    mut movement_finished: EventReader<MovementFinished>,
    mut orders: EventWriter<MovementOrder>,
    mut failed: EventWriter<BehaviourFailed>,
    mut completed: EventWriter<BehaviourCompleted>,
    mut cues: EventWriter<PromptCue>,
    mut request_ids: ResMut<MoveRequestIds>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    let mut arrivals: AHashMap<Entity, Vec<MovementFinished>> = AHashMap::new();
    for finished in movement_finished.read() {
        arrivals.entry(finished.entity).or_default().push(*finished);
    }

    for (entity, mut behaviour, transform, command) in behaviours.iter_mut() {
        let state = behaviour.state().clone();

        match state {
            BehaviourState::Idle => {}

            BehaviourState::Starting => {
                if behaviour.target().is_none() {
                    // Исчезнувшие участники не рассматриваются
                    behaviour.retain_participants(|participant| {
                        *participant == entity || trackers.contains(*participant)
                    });

                    match select_target(behaviour.participants(), entity, &mut rng.rng) {
                        Ok(target) => {
                            behaviour.bind_target(target);
                            crate::log(&format!(
                                "🎯 {} selected target {}",
                                display_name(entity, &names),
                                display_name(target, &names)
                            ));
                        }
                        Err(error) => {
                            crate::log_warning(&format!(
                                "{} can't start interaction: {}",
                                display_name(entity, &names),
                                error
                            ));
                            behaviour.release();
                            failed.write(BehaviourFailed {
                                actor: entity,
                                error,
                            });
                            continue;
                        }
                    }
                }

                let Some(target) = behaviour.target() else {
                    continue;
                };

                let target_position = match positions.get(target) {
                    Ok(target_transform) if trackers.contains(target) => {
                        target_transform.translation
                    }
                    _ => {
                        if behaviour.pending_move().is_some() {
                            orders.write(MovementOrder::Stop { entity });
                            behaviour.set_pending_move(None);
                        }
                        behaviour.set_state(BehaviourState::Completing {
                            outcome: InteractionOutcome::TargetLost,
                        });
                        continue;
                    }
                };

                if let Some(pending) = behaviour.pending_move() {
                    let outcome = arrivals.get(&entity).and_then(|events| {
                        events
                            .iter()
                            .find(|finished| finished.request == pending.request)
                            .map(|finished| finished.outcome)
                    });

                    match outcome {
                        Some(MoveOutcome::Arrived) => {
                            behaviour.set_pending_move(None);
                            enter_preparing(&mut behaviour, now);
                            continue;
                        }
                        Some(MoveOutcome::Abandoned) => {
                            behaviour.set_pending_move(None);
                            behaviour.set_state(BehaviourState::Completing {
                                outcome: InteractionOutcome::Interrupted,
                            });
                            continue;
                        }
                        None => {}
                    }
                }

                let actor_position = transform.translation;
                let desired = approach_point(
                    actor_position,
                    target_position,
                    behaviour.config.optimal_range,
                );
                let tolerance = behaviour.config.arriving_distance_squared;

                let reference = behaviour
                    .pending_move()
                    .map(|pending| pending.destination)
                    .unwrap_or_else(|| command.destination(actor_position));

                if reference.distance_squared(desired) > tolerance {
                    let request = request_ids.allocate();
                    orders.write(MovementOrder::MoveTo {
                        entity,
                        destination: desired,
                        request,
                    });
                    behaviour.set_pending_move(Some(PendingMove {
                        request,
                        destination: desired,
                    }));
                } else if behaviour.pending_move().is_none()
                    && actor_position.distance_squared(desired) <= tolerance
                {
                    enter_preparing(&mut behaviour, now);
                }
            }

            BehaviourState::Preparing { until } => {
                if now < until {
                    continue;
                }

                // Цель могла пропасть за время замаха
                if !behaviour.target().is_some_and(|target| trackers.contains(target)) {
                    behaviour.set_state(BehaviourState::Completing {
                        outcome: InteractionOutcome::TargetLost,
                    });
                    continue;
                }

                let sequence = EffectSequence::start(now, behaviour.config.time_until_effect);
                behaviour.set_state(BehaviourState::Performing { sequence });

                if let Some(cue) = behaviour.config.perform_cue.clone() {
                    cues.write(PromptCue { actor: entity, cue });
                }
            }

            BehaviourState::Performing { mut sequence } => {
                let step = sequence.poll(
                    now,
                    behaviour.config.hit_influences.len(),
                    behaviour.config.influence_interval,
                    behaviour.config.completion_delay,
                );

                match step {
                    SequenceStep::Pending => {}
                    SequenceStep::Finished => {
                        behaviour.set_state(BehaviourState::Completing {
                            outcome: InteractionOutcome::Finished,
                        });
                    }
                    SequenceStep::Apply(index) => {
                        let tracker = match behaviour.target() {
                            Some(target) => trackers.get_mut(target).ok(),
                            None => None,
                        };
                        let Some(mut stats) = tracker else {
                            crate::log_warning(&format!(
                                "{} lost its target mid-sequence",
                                display_name(entity, &names)
                            ));
                            behaviour.set_state(BehaviourState::Completing {
                                outcome: InteractionOutcome::TargetLost,
                            });
                            continue;
                        };

                        let influence = &behaviour.config.hit_influences[index];
                        match stats.try_add_influence(influence, Some(entity)) {
                            Ok(()) => {
                                crate::log(&format!(
                                    "💥 {} applied `{}` ({} {:+})",
                                    display_name(entity, &names),
                                    influence.name,
                                    influence.stat,
                                    influence.max_change
                                ));
                                behaviour.record_influence();
                            }
                            Err(err) => crate::log_warning(&format!(
                                "{}: influence `{}` rejected: {}",
                                display_name(entity, &names),
                                influence.name,
                                err
                            )),
                        }

                        behaviour.set_state(BehaviourState::Performing { sequence });
                    }
                }
            }

            BehaviourState::Completing { outcome } => {
                let target = behaviour.target();
                completed.write(BehaviourCompleted {
                    actor: entity,
                    target,
                    outcome,
                    influences_applied: behaviour.influences_applied(),
                });
                crate::log_info(&format!(
                    "✅ {} interaction completed: {:?}, {} influences applied",
                    display_name(entity, &names),
                    outcome,
                    behaviour.influences_applied()
                ));

                if behaviour.config.repeat && outcome != InteractionOutcome::Interrupted {
                    behaviour.restart();
                } else {
                    behaviour.release();
                }
            }
        }
    }
}

fn enter_preparing(behaviour: &mut InteractionBehaviour, now: f32) {
    let until = now + behaviour.config.preparation_time;
    behaviour.set_state(BehaviourState::Preparing { until });
}

/// Точка на стороне актора на расстоянии `optimal_range` от цели
///
/// Совпадающие позиции вырождаются в позицию цели.
pub fn approach_point(actor: Vec3, target: Vec3, optimal_range: f32) -> Vec3 {
    target + (actor - target).normalize_or_zero() * optimal_range
}
