//! Actor cues — "режиссёрские" указания актору
//!
//! Cue может:
//! - отправить актора к именованной марке (Marks resource)
//! - остановить движение (перекрывает марку)
//! - держать актора в cue `duration` секунд (0 = без ограничения)

use ahash::AHashMap;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::movement::{MoveRequestIds, MovementOrder};
use crate::senses::systems::display_name;
use crate::SimulationSet;

/// Указание актору
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorCue {
    /// Имя марки, к которой идти
    pub mark: Option<String>,
    /// Остановиться (марка игнорируется)
    pub stop_movement: bool,
    /// Длительность фазы cue, 0 = без ограничения
    pub duration: f32,
}

impl ActorCue {
    pub fn go_to(mark: impl Into<String>) -> Self {
        Self {
            mark: Some(mark.into()),
            ..Default::default()
        }
    }

    pub fn stop() -> Self {
        Self {
            stop_movement: true,
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }
}

/// Event: выполнить cue
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PromptCue {
    pub actor: Entity,
    pub cue: ActorCue,
}

/// Именованные точки сцены
#[derive(Resource, Debug, Clone, Default)]
pub struct Marks {
    positions: AHashMap<String, Vec3>,
}

impl Marks {
    pub fn insert(&mut self, name: impl Into<String>, position: Vec3) {
        self.positions.insert(name.into(), position);
    }

    pub fn get(&self, name: &str) -> Option<Vec3> {
        self.positions.get(name).copied()
    }
}

/// Актор сейчас выполняет cue
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ActiveCue {
    pub cue: ActorCue,
    /// None — без ограничения по времени
    pub expires_at: Option<f32>,
}

/// Cues Plugin
///
/// prompt_cues → expire_cues, в SimulationSet::Decide после behaviour систем
/// (perform cue отрабатывает в том же тике).
pub struct CuesPlugin;

impl Plugin for CuesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Marks>()
            .add_event::<PromptCue>()
            .add_systems(
                FixedUpdate,
                (prompt_cues, expire_cues)
                    .chain()
                    .in_set(SimulationSet::Decide)
                    .after(crate::behaviour::tick_behaviours),
            );
    }
}

/// Система: обработать PromptCue события
pub fn prompt_cues(
    mut commands: Commands,
    mut prompts: EventReader<PromptCue>,
    mut orders: EventWriter<MovementOrder>,
    mut request_ids: ResMut<MoveRequestIds>,
    marks: Res<Marks>,
    actors: Query<Entity>,
    names: Query<&Name>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for prompt in prompts.read() {
        let Ok(actor) = actors.get(prompt.actor) else {
            continue;
        };
        let cue = &prompt.cue;

        if cue.stop_movement {
            orders.write(MovementOrder::Stop { entity: actor });
        } else if let Some(mark) = cue.mark.as_deref().filter(|mark| !mark.trim().is_empty()) {
            match marks.get(mark) {
                Some(destination) => {
                    orders.write(MovementOrder::MoveTo {
                        entity: actor,
                        destination,
                        request: request_ids.allocate(),
                    });
                }
                None => crate::log_warning(&format!(
                    "{} has a mark set, but mark `{}` doesn't exist in the scene",
                    display_name(actor, &names),
                    mark
                )),
            }
        }

        let expires_at = (cue.duration > 0.0).then(|| now + cue.duration);
        commands.entity(actor).insert(ActiveCue {
            cue: cue.clone(),
            expires_at,
        });
    }
}

/// Система: снять истёкшие cues
pub fn expire_cues(
    mut commands: Commands,
    active: Query<(Entity, &ActiveCue)>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for (entity, cue) in active.iter() {
        if cue.expires_at.is_some_and(|expires_at| now >= expires_at) {
            commands.entity(entity).remove::<ActiveCue>();
        }
    }
}
