//! Sense ECS systems: init (authoring → Sense), scan + refine

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::components::{Actor, Deactivated};
use crate::senses::{scan, Capability, Sense, SenseAuthoring, SenseConfig, SenseDisabled, SenseWorld};
use crate::spatial::{root_entity, SenseLayers, SpatialGrid, SpatialQuery};
use crate::stats::{ApplyInfluence, StatsTracker};

/// ECS реализация SenseWorld поверх SpatialGrid
#[derive(SystemParam)]
pub struct SenseWorldParam<'w, 's> {
    grid: Res<'w, SpatialGrid>,
    parents: Query<'w, 's, &'static ChildOf>,
    transforms: Query<'w, 's, &'static Transform>,
    actors: Query<'w, 's, (), With<Actor>>,
    receivers: Query<'w, 's, (), With<StatsTracker>>,
    participants: Query<'w, 's, (), (With<Transform>, With<Name>, With<StatsTracker>)>,
}

impl SenseWorld for SenseWorldParam<'_, '_> {
    fn root_of(&self, entity: Entity) -> Entity {
        root_entity(entity, &self.parents)
    }

    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        // Корни не имеют родителя → локальный Transform = world
        self.transforms.get(entity).ok().map(|t| t.translation)
    }

    fn has_capability(&self, entity: Entity, capability: Capability) -> bool {
        match capability {
            Capability::InfluenceReceiver => self.receivers.contains(entity),
            Capability::Actor => self.actors.contains(entity),
            Capability::Participant => self.participants.contains(entity),
        }
    }

    fn overlap(
        &self,
        center: Vec3,
        radius: f32,
        layers: SenseLayers,
        max_hits: usize,
    ) -> Vec<Entity> {
        self.grid.overlap_sphere(center, radius, layers, max_hits)
    }
}

/// Система: резолв SenseAuthoring → Sense
///
/// Ошибка конфигурации логируется ОДИН раз, entity получает SenseDisabled
/// и больше не рассматривается (fail closed).
pub fn init_senses(
    mut commands: Commands,
    pending: Query<(Entity, &SenseAuthoring, Option<&Name>), (Without<Sense>, Without<SenseDisabled>)>,
) {
    for (entity, authoring, name) in pending.iter() {
        match SenseConfig::from_authoring(authoring) {
            Ok(config) => {
                commands.entity(entity).insert(Sense::new(config, authoring.kind));
            }
            Err(err) => {
                crate::log_error(&format!(
                    "❌ Sense {} ({:?}) disabled: {}",
                    name.map(Name::as_str).unwrap_or("<unnamed>"),
                    entity,
                    err
                ));
                commands.entity(entity).insert(SenseDisabled {
                    reason: err.to_string(),
                });
            }
        }
    }
}

/// Система: периодический скан
///
/// - не чаще чем раз в scan_frequency
/// - деактивированный актор не сканирует, список очищается
/// - passive influence → ApplyInfluence на корень, если список не пуст
pub fn scan_senses(
    mut senses: Query<(Entity, &mut Sense), Without<SenseDisabled>>,
    world: SenseWorldParam,
    deactivated: Query<(), With<Deactivated>>,
    names: Query<&Name>,
    mut influences: EventWriter<ApplyInfluence>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for (entity, mut sense) in senses.iter_mut() {
        let observer = world.root_of(entity);

        if deactivated.contains(observer) {
            if !sense.sensed().is_empty() {
                sense.clear();
            }
            continue;
        }

        if !sense.is_due(now) {
            continue;
        }

        let previous_nearest = sense.nearest().map(|nearest| nearest.entity);
        let sensed = scan(entity, &sense.config, &world);
        sense.replace_sensed(now, sensed);

        if let Some(nearest) = sense.nearest() {
            if previous_nearest != Some(nearest.entity) {
                crate::log(&format!(
                    "👁️ {} spotted {} at {:.2}m",
                    display_name(observer, &names),
                    display_name(nearest.entity, &names),
                    nearest.distance_squared.sqrt()
                ));
            }
        }

        if let Some(influence) = &sense.config.passive_influence {
            if !sense.sensed().is_empty() {
                influences.write(ApplyInfluence {
                    target: observer,
                    influence: influence.clone(),
                    source: Some(entity),
                });
            }
        }
    }
}

pub(crate) fn display_name(entity: Entity, names: &Query<&Name>) -> String {
    names
        .get(entity)
        .map(|name| name.as_str().to_owned())
        .unwrap_or_else(|_| format!("{:?}", entity))
}
