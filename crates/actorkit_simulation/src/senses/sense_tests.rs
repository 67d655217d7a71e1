//! Tests for scan filtering and nearest selection (без ECS, через MockWorld).

use ahash::AHashMap;
use bevy::prelude::*;
use proptest::prelude::*;

use super::*;
use crate::error::ConfigError;
use crate::spatial::SenseLayers;

/// Плоский мир: позиции корней, иерархия, capabilities
#[derive(Default)]
struct MockWorld {
    parents: AHashMap<Entity, Entity>,
    positions: AHashMap<Entity, Vec3>,
    actors: Vec<Entity>,
    /// Hits в порядке "физического движка"
    colliders: Vec<(Entity, Vec3)>,
}

impl MockWorld {
    fn actor(&mut self, id: u32, position: Vec3) -> Entity {
        let entity = Entity::from_raw(id);
        self.positions.insert(entity, position);
        self.actors.push(entity);
        self.colliders.push((entity, position));
        entity
    }

    fn child(&mut self, id: u32, parent: Entity) -> Entity {
        let entity = Entity::from_raw(id);
        self.parents.insert(entity, parent);
        entity
    }
}

impl SenseWorld for MockWorld {
    fn root_of(&self, entity: Entity) -> Entity {
        let mut current = entity;
        while let Some(parent) = self.parents.get(&current) {
            current = *parent;
        }
        current
    }

    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.positions.get(&entity).copied()
    }

    fn has_capability(&self, entity: Entity, capability: Capability) -> bool {
        match capability {
            Capability::Actor => self.actors.contains(&entity),
            _ => false,
        }
    }

    fn overlap(&self, center: Vec3, radius: f32, _layers: SenseLayers, max_hits: usize) -> Vec<Entity> {
        self.colliders
            .iter()
            .filter(|(_, position)| center.distance_squared(*position) <= radius * radius)
            .map(|(entity, _)| *entity)
            .take(max_hits)
            .collect()
    }
}

fn config(min_range: f32, max_range: f32) -> SenseConfig {
    SenseConfig::from_authoring(&SenseAuthoring::sight("actor", max_range).with_min_range(min_range))
        .unwrap()
}

fn sensed(distances: &[f32]) -> Vec<SensedEntity> {
    distances
        .iter()
        .enumerate()
        .map(|(index, distance)| SensedEntity {
            entity: Entity::from_raw(index as u32 + 1),
            distance_squared: distance * distance,
        })
        .collect()
}

#[test]
fn test_colocated_observer_sees_only_other() {
    let mut world = MockWorld::default();
    let observer = world.actor(1, Vec3::ZERO);
    let sense_entity = world.child(2, observer);
    let other = world.actor(3, Vec3::ZERO);

    let result = scan(sense_entity, &config(0.0, 5.0), &world);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].entity, other);
    assert_eq!(result[0].distance_squared, 0.0);
}

#[test]
fn test_child_colliders_resolve_to_single_root() {
    let mut world = MockWorld::default();
    let observer = world.actor(1, Vec3::ZERO);
    let target = world.actor(2, Vec3::new(3.0, 0.0, 0.0));
    // Два hitbox'а цели
    let hitbox_a = world.child(10, target);
    let hitbox_b = world.child(11, target);
    world.colliders.push((hitbox_a, Vec3::new(3.0, 1.0, 0.0)));
    world.colliders.push((hitbox_b, Vec3::new(3.0, 0.5, 0.0)));

    let result = scan(observer, &config(0.0, 5.0), &world);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].entity, target);
    assert_eq!(result[0].distance_squared, 9.0);
}

#[test]
fn test_min_range_boundary_excluded() {
    let mut world = MockWorld::default();
    let observer = world.actor(1, Vec3::ZERO);
    world.actor(2, Vec3::new(2.0, 0.0, 0.0));
    let outside = world.actor(3, Vec3::new(2.5, 0.0, 0.0));

    let result = scan(observer, &config(2.0, 5.0), &world);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].entity, outside);
}

#[test]
fn test_max_range_boundary_included() {
    let mut world = MockWorld::default();
    let observer = world.actor(1, Vec3::ZERO);
    let edge = world.actor(2, Vec3::new(0.0, 0.0, 5.0));
    world.actor(3, Vec3::new(0.0, 0.0, 5.01));

    let result = scan(observer, &config(0.0, 5.0), &world);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].entity, edge);
}

#[test]
fn test_capability_filter() {
    let mut world = MockWorld::default();
    let observer = world.actor(1, Vec3::ZERO);
    // Не актор: есть коллайдер, нет capability
    let rock = Entity::from_raw(9);
    world.positions.insert(rock, Vec3::X);
    world.colliders.push((rock, Vec3::X));

    assert!(scan(observer, &config(0.0, 5.0), &world).is_empty());
}

#[test]
fn test_nearest_tie_prefers_first() {
    let candidates = sensed(&[5.0, 3.0, 3.0]);
    assert_eq!(nearest_index(&candidates), Some(1));
    assert_eq!(NearestSelector.select(&candidates), Some(candidates[1]));
}

#[test]
fn test_nearest_empty() {
    assert_eq!(nearest_index(&[]), None);
    assert_eq!(NearestSelector.select(&[]), None);
}

#[test]
fn test_presence_has_no_refinement() {
    let config = config(0.0, 5.0);
    let mut sense = Sense::new(config, SenseKind::Presence);
    sense.replace_sensed(1.0, sensed(&[2.0]));

    assert_eq!(sense.sensed().len(), 1);
    assert_eq!(sense.nearest(), None);
    assert!(!sense.is_due(1.2));
    assert!(sense.is_due(1.5));
}

#[test]
fn test_unknown_capability_rejected() {
    let authoring = SenseAuthoring::sight("Flammable", 5.0);
    assert!(matches!(
        SenseConfig::from_authoring(&authoring),
        Err(ConfigError::UnknownCapability(name)) if name == "Flammable"
    ));
}

#[test]
fn test_capability_names() {
    assert_eq!("influence_receiver".parse::<Capability>().unwrap(), Capability::InfluenceReceiver);
    assert_eq!("InteractionParticipant".parse::<Capability>().unwrap(), Capability::Participant);
    assert_eq!("Actor".parse::<Capability>().unwrap(), Capability::Actor);
}

#[test]
fn test_invalid_numbers_rejected() {
    let inverted = SenseAuthoring::sight("actor", 2.0).with_min_range(3.0);
    assert!(matches!(
        SenseConfig::from_authoring(&inverted),
        Err(ConfigError::InvalidRange { .. })
    ));

    let frozen = SenseAuthoring::sight("actor", 2.0).with_scan_frequency(0.0);
    assert!(matches!(
        SenseConfig::from_authoring(&frozen),
        Err(ConfigError::InvalidScanFrequency(_))
    ));

    let blind = SenseAuthoring {
        max_candidates: 0,
        ..SenseAuthoring::sight("actor", 2.0)
    };
    assert!(matches!(
        SenseConfig::from_authoring(&blind),
        Err(ConfigError::ZeroCandidates)
    ));
}

#[test]
fn test_non_finite_passive_influence_rejected() {
    let anxious = SenseAuthoring::presence("actor", 4.0).with_passive_influence(
        crate::stats::StatInfluence::over_time("crowded", "fear", 2.0, f32::NAN),
    );

    assert!(matches!(
        SenseConfig::from_authoring(&anxious),
        Err(ConfigError::InvalidInfluence(message)) if message.contains("crowded")
    ));
}

proptest! {
    #[test]
    fn prop_scan_never_contains_observer_or_duplicates(
        positions in prop::collection::vec((-10.0f32..10.0, -10.0f32..10.0), 0..24),
        min_range in 0.0f32..3.0,
    ) {
        let mut world = MockWorld::default();
        let observer = world.actor(1, Vec3::ZERO);
        // Лишний коллайдер самого наблюдателя
        let own_hitbox = world.child(2, observer);
        world.colliders.push((own_hitbox, Vec3::ZERO));

        for (index, (x, z)) in positions.iter().enumerate() {
            world.actor(100 + index as u32, Vec3::new(*x, 0.0, *z));
        }

        let result = scan(observer, &config(min_range, 8.0), &world);

        for (index, candidate) in result.iter().enumerate() {
            prop_assert_ne!(candidate.entity, observer);
            prop_assert!(result[..index].iter().all(|other| other.entity != candidate.entity));
            prop_assert!(candidate.distance_squared <= 64.0);
            if min_range > 0.0 {
                prop_assert!(candidate.distance_squared > min_range * min_range);
            }
        }
    }

    #[test]
    fn prop_nearest_is_minimum_and_first(distances in prop::collection::vec(0.0f32..50.0, 1..20)) {
        let candidates = sensed(&distances);
        let index = nearest_index(&candidates).unwrap();
        let best = candidates[index].distance_squared;

        prop_assert!(candidates.iter().all(|c| c.distance_squared >= best));
        prop_assert!(candidates[..index].iter().all(|c| c.distance_squared > best));
    }
}
