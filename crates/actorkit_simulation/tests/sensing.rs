//! Sensing integration tests
//!
//! Headless App, время двигаем вручную (advance_fixed), проверяем:
//! - себя не видим (даже в той же точке)
//! - границы min/max range
//! - частота скана, деактивация, fail closed на ошибке конфигурации
//! - passive influence и hitbox'ы на дочерних entity

use bevy::prelude::*;
use actorkit_simulation::*;

const TICK: f32 = 1.0 / 60.0;

fn spawn_actor(world: &mut World, name: &str, position: Vec3) -> Entity {
    world
        .spawn((
            Actor,
            Name::new(name.to_owned()),
            Transform::from_translation(position),
            StatsTracker::new()
                .with_stat("health", Stat::new(100.0, 0.0, 100.0))
                .with_stat("fear", Stat::new(0.0, 0.0, 10.0)),
            SenseCollider::default(),
        ))
        .id()
}

fn attach_sense(world: &mut World, actor: Entity, authoring: SenseAuthoring) -> Entity {
    world
        .spawn((Name::new("sense"), authoring, ChildOf(actor)))
        .id()
}

fn sensed_entities(app: &App, sense: Entity) -> Vec<Entity> {
    app.world()
        .get::<Sense>(sense)
        .expect("sense initialised")
        .sensed()
        .iter()
        .map(|sensed| sensed.entity)
        .collect()
}

#[test]
fn test_colocated_actor_never_senses_itself() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    let other = spawn_actor(app.world_mut(), "Other", Vec3::ZERO);
    let sense = attach_sense(app.world_mut(), me, SenseAuthoring::sight("participant", 5.0));

    advance_fixed(&mut app, TICK);

    let sense_component = app.world().get::<Sense>(sense).unwrap();
    assert_eq!(sense_component.sensed().len(), 1);
    assert_eq!(sense_component.sensed()[0].entity, other);
    assert_eq!(sense_component.sensed()[0].distance_squared, 0.0);
    assert_eq!(sense_component.nearest().map(|n| n.entity), Some(other));
}

#[test]
fn test_range_boundaries() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    let at_min = spawn_actor(app.world_mut(), "AtMin", Vec3::new(2.0, 0.0, 0.0));
    let inside = spawn_actor(app.world_mut(), "Inside", Vec3::new(0.0, 0.0, 3.0));
    let at_max = spawn_actor(app.world_mut(), "AtMax", Vec3::new(-5.0, 0.0, 0.0));
    let beyond = spawn_actor(app.world_mut(), "Beyond", Vec3::new(5.5, 0.0, 0.0));
    let sense = attach_sense(
        app.world_mut(),
        me,
        SenseAuthoring::presence("actor", 5.0).with_min_range(2.0),
    );

    advance_fixed(&mut app, TICK);

    let sensed = sensed_entities(&app, sense);
    assert!(!sensed.contains(&at_min), "entity exactly at min_range must be excluded");
    assert!(sensed.contains(&inside));
    assert!(sensed.contains(&at_max), "entity exactly at max_range must be included");
    assert!(!sensed.contains(&beyond));
    assert!(!sensed.contains(&me));
    assert_eq!(sensed.len(), 2);
}

#[test]
fn test_sight_selects_nearest() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    spawn_actor(app.world_mut(), "Far", Vec3::new(4.0, 0.0, 0.0));
    let near = spawn_actor(app.world_mut(), "Near", Vec3::new(0.0, 0.0, -2.0));
    let sense = attach_sense(app.world_mut(), me, SenseAuthoring::sight("participant", 6.0));

    advance_fixed(&mut app, TICK);

    let nearest = app.world().get::<Sense>(sense).unwrap().nearest().unwrap();
    assert_eq!(nearest.entity, near);
    assert_eq!(nearest.distance_squared, 4.0);
}

#[test]
fn test_scan_respects_frequency() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    let other = spawn_actor(app.world_mut(), "Other", Vec3::new(1.0, 0.0, 0.0));
    let sense = attach_sense(
        app.world_mut(),
        me,
        SenseAuthoring::presence("actor", 5.0).with_scan_frequency(0.5),
    );

    advance_fixed(&mut app, TICK);
    assert_eq!(sensed_entities(&app, sense), vec![other]);

    // Уходит из радиуса — до следующего скана список не меняется
    app.world_mut().get_mut::<Transform>(other).unwrap().translation = Vec3::new(50.0, 0.0, 0.0);
    advance_fixed(&mut app, 0.1);
    assert_eq!(sensed_entities(&app, sense), vec![other]);

    advance_fixed(&mut app, 0.5);
    assert!(sensed_entities(&app, sense).is_empty());
}

#[test]
fn test_unknown_capability_disables_sense() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    spawn_actor(app.world_mut(), "Other", Vec3::X);
    let sense = attach_sense(app.world_mut(), me, SenseAuthoring::sight("Flammable", 5.0));

    run_ticks(&mut app, 10);

    let disabled = app.world().get::<SenseDisabled>(sense).unwrap();
    assert!(disabled.reason.contains("Flammable"));
    assert!(app.world().get::<Sense>(sense).is_none());
}

#[test]
fn test_deactivated_actor_clears_list() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    spawn_actor(app.world_mut(), "Other", Vec3::X);
    let sense = attach_sense(app.world_mut(), me, SenseAuthoring::sight("participant", 5.0));

    advance_fixed(&mut app, TICK);
    assert_eq!(sensed_entities(&app, sense).len(), 1);

    app.world_mut().entity_mut(me).insert(Deactivated);
    run_ticks(&mut app, 60);

    assert!(sensed_entities(&app, sense).is_empty());
    assert!(app.world().get::<Sense>(sense).unwrap().nearest().is_none());
}

#[test]
fn test_child_hitbox_resolves_to_root() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    let target = app
        .world_mut()
        .spawn((
            Actor,
            Name::new("Target"),
            Transform::from_xyz(3.0, 0.0, 0.0),
            StatsTracker::new(),
        ))
        .id();
    for height in [0.5, 1.5] {
        app.world_mut().spawn((
            Transform::from_xyz(0.0, height, 0.0),
            SenseCollider::default(),
            ChildOf(target),
        ));
    }
    let sense = attach_sense(app.world_mut(), me, SenseAuthoring::presence("actor", 5.0));

    advance_fixed(&mut app, TICK);

    let sense_component = app.world().get::<Sense>(sense).unwrap();
    assert_eq!(sense_component.sensed().len(), 1);
    assert_eq!(sense_component.sensed()[0].entity, target);
    assert_eq!(sense_component.sensed()[0].distance_squared, 9.0);
}

#[test]
fn test_passive_influence_applied_once_while_active() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    spawn_actor(app.world_mut(), "Other", Vec3::new(0.0, 0.0, 2.0));
    let sense = attach_sense(
        app.world_mut(),
        me,
        SenseAuthoring::presence("actor", 5.0)
            .with_scan_frequency(0.1)
            .with_passive_influence(StatInfluence::over_time("crowded", "fear", 5.0, 10.0)),
    );

    advance_fixed(&mut app, TICK);
    {
        let stats = app.world().get::<StatsTracker>(me).unwrap();
        assert!(stats.is_influence_active("crowded", Some(sense)));
        assert_eq!(stats.active_influence_count(), 1);
    }

    // Повторные сканы не дублируют активное влияние
    run_ticks(&mut app, 30);
    let stats = app.world().get::<StatsTracker>(me).unwrap();
    assert_eq!(stats.active_influence_count(), 1);
    assert!(stats.value(&StatId::from("fear")).unwrap() > 0.0);
}

#[test]
fn test_no_passive_influence_when_nothing_sensed() {
    let mut app = create_test_app(1);
    let me = spawn_actor(app.world_mut(), "Me", Vec3::ZERO);
    attach_sense(
        app.world_mut(),
        me,
        SenseAuthoring::presence("actor", 5.0)
            .with_passive_influence(StatInfluence::instant("startle", "fear", 1.0)),
    );

    run_ticks(&mut app, 30);

    let stats = app.world().get::<StatsTracker>(me).unwrap();
    assert_eq!(stats.value(&StatId::from("fear")), Some(0.0));
}
