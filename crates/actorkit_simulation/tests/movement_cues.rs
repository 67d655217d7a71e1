//! Movement service + actor cues integration tests
//!
//! Проверяем:
//! - каждый request завершается ровно один раз (Arrived / Abandoned)
//! - cue: марка, stop_movement перекрывает марку, duration

use bevy::ecs::event::Events;
use bevy::prelude::*;
use actorkit_simulation::*;
use actorkit_simulation::cues::ActiveCue;
use actorkit_simulation::movement::MoveRequestIds;

fn spawn_walker(world: &mut World, position: Vec3) -> Entity {
    world
        .spawn((Actor, Name::new("Walker"), Transform::from_translation(position)))
        .id()
}

fn events<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

fn move_to(app: &mut App, entity: Entity, destination: Vec3) -> MoveRequestId {
    let request = app.world_mut().resource_mut::<MoveRequestIds>().allocate();
    app.world_mut().send_event(MovementOrder::MoveTo {
        entity,
        destination,
        request,
    });
    request
}

fn finished_for(app: &App, request: MoveRequestId) -> Vec<MoveOutcome> {
    events::<MovementFinished>(app)
        .into_iter()
        .filter(|finished| finished.request == request)
        .map(|finished| finished.outcome)
        .collect()
}

fn position(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Transform>(entity).unwrap().translation
}

#[test]
fn test_arrival_reported_once() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);

    let request = move_to(&mut app, walker, Vec3::new(1.0, 0.0, 0.0));
    run_ticks(&mut app, 120);

    assert_eq!(finished_for(&app, request), vec![MoveOutcome::Arrived]);
    assert_eq!(position(&app, walker), Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(
        *app.world().get::<MovementCommand>(walker).unwrap(),
        MovementCommand::Idle
    );
}

#[test]
fn test_speed_limits_progress() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);

    move_to(&mut app, walker, Vec3::new(0.0, 0.0, 10.0));
    advance_fixed(&mut app, 1.0);

    // 2 м/с по умолчанию
    assert!((position(&app, walker).z - 2.0).abs() < 1e-4);
}

#[test]
fn test_superseded_request_abandoned_once() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);

    let first = move_to(&mut app, walker, Vec3::new(10.0, 0.0, 0.0));
    run_ticks(&mut app, 5);
    let second = move_to(&mut app, walker, Vec3::new(-1.0, 0.0, 0.0));
    run_ticks(&mut app, 240);

    assert_eq!(finished_for(&app, first), vec![MoveOutcome::Abandoned]);
    assert_eq!(finished_for(&app, second), vec![MoveOutcome::Arrived]);
    assert_eq!(events::<MovementFinished>(&app).len(), 2);
}

#[test]
fn test_stop_abandons_active_request() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);

    let request = move_to(&mut app, walker, Vec3::new(10.0, 0.0, 0.0));
    run_ticks(&mut app, 10);
    app.world_mut().send_event(MovementOrder::Stop { entity: walker });
    run_ticks(&mut app, 1);

    let stopped_at = position(&app, walker);
    run_ticks(&mut app, 60);

    assert_eq!(finished_for(&app, request), vec![MoveOutcome::Abandoned]);
    assert_eq!(position(&app, walker), stopped_at);
}

#[test]
fn test_deactivated_actor_does_not_move() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);
    app.world_mut().entity_mut(walker).insert(Deactivated);

    let request = move_to(&mut app, walker, Vec3::new(1.0, 0.0, 0.0));
    run_ticks(&mut app, 60);

    assert_eq!(position(&app, walker), Vec3::ZERO);
    assert!(finished_for(&app, request).is_empty());
}

#[test]
fn test_cue_moves_to_mark() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);
    app.world_mut()
        .resource_mut::<Marks>()
        .insert("gate", Vec3::new(0.0, 0.0, 3.0));

    app.world_mut().send_event(PromptCue {
        actor: walker,
        cue: ActorCue::go_to("gate"),
    });
    run_ticks(&mut app, 180);

    assert_eq!(position(&app, walker), Vec3::new(0.0, 0.0, 3.0));
    let cue = app.world().get::<ActiveCue>(walker).unwrap();
    assert_eq!(cue.expires_at, None);
}

#[test]
fn test_cue_with_missing_mark_does_not_move() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);

    app.world_mut().send_event(PromptCue {
        actor: walker,
        cue: ActorCue::go_to("nowhere"),
    });
    run_ticks(&mut app, 30);

    assert!(events::<MovementOrder>(&app)
        .iter()
        .all(|order| !matches!(order, MovementOrder::MoveTo { .. })));
    assert_eq!(position(&app, walker), Vec3::ZERO);
}

#[test]
fn test_stop_movement_overrides_mark() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);
    app.world_mut()
        .resource_mut::<Marks>()
        .insert("gate", Vec3::new(0.0, 0.0, 3.0));

    let request = move_to(&mut app, walker, Vec3::new(5.0, 0.0, 0.0));
    run_ticks(&mut app, 5);

    app.world_mut().send_event(PromptCue {
        actor: walker,
        cue: ActorCue {
            mark: Some("gate".to_owned()),
            stop_movement: true,
            duration: 0.0,
        },
    });
    run_ticks(&mut app, 1);

    let stopped_at = position(&app, walker);
    run_ticks(&mut app, 60);

    assert_eq!(position(&app, walker), stopped_at);
    assert_eq!(finished_for(&app, request), vec![MoveOutcome::Abandoned]);
    let move_orders = events::<MovementOrder>(&app)
        .into_iter()
        .filter(|order| matches!(order, MovementOrder::MoveTo { .. }))
        .count();
    assert_eq!(move_orders, 1);
}

#[test]
fn test_cue_duration_expires() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);

    app.world_mut().send_event(PromptCue {
        actor: walker,
        cue: ActorCue::stop().with_duration(0.5),
    });
    run_ticks(&mut app, 2);
    assert!(app.world().get::<ActiveCue>(walker).is_some());

    run_ticks(&mut app, 40);
    assert!(app.world().get::<ActiveCue>(walker).is_none());
}

#[test]
fn test_immobile_mover_abandons_request() {
    let mut app = create_test_app(1);
    let walker = spawn_walker(app.world_mut(), Vec3::ZERO);
    app.world_mut().entity_mut(walker).insert(MovementSpeed {
        speed: 0.0,
        stopping_distance: 0.05,
    });

    let request = move_to(&mut app, walker, Vec3::new(3.0, 0.0, 0.0));
    run_ticks(&mut app, 30);

    assert_eq!(finished_for(&app, request), vec![MoveOutcome::Abandoned]);
    assert_eq!(position(&app, walker), Vec3::ZERO);
    assert_eq!(
        *app.world().get::<MovementCommand>(walker).unwrap(),
        MovementCommand::Idle
    );
}
