//! Whole-world scenarios run through `Physics::step`.

use super::*;
use crate::{
    collision::{ColliderMode, Polygon},
    math::Angle,
    physics::event::CollisionEvent,
};

use parking_lot::Mutex;

/// Velocity gained from default gravity in one step.
fn gravity_per_step() -> f64 {
    let params = PhysicsParams::default();
    params.gravity.y * params.fixed_delta * params.fixed_delta
}

/// A static floor whose top surface is at y = 400.
fn floor(physics: &mut Physics) -> (EntityKey, ColliderKey) {
    physics
        .spawn_collider(
            [200.0, 416.0],
            Collider::new(Polygon::rect(400.0, 32.0), ColliderMode::Static),
        )
        .unwrap()
}

fn recorder() -> (Arc<Mutex<Vec<CollisionEvent>>>, Arc<dyn CollisionListener>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_ = log.clone();
    let listener: Arc<dyn CollisionListener> =
        Arc::new(move |evt: &CollisionEvent, _: &CommandQueue| log_.lock().push(*evt));
    (log, listener)
}

/// Spawn 32×32 boxes at the given heights in the given order on the floor,
/// run 300 steps and check that none of them sank or lost its support.
fn assert_stack_settles(heights: &[f64]) {
    let mut physics = Physics::default();
    let (_, floor_coll) = floor(&mut physics);

    let mut boxes: Vec<(EntityKey, ColliderKey, f64)> = heights
        .iter()
        .map(|&y| {
            let (ent, coll, _) = physics
                .spawn_body([200.0, y], Collider::new_rect(32.0, 32.0), Rigidbody::default())
                .unwrap();
            (ent, coll, y)
        })
        .collect();

    for _ in 0..300 {
        physics.step();
    }
    assert_eq!(physics.tick_count(), 300);

    // bottom to top, each resting on the one before it
    boxes.sort_by(|a, b| b.2.total_cmp(&a.2));
    let supports = std::iter::once(floor_coll).chain(boxes.iter().map(|b| b.1));
    for ((ent, coll, start_y), support) in boxes.iter().zip(supports) {
        let pos = physics.transform(*ent).unwrap().position;
        assert!(
            (pos.y - start_y).abs() < 1.0,
            "box sank from {} to {}",
            start_y,
            pos.y
        );
        assert_eq!(pos.x, 200.0);

        let coll = physics.get_collider(*coll).unwrap();
        assert!(coll.intersects());
        assert!(coll.intersections().contains(&support));
    }
}

#[test]
fn resting_stack_stays_put() {
    assert_stack_settles(&[384.0, 352.0, 320.0]);
}

#[test]
fn resting_stack_spawned_top_down() {
    // push-out favors whichever collider was registered later
    assert_stack_settles(&[320.0, 352.0, 384.0]);
}

#[test]
fn resting_stack_at_fractional_heights() {
    assert_stack_settles(&[384.25, 352.5, 320.75]);
    assert_stack_settles(&[320.75, 384.25, 352.5]);
}

#[test]
fn huge_force_on_a_resting_body() {
    let mut physics = Physics::default();
    floor(&mut physics);
    let (ent, coll, body) = physics
        .spawn_body([200.0, 384.0], Collider::new_rect(32.0, 32.0), Rigidbody::default())
        .unwrap();
    physics.step();
    assert!(physics.get_collider(coll).unwrap().intersects());

    physics
        .get_body_mut(body)
        .unwrap()
        .add_force(Vec2::new(0.0, -1e30));
    physics.step();

    // launched upward at the speed limit
    let vel = physics.get_body(body).unwrap().velocity;
    assert!(vel.y < 0.0);
    assert!((vel.mag() - 100.0).abs() < 1e-9, "{:?}", vel);
    let pos = physics.transform(ent).unwrap().position;
    assert!((pos.y - 284.0).abs() < 1e-6, "{}", pos.y);
}

#[test]
fn elastic_bounce_keeps_impact_speed() {
    let mut physics = Physics::default();
    floor(&mut physics);
    let (_, _, ball) = physics
        .spawn_body(
            [200.0, 300.0],
            Collider::new_rect(16.0, 16.0),
            Rigidbody::default().with_bounciness(1.0),
        )
        .unwrap();

    let mut prev_vel = 0.0;
    for _ in 0..200 {
        physics.step();
        let vel = physics.get_body(ball).unwrap().velocity.y;
        if vel < 0.0 {
            // gravity was added in the same step before the bounce
            let impact = prev_vel + gravity_per_step();
            assert!(prev_vel > 1.0);
            assert!((vel.abs() - impact).abs() < 1e-9, "{} vs {}", vel, impact);
            return;
        }
        prev_vel = vel;
    }
    panic!("ball never bounced");
}

#[test]
fn inelastic_landing_stops_dead() {
    let mut physics = Physics::default();
    floor(&mut physics);
    let (_, coll, ball) = physics
        .spawn_body(
            [200.0, 300.0],
            Collider::new_rect(16.0, 16.0),
            Rigidbody::default().with_bounciness(0.0),
        )
        .unwrap();

    for _ in 0..200 {
        physics.step();
        if physics.get_collider(coll).unwrap().intersects() {
            let vel = physics.get_body(ball).unwrap().velocity;
            assert!(vel.mag() < 1e-9, "{:?}", vel);
            // resting on the surface, not inside it
            let pos = physics.transform(physics.entities().collider_owner(coll).unwrap());
            assert!(pos.unwrap().position.y <= 392.0 + 1.0);
            return;
        }
    }
    panic!("ball never landed");
}

#[test]
fn static_floor_is_never_pushed() {
    let mut physics = Physics::default();
    let (floor_ent, _) = floor(&mut physics);
    // sunk halfway into the floor
    let (ent, _, _) = physics
        .spawn_body([150.0, 400.0], Collider::new_rect(32.0, 32.0), Rigidbody::default())
        .unwrap();

    physics.step();
    assert_eq!(
        physics.transform(floor_ent).unwrap().position,
        Vec2::new(200.0, 416.0)
    );
    // pushed back up to rest on the surface
    let pos = physics.transform(ent).unwrap().position;
    assert!((pos.y - 384.0).abs() < 1e-9, "{}", pos.y);
}

#[test]
fn trigger_reports_without_touching_positions() {
    let mut physics = Physics::default();
    let (trig_ent, trig) = physics
        .spawn_collider(
            [0.0, 0.0],
            Collider::new(Polygon::square(20.0), ColliderMode::Trigger),
        )
        .unwrap();
    let (mover_ent, mover, _) = physics
        .spawn_body(
            [-40.0, 0.0],
            Collider::new_rect(10.0, 10.0),
            Rigidbody::new_kinematic().with_velocity(Vec2::new(2.0, 0.0)),
        )
        .unwrap();

    let (trig_log, trig_listener) = recorder();
    let (mover_log, mover_listener) = recorder();
    for kind in [EventKind::OverlapEnter, EventKind::OverlapExit] {
        physics.subscribe(trig, kind, trig_listener.clone()).unwrap();
        physics
            .subscribe(mover, kind, mover_listener.clone())
            .unwrap();
    }

    for step in 0..40 {
        physics.step();
        let expected_x = -40.0 + 2.0 * (step + 1) as f64;
        assert_eq!(
            physics.transform(mover_ent).unwrap().position,
            Vec2::new(expected_x, 0.0)
        );
        assert_eq!(physics.transform(trig_ent).unwrap().position, Vec2::zero());
    }

    itertools::assert_equal(
        trig_log.lock().iter().copied(),
        [
            CollisionEvent::OverlapEnter {
                collider: trig,
                other: mover,
            },
            CollisionEvent::OverlapExit {
                collider: trig,
                other: mover,
            },
        ],
    );
    itertools::assert_equal(
        mover_log.lock().iter().copied(),
        [
            CollisionEvent::OverlapEnter {
                collider: mover,
                other: trig,
            },
            CollisionEvent::OverlapExit {
                collider: mover,
                other: trig,
            },
        ],
    );
}

#[test]
fn stay_and_check_finished_events() {
    let mut physics = Physics::default();
    let (_, floor_coll) = floor(&mut physics);
    physics
        .spawn_body([200.0, 384.0], Collider::new_rect(32.0, 32.0), Rigidbody::default())
        .unwrap();

    let (log, listener) = recorder();
    for kind in [
        EventKind::OverlapEnter,
        EventKind::OverlapStay,
        EventKind::CheckFinished,
    ] {
        physics
            .subscribe(floor_coll, kind, listener.clone())
            .unwrap();
    }
    assert!(matches!(
        physics.subscribe(floor_coll, EventKind::OverlapStay, listener.clone()),
        Err(PhysicsError::DuplicateListener(EventKind::OverlapStay))
    ));

    for _ in 0..3 {
        physics.step();
    }
    let kinds: Vec<EventKind> = log.lock().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::OverlapEnter,
            EventKind::CheckFinished,
            EventKind::OverlapStay,
            EventKind::CheckFinished,
            EventKind::OverlapStay,
            EventKind::CheckFinished,
        ]
    );
    let ticks: Vec<u64> = log
        .lock()
        .iter()
        .filter_map(|e| match e {
            CollisionEvent::CheckFinished { tick, .. } => Some(*tick),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![0, 1, 2]);

    assert!(physics.unsubscribe(floor_coll, EventKind::OverlapStay, &listener));
    physics.step();
    assert_eq!(log.lock().last().map(|e| e.kind()), Some(EventKind::CheckFinished));
    assert_eq!(log.lock().len(), 7);
}

#[test]
fn listeners_change_the_world_through_commands() {
    let mut physics = Physics::default();
    // a kill zone that removes whatever enters it
    let (_, zone) = physics
        .spawn_collider(
            [0.0, 50.0],
            Collider::new(Polygon::rect(200.0, 20.0), ColliderMode::Trigger),
        )
        .unwrap();
    let (faller_ent, faller_coll, faller_body) = physics
        .spawn_body([0.0, 0.0], Collider::new_rect(8.0, 8.0), Rigidbody::default())
        .unwrap();

    let listener: Arc<dyn CollisionListener> =
        Arc::new(|evt: &CollisionEvent, commands: &CommandQueue| {
            if let Some(other) = evt.other() {
                commands.remove_collider(other);
            }
        });
    physics
        .subscribe(zone, EventKind::OverlapEnter, listener)
        .unwrap();

    let mut steps = 0;
    while physics.get_collider(faller_coll).is_some() {
        physics.step();
        steps += 1;
        assert!(steps < 200, "never reached the kill zone");
    }
    // the body went with its collider, the entity stays
    assert!(physics.get_body(faller_body).is_none());
    assert!(physics.transform(faller_ent).is_some());

    // commands queued from outside are applied on the next step
    let commands = physics.commands();
    commands.remove_entity(faller_ent);
    commands.spawn(Transform::from([5.0, 5.0]), None, Some(Rigidbody::new_static()));
    assert_eq!(physics.entities().entity_count(), 2);
    physics.step();
    assert!(physics.transform(faller_ent).is_none());
    assert_eq!(physics.entities().entity_count(), 2);
    assert_eq!(physics.entities().body_count(), 1);
}

#[test]
fn fixed_timestep_drives_steps() {
    let mut physics = Physics::default();
    let (_, _, body) = physics
        .spawn_body([0.0, 0.0], Collider::new_rect(4.0, 4.0), Rigidbody::default())
        .unwrap();

    assert_eq!(physics.tick(1.0 / 120.0), 0);
    assert_eq!(physics.get_body(body).unwrap().velocity, Vec2::zero());
    assert_eq!(physics.tick(1.0 / 120.0), 1);
    assert_eq!(physics.tick(1.0 / 30.0), 2);
    assert_eq!(physics.tick_count(), 3);
    let vel = physics.get_body(body).unwrap().velocity;
    assert!((vel.y - 3.0 * gravity_per_step()).abs() < 1e-9);

    // a huge frame is clamped instead of running hundreds of steps
    assert!(physics.tick(10.0) <= 8);
}

#[test]
fn custom_force_field() {
    let mut physics = Physics::default();
    let (_, _, body) = physics
        .spawn_body(
            [0.0, 0.0],
            Collider::new_rect(4.0, 4.0),
            Rigidbody::new_dynamic(2.0).with_gravity_scale(0.5),
        )
        .unwrap();
    let field = forcefield::Gravity(Vec2::new(3600.0, 0.0));
    physics.step_with_field(&field);
    let vel = physics.get_body(body).unwrap().velocity;
    // acceleration scaled by gravity scale, independent of mass
    assert!((vel.x - 0.5).abs() < 1e-9);
    assert_eq!(vel.y, 0.0);
}

#[test]
fn combined_and_empty_fields() {
    use forcefield::{Gravity, NoneField, PointGravity};

    let mut physics = Physics::default();
    let (ent, _, body) = physics
        .spawn_body([0.0, 0.0], Collider::new_rect(4.0, 4.0), Rigidbody::default())
        .unwrap();

    physics.step_with_field(&NoneField);
    assert_eq!(physics.get_body(body).unwrap().velocity, Vec2::zero());
    assert_eq!(physics.transform(ent).unwrap().position, Vec2::zero());

    // without falloff the point source pulls equally hard everywhere
    let field = Gravity(physics.params.gravity)
        .plus(PointGravity::new(Vec2::new(500.0, 0.0), 3600.0).with_falloff(0.0));
    physics.step_with_field(&field);
    let vel = physics.get_body(body).unwrap().velocity;
    assert!((vel.x - 1.0).abs() < 1e-9);
    assert!((vel.y - gravity_per_step()).abs() < 1e-9);

    // counted as regular steps by the clock driven entry point as well
    assert_eq!(physics.tick_with_field(1.0 / 60.0, &field), 1);
    assert!((physics.get_body(body).unwrap().velocity.x - 2.0).abs() < 1e-9);
}

#[test]
fn rotated_entities_rotate_their_shapes() {
    let mut physics = Physics::default();
    let ent = physics.spawn(Transform::new(Vec2::new(100.0, 100.0), Angle::Deg(90.0)));
    let coll = physics
        .attach_collider(
            ent,
            Collider::new(Polygon::rect(40.0, 4.0), ColliderMode::Static),
        )
        .unwrap();
    physics.step();

    let bounds = physics.get_collider(coll).unwrap().bounding();
    assert_eq!(bounds.width(), 4.0);
    assert_eq!(bounds.height(), 40.0);
    assert_eq!(physics.query_point(Vec2::new(100.0, 118.0)), vec![coll]);
    assert!(physics.query_point(Vec2::new(118.0, 100.0)).is_empty());
}

#[test]
fn default_collider_and_cascading_removal() {
    let mut physics = Physics::default();
    let ent = physics.spawn([0.0, 0.0]);
    let body = physics.attach_body(ent, Rigidbody::default()).unwrap();
    let coll = physics.entities().body_collider(body).unwrap();
    assert_eq!(physics.get_collider(coll).unwrap().mode, ColliderMode::Physical);

    assert!(physics.remove_collider(coll).is_some());
    assert!(physics.get_body(body).is_none());
    // stepping with nothing attached is fine
    physics.step();

    physics.clear();
    assert_eq!(physics.entities().entity_count(), 0);
}
