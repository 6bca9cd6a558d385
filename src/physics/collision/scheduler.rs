//! The collider passes of a physics step.
//!
//! Shapes are all updated before any check runs,
//! and checks only read the registry, so both passes can fan out over threads.
//! Everything that moves things or calls user code runs sequentially afterwards.

use super::{push_out_vector, ColliderMode};
use crate::{
    math::{self, Vec2},
    physics::{
        entity_set::{ColliderKey, EntitySet},
        event::{CollisionEvent, CommandQueue, EventKind},
    },
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::HashMap;

/// Result of one collider's check: what it found with its own mode's policy.
#[derive(Clone, Debug)]
pub(crate) struct Detection {
    pub key: ColliderKey,
    pub hits: Vec<ColliderKey>,
}

/// Move every collider's shape to its owner's current transform.
pub(crate) fn update_shapes(set: &mut EntitySet) {
    let _span = tracy_span!("update collider shapes", "update_shapes");

    let EntitySet {
        entities,
        colliders,
        coll_owners,
        ..
    } = set;
    let mut work: Vec<_> = colliders
        .iter_mut()
        .filter_map(|(key, coll)| {
            let owner = coll_owners.get(key)?;
            let tr = entities.get(owner.0)?.transform;
            Some((coll, tr))
        })
        .collect();

    #[cfg(feature = "parallel")]
    work.par_iter_mut()
        .for_each(|(coll, tr)| coll.sync_shape(tr));
    #[cfg(not(feature = "parallel"))]
    for (coll, tr) in &mut work {
        coll.sync_shape(tr);
    }
}

/// Run every collider's overlap check against the whole registry
/// and store the results in the colliders.
///
/// Returns the detections in registry order for the passes that follow.
pub(crate) fn check_intersections(set: &mut EntitySet) -> Vec<Detection> {
    let _span = tracy_span!("check intersections", "check_intersections");

    let detections: Vec<Detection> = {
        let all: Vec<_> = set.colliders().collect();
        let check = |&(key, coll): &(ColliderKey, &super::Collider)| Detection {
            key,
            hits: all
                .iter()
                .filter(|(other_key, other)| {
                    *other_key != key && coll.mode.detects(other.mode) && coll.overlaps_with(other)
                })
                .map(|(other_key, _)| *other_key)
                .collect(),
        };

        #[cfg(feature = "parallel")]
        let detections: Vec<Detection> = all.par_iter().map(check).collect();
        #[cfg(not(feature = "parallel"))]
        let detections: Vec<Detection> = all.iter().map(check).collect();
        detections
    };

    for det in &detections {
        if let Some(coll) = set.colliders.get_mut(det.key.0) {
            coll.intersections.clear();
            coll.intersections.extend_from_slice(&det.hits);
            coll.intersects = !det.hits.is_empty();
        }
    }

    detections
}

/// Separate overlapping `Physical` colliders from what they hit.
///
/// A `Static` collider is never moved. Between two `Physical` colliders
/// the one that comes later in registry order is moved, once per pair.
/// MTVs are computed from the shapes as they are at that moment,
/// so earlier pushes are taken into account.
pub(crate) fn push_out(set: &mut EntitySet, detections: &[Detection]) {
    let _span = tracy_span!("push out", "push_out");

    let order: HashMap<ColliderKey, usize> = detections
        .iter()
        .enumerate()
        .map(|(idx, det)| (det.key, idx))
        .collect();

    for (idx, det) in detections.iter().enumerate() {
        for &other_key in &det.hits {
            let (Some(coll), Some(other)) = (
                set.colliders.get(det.key.0),
                set.colliders.get(other_key.0),
            ) else {
                continue;
            };
            if coll.mode != ColliderMode::Physical {
                continue;
            }
            let push_self = match other.mode {
                ColliderMode::Static => true,
                ColliderMode::Physical if order.get(&other_key).map_or(false, |&o| o > idx) => {
                    false
                }
                _ => continue,
            };

            let mtv = coll.shape.mtv(&other.shape);
            if mtv == Vec2::zero() {
                continue;
            }
            let disp = push_out_vector(mtv, coll.shape.position(), other.shape.position());
            if push_self {
                translate_owner(set, det.key, disp);
            } else {
                translate_owner(set, other_key, -disp);
            }
        }
    }
}

/// Move the entity owning a collider by a whole-unit displacement
/// and bring the collider's shape along immediately.
fn translate_owner(set: &mut EntitySet, coll_key: ColliderKey, by: Vec2) {
    let Some(owner) = set.coll_owners.get(coll_key.0).copied() else {
        return;
    };
    let Some(ent) = set.entities.get_mut(owner.0) else {
        return;
    };
    ent.transform.position = math::translate_truncated(ent.transform.position, by);
    let tr = ent.transform;
    if let Some(coll) = set.colliders.get_mut(coll_key.0) {
        coll.sync_shape(&tr);
    }
    log::trace!("pushed {:?} out by {:?}", coll_key, by);
}

/// Rebuild every collider's overlap set from this step's detections
/// and deliver enter/stay/exit events, followed by `CheckFinished`.
///
/// Overlaps are symmetric: a collider found by another collider's check
/// is notified even if its own policy doesn't look for that collider.
pub(crate) fn notify(set: &mut EntitySet, detections: &[Detection], tick: u64, commands: &CommandQueue) {
    let _span = tracy_span!("collision events", "notify");

    let mut overlaps: HashMap<ColliderKey, Vec<ColliderKey>> = detections
        .iter()
        .map(|det| (det.key, det.hits.clone()))
        .collect();
    for det in detections {
        for hit in &det.hits {
            if let Some(list) = overlaps.get_mut(hit) {
                if !list.contains(&det.key) {
                    list.push(det.key);
                }
            }
        }
    }

    let mut events: Vec<CollisionEvent> = Vec::new();
    for det in detections {
        let Some(coll) = set.colliders.get_mut(det.key.0) else {
            continue;
        };
        let current = overlaps.remove(&det.key).unwrap_or_default();
        let previous = std::mem::replace(&mut coll.overlaps, current);
        if !coll.has_listeners() {
            continue;
        }

        let collider = det.key;
        for &other in &coll.overlaps {
            events.push(if previous.contains(&other) {
                CollisionEvent::OverlapStay { collider, other }
            } else {
                CollisionEvent::OverlapEnter { collider, other }
            });
        }
        for &other in previous.iter().filter(|o| !coll.overlaps.contains(o)) {
            events.push(CollisionEvent::OverlapExit { collider, other });
        }
        if !coll.listeners(EventKind::CheckFinished).is_empty() {
            events.push(CollisionEvent::CheckFinished { collider, tick });
        }
    }

    // overlap events for every collider go out before any CheckFinished
    events.sort_by_key(|evt| evt.kind() == EventKind::CheckFinished);
    for evt in &events {
        if let Some(coll) = set.colliders.get(evt.collider().0) {
            for listener in coll.listeners(evt.kind()) {
                listener.on_event(evt, commands);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::{Collider, Polygon},
        math::{Angle, Transform},
    };

    fn spawn(set: &mut EntitySet, pos: [f64; 2], size: f64, mode: ColliderMode) -> ColliderKey {
        let ent = set.spawn(Transform::from(pos));
        set.attach_collider(ent, Collider::new(Polygon::square(size), mode))
            .unwrap()
    }

    fn run_checks(set: &mut EntitySet) -> Vec<Detection> {
        update_shapes(set);
        check_intersections(set)
    }

    #[test]
    fn policies_decide_who_sees_whom() {
        let mut set = EntitySet::new();
        let phys = spawn(&mut set, [0.0, 0.0], 10.0, ColliderMode::Physical);
        let stat = spawn(&mut set, [5.0, 0.0], 10.0, ColliderMode::Static);
        let trig = spawn(&mut set, [0.0, 5.0], 10.0, ColliderMode::Trigger);
        let far = spawn(&mut set, [100.0, 0.0], 10.0, ColliderMode::Physical);
        run_checks(&mut set);

        let hits = |k| set.get_collider(k).unwrap().intersections().to_vec();
        assert_eq!(hits(phys), vec![stat]);
        assert_eq!(hits(stat), vec![phys]);
        assert_eq!(hits(trig), vec![phys, stat]);
        assert!(hits(far).is_empty());
        assert!(!set.get_collider(far).unwrap().intersects());
    }

    #[test]
    fn static_is_never_pushed() {
        let mut set = EntitySet::new();
        let floor_ent = set.spawn(Transform::from([0.0, 20.0]));
        let floor = set
            .attach_collider(floor_ent, Collider::new(Polygon::rect(100.0, 10.0), ColliderMode::Static))
            .unwrap();
        let box_ent = set.spawn(Transform::from([3.0, 12.0]));
        set.attach_collider(box_ent, Collider::new_rect(10.0, 10.0))
            .unwrap();

        let dets = run_checks(&mut set);
        push_out(&mut set, &dets);

        assert_eq!(
            set.get_entity(floor_ent).unwrap().transform.position,
            Vec2::new(0.0, 20.0)
        );
        // box bottom was at 17 inside the floor top at 15
        assert_eq!(
            set.get_entity(box_ent).unwrap().transform.position,
            Vec2::new(3.0, 10.0)
        );
        let box_coll = set.get_entity(box_ent).unwrap().collider().unwrap();
        let box_shape = &set.get_collider(box_coll).unwrap().shape;
        let floor_shape = &set.get_collider(floor).unwrap().shape;
        assert_eq!(box_shape.position(), Vec2::new(3.0, 10.0));
        assert_eq!(floor_shape.mtv(box_shape), Vec2::zero());
    }

    #[test]
    fn rotated_box_leaves_the_floor_in_one_push() {
        let mut set = EntitySet::new();
        let floor_ent = set.spawn(Transform::from([0.0, 20.0]));
        let floor = set
            .attach_collider(floor_ent, Collider::new(Polygon::rect(100.0, 10.0), ColliderMode::Static))
            .unwrap();
        // a 30 degree tilt puts the lowest corner about 3.66 below the floor top
        let box_ent = set.spawn(Transform::new(Vec2::new(3.5, 5.5), Angle::Deg(30.0)));
        let box_coll = set
            .attach_collider(box_ent, Collider::new_rect(20.0, 20.0))
            .unwrap();

        let dets = run_checks(&mut set);
        push_out(&mut set, &dets);

        // pushed straight up by whole units, keeping the fractional part
        assert_eq!(
            set.get_entity(box_ent).unwrap().transform.position,
            Vec2::new(3.5, 1.5)
        );
        let box_shape = &set.get_collider(box_coll).unwrap().shape;
        let floor_shape = &set.get_collider(floor).unwrap().shape;
        assert_eq!(floor_shape.mtv(box_shape), Vec2::zero());
        assert_eq!(box_shape.mtv(floor_shape), Vec2::zero());
    }

    #[test]
    fn physical_pair_is_pushed_once() {
        let mut set = EntitySet::new();
        let a_ent = set.spawn(Transform::from([0.0, 0.0]));
        set.attach_collider(a_ent, Collider::new_rect(10.0, 10.0))
            .unwrap();
        let b_ent = set.spawn(Transform::from([6.0, 1.0]));
        set.attach_collider(b_ent, Collider::new_rect(10.0, 10.0))
            .unwrap();

        let dets = run_checks(&mut set);
        push_out(&mut set, &dets);

        // the later collider absorbs the whole displacement
        assert_eq!(set.get_entity(a_ent).unwrap().transform.position, Vec2::zero());
        assert_eq!(
            set.get_entity(b_ent).unwrap().transform.position,
            Vec2::new(10.0, 1.0)
        );
    }

    #[test]
    fn triggers_never_push() {
        let mut set = EntitySet::new();
        let trig = spawn(&mut set, [0.0, 0.0], 10.0, ColliderMode::Trigger);
        let phys = spawn(&mut set, [2.0, 2.0], 10.0, ColliderMode::Physical);
        let dets = run_checks(&mut set);
        push_out(&mut set, &dets);

        for key in [trig, phys] {
            let owner = set.collider_owner(key).unwrap();
            let pos = set.get_entity(owner).unwrap().transform.position;
            assert_eq!(pos, set.get_collider(key).unwrap().shape.position());
        }
        assert_eq!(set.get_collider(phys).unwrap().shape.position(), Vec2::new(2.0, 2.0));
        assert!(set.get_collider(phys).unwrap().intersections().is_empty());

        // the physical collider still hears about the trigger
        notify(&mut set, &dets, 0, &CommandQueue::new());
        assert_eq!(set.get_collider(phys).unwrap().overlaps(), &[trig]);
    }
}
