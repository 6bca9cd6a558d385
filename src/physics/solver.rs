//! Velocity-level collision response between rigidbodies.
//!
//! Bodies are resolved in priority order. Resolving one body can change the
//! velocity of the bodies it touches, and those get queued for another round
//! before moving on, so contact chains like stacks settle within a single step.

use super::{
    body::BodyType,
    entity_set::{BodyKey, ColliderKey, EntitySet},
    PhysicsParams,
};
use crate::{
    collision::{ColliderMode, ContactSide},
    math::Vec2,
};

use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet, VecDeque},
};

/// Bonus that puts static bodies ahead of everything else in the resolution order.
const STATIC_PRIORITY: i64 = 1000;

/// Resolution priority of a body.
///
/// Bodies touching more things, static bodies and fast bodies go first,
/// so supports are settled before whatever rests on them.
/// Saturates instead of overflowing for absurd speeds.
pub fn priority(body_type: BodyType, intersection_count: usize, velocity: Vec2) -> i64 {
    let static_bonus = if body_type == BodyType::Static {
        STATIC_PRIORITY
    } else {
        0
    };
    // float to int casts saturate, so only the sums can overflow
    i64::try_from(intersection_count)
        .unwrap_or(i64::MAX)
        .saturating_add(static_bonus)
        .saturating_add(velocity.mag() as i64)
}

/// Resolve every body's contacts in priority order.
pub(crate) fn resolve_all(set: &mut EntitySet, params: &PhysicsParams) {
    let _span = tracy_span!("resolve contacts", "resolve_all");

    let mut order: Vec<(BodyKey, i64)> = set
        .bodies()
        .map(|(key, body)| {
            let count = set
                .body_collider(key)
                .and_then(|c| set.get_collider(c))
                .map_or(0, |c| c.intersections().len());
            (key, priority(body.body_type, count, body.velocity))
        })
        .collect();
    // stable, so equal priorities keep registry order
    order.sort_by_key(|&(_, prio)| Reverse(prio));

    let cap = params.max_resolution_visits;
    let mut visits: HashMap<BodyKey, usize> = HashMap::with_capacity(order.len());
    let mut queue: VecDeque<BodyKey> = VecDeque::new();
    let mut queued: HashSet<BodyKey> = HashSet::new();
    let mut hit_cap = false;

    for (top, _) in order {
        if queued.insert(top) {
            queue.push_back(top);
        }
        while let Some(key) = queue.pop_front() {
            queued.remove(&key);
            let count = visits.entry(key).or_insert(0);
            if *count >= cap {
                hit_cap = true;
                continue;
            }
            *count += 1;

            for dep in resolve_body(set, key, params) {
                if visits.get(&dep).map_or(true, |&c| c < cap) && queued.insert(dep) {
                    queue.push_back(dep);
                }
            }
        }
    }

    if hit_cap {
        log::warn!(
            "contact resolution did not settle within {} visits per body",
            cap
        );
    }
}

/// Resolve one body against everything its collider intersects.
///
/// Only neighbors with a `Dynamic` body exchange momentum with it.
/// Colliders owned by `Kinematic` or `Static` bodies are treated like bare static
/// colliders, so their own velocity is ignored: a moving kinematic platform
/// does not carry what rides on it.
///
/// Returns the bodies that need to be resolved again because of it.
fn resolve_body(set: &mut EntitySet, key: BodyKey, params: &PhysicsParams) -> Vec<BodyKey> {
    let (Some(body), Some(coll_key)) = (set.get_body(key), set.body_collider(key)) else {
        return Vec::new();
    };
    let Some(coll) = set.get_collider(coll_key) else {
        return Vec::new();
    };
    let body_type = body.body_type;
    let mode = coll.mode;
    let intersections = coll.intersections().to_vec();

    let dynamic_neighbor = |other: ColliderKey| {
        set.collider_body(other)
            .filter(|&b| b != key && set.get_body(b).map_or(false, |b| b.is_dynamic()))
    };

    match body_type {
        // immovable here, but whatever touches them should settle against them
        BodyType::Static | BodyType::Kinematic => intersections
            .iter()
            .filter_map(|&other| dynamic_neighbor(other))
            .collect(),
        BodyType::Dynamic if mode == ColliderMode::Trigger => Vec::new(),
        BodyType::Dynamic => {
            let neighbors: Vec<(ColliderKey, Option<BodyKey>)> = intersections
                .iter()
                .map(|&other| (other, dynamic_neighbor(other)))
                .collect();
            let before: Vec<(BodyKey, Vec2)> = std::iter::once(key)
                .chain(neighbors.iter().filter_map(|(_, b)| *b))
                .filter_map(|b| Some((b, set.get_body(b)?.velocity)))
                .collect();

            for (other_coll, other_body) in neighbors {
                match other_body {
                    Some(other_body) => resolve_dynamic_dynamic(
                        set,
                        (key, coll_key),
                        (other_body, other_coll),
                        params.contact_tolerance,
                    ),
                    None => resolve_dynamic_static(
                        set,
                        (key, coll_key),
                        other_coll,
                        params.contact_tolerance,
                    ),
                }
            }

            let mut changed: Vec<BodyKey> = Vec::new();
            for (b, vel_before) in before {
                let Some(body) = set.get_body(b) else {
                    continue;
                };
                if (body.velocity - vel_before).mag() > params.velocity_epsilon
                    && !changed.contains(&b)
                {
                    changed.push(b);
                }
            }
            changed
        }
    }
}

/// Exchange momentum between two dynamic bodies along their contact normals.
///
/// Impulses from every approaching contact edge are summed and applied once.
pub(crate) fn resolve_dynamic_dynamic(
    set: &mut EntitySet,
    (a, a_coll): (BodyKey, ColliderKey),
    (b, b_coll): (BodyKey, ColliderKey),
    tolerance: f64,
) {
    if a == b {
        return;
    }
    let (Some(ca), Some(cb)) = (set.get_collider(a_coll), set.get_collider(b_coll)) else {
        return;
    };
    let contacts = ca.shape.contacts_with(&cb.shape, tolerance);
    if contacts.is_empty() {
        return;
    }
    let (Some(ba), Some(bb)) = set.bodies.get2_mut(a.0, b.0) else {
        return;
    };

    let e = ba.bounciness.min(bb.bounciness);
    let inv_mass_sum = 1.0 / ba.mass + 1.0 / bb.mass;
    let rel_vel = bb.velocity - ba.velocity;
    let mut impulse = Vec2::zero();
    for contact in &contacts {
        // normal pointing from a to b
        let normal = match contact.side {
            ContactSide::Own => *contact.normal,
            ContactSide::Other => -*contact.normal,
        };
        let vel_along_normal = rel_vel.dot(normal);
        if vel_along_normal > 0.0 {
            continue;
        }
        let j = -(1.0 + e) * vel_along_normal / inv_mass_sum;
        impulse += j * normal;
    }

    ba.velocity -= impulse / ba.mass;
    bb.velocity += impulse / bb.mass;
}

/// Bounce a dynamic body off something that doesn't move in response.
pub(crate) fn resolve_dynamic_static(
    set: &mut EntitySet,
    (a, a_coll): (BodyKey, ColliderKey),
    other_coll: ColliderKey,
    tolerance: f64,
) {
    let (Some(ca), Some(co)) = (set.get_collider(a_coll), set.get_collider(other_coll)) else {
        return;
    };
    let contacts = ca.shape.contacts_with(&co.shape, tolerance);
    if contacts.is_empty() {
        return;
    }
    let Some(body) = set.get_body_mut(a) else {
        return;
    };

    let e = body.bounciness;
    let mut impulse = Vec2::zero();
    for contact in &contacts {
        // normal pointing from the static side toward the body
        let normal = match contact.side {
            ContactSide::Own => -*contact.normal,
            ContactSide::Other => *contact.normal,
        };
        let vel_along_normal = body.velocity.dot(normal);
        if vel_along_normal > 0.0 {
            continue;
        }
        let j = -(1.0 + e) * vel_along_normal * body.mass;
        impulse += j * normal;
    }

    body.velocity += impulse / body.mass;
}
