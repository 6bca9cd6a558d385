use crate::math::{Transform, Vec2};

use itertools::izip;
use std::sync::Arc;

//

pub mod body;
pub use body::{BodyType, Rigidbody};

mod clock;
pub use clock::FixedTimestep;

pub mod collision;
use collision::{scheduler, Collider};

pub mod entity_set;
pub use entity_set::{BodyKey, ColliderKey, Entity, EntityKey, EntitySet};

mod error;
pub use error::PhysicsError;

pub mod event;
use event::{CollisionListener, Command, CommandQueue, EventKind};

pub mod forcefield;
pub use forcefield::ForceField;

mod params;
pub use params::PhysicsParams;

pub mod solver;

#[cfg(test)]
mod tests;

//

/// The physics world.
///
/// Owns every entity, collider and rigidbody and advances them in fixed steps.
/// Each step runs these passes in order:
///
/// 1. apply queued commands
/// 2. add gravity to the force accumulator of every dynamic body
/// 3. turn accumulated forces into velocity
/// 4. move collider shapes to their owners' transforms
/// 5. check every collider for overlaps
/// 6. push `Physical` colliders out of what they overlap
/// 7. deliver overlap events and `CheckFinished`
/// 8. apply commands queued by listeners
/// 9. resolve rigidbody contacts in priority order
/// 10. damp velocities and move bodies
/// 11. apply queued commands
pub struct Physics {
    pub params: PhysicsParams,
    entity_set: EntitySet,
    clock: FixedTimestep,
    commands: CommandQueue,
    tick: u64,
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(PhysicsParams::default())
    }
}

impl Physics {
    pub fn new(params: PhysicsParams) -> Self {
        Physics {
            params,
            entity_set: EntitySet::new(),
            clock: FixedTimestep::new(params.fixed_delta, params.max_accumulated),
            commands: CommandQueue::new(),
            tick: 0,
        }
    }

    //
    // world contents
    //

    /// Access the entities, colliders and bodies in the world.
    #[inline]
    pub fn entities(&self) -> &EntitySet {
        &self.entity_set
    }

    /// Mutably access the entities, colliders and bodies in the world.
    #[inline]
    pub fn entities_mut(&mut self) -> &mut EntitySet {
        &mut self.entity_set
    }

    #[inline]
    pub fn spawn(&mut self, transform: impl Into<Transform>) -> EntityKey {
        self.entity_set.spawn(transform.into())
    }

    /// Spawn an entity and attach a collider to it.
    pub fn spawn_collider(
        &mut self,
        transform: impl Into<Transform>,
        coll: Collider,
    ) -> Result<(EntityKey, ColliderKey), PhysicsError> {
        let ent = self.spawn(transform);
        let coll = self.entity_set.attach_collider(ent, coll)?;
        Ok((ent, coll))
    }

    /// Spawn an entity with both a collider and a rigidbody.
    pub fn spawn_body(
        &mut self,
        transform: impl Into<Transform>,
        coll: Collider,
        body: Rigidbody,
    ) -> Result<(EntityKey, ColliderKey, BodyKey), PhysicsError> {
        let (ent, coll) = self.spawn_collider(transform, coll)?;
        let body = self.entity_set.attach_body(ent, body)?;
        Ok((ent, coll, body))
    }

    #[inline]
    pub fn attach_collider(
        &mut self,
        entity: EntityKey,
        coll: Collider,
    ) -> Result<ColliderKey, PhysicsError> {
        self.entity_set.attach_collider(entity, coll)
    }

    #[inline]
    pub fn attach_body(&mut self, entity: EntityKey, body: Rigidbody) -> Result<BodyKey, PhysicsError> {
        self.entity_set.attach_body(entity, body)
    }

    #[inline]
    pub fn remove_entity(&mut self, entity: EntityKey) -> Option<Entity> {
        self.entity_set.remove_entity(entity)
    }

    /// Remove a collider. A body on the same entity is removed with it.
    #[inline]
    pub fn remove_collider(&mut self, coll: ColliderKey) -> Option<Collider> {
        self.entity_set.remove_collider(coll)
    }

    #[inline]
    pub fn remove_body(&mut self, body: BodyKey) -> Option<Rigidbody> {
        self.entity_set.remove_body(body)
    }

    /// Remove everything from the world.
    pub fn clear(&mut self) {
        self.entity_set.clear();
        self.clock.reset();
        self.commands.take();
    }

    #[inline]
    pub fn transform(&self, entity: EntityKey) -> Option<Transform> {
        self.entity_set.get_entity(entity).map(|e| e.transform)
    }

    #[inline]
    pub fn transform_mut(&mut self, entity: EntityKey) -> Option<&mut Transform> {
        self.entity_set.get_entity_mut(entity).map(|e| &mut e.transform)
    }

    #[inline]
    pub fn get_collider(&self, coll: ColliderKey) -> Option<&Collider> {
        self.entity_set.get_collider(coll)
    }

    #[inline]
    pub fn get_body(&self, body: BodyKey) -> Option<&Rigidbody> {
        self.entity_set.get_body(body)
    }

    #[inline]
    pub fn get_body_mut(&mut self, body: BodyKey) -> Option<&mut Rigidbody> {
        self.entity_set.get_body_mut(body)
    }

    //
    // events and commands
    //

    /// Register a listener for events of one kind on a collider.
    pub fn subscribe(
        &mut self,
        coll: ColliderKey,
        kind: EventKind,
        listener: Arc<dyn CollisionListener>,
    ) -> Result<(), PhysicsError> {
        self.entity_set
            .get_collider_mut(coll)
            .ok_or(PhysicsError::MissingCollider)?
            .subscribe(kind, listener)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(
        &mut self,
        coll: ColliderKey,
        kind: EventKind,
        listener: &Arc<dyn CollisionListener>,
    ) -> bool {
        self.entity_set
            .get_collider_mut(coll)
            .map_or(false, |c| c.unsubscribe(kind, listener))
    }

    /// Get a handle to the command queue.
    ///
    /// Commands pushed into it are applied at the next safe point of a step,
    /// never in the middle of a pass.
    #[inline]
    pub fn commands(&self) -> CommandQueue {
        self.commands.clone()
    }

    /// Number of steps run so far.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn clock(&self) -> &FixedTimestep {
        &self.clock
    }

    //
    // queries
    //

    /// Get the colliders whose shape contains the given point,
    /// as of the latest shape update.
    pub fn query_point(&self, point: Vec2) -> Vec<ColliderKey> {
        self.entity_set
            .colliders()
            .filter(|(_, c)| c.bounding().contains_point(point) && c.shape.contains_point(point))
            .map(|(k, _)| k)
            .collect()
    }

    //
    // simulation
    //

    /// Advance the world by `elapsed` seconds of real time,
    /// running as many fixed steps as fit. Returns the number of steps run.
    pub fn tick(&mut self, elapsed: f64) -> usize {
        let gravity = forcefield::Gravity(self.params.gravity);
        self.tick_with_field(elapsed, &gravity)
    }

    /// Like [`tick`][Self::tick], with a custom force field in place of the
    /// configured gravity.
    pub fn tick_with_field(&mut self, elapsed: f64, field: &impl ForceField) -> usize {
        let steps = self.clock.advance(elapsed);
        for _ in 0..steps {
            self.step_with_field(field);
        }
        steps
    }

    /// Run exactly one fixed step with the configured gravity.
    pub fn step(&mut self) {
        let gravity = forcefield::Gravity(self.params.gravity);
        self.step_with_field(&gravity);
    }

    /// Run exactly one fixed step with a custom force field.
    pub fn step_with_field(&mut self, field: &impl ForceField) {
        let _span = tracy_span!("physics step", "step_with_field");
        log::trace!("physics step {}", self.tick);

        self.flush_commands();

        self.apply_gravity(field);
        self.apply_forces();

        scheduler::update_shapes(&mut self.entity_set);
        let detections = scheduler::check_intersections(&mut self.entity_set);
        scheduler::push_out(&mut self.entity_set, &detections);
        scheduler::notify(&mut self.entity_set, &detections, self.tick, &self.commands);
        self.flush_commands();

        solver::resolve_all(&mut self.entity_set, &self.params);

        self.integrate();
        self.flush_commands();

        self.tick += 1;
    }

    fn apply_gravity(&mut self, field: &impl ForceField) {
        let _span = tracy_span!("apply gravity", "apply_gravity");
        let dt = self.params.fixed_delta;
        let EntitySet {
            entities,
            bodies,
            body_owners,
            ..
        } = &mut self.entity_set;
        for (key, body) in bodies.iter_mut().filter(|(_, b)| b.is_dynamic()) {
            let Some(owner) = body_owners.get(key).and_then(|o| entities.get(o.0)) else {
                continue;
            };
            let accel = field.value_at(owner.transform.position);
            body.forces += body.mass * body.gravity_scale * accel * dt;
        }
    }

    fn apply_forces(&mut self) {
        let _span = tracy_span!("apply forces", "apply_forces");
        let dt = self.params.fixed_delta;
        for (_, body) in self.entity_set.bodies.iter_mut() {
            if body.is_dynamic() {
                body.velocity += body.forces / body.mass * dt;
            }
            body.forces = Vec2::zero();
        }
    }

    fn integrate(&mut self) {
        let _span = tracy_span!("integrate", "integrate");
        let EntitySet {
            entities,
            colliders,
            bodies,
            body_owners,
            ..
        } = &mut self.entity_set;

        let owners: Vec<Option<EntityKey>> = bodies
            .iter()
            .map(|(key, _)| body_owners.get(key).copied())
            .collect();
        let touching: Vec<bool> = owners
            .iter()
            .map(|owner| {
                owner
                    .and_then(|o| entities.get(o.0))
                    .and_then(|e| e.collider)
                    .and_then(|c| colliders.get(c.0))
                    .map_or(false, |c| !c.intersections.is_empty())
            })
            .collect();

        for ((_, body), owner, touching) in izip!(bodies.iter_mut(), &owners, &touching) {
            match body.body_type {
                BodyType::Static => continue,
                BodyType::Dynamic => body.damp(*touching),
                BodyType::Kinematic => (),
            }
            if let Some(ent) = owner.and_then(|o| entities.get_mut(o.0)) {
                ent.transform.position += body.velocity;
            }
        }
    }

    fn flush_commands(&mut self) {
        let cmds = self.commands.take();
        if cmds.is_empty() {
            return;
        }
        log::trace!("applying {} queued commands", cmds.len());

        for cmd in cmds {
            match cmd {
                Command::Spawn {
                    transform,
                    collider,
                    body,
                } => {
                    let ent = self.entity_set.spawn(transform);
                    if let Some(coll) = collider {
                        if let Err(err) = self.entity_set.attach_collider(ent, coll) {
                            log::warn!("queued spawn failed to attach collider: {}", err);
                        }
                    }
                    if let Some(body) = body {
                        if let Err(err) = self.entity_set.attach_body(ent, body) {
                            log::warn!("queued spawn failed to attach body: {}", err);
                        }
                    }
                }
                Command::RemoveEntity(ent) => {
                    self.entity_set.remove_entity(ent);
                }
                Command::RemoveCollider(coll) => {
                    self.entity_set.remove_collider(coll);
                }
                Command::RemoveBody(body) => {
                    self.entity_set.remove_body(body);
                }
                Command::SetTransform(ent, tr) => match self.entity_set.get_entity_mut(ent) {
                    Some(e) => e.transform = tr,
                    None => log::debug!("queued transform for missing entity {:?}", ent),
                },
            }
        }
    }
}
