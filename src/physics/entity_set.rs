use super::{PhysicsError, Rigidbody};
use crate::{
    collision::{Collider, ColliderMode, Polygon},
    math::Transform,
};

use thunderdome as td;

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) td::Index);

        impl $name {
            /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
            /// Useful for creating your own mappings from physics objects to other things.
            #[inline]
            pub fn index(&self) -> td::Index {
                self.0
            }
        }
    };
}

key_type! {
    /// Key type to look up an entity stored in the physics world.
    EntityKey
}
key_type! {
    /// Key type to look up a collider stored in the physics world.
    ColliderKey
}
key_type! {
    /// Key type to look up a rigidbody stored in the physics world.
    BodyKey
}

/// An object that owns a transform and can have one collider and one body attached.
#[derive(Clone, Copy, Debug)]
pub struct Entity {
    pub transform: Transform,
    pub(super) collider: Option<ColliderKey>,
    pub(super) body: Option<BodyKey>,
}

impl Entity {
    #[inline]
    pub fn collider(&self) -> Option<ColliderKey> {
        self.collider
    }

    #[inline]
    pub fn body(&self) -> Option<BodyKey> {
        self.body
    }
}

/// Side length of the collider created for a body attached to an entity without one.
pub const DEFAULT_COLLIDER_SIZE: f64 = 1.0;

/// Internal representation of objects in the physics world,
/// comprised of entities and the colliders and bodies attached to them.
///
/// Iteration order of the arenas is the registry order
/// used for tie-breaking during collision handling.
#[derive(Default)]
pub struct EntitySet {
    // pub(super) fields so the step passes can borrow arenas separately,
    // the attachment invariants are only maintained by the methods below
    pub(super) entities: td::Arena<Entity>,
    pub(super) colliders: td::Arena<Collider>,
    pub(super) coll_owners: td::Arena<EntityKey>,
    pub(super) bodies: td::Arena<Rigidbody>,
    pub(super) body_owners: td::Arena<EntityKey>,
}

impl EntitySet {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    //
    // access
    //

    #[inline]
    pub fn get_entity(&self, entity: EntityKey) -> Option<&Entity> {
        self.entities.get(entity.0)
    }

    #[inline]
    pub fn get_entity_mut(&mut self, entity: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(entity.0)
    }

    /// Access a [`Collider`][crate::Collider] in the physics world, if it still exists.
    #[inline]
    pub fn get_collider(&self, coll: ColliderKey) -> Option<&Collider> {
        self.colliders.get(coll.0)
    }

    /// Mutably access a [`Collider`][crate::Collider] in the physics world, if it still exists.
    #[inline]
    pub fn get_collider_mut(&mut self, coll: ColliderKey) -> Option<&mut Collider> {
        self.colliders.get_mut(coll.0)
    }

    /// Access a [`Rigidbody`][crate::Rigidbody] in the physics world, if it still exists.
    #[inline]
    pub fn get_body(&self, body: BodyKey) -> Option<&Rigidbody> {
        self.bodies.get(body.0)
    }

    /// Mutably access a [`Rigidbody`][crate::Rigidbody] in the physics world, if it still exists.
    #[inline]
    pub fn get_body_mut(&mut self, body: BodyKey) -> Option<&mut Rigidbody> {
        self.bodies.get_mut(body.0)
    }

    #[inline]
    pub fn collider_owner(&self, coll: ColliderKey) -> Option<EntityKey> {
        self.coll_owners.get(coll.0).copied()
    }

    #[inline]
    pub fn body_owner(&self, body: BodyKey) -> Option<EntityKey> {
        self.body_owners.get(body.0).copied()
    }

    /// The collider attached to the same entity as the given body.
    #[inline]
    pub fn body_collider(&self, body: BodyKey) -> Option<ColliderKey> {
        let owner = self.body_owner(body)?;
        self.entities.get(owner.0)?.collider
    }

    /// The body attached to the same entity as the given collider.
    #[inline]
    pub fn collider_body(&self, coll: ColliderKey) -> Option<BodyKey> {
        let owner = self.collider_owner(coll)?;
        self.entities.get(owner.0)?.body
    }

    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    #[inline]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn colliders(&self) -> impl Iterator<Item = (ColliderKey, &Collider)> {
        self.colliders.iter().map(|(k, c)| (ColliderKey(k), c))
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Rigidbody)> {
        self.bodies.iter().map(|(k, b)| (BodyKey(k), b))
    }

    //
    // insertion
    //

    /// Insert an entity with nothing attached.
    pub fn spawn(&mut self, transform: Transform) -> EntityKey {
        let key = EntityKey(self.entities.insert(Entity {
            transform,
            collider: None,
            body: None,
        }));
        log::debug!("spawned entity {:?} at {:?}", key, transform.position);
        key
    }

    /// Attach a collider to an entity that doesn't have one yet.
    pub fn attach_collider(
        &mut self,
        entity: EntityKey,
        mut coll: Collider,
    ) -> Result<ColliderKey, PhysicsError> {
        let ent = self
            .entities
            .get(entity.0)
            .ok_or(PhysicsError::MissingEntity)?;
        if ent.collider.is_some() {
            return Err(PhysicsError::DuplicateCollider);
        }
        coll.sync_shape(&ent.transform);

        let key = ColliderKey(self.colliders.insert(coll));
        self.coll_owners.insert_at(key.0, entity);
        if let Some(ent) = self.entities.get_mut(entity.0) {
            ent.collider = Some(key);
        }
        log::debug!("attached collider {:?} to entity {:?}", key, entity);
        Ok(key)
    }

    /// Attach a rigidbody to an entity that doesn't have one yet.
    ///
    /// A body can't exist without a collider,
    /// so if the entity doesn't have one, a default
    /// [`DEFAULT_COLLIDER_SIZE`]-sided square `Physical` collider is attached first.
    pub fn attach_body(
        &mut self,
        entity: EntityKey,
        body: Rigidbody,
    ) -> Result<BodyKey, PhysicsError> {
        let ent = self
            .entities
            .get(entity.0)
            .ok_or(PhysicsError::MissingEntity)?;
        if ent.body.is_some() {
            return Err(PhysicsError::DuplicateBody);
        }
        if ent.collider.is_none() {
            let coll = Collider::new(
                Polygon::square(DEFAULT_COLLIDER_SIZE),
                ColliderMode::Physical,
            );
            self.attach_collider(entity, coll)?;
        }

        let key = BodyKey(self.bodies.insert(body));
        self.body_owners.insert_at(key.0, entity);
        if let Some(ent) = self.entities.get_mut(entity.0) {
            ent.body = Some(key);
        }
        log::debug!("attached body {:?} to entity {:?}", key, entity);
        Ok(key)
    }

    //
    // removal
    //

    /// Remove a [`Rigidbody`][crate::Rigidbody] from the physics world,
    /// returning it if it still existed. The collider stays.
    pub fn remove_body(&mut self, body: BodyKey) -> Option<Rigidbody> {
        let removed = self.bodies.remove(body.0)?;
        if let Some(owner) = self.body_owners.remove(body.0) {
            if let Some(ent) = self.entities.get_mut(owner.0) {
                ent.body = None;
            }
        }
        log::debug!("removed body {:?}", body);
        Some(removed)
    }

    /// Remove a [`Collider`][crate::Collider] from the physics world,
    /// returning it if it still existed.
    ///
    /// A body attached to the same entity can't live without it
    /// and is removed as well.
    pub fn remove_collider(&mut self, coll: ColliderKey) -> Option<Collider> {
        let mut removed = self.colliders.remove(coll.0)?;
        removed.clear_listeners();
        if let Some(owner) = self.coll_owners.remove(coll.0) {
            let body = self.entities.get_mut(owner.0).and_then(|ent| {
                ent.collider = None;
                ent.body
            });
            if let Some(body) = body {
                self.remove_body(body);
            }
        }
        log::debug!("removed collider {:?}", coll);
        Some(removed)
    }

    /// Remove an entity along with anything attached to it.
    pub fn remove_entity(&mut self, entity: EntityKey) -> Option<Entity> {
        let ent = *self.entities.get(entity.0)?;
        if let Some(coll) = ent.collider {
            self.remove_collider(coll);
        }
        if let Some(body) = ent.body {
            self.remove_body(body);
        }
        log::debug!("removed entity {:?}", entity);
        self.entities.remove(entity.0)
    }

    // not exposed to users, must use through Physics::clear
    pub(super) fn clear(&mut self) {
        self.entities.clear();
        self.colliders.clear();
        self.coll_owners.clear();
        self.bodies.clear();
        self.body_owners.clear();
    }
}
