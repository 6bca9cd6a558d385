//! Collision notifications and the deferred command queue listeners use
//! to change the world.

use super::{BodyKey, ColliderKey, EntityKey, Rigidbody};
use crate::{collision::Collider, math::Transform};

use parking_lot::Mutex;
use std::sync::Arc;

/// Something that happened to a collider during the check pass of a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionEvent {
    /// `other` started overlapping `collider` this step.
    OverlapEnter {
        collider: ColliderKey,
        other: ColliderKey,
    },
    /// `other` was overlapping `collider` on the previous step and still is.
    OverlapStay {
        collider: ColliderKey,
        other: ColliderKey,
    },
    /// `other` stopped overlapping `collider` this step.
    OverlapExit {
        collider: ColliderKey,
        other: ColliderKey,
    },
    /// Every overlap check for this step has run.
    CheckFinished { collider: ColliderKey, tick: u64 },
}

impl CollisionEvent {
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            CollisionEvent::OverlapEnter { .. } => EventKind::OverlapEnter,
            CollisionEvent::OverlapStay { .. } => EventKind::OverlapStay,
            CollisionEvent::OverlapExit { .. } => EventKind::OverlapExit,
            CollisionEvent::CheckFinished { .. } => EventKind::CheckFinished,
        }
    }

    /// The collider the event was delivered to.
    #[inline]
    pub fn collider(&self) -> ColliderKey {
        match *self {
            CollisionEvent::OverlapEnter { collider, .. }
            | CollisionEvent::OverlapStay { collider, .. }
            | CollisionEvent::OverlapExit { collider, .. }
            | CollisionEvent::CheckFinished { collider, .. } => collider,
        }
    }

    /// The other collider in an overlap event.
    #[inline]
    pub fn other(&self) -> Option<ColliderKey> {
        match *self {
            CollisionEvent::OverlapEnter { other, .. }
            | CollisionEvent::OverlapStay { other, .. }
            | CollisionEvent::OverlapExit { other, .. } => Some(other),
            CollisionEvent::CheckFinished { .. } => None,
        }
    }
}

/// Discriminant of [`CollisionEvent`], used to pick which events to subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    OverlapEnter,
    OverlapStay,
    OverlapExit,
    CheckFinished,
}

impl EventKind {
    pub const COUNT: usize = 4;

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Receiver of collision events.
///
/// Listeners are called synchronously from the physics step
/// and may not touch the world directly.
/// Structural changes go through the [`CommandQueue`] instead
/// and are applied once the current pass has finished.
pub trait CollisionListener: Send + Sync {
    fn on_event(&self, event: &CollisionEvent, commands: &CommandQueue);
}

impl<F> CollisionListener for F
where
    F: Fn(&CollisionEvent, &CommandQueue) + Send + Sync,
{
    #[inline]
    fn on_event(&self, event: &CollisionEvent, commands: &CommandQueue) {
        self(event, commands)
    }
}

/// A structural change to the physics world waiting to be applied.
pub enum Command {
    /// Create an entity, optionally with a collider and a body.
    /// A body without a collider gets the default collider.
    Spawn {
        transform: Transform,
        collider: Option<Collider>,
        body: Option<Rigidbody>,
    },
    RemoveEntity(EntityKey),
    RemoveCollider(ColliderKey),
    RemoveBody(BodyKey),
    SetTransform(EntityKey, Transform),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Spawn { transform, .. } => {
                f.debug_struct("Spawn").field("transform", transform).finish()
            }
            Command::RemoveEntity(k) => f.debug_tuple("RemoveEntity").field(k).finish(),
            Command::RemoveCollider(k) => f.debug_tuple("RemoveCollider").field(k).finish(),
            Command::RemoveBody(k) => f.debug_tuple("RemoveBody").field(k).finish(),
            Command::SetTransform(k, tr) => {
                f.debug_tuple("SetTransform").field(k).field(tr).finish()
            }
        }
    }
}

/// Shared handle to the queue of pending [`Command`]s.
///
/// Cheap to clone; every clone pushes into the same queue.
#[derive(Clone, Default)]
pub struct CommandQueue(Arc<Mutex<Vec<Command>>>);

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, cmd: Command) {
        self.0.lock().push(cmd);
    }

    #[inline]
    pub fn spawn(&self, transform: Transform, collider: Option<Collider>, body: Option<Rigidbody>) {
        self.push(Command::Spawn {
            transform,
            collider,
            body,
        });
    }

    #[inline]
    pub fn remove_entity(&self, entity: EntityKey) {
        self.push(Command::RemoveEntity(entity));
    }

    #[inline]
    pub fn remove_collider(&self, coll: ColliderKey) {
        self.push(Command::RemoveCollider(coll));
    }

    #[inline]
    pub fn remove_body(&self, body: BodyKey) {
        self.push(Command::RemoveBody(body));
    }

    #[inline]
    pub fn set_transform(&self, entity: EntityKey, transform: Transform) {
        self.push(Command::SetTransform(entity, transform));
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Take every queued command, leaving the queue empty.
    pub(crate) fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.0.lock())
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CommandQueue").field(&self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_queue() {
        let queue = CommandQueue::new();
        let handle = queue.clone();
        handle.spawn(Transform::from([1.0, 2.0]), None, None);
        handle.spawn(Transform::default(), None, None);
        assert_eq!(queue.len(), 2);

        let cmds = queue.take();
        assert!(queue.is_empty());
        assert!(matches!(
            cmds[0],
            Command::Spawn { transform, .. } if transform.position.x == 1.0
        ));
    }

    #[test]
    fn closures_are_listeners() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_ = seen.clone();
        let listener: Arc<dyn CollisionListener> =
            Arc::new(move |evt: &CollisionEvent, _: &CommandQueue| seen_.lock().push(evt.kind()));

        let mut arena = thunderdome::Arena::new();
        let key = ColliderKey(arena.insert(()));
        listener.on_event(
            &CollisionEvent::CheckFinished {
                collider: key,
                tick: 3,
            },
            &CommandQueue::new(),
        );
        assert_eq!(*seen.lock(), vec![EventKind::CheckFinished]);
    }
}
