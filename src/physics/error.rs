use super::event::EventKind;

/// Misuse of the physics API.
///
/// Geometric edge cases like zero-length edges or shapes that only touch
/// are never errors, they just mean no interaction happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("A polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("Listener was already subscribed to {0:?} on this collider")]
    DuplicateListener(EventKind),
    #[error("Entity already has a collider")]
    DuplicateCollider,
    #[error("Entity already has a body")]
    DuplicateBody,
    #[error("Entity does not exist")]
    MissingEntity,
    #[error("Collider does not exist")]
    MissingCollider,
}
